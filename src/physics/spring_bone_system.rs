//! 弹簧骨骼系统
//!
//! 管理已注册的骨骼链与碰撞体集合，驱动每帧流程：
//! pull（读取宿主变换、重新捕获默认姿态）→ step（并行模拟各条链）→ push（写回宿主）
//!
//! 链之间互相独立，模拟阶段只读访问链与碰撞体，结果先收集到每条链自己的
//! 临时缓冲区，再顺序写回，因此任何一条链都不会观察到其他链的中间状态。

use rayon::prelude::*;

use crate::chain::{
    simulate_chain, ChainDescriptor, ChainFlags, ChainRoot, ChainScratch, GravitySource, NodeState,
    Wind,
};
use crate::collider::{ColliderSet, ColliderShape};
use crate::skeleton::TransformBridge;
use crate::{Result, SpringBoneError};

use super::config::{get_config, JiggleConfig};
use super::handle::{ChainHandle, ChainTag, ColliderSetHandle, ColliderSetTag, Slots};

/// 已注册的骨骼链
#[derive(Debug)]
struct ChainEntry {
    chain: ChainRoot,
    /// 本帧是否已从宿主同步（缺少变换的链跳过模拟与写回）
    synced: bool,
}

/// 弹簧骨骼系统
///
/// 流程：register → 每帧 [pull → step → push]（或直接 update）
pub struct SpringBoneSystem {
    chains: Slots<ChainTag, ChainEntry>,
    collider_sets: Slots<ColliderSetTag, ColliderSet>,
    /// 配置快照（创建时取自全局配置）
    config: JiggleConfig,
}

impl SpringBoneSystem {
    /// 使用当前全局配置创建
    pub fn new() -> Self {
        Self::with_config(get_config())
    }

    pub fn with_config(config: JiggleConfig) -> Self {
        if config.debug_log {
            log::info!(
                "弹簧骨骼系统创建: 最大子步={}, 最大步长={:.4}s, 并行={}",
                config.max_iteration_count,
                config.max_delta_time,
                config.parallel
            );
        }
        Self {
            chains: Slots::new(),
            collider_sets: Slots::new(),
            config,
        }
    }

    pub fn config(&self) -> &JiggleConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: JiggleConfig) {
        self.config = config;
    }

    // ========================================
    // 骨骼链注册
    // ========================================

    /// 注册骨骼链
    ///
    /// 校验拓扑与参数，并从宿主捕获初始静止姿态。
    pub fn register(
        &mut self,
        desc: &ChainDescriptor,
        bridge: &impl TransformBridge,
    ) -> Result<ChainHandle> {
        let built = self.check_collider_set(desc).and_then(|_| ChainRoot::build(desc, bridge));
        let chain = match built {
            Ok(chain) => chain,
            Err(e) => {
                log::warn!("骨骼链注册失败 (root {:?}): {}", desc.root, e);
                return Err(e);
            }
        };

        let depth = chain.depth();
        let root = chain.root;
        let handle = self.chains.insert(ChainEntry { chain, synced: false });
        log::info!("骨骼链注册: root {:?}, {} 节点, 句柄 {:?}", root, depth, handle);
        Ok(handle)
    }

    /// 注销骨骼链
    pub fn unregister(&mut self, handle: ChainHandle) -> Result<()> {
        let entry = self.chains.remove(handle).ok_or(SpringBoneError::InvalidChainHandle)?;
        log::info!("骨骼链注销: root {:?}", entry.chain.root);
        Ok(())
    }

    /// 重新应用编辑参数，不重建链，弹簧状态保留
    pub fn reset_parameters(&mut self, handle: ChainHandle, desc: &ChainDescriptor) -> Result<()> {
        self.check_collider_set(desc)?;
        self.chain_mut(handle)?.apply_params(desc)
    }

    /// 清零动态状态，回到当前链根下的静止姿态
    pub fn reset(&mut self, handle: ChainHandle, bridge: &impl TransformBridge) -> Result<()> {
        let chain = self.chain_mut(handle)?;
        chain.pull(bridge).map_err(SpringBoneError::MissingTransform)?;
        chain.reset_dynamics();
        Ok(())
    }

    /// 切换动画跟随（每帧重新捕获默认姿态）
    pub fn set_with_animation(&mut self, handle: ChainHandle, enabled: bool) -> Result<()> {
        self.chain_mut(handle)?.set_with_animation(enabled);
        Ok(())
    }

    /// 设置重力与风，并开启外力
    pub fn set_forces(
        &mut self,
        handle: ChainHandle,
        gravity: GravitySource,
        wind: Wind,
    ) -> Result<()> {
        let chain = self.chain_mut(handle)?;
        chain.params.gravity = gravity;
        chain.params.wind = wind;
        chain.params.flags.insert(ChainFlags::APPLY_FORCES);
        Ok(())
    }

    // ========================================
    // 碰撞体集合
    // ========================================

    /// 注册碰撞体集合（顺序即求解顺序）
    pub fn register_collider_set(&mut self, shapes: Vec<ColliderShape>) -> ColliderSetHandle {
        let set = ColliderSet::from_shapes(shapes);
        let len = set.len();
        let handle = self.collider_sets.insert(set);
        log::info!("碰撞体集合注册: {} 个碰撞体, 句柄 {:?}", len, handle);
        handle
    }

    /// 注销碰撞体集合，引用它的链此后不再碰撞
    pub fn unregister_collider_set(&mut self, handle: ColliderSetHandle) -> Result<()> {
        self.collider_sets
            .remove(handle)
            .ok_or(SpringBoneError::InvalidColliderSetHandle)?;

        let mut detached = 0;
        for entry in self.chains.values_mut() {
            if entry.chain.collider_set == Some(handle) {
                entry.chain.collider_set = None;
                detached += 1;
            }
        }
        log::info!("碰撞体集合注销: {:?}, {} 条链不再碰撞", handle, detached);
        Ok(())
    }

    /// 替换集合中的一个碰撞体
    pub fn set_collider_shape(
        &mut self,
        handle: ColliderSetHandle,
        index: usize,
        shape: ColliderShape,
    ) -> Result<()> {
        self.collider_sets
            .get_mut(handle)
            .ok_or(SpringBoneError::InvalidColliderSetHandle)?
            .set_shape(index, shape)
    }

    pub fn collider_set(&self, handle: ColliderSetHandle) -> Option<&ColliderSet> {
        self.collider_sets.get(handle)
    }

    // ========================================
    // 查询
    // ========================================

    pub fn chain(&self, handle: ChainHandle) -> Option<&ChainRoot> {
        self.chains.get(handle).map(|e| &e.chain)
    }

    /// 节点动态状态（链顺序索引）
    pub fn node_state(&self, handle: ChainHandle, index: usize) -> Option<&NodeState> {
        self.chain(handle)?.node(index).map(|n| &n.state)
    }

    pub fn chain_count(&self) -> usize {
        self.chains.len()
    }

    pub fn collider_set_count(&self) -> usize {
        self.collider_sets.len()
    }

    // ========================================
    // 每帧流程
    // ========================================

    /// 从宿主读取各链当前变换
    ///
    /// 缺少变换的链本帧跳过；开启动画跟随的链重新捕获默认姿态。
    pub fn pull(&mut self, bridge: &impl TransformBridge) {
        let global_gravity = self.config.gravity;
        for entry in self.chains.values_mut() {
            let chain = &mut entry.chain;
            match chain.pull(bridge) {
                Ok(()) => {
                    if chain.with_animation() {
                        chain.recapture_default_pose();
                    }
                    chain.gravity = chain.params.gravity.evaluate(global_gravity);
                    entry.synced = true;
                }
                Err(missing) => {
                    log::warn!("骨骼链 {:?}: 宿主缺少变换 {:?}，本帧跳过", chain.root, missing);
                    entry.synced = false;
                }
            }
        }
    }

    /// 模拟一帧
    ///
    /// 链数达到阈值时用 rayon 并行，结果顺序写回。
    pub fn step(&mut self, frame_dt: f32) {
        let dt = frame_dt.min(self.config.max_delta_time);
        if !(dt > 0.0) {
            return;
        }
        let max_iterations = self.config.max_iteration_count.max(1);

        let collider_sets = &self.collider_sets;
        let jobs: Vec<(ChainHandle, &ChainRoot, Option<&ColliderSet>)> = self
            .chains
            .iter()
            .filter(|(_, e)| e.synced)
            .map(|(h, e)| {
                let colliders = e.chain.collider_set.and_then(|c| collider_sets.get(c));
                (h, &e.chain, colliders)
            })
            .collect();

        let run = |&(h, chain, colliders): &(ChainHandle, &ChainRoot, Option<&ColliderSet>)| {
            (h, simulate_chain(chain, colliders, dt, max_iterations))
        };
        let results: Vec<(ChainHandle, ChainScratch)> =
            if self.config.parallel && jobs.len() >= self.config.parallel_min_chains {
                jobs.par_iter().map(run).collect()
            } else {
                jobs.iter().map(run).collect()
            };

        let simulated = results.len();
        for (handle, scratch) in results {
            if let Some(entry) = self.chains.get_mut(handle) {
                entry.chain.scatter(scratch.states);
            }
        }

        if self.config.debug_log {
            log::debug!("弹簧骨骼步进: dt={:.4}s, {} / {} 条链", dt, simulated, self.chains.len());
        }
    }

    /// 把模拟结果写回宿主（只写位置与旋转）
    pub fn push(&self, bridge: &mut impl TransformBridge) {
        for entry in self.chains.values().filter(|e| e.synced) {
            for node in entry.chain.nodes() {
                let current = &node.state.current;
                bridge.push(node.node, current.translation, current.rotation);
            }
        }
    }

    /// pull → step → push
    pub fn update(&mut self, frame_dt: f32, bridge: &mut impl TransformBridge) {
        self.pull(&*bridge);
        self.step(frame_dt);
        self.push(bridge);
    }

    // ========================================
    // 内部
    // ========================================

    fn chain_mut(&mut self, handle: ChainHandle) -> Result<&mut ChainRoot> {
        self.chains
            .get_mut(handle)
            .map(|e| &mut e.chain)
            .ok_or(SpringBoneError::InvalidChainHandle)
    }

    fn check_collider_set(&self, desc: &ChainDescriptor) -> Result<()> {
        match desc.collider_set {
            Some(h) if !self.collider_sets.contains(h) => {
                Err(SpringBoneError::InvalidColliderSetHandle)
            }
            _ => Ok(()),
        }
    }
}

impl Default for SpringBoneSystem {
    fn default() -> Self {
        Self::new()
    }
}
