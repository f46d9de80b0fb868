//! 骨骼链
//!
//! 节点按链顺序连续存放（nodes[0] 为首节点），child 链接在注册时重建，
//! 所有遍历都以 depth 为上限。

use glam::{Mat4, Vec3};

use crate::physics::ColliderSetHandle;
use crate::skeleton::{BoneTransform, NodeId, TransformBridge};
use crate::{Result, SpringBoneError};

use super::bone_node::{BoneNode, NodeState};
use super::descriptor::{ChainDescriptor, ChainParams};
use super::ChainFlags;

/// 一条骨骼链
#[derive(Clone, Debug)]
pub struct ChainRoot {
    /// 链根宿主变换（首节点的父）
    pub root: NodeId,
    /// 末节点的子变换
    pub tip: NodeId,
    /// 节点（链顺序）
    nodes: Vec<BoneNode>,
    /// 链参数
    pub params: ChainParams,
    /// 碰撞体集合
    pub collider_set: Option<ColliderSetHandle>,
    /// 链根当前世界变换（每帧从宿主刷新）
    pub local_to_world: Mat4,
    /// 末端子变换的当前本地变换
    pub tip_local: BoneTransform,
    /// 本帧求值后的重力加速度
    pub gravity: Vec3,
}

impl ChainRoot {
    /// 校验描述并从宿主捕获初始姿态
    pub fn build(desc: &ChainDescriptor, bridge: &impl TransformBridge) -> Result<Self> {
        let order = desc.validate()?;

        let local_to_world = bridge
            .pull_world(desc.root)
            .ok_or(SpringBoneError::MissingTransform(desc.root))?;
        let tip_local = bridge.pull(desc.tip).ok_or(SpringBoneError::MissingTransform(desc.tip))?;

        let mut locals = Vec::with_capacity(order.len());
        for &index in &order {
            let id = desc.nodes[index].node;
            locals.push(bridge.pull(id).ok_or(SpringBoneError::MissingTransform(id))?);
        }

        let depth = order.len();
        let nodes = order
            .iter()
            .enumerate()
            .map(|(pos, &index)| {
                let nd = &desc.nodes[index];
                let child_local_position = if pos + 1 < depth {
                    locals[pos + 1].translation
                } else {
                    tip_local.translation
                };
                let mut node =
                    BoneNode::new(nd.node, &nd.params, locals[pos], child_local_position);
                node.child = (pos + 1 < depth).then_some(pos + 1);
                node
            })
            .collect();

        let mut chain = Self {
            root: desc.root,
            tip: desc.tip,
            nodes,
            params: desc.params.clone(),
            collider_set: desc.collider_set,
            local_to_world,
            tip_local,
            gravity: Vec3::ZERO,
        };
        chain.reset_dynamics();
        Ok(chain)
    }

    /// 重新应用编辑参数，拓扑必须一致
    pub fn apply_params(&mut self, desc: &ChainDescriptor) -> Result<()> {
        let order = desc.validate()?;
        let same_topology = desc.root == self.root
            && desc.tip == self.tip
            && order.len() == self.nodes.len()
            && order
                .iter()
                .zip(&self.nodes)
                .all(|(&index, node)| desc.nodes[index].node == node.node);
        if !same_topology {
            return Err(SpringBoneError::TopologyMismatch);
        }

        for (&index, node) in order.iter().zip(self.nodes.iter_mut()) {
            node.apply_params(&desc.nodes[index].params);
        }
        self.params = desc.params.clone();
        self.collider_set = desc.collider_set;
        Ok(())
    }

    // ========================================
    // 访问器
    // ========================================

    #[inline]
    pub fn depth(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn nodes(&self) -> &[BoneNode] {
        &self.nodes
    }

    #[inline]
    pub fn node(&self, index: usize) -> Option<&BoneNode> {
        self.nodes.get(index)
    }

    #[inline]
    pub fn with_animation(&self) -> bool {
        self.params.flags.contains(ChainFlags::WITH_ANIMATION)
    }

    #[inline]
    pub fn set_with_animation(&mut self, enabled: bool) {
        self.params.flags.set(ChainFlags::WITH_ANIMATION, enabled);
    }

    /// 沿 child 链接遍历节点索引，最多 depth 步
    pub fn walk(&self) -> impl Iterator<Item = usize> + '_ {
        let mut cursor = (!self.nodes.is_empty()).then_some(0);
        (0..self.nodes.len()).map_while(move |_| {
            let index = cursor?;
            cursor = self.nodes.get(index)?.child;
            Some(index)
        })
    }

    /// 按当前本地变换计算各节点世界矩阵
    pub fn world_matrices(&self) -> Vec<Mat4> {
        let mut l2w = self.local_to_world;
        self.walk()
            .map(|i| {
                l2w *= self.nodes[i].local_matrix();
                l2w
            })
            .collect()
    }

    // ========================================
    // 宿主同步
    // ========================================

    /// 从宿主读取当前变换；缺少任何变换时返回缺失的节点，链状态不变
    pub fn pull(&mut self, bridge: &impl TransformBridge) -> std::result::Result<(), NodeId> {
        let local_to_world = bridge.pull_world(self.root).ok_or(self.root)?;
        let tip_local = bridge.pull(self.tip).ok_or(self.tip)?;
        let mut locals = Vec::with_capacity(self.nodes.len());
        for i in self.walk() {
            let id = self.nodes[i].node;
            locals.push(bridge.pull(id).ok_or(id)?);
        }

        self.local_to_world = local_to_world;
        self.tip_local = tip_local;
        for (node, local) in self.nodes.iter_mut().zip(locals) {
            node.state.current = local;
        }
        Ok(())
    }

    /// 用当前外部变换重新捕获默认姿态（父在子前）
    pub fn recapture_default_pose(&mut self) {
        let depth = self.nodes.len();
        for i in 0..depth {
            let child_local_position = match self.nodes[i].child {
                Some(c) => self.nodes[c].state.current.translation,
                None => self.tip_local.translation,
            };
            self.nodes[i].recapture_default(child_local_position);
        }
    }

    // ========================================
    // 临时缓冲区
    // ========================================

    /// 把动态状态拷贝到临时缓冲区
    pub fn gather(&self) -> Vec<NodeState> {
        self.walk().map(|i| self.nodes[i].state).collect()
    }

    /// 写回临时缓冲区；长度不符时整体放弃
    pub fn scatter(&mut self, states: Vec<NodeState>) -> bool {
        if states.len() != self.nodes.len() {
            log::warn!(
                "骨骼链 {:?}: 缓冲区长度 {} 与 depth {} 不符，放弃写回",
                self.root,
                states.len(),
                self.nodes.len()
            );
            return false;
        }
        let order: Vec<usize> = self.walk().collect();
        for (i, state) in order.into_iter().zip(states) {
            self.nodes[i].state = state;
        }
        true
    }

    // ========================================
    // 重置
    // ========================================

    /// 弹簧清零，锚点回到当前链根下静止姿态的子节点位置
    pub fn reset_dynamics(&mut self) {
        let mut l2w = self.local_to_world;
        let order: Vec<usize> = self.walk().collect();
        for i in order {
            let node = &mut self.nodes[i];
            node.reset_dynamics();
            l2w *= node.default_state.local_matrix(node.state.current.scale);
            node.state.last_world_position =
                l2w.transform_point3(node.default_state.child_default_position);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::NodeParams;
    use crate::skeleton::SkeletonPose;
    use glam::Quat;

    /// root -> b0 -> b1 -> tip，沿 -Y 下垂
    fn hanging_chain() -> (SkeletonPose, ChainDescriptor) {
        let mut pose = SkeletonPose::new();
        let root = pose.add_bone(None, BoneTransform::from_translation(Vec3::new(0.0, 2.0, 0.0)));
        let b0 = pose.add_bone(Some(root), BoneTransform::default());
        let down = BoneTransform::from_translation(Vec3::new(0.0, -0.5, 0.0));
        let b1 = pose.add_bone(Some(b0), down);
        let tip = pose.add_bone(Some(b1), down);
        let desc = ChainDescriptor::linear(
            root,
            &[b0, b1],
            tip,
            ChainParams::default(),
            NodeParams::default(),
        );
        (pose, desc)
    }

    #[test]
    fn test_build_captures_rest_pose() {
        let (pose, desc) = hanging_chain();
        let chain = ChainRoot::build(&desc, &pose).expect("valid chain");
        assert_eq!(chain.depth(), 2);
        assert_eq!(chain.node(0).and_then(|n| n.child), Some(1));
        assert!(chain.node(1).map(BoneNode::is_last).unwrap_or(false));

        // 锚点 = 子节点世界位置
        let anchors: Vec<Vec3> =
            chain.nodes().iter().map(|n| n.state.last_world_position).collect();
        assert!(anchors[0].abs_diff_eq(Vec3::new(0.0, 1.5, 0.0), 1e-5));
        assert!(anchors[1].abs_diff_eq(Vec3::new(0.0, 1.0, 0.0), 1e-5));
    }

    #[test]
    fn test_build_missing_transform() {
        let (pose, mut desc) = hanging_chain();
        desc.tip = NodeId(42);
        assert!(matches!(
            ChainRoot::build(&desc, &pose),
            Err(SpringBoneError::MissingTransform(NodeId(42)))
        ));
    }

    #[test]
    fn test_gather_scatter_all_or_nothing() {
        let (pose, desc) = hanging_chain();
        let mut chain = ChainRoot::build(&desc, &pose).expect("valid chain");
        let mut states = chain.gather();
        assert_eq!(states.len(), 2);

        states[1].last_world_position = Vec3::ONE;
        let mut short = states.clone();
        short.pop();
        assert!(!chain.scatter(short));
        assert_ne!(chain.nodes()[1].state.last_world_position, Vec3::ONE);

        assert!(chain.scatter(states));
        assert_eq!(chain.nodes()[1].state.last_world_position, Vec3::ONE);
    }

    #[test]
    fn test_recapture_follows_animation() {
        let (mut pose, desc) = hanging_chain();
        let mut chain = ChainRoot::build(&desc, &pose).expect("valid chain");

        let b1 = desc.nodes[1].node;
        if let Some(local) = pose.local_mut(b1) {
            local.rotation = Quat::from_rotation_z(0.5);
        }
        chain.pull(&pose).expect("all transforms present");
        chain.recapture_default_pose();

        let def = chain.nodes()[1].default_state;
        assert_eq!(def.default_local_rotation, Quat::from_rotation_z(0.5));
        assert!(def
            .child_default_position_mpr
            .abs_diff_eq(Quat::from_rotation_z(0.5) * Vec3::new(0.0, -0.5, 0.0), 1e-6));
    }

    #[test]
    fn test_pull_missing_node_leaves_chain_untouched() {
        let (pose, desc) = hanging_chain();
        let mut chain = ChainRoot::build(&desc, &pose).expect("valid chain");
        chain.root = NodeId(99);
        let before = chain.local_to_world;
        assert_eq!(chain.pull(&pose), Err(NodeId(99)));
        assert_eq!(chain.local_to_world, before);
    }

    #[test]
    fn test_apply_params_requires_same_topology() {
        let (pose, desc) = hanging_chain();
        let mut chain = ChainRoot::build(&desc, &pose).expect("valid chain");

        let mut tuned = desc.clone();
        tuned.params.iteration_count = 4;
        tuned.nodes[0].params.radius = 0.3;
        chain.apply_params(&tuned).expect("same topology");
        assert_eq!(chain.params.iteration_count, 4);
        assert_eq!(chain.nodes()[0].radius, 0.3);

        let mut other = desc.clone();
        other.nodes[0].node = NodeId(3);
        assert_eq!(chain.apply_params(&other), Err(SpringBoneError::TopologyMismatch));
    }

    #[test]
    fn test_world_matrices() {
        let (pose, desc) = hanging_chain();
        let chain = ChainRoot::build(&desc, &pose).expect("valid chain");
        let worlds = chain.world_matrices();
        assert_eq!(worlds.len(), 2);
        assert!(worlds[1].w_axis.truncate().abs_diff_eq(Vec3::new(0.0, 1.5, 0.0), 1e-5));
    }
}
