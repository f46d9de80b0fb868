//! 骨骼链模拟
//!
//! 每帧对一条链执行：
//! 1. gather: 动态状态拷贝到临时缓冲区
//! 2. 子步循环（iteration_count 次，dt = frame_dt / iteration_count）：
//!    外力（重力 + 风）的整帧位移在第一个子步施加到锚点，
//!    父在子前逐节点执行 碰撞 → 目标计算 → 弹簧推进 → 姿态重建 → 世界矩阵传播 → 锚点缓存
//! 3. 返回缓冲区，由调用方 scatter 写回
//!
//! 函数只读访问链与碰撞体，不同链之间可以并行。

use glam::{Mat4, Quat, Vec3};

use crate::collider::ColliderSet;
use crate::spring::ResponseRange;

use super::bone_node::{BoneNode, NodeState};
use super::chain_root::ChainRoot;
use super::ChainFlags;

/// 低于此混合率视为纯旋转
const ROTATE_ONLY_THRESHOLD: f32 = 0.001;
/// 高于此混合率视为纯平移
const SHIFT_ONLY_THRESHOLD: f32 = 0.999;
/// 叉积长度低于此值视为方向平行
const PARALLEL_EPSILON: f32 = 0.001;
/// 旋转向量长度低于此值视为无旋转
const MIN_ROTATION_ANGLE: f32 = 0.001;

/// 一条链的模拟结果
#[derive(Clone, Debug)]
pub struct ChainScratch {
    pub states: Vec<NodeState>,
}

/// 模拟一帧
///
/// `max_iterations` 为子步数上限（全局配置）。
pub fn simulate_chain(
    chain: &ChainRoot,
    colliders: Option<&ColliderSet>,
    frame_dt: f32,
    max_iterations: u32,
) -> ChainScratch {
    let mut states = chain.gather();

    let iterations = chain.params.iteration_count.min(max_iterations).max(1);
    let dt = frame_dt / iterations as f32;
    let rs_rate = chain.params.shift_rotate_mix;

    // 外力位移按整帧计算，只在第一个子步施加，结果与子步数无关
    let forcing = if chain.params.flags.contains(ChainFlags::APPLY_FORCES) {
        (chain.gravity + chain.params.wind.acceleration()) * (frame_dt * frame_dt)
    } else {
        Vec3::ZERO
    };

    let nodes = chain.nodes();
    for substep in 0..iterations {
        let nudge = if substep == 0 { forcing } else { Vec3::ZERO };
        let mut l2w = chain.local_to_world;
        for (pos, index) in chain.walk().enumerate() {
            step_node(&nodes[index], &mut states[pos], &mut l2w, colliders, nudge, rs_rate, dt);
        }
    }

    ChainScratch { states }
}

/// 单节点单子步
///
/// `l2w` 进入时为父节点的世界矩阵，离开时为本节点的世界矩阵。
fn step_node(
    node: &BoneNode,
    state: &mut NodeState,
    l2w: &mut Mat4,
    colliders: Option<&ColliderSet>,
    forcing: Vec3,
    rs_rate: f32,
    dt: f32,
) {
    let def = &node.default_state;
    let rotates = rs_rate <= SHIFT_ONLY_THRESHOLD;
    let shifts = rs_rate >= ROTATE_ONLY_THRESHOLD;

    // 假设先端移动到了上一子步缓存的位置，先在该位置解决碰撞
    let mut anchor = state.last_world_position + forcing;
    if let Some(set) = colliders {
        set.solve(&mut anchor, node.radius);
    }

    // 以锚点为先端目标，求旋转 / 平移响应
    let target = l2w.inverse().transform_point3(anchor) - def.default_local_position;
    let cdp_mpr = def.child_default_position_mpr;
    let (mut rot_vec, mut sft_vec) = if rs_rate < ROTATE_ONLY_THRESHOLD {
        (rot_vec_from_target(target, cdp_mpr, &node.rotation_range), Vec3::ZERO)
    } else if SHIFT_ONLY_THRESHOLD < rs_rate {
        (Vec3::ZERO, node.shift_range.map_vector(target - cdp_mpr))
    } else {
        (
            rot_vec_from_target(target, cdp_mpr, &node.rotation_range) * (1.0 - rs_rate),
            node.shift_range.map_vector((target - cdp_mpr) * rs_rate),
        )
    };

    // 弹簧推进：当前位移载入弹簧后向静止点回复
    if rotates {
        state.rotation_spring.set_value(rot_vec);
        state.rotation_spring.update(dt);
        rot_vec = state.rotation_spring.value;
    }
    if shifts {
        state.shift_spring.set_value(sft_vec);
        state.shift_spring.update(dt);
        sft_vec = state.shift_spring.value;
    }

    // 姿态重建
    let rotation = if rotates {
        rotation_from_vec(rot_vec) * def.default_local_rotation
    } else {
        def.default_local_rotation
    };
    let position = if shifts {
        def.default_local_position + sft_vec
    } else {
        def.default_local_position
    };
    state.current.rotation = rotation;
    state.current.translation = position;

    // 世界矩阵传播（父在子前）
    *l2w *= Mat4::from_scale_rotation_translation(state.current.scale, rotation, position);

    // 锚点取静止子偏移，不取模拟后的子节点位置
    state.last_world_position = l2w.transform_point3(def.child_default_position);
}

/// 从先端目标位置求旋转向量（方向 = 旋转轴，长度 = 角度）
///
/// 两方向接近平行时返回零向量。
pub fn rot_vec_from_target(target: Vec3, child_default_mpr: Vec3, range: &ResponseRange) -> Vec3 {
    let child_dir = child_default_mpr.normalize_or_zero();
    let target_dir = target.normalize_or_zero();

    let crs = child_dir.cross(target_dir);
    let crs_norm = crs.length();
    if crs_norm < PARALLEL_EPSILON {
        return Vec3::ZERO;
    }
    let theta = child_dir.dot(target_dir).clamp(-1.0, 1.0).acos();
    let theta = range.map_scalar(theta);
    crs * (theta / crs_norm)
}

/// 旋转向量解码为四元数
#[inline]
pub fn rotation_from_vec(rot_vec: Vec3) -> Quat {
    let theta = rot_vec.length();
    if theta < MIN_ROTATION_ANGLE {
        Quat::IDENTITY
    } else {
        Quat::from_axis_angle(rot_vec / theta, theta)
    }
}
