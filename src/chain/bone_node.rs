//! 骨骼链节点
//!
//! BoneNode 是骨骼链的单元，分为：
//! - 静态数据：宿主标识、碰撞半径、响应范围、子链接
//! - 默认姿态：弹簧的零参考
//! - 动态数据：弹簧状态、锚点缓存、当前本地变换（可整体拷贝到临时缓冲区）

use glam::{Mat4, Quat, Vec3};

use crate::skeleton::{BoneTransform, NodeId};
use crate::spring::{DampedSpring, HalfLife, ResponseRange};

use super::descriptor::NodeParams;

// ============================================================================
// 默认姿态
// ============================================================================

/// 默认（静止）姿态
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DefaultState {
    /// 默认本地旋转
    pub default_local_rotation: Quat,
    /// 默认本地位置
    pub default_local_position: Vec3,
    /// 子节点默认本地位置（本节点空间）
    pub child_default_position: Vec3,
    /// 子节点默认位置经本节点默认旋转与缩放变换后的结果（父空间偏移，MPR 空间）
    pub child_default_position_mpr: Vec3,
}

impl DefaultState {
    /// 从当前本地变换与子节点本地位置捕获默认姿态
    pub fn capture(local: &BoneTransform, child_local_position: Vec3) -> Self {
        Self {
            default_local_rotation: local.rotation,
            default_local_position: local.translation,
            child_default_position: child_local_position,
            child_default_position_mpr: local.rotation * (local.scale * child_local_position),
        }
    }

    /// 默认姿态下的本地矩阵
    #[inline]
    pub fn local_matrix(&self, scale: Vec3) -> Mat4 {
        Mat4::from_scale_rotation_translation(
            scale,
            self.default_local_rotation,
            self.default_local_position,
        )
    }
}

impl Default for DefaultState {
    fn default() -> Self {
        Self {
            default_local_rotation: Quat::IDENTITY,
            default_local_position: Vec3::ZERO,
            child_default_position: Vec3::ZERO,
            child_default_position_mpr: Vec3::ZERO,
        }
    }
}

// ============================================================================
// 动态状态
// ============================================================================

/// 每帧变化的节点状态
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NodeState {
    /// 旋转向量空间弹簧
    pub rotation_spring: DampedSpring<Vec3>,
    /// 平移空间弹簧
    pub shift_spring: DampedSpring<Vec3>,
    /// 上一子步缓存的先端世界位置（弹簧目标锚点）
    pub last_world_position: Vec3,
    /// 当前本地变换（模拟结果写回宿主）
    pub current: BoneTransform,
}

impl NodeState {
    pub fn new(
        rotation_half_life: HalfLife,
        shift_half_life: HalfLife,
        current: BoneTransform,
    ) -> Self {
        Self {
            rotation_spring: DampedSpring::new(rotation_half_life),
            shift_spring: DampedSpring::new(shift_half_life),
            last_world_position: Vec3::ZERO,
            current,
        }
    }
}

// ============================================================================
// 骨骼链节点
// ============================================================================

/// 骨骼链节点
#[derive(Clone, Debug)]
pub struct BoneNode {
    /// 宿主变换标识
    pub node: NodeId,
    /// 先端碰撞半径
    pub radius: f32,
    /// 旋转响应范围（弧度）
    pub rotation_range: ResponseRange,
    /// 平移响应范围
    pub shift_range: ResponseRange,
    /// 默认姿态
    pub default_state: DefaultState,
    /// 动态状态
    pub state: NodeState,
    /// 子节点在链内的索引（None 表示最后一个）
    pub child: Option<usize>,
}

impl BoneNode {
    /// 创建节点，默认姿态取自当前本地变换
    pub fn new(
        node: NodeId,
        params: &NodeParams,
        current: BoneTransform,
        child_local_position: Vec3,
    ) -> Self {
        Self {
            node,
            radius: params.radius,
            rotation_range: params.rotation_range.clone(),
            shift_range: params.shift_range.clone(),
            default_state: DefaultState::capture(&current, child_local_position),
            state: NodeState::new(params.rotation_half_life, params.shift_half_life, current),
            child: None,
        }
    }

    /// 重新应用编辑参数（弹簧状态保留）
    pub fn apply_params(&mut self, params: &NodeParams) {
        self.radius = params.radius;
        self.rotation_range = params.rotation_range.clone();
        self.shift_range = params.shift_range.clone();
        self.state.rotation_spring.half_life = params.rotation_half_life;
        self.state.shift_spring.half_life = params.shift_half_life;
    }

    // ========================================
    // 访问器
    // ========================================

    #[inline]
    pub fn is_last(&self) -> bool {
        self.child.is_none()
    }

    /// 当前本地矩阵
    #[inline]
    pub fn local_matrix(&self) -> Mat4 {
        self.state.current.to_matrix()
    }

    /// 弹簧是否静止
    #[inline]
    pub fn is_at_rest(&self) -> bool {
        let s = &self.state;
        s.rotation_spring.value == Vec3::ZERO
            && s.rotation_spring.velocity == Vec3::ZERO
            && s.shift_spring.value == Vec3::ZERO
            && s.shift_spring.velocity == Vec3::ZERO
    }

    // ========================================
    // 动态数据维护
    // ========================================

    /// 弹簧清零，当前变换回到默认姿态（缩放保留）
    pub fn reset_dynamics(&mut self) {
        self.state.rotation_spring.reset();
        self.state.shift_spring.reset();
        self.state.current.rotation = self.default_state.default_local_rotation;
        self.state.current.translation = self.default_state.default_local_position;
    }

    /// 用当前本地变换重新捕获默认姿态
    #[inline]
    pub fn recapture_default(&mut self, child_local_position: Vec3) {
        self.default_state = DefaultState::capture(&self.state.current, child_local_position);
    }
}
