//! 变换桥接
//!
//! 模拟前从宿主读取当前本地变换（链根额外读取世界矩阵），
//! 模拟后只写回本地位置与旋转，缩放永远不被模拟修改。

use glam::{Mat4, Quat, Vec3};

use super::{BoneTransform, NodeId};

/// 宿主骨架需要实现的接口
pub trait TransformBridge {
    /// 读取节点当前本地变换
    fn pull(&self, node: NodeId) -> Option<BoneTransform>;

    /// 读取节点当前世界矩阵（只对链根调用）
    fn pull_world(&self, node: NodeId) -> Option<Mat4>;

    /// 写回模拟结果
    fn push(&mut self, node: NodeId, position: Vec3, rotation: Quat);
}
