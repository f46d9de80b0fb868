//! 错误类型
//!
//! 只有注册期与句柄查找会返回错误；每帧的模拟流程不会失败。

use thiserror::Error;

use crate::skeleton::NodeId;

/// 弹簧骨骼系统错误
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SpringBoneError {
    /// 骨骼链为空（depth = 0 或没有节点）
    #[error("bone chain is empty")]
    EmptyChain,

    /// 从首节点沿子链接走出的节点数与 depth 不一致
    #[error("chain depth mismatch: expected {expected}, found {found}")]
    DepthMismatch { expected: usize, found: usize },

    /// 子链接形成环
    #[error("cyclic child link at node {index}")]
    CyclicChain { index: usize },

    /// 子链接索引越界
    #[error("node {index} links to child {child}, which is out of range")]
    ChildOutOfRange { index: usize, child: usize },

    /// 描述中存在不在链上的节点
    #[error("node {index} is not reachable from the first node")]
    UnreachableNode { index: usize },

    /// 宿主无法提供该节点的变换
    #[error("host has no transform for node {0:?}")]
    MissingTransform(NodeId),

    /// 过期或无效的骨骼链句柄
    #[error("invalid chain handle")]
    InvalidChainHandle,

    /// 过期或无效的碰撞体集合句柄
    #[error("invalid collider set handle")]
    InvalidColliderSetHandle,

    /// 碰撞体索引越界
    #[error("collider index {index} out of range (set has {len})")]
    ColliderIndexOutOfRange { index: usize, len: usize },

    /// 重设参数时拓扑与已注册的链不一致
    #[error("chain topology does not match the registered chain")]
    TopologyMismatch,

    /// 参数非法
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

/// 结果类型别名
pub type Result<T> = std::result::Result<T, SpringBoneError>;
