//! 骨骼链
//!
//! - `descriptor`: 注册描述、编辑参数、外力
//! - `bone_node`: 节点（默认姿态 + 弹簧状态）
//! - `chain_root`: 链（节点顺序、宿主同步、临时缓冲区）
//! - `solver`: 逐帧模拟循环

mod bone_node;
mod chain_root;
mod descriptor;
mod solver;

use bitflags::bitflags;

pub use bone_node::{BoneNode, DefaultState, NodeState};
pub use chain_root::ChainRoot;
pub use descriptor::{ChainDescriptor, ChainParams, GravitySource, NodeDescriptor, NodeParams, Wind};
pub use solver::{rot_vec_from_target, rotation_from_vec, simulate_chain, ChainScratch};

bitflags! {
    /// 骨骼链标志
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct ChainFlags: u32 {
        /// 每帧从宿主的动画姿态重新捕获默认姿态
        const WITH_ANIMATION = 1 << 0;
        /// 施加重力与风
        const APPLY_FORCES   = 1 << 1;
    }
}
