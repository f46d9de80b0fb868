//! 弹簧骨骼系统模块
//!
//! 对外提供注册、每帧调度与全局配置。
//!
//! ## 每帧流程
//! | 阶段 | 说明 |
//! |------|------|
//! | pull | 读取链根世界矩阵与节点本地变换，按需重新捕获默认姿态 |
//! | step | 各条链独立模拟（rayon 并行），结果写回链的持久状态 |
//! | push | 节点本地位置/旋转写回宿主，缩放不变 |

mod handle;
mod spring_bone_system;
pub mod config;

pub use handle::{ChainHandle, ChainTag, ColliderSetHandle, ColliderSetTag, Handle};
pub use spring_bone_system::SpringBoneSystem;
pub use config::{JiggleConfig, get_config, set_config, reset_config};
