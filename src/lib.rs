//! 弹簧骨骼（摇晃物理）引擎
//!
//! 为头发、布条、尾巴、饰品等骨骼链计算二次运动：
//! - spring: 半衰期参数化的临界阻尼弹簧与响应曲线
//! - collider: 球体/胶囊/盒体/平面碰撞体及最小平移求解
//! - chain: 骨骼链数据模型与逐帧模拟循环
//! - skeleton: 与宿主骨架交换变换的桥接接口
//! - physics: 注册管理、并行调度与全局配置

pub mod chain;
pub mod collider;
pub mod physics;
pub mod skeleton;
pub mod spring;

mod error;

pub use error::{Result, SpringBoneError};

pub use chain::{
    BoneNode, ChainDescriptor, ChainFlags, ChainParams, ChainRoot, DefaultState, GravitySource,
    NodeDescriptor, NodeParams, Wind,
};
pub use collider::{ColliderPrimitive, ColliderSet, ColliderShape};
pub use physics::{
    get_config, reset_config, set_config, ChainHandle, ColliderSetHandle, JiggleConfig,
    SpringBoneSystem,
};
pub use skeleton::{BoneTransform, NodeId, SkeletonPose, TransformBridge};
pub use spring::{BezierCurve, Curve, DampedSpring, HalfLife, ResponseRange, SpringValue};
