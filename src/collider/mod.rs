//! 碰撞体模块
//!
//! - ColliderShape: 球体 / 胶囊 / 有向盒 / 平面，带标签的几何数据
//! - ColliderSet: 按链表顺序组织的一组碰撞体，可被多条骨骼链只读共享

mod collider_set;
mod shape;

pub use collider_set::{ColliderPrimitive, ColliderSet};
pub use shape::{ColliderShape, ShapeKind};
