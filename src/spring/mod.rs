//! 弹簧模型
//!
//! - DampedSpring: 半衰期参数化的临界阻尼弹簧，同时用于旋转向量空间与平移空间
//! - ResponseRange: 把目标量映射到响应量的范围曲线

mod damped_spring;
mod response_curve;

pub use damped_spring::{DampedSpring, HalfLife, SpringValue};
pub use response_curve::{BezierCurve, Curve, ResponseRange};
