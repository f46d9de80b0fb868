//! 响应曲线
//!
//! 把弹簧输入（旋转角 / 平移量）映射到实际响应量：
//! - BezierCurve: [0,1] 上的归一化三次贝塞尔查找表
//! - ResponseRange: 最大范围 + 曲线，超出范围时饱和

use glam::{Vec2, Vec3};

/// 曲线 trait
pub trait Curve {
    fn value(&self, v: f32) -> f32;
}

/// 三次贝塞尔曲线（端点固定为 (0,0) 与 (1,1)）
#[derive(Debug, Clone, PartialEq)]
pub struct BezierCurve {
    /// 预计算的曲线采样点
    points: Vec<Vec2>,
}

impl BezierCurve {
    const P0: Vec2 = Vec2::ZERO;
    const P1: Vec2 = Vec2::ONE;

    /// 默认采样间隔数
    pub const DEFAULT_INTERVAL: u32 = 64;

    /// 创建新的贝塞尔曲线
    ///
    /// # 参数
    /// - `c0`: 控制点1 (归一化到 0-1 范围)
    /// - `c1`: 控制点2 (归一化到 0-1 范围)
    /// - `interval`: 采样间隔数
    pub fn new(c0: Vec2, c1: Vec2, interval: u32) -> Self {
        let c0 = c0.clamp(Vec2::ZERO, Vec2::ONE);
        let c1 = c1.clamp(Vec2::ZERO, Vec2::ONE);
        let interval = interval.max(1);
        let mut points = Vec::with_capacity((interval + 1) as usize);
        let interval_f = interval as f32;

        for i in 0..=interval {
            let t = i as f32 / interval_f;
            let it = 1.0 - t;
            // B(t) = (1-t)³P₀ + 3(1-t)²tP₁ + 3(1-t)t²P₂ + t³P₃
            let point = Self::P0 * it.powi(3)
                + c0 * 3.0 * it.powi(2) * t
                + c1 * 3.0 * it * t.powi(2)
                + Self::P1 * t.powi(3);
            points.push(point);
        }

        // 按 X 排序以便查找
        points.sort_unstable_by(|a, b| a.x.total_cmp(&b.x));

        Self { points }
    }

    /// 线性曲线 y = x
    pub fn linear() -> Self {
        Self::new(Vec2::splat(1.0 / 3.0), Vec2::splat(2.0 / 3.0), 1)
    }
}

impl Default for BezierCurve {
    fn default() -> Self {
        Self::linear()
    }
}

impl Curve for BezierCurve {
    /// 使用预计算的采样点进行线性插值查找，输入钳制到 [0,1]
    fn value(&self, v: f32) -> f32 {
        let v = v.clamp(0.0, 1.0);
        let mut n = (self.points[0], self.points[1]);
        for point in &self.points[2..] {
            if n.1.x > v {
                break;
            }
            n = (n.1, *point);
        }
        if n.0.x == n.1.x {
            n.0.y
        } else {
            n.0.y + (v - n.0.x) * (n.1.y - n.0.y) / (n.1.x - n.0.x)
        }
    }
}

// ============================================================================
// 响应范围
// ============================================================================

/// 响应范围：`|x| < max` 时按曲线映射，否则饱和到 `max`
///
/// `max = +inf` 且无曲线时为恒等映射。
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseRange {
    /// 最大响应量（旋转为弧度，平移为长度单位）
    pub max: f32,
    /// 归一化响应曲线，None 表示线性
    pub curve: Option<BezierCurve>,
}

impl ResponseRange {
    /// 恒等映射
    pub fn unbounded() -> Self {
        Self { max: f32::INFINITY, curve: None }
    }

    /// 线性映射并在 `max` 处饱和
    pub fn clamped(max: f32) -> Self {
        Self { max, curve: None }
    }

    /// 带曲线的映射
    pub fn with_curve(max: f32, curve: BezierCurve) -> Self {
        Self { max, curve: Some(curve) }
    }

    /// 参数是否合法
    pub fn is_valid(&self) -> bool {
        !self.max.is_nan() && self.max >= 0.0
    }

    /// 标量映射（保持符号）
    pub fn map_scalar(&self, x: f32) -> f32 {
        let mag = x.abs();
        if mag >= self.max {
            return self.max.copysign(x);
        }
        let mapped = match &self.curve {
            Some(curve) if self.max.is_finite() => self.max * curve.value(mag / self.max),
            _ => mag,
        };
        mapped.copysign(x)
    }

    /// 向量映射：映射长度，保持方向
    pub fn map_vector(&self, v: Vec3) -> Vec3 {
        let len = v.length();
        if len < 1.0e-6 {
            return v;
        }
        v * (self.map_scalar(len) / len)
    }
}

impl Default for ResponseRange {
    fn default() -> Self {
        Self::unbounded()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_curve() {
        let curve = BezierCurve::linear();
        assert!((curve.value(0.0) - 0.0).abs() < 0.01);
        assert!((curve.value(0.5) - 0.5).abs() < 0.01);
        assert!((curve.value(1.0) - 1.0).abs() < 0.01);
        // 超出定义域时钳制
        assert!((curve.value(2.0) - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_ease_in_curve() {
        let curve =
            BezierCurve::new(Vec2::new(0.42, 0.0), Vec2::ONE, BezierCurve::DEFAULT_INTERVAL);
        assert!(curve.value(0.25) < 0.25);
        assert!((curve.value(1.0) - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_unbounded_range_is_identity() {
        let range = ResponseRange::unbounded();
        assert_eq!(range.map_scalar(0.7), 0.7);
        assert_eq!(range.map_scalar(-3.0), -3.0);
        let v = Vec3::new(1.0, -2.0, 0.5);
        assert!(range.map_vector(v).abs_diff_eq(v, 1e-6));
    }

    #[test]
    fn test_clamped_range_saturates() {
        let range = ResponseRange::clamped(0.5);
        assert_eq!(range.map_scalar(0.2), 0.2);
        assert_eq!(range.map_scalar(2.0), 0.5);
        assert_eq!(range.map_scalar(-2.0), -0.5);

        let v = range.map_vector(Vec3::new(0.0, 3.0, 4.0));
        assert!((v.length() - 0.5).abs() < 1e-5);
        assert!(v.normalize().abs_diff_eq(Vec3::new(0.0, 0.6, 0.8), 1e-5));
    }

    #[test]
    fn test_curved_range() {
        let range = ResponseRange::with_curve(
            1.0,
            BezierCurve::new(Vec2::new(0.42, 0.0), Vec2::ONE, BezierCurve::DEFAULT_INTERVAL),
        );
        let y = range.map_scalar(0.25);
        assert!(y > 0.0 && y < 0.25);
        assert!(range.map_scalar(-0.25) < 0.0);
    }
}
