//! 半衰期参数化的临界阻尼弹簧
//!
//! 以 `e = value - target` 为位移，求解 `e'' + 2λe' + λ²e = 0` 的解析解：
//!
//! ```text
//! u     = v₀ + λe₀
//! e(t)  = (e₀ + u·t)·e^(-λt)
//! e'(t) = (v₀ - λ·u·t)·e^(-λt)
//! ```
//!
//! λ 取 `(1 + λH)·e^(-λH) = 1/2` 的解（λH ≈ 1.678），
//! 即从静止释放的位移经过 H 恰好减半。
//! 解析积分与子步长无关，任意 `dt > 0` 都稳定。

use std::fmt::Debug;
use std::ops::{Add, Mul, Sub};

use glam::Vec3;

// ============================================================================
// 半衰期
// ============================================================================

/// (1 + x)·e^(-x) = 1/2 的正根
const HALF_LIFE_RATE: f32 = 1.678_347;

/// 半衰期（秒）。`H <= 0` 表示瞬间到达目标
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HalfLife(pub f32);

impl HalfLife {
    /// 瞬间到达
    pub const SNAP: Self = Self(0.0);

    #[inline]
    pub fn is_snap(self) -> bool {
        !(self.0 > 0.0)
    }

    /// 衰减率 λ ≈ 1.678 / H
    #[inline]
    pub fn decay_rate(self) -> f32 {
        if self.is_snap() {
            f32::INFINITY
        } else {
            HALF_LIFE_RATE / self.0
        }
    }

    /// 经过 dt 后的指数因子 e^(-λ·dt)
    #[inline]
    pub fn decay(self, dt: f32) -> f32 {
        if self.is_snap() {
            0.0
        } else {
            (-self.decay_rate() * dt).exp()
        }
    }
}

impl Default for HalfLife {
    fn default() -> Self {
        Self(0.1)
    }
}

// ============================================================================
// 弹簧值类型
// ============================================================================

/// 可被弹簧驱动的值（标量或向量）
pub trait SpringValue:
    Copy
    + Debug
    + Default
    + PartialEq
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<f32, Output = Self>
{
}

impl SpringValue for f32 {}
impl SpringValue for Vec3 {}

// ============================================================================
// 阻尼弹簧
// ============================================================================

/// 临界阻尼弹簧状态
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DampedSpring<T: SpringValue> {
    /// 当前值
    pub value: T,
    /// 当前速度
    pub velocity: T,
    /// 目标值
    pub target: T,
    /// 半衰期
    pub half_life: HalfLife,
}

impl<T: SpringValue> DampedSpring<T> {
    /// 静止于零点、目标为零的弹簧
    pub fn new(half_life: HalfLife) -> Self {
        Self {
            value: T::default(),
            velocity: T::default(),
            target: T::default(),
            half_life,
        }
    }

    /// 记录本子步的目标值
    #[inline]
    pub fn set_target(&mut self, target: T) {
        self.target = target;
    }

    /// 覆盖当前值（速度保留）
    #[inline]
    pub fn set_value(&mut self, value: T) {
        self.value = value;
    }

    /// 值与速度清零，目标不变
    #[inline]
    pub fn reset(&mut self) {
        self.value = T::default();
        self.velocity = T::default();
    }

    /// 向目标推进 dt 秒
    pub fn update(&mut self, dt: f32) {
        if self.half_life.is_snap() {
            self.value = self.target;
            self.velocity = T::default();
            return;
        }
        if !(dt > 0.0) {
            return;
        }

        let lambda = self.half_life.decay_rate();
        let decay = self.half_life.decay(dt);
        let e0 = self.value - self.target;
        let v0 = self.velocity;
        let u = v0 + e0 * lambda;

        self.value = self.target + (e0 + u * dt) * decay;
        self.velocity = (v0 - u * (lambda * dt)) * decay;
    }
}

impl<T: SpringValue> Default for DampedSpring<T> {
    fn default() -> Self {
        Self::new(HalfLife::default())
    }
}
