//! 碰撞体形状与最小平移求解
//!
//! 把带半径的点视为小球，推出到碰撞体表面之外。

use glam::{Quat, Vec3};

/// 退化向量判定阈值
const EPSILON: f32 = 1.0e-6;

/// 形状类型
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    Sphere,
    Capsule,
    Box,
    Plane,
}

/// 碰撞体形状（世界空间）
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ColliderShape {
    /// 球体
    Sphere { center: Vec3, radius: f32 },
    /// 胶囊：两端球心 + 半径
    Capsule { start: Vec3, end: Vec3, radius: f32 },
    /// 有向盒：中心 + 半尺寸 + 旋转
    Box { center: Vec3, half_extents: Vec3, rotation: Quat },
    /// 平面：dot(normal, x) = offset，法线一侧为外部（法线不要求单位长度）
    Plane { normal: Vec3, offset: f32 },
}

impl ColliderShape {
    pub fn kind(&self) -> ShapeKind {
        match self {
            Self::Sphere { .. } => ShapeKind::Sphere,
            Self::Capsule { .. } => ShapeKind::Capsule,
            Self::Box { .. } => ShapeKind::Box,
            Self::Plane { .. } => ShapeKind::Plane,
        }
    }

    /// 求解碰撞
    ///
    /// 重叠时返回修正后的位置，否则返回 None（位置不变）。
    pub fn resolve(&self, point: Vec3, radius: f32) -> Option<Vec3> {
        match *self {
            Self::Sphere { center, radius: r } => solve_sphere(center, r, point, radius),
            Self::Capsule { start, end, radius: r } => {
                let closest = closest_point_on_segment(start, end, point);
                solve_sphere(closest, r, point, radius)
            }
            Self::Box { center, half_extents, rotation } => {
                solve_box(center, half_extents, rotation, point, radius)
            }
            Self::Plane { normal, offset } => solve_plane(normal, offset, point, radius),
        }
    }

    /// 就地求解，返回是否发生碰撞
    #[inline]
    pub fn solve(&self, point: &mut Vec3, radius: f32) -> bool {
        match self.resolve(*point, radius) {
            Some(corrected) => {
                *point = corrected;
                true
            }
            None => false,
        }
    }
}

/// 球 vs 球
fn solve_sphere(center: Vec3, collider_radius: f32, point: Vec3, radius: f32) -> Option<Vec3> {
    let min_dist = collider_radius + radius;
    let diff = point - center;
    let dist_sq = diff.length_squared();
    if dist_sq >= min_dist * min_dist {
        return None;
    }
    let dist = dist_sq.sqrt();
    // 点与球心重合时没有确定的方向，沿 +Y 推出
    let dir = if dist < EPSILON { Vec3::Y } else { diff / dist };
    Some(center + dir * min_dist)
}

/// 线段上离 point 最近的点
fn closest_point_on_segment(start: Vec3, end: Vec3, point: Vec3) -> Vec3 {
    let seg = end - start;
    let len_sq = seg.length_squared();
    if len_sq < EPSILON * EPSILON {
        return start;
    }
    let t = ((point - start).dot(seg) / len_sq).clamp(0.0, 1.0);
    start + seg * t
}

/// 球 vs 有向盒
fn solve_box(
    center: Vec3,
    half_extents: Vec3,
    rotation: Quat,
    point: Vec3,
    radius: f32,
) -> Option<Vec3> {
    let inv_rot = rotation.inverse();
    let local = inv_rot * (point - center);
    let he = half_extents.abs();
    let clamped = local.clamp(-he, he);

    let corrected_local = if clamped != local {
        // 外部：推到最近表面点外 radius 处
        let diff = local - clamped;
        let dist_sq = diff.length_squared();
        if dist_sq >= radius * radius {
            return None;
        }
        let dist = dist_sq.sqrt();
        if dist < EPSILON {
            // 贴着表面：沿越界最多的轴的面法线推出
            let excess = local.abs() - he;
            let axis = max_axis(excess);
            let mut out = local;
            out[axis] = local[axis].signum() * (he[axis] + radius);
            out
        } else {
            clamped + diff * (radius / dist)
        }
    } else {
        // 内部：沿穿透最浅的轴推出
        let depth = he - local.abs();
        let axis = if depth.x <= depth.y && depth.x <= depth.z {
            0
        } else if depth.y <= depth.z {
            1
        } else {
            2
        };
        let mut out = local;
        out[axis] = local[axis].signum() * (he[axis] + radius);
        out
    };

    Some(center + rotation * corrected_local)
}

/// 分量最大的轴
#[inline]
fn max_axis(v: Vec3) -> usize {
    if v.x >= v.y && v.x >= v.z {
        0
    } else if v.y >= v.z {
        1
    } else {
        2
    }
}

/// 球 vs 平面
fn solve_plane(normal: Vec3, offset: f32, point: Vec3, radius: f32) -> Option<Vec3> {
    let len = normal.length();
    if !(len > EPSILON) {
        return None;
    }
    let n = normal / len;
    let dist = n.dot(point) - offset / len;
    if dist >= radius {
        return None;
    }
    Some(point + n * (radius - dist))
}
