//! 碰撞体集合
//!
//! 按链表顺序保存碰撞体（数组 + next 索引），求解时按链表顺序逐个修正。

use glam::Vec3;

use crate::{Result, SpringBoneError};
use super::shape::ColliderShape;

/// 单个碰撞体
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColliderPrimitive {
    /// 形状与几何数据
    pub shape: ColliderShape,
    /// 下一个碰撞体索引（None 表示最后一个）
    pub next: Option<usize>,
}

/// 碰撞体集合（一条单向链表）
#[derive(Clone, Debug, Default)]
pub struct ColliderSet {
    primitives: Vec<ColliderPrimitive>,
    first: Option<usize>,
    last: Option<usize>,
}

impl ColliderSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// 按给定顺序建立链表
    pub fn from_shapes(shapes: impl IntoIterator<Item = ColliderShape>) -> Self {
        let mut set = Self::new();
        for shape in shapes {
            set.push(shape);
        }
        set
    }

    /// 追加到链表末尾，返回索引
    pub fn push(&mut self, shape: ColliderShape) -> usize {
        let index = self.primitives.len();
        self.primitives.push(ColliderPrimitive { shape, next: None });
        match self.last {
            Some(last) => self.primitives[last].next = Some(index),
            None => self.first = Some(index),
        }
        self.last = Some(index);
        index
    }

    /// 更新碰撞体几何（每帧由外部变换驱动）
    pub fn set_shape(&mut self, index: usize, shape: ColliderShape) -> Result<()> {
        let len = self.primitives.len();
        let primitive = self
            .primitives
            .get_mut(index)
            .ok_or(SpringBoneError::ColliderIndexOutOfRange { index, len })?;
        primitive.shape = shape;
        Ok(())
    }

    pub fn get(&self, index: usize) -> Option<&ColliderPrimitive> {
        self.primitives.get(index)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.primitives.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty()
    }

    /// 沿 next 链接遍历
    pub fn iter(&self) -> impl Iterator<Item = &ColliderShape> + '_ {
        let mut cursor = self.first;
        // 最多走 len 步
        (0..self.primitives.len()).map_while(move |_| {
            let index = cursor?;
            let primitive = self.primitives.get(index)?;
            cursor = primitive.next;
            Some(&primitive.shape)
        })
    }

    /// 依次对每个碰撞体求解，后求解者优先；返回是否有任何碰撞
    pub fn solve(&self, point: &mut Vec3, radius: f32) -> bool {
        let mut collided = false;
        for shape in self.iter() {
            collided |= shape.solve(point, radius);
        }
        collided
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_order() {
        let set = ColliderSet::from_shapes([
            ColliderShape::Sphere { center: Vec3::ZERO, radius: 1.0 },
            ColliderShape::Plane { normal: Vec3::Y, offset: 0.0 },
        ]);
        assert_eq!(set.len(), 2);
        assert_eq!(set.get(0).and_then(|p| p.next), Some(1));
        assert_eq!(set.get(1).and_then(|p| p.next), None);

        let kinds: Vec<_> = set.iter().map(|s| s.kind()).collect();
        assert_eq!(kinds.len(), 2);
        assert_eq!(kinds[0], crate::collider::ShapeKind::Sphere);
    }

    #[test]
    fn test_sequential_resolution_last_wins() {
        // 先被球推到 y=-1.1，再被平面推回 y=0.1
        let set = ColliderSet::from_shapes([
            ColliderShape::Sphere { center: Vec3::ZERO, radius: 1.0 },
            ColliderShape::Plane { normal: Vec3::Y, offset: 0.0 },
        ]);
        let mut p = Vec3::new(0.0, -0.5, 0.0);
        assert!(set.solve(&mut p, 0.1));
        assert!(p.abs_diff_eq(Vec3::new(0.0, 0.1, 0.0), 1e-6));
    }

    #[test]
    fn test_empty_set_never_collides() {
        let set = ColliderSet::new();
        let mut p = Vec3::ZERO;
        assert!(!set.solve(&mut p, 1.0));
        assert_eq!(p, Vec3::ZERO);
    }

    #[test]
    fn test_set_shape() {
        let mut set =
            ColliderSet::from_shapes([ColliderShape::Sphere { center: Vec3::ZERO, radius: 1.0 }]);
        set.set_shape(0, ColliderShape::Sphere { center: Vec3::X * 10.0, radius: 1.0 })
            .expect("index 0 exists");
        let mut p = Vec3::ZERO;
        assert!(!set.solve(&mut p, 0.1));
        assert!(matches!(
            set.set_shape(3, ColliderShape::Plane { normal: Vec3::Y, offset: 0.0 }),
            Err(SpringBoneError::ColliderIndexOutOfRange { index: 3, len: 1 })
        ));
    }
}
