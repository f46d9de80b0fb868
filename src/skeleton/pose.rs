//! 参考宿主骨架
//!
//! 父索引总是小于子索引，因此层级天然无环。
//! local_to_world = origin * ... * parent.local_to_parent * local_to_parent

use glam::{Mat4, Quat, Vec3};

use super::{BoneTransform, NodeId, TransformBridge};

/// 扁平骨架姿态
#[derive(Clone, Debug)]
pub struct SkeletonPose {
    /// 本地变换（local_to_parent）
    locals: Vec<BoneTransform>,
    /// 父骨骼索引
    parents: Vec<Option<usize>>,
    /// 整个层级的世界变换
    origin: Mat4,
}

impl SkeletonPose {
    pub fn new() -> Self {
        Self {
            locals: Vec::new(),
            parents: Vec::new(),
            origin: Mat4::IDENTITY,
        }
    }

    /// 添加骨骼
    ///
    /// 不存在的父节点按根骨骼处理。
    pub fn add_bone(&mut self, parent: Option<NodeId>, local: BoneTransform) -> NodeId {
        let id = self.locals.len();
        let parent = parent.map(NodeId::index).filter(|&p| {
            let ok = p < id;
            if !ok {
                log::warn!("SkeletonPose: 父骨骼 {} 不存在，骨骼 {} 作为根骨骼", p, id);
            }
            ok
        });
        self.locals.push(local);
        self.parents.push(parent);
        NodeId(id as u32)
    }

    /// 骨骼数量
    pub fn len(&self) -> usize {
        self.locals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locals.is_empty()
    }

    /// 层级世界变换
    pub fn origin(&self) -> Mat4 {
        self.origin
    }

    /// 设置层级世界变换（角色移动）
    pub fn set_origin(&mut self, origin: Mat4) {
        self.origin = origin;
    }

    /// 父骨骼
    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.parents
            .get(node.index())
            .copied()
            .flatten()
            .map(|p| NodeId(p as u32))
    }

    pub fn local(&self, node: NodeId) -> Option<&BoneTransform> {
        self.locals.get(node.index())
    }

    pub fn local_mut(&mut self, node: NodeId) -> Option<&mut BoneTransform> {
        self.locals.get_mut(node.index())
    }

    /// 计算世界矩阵
    pub fn world(&self, node: NodeId) -> Option<Mat4> {
        let mut m = self.locals.get(node.index())?.to_matrix();
        let mut cursor = self.parents[node.index()];
        while let Some(p) = cursor {
            m = self.locals[p].to_matrix() * m;
            cursor = self.parents[p];
        }
        Some(self.origin * m)
    }

    /// 世界位置
    pub fn world_position(&self, node: NodeId) -> Option<Vec3> {
        self.world(node).map(|m| m.w_axis.truncate())
    }
}

impl Default for SkeletonPose {
    fn default() -> Self {
        Self::new()
    }
}

impl TransformBridge for SkeletonPose {
    fn pull(&self, node: NodeId) -> Option<BoneTransform> {
        self.local(node).copied()
    }

    fn pull_world(&self, node: NodeId) -> Option<Mat4> {
        self.world(node)
    }

    fn push(&mut self, node: NodeId, position: Vec3, rotation: Quat) {
        if let Some(local) = self.local_mut(node) {
            local.translation = position;
            local.rotation = rotation;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_world_composition() {
        let mut pose = SkeletonPose::new();
        let root = pose.add_bone(None, BoneTransform::from_translation(Vec3::new(0.0, 1.0, 0.0)));
        let child = pose.add_bone(
            Some(root),
            BoneTransform::from_rotation_translation(
                Quat::from_rotation_z(std::f32::consts::FRAC_PI_2),
                Vec3::new(1.0, 0.0, 0.0),
            ),
        );
        let tip = pose.add_bone(Some(child), BoneTransform::from_translation(Vec3::X));

        let p = pose.world_position(tip).expect("tip exists");
        assert!(p.abs_diff_eq(Vec3::new(1.0, 2.0, 0.0), 1e-5));

        assert_eq!(pose.origin(), Mat4::IDENTITY);
        pose.set_origin(Mat4::from_translation(Vec3::new(0.0, 0.0, 5.0)));
        assert_eq!(pose.origin().w_axis.truncate(), Vec3::new(0.0, 0.0, 5.0));
        let p = pose.world_position(tip).expect("tip exists");
        assert!(p.abs_diff_eq(Vec3::new(1.0, 2.0, 5.0), 1e-5));
    }

    #[test]
    fn test_push_keeps_scale() {
        let mut pose = SkeletonPose::new();
        let bone = pose.add_bone(
            None,
            BoneTransform { scale: Vec3::splat(2.0), ..BoneTransform::default() },
        );
        pose.push(bone, Vec3::X, Quat::from_rotation_y(0.3));
        let local = pose.pull(bone).expect("bone exists");
        assert_eq!(local.translation, Vec3::X);
        assert_eq!(local.scale, Vec3::splat(2.0));
    }

    #[test]
    fn test_missing_parent_becomes_root() {
        let mut pose = SkeletonPose::new();
        assert!(pose.is_empty());
        let bone = pose.add_bone(Some(NodeId(7)), BoneTransform::default());
        assert_eq!(pose.len(), 1);
        assert_eq!(pose.parent(bone), None);
        assert!(pose.pull(NodeId(9)).is_none());
        assert!(pose.pull_world(NodeId(9)).is_none());
    }
}
