//! 骨骼链注册描述与编辑参数
//!
//! 注册时一次性校验拓扑：从首节点沿子链接恰好走 depth 步、无环、无游离节点。

use glam::Vec3;

use crate::physics::ColliderSetHandle;
use crate::skeleton::NodeId;
use crate::spring::{HalfLife, ResponseRange};
use crate::{Result, SpringBoneError};

use super::ChainFlags;

// ============================================================================
// 外力
// ============================================================================

/// 重力来源
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GravitySource {
    /// 全局重力乘以缩放
    Global { scale: f32 },
    /// 自定义重力加速度
    Custom(Vec3),
}

impl GravitySource {
    /// 求值
    #[inline]
    pub fn evaluate(&self, global: Vec3) -> Vec3 {
        match *self {
            Self::Global { scale } => global * scale,
            Self::Custom(g) => g,
        }
    }
}

impl Default for GravitySource {
    fn default() -> Self {
        Self::Global { scale: 1.0 }
    }
}

/// 风
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Wind {
    /// 风速
    pub velocity: Vec3,
    /// 空气阻力系数
    pub air_drag: f32,
}

impl Wind {
    /// 风产生的加速度
    #[inline]
    pub fn acceleration(&self) -> Vec3 {
        self.velocity * self.air_drag
    }
}

// ============================================================================
// 参数
// ============================================================================

/// 单节点编辑参数
#[derive(Clone, Debug, PartialEq)]
pub struct NodeParams {
    /// 先端碰撞半径
    pub radius: f32,
    /// 旋转弹簧半衰期
    pub rotation_half_life: HalfLife,
    /// 平移弹簧半衰期
    pub shift_half_life: HalfLife,
    /// 旋转响应范围（弧度）
    pub rotation_range: ResponseRange,
    /// 平移响应范围
    pub shift_range: ResponseRange,
}

impl Default for NodeParams {
    fn default() -> Self {
        Self {
            radius: 0.02,
            rotation_half_life: HalfLife::default(),
            shift_half_life: HalfLife::default(),
            rotation_range: ResponseRange::unbounded(),
            shift_range: ResponseRange::unbounded(),
        }
    }
}

/// 骨骼链参数
#[derive(Clone, Debug, PartialEq)]
pub struct ChainParams {
    /// 每帧子步数（>= 1）
    pub iteration_count: u32,
    /// 平移/旋转混合率，0 = 纯旋转，1 = 纯平移
    pub shift_rotate_mix: f32,
    /// 标志
    pub flags: ChainFlags,
    /// 重力来源
    pub gravity: GravitySource,
    /// 风
    pub wind: Wind,
}

impl Default for ChainParams {
    fn default() -> Self {
        Self {
            iteration_count: 1,
            shift_rotate_mix: 0.0,
            flags: ChainFlags::empty(),
            gravity: GravitySource::default(),
            wind: Wind::default(),
        }
    }
}

// ============================================================================
// 描述
// ============================================================================

/// 节点描述
#[derive(Clone, Debug, PartialEq)]
pub struct NodeDescriptor {
    /// 宿主变换
    pub node: NodeId,
    /// 子节点在 nodes 中的索引
    pub child: Option<usize>,
    /// 编辑参数
    pub params: NodeParams,
}

/// 骨骼链描述
#[derive(Clone, Debug, PartialEq)]
pub struct ChainDescriptor {
    /// 链根：首节点的父变换，提供 local_to_world
    pub root: NodeId,
    /// 首节点在 nodes 中的索引
    pub first: usize,
    /// 节点数量
    pub depth: usize,
    /// 节点描述（任意顺序，由 child 链接）
    pub nodes: Vec<NodeDescriptor>,
    /// 末节点的子变换（不参与模拟，只提供静止偏移）
    pub tip: NodeId,
    /// 链参数
    pub params: ChainParams,
    /// 碰撞体集合
    pub collider_set: Option<ColliderSetHandle>,
}

impl ChainDescriptor {
    /// 按顺序串联的骨骼链
    pub fn linear(
        root: NodeId,
        bones: &[NodeId],
        tip: NodeId,
        params: ChainParams,
        node_params: NodeParams,
    ) -> Self {
        let nodes = bones
            .iter()
            .enumerate()
            .map(|(i, &node)| NodeDescriptor {
                node,
                child: (i + 1 < bones.len()).then_some(i + 1),
                params: node_params.clone(),
            })
            .collect();
        Self {
            root,
            first: 0,
            depth: bones.len(),
            nodes,
            tip,
            params,
            collider_set: None,
        }
    }

    /// 设置碰撞体集合
    pub fn with_colliders(mut self, set: ColliderSetHandle) -> Self {
        self.collider_set = Some(set);
        self
    }

    /// 校验拓扑与参数，返回从首节点开始的遍历顺序
    pub fn validate(&self) -> Result<Vec<usize>> {
        if self.depth == 0 || self.nodes.is_empty() {
            return Err(SpringBoneError::EmptyChain);
        }
        if self.first >= self.nodes.len() {
            return Err(SpringBoneError::InvalidParameter(format!(
                "first node index {} out of range ({} nodes)",
                self.first,
                self.nodes.len()
            )));
        }

        let mut visited = vec![false; self.nodes.len()];
        let mut order = Vec::with_capacity(self.depth);
        let mut cursor = Some(self.first);
        while let Some(index) = cursor {
            if visited[index] {
                return Err(SpringBoneError::CyclicChain { index });
            }
            visited[index] = true;
            order.push(index);

            cursor = self.nodes[index].child;
            if let Some(child) = cursor {
                if child >= self.nodes.len() {
                    return Err(SpringBoneError::ChildOutOfRange { index, child });
                }
            }
        }

        if order.len() != self.depth {
            return Err(SpringBoneError::DepthMismatch { expected: self.depth, found: order.len() });
        }
        if let Some(index) = visited.iter().position(|v| !v) {
            return Err(SpringBoneError::UnreachableNode { index });
        }

        self.validate_params()?;
        Ok(order)
    }

    fn validate_params(&self) -> Result<()> {
        let params = &self.params;
        if params.iteration_count == 0 {
            return Err(SpringBoneError::InvalidParameter("iteration_count must be >= 1".into()));
        }
        if !(0.0..=1.0).contains(&params.shift_rotate_mix) {
            return Err(SpringBoneError::InvalidParameter(format!(
                "shift_rotate_mix {} not in [0, 1]",
                params.shift_rotate_mix
            )));
        }
        for (index, node) in self.nodes.iter().enumerate() {
            let p = &node.params;
            if !p.radius.is_finite() || p.radius < 0.0 {
                return Err(SpringBoneError::InvalidParameter(format!(
                    "node {} radius {}",
                    index, p.radius
                )));
            }
            if !p.rotation_range.is_valid() || !p.shift_range.is_valid() {
                return Err(SpringBoneError::InvalidParameter(format!(
                    "node {} response range",
                    index
                )));
            }
            if p.rotation_half_life.0.is_nan() || p.shift_half_life.0.is_nan() {
                return Err(SpringBoneError::InvalidParameter(format!(
                    "node {} half-life is NaN",
                    index
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain(depth: usize) -> ChainDescriptor {
        let bones: Vec<NodeId> = (1..=depth as u32).map(NodeId).collect();
        ChainDescriptor::linear(
            NodeId(0),
            &bones,
            NodeId(depth as u32 + 1),
            ChainParams::default(),
            NodeParams::default(),
        )
    }

    #[test]
    fn test_linear_chain_is_valid() {
        let desc = chain(3);
        assert_eq!(desc.validate(), Ok(vec![0, 1, 2]));
    }

    #[test]
    fn test_out_of_order_nodes() {
        let mut desc = chain(3);
        // 2 -> 0 -> 1
        desc.first = 2;
        desc.nodes[2].child = Some(0);
        desc.nodes[0].child = Some(1);
        desc.nodes[1].child = None;
        assert_eq!(desc.validate(), Ok(vec![2, 0, 1]));
    }

    #[test]
    fn test_empty_chain() {
        let mut desc = chain(1);
        desc.depth = 0;
        assert_eq!(desc.validate(), Err(SpringBoneError::EmptyChain));
        desc.depth = 1;
        desc.nodes.clear();
        assert_eq!(desc.validate(), Err(SpringBoneError::EmptyChain));
    }

    #[test]
    fn test_cycle_rejected() {
        let mut desc = chain(3);
        desc.nodes[2].child = Some(0);
        assert_eq!(desc.validate(), Err(SpringBoneError::CyclicChain { index: 0 }));
    }

    #[test]
    fn test_depth_mismatch_and_unreachable() {
        let mut desc = chain(3);
        desc.depth = 4;
        assert_eq!(desc.validate(), Err(SpringBoneError::DepthMismatch { expected: 4, found: 3 }));

        let mut desc = chain(3);
        desc.nodes[1].child = None;
        desc.depth = 2;
        assert_eq!(desc.validate(), Err(SpringBoneError::UnreachableNode { index: 2 }));
    }

    #[test]
    fn test_child_out_of_range() {
        let mut desc = chain(2);
        desc.nodes[1].child = Some(9);
        assert_eq!(desc.validate(), Err(SpringBoneError::ChildOutOfRange { index: 1, child: 9 }));
    }

    #[test]
    fn test_invalid_params() {
        let mut desc = chain(2);
        desc.params.iteration_count = 0;
        assert!(matches!(desc.validate(), Err(SpringBoneError::InvalidParameter(_))));

        let mut desc = chain(2);
        desc.params.shift_rotate_mix = 1.5;
        assert!(matches!(desc.validate(), Err(SpringBoneError::InvalidParameter(_))));

        let mut desc = chain(2);
        desc.nodes[0].params.radius = -1.0;
        assert!(matches!(desc.validate(), Err(SpringBoneError::InvalidParameter(_))));
    }

    #[test]
    fn test_gravity_source() {
        let g = Vec3::new(0.0, -9.8, 0.0);
        assert_eq!(GravitySource::Global { scale: 0.5 }.evaluate(g), Vec3::new(0.0, -4.9, 0.0));
        assert_eq!(GravitySource::Custom(Vec3::X).evaluate(g), Vec3::X);
        let wind = Wind { velocity: Vec3::new(2.0, 0.0, 0.0), air_drag: 0.5 };
        assert_eq!(wind.acceleration(), Vec3::X);
    }
}
