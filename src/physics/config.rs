//! 弹簧骨骼全局配置
//!
//! 所有参数扁平化，直接在代码中修改默认值即可。

use glam::Vec3;
use once_cell::sync::Lazy;
use std::sync::RwLock;

/// 弹簧骨骼配置（扁平化，不嵌套）
#[derive(Debug, Clone, PartialEq)]
pub struct JiggleConfig {
    // ========== 外力 ==========
    /// 全局重力加速度，默认 (0, -9.81, 0)
    /// 只对设置了 APPLY_FORCES 的链生效
    pub gravity: Vec3,

    // ========== 模拟参数 ==========
    /// 单帧最大时间步长（秒），默认 1/15
    /// 卡顿后的超长帧会被截断，避免弹簧一步跳过头
    pub max_delta_time: f32,
    /// 每条链子步数上限，默认 16
    pub max_iteration_count: u32,

    // ========== 并行 ==========
    /// 是否用 rayon 并行模拟各条链，默认 true
    pub parallel: bool,
    /// 链数达到此值才并行，默认 2
    pub parallel_min_chains: usize,

    // ========== 调试 ==========
    /// 是否输出调试日志，默认 false
    pub debug_log: bool,
}

impl Default for JiggleConfig {
    fn default() -> Self {
        Self {
            gravity: Vec3::new(0.0, -9.81, 0.0),
            max_delta_time: 1.0 / 15.0,
            max_iteration_count: 16,
            parallel: true,
            parallel_min_chains: 2,
            debug_log: false,
        }
    }
}

/// 全局配置实例
static JIGGLE_CONFIG: Lazy<RwLock<JiggleConfig>> =
    Lazy::new(|| RwLock::new(JiggleConfig::default()));

/// 获取当前配置（只读）
pub fn get_config() -> JiggleConfig {
    JIGGLE_CONFIG.read().unwrap_or_else(|e| e.into_inner()).clone()
}

/// 手动设置配置（用于运行时调试）
pub fn set_config(config: JiggleConfig) {
    *JIGGLE_CONFIG.write().unwrap_or_else(|e| e.into_inner()) = config;
}

/// 重置为默认配置
pub fn reset_config() {
    *JIGGLE_CONFIG.write().unwrap_or_else(|e| e.into_inner()) = JiggleConfig::default();
}
