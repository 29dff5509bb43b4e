//! 重试策略模块

pub mod fixed;

pub use fixed::FixedBackoff;

use std::time::Duration;

/// 退避策略 trait
///
/// 监听循环不设重试上限，只需要知道每次失败后等待多久
pub trait BackoffPolicy: Send + Sync {
    /// 第 `attempt` 次连续失败后的等待时间（从 1 开始）
    fn backoff_duration(&self, attempt: usize) -> Duration;
}
