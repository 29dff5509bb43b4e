use super::BackoffPolicy;
use std::time::Duration;

/// 固定延迟退避策略
#[derive(Debug, Clone, Copy)]
pub struct FixedBackoff {
    delay: Duration,
}

impl FixedBackoff {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl BackoffPolicy for FixedBackoff {
    fn backoff_duration(&self, _attempt: usize) -> Duration {
        self.delay
    }
}
