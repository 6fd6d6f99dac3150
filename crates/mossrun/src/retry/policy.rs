use std::time::Duration;

use crate::config::RetryConfig;

/// Exponential backoff limits for one controller run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackoffPolicy {
    /// Growth factor, in `[1, 2]`.
    pub base: f64,
    /// Total attempts allowed, the first one included.
    pub max_attempts: u32,
    /// Upper bound on the summed waits of a run.
    pub max_total: Duration,
}

impl BackoffPolicy {
    pub fn new(base: f64, max_attempts: u32, max_total: Duration) -> Self {
        Self {
            base,
            max_attempts,
            max_total,
        }
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(
            config.backoff_base,
            config.max_attempts,
            Duration::from_secs(config.max_retry_duration_secs),
        )
    }

    /// Wait after failed attempt `attempt` (0-indexed): `base^attempt` seconds.
    pub fn delay(&self, attempt: u32) -> Duration {
        let secs = self.base.powi(attempt.min(i32::MAX as u32) as i32);
        Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}
