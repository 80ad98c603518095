//! Retry policy for model calls

use std::time::Duration;

use contracts::{ContractError, ModelConfig};

/// Bounded retry with exponential backoff
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts per prompt, including the first
    pub max_attempts: u32,
    /// Wait before attempt `n + 1` is `backoff_base_secs ^ n`
    pub backoff_base_secs: f64,
    /// Upper bound on a server-supplied `Retry-After`
    pub max_retry_after_secs: u64,
}

impl RetryPolicy {
    pub fn from_config(config: &ModelConfig) -> Self {
        Self {
            max_attempts: config.max_retries.max(1),
            backoff_base_secs: config.backoff_base_secs,
            max_retry_after_secs: config.max_retry_after_secs,
        }
    }

    /// Whether another attempt follows attempt number `attempt` (1-based)
    pub fn allows_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }

    /// Exponential backoff after failed attempt `attempt`
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let secs = self.backoff_base_secs.powi(exponent);
        Duration::try_from_secs_f64(secs)
            .unwrap_or_else(|_| Duration::from_secs(self.max_retry_after_secs))
    }

    /// Wait after a failed attempt; a 429 waits for its `Retry-After`
    pub fn delay_for(&self, error: &ContractError, attempt: u32) -> Duration {
        match error {
            ContractError::RateLimited { retry_after_secs } => {
                Duration::from_secs((*retry_after_secs).min(self.max_retry_after_secs))
            }
            _ => self.backoff(attempt),
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&ModelConfig::default())
    }
}
