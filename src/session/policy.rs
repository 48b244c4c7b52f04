//! Backoff schedules used by the session guard
//!
//! Initialization backs off exponentially (`unit * 2^failures`, capped);
//! wrapped operations back off linearly (`step * (attempt + 1)`).

use std::time::Duration;

use crate::config::GuardSettings;

/// Retry budgets and delays for the session guard
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Acquisition calls per initialization round
    pub max_init_attempts: u32,
    /// Base of the exponential initialization backoff
    pub init_backoff_unit: Duration,
    /// Cap on a single initialization backoff
    pub max_init_backoff: Duration,
    /// Default retry budget for wrapped operations
    pub operation_retries: u32,
    /// Step of the linear operation backoff
    pub operation_backoff_step: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&GuardSettings::default())
    }
}

impl From<&GuardSettings> for RetryPolicy {
    fn from(settings: &GuardSettings) -> Self {
        Self {
            max_init_attempts: settings.max_init_attempts,
            init_backoff_unit: Duration::from_millis(settings.init_backoff_unit_ms),
            max_init_backoff: Duration::from_secs(settings.max_init_backoff_secs),
            operation_retries: settings.operation_retries,
            operation_backoff_step: Duration::from_millis(settings.operation_backoff_ms),
        }
    }
}

impl RetryPolicy {
    /// Wait after the `failures`-th failed acquisition (1-based): 2s, 4s, 8s, ...
    pub fn init_delay(&self, failures: u32) -> Duration {
        let factor = 1u32.checked_shl(failures).unwrap_or(u32::MAX);
        self.init_backoff_unit
            .saturating_mul(factor)
            .min(self.max_init_backoff)
    }

    /// Wait after a failed operation attempt (0-based): 2s, 4s, 6s, ...
    pub fn operation_delay(&self, attempt: u32) -> Duration {
        self.operation_backoff_step
            .saturating_mul(attempt.saturating_add(1))
    }
}
