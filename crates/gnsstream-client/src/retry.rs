use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::secs;

/// What the worker does after a failed connect attempt, or after a
/// connection that ended without delivering any bytes.
///
/// Applied the same way to every transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum RetryPolicy {
    /// Give up after the first failed attempt; the worker stops.
    None,
    /// Wait the same delay before every retry.
    FixedDelay {
        #[serde(with = "secs")]
        delay: Duration,
    },
    /// Double the delay after each consecutive failure, up to `max`.
    ExponentialBackoff {
        #[serde(with = "secs")]
        initial: Duration,
        #[serde(with = "secs")]
        max: Duration,
    },
}

impl RetryPolicy {
    /// Delay used by the default fixed policy.
    pub const DEFAULT_DELAY: Duration = Duration::from_secs(5);

    pub fn fixed(delay: Duration) -> Self {
        RetryPolicy::FixedDelay { delay }
    }

    pub fn backoff(initial: Duration, max: Duration) -> Self {
        RetryPolicy::ExponentialBackoff {
            initial,
            max: max.max(initial),
        }
    }

    /// Delay before the next attempt after `failures` consecutive failures
    /// (1-based), or `None` to give up.
    pub fn delay_for(&self, failures: u32) -> Option<Duration> {
        match *self {
            RetryPolicy::None => None,
            RetryPolicy::FixedDelay { delay } => Some(delay),
            RetryPolicy::ExponentialBackoff { initial, max } => {
                let shift = failures.saturating_sub(1).min(31);
                Some(initial.saturating_mul(1u32 << shift).min(max))
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy::fixed(Self::DEFAULT_DELAY)
    }
}
