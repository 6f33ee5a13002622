//! Retry scheduling policy

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::Deserialize;

const fn default_base_delay() -> u64 {
    60 // 1 minute
}

const fn default_max_delay() -> u64 {
    86400 // 24 hours
}

const fn default_jitter_factor() -> f64 {
    0.2 // ±20%
}

/// When a failed task becomes eligible again
///
/// The default is `Immediate`: a failed task is rescheduled at `now` and a
/// subsequent pass may pick it straight back up, so a dead SMTP server can
/// see `max_attempts` sends in quick succession. Operators who want spacing
/// opt into `Fixed` or `ExponentialBackoff` via configuration.
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RetryPolicy {
    /// Reschedule at `now`; no delay between attempts
    #[default]
    Immediate,

    /// Fixed delay between attempts
    Fixed {
        /// Delay in seconds
        delay_secs: u64,
    },

    /// Exponential backoff with jitter
    ///
    /// `delay = min(base * 2^(attempt - 1), max) * (1 ± jitter)`
    ExponentialBackoff {
        /// Base delay for the first retry (in seconds)
        #[serde(default = "default_base_delay")]
        base_delay_secs: u64,

        /// Cap on the delay between attempts (in seconds)
        #[serde(default = "default_max_delay")]
        max_delay_secs: u64,

        /// Jitter factor (0.0 to 1.0); 0.2 means ±20% randomness,
        /// preventing a thundering herd of simultaneous retries
        #[serde(default = "default_jitter_factor")]
        jitter_factor: f64,
    },
}

impl RetryPolicy {
    /// Exponential backoff with the default parameters
    #[must_use]
    pub const fn exponential() -> Self {
        Self::ExponentialBackoff {
            base_delay_secs: default_base_delay(),
            max_delay_secs: default_max_delay(),
            jitter_factor: default_jitter_factor(),
        }
    }

    /// When the next attempt should happen, given that `attempt` attempts
    /// have now been made (1-indexed: after the first failure, pass 1)
    #[must_use]
    pub fn next_attempt_at(&self, attempt: u32, now: DateTime<Utc>) -> DateTime<Utc> {
        match *self {
            Self::Immediate => now,
            Self::Fixed { delay_secs } => now + Duration::seconds(clamp_secs(delay_secs)),
            Self::ExponentialBackoff {
                base_delay_secs,
                max_delay_secs,
                jitter_factor,
            } => {
                let delay = backoff_delay_secs(attempt, base_delay_secs, max_delay_secs);

                // Apply jitter: delay * (1 ± jitter_factor)
                #[allow(
                    clippy::cast_precision_loss,
                    clippy::cast_possible_truncation,
                    clippy::cast_sign_loss
                )]
                let jittered = {
                    let jitter_range = (delay as f64) * jitter_factor;
                    let jitter: f64 = if jitter_range > 0.0 {
                        rand::rng().random_range(-jitter_range..=jitter_range)
                    } else {
                        0.0
                    };
                    ((delay as f64) + jitter).max(0.0) as u64
                };

                now + Duration::seconds(clamp_secs(jittered))
            }
        }
    }
}

/// Exponential delay with saturating arithmetic: `base * 2^(attempt - 1)`,
/// capped at `max`
fn backoff_delay_secs(attempt: u32, base_secs: u64, max_secs: u64) -> u64 {
    let exponent = attempt.saturating_sub(1);
    if exponent >= 63 {
        // 2^63 would overflow, use the cap directly
        max_secs
    } else {
        base_secs.saturating_mul(1u64 << exponent).min(max_secs)
    }
}

/// chrono::Duration::seconds panics past ~292 billion years; keep inputs sane
#[allow(clippy::cast_possible_wrap)]
fn clamp_secs(secs: u64) -> i64 {
    secs.min(i64::MAX as u64 / 1_000) as i64
}
