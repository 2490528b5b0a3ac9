//! Run-time options for a duel
//!
//! The timing of the round answering engine is configurable within the
//! bounds of [`crate::constants::timing`]. Options are validated with
//! `garde` before they are handed to the engine.

use std::time::Duration;

use garde::Validate;
use serde::{Deserialize, Serialize};

type ValidationResult = garde::Result;

/// Validates that a duration falls within specified bounds.
///
/// # Errors
///
/// Returns a `garde::Error` naming the field if the duration is outside the
/// inclusive range `[MIN_SECONDS, MAX_SECONDS]`.
fn validate_duration<const MIN_SECONDS: u64, const MAX_SECONDS: u64>(
    field: &'static str,
    val: &Duration,
) -> ValidationResult {
    if (Duration::from_secs(MIN_SECONDS)..=Duration::from_secs(MAX_SECONDS)).contains(val) {
        Ok(())
    } else {
        Err(garde::Error::new(format!(
            "{field} is outside of the bounds [{MIN_SECONDS},{MAX_SECONDS}]",
        )))
    }
}

fn validate_time_limit(val: &Duration) -> ValidationResult {
    validate_duration::<
        { crate::constants::timing::MIN_TIME_LIMIT },
        { crate::constants::timing::MAX_TIME_LIMIT },
    >("time_limit", val)
}

fn validate_lock_duration(val: &Duration) -> ValidationResult {
    validate_duration::<
        { crate::constants::timing::MIN_LOCK_DURATION },
        { crate::constants::timing::MAX_LOCK_DURATION },
    >("lock_duration", val)
}

/// Timing options for answering a round
#[serde_with::serde_as]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct DuelOptions {
    /// Budget each question gets before it expires unanswered
    #[garde(custom(|v, _| validate_time_limit(v)))]
    #[serde_as(as = "serde_with::DurationMilliSeconds<u64>")]
    pub time_limit: Duration,
    /// Pause after a question locks, during which input is ignored
    #[garde(custom(|v, _| validate_lock_duration(v)))]
    #[serde_as(as = "serde_with::DurationMilliSeconds<u64>")]
    pub lock_duration: Duration,
}

impl Default for DuelOptions {
    fn default() -> Self {
        Self {
            time_limit: Duration::from_secs(crate::constants::timing::DEFAULT_TIME_LIMIT),
            lock_duration: Duration::from_secs(crate::constants::timing::DEFAULT_LOCK_DURATION),
        }
    }
}
