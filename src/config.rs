//! Retry configuration as plain data.
//!
//! `RetryConfig` bundles an attempt budget, a base unit and a trailing-sleep policy so a
//! retry sequence can be described once (or loaded from a config file with the `serde`
//! feature) and run many times.
//!
//! ```rust
//! use snooze::{RetryConfig, InstantSleeper};
//! use std::time::Duration;
//!
//! let config = RetryConfig::new(3, Duration::from_millis(10));
//! config.validate().unwrap();
//!
//! let executor = config.builder().with_sleeper(InstantSleeper).build();
//! let status = config.execute_with(&executor, || 7);
//! assert_eq!(status, 7);
//! ```

use crate::error::{BuildError, RetryError};
use crate::operation::{into_result, Operation};
use crate::retry::{RetryExecutor, RetryExecutorBuilder, TrailingSleep};
use crate::units::SUCCESS;
use std::time::Duration;

/// Default attempt budget.
pub const DEFAULT_ATTEMPTS: i32 = 3;

/// Default base unit (one second).
pub const DEFAULT_BASE_UNIT: Duration = Duration::from_secs(1);

/// Attempt budget, base unit and trailing-sleep policy for one kind of retry sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RetryConfig {
    /// Total invocations allowed; must be at least one.
    pub attempts: i32,
    /// Scale factor of the doubling schedule.
    #[cfg_attr(feature = "serde", serde(rename = "base_unit_us", with = "duration_micros"))]
    pub base_unit: Duration,
    pub trailing_sleep: TrailingSleep,
}

impl RetryConfig {
    pub fn new(attempts: i32, base_unit: Duration) -> Self {
        Self { attempts, base_unit, trailing_sleep: TrailingSleep::default() }
    }

    pub fn with_trailing_sleep(mut self, trailing_sleep: TrailingSleep) -> Self {
        self.trailing_sleep = trailing_sleep;
        self
    }

    /// Reject budgets below one. Any base unit is accepted.
    pub fn validate(&self) -> Result<(), BuildError> {
        if self.attempts < 1 {
            return Err(BuildError::InvalidAttempts(i64::from(self.attempts)));
        }
        Ok(())
    }

    /// Executor builder carrying this config's trailing-sleep policy.
    pub fn builder(&self) -> RetryExecutorBuilder {
        RetryExecutor::builder().trailing_sleep(self.trailing_sleep)
    }

    /// Validate, then build an executor with default sleeper and observer.
    pub fn executor(&self) -> Result<RetryExecutor, BuildError> {
        self.validate()?;
        Ok(self.builder().build())
    }

    /// Run `operation` on `executor` with this config's budget and base unit.
    ///
    /// The executor's own trailing-sleep policy applies.
    pub fn run_with<T, E, F>(&self, executor: &RetryExecutor, operation: F) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Result<T, E>,
    {
        executor.drive(i64::from(self.attempts), self.base_unit, operation)
    }

    /// Integer-status flavour of [`RetryConfig::run_with`].
    pub fn execute_with<O>(&self, executor: &RetryExecutor, mut operation: O) -> i32
    where
        O: Operation,
    {
        match self.run_with(executor, || into_result(operation.attempt())) {
            Ok(()) => SUCCESS,
            Err(err) => err.status(),
        }
    }

    /// Run on a default blocking executor built from this config.
    pub fn run<T, E, F>(&self, operation: F) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Result<T, E>,
    {
        self.run_with(&self.builder().build(), operation)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::new(DEFAULT_ATTEMPTS, DEFAULT_BASE_UNIT)
    }
}

#[cfg(feature = "serde")]
mod duration_micros {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_micros()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_micros)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{TrackingSleeper, units::ERR_NO_ATTEMPTS};

    #[test]
    fn default_matches_reference_demo() {
        let config = RetryConfig::default();
        assert_eq!(config.attempts, 3);
        assert_eq!(config.base_unit, Duration::from_secs(1));
        assert_eq!(config.trailing_sleep, TrailingSleep::Preserve);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_bad_values() {
        assert_eq!(
            RetryConfig::new(0, Duration::from_millis(1)).validate(),
            Err(BuildError::InvalidAttempts(0))
        );
        assert!(RetryConfig::new(3, Duration::from_secs(7 * 86_400)).validate().is_ok());
        assert!(RetryConfig::new(-2, Duration::ZERO).executor().is_err());
    }

    #[test]
    fn builder_carries_trailing_policy() {
        let config = RetryConfig::new(2, Duration::from_millis(1))
            .with_trailing_sleep(TrailingSleep::Skip);
        let executor = config.executor().expect("valid config");
        assert_eq!(executor.trailing_sleep(), TrailingSleep::Skip);
    }

    #[test]
    fn run_with_uses_budget_and_base_unit() {
        let sleeper = TrackingSleeper::new();
        let config = RetryConfig::new(3, Duration::from_millis(3))
            .with_trailing_sleep(TrailingSleep::Skip);
        let executor = config.builder().with_sleeper(sleeper.clone()).build();

        let res: Result<(), RetryError<&str>> = config.run_with(&executor, || Err("nope"));
        assert_eq!(res.unwrap_err().into_last_error(), Some("nope"));
        assert_eq!(sleeper.calls(), vec![Duration::from_millis(3), Duration::from_millis(6)]);
    }

    #[test]
    fn invalid_config_run_reports_budget_error() {
        let config = RetryConfig::new(0, Duration::ZERO);
        let executor = config.builder().with_sleeper(TrackingSleeper::new()).build();
        assert_eq!(config.execute_with(&executor, || 0), ERR_NO_ATTEMPTS);
        let res: Result<u8, RetryError<()>> = config.run(|| Ok(1));
        assert!(res.unwrap_err().is_invalid_budget());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serde_shape_uses_microseconds() {
        let config = RetryConfig::new(5, Duration::from_millis(2))
            .with_trailing_sleep(TrailingSleep::Skip);
        let json = serde_json::to_value(config).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "attempts": 5, "base_unit_us": 2000, "trailing_sleep": "skip" })
        );

        let partial: RetryConfig = serde_json::from_str(r#"{ "attempts": 7 }"#).unwrap();
        assert_eq!(partial.attempts, 7);
        assert_eq!(partial.base_unit, DEFAULT_BASE_UNIT);
    }
}
