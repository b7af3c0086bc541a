//! Convenient re-exports for common Snooze types.
pub use crate::{
    backoff::Backoff,
    config::RetryConfig,
    error::{BuildError, RetryError, SleepError},
    operation::Operation,
    retry::{retry_fn, AsyncRetryExecutor, RetryExecutor, TrailingSleep},
    sleeper::{AsyncSleeper, InterruptibleSleeper, Sleeper, ThreadSleeper, TokioSleeper},
    telemetry::{LogObserver, RetryEvent, RetryObserver},
    units::{ERR_NO_ATTEMPTS, MICROSECOND, MILLISECOND, SECOND},
};
