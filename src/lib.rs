#![forbid(unsafe_code)]
#![deny(warnings)]
#![cfg_attr(not(test), deny(clippy::all))]

//! # Snooze 💤
//!
//! Retry with exponential backoff: run an operation up to `n` times, sleeping
//! `2^i * base_unit` after failed attempt `i`, and report how it ended.
//!
//! ## Features
//!
//! - **Integer contract**: `0` is success, anything else a caller-defined failure code
//! - **Typed contract** for `Result`-returning operations with [`RetryError`]
//! - **Pluggable sleep service**: blocking, interruptible, tokio, or fake for tests
//! - **Observers** for retry events, logging through `tracing` by default
//!
//! ## Quick Start
//!
//! ```rust
//! use snooze::{retry_fn, units::MICROSECOND};
//!
//! let mut calls = 0;
//! let status = retry_fn(3, MICROSECOND, || {
//!     calls += 1;
//!     if calls == 2 { 0 } else { 1 }
//! });
//! assert_eq!(status, 0);
//! assert_eq!(calls, 2);
//! ```
//!
//! ## Typed errors
//!
//! ```rust
//! use snooze::{RetryError, RetryExecutor, InstantSleeper};
//! use std::time::Duration;
//!
//! let executor = RetryExecutor::builder().with_sleeper(InstantSleeper).build();
//! let res: Result<(), RetryError<&str>> =
//!     executor.run(2, Duration::from_millis(50), || Err("connection refused"));
//! assert_eq!(res.unwrap_err().to_string(), "retry failed after 2 attempts: connection refused");
//! ```

pub mod backoff;
pub mod config;
pub mod error;
pub mod operation;
pub mod prelude;
pub mod retry;
pub mod sleeper;
pub mod telemetry;
pub mod units;

// Re-exports
pub use backoff::Backoff;
pub use config::RetryConfig;
pub use error::{BuildError, RetryError, SleepError};
pub use operation::Operation;
pub use retry::{
    retry_fn, AsyncRetryExecutor, AsyncRetryExecutorBuilder, RetryExecutor,
    RetryExecutorBuilder, TrailingSleep,
};
pub use sleeper::{
    AsyncSleeper, FnSleeper, InstantSleeper, InterruptibleSleeper, Interrupter, Sleeper,
    ThreadSleeper, TokioSleeper, TrackingSleeper,
};
pub use telemetry::{LogObserver, MemoryObserver, NullObserver, RetryEvent, RetryObserver};
pub use units::ERR_NO_ATTEMPTS;
