//! Time-unit scale factors and reserved status codes.
//!
//! The integer API (`RetryExecutor::execute`, `retry_fn`) takes its base unit as a count of
//! microseconds; these constants name the common scales.
//!
//! ```rust
//! use snooze::units::{micros, MILLISECOND, SECOND};
//! use std::time::Duration;
//!
//! assert_eq!(micros(SECOND), Duration::from_secs(1));
//! assert_eq!(micros(250 * MILLISECOND), Duration::from_millis(250));
//! ```

use std::time::Duration;

/// One microsecond, the finest base unit.
pub const MICROSECOND: u64 = 1;

/// One millisecond, in microseconds.
pub const MILLISECOND: u64 = 1_000;

/// One second, in microseconds.
pub const SECOND: u64 = 1_000_000;

/// Status returned by the integer API when the attempt budget is below one.
pub const ERR_NO_ATTEMPTS: i32 = -1;

/// Status of an interrupted sleep (`EINTR`).
pub const EINTR: i32 = 4;

/// Status reported by the integer API for a successful operation.
pub const SUCCESS: i32 = 0;

/// Convert a microsecond count into a `Duration`.
pub const fn micros(count: u64) -> Duration {
    Duration::from_micros(count)
}
