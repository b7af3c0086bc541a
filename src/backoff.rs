//! Doubling backoff schedule.
//!
//! The delay after failed attempt `i` (0-based) is `2^i * base`. There is no jitter and no
//! cap: delays keep doubling until they no longer fit in a `Duration`, at which point they
//! saturate to `Duration::MAX`.
//!
//! Example
//! ```rust
//! use std::time::Duration;
//! use snooze::Backoff;
//!
//! let backoff = Backoff::exponential(Duration::from_millis(100));
//! assert_eq!(backoff.delay(0), Duration::from_millis(100)); // after the first failure
//! assert_eq!(backoff.delay(1), Duration::from_millis(200));
//! assert_eq!(backoff.delay(2), Duration::from_millis(400));
//! ```

use std::time::Duration;

const NANOS_PER_SEC: u128 = 1_000_000_000;

/// Exponential backoff with a doubling factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    base: Duration,
}

impl Backoff {
    /// Create an exponential backoff starting at `base`.
    ///
    /// A zero base degenerates to back-to-back retries.
    pub const fn exponential(base: Duration) -> Self {
        Self { base }
    }

    /// The scale factor all delays are multiples of.
    pub fn base(&self) -> Duration {
        self.base
    }

    /// Delay to wait after the failed attempt with 0-based index `attempt`.
    ///
    /// Saturates to `Duration::MAX` only when `2^attempt * base` is not representable.
    pub fn delay(&self, attempt: u32) -> Duration {
        if self.base.is_zero() {
            return Duration::ZERO;
        }
        1u128
            .checked_shl(attempt)
            .and_then(|multiplier| self.base.as_nanos().checked_mul(multiplier))
            .and_then(duration_from_nanos)
            .unwrap_or(Duration::MAX)
    }
}

fn duration_from_nanos(nanos: u128) -> Option<Duration> {
    let secs = u64::try_from(nanos / NANOS_PER_SEC).ok()?;
    Some(Duration::new(secs, (nanos % NANOS_PER_SEC) as u32))
}

impl From<Duration> for Backoff {
    fn from(base: Duration) -> Self {
        Self::exponential(base)
    }
}
