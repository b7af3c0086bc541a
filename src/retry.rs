//! Retry executor implementation
//!
//! Runs a fallible operation up to a fixed number of times, sleeping `2^i * base_unit` after
//! failed attempt `i` (0-based).
//!
//! Semantics:
//! - The attempt budget counts total invocations (initial try + retries). A budget below one
//!   is rejected before anything runs.
//! - Success short-circuits: no further invocations and no sleep.
//! - A sleep failure abandons the sequence at once and is reported instead of the operation's
//!   failure.
//! - Budget exhausted: the most recent failure is reported, never a history.
//! - By default a backoff sleep also follows the final failed attempt
//!   ([`TrailingSleep::Preserve`]); [`TrailingSleep::Skip`] drops that last pause.
//!
//! Invariants:
//! - Attempts never exceed the budget.
//! - Delays passed to the sleeper double each time: `base, 2*base, 4*base, ...`.
//! - Executors keep no per-call state; one instance can serve concurrent callers.
//!
//! Example
//! ```rust
//! use snooze::{RetryExecutor, InstantSleeper, units::MILLISECOND};
//!
//! let executor = RetryExecutor::builder().with_sleeper(InstantSleeper).build();
//!
//! let mut calls = 0;
//! let status = executor.execute(3, MILLISECOND, || {
//!     calls += 1;
//!     if calls < 2 { 1 } else { 0 }
//! });
//! assert_eq!(status, 0);
//! assert_eq!(calls, 2);
//! ```

use crate::error::{RetryError, SleepError};
use crate::operation::{into_result, Operation};
use crate::sleeper::{AsyncSleeper, Sleeper, ThreadSleeper, TokioSleeper};
use crate::telemetry::{LogObserver, RetryEvent, RetryObserver};
use crate::units::{micros, SUCCESS};
use crate::Backoff;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Whether the final failed attempt is followed by a backoff sleep before giving up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum TrailingSleep {
    /// Sleep after every failed attempt, including the last (`n` sleeps for `n` failures).
    #[default]
    Preserve,
    /// Give up right after the last failure (`n - 1` sleeps).
    Skip,
}

/// What to do after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct AfterFailure {
    delay: Option<Duration>,
    exhausted: bool,
}

/// Attempt bookkeeping for one retry sequence.
#[derive(Debug)]
struct Schedule {
    budget: u32,
    made: u32,
    backoff: Backoff,
    trailing: TrailingSleep,
}

impl Schedule {
    fn start<E>(
        attempts: i64,
        base_unit: Duration,
        trailing: TrailingSleep,
        observer: &dyn RetryObserver,
    ) -> Result<Self, RetryError<E>> {
        let budget = match u32::try_from(attempts) {
            Ok(budget) if budget >= 1 => budget,
            _ => {
                observer.on_event(&RetryEvent::Rejected { attempts });
                return Err(RetryError::InvalidBudget { attempts });
            }
        };
        Ok(Self {
            budget,
            made: 0,
            backoff: Backoff::exponential(base_unit),
            trailing,
        })
    }

    /// Count an invocation, returning its 1-based number.
    fn begin(&mut self) -> u32 {
        self.made += 1;
        self.made
    }

    fn after_failure(&self) -> AfterFailure {
        let exhausted = self.made >= self.budget;
        let sleeps = !exhausted || self.trailing == TrailingSleep::Preserve;
        AfterFailure {
            delay: sleeps.then(|| self.backoff.delay(self.made - 1)),
            exhausted,
        }
    }
}

fn aborted<E>(observer: &dyn RetryObserver, attempt: u32, cause: SleepError) -> RetryError<E> {
    observer.on_event(&RetryEvent::Aborted { attempt, code: cause.code() });
    RetryError::SleepInterrupted { attempt, cause }
}

fn exhausted<E>(observer: &dyn RetryObserver, attempts: u32, last_error: E) -> RetryError<E> {
    observer.on_event(&RetryEvent::Exhausted { attempts });
    RetryError::OperationFailed { attempts, last_error }
}

/// Blocking retry executor: backoff sleeps occupy the calling thread.
#[derive(Debug, Clone)]
pub struct RetryExecutor {
    sleeper: Arc<dyn Sleeper>,
    observer: Arc<dyn RetryObserver>,
    trailing_sleep: TrailingSleep,
}

impl RetryExecutor {
    /// Executor with the defaults: thread sleep, `tracing` observer, trailing sleep preserved.
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Construct a new builder with defaults.
    pub fn builder() -> RetryExecutorBuilder {
        RetryExecutorBuilder::new()
    }

    /// The configured trailing-sleep policy.
    pub fn trailing_sleep(&self) -> TrailingSleep {
        self.trailing_sleep
    }

    /// Integer contract: `base_unit` in microseconds; returns `0`, the last operation code,
    /// a sleep error code, or `ERR_NO_ATTEMPTS`.
    pub fn execute<O>(&self, attempts: i32, base_unit: u64, operation: O) -> i32
    where
        O: Operation,
    {
        match self.try_execute(attempts, micros(base_unit), operation) {
            Ok(()) => SUCCESS,
            Err(err) => err.status(),
        }
    }

    /// Typed view of an integer-status operation.
    pub fn try_execute<O>(
        &self,
        attempts: i32,
        base_unit: Duration,
        mut operation: O,
    ) -> Result<(), RetryError<i32>>
    where
        O: Operation,
    {
        self.drive(i64::from(attempts), base_unit, || into_result(operation.attempt()))
    }

    /// Retry a `Result`-returning operation.
    pub fn run<T, E, F>(
        &self,
        attempts: u32,
        base_unit: Duration,
        operation: F,
    ) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Result<T, E>,
    {
        self.drive(i64::from(attempts), base_unit, operation)
    }

    pub(crate) fn drive<T, E, F>(
        &self,
        attempts: i64,
        base_unit: Duration,
        mut operation: F,
    ) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Result<T, E>,
    {
        let observer = self.observer.as_ref();
        let mut schedule =
            Schedule::start::<E>(attempts, base_unit, self.trailing_sleep, observer)?;

        loop {
            let attempt = schedule.begin();
            let err = match operation() {
                Ok(value) => {
                    observer.on_event(&RetryEvent::Succeeded { attempts: attempt });
                    return Ok(value);
                }
                Err(err) => err,
            };

            let next = schedule.after_failure();
            if let Some(delay) = next.delay {
                observer.on_event(&RetryEvent::Attempt { attempt, delay });
                if let Err(cause) = self.sleeper.sleep(delay) {
                    return Err(aborted(observer, attempt, cause));
                }
            }
            if next.exhausted {
                return Err(exhausted(observer, attempt, err));
            }
        }
    }
}

impl Default for RetryExecutor {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `RetryExecutor`.
pub struct RetryExecutorBuilder {
    sleeper: Arc<dyn Sleeper>,
    observer: Arc<dyn RetryObserver>,
    trailing_sleep: TrailingSleep,
}

impl RetryExecutorBuilder {
    /// Create a builder with sane defaults.
    pub fn new() -> Self {
        Self {
            sleeper: Arc::new(ThreadSleeper),
            observer: Arc::new(LogObserver),
            trailing_sleep: TrailingSleep::default(),
        }
    }

    /// Provide a custom sleeper implementation.
    pub fn with_sleeper<S>(mut self, sleeper: S) -> Self
    where
        S: Sleeper + 'static,
    {
        self.sleeper = Arc::new(sleeper);
        self
    }

    /// Provide an observer for retry events.
    pub fn with_observer<O>(mut self, observer: O) -> Self
    where
        O: RetryObserver + 'static,
    {
        self.observer = Arc::new(observer);
        self
    }

    /// Choose whether to sleep after the final failed attempt.
    pub fn trailing_sleep(mut self, trailing_sleep: TrailingSleep) -> Self {
        self.trailing_sleep = trailing_sleep;
        self
    }

    pub fn build(self) -> RetryExecutor {
        RetryExecutor {
            sleeper: self.sleeper,
            observer: self.observer,
            trailing_sleep: self.trailing_sleep,
        }
    }
}

impl Default for RetryExecutorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Async retry executor: backoff sleeps are suspension points instead of blocking calls.
///
/// Ordering, delays and error mapping match [`RetryExecutor`]; attempts still run one at a
/// time.
#[derive(Debug, Clone)]
pub struct AsyncRetryExecutor {
    sleeper: Arc<dyn AsyncSleeper>,
    observer: Arc<dyn RetryObserver>,
    trailing_sleep: TrailingSleep,
}

impl AsyncRetryExecutor {
    /// Executor with the defaults: tokio sleep, `tracing` observer, trailing sleep preserved.
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> AsyncRetryExecutorBuilder {
        AsyncRetryExecutorBuilder::new()
    }

    pub fn trailing_sleep(&self) -> TrailingSleep {
        self.trailing_sleep
    }

    /// Integer contract for async operations resolving to a status code.
    pub async fn execute<Fut, Op>(&self, attempts: i32, base_unit: u64, mut operation: Op) -> i32
    where
        Fut: Future<Output = i32>,
        Op: FnMut() -> Fut,
    {
        let outcome = self
            .drive(i64::from(attempts), micros(base_unit), || {
                let fut = operation();
                async move { into_result(fut.await) }
            })
            .await;
        match outcome {
            Ok(()) => SUCCESS,
            Err(err) => err.status(),
        }
    }

    /// Retry an async `Result`-returning operation.
    pub async fn run<T, E, Fut, Op>(
        &self,
        attempts: u32,
        base_unit: Duration,
        operation: Op,
    ) -> Result<T, RetryError<E>>
    where
        Fut: Future<Output = Result<T, E>>,
        Op: FnMut() -> Fut,
    {
        self.drive(i64::from(attempts), base_unit, operation).await
    }

    async fn drive<T, E, Fut, Op>(
        &self,
        attempts: i64,
        base_unit: Duration,
        mut operation: Op,
    ) -> Result<T, RetryError<E>>
    where
        Fut: Future<Output = Result<T, E>>,
        Op: FnMut() -> Fut,
    {
        let observer = self.observer.as_ref();
        let mut schedule =
            Schedule::start::<E>(attempts, base_unit, self.trailing_sleep, observer)?;

        loop {
            let attempt = schedule.begin();
            let err = match operation().await {
                Ok(value) => {
                    observer.on_event(&RetryEvent::Succeeded { attempts: attempt });
                    return Ok(value);
                }
                Err(err) => err,
            };

            let next = schedule.after_failure();
            if let Some(delay) = next.delay {
                observer.on_event(&RetryEvent::Attempt { attempt, delay });
                if let Err(cause) = self.sleeper.sleep(delay).await {
                    return Err(aborted(observer, attempt, cause));
                }
            }
            if next.exhausted {
                return Err(exhausted(observer, attempt, err));
            }
        }
    }
}

impl Default for AsyncRetryExecutor {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `AsyncRetryExecutor`.
pub struct AsyncRetryExecutorBuilder {
    sleeper: Arc<dyn AsyncSleeper>,
    observer: Arc<dyn RetryObserver>,
    trailing_sleep: TrailingSleep,
}

impl AsyncRetryExecutorBuilder {
    pub fn new() -> Self {
        Self {
            sleeper: Arc::new(TokioSleeper),
            observer: Arc::new(LogObserver),
            trailing_sleep: TrailingSleep::default(),
        }
    }

    /// Provide a custom sleeper implementation.
    pub fn with_sleeper<S>(mut self, sleeper: S) -> Self
    where
        S: AsyncSleeper + 'static,
    {
        self.sleeper = Arc::new(sleeper);
        self
    }

    pub fn with_observer<O>(mut self, observer: O) -> Self
    where
        O: RetryObserver + 'static,
    {
        self.observer = Arc::new(observer);
        self
    }

    pub fn trailing_sleep(mut self, trailing_sleep: TrailingSleep) -> Self {
        self.trailing_sleep = trailing_sleep;
        self
    }

    pub fn build(self) -> AsyncRetryExecutor {
        AsyncRetryExecutor {
            sleeper: self.sleeper,
            observer: self.observer,
            trailing_sleep: self.trailing_sleep,
        }
    }
}

impl Default for AsyncRetryExecutorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Retry `operation` with a blocking default executor.
///
/// `base_unit` is in microseconds (see [`crate::units`]). Returns `0` on success, otherwise
/// the last failure code, a sleep error code, or `ERR_NO_ATTEMPTS`.
pub fn retry_fn<O>(attempts: i32, base_unit: u64, operation: O) -> i32
where
    O: Operation,
{
    RetryExecutor::new().execute(attempts, base_unit, operation)
}
