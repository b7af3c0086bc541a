//! Abstraction for sleeping/waiting
//!
//! The retry loop never touches a clock itself; it asks a sleep service to wait and gets back
//! either `Ok(())` or a [`SleepError`]. Blocking executors use [`Sleeper`], async executors
//! use [`AsyncSleeper`].
//!
//! Enables fast, deterministic tests without real time delays

use crate::error::SleepError;
use futures::future::BoxFuture;
use std::fmt;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Blocking sleep service.
pub trait Sleeper: Send + Sync + fmt::Debug {
    fn sleep(&self, duration: Duration) -> Result<(), SleepError>;
}

/// Async sleep service.
pub trait AsyncSleeper: Send + Sync + fmt::Debug {
    fn sleep(&self, duration: Duration) -> BoxFuture<'static, Result<(), SleepError>>;
}

/// Production sleeper blocking the calling thread
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) -> Result<(), SleepError> {
        std::thread::sleep(duration);
        Ok(())
    }
}

/// Production sleeper using tokio runtime
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

impl AsyncSleeper for TokioSleeper {
    fn sleep(&self, duration: Duration) -> BoxFuture<'static, Result<(), SleepError>> {
        Box::pin(async move {
            tokio::time::sleep(duration).await;
            Ok(())
        })
    }
}

/// Test sleeper that doesn't actually sleep
#[derive(Debug, Default, Clone, Copy)]
pub struct InstantSleeper;

impl Sleeper for InstantSleeper {
    fn sleep(&self, _duration: Duration) -> Result<(), SleepError> {
        Ok(())
    }
}

impl AsyncSleeper for InstantSleeper {
    fn sleep(&self, _duration: Duration) -> BoxFuture<'static, Result<(), SleepError>> {
        Box::pin(async { Ok(()) })
    }
}

/// Adapts a closure into a blocking sleep service.
#[derive(Clone, Copy)]
pub struct FnSleeper<F>(pub F);

impl<F> fmt::Debug for FnSleeper<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FnSleeper(<fn>)")
    }
}

impl<F> Sleeper for FnSleeper<F>
where
    F: Fn(Duration) -> Result<(), SleepError> + Send + Sync,
{
    fn sleep(&self, duration: Duration) -> Result<(), SleepError> {
        (self.0)(duration)
    }
}

#[derive(Debug, Default)]
struct TrackingState {
    calls: Vec<Duration>,
    fail_at: Option<(usize, SleepError)>,
}

/// Test sleeper that tracks all sleep calls
///
/// Never waits. Can be scripted to fail on one call to simulate an interrupted timer; the
/// failing call is still recorded.
#[derive(Debug, Clone, Default)]
pub struct TrackingSleeper {
    state: Arc<Mutex<TrackingState>>,
}

impl TrackingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the `call`-th sleep (1-based) with `error`.
    pub fn failing_at(call: usize, error: SleepError) -> Self {
        let sleeper = Self::new();
        sleeper.state().fail_at = Some((call, error));
        sleeper
    }

    /// Every requested duration, in order.
    pub fn calls(&self) -> Vec<Duration> {
        self.state().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.state().calls.len()
    }

    pub fn call_at(&self, index: usize) -> Option<Duration> {
        self.state().calls.get(index).copied()
    }

    /// Sum of every requested duration.
    pub fn total(&self) -> Duration {
        self.state().calls.iter().sum()
    }

    pub fn clear(&self) {
        self.state().calls.clear();
    }

    fn state(&self) -> MutexGuard<'_, TrackingState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, duration: Duration) -> Result<(), SleepError> {
        let mut state = self.state();
        state.calls.push(duration);
        match state.fail_at {
            Some((call, error)) if call == state.calls.len() => Err(error),
            _ => Ok(()),
        }
    }
}

impl Sleeper for TrackingSleeper {
    fn sleep(&self, duration: Duration) -> Result<(), SleepError> {
        self.record(duration)
    }
}

impl AsyncSleeper for TrackingSleeper {
    fn sleep(&self, duration: Duration) -> BoxFuture<'static, Result<(), SleepError>> {
        let outcome = self.record(duration);
        Box::pin(async move { outcome })
    }
}

#[derive(Debug, Default)]
struct Signal {
    interrupted: Mutex<bool>,
    wake: Condvar,
}

/// Blocking sleeper whose waits can be cut short from another thread.
///
/// An interrupt raised while nothing is sleeping is latched and fails the next sleep.
/// Each interrupt is consumed by exactly one sleep.
#[derive(Debug, Clone, Default)]
pub struct InterruptibleSleeper {
    signal: Arc<Signal>,
}

/// Handle that interrupts an [`InterruptibleSleeper`].
#[derive(Debug, Clone)]
pub struct Interrupter {
    signal: Arc<Signal>,
}

impl InterruptibleSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    /// A handle that can be moved to another thread.
    pub fn interrupter(&self) -> Interrupter {
        Interrupter { signal: self.signal.clone() }
    }
}

impl Interrupter {
    /// Wake the current sleep with `SleepError::Interrupted`, or fail the next one.
    pub fn interrupt(&self) {
        let mut interrupted =
            self.signal.interrupted.lock().unwrap_or_else(PoisonError::into_inner);
        *interrupted = true;
        self.signal.wake.notify_all();
    }
}

impl Sleeper for InterruptibleSleeper {
    fn sleep(&self, duration: Duration) -> Result<(), SleepError> {
        let deadline = Instant::now().checked_add(duration);
        let mut interrupted =
            self.signal.interrupted.lock().unwrap_or_else(PoisonError::into_inner);
        loop {
            if *interrupted {
                *interrupted = false;
                return Err(SleepError::Interrupted);
            }
            let remaining = match deadline {
                Some(deadline) => deadline.saturating_duration_since(Instant::now()),
                None => duration,
            };
            if remaining.is_zero() {
                return Ok(());
            }
            let (guard, _) = self
                .signal
                .wake
                .wait_timeout(interrupted, remaining)
                .unwrap_or_else(PoisonError::into_inner);
            interrupted = guard;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn instant_sleeper_doesnt_sleep() {
        let sleeper = InstantSleeper;
        let start = Instant::now();
        Sleeper::sleep(&sleeper, Duration::from_secs(10)).unwrap();
        // Should complete almost instantly
        assert!(start.elapsed() < Duration::from_millis(100));
    }

    #[test]
    fn tracking_sleeper_records_calls() {
        let sleeper = TrackingSleeper::new();

        Sleeper::sleep(&sleeper, Duration::from_millis(100)).unwrap();
        Sleeper::sleep(&sleeper, Duration::from_millis(200)).unwrap();
        Sleeper::sleep(&sleeper, Duration::from_millis(400)).unwrap();

        let calls = sleeper.calls();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[0], Duration::from_millis(100));
        assert_eq!(calls[1], Duration::from_millis(200));
        assert_eq!(calls[2], Duration::from_millis(400));
        assert_eq!(sleeper.total(), Duration::from_millis(700));
    }

    #[test]
    fn tracking_sleeper_can_clear() {
        let sleeper = TrackingSleeper::new();

        Sleeper::sleep(&sleeper, Duration::from_millis(100)).unwrap();
        assert_eq!(sleeper.call_count(), 1);

        sleeper.clear();
        assert_eq!(sleeper.call_count(), 0);

        Sleeper::sleep(&sleeper, Duration::from_millis(200)).unwrap();
        assert_eq!(sleeper.call_at(0), Some(Duration::from_millis(200)));
    }

    #[test]
    fn tracking_sleeper_fails_on_scripted_call() {
        let sleeper = TrackingSleeper::failing_at(2, SleepError::Interrupted);
        assert!(Sleeper::sleep(&sleeper, Duration::from_millis(1)).is_ok());
        assert_eq!(
            Sleeper::sleep(&sleeper, Duration::from_millis(2)),
            Err(SleepError::Interrupted)
        );
        assert!(Sleeper::sleep(&sleeper, Duration::from_millis(4)).is_ok());
        assert_eq!(sleeper.call_count(), 3, "failing call is still recorded");
    }

    #[tokio::test]
    async fn tracking_sleeper_is_async_too() {
        let sleeper = TrackingSleeper::failing_at(1, SleepError::Os { code: 22 });
        let res = AsyncSleeper::sleep(&sleeper, Duration::from_millis(5)).await;
        assert_eq!(res, Err(SleepError::Os { code: 22 }));
        assert_eq!(sleeper.calls(), vec![Duration::from_millis(5)]);
    }

    #[test]
    fn thread_sleeper_actually_sleeps() {
        let start = Instant::now();
        ThreadSleeper.sleep(Duration::from_millis(20)).unwrap();
        assert!(start.elapsed() >= Duration::from_millis(20));
    }

    #[tokio::test(start_paused = true)]
    async fn tokio_sleeper_actually_sleeps() {
        let start = tokio::time::Instant::now();
        TokioSleeper.sleep(Duration::from_millis(50)).await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(50));
    }

    #[test]
    fn fn_sleeper_delegates() {
        let sleeper = FnSleeper(|d: Duration| {
            if d > Duration::from_secs(1) {
                Err(SleepError::Os { code: 22 })
            } else {
                Ok(())
            }
        });
        assert!(sleeper.sleep(Duration::from_millis(1)).is_ok());
        assert_eq!(sleeper.sleep(Duration::from_secs(2)), Err(SleepError::Os { code: 22 }));
    }

    #[test]
    fn interruptible_sleeper_completes_without_interrupt() {
        let sleeper = InterruptibleSleeper::new();
        let start = Instant::now();
        sleeper.sleep(Duration::from_millis(20)).unwrap();
        assert!(start.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn latched_interrupt_fails_next_sleep_once() {
        let sleeper = InterruptibleSleeper::new();
        sleeper.interrupter().interrupt();
        assert_eq!(sleeper.sleep(Duration::from_secs(60)), Err(SleepError::Interrupted));
        assert!(sleeper.sleep(Duration::ZERO).is_ok());
    }

    #[test]
    fn interrupt_from_another_thread_wakes_sleeper() {
        let sleeper = InterruptibleSleeper::new();
        let interrupter = sleeper.interrupter();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            interrupter.interrupt();
        });

        let start = Instant::now();
        let res = sleeper.sleep(Duration::from_secs(30));
        handle.join().unwrap();

        assert_eq!(res, Err(SleepError::Interrupted));
        assert!(start.elapsed() < Duration::from_secs(10));
    }
}
