//! Telemetry for retry sequences.
//!
//! Executors report what they do as [`RetryEvent`]s handed to a [`RetryObserver`]. Observers
//! only watch: they cannot change the outcome, delay a retry, or stop the sequence.
//!
//! # Event Types
//!
//! - `Rejected`: the attempt budget was invalid, nothing ran
//! - `Attempt`: an attempt failed and a backoff sleep is about to start
//! - `Succeeded`: an attempt returned success
//! - `Exhausted`: the budget ran out with the operation still failing
//! - `Aborted`: a backoff sleep failed and the sequence was abandoned
//!
//! # Observers
//!
//! - [`LogObserver`] forwards events to `tracing` (the executor default; silent unless a
//!   subscriber is installed)
//! - [`MemoryObserver`] keeps a bounded history, handy in tests
//! - [`NullObserver`] discards everything
//!
//! ```rust
//! use snooze::telemetry::{MemoryObserver, RetryEvent, RetryObserver};
//! use std::time::Duration;
//!
//! let observer = MemoryObserver::new();
//! observer.on_event(&RetryEvent::Attempt { attempt: 1, delay: Duration::from_millis(100) });
//! assert_eq!(observer.len(), 1);
//! ```

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Default bound for `MemoryObserver`.
pub const DEFAULT_MEMORY_CAPACITY: usize = 10_000;

/// Events emitted by retry executors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryEvent {
    /// The attempt budget was below one.
    Rejected {
        /// The budget that was supplied
        attempts: i64,
    },
    /// A failed attempt is about to be followed by a backoff sleep.
    Attempt {
        /// The attempt that failed (1-indexed)
        attempt: u32,
        /// The backoff delay about to be slept
        delay: Duration,
    },
    /// The operation succeeded.
    Succeeded {
        /// Attempts made, including the successful one
        attempts: u32,
    },
    /// Every attempt failed.
    Exhausted {
        /// Total number of attempts made
        attempts: u32,
    },
    /// The sleep after `attempt` failed.
    Aborted {
        /// The attempt whose backoff was interrupted (1-indexed)
        attempt: u32,
        /// Status code reported by the sleep service
        code: i32,
    },
}

impl fmt::Display for RetryEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetryEvent::Rejected { attempts } => write!(f, "Rejected(attempts={})", attempts),
            RetryEvent::Attempt { attempt, delay } => {
                write!(f, "Attempt(#{}, delay={:?})", attempt, delay)
            }
            RetryEvent::Succeeded { attempts } => write!(f, "Succeeded(attempts={})", attempts),
            RetryEvent::Exhausted { attempts } => write!(f, "Exhausted(attempts={})", attempts),
            RetryEvent::Aborted { attempt, code } => {
                write!(f, "Aborted(#{}, code={})", attempt, code)
            }
        }
    }
}

/// Passive consumer of retry events.
pub trait RetryObserver: Send + Sync + fmt::Debug {
    fn on_event(&self, event: &RetryEvent);
}

/// Discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullObserver;

impl RetryObserver for NullObserver {
    fn on_event(&self, _event: &RetryEvent) {}
}

/// Logs events using the `tracing` crate.
///
/// Retries and successes are logged at DEBUG, terminal failures at WARN.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogObserver;

impl RetryObserver for LogObserver {
    fn on_event(&self, event: &RetryEvent) {
        match event {
            RetryEvent::Attempt { attempt, delay } => {
                tracing::debug!(attempt, delay_us = delay.as_micros() as u64, "retry_backoff");
            }
            RetryEvent::Succeeded { attempts } => {
                tracing::debug!(attempts, "retry_succeeded");
            }
            RetryEvent::Rejected { .. }
            | RetryEvent::Exhausted { .. }
            | RetryEvent::Aborted { .. } => {
                tracing::warn!(event = %event, "retry_failed");
            }
        }
    }
}

/// Stores events in memory.
///
/// Bounded: once `capacity` events are held the oldest is evicted for each new one.
#[derive(Clone, Debug)]
pub struct MemoryObserver {
    events: Arc<Mutex<Vec<RetryEvent>>>,
    capacity: usize,
    evicted: Arc<AtomicU64>,
}

impl MemoryObserver {
    /// Creates a bounded memory observer (default cap: 10,000).
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MEMORY_CAPACITY)
    }

    /// Creates a bounded memory observer with explicit capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            events: Arc::new(Mutex::new(Vec::new())),
            capacity: capacity.max(1),
            evicted: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Returns a snapshot of all events received so far.
    pub fn events(&self) -> Vec<RetryEvent> {
        self.guard().clone()
    }

    /// Clears all stored events.
    pub fn clear(&self) {
        self.guard().clear();
    }

    pub fn len(&self) -> usize {
        self.guard().len()
    }

    pub fn is_empty(&self) -> bool {
        self.guard().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the number of evicted events.
    pub fn evicted(&self) -> u64 {
        self.evicted.load(Ordering::Relaxed)
    }

    fn guard(&self) -> MutexGuard<'_, Vec<RetryEvent>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for MemoryObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl RetryObserver for MemoryObserver {
    fn on_event(&self, event: &RetryEvent) {
        let mut guard = self.guard();
        if guard.len() >= self.capacity {
            guard.remove(0);
            self.evicted.fetch_add(1, Ordering::Relaxed);
        }
        guard.push(event.clone());
    }
}
