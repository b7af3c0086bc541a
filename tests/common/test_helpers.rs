use snooze::Operation;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Operation failing with `code` for its first `failures` calls, then succeeding.
///
/// Clones share the call counter so tests can inspect it after the executor consumed the
/// operation.
#[derive(Debug, Clone)]
pub struct Flaky {
    failures: usize,
    code: i32,
    calls: Arc<AtomicUsize>,
}

impl Flaky {
    pub fn new(failures: usize, code: i32) -> Self {
        Self { failures, code, calls: Arc::new(AtomicUsize::new(0)) }
    }

    /// Never succeeds.
    pub fn always(code: i32) -> Self {
        Self::new(usize::MAX, code)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Operation for Flaky {
    fn attempt(&mut self) -> i32 {
        let previous = self.calls.fetch_add(1, Ordering::SeqCst);
        if previous < self.failures {
            self.code
        } else {
            0
        }
    }
}
