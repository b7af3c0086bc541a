//! The unit of work being retried.
//!
//! An [`Operation`] reports its outcome as an integer status: `0` is success, anything else
//! is a failure code whose meaning belongs to the caller. Closures returning `i32` are
//! operations already; implement the trait by hand for stateful work.
//!
//! ```rust
//! use snooze::Operation;
//!
//! struct Countdown(u32);
//!
//! impl Operation for Countdown {
//!     fn attempt(&mut self) -> i32 {
//!         if self.0 == 0 {
//!             return 0;
//!         }
//!         self.0 -= 1;
//!         1
//!     }
//! }
//!
//! let mut op = Countdown(1);
//! assert_eq!(op.attempt(), 1);
//! assert_eq!(op.attempt(), 0);
//! ```

use crate::units::SUCCESS;

/// A zero-argument unit of work returning an integer status.
pub trait Operation {
    /// Run the work once. `0` means success.
    fn attempt(&mut self) -> i32;
}

impl<F> Operation for F
where
    F: FnMut() -> i32,
{
    fn attempt(&mut self) -> i32 {
        self()
    }
}

/// Lift an integer status into a `Result`, keeping the failure code as the error.
pub(crate) fn into_result(status: i32) -> Result<(), i32> {
    if status == SUCCESS {
        Ok(())
    } else {
        Err(status)
    }
}
