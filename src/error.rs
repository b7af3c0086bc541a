//! Error types for retry sequences
//!
//! Three failure kinds share no code paths: a rejected attempt budget (configuration),
//! an operation that kept failing (exhaustion), and a sleep that could not complete
//! (abort). The integer API flattens them back onto one status channel through
//! [`RetryError::status`].
use crate::units::{EINTR, ERR_NO_ATTEMPTS};
use std::io;
use thiserror::Error;

const EIO: i32 = 5;

/// Failure reported by a sleep service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SleepError {
    /// The sleep was cut short by an interruption.
    #[error("sleep interrupted")]
    Interrupted,
    /// The underlying timer failed with an OS error code.
    #[error("sleep failed (os error {code})")]
    Os { code: i32 },
}

impl SleepError {
    /// Integer status for this failure, as the integer API reports it.
    pub fn code(&self) -> i32 {
        match self {
            Self::Interrupted => EINTR,
            Self::Os { code } => *code,
        }
    }

    /// Check if the sleep was interrupted.
    pub fn is_interrupted(&self) -> bool {
        matches!(self, Self::Interrupted)
    }
}

impl From<io::Error> for SleepError {
    fn from(err: io::Error) -> Self {
        if err.kind() == io::ErrorKind::Interrupted {
            return Self::Interrupted;
        }
        Self::Os { code: err.raw_os_error().unwrap_or(EIO) }
    }
}

/// Outcome of a retry sequence that did not succeed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RetryError<E> {
    /// The attempt budget was below one; nothing was invoked.
    #[error("no attempts configured (got {attempts})")]
    InvalidBudget { attempts: i64 },
    /// Every attempt failed; carries the most recent failure.
    #[error("retry failed after {attempts} attempts: {last_error}")]
    OperationFailed { attempts: u32, last_error: E },
    /// The backoff sleep after `attempt` failed and the sequence was abandoned.
    #[error("retry aborted after attempt {attempt}: {cause}")]
    SleepInterrupted {
        attempt: u32,
        #[source]
        cause: SleepError,
    },
}

impl<E> RetryError<E> {
    /// Check if the attempt budget was rejected.
    pub fn is_invalid_budget(&self) -> bool {
        matches!(self, Self::InvalidBudget { .. })
    }

    /// Check if the budget was used up by failing attempts.
    pub fn is_operation_failed(&self) -> bool {
        matches!(self, Self::OperationFailed { .. })
    }

    /// Check if a backoff sleep aborted the sequence.
    pub fn is_sleep_interrupted(&self) -> bool {
        matches!(self, Self::SleepInterrupted { .. })
    }

    /// Number of times the operation was invoked before this error.
    pub fn attempts(&self) -> u32 {
        match self {
            Self::InvalidBudget { .. } => 0,
            Self::OperationFailed { attempts, .. } => *attempts,
            Self::SleepInterrupted { attempt, .. } => *attempt,
        }
    }

    /// Borrow the last operation failure, if the budget was exhausted.
    pub fn last_error(&self) -> Option<&E> {
        match self {
            Self::OperationFailed { last_error, .. } => Some(last_error),
            _ => None,
        }
    }

    /// Take the last operation failure, if the budget was exhausted.
    pub fn into_last_error(self) -> Option<E> {
        match self {
            Self::OperationFailed { last_error, .. } => Some(last_error),
            _ => None,
        }
    }

    /// The sleep failure that aborted the sequence, if any.
    pub fn sleep_cause(&self) -> Option<SleepError> {
        match self {
            Self::SleepInterrupted { cause, .. } => Some(*cause),
            _ => None,
        }
    }

    /// Transform the operation failure, leaving the other variants untouched.
    pub fn map_err<F, O>(self, op: O) -> RetryError<F>
    where
        O: FnOnce(E) -> F,
    {
        match self {
            Self::InvalidBudget { attempts } => RetryError::InvalidBudget { attempts },
            Self::OperationFailed { attempts, last_error } => {
                RetryError::OperationFailed { attempts, last_error: op(last_error) }
            }
            Self::SleepInterrupted { attempt, cause } => {
                RetryError::SleepInterrupted { attempt, cause }
            }
        }
    }
}

impl RetryError<i32> {
    /// Flatten onto the integer status channel: `ERR_NO_ATTEMPTS`, the sleep error code, or
    /// the last operation code.
    pub fn status(&self) -> i32 {
        match self {
            Self::InvalidBudget { .. } => ERR_NO_ATTEMPTS,
            Self::OperationFailed { last_error, .. } => *last_error,
            Self::SleepInterrupted { cause, .. } => cause.code(),
        }
    }
}

/// Errors produced while validating a retry configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    /// Attempt budget must be > 0.
    #[error("max attempts must be > 0 (got {0})")]
    InvalidAttempts(i64),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[derive(Debug, Clone, PartialEq, Eq, Error)]
    #[error("{0}")]
    struct DummyError(&'static str);

    #[test]
    fn operation_failed_display_includes_last_error() {
        let err: RetryError<DummyError> =
            RetryError::OperationFailed { attempts: 3, last_error: DummyError("disk full") };
        let msg = err.to_string();
        assert!(msg.contains("3 attempts"));
        assert!(msg.contains("disk full"));
    }

    #[test]
    fn invalid_budget_display_names_the_budget() {
        let err: RetryError<i32> = RetryError::InvalidBudget { attempts: -1 };
        assert_eq!(err.to_string(), "no attempts configured (got -1)");
    }

    #[test]
    fn sleep_interrupted_exposes_source() {
        let err: RetryError<DummyError> =
            RetryError::SleepInterrupted { attempt: 2, cause: SleepError::Interrupted };
        let source = err.source().expect("sleep cause is the source");
        assert_eq!(source.to_string(), "sleep interrupted");
        assert_eq!(err.sleep_cause(), Some(SleepError::Interrupted));
    }

    #[test]
    fn status_flattens_every_variant() {
        assert_eq!(RetryError::<i32>::InvalidBudget { attempts: 0 }.status(), ERR_NO_ATTEMPTS);
        assert_eq!(RetryError::OperationFailed { attempts: 3, last_error: 7 }.status(), 7);
        assert_eq!(
            RetryError::<i32>::SleepInterrupted { attempt: 1, cause: SleepError::Interrupted }
                .status(),
            EINTR
        );
        assert_eq!(
            RetryError::<i32>::SleepInterrupted {
                attempt: 1,
                cause: SleepError::Os { code: 22 }
            }
            .status(),
            22
        );
    }

    #[test]
    fn predicates_cover_all_variants() {
        let budget: RetryError<DummyError> = RetryError::InvalidBudget { attempts: 0 };
        assert!(budget.is_invalid_budget());
        assert!(!budget.is_operation_failed());
        assert_eq!(budget.attempts(), 0);

        let failed = RetryError::OperationFailed { attempts: 4, last_error: DummyError("x") };
        assert!(failed.is_operation_failed());
        assert_eq!(failed.attempts(), 4);
        assert_eq!(failed.last_error(), Some(&DummyError("x")));

        let aborted: RetryError<DummyError> =
            RetryError::SleepInterrupted { attempt: 2, cause: SleepError::Os { code: 5 } };
        assert!(aborted.is_sleep_interrupted());
        assert_eq!(aborted.attempts(), 2);
        assert!(aborted.last_error().is_none());
    }

    #[test]
    fn map_err_only_touches_operation_failures() {
        let failed: RetryError<i32> = RetryError::OperationFailed { attempts: 2, last_error: 9 };
        let mapped = failed.map_err(|code| format!("code {code}"));
        assert_eq!(mapped.into_last_error().as_deref(), Some("code 9"));

        let budget: RetryError<i32> = RetryError::InvalidBudget { attempts: -3 };
        assert_eq!(
            budget.map_err(|code| code.to_string()),
            RetryError::InvalidBudget { attempts: -3 }
        );
    }

    #[test]
    fn sleep_error_from_io() {
        let interrupted = io::Error::from(io::ErrorKind::Interrupted);
        assert_eq!(SleepError::from(interrupted), SleepError::Interrupted);

        let os = io::Error::from_raw_os_error(22);
        assert_eq!(SleepError::from(os), SleepError::Os { code: 22 });

        let other = io::Error::new(io::ErrorKind::Other, "timer gone");
        assert_eq!(SleepError::from(other).code(), EIO);
    }

    #[test]
    fn build_error_display() {
        assert_eq!(BuildError::InvalidAttempts(0).to_string(), "max attempts must be > 0 (got 0)");
    }
}
