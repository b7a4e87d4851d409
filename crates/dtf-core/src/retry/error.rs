//! Outcome of a retried operation that never succeeded

use std::error::Error;
use std::fmt;
use std::time::Duration;

/// Why a retried operation gave up
///
/// Generic over the operation's own error so callers can get it back with
/// [`RetryError::into_source`].
#[derive(Debug)]
pub enum RetryError<E> {
    /// Every allowed attempt failed
    Exhausted {
        attempts: u32,
        source: E,
        elapsed: Duration,
    },

    /// The predicate refused to retry this failure
    NonRetryable { attempt: u32, source: E },

    /// The policy allowed zero attempts
    NotAttempted,
}

impl<E: fmt::Display> fmt::Display for RetryError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetryError::Exhausted {
                attempts,
                source,
                elapsed,
            } => write!(
                f,
                "gave up after {} attempts in {:.2}s: {}",
                attempts,
                elapsed.as_secs_f64(),
                source
            ),
            RetryError::NonRetryable { attempt, source } => {
                write!(f, "attempt {} failed permanently: {}", attempt, source)
            }
            RetryError::NotAttempted => write!(f, "retry policy allows no attempts"),
        }
    }
}

impl<E: Error + 'static> Error for RetryError<E> {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            RetryError::Exhausted { source, .. } | RetryError::NonRetryable { source, .. } => {
                Some(source)
            }
            RetryError::NotAttempted => None,
        }
    }
}

impl<E> RetryError<E> {
    /// Number of attempts that ran
    pub fn attempts(&self) -> u32 {
        match self {
            RetryError::Exhausted { attempts, .. } => *attempts,
            RetryError::NonRetryable { attempt, .. } => *attempt,
            RetryError::NotAttempted => 0,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self, RetryError::Exhausted { .. })
    }

    pub fn is_non_retryable(&self) -> bool {
        matches!(self, RetryError::NonRetryable { .. })
    }

    /// The last error the operation returned, if it ran at all
    pub fn into_source(self) -> Option<E> {
        match self {
            RetryError::Exhausted { source, .. } | RetryError::NonRetryable { source, .. } => {
                Some(source)
            }
            RetryError::NotAttempted => None,
        }
    }
}
