//! Delay calculation and retry predicates

use crate::types::{RetryPolicy, RetryStrategy};
use rand::Rng;
use std::time::Duration;

/// Delay to wait after `attempt` (1-based) failed
///
/// The strategy's base delay is capped at `max_delay_ms`. With `jitter` up
/// to a quarter of the capped delay is added on top.
///
/// ```rust
/// use dtf_core::retry::calculate_delay;
/// use dtf_core::types::{RetryPolicy, RetryStrategy};
///
/// let policy = RetryPolicy {
///     strategy: RetryStrategy::ExponentialBackoff,
///     initial_delay_ms: 100,
///     backoff_multiplier: 3.0,
///     max_delay_ms: 1000,
///     ..RetryPolicy::default()
/// };
/// assert_eq!(calculate_delay(&policy, 2, false).as_millis(), 300);
/// assert_eq!(calculate_delay(&policy, 4, false).as_millis(), 1000);
/// ```
pub fn calculate_delay(policy: &RetryPolicy, attempt: u32, jitter: bool) -> Duration {
    let step = attempt.saturating_sub(1);

    let base_ms = match policy.strategy {
        RetryStrategy::None => 0,
        RetryStrategy::FixedDelay => policy.initial_delay_ms,
        RetryStrategy::ExponentialBackoff => {
            let factor = policy.backoff_multiplier.powi(step as i32);
            (policy.initial_delay_ms as f64 * factor) as u64
        }
        RetryStrategy::LinearBackoff => policy
            .initial_delay_ms
            .saturating_mul(u64::from(step) + 1),
    };

    let capped_ms = base_ms.min(policy.max_delay_ms);

    let delay_ms = if jitter && capped_ms > 0 {
        capped_ms + rand::rng().random_range(0..=capped_ms / 4)
    } else {
        capped_ms
    };

    Duration::from_millis(delay_ms)
}

/// Decides whether a failed attempt should be retried
pub trait RetryPredicate<E: ?Sized>: Send + Sync {
    fn should_retry(&self, error: &E) -> bool;
}

/// Retries every failure
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysRetry;

impl<E: ?Sized> RetryPredicate<E> for AlwaysRetry {
    fn should_retry(&self, _error: &E) -> bool {
        true
    }
}

/// Predicate backed by a closure
pub struct ClosurePredicate<F> {
    predicate: F,
}

impl<F> ClosurePredicate<F> {
    pub fn new(predicate: F) -> Self {
        Self { predicate }
    }
}

impl<E, F> RetryPredicate<E> for ClosurePredicate<F>
where
    F: Fn(&E) -> bool + Send + Sync,
{
    fn should_retry(&self, error: &E) -> bool {
        (self.predicate)(error)
    }
}
