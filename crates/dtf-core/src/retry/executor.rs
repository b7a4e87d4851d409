//! Runs an async operation until it succeeds or its policy runs out

use std::fmt::Display;
use std::future::Future;
use std::time::Instant;

use crate::types::RetryPolicy;

use super::error::RetryError;
use super::observer::{NoOpObserver, RetryObserver};
use super::strategies::{calculate_delay, AlwaysRetry, RetryPredicate};

/// Retry `op` under `policy`, retrying every failure, without observation
pub async fn retry_with_policy<F, Fut, T, E>(policy: &RetryPolicy, op: F) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    RetryExecutor::new(policy.clone()).execute(op).await
}

/// Policy, predicate and observer bundled for repeated use
pub struct RetryExecutor<P = AlwaysRetry, O = NoOpObserver> {
    policy: RetryPolicy,
    predicate: P,
    observer: O,
    jitter: bool,
}

impl RetryExecutor {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            predicate: AlwaysRetry,
            observer: NoOpObserver,
            jitter: true,
        }
    }
}

impl<P, O> RetryExecutor<P, O> {
    pub fn with_predicate<P2>(self, predicate: P2) -> RetryExecutor<P2, O> {
        RetryExecutor {
            policy: self.policy,
            predicate,
            observer: self.observer,
            jitter: self.jitter,
        }
    }

    pub fn with_observer<O2>(self, observer: O2) -> RetryExecutor<P, O2> {
        RetryExecutor {
            policy: self.policy,
            predicate: self.predicate,
            observer,
            jitter: self.jitter,
        }
    }

    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }
}

impl<P, O: RetryObserver> RetryExecutor<P, O> {
    pub async fn execute<F, Fut, T, E>(&self, mut op: F) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
        P: RetryPredicate<E>,
    {
        let started = Instant::now();
        let max_attempts = self.policy.max_attempts;

        for attempt in 1..=max_attempts {
            self.observer.on_attempt_start(attempt, max_attempts);

            let err = match op().await {
                Ok(value) => {
                    self.observer.on_success(attempt, started.elapsed());
                    return Ok(value);
                }
                Err(err) => err,
            };

            if !self.predicate.should_retry(&err) {
                self.observer.on_gave_up(attempt, &err);
                return Err(RetryError::NonRetryable {
                    attempt,
                    source: err,
                });
            }

            if attempt == max_attempts {
                self.observer.on_exhausted(attempt, &err);
                return Err(RetryError::Exhausted {
                    attempts: attempt,
                    source: err,
                    elapsed: started.elapsed(),
                });
            }

            let delay = calculate_delay(&self.policy, attempt, self.jitter);
            self.observer.on_attempt_failed(attempt, &err, delay);
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }

        Err(RetryError::NotAttempted)
    }
}
