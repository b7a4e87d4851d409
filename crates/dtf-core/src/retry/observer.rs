//! Hooks notified as a retried operation progresses

use std::fmt::Display;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Receives retry lifecycle events
pub trait RetryObserver: Send + Sync {
    fn on_attempt_start(&self, attempt: u32, max_attempts: u32);

    /// An attempt failed and another one follows after `delay`
    fn on_attempt_failed(&self, attempt: u32, error: &dyn Display, delay: Duration);

    fn on_success(&self, attempt: u32, elapsed: Duration);

    fn on_exhausted(&self, attempts: u32, error: &dyn Display);

    /// The predicate rejected the failure
    fn on_gave_up(&self, attempt: u32, error: &dyn Display) {
        let _ = (attempt, error);
    }
}

impl<T: RetryObserver + ?Sized> RetryObserver for Arc<T> {
    fn on_attempt_start(&self, attempt: u32, max_attempts: u32) {
        (**self).on_attempt_start(attempt, max_attempts)
    }

    fn on_attempt_failed(&self, attempt: u32, error: &dyn Display, delay: Duration) {
        (**self).on_attempt_failed(attempt, error, delay)
    }

    fn on_success(&self, attempt: u32, elapsed: Duration) {
        (**self).on_success(attempt, elapsed)
    }

    fn on_exhausted(&self, attempts: u32, error: &dyn Display) {
        (**self).on_exhausted(attempts, error)
    }

    fn on_gave_up(&self, attempt: u32, error: &dyn Display) {
        (**self).on_gave_up(attempt, error)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpObserver;

impl RetryObserver for NoOpObserver {
    fn on_attempt_start(&self, _attempt: u32, _max_attempts: u32) {}
    fn on_attempt_failed(&self, _attempt: u32, _error: &dyn Display, _delay: Duration) {}
    fn on_success(&self, _attempt: u32, _elapsed: Duration) {}
    fn on_exhausted(&self, _attempts: u32, _error: &dyn Display) {}
}

/// Logs retry events through `tracing`, tagged with an operation name
#[derive(Debug, Clone)]
pub struct TracingObserver {
    operation: String,
}

impl TracingObserver {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
        }
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }
}

impl RetryObserver for TracingObserver {
    fn on_attempt_start(&self, attempt: u32, max_attempts: u32) {
        tracing::debug!(
            operation = %self.operation,
            attempt,
            max_attempts,
            "starting attempt"
        );
    }

    fn on_attempt_failed(&self, attempt: u32, error: &dyn Display, delay: Duration) {
        tracing::warn!(
            operation = %self.operation,
            attempt,
            error = %error,
            delay_ms = delay.as_millis() as u64,
            "attempt failed, retrying"
        );
    }

    fn on_success(&self, attempt: u32, elapsed: Duration) {
        if attempt > 1 {
            tracing::info!(
                operation = %self.operation,
                attempt,
                elapsed_ms = elapsed.as_millis() as u64,
                "succeeded after retry"
            );
        } else {
            tracing::debug!(
                operation = %self.operation,
                elapsed_ms = elapsed.as_millis() as u64,
                "succeeded"
            );
        }
    }

    fn on_exhausted(&self, attempts: u32, error: &dyn Display) {
        tracing::error!(
            operation = %self.operation,
            attempts,
            error = %error,
            "all attempts failed"
        );
    }

    fn on_gave_up(&self, attempt: u32, error: &dyn Display) {
        tracing::warn!(
            operation = %self.operation,
            attempt,
            error = %error,
            "failure is not retryable"
        );
    }
}

/// Counts events, used by tests to assert on retry behaviour
#[derive(Debug, Default)]
pub struct StatsObserver {
    starts: AtomicU32,
    failures: AtomicU32,
    successes: AtomicU32,
    exhaustions: AtomicU32,
    give_ups: AtomicU32,
}

impl StatsObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attempt_starts(&self) -> u32 {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn failures(&self) -> u32 {
        self.failures.load(Ordering::SeqCst)
    }

    pub fn successes(&self) -> u32 {
        self.successes.load(Ordering::SeqCst)
    }

    pub fn exhaustions(&self) -> u32 {
        self.exhaustions.load(Ordering::SeqCst)
    }

    pub fn give_ups(&self) -> u32 {
        self.give_ups.load(Ordering::SeqCst)
    }
}

impl RetryObserver for StatsObserver {
    fn on_attempt_start(&self, _attempt: u32, _max_attempts: u32) {
        self.starts.fetch_add(1, Ordering::SeqCst);
    }

    fn on_attempt_failed(&self, _attempt: u32, _error: &dyn Display, _delay: Duration) {
        self.failures.fetch_add(1, Ordering::SeqCst);
    }

    fn on_success(&self, _attempt: u32, _elapsed: Duration) {
        self.successes.fetch_add(1, Ordering::SeqCst);
    }

    fn on_exhausted(&self, _attempts: u32, _error: &dyn Display) {
        self.exhaustions.fetch_add(1, Ordering::SeqCst);
    }

    fn on_gave_up(&self, _attempt: u32, _error: &dyn Display) {
        self.give_ups.fetch_add(1, Ordering::SeqCst);
    }
}
