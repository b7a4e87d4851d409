//! Policy-driven retry of async operations
//!
//! A [`RetryPolicy`](crate::types::RetryPolicy) from the runtime config says
//! how many attempts to make and how long to wait between them. A
//! [`RetryPredicate`] decides which failures are worth another attempt and a
//! [`RetryObserver`] gets told about every attempt.
//!
//! ```rust,no_run
//! use dtf_core::retry::{RetryError, RetryExecutor, TracingObserver};
//! use dtf_core::types::RuntimeConfig;
//!
//! async fn fetch() -> Result<Vec<u8>, RetryError<std::io::Error>> {
//!     let config = RuntimeConfig::default();
//!     RetryExecutor::new(config.retry_policy("download"))
//!         .with_observer(TracingObserver::new("download"))
//!         .execute(|| async { Ok(vec![1, 2, 3]) })
//!         .await
//! }
//! ```

mod error;
mod executor;
mod observer;
mod strategies;

pub use error::RetryError;
pub use executor::{retry_with_policy, RetryExecutor};
pub use observer::{NoOpObserver, RetryObserver, StatsObserver, TracingObserver};
pub use strategies::{calculate_delay, AlwaysRetry, ClosurePredicate, RetryPredicate};
