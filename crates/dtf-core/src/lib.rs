//! # dtf-core
//!
//! Core library shared by the DTF pricing calculator crates:
//! - Hierarchical runtime configuration (embedded defaults, user file, env)
//! - Error types
//! - Bounded retry engine with policy-based backoff

pub mod config;
pub mod error;
pub mod retry;
pub mod types;
pub mod utils;

pub use config::HierarchicalConfigLoader;
pub use error::{Error, Result};
pub use types::RuntimeConfig;
pub use utils::get_home_dir;
