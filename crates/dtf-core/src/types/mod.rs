//! Type definitions for dtf runtime configuration

mod runtime_config;

pub use runtime_config::*;
