//! Subcommand implementations

pub mod check;
pub mod replace;
pub mod upgrade;
pub mod version;
