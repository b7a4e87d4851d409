//! Shared infrastructure for dtf-update integration tests
//!
//! ```ignore
//! mod common;
//! use common::*;
//! ```
//!
//! - `constants`: versions, tags, asset and executable names
//! - `builders`: release and handoff builders
//! - `archives`: in-memory zip / tar.gz packages and directory helpers
//! - `mock_server`: wiremock endpoints for the release API and downloads
//! - `fakes`: scripted [`ProcessControl`](dtf_update::ProcessControl)

// Not every test binary uses every helper
#![allow(dead_code)]
#![allow(unused_imports)]

pub mod archives;
pub mod builders;
pub mod constants;
pub mod fakes;
pub mod mock_server;

pub use archives::*;
pub use builders::*;
pub use constants::*;
pub use fakes::*;
pub use mock_server::*;
