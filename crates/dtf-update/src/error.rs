//! Update error type

use std::io;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, UpdateError>;

#[derive(Error, Debug)]
pub enum UpdateError {
    /// Connectivity, timeout, unexpected status or truncated body
    #[error("Network error: {message}")]
    Network { message: String },

    /// The repository has no published release
    #[error("No release published for {owner}/{repo}")]
    NotFound { owner: String, repo: String },

    #[error("Malformed release response: {message}")]
    MalformedResponse { message: String },

    #[error("Malformed version string: '{input}'")]
    MalformedVersion { input: String },

    #[error("Corrupt update package: {message}")]
    CorruptPackage { message: String },

    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to start the replacement process: {source}")]
    ReplacementSpawn {
        #[source]
        source: io::Error,
    },

    #[error("Process {pid} still running after {}s, installation left untouched", waited.as_secs())]
    MirrorTimeout { pid: u32, waited: Duration },

    #[error("Failed to mirror {}: {source}", path.display())]
    MirrorFailure {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Config(#[from] dtf_core::Error),
}

impl UpdateError {
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    pub fn malformed_response(message: impl Into<String>) -> Self {
        Self::MalformedResponse {
            message: message.into(),
        }
    }

    pub fn malformed_version(input: impl Into<String>) -> Self {
        Self::MalformedVersion {
            input: input.into(),
        }
    }

    pub fn corrupt_package(message: impl Into<String>) -> Self {
        Self::CorruptPackage {
            message: message.into(),
        }
    }

    pub fn write(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source,
        }
    }

    pub fn mirror_failure(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::MirrorFailure {
            path: path.into(),
            source,
        }
    }

    /// Whether another attempt at the same operation could succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Network { .. })
    }
}

impl From<reqwest::Error> for UpdateError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::network(format!("request timed out: {}", err))
        } else {
            Self::network(err.to_string())
        }
    }
}
