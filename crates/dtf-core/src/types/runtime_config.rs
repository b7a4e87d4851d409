//! Runtime configuration types for operational parameters
//!
//! These types control network timeouts, the release repository, the update
//! artifacts in the temp area, the replacer's wait/settle timings and the
//! retry policies used by the download and mirror steps.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::utils::executable_file_name;

/// Complete runtime configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RuntimeConfig {
    /// Network and HTTP configuration
    #[serde(default)]
    pub network: NetworkConfig,

    /// GitHub repository settings
    #[serde(default)]
    pub github: GitHubConfig,

    /// Update artifact naming
    #[serde(default)]
    pub updater: UpdaterConfig,

    /// Replacer process timings
    #[serde(default)]
    pub replacer: ReplacerConfig,

    /// Retry policy configurations
    #[serde(default)]
    pub retry_policies: RetryPoliciesConfig,
}

impl RuntimeConfig {
    /// Retry policy for a named operation, falling back to the default policy
    pub fn retry_policy(&self, operation: &str) -> RetryPolicy {
        self.retry_policies
            .operations
            .get(operation)
            .cloned()
            .unwrap_or_else(|| self.retry_policies.default.clone())
    }
}

/// Network and HTTP configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct NetworkConfig {
    /// Timeout for release metadata requests in seconds
    #[serde(default = "default_http_timeout")]
    pub http_timeout_secs: u64,

    /// Timeout for a whole package download in seconds
    #[serde(default = "default_download_timeout")]
    pub download_timeout_secs: u64,

    /// User agent string for HTTP requests
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            http_timeout_secs: default_http_timeout(),
            download_timeout_secs: default_download_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_http_timeout() -> u64 {
    15
}
fn default_download_timeout() -> u64 {
    300 // 5 minutes
}
fn default_user_agent() -> String {
    format!(
        "dtf/{} ({}; {})",
        env!("CARGO_PKG_VERSION"),
        std::env::consts::OS,
        std::env::consts::ARCH
    )
}

/// GitHub repository configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct GitHubConfig {
    /// Repository owner
    #[serde(default = "default_repo_owner")]
    pub repo_owner: String,

    /// Repository name
    #[serde(default = "default_repo_name")]
    pub repo_name: String,

    /// Base URL for the GitHub API
    #[serde(default = "default_github_api_url")]
    pub api_url: String,

    /// Environment variable holding an optional API token
    #[serde(default = "default_token_env")]
    pub token_env: String,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            repo_owner: default_repo_owner(),
            repo_name: default_repo_name(),
            api_url: default_github_api_url(),
            token_env: default_token_env(),
        }
    }
}

fn default_repo_owner() -> String {
    "TermiSenpai".to_string()
}
fn default_repo_name() -> String {
    "presupuestoapp".to_string()
}
fn default_github_api_url() -> String {
    "https://api.github.com".to_string()
}
fn default_token_env() -> String {
    "GITHUB_TOKEN".to_string()
}

/// Naming of the installable asset and of the files the updater leaves in
/// the shared temp area
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct UpdaterConfig {
    /// Exact release asset name to install
    #[serde(default = "default_asset_name")]
    pub asset_name: String,

    /// Executable expected at the root of an extracted package
    #[serde(default = "default_executable_name")]
    pub executable_name: String,

    /// Fixed file name of the downloaded package in the temp area
    #[serde(default = "default_download_file_name")]
    pub download_file_name: String,

    /// Prefix for staging directories and the replacer copy
    #[serde(default = "default_temp_prefix")]
    pub temp_prefix: String,
}

impl Default for UpdaterConfig {
    fn default() -> Self {
        Self {
            asset_name: default_asset_name(),
            executable_name: default_executable_name(),
            download_file_name: default_download_file_name(),
            temp_prefix: default_temp_prefix(),
        }
    }
}

fn default_asset_name() -> String {
    let ext = if cfg!(windows) { "zip" } else { "tar.gz" };
    format!(
        "dtf-{}-{}.{}",
        std::env::consts::OS,
        std::env::consts::ARCH,
        ext
    )
}
fn default_executable_name() -> String {
    executable_file_name("dtf")
}
fn default_download_file_name() -> String {
    "dtf-update-package".to_string()
}
fn default_temp_prefix() -> String {
    "dtf".to_string()
}

/// Replacer process configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ReplacerConfig {
    /// Upper bound on waiting for the main process to exit
    #[serde(default = "default_exit_wait_timeout")]
    pub exit_wait_timeout_secs: u64,

    /// Interval between liveness polls of the main process
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,

    /// Pause after the main process exited, before touching any file
    #[serde(default = "default_settle_delay")]
    pub settle_delay_ms: u64,

    /// Copy the installation to a sibling `.bak` directory before mirroring
    #[serde(default = "default_backup_before_mirror")]
    pub backup_before_mirror: bool,
}

impl Default for ReplacerConfig {
    fn default() -> Self {
        Self {
            exit_wait_timeout_secs: default_exit_wait_timeout(),
            poll_interval_ms: default_poll_interval(),
            settle_delay_ms: default_settle_delay(),
            backup_before_mirror: default_backup_before_mirror(),
        }
    }
}

fn default_exit_wait_timeout() -> u64 {
    45
}
fn default_poll_interval() -> u64 {
    250
}
fn default_settle_delay() -> u64 {
    1500
}
fn default_backup_before_mirror() -> bool {
    true
}

/// Retry policy configurations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RetryPoliciesConfig {
    /// Default retry policy
    #[serde(default)]
    pub default: RetryPolicy,

    /// Per-operation retry policies
    #[serde(default)]
    pub operations: HashMap<String, RetryPolicy>,
}

impl Default for RetryPoliciesConfig {
    fn default() -> Self {
        let mut operations = HashMap::new();

        operations.insert(
            "download".to_string(),
            RetryPolicy {
                max_attempts: 3,
                strategy: RetryStrategy::ExponentialBackoff,
                backoff_multiplier: 2.0,
                initial_delay_ms: 1000,
                max_delay_ms: 30000,
            },
        );

        // File locks held by scanners are usually released within a second
        operations.insert(
            "mirror".to_string(),
            RetryPolicy {
                max_attempts: 3,
                strategy: RetryStrategy::FixedDelay,
                backoff_multiplier: 1.0,
                initial_delay_ms: 500,
                max_delay_ms: 500,
            },
        );

        Self {
            default: RetryPolicy::default(),
            operations,
        }
    }
}

/// Retry policy for an operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RetryPolicy {
    /// Maximum number of attempts, the first one included
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Retry strategy
    #[serde(default)]
    pub strategy: RetryStrategy,

    /// Backoff multiplier for exponential strategies
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Initial delay in milliseconds
    #[serde(default = "default_initial_delay")]
    pub initial_delay_ms: u64,

    /// Maximum delay in milliseconds
    #[serde(default = "default_max_delay")]
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            strategy: RetryStrategy::default(),
            backoff_multiplier: default_backoff_multiplier(),
            initial_delay_ms: default_initial_delay(),
            max_delay_ms: default_max_delay(),
        }
    }
}

fn default_max_attempts() -> u32 {
    3
}
fn default_backoff_multiplier() -> f64 {
    2.0
}
fn default_initial_delay() -> u64 {
    1000
}
fn default_max_delay() -> u64 {
    30000
}

/// Retry strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum RetryStrategy {
    /// No delay between attempts
    None,

    /// Fixed delay between attempts
    FixedDelay,

    /// Exponential backoff (default)
    #[default]
    ExponentialBackoff,

    /// Linear backoff
    LinearBackoff,
}
