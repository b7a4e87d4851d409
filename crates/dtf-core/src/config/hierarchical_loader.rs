//! Hierarchical runtime configuration loader
//!
//! Sources, lowest precedence first:
//! 1. Embedded defaults (`embedded/config/runtime-defaults.yaml`)
//! 2. User file (`~/.dtf/dtf-runtime.yaml`)
//! 3. Environment variables (`DTF_*`)
//! 4. CLI flags (applied by the caller)

use crate::error::{Error, Result};
use crate::types::{RetryPoliciesConfig, RuntimeConfig};
use crate::utils::get_home_dir;
use camino::{Utf8Path, Utf8PathBuf};
use rust_embed::RustEmbed;
use serde::de::DeserializeOwned;
use std::env;
use std::fs;

const RUNTIME_FILE_NAME: &str = "dtf-runtime.yaml";

#[derive(RustEmbed)]
#[folder = "$CARGO_MANIFEST_DIR/../../embedded/config/"]
#[prefix = ""]
struct EmbeddedConfigs;

/// Loads [`RuntimeConfig`] by layering file and environment sources over
/// the embedded defaults
pub struct HierarchicalConfigLoader {
    config_dir: Utf8PathBuf,
}

impl HierarchicalConfigLoader {
    /// Loader rooted at `~/.dtf`
    pub fn new() -> Result<Self> {
        let home = get_home_dir().map_err(|e| Error::invalid_config(e.to_string()))?;
        let home = Utf8PathBuf::from_path_buf(home)
            .map_err(|p| Error::invalid_config(format!("Non UTF-8 home directory: {}", p.display())))?;
        Ok(Self {
            config_dir: home.join(".dtf"),
        })
    }

    /// Loader rooted at an arbitrary directory
    pub fn with_dir(config_dir: Utf8PathBuf) -> Self {
        Self { config_dir }
    }

    pub fn config_dir(&self) -> &Utf8Path {
        &self.config_dir
    }

    /// Path of the user runtime file, whether or not it exists
    pub fn runtime_file(&self) -> Utf8PathBuf {
        self.config_dir.join(RUNTIME_FILE_NAME)
    }

    pub fn load_runtime_config(&self) -> Result<RuntimeConfig> {
        let mut config = Self::load_embedded_config::<RuntimeConfig>("runtime-defaults.yaml")?;

        let runtime_file = self.runtime_file();
        if runtime_file.exists() {
            tracing::debug!("Loading runtime overrides from {}", runtime_file);
            let file_config = Self::load_yaml_file::<RuntimeConfig>(&runtime_file)?;
            config = Self::merge_runtime_config(config, file_config);
        }

        Self::apply_env_overrides(config)
    }

    fn load_embedded_config<T: DeserializeOwned>(filename: &str) -> Result<T> {
        let embedded = EmbeddedConfigs::get(filename)
            .ok_or_else(|| Error::config_not_found(format!("embedded:{}", filename)))?;

        let content = std::str::from_utf8(&embedded.data).map_err(|_| {
            Error::invalid_config(format!("Invalid UTF-8 in embedded config: {}", filename))
        })?;

        serde_yaml_ng::from_str(content).map_err(|e| {
            Error::invalid_config(format!("Failed to parse embedded config {}: {}", filename, e))
        })
    }

    fn load_yaml_file<T: DeserializeOwned>(path: &Utf8Path) -> Result<T> {
        let content = fs::read_to_string(path)?;
        serde_yaml_ng::from_str(&content)
            .map_err(|e| Error::invalid_config(format!("Failed to parse {}: {}", path, e)))
    }

    /// Sections present in the user file replace the defaults wholesale,
    /// except retry policies which merge per operation
    fn merge_runtime_config(base: RuntimeConfig, overlay: RuntimeConfig) -> RuntimeConfig {
        RuntimeConfig {
            network: overlay.network,
            github: overlay.github,
            updater: overlay.updater,
            replacer: overlay.replacer,
            retry_policies: Self::merge_retry_policies(base.retry_policies, overlay.retry_policies),
        }
    }

    fn merge_retry_policies(
        mut base: RetryPoliciesConfig,
        overlay: RetryPoliciesConfig,
    ) -> RetryPoliciesConfig {
        for (operation, policy) in overlay.operations {
            base.operations.insert(operation, policy);
        }
        base.default = overlay.default;
        base
    }

    fn apply_env_overrides(mut config: RuntimeConfig) -> Result<RuntimeConfig> {
        if let Some(val) = parse_env::<u64>("DTF_HTTP_TIMEOUT_SECS")? {
            config.network.http_timeout_secs = val;
        }
        if let Some(val) = parse_env::<u64>("DTF_DOWNLOAD_TIMEOUT_SECS")? {
            config.network.download_timeout_secs = val;
        }
        if let Some(val) = parse_env::<u64>("DTF_EXIT_WAIT_TIMEOUT_SECS")? {
            config.replacer.exit_wait_timeout_secs = val;
        }

        if let Ok(val) = env::var("DTF_GITHUB_REPO_OWNER") {
            config.github.repo_owner = val;
        }
        if let Ok(val) = env::var("DTF_GITHUB_REPO_NAME") {
            config.github.repo_name = val;
        }
        if let Ok(val) = env::var("DTF_GITHUB_API_URL") {
            config.github.api_url = val;
        }
        if let Ok(val) = env::var("DTF_ASSET_NAME") {
            config.updater.asset_name = val;
        }

        if let Ok(val) = env::var("DTF_NO_BACKUP") {
            config.replacer.backup_before_mirror = !matches!(val.as_str(), "1" | "true" | "yes");
        }

        Ok(config)
    }
}

fn parse_env<T: std::str::FromStr>(name: &str) -> Result<Option<T>> {
    match env::var(name) {
        Ok(val) => val
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| Error::invalid_config(format!("{} must be a valid number", name))),
        Err(_) => Ok(None),
    }
}
