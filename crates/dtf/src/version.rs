//! Build and update-channel details reported by `dtf version`

use dtf_core::RuntimeConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionInfo {
    /// Version compared against release tags
    pub version: String,
    pub commit: Option<String>,
    pub build_date: Option<String>,
    pub target: Option<String>,
    /// Where `dtf upgrade` looks for new releases
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_source: Option<UpdateSource>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateSource {
    pub repository: String,
    pub asset: String,
}

impl VersionInfo {
    pub fn current() -> Self {
        Self {
            version: dtf_update::VERSION.to_string(),
            commit: option_env!("GIT_SHA").map(String::from),
            build_date: option_env!("BUILD_DATE").map(String::from),
            target: option_env!("TARGET").map(String::from),
            update_source: None,
        }
    }

    pub fn with_update_source(mut self, config: &RuntimeConfig) -> Self {
        self.update_source = Some(UpdateSource {
            repository: format!("{}/{}", config.github.repo_owner, config.github.repo_name),
            asset: config.updater.asset_name.clone(),
        });
        self
    }

    /// One line: `dtf <version> [(<commit>)] [<target>]`
    pub fn summary(&self) -> String {
        let commit = self.commit.as_deref().map(|c| format!(" ({})", c));
        let target = self.target.as_deref().map(|t| format!(" {}", t));
        format!(
            "dtf {}{}{}",
            self.version,
            commit.unwrap_or_default(),
            target.unwrap_or_default()
        )
    }
}

impl std::fmt::Display for VersionInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.summary())
    }
}
