//! Upgrade command
//!
//! Check, download, stage, then hand the installation over to the replacer.
//! On success this process exits inside `initiate_replacement`.

use std::cmp::Ordering;

use anyhow::{anyhow, Result};
use dialoguer::Confirm;
use dtf_core::HierarchicalConfigLoader;
use dtf_update::{
    coordinator::ensure_executable_name, download::human_readable_size, version,
    GitHubReleaseSource, PackageFetcher, PackageStager, ReplacementCoordinator, UpdateChecker,
    UpdateDecision, VERSION,
};

use crate::cli::UpgradeArgs;
use crate::output;

pub async fn run(args: UpgradeArgs) -> Result<()> {
    let mut config = HierarchicalConfigLoader::new()?.load_runtime_config()?;
    if args.no_backup {
        config.replacer.backup_before_mirror = false;
    }

    let source = GitHubReleaseSource::from_config(&config)?;
    let checker = UpdateChecker::from_config(source, &config, VERSION);

    let spinner = output::spinner("Checking for updates...");
    let decision = checker.check_for_update().await;
    spinner.finish_and_clear();

    let asset_url = match plan(&decision, VERSION) {
        Plan::Install(url) => url,
        Plan::Unreachable => {
            output::warning("Could not check for updates; try again later");
            return Ok(());
        }
        Plan::NoPackage => {
            output::warning(&format!(
                "Release {} has no {} package",
                decision.latest_tag, config.updater.asset_name
            ));
            return Ok(());
        }
        Plan::UpToDate => {
            output::success(&format!("Already on the latest version ({})", VERSION));
            return Ok(());
        }
    };

    // Refuse before downloading when the package could not relaunch this binary
    let current_exe = std::env::current_exe()?;
    ensure_executable_name(&current_exe, &config.updater.executable_name)
        .map_err(|e| failed(&e))?;

    if !args.yes {
        let apply = Confirm::new()
            .with_prompt(format!(
                "An update to version {} is available. Apply now?",
                decision.latest_tag
            ))
            .default(false)
            .interact()?;
        if !apply {
            output::info("Update postponed");
            return Ok(());
        }
    }

    let fetcher = PackageFetcher::new(&config)?.with_progress(!args.no_progress);
    let download = fetcher
        .download(&asset_url)
        .await
        .map_err(|e| failed(&e))?;
    output::kv("Package", &human_readable_size(download.file_size));
    output::kv("SHA-256", &download.checksum);

    let spinner = output::spinner("Unpacking update...");
    let staged = PackageStager::new(&config.updater)
        .stage(&download.file_path, &config.updater.executable_name)
        .await;
    spinner.finish_and_clear();
    let staged = staged.map_err(|e| failed(&e))?;

    output::info(&format!(
        "Installing {}; dtf will restart when done",
        decision.latest_tag
    ));

    let coordinator = ReplacementCoordinator::new(&config);
    match coordinator.initiate_replacement(&staged) {
        Ok(never) => match never {},
        Err(e) => {
            staged.discard();
            Err(failed(&e))
        }
    }
}

fn failed(e: &dtf_update::UpdateError) -> anyhow::Error {
    output::error(&format!("Update failed: {}", e));
    anyhow!("update to the latest release did not complete")
}

#[derive(Debug, PartialEq, Eq)]
enum Plan {
    Install(String),
    UpToDate,
    NoPackage,
    Unreachable,
}

fn plan(decision: &UpdateDecision, current: &str) -> Plan {
    match (&decision.asset_url, decision.available) {
        (Some(url), true) => Plan::Install(url.clone()),
        _ if decision.latest_tag.is_empty() => Plan::Unreachable,
        (None, _) => match version::compare(&decision.latest_tag, current) {
            Ok(Ordering::Greater) => Plan::NoPackage,
            _ => Plan::UpToDate,
        },
        (Some(_), false) => Plan::UpToDate,
    }
}
