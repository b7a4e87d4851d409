//! Check command

use anyhow::Result;
use dtf_core::HierarchicalConfigLoader;
use dtf_update::{GitHubReleaseSource, UpdateChecker, VERSION};

use crate::cli::CheckArgs;
use crate::output;

pub async fn run(args: CheckArgs) -> Result<()> {
    let config = HierarchicalConfigLoader::new()?.load_runtime_config()?;
    let source = GitHubReleaseSource::from_config(&config)?;
    let checker = UpdateChecker::from_config(source, &config, VERSION);

    let spinner = (!args.json).then(|| output::spinner("Checking for updates..."));
    let decision = checker.check_for_update().await;
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&decision)?);
        return Ok(());
    }

    output::info(&format!("Current version: {}", VERSION));
    if decision.available {
        output::success(&format!("Update available: {}", decision.latest_tag));
        output::info("Run 'dtf upgrade' to install it");
    } else if decision.latest_tag.is_empty() {
        output::warning(&format!(
            "Could not reach {}/{}; try again later",
            checker.owner(),
            checker.repo()
        ));
    } else {
        output::success("Already on the latest version");
    }

    Ok(())
}
