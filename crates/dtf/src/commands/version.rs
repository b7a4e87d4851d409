//! Version command

use anyhow::Result;
use dtf_core::HierarchicalConfigLoader;
use tracing::debug;

use crate::cli::VersionArgs;
use crate::output;
use crate::version::VersionInfo;

pub fn run(args: VersionArgs) -> Result<()> {
    let mut info = VersionInfo::current();
    // A broken config must not hide the version itself
    match HierarchicalConfigLoader::new().and_then(|loader| loader.load_runtime_config()) {
        Ok(config) => info = info.with_update_source(&config),
        Err(e) => debug!("Skipping update source: {}", e),
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    println!("{}", info);
    if let Some(date) = &info.build_date {
        output::kv("Built", date);
    }
    if let Some(source) = &info.update_source {
        output::kv("Releases", &source.repository);
        output::kv("Package", &source.asset);
    }

    Ok(())
}
