//! Check, fetch, stage, hand off and replace against a mocked release host
//!
//! The replacer is driven in-process; only process control is faked.

mod common;

use common::*;
use dtf_core::types::{RetryPolicy, RetryStrategy};
use dtf_core::RuntimeConfig;
use dtf_update::{
    GitHubReleaseSource, PackageFetcher, PackageStager, ReplacementCoordinator,
    ReplacementHandoff, ReplacerOptions, ReplacerProcess, ReplacerState, UpdateChecker,
};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use wiremock::MockServer;

fn test_config() -> RuntimeConfig {
    let mut config = RuntimeConfig::default();
    let instant = RetryPolicy {
        max_attempts: 2,
        strategy: RetryStrategy::None,
        backoff_multiplier: 1.0,
        initial_delay_ms: 0,
        max_delay_ms: 0,
    };
    config
        .retry_policies
        .operations
        .insert("download".to_string(), instant.clone());
    config
        .retry_policies
        .operations
        .insert("mirror".to_string(), instant);
    config.replacer.settle_delay_ms = 0;
    config.replacer.poll_interval_ms = 10;
    config.replacer.exit_wait_timeout_secs = 5;
    config.updater.asset_name = ASSET_ZIP.to_string();
    config.updater.executable_name = EXE_NAME.to_string();
    config
}

/// Run every step up to the point where the application would exit;
/// returns the handoff the replacer was started with
async fn prepare_update(
    server: &MockServer,
    temp: &TempDir,
    config: &RuntimeConfig,
    installed_exe: &Path,
    process: &FakeProcessControl,
) -> ReplacementHandoff {
    let source = GitHubReleaseSource::from_config(config)
        .unwrap()
        .with_api_url(server.uri())
        .with_token(None);
    let decision = UpdateChecker::from_config(source, config, VERSION_1_0_0)
        .check_for_update()
        .await;
    assert!(decision.available, "{:?}", decision);
    assert_eq!(decision.latest_tag, TAG_V1_1_0);

    let download = PackageFetcher::new(config)
        .unwrap()
        .with_download_dir(temp.path())
        .download(&decision.asset_url.unwrap())
        .await
        .unwrap();

    let staged = PackageStager::new(&config.updater)
        .with_temp_dir(temp.path().join("tmp"))
        .stage(&download.file_path, &config.updater.executable_name)
        .await
        .unwrap();
    assert!(!download.file_path.exists());

    let coordinator = ReplacementCoordinator::new(config)
        .with_temp_dir(temp.path().join("tmp"))
        .with_process_control(process.clone());
    let handoff = coordinator.handoff_for(&staged, installed_exe).unwrap();
    coordinator.spawn_replacer(&handoff, installed_exe).unwrap();
    handoff
}

async fn serve_release(server: &MockServer, package: &[u8]) {
    let release = ReleaseBuilder::new()
        .tag(TAG_V1_1_0)
        .asset(ASSET_TAR_GZ, "https://example.invalid/wrong-platform")
        .asset(ASSET_ZIP, &package_url(server));
    mock_latest_release(server, release.to_json()).await;
    mock_package(server, package).await;
}

fn install(temp: &TempDir, files: &[(&str, &[u8])]) -> PathBuf {
    let install = temp.path().join("DTF Calculator");
    write_tree(&install, files);
    install
}

#[tokio::test]
async fn test_update_replaces_installation_and_relaunches_once() {
    let server = MockServer::start().await;
    serve_release(&server, &zip_package(&standard_package_files())).await;

    let temp = TempDir::new().unwrap();
    let config = test_config();
    let install = install(
        &temp,
        &[
            (EXE_NAME, EXE_CONTENT_OLD),
            ("assets/prices.json", b"{\"dtf\": 10.0}"),
            ("user-notes.txt", b"gone after update"),
        ],
    );
    let old_tree = read_tree(&install);
    let app = FakeProcessControl::new();

    let handoff = prepare_update(&server, &temp, &config, &install.join(EXE_NAME), &app).await;
    assert_eq!(app.spawns().len(), 1, "exactly one replacer");
    let backup = handoff.backup_path();

    // The replacer side, with the application already gone
    let replacer_process = FakeProcessControl::new();
    let replacer = ReplacerProcess::new(
        handoff.clone(),
        ReplacerOptions::from_config(&config),
        replacer_process.clone(),
    );
    let run = replacer.run().await;

    assert!(run.outcome.is_success(), "{:?}", run.outcome);
    assert_eq!(run.trace.last(), Some(&ReplacerState::Terminal));
    assert_eq!(
        read_tree(&install),
        expected_tree(&standard_package_files())
    );
    assert_eq!(read_tree(&backup), old_tree);
    assert!(!handoff.staging_path.exists());

    let relaunches = replacer_process.spawns();
    assert_eq!(relaunches.len(), 1);
    assert_eq!(relaunches[0].program, install.join(EXE_NAME));
}

#[tokio::test]
async fn test_identical_package_leaves_installation_byte_identical() {
    let server = MockServer::start().await;
    let files = standard_package_files();
    serve_release(&server, &zip_package(&files)).await;

    let temp = TempDir::new().unwrap();
    let mut config = test_config();
    config.replacer.backup_before_mirror = false;
    let install = install(&temp, &files);
    let before = read_tree(&install);
    let app = FakeProcessControl::new();

    let handoff = prepare_update(&server, &temp, &config, &install.join(EXE_NAME), &app).await;
    assert!(!handoff.backup_path().exists());

    let replacer_process = FakeProcessControl::new();
    let run = ReplacerProcess::new(
        handoff,
        ReplacerOptions::from_config(&config),
        replacer_process.clone(),
    )
    .run()
    .await;

    assert!(run.outcome.is_success());
    assert_eq!(read_tree(&install), before);
    assert_eq!(replacer_process.spawns().len(), 1);
}

#[tokio::test]
async fn test_application_still_running_leaves_installation_alone() {
    let server = MockServer::start().await;
    serve_release(&server, &zip_package(&standard_package_files())).await;

    let temp = TempDir::new().unwrap();
    let mut config = test_config();
    config.replacer.exit_wait_timeout_secs = 0;
    let install = install(&temp, &[(EXE_NAME, EXE_CONTENT_OLD)]);
    let before = read_tree(&install);

    let handoff = prepare_update(
        &server,
        &temp,
        &config,
        &install.join(EXE_NAME),
        &FakeProcessControl::new(),
    )
    .await;

    let still_running = FakeProcessControl::new().with_running(handoff.main_process_id);
    let run = ReplacerProcess::new(
        handoff.clone(),
        ReplacerOptions::from_config(&config),
        still_running.clone(),
    )
    .run()
    .await;

    assert!(!run.outcome.is_success());
    assert_eq!(read_tree(&install), before);
    assert!(still_running.spawns().is_empty());
    assert!(handoff.staging_path.exists());
}

#[tokio::test]
async fn test_handoff_arguments_carry_replacer_inputs() {
    let server = MockServer::start().await;
    serve_release(&server, &zip_package(&standard_package_files())).await;

    let temp = TempDir::new().unwrap();
    let config = test_config();
    let install = install(&temp, &[(EXE_NAME, EXE_CONTENT_OLD)]);
    let app = FakeProcessControl::new();

    let handoff = prepare_update(&server, &temp, &config, &install.join(EXE_NAME), &app).await;

    let args = &app.spawns()[0].args;
    let value_after = |flag: &str| {
        args.iter()
            .position(|a| a == flag)
            .and_then(|i| args.get(i + 1))
            .cloned()
    };
    assert_eq!(args[0], "replace");
    assert_eq!(value_after("--install-dir"), Some(install.into_os_string()));
    assert_eq!(
        value_after("--staging-dir"),
        Some(handoff.staging_path.into_os_string())
    );
    assert_eq!(
        value_after("--pid"),
        Some(std::process::id().to_string().into())
    );
}
