//! Update checks against a mocked GitHub release API
//!
//! Every failure of the release source must surface as "no update" and
//! never as an error.

mod common;

use common::*;
use dtf_core::RuntimeConfig;
use dtf_update::{GitHubReleaseSource, ReleaseSource, UpdateChecker, UpdateDecision, UpdateError};
use wiremock::MockServer;

fn source_for(server: &MockServer) -> GitHubReleaseSource {
    GitHubReleaseSource::from_config(&RuntimeConfig::default())
        .unwrap()
        .with_api_url(server.uri())
        .with_token(None)
}

fn checker(server: &MockServer, current: &str, asset: &str) -> UpdateChecker<GitHubReleaseSource> {
    UpdateChecker::new(source_for(server), OWNER, REPO, current, asset)
}

#[tokio::test]
async fn test_newer_release_with_asset_is_available() {
    let server = MockServer::start().await;
    let url = package_url(&server);
    let release = ReleaseBuilder::new()
        .tag(TAG_V1_1_0)
        .asset(ASSET_ZIP, &url);
    mock_latest_release(&server, release.to_json()).await;

    let decision = checker(&server, VERSION_1_0_0, ASSET_ZIP)
        .check_for_update()
        .await;

    assert_eq!(
        decision,
        UpdateDecision {
            available: true,
            latest_tag: TAG_V1_1_0.to_string(),
            asset_url: Some(url),
        }
    );
}

#[tokio::test]
async fn test_same_version_is_not_available() {
    let server = MockServer::start().await;
    let release = ReleaseBuilder::new()
        .tag(TAG_V1_1_0)
        .asset(ASSET_ZIP, &package_url(&server));
    mock_latest_release(&server, release.to_json()).await;

    let decision = checker(&server, VERSION_1_1_0, ASSET_ZIP)
        .check_for_update()
        .await;

    assert!(!decision.available);
    assert_eq!(decision.latest_tag, TAG_V1_1_0);
}

#[tokio::test]
async fn test_newer_release_without_matching_asset_is_not_available() {
    let server = MockServer::start().await;
    let release = ReleaseBuilder::new()
        .tag(TAG_V2_0_0)
        .asset(ASSET_TAR_GZ, &package_url(&server));
    mock_latest_release(&server, release.to_json()).await;

    let decision = checker(&server, VERSION_1_0_0, ASSET_ZIP)
        .check_for_update()
        .await;

    assert!(!decision.available);
    assert_eq!(decision.latest_tag, TAG_V2_0_0);
    assert_eq!(decision.asset_url, None);
}

#[tokio::test]
async fn test_missing_repository_reports_not_found() {
    let server = MockServer::start().await;
    mock_latest_release_status(&server, 404).await;

    let err = source_for(&server)
        .fetch_latest_release(OWNER, REPO)
        .await
        .unwrap_err();
    assert!(matches!(err, UpdateError::NotFound { .. }), "got {:?}", err);

    let decision = checker(&server, VERSION_1_0_0, ASSET_ZIP)
        .check_for_update()
        .await;
    assert_eq!(decision, UpdateDecision::default());
}

#[tokio::test]
async fn test_server_error_reports_network_failure() {
    let server = MockServer::start().await;
    mock_latest_release_status(&server, 500).await;

    let err = source_for(&server)
        .fetch_latest_release(OWNER, REPO)
        .await
        .unwrap_err();
    assert!(matches!(err, UpdateError::Network { .. }), "got {:?}", err);
    assert!(err.is_transient());

    let decision = checker(&server, VERSION_1_0_0, ASSET_ZIP)
        .check_for_update()
        .await;
    assert!(!decision.available);
    assert!(decision.latest_tag.is_empty());
}

#[tokio::test]
async fn test_invalid_json_reports_malformed_response() {
    let server = MockServer::start().await;
    mock_latest_release_raw(&server, "{ not json").await;

    let err = source_for(&server)
        .fetch_latest_release(OWNER, REPO)
        .await
        .unwrap_err();
    assert!(
        matches!(err, UpdateError::MalformedResponse { .. }),
        "got {:?}",
        err
    );

    let decision = checker(&server, VERSION_1_0_0, ASSET_ZIP)
        .check_for_update()
        .await;
    assert_eq!(decision, UpdateDecision::default());
}

#[tokio::test]
async fn test_release_without_tag_is_malformed() {
    let server = MockServer::start().await;
    mock_latest_release(&server, serde_json::json!({ "assets": [] })).await;

    let err = source_for(&server)
        .fetch_latest_release(OWNER, REPO)
        .await
        .unwrap_err();
    assert!(matches!(err, UpdateError::MalformedResponse { .. }));
}

#[tokio::test]
async fn test_unreachable_server_is_not_available() {
    let server = MockServer::start().await;
    let uri = server.uri();
    drop(server);

    let source = GitHubReleaseSource::from_config(&RuntimeConfig::default())
        .unwrap()
        .with_api_url(uri)
        .with_token(None);
    let decision = UpdateChecker::new(source, OWNER, REPO, VERSION_1_0_0, ASSET_ZIP)
        .check_for_update()
        .await;

    assert_eq!(decision, UpdateDecision::default());
}

#[tokio::test]
async fn test_unparseable_tag_is_not_available() {
    let server = MockServer::start().await;
    let release = ReleaseBuilder::new()
        .tag("nightly")
        .asset(ASSET_ZIP, &package_url(&server));
    mock_latest_release(&server, release.to_json()).await;

    let decision = checker(&server, VERSION_1_0_0, ASSET_ZIP)
        .check_for_update()
        .await;

    assert!(!decision.available);
    assert_eq!(decision.latest_tag, "nightly");
}

#[tokio::test]
async fn test_background_check_delivers_decision() {
    let server = MockServer::start().await;
    let release = ReleaseBuilder::new()
        .tag(TAG_V1_1_0)
        .asset(ASSET_ZIP, &package_url(&server));
    mock_latest_release(&server, release.to_json()).await;

    let handle = checker(&server, VERSION_1_0_0, ASSET_ZIP).check_in_background();
    let decision = handle.await.unwrap();

    assert!(decision.available);
}
