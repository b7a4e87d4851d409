//! Wiremock endpoints for the release API and package downloads

use serde_json::Value;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::constants::*;

fn latest_release_path() -> String {
    format!("/repos/{}/{}/releases/latest", OWNER, REPO)
}

/// Serve `body` as the latest release of OWNER/REPO
pub async fn mock_latest_release(server: &MockServer, body: Value) {
    Mock::given(method("GET"))
        .and(path(latest_release_path()))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

/// Answer the latest-release endpoint with `status` and no body
pub async fn mock_latest_release_status(server: &MockServer, status: u16) {
    Mock::given(method("GET"))
        .and(path(latest_release_path()))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

/// Answer the latest-release endpoint with a raw, possibly invalid, body
pub async fn mock_latest_release_raw(server: &MockServer, body: &str) {
    Mock::given(method("GET"))
        .and(path(latest_release_path()))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(body.as_bytes().to_vec(), "application/json"),
        )
        .mount(server)
        .await;
}

pub async fn mock_package(server: &MockServer, content: &[u8]) {
    Mock::given(method("GET"))
        .and(path(PACKAGE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(content.to_vec()))
        .mount(server)
        .await;
}

/// First `fail_count` requests get a 500, later ones `content`
pub async fn mock_flaky_package(server: &MockServer, fail_count: u64, content: &[u8]) {
    Mock::given(method("GET"))
        .and(path(PACKAGE_PATH))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(fail_count)
        .mount(server)
        .await;

    mock_package(server, content).await;
}

pub async fn mock_package_status(server: &MockServer, status: u16) {
    Mock::given(method("GET"))
        .and(path(PACKAGE_PATH))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

pub fn package_url(server: &MockServer) -> String {
    format!("{}{}", server.uri(), PACKAGE_PATH)
}
