//! Mock server helpers for the HTTP collaborators
//!
//! A single wiremock server can stand in for the GitHub API, the Helm
//! repository, and the Meshery server at once.

use nginx_mesh_core::types::{EndpointsConfig, NetworkConfig, ReleaseFeedConfig};
use nginx_mesh_registry::GitHubReleaseFeed;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Path of the release listing for the default repository
pub const RELEASES_PATH: &str = "/repos/nginxinc/nginx-service-mesh/releases";

/// Release feed config pointing at the mock server
pub fn release_feed_config(server: &MockServer) -> ReleaseFeedConfig {
    ReleaseFeedConfig {
        api_url: server.uri(),
        ..Default::default()
    }
}

/// Network config with a short timeout for tests
pub fn test_network() -> NetworkConfig {
    NetworkConfig {
        http_timeout_secs: 5,
        ..Default::default()
    }
}

/// Default endpoint paths
pub fn test_endpoints() -> EndpointsConfig {
    EndpointsConfig::default()
}

/// GitHub release JSON for a tag
pub fn release_json(tag: &str, draft: bool) -> serde_json::Value {
    serde_json::json!({
        "tag_name": tag,
        "name": format!("NGINX Service Mesh {}", tag),
        "prerelease": false,
        "draft": draft,
        "published_at": "2024-01-01T00:00:00Z",
        "assets": []
    })
}

/// Serve a release listing for the page a feed requests when asked for `limit`
pub async fn mock_releases(server: &MockServer, limit: usize, releases: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(RELEASES_PATH))
        .and(query_param(
            "per_page",
            GitHubReleaseFeed::page_size(limit).to_string(),
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(releases))
        .mount(server)
        .await;
}

/// Fail the release listing with a status code
pub async fn mock_releases_status(server: &MockServer, status: u16) {
    Mock::given(method("GET"))
        .and(path(RELEASES_PATH))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

/// Serve a Helm repository index at `/index.yaml`
pub async fn mock_chart_index(server: &MockServer, index: &str) {
    Mock::given(method("GET"))
        .and(path("/index.yaml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(index))
        .mount(server)
        .await;
}

/// Answer POSTs to a registration path with a status code
pub async fn mock_registration(server: &MockServer, endpoint: &str, status: u16) {
    Mock::given(method("POST"))
        .and(path(endpoint))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

/// JSON bodies of every POST received on a path
pub async fn posted_bodies(server: &MockServer, endpoint: &str) -> Vec<serde_json::Value> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.method.as_str() == "POST" && r.url.path() == endpoint)
        .map(|r| r.body_json::<serde_json::Value>().unwrap())
        .collect()
}
