//! Runtime configuration types for operational parameters
//!
//! These types define configuration that controls where the adapter
//! registers its capabilities, where it looks up mesh releases, and how
//! its outbound HTTP calls behave.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Complete runtime configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RuntimeConfig {
    /// Meshery server and adapter addressing
    #[serde(default)]
    pub server: ServerConfig,

    /// Network and HTTP configuration
    #[serde(default)]
    pub network: NetworkConfig,

    /// Release feed used to discover the latest mesh version
    #[serde(default)]
    pub releases: ReleaseFeedConfig,

    /// Registration endpoints on the Meshery server
    #[serde(default)]
    pub endpoints: EndpointsConfig,
}

/// Addresses of the Meshery server and of this adapter instance
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ServerConfig {
    /// Meshery server address; `http://` is assumed when no scheme is given
    #[serde(default = "default_meshery_address")]
    pub meshery_address: String,

    /// Host name under which Meshery reaches this adapter
    #[serde(default = "default_service_address")]
    pub service_address: String,

    /// Port the adapter listens on
    #[serde(default = "default_port")]
    pub port: u16,
}

impl ServerConfig {
    /// Meshery server URL with a scheme
    pub fn meshery_url(&self) -> String {
        normalize_server_address(&self.meshery_address)
    }

    /// Address identifying this adapter instance to Meshery (`host:port`)
    pub fn self_address(&self) -> String {
        format!("{}:{}", self.service_address, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            meshery_address: default_meshery_address(),
            service_address: default_service_address(),
            port: default_port(),
        }
    }
}

/// Prefix `http://` onto addresses that carry no scheme.
pub fn normalize_server_address(address: &str) -> String {
    let address = address.trim();
    if address.starts_with("http") {
        address.to_string()
    } else {
        format!("http://{}", address)
    }
}

fn default_meshery_address() -> String {
    "http://localhost:9081".to_string()
}
fn default_service_address() -> String {
    "localhost".to_string()
}
fn default_port() -> u16 {
    10010
}

/// Network and HTTP configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct NetworkConfig {
    /// HTTP timeout in seconds for release and chart lookups
    #[serde(default = "default_http_timeout")]
    pub http_timeout_secs: u64,

    /// User agent string for HTTP requests
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            http_timeout_secs: default_http_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

impl NetworkConfig {
    /// Reject settings no HTTP client can be built from
    pub fn validate(&self) -> Result<()> {
        if self.http_timeout_secs == 0 {
            return Err(Error::invalid_config("network.http-timeout-secs must be positive"));
        }
        if self.user_agent.trim().is_empty() {
            return Err(Error::invalid_config("network.user-agent must not be empty"));
        }
        Ok(())
    }
}

fn default_http_timeout() -> u64 {
    60
}
fn default_user_agent() -> String {
    format!(
        "nginx-mesh-adapter/{} ({}; {})",
        env!("CARGO_PKG_VERSION"),
        std::env::consts::OS,
        std::env::consts::ARCH
    )
}

/// GitHub release feed for the mesh distribution
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ReleaseFeedConfig {
    /// Base URL for the GitHub API
    #[serde(default = "default_github_api_url")]
    pub api_url: String,

    /// Repository owner
    #[serde(default = "default_repo_owner")]
    pub repo_owner: String,

    /// Repository name
    #[serde(default = "default_repo_name")]
    pub repo_name: String,
}

impl Default for ReleaseFeedConfig {
    fn default() -> Self {
        Self {
            api_url: default_github_api_url(),
            repo_owner: default_repo_owner(),
            repo_name: default_repo_name(),
        }
    }
}

fn default_github_api_url() -> String {
    "https://api.github.com".to_string()
}
fn default_repo_owner() -> String {
    "nginxinc".to_string()
}
fn default_repo_name() -> String {
    "nginx-service-mesh".to_string()
}

/// Registration endpoint paths, relative to the Meshery server URL
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct EndpointsConfig {
    /// Static workload definitions
    #[serde(default = "default_workloads_path")]
    pub workloads_path: String,

    /// Static trait definitions
    #[serde(default = "default_traits_path")]
    pub traits_path: String,

    /// Dynamic (bundle-derived) workload generation
    #[serde(default = "default_dynamic_path")]
    pub dynamic_path: String,
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            workloads_path: default_workloads_path(),
            traits_path: default_traits_path(),
            dynamic_path: default_dynamic_path(),
        }
    }
}

impl EndpointsConfig {
    /// Every path must be absolute so it can be appended to the server URL
    pub fn validate(&self) -> Result<()> {
        for (key, path) in [
            ("workloads-path", &self.workloads_path),
            ("traits-path", &self.traits_path),
            ("dynamic-path", &self.dynamic_path),
        ] {
            if !path.starts_with('/') {
                return Err(Error::invalid_config(format!(
                    "endpoints.{} must start with '/': {:?}",
                    key, path
                )));
            }
        }
        Ok(())
    }
}

fn default_workloads_path() -> String {
    "/api/oam/workload".to_string()
}
fn default_traits_path() -> String {
    "/api/oam/trait".to_string()
}
fn default_dynamic_path() -> String {
    "/api/oam/workload/generate".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_server_address_adds_scheme() {
        assert_eq!(
            normalize_server_address("meshery:9081"),
            "http://meshery:9081"
        );
    }

    #[test]
    fn test_normalize_server_address_keeps_scheme() {
        assert_eq!(
            normalize_server_address("https://meshery.example.com"),
            "https://meshery.example.com"
        );
        assert_eq!(
            normalize_server_address("http://localhost:9081"),
            "http://localhost:9081"
        );
    }

    #[test]
    fn test_self_address() {
        let server = ServerConfig {
            service_address: "nginx-adapter".to_string(),
            port: 10010,
            ..Default::default()
        };
        assert_eq!(server.self_address(), "nginx-adapter:10010");
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let yaml = "server:\n  port: 10999\n";
        let config: RuntimeConfig = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(config.server.port, 10999);
        assert_eq!(config.server.meshery_address, "http://localhost:9081");
        assert_eq!(config.releases.repo_name, "nginx-service-mesh");
        assert_eq!(config.endpoints.traits_path, "/api/oam/trait");
    }

    #[test]
    fn test_network_validation() {
        assert!(NetworkConfig::default().validate().is_ok());

        let zero_timeout = NetworkConfig {
            http_timeout_secs: 0,
            ..Default::default()
        };
        assert!(matches!(
            zero_timeout.validate(),
            Err(Error::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_endpoints_validation() {
        assert!(EndpointsConfig::default().validate().is_ok());

        let relative = EndpointsConfig {
            dynamic_path: "api/oam/workload/generate".to_string(),
            ..Default::default()
        };
        match relative.validate() {
            Err(Error::InvalidConfig { message }) => assert!(message.contains("dynamic-path")),
            other => panic!("expected InvalidConfig, got {:?}", other),
        }
    }
}
