//! Registration sink: the Meshery server receiving capability definitions
//!
//! Static capabilities are OAM workload and trait definitions embedded in
//! the binary and posted one by one. Dynamic capabilities are described by
//! an [`ExtractionRule`] which Meshery evaluates against the bundle itself.

use crate::error::{Error, Result};
use crate::extraction::ExtractionRule;
use crate::OPERATION;
use async_trait::async_trait;
use nginx_mesh_core::types::{EndpointsConfig, NetworkConfig};
use rust_embed::RustEmbed;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

/// Embedded static capability definitions
#[derive(RustEmbed)]
#[folder = "$CARGO_MANIFEST_DIR/../../embedded/capabilities/"]
#[prefix = ""]
struct StaticCapabilities;

/// Kinds of static capability definitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapabilityKind {
    Workload,
    Trait,
}

impl CapabilityKind {
    fn directory(self) -> &'static str {
        match self {
            CapabilityKind::Workload => "workloads/",
            CapabilityKind::Trait => "traits/",
        }
    }
}

/// Parse the embedded definitions of a kind, sorted by file name
pub fn static_definitions(kind: CapabilityKind) -> Result<Vec<serde_json::Value>> {
    let mut names: Vec<String> = StaticCapabilities::iter()
        .filter(|name| name.starts_with(kind.directory()) && name.ends_with(".json"))
        .map(|name| name.into_owned())
        .collect();
    names.sort();

    names
        .iter()
        .filter_map(|name| StaticCapabilities::get(name))
        .map(|file| serde_json::from_slice(&file.data).map_err(Error::from))
        .collect()
}

/// Remote side of capability registration
#[async_trait]
pub trait RegistrationSink: Send + Sync {
    /// Register the embedded workload definitions
    async fn register_workloads(&self, server_address: &str, self_address: &str) -> Result<()>;

    /// Register the embedded trait definitions
    async fn register_traits(&self, server_address: &str, self_address: &str) -> Result<()>;

    /// Ask the server to derive and register workloads from a bundle
    async fn register_workloads_dynamically(
        &self,
        server_address: &str,
        self_address: &str,
        rule: &ExtractionRule,
    ) -> Result<()>;
}

#[derive(Serialize)]
struct StaticRegistration<'a> {
    oam_definition: &'a serde_json::Value,
    host: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DynamicRegistration<'a> {
    adapter_address: &'a str,
    operation: &'a str,
    config: &'a ExtractionRule,
}

/// Registration sink posting JSON to the Meshery server
pub struct HttpRegistrationSink {
    client: reqwest::Client,
    endpoints: EndpointsConfig,
    http_timeout: Duration,
}

impl HttpRegistrationSink {
    /// Create a new HTTP registration sink
    pub fn new(endpoints: EndpointsConfig, network: &NetworkConfig) -> Result<Self> {
        network.validate()?;
        endpoints.validate()?;
        let client = reqwest::Client::builder()
            .user_agent(&network.user_agent)
            .build()?;

        Ok(Self {
            client,
            endpoints,
            http_timeout: Duration::from_secs(network.http_timeout_secs),
        })
    }

    fn endpoint(server_address: &str, path: &str) -> String {
        format!("{}{}", server_address.trim_end_matches('/'), path)
    }

    async fn post_json<T: Serialize + ?Sized>(
        &self,
        server_address: &str,
        url: &str,
        body: &T,
        timeout: Duration,
    ) -> Result<()> {
        debug!("Posting registration to: {}", url);

        let response = self
            .client
            .post(url)
            .timeout(timeout)
            .json(body)
            .send()
            .await
            .map_err(|e| Error::rejected(server_address, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::rejected(
                server_address,
                format!("{} {}", status, body.trim()),
            ));
        }

        Ok(())
    }

    async fn register_static(
        &self,
        kind: CapabilityKind,
        path: &str,
        server_address: &str,
        self_address: &str,
    ) -> Result<()> {
        let url = Self::endpoint(server_address, path);

        for definition in static_definitions(kind)? {
            let body = StaticRegistration {
                oam_definition: &definition,
                host: self_address,
            };
            self.post_json(server_address, &url, &body, self.http_timeout)
                .await?;
        }

        Ok(())
    }
}

#[async_trait]
impl RegistrationSink for HttpRegistrationSink {
    async fn register_workloads(&self, server_address: &str, self_address: &str) -> Result<()> {
        self.register_static(
            CapabilityKind::Workload,
            &self.endpoints.workloads_path,
            server_address,
            self_address,
        )
        .await
    }

    async fn register_traits(&self, server_address: &str, self_address: &str) -> Result<()> {
        self.register_static(
            CapabilityKind::Trait,
            &self.endpoints.traits_path,
            server_address,
            self_address,
        )
        .await
    }

    async fn register_workloads_dynamically(
        &self,
        server_address: &str,
        self_address: &str,
        rule: &ExtractionRule,
    ) -> Result<()> {
        let url = Self::endpoint(server_address, &self.endpoints.dynamic_path);
        let body = DynamicRegistration {
            adapter_address: self_address,
            operation: OPERATION,
            config: rule,
        };
        let timeout = Duration::from_secs(u64::from(rule.timeout_minutes) * 60);

        self.post_json(server_address, &url, &body, timeout).await
    }
}
