//! Helm chart version resolution and bundle location
//!
//! The mesh publishes its CRDs through a Helm chart whose version differs
//! from the mesh's own application version. A [`BundleLocator`] maps the
//! normalized mesh version to the chart version through a [`ChartResolver`]
//! and derives the archive URL Meshery downloads the bundle from.

use crate::error::{Error, Result};
use crate::releases::{normalize_tag, NormalizedVersion};
use crate::{CHART_ARCHIVE_BASE_URL, CHART_NAME, CHART_REPOSITORY_URL};
use async_trait::async_trait;
use nginx_mesh_core::types::NetworkConfig;
use semver::Version;
use serde::{Deserialize, Deserializer};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace};
use url::Url;

/// Helm repository and chart the bundle is published under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartCoordinates {
    /// Helm repository URL
    pub repository_url: String,

    /// Chart name within the repository
    pub chart_name: String,
}

impl ChartCoordinates {
    /// Create coordinates for a chart in a repository
    pub fn new(repository_url: impl Into<String>, chart_name: impl Into<String>) -> Self {
        Self {
            repository_url: repository_url.into(),
            chart_name: chart_name.into(),
        }
    }
}

impl Default for ChartCoordinates {
    fn default() -> Self {
        Self::new(CHART_REPOSITORY_URL, CHART_NAME)
    }
}

/// Resolved chart version and the archive URL derived from it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleReference {
    /// Chart version; empty when resolution failed
    pub chart_version: String,

    /// Download URL of the packaged chart
    pub download_url: String,
}

impl BundleReference {
    /// Build the reference for a chart version.
    ///
    /// The URL template is `{base}/{chart}-{chart_version}.tgz?raw=true`.
    pub fn new(coordinates: &ChartCoordinates, chart_version: impl Into<String>) -> Result<Self> {
        let chart_version = chart_version.into();
        let download_url = format!(
            "{}/{}-{}.tgz?raw=true",
            CHART_ARCHIVE_BASE_URL, coordinates.chart_name, chart_version
        );

        Url::parse(&download_url)
            .map_err(|e| Error::bundle_location(format!("{}: {}", download_url, e)))?;

        Ok(Self {
            chart_version,
            download_url,
        })
    }

    /// Reference with no chart version, used when resolution failed
    pub fn unresolved(coordinates: &ChartCoordinates) -> Result<Self> {
        Self::new(coordinates, String::new())
    }

    /// Whether a chart version was resolved
    pub fn is_resolved(&self) -> bool {
        !self.chart_version.is_empty()
    }
}

/// Maps a mesh application version to a packaged chart version
#[async_trait]
pub trait ChartResolver: Send + Sync {
    /// Chart version packaging `app_version` of `chart_name`
    async fn resolve_chart_version(
        &self,
        repository_url: &str,
        chart_name: &str,
        app_version: &str,
    ) -> Result<String>;
}

/// Helm repository `index.yaml`
#[derive(Debug, Deserialize)]
struct ChartIndex {
    #[serde(default)]
    entries: HashMap<String, Vec<ChartEntry>>,
}

#[derive(Debug, Deserialize)]
struct ChartEntry {
    #[serde(default, deserialize_with = "version_string")]
    version: Option<String>,

    #[serde(rename = "appVersion", default, deserialize_with = "version_string")]
    app_version: Option<String>,
}

// Unquoted versions such as `appVersion: 1.10` arrive as YAML floats whose
// original digits are gone, so only string scalars count as versions.
fn version_string<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<String>, D::Error> {
    match serde_yaml_ng::Value::deserialize(deserializer)? {
        serde_yaml_ng::Value::String(s) => Ok(Some(s)),
        _ => Ok(None),
    }
}

/// Chart resolver reading a Helm repository index over HTTP
pub struct HelmIndexResolver {
    client: reqwest::Client,
}

impl HelmIndexResolver {
    /// Create a resolver with the configured timeout and user agent
    pub fn new(network: &NetworkConfig) -> Result<Self> {
        network.validate()?;
        let client = reqwest::Client::builder()
            .user_agent(&network.user_agent)
            .timeout(Duration::from_secs(network.http_timeout_secs))
            .build()?;

        Ok(Self { client })
    }

    /// Pick the highest chart version whose appVersion matches.
    ///
    /// Chart versions that are not semver rank below semver ones.
    fn select_chart_version(entries: &[ChartEntry], app_version: &str) -> Option<String> {
        let wanted = normalize_tag(app_version);

        let matching: Vec<(&str, &str)> = entries
            .iter()
            .filter_map(|e| Some((e.version.as_deref()?, e.app_version.as_deref()?)))
            .filter(|(_, app)| normalize_tag(app) == wanted)
            .collect();

        trace!(
            "{} chart entries match app version {}",
            matching.len(),
            wanted
        );

        matching
            .iter()
            .filter_map(|(version, _)| {
                Version::parse(normalize_tag(version))
                    .ok()
                    .map(|parsed| (parsed, *version))
            })
            .max_by(|(a, _), (b, _)| a.cmp(b))
            .map(|(_, version)| version)
            .or_else(|| matching.first().map(|(version, _)| *version))
            .map(str::to_string)
    }
}

#[async_trait]
impl ChartResolver for HelmIndexResolver {
    async fn resolve_chart_version(
        &self,
        repository_url: &str,
        chart_name: &str,
        app_version: &str,
    ) -> Result<String> {
        let url = format!("{}/index.yaml", repository_url.trim_end_matches('/'));
        debug!("Fetching chart index from: {}", url);

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(Error::chart_resolution(
                chart_name,
                app_version,
                format!("Failed to fetch {}: {}", url, response.status()),
            ));
        }

        let body = response.text().await?;
        let index: ChartIndex = serde_yaml_ng::from_str(&body)?;

        let entries = index.entries.get(chart_name).ok_or_else(|| {
            Error::chart_resolution(chart_name, app_version, "chart not found in repository index")
        })?;

        Self::select_chart_version(entries, app_version).ok_or_else(|| {
            Error::chart_resolution(
                chart_name,
                app_version,
                "no chart version packages this app version",
            )
        })
    }
}

/// Resolves the bundle for a mesh version
pub struct BundleLocator {
    resolver: Arc<dyn ChartResolver>,
}

impl BundleLocator {
    /// Create a locator backed by a chart resolver
    pub fn new(resolver: Arc<dyn ChartResolver>) -> Self {
        Self { resolver }
    }

    /// Resolve the chart version for `version` and derive its download URL.
    ///
    /// Every resolver failure surfaces as `ChartVersionResolutionFailed`.
    pub async fn locate(
        &self,
        coordinates: &ChartCoordinates,
        version: &NormalizedVersion,
    ) -> Result<BundleReference> {
        let chart_version = self
            .resolver
            .resolve_chart_version(
                &coordinates.repository_url,
                &coordinates.chart_name,
                version.as_str(),
            )
            .await
            .map_err(|e| match e {
                Error::ChartVersionResolutionFailed { .. } => e,
                other => Error::chart_resolution(
                    &coordinates.chart_name,
                    version.as_str(),
                    other.to_string(),
                ),
            })?;

        if chart_version.trim().is_empty() {
            return Err(Error::chart_resolution(
                &coordinates.chart_name,
                version.as_str(),
                "resolver returned an empty chart version",
            ));
        }

        debug!(
            "Mesh version {} is packaged as chart {} {}",
            version, coordinates.chart_name, chart_version
        );

        BundleReference::new(coordinates, chart_version)
    }
}
