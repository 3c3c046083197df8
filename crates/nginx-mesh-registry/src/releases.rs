//! Mesh release lookup and version normalization

use crate::error::{Error, Result};
use async_trait::async_trait;
use nginx_mesh_core::types::{NetworkConfig, ReleaseFeedConfig};
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Marker stripped from the front of release tags
pub const VERSION_PREFIX: char = 'v';

/// Extra releases requested per page so drafts can be dropped without
/// leaving the page short
const DRAFT_HEADROOM: usize = 10;

/// Largest page the GitHub releases API serves
const MAX_PAGE_SIZE: usize = 100;

/// Release information
#[derive(Debug, Clone, Deserialize)]
pub struct Release {
    /// Release tag (e.g., "v2.5.0")
    pub tag_name: String,

    /// Release name
    #[serde(default)]
    pub name: Option<String>,

    /// Whether this is a prerelease
    #[serde(default)]
    pub prerelease: bool,

    /// Whether this is a draft
    #[serde(default)]
    pub draft: bool,

    /// Published date
    #[serde(default)]
    pub published_at: Option<String>,
}

impl Release {
    /// Release carrying only a tag
    pub fn tagged(tag: impl Into<String>) -> Self {
        Self {
            tag_name: tag.into(),
            name: None,
            prerelease: false,
            draft: false,
            published_at: None,
        }
    }
}

/// Source of mesh releases, newest first
#[async_trait]
pub trait ReleaseFeed: Send + Sync {
    /// Fetch at most `limit` of the most recent releases
    async fn latest_releases(&self, limit: usize) -> Result<Vec<Release>>;
}

/// Release feed backed by the GitHub releases API
pub struct GitHubReleaseFeed {
    /// GitHub API client
    client: reqwest::Client,

    /// Repository coordinates
    config: ReleaseFeedConfig,
}

impl GitHubReleaseFeed {
    /// Create a new GitHub release feed
    pub fn new(config: ReleaseFeedConfig, network: &NetworkConfig) -> Result<Self> {
        network.validate()?;
        let client = reqwest::Client::builder()
            .user_agent(&network.user_agent)
            .timeout(Duration::from_secs(network.http_timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }

    /// Page size requested for `limit` published releases
    pub fn page_size(limit: usize) -> usize {
        limit.saturating_add(DRAFT_HEADROOM).min(MAX_PAGE_SIZE)
    }

    fn releases_url(&self, limit: usize) -> String {
        format!(
            "{}/repos/{}/{}/releases?per_page={}",
            self.config.api_url.trim_end_matches('/'),
            self.config.repo_owner,
            self.config.repo_name,
            Self::page_size(limit)
        )
    }
}

#[async_trait]
impl ReleaseFeed for GitHubReleaseFeed {
    async fn latest_releases(&self, limit: usize) -> Result<Vec<Release>> {
        let url = self.releases_url(limit);
        debug!("Fetching latest releases from: {}", url);

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(Error::feed_unavailable(format!(
                "Failed to list releases: {}",
                response.status()
            )));
        }

        let mut releases: Vec<Release> = response.json().await?;
        releases.retain(|r| !r.draft);
        releases.truncate(limit);

        Ok(releases)
    }
}

/// Strip one leading [`VERSION_PREFIX`] from a release tag.
///
/// Only the prefix is touched: "vv1.0" becomes "v1.0" and "2.0.0-dev"
/// stays as is.
pub fn normalize_tag(tag: &str) -> &str {
    tag.strip_prefix(VERSION_PREFIX).unwrap_or(tag)
}

/// Mesh version with the release tag prefix removed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedVersion {
    tag: String,
    version: String,
}

impl NormalizedVersion {
    /// Normalize a release tag
    pub fn from_tag(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            version: normalize_tag(tag).to_string(),
        }
    }

    /// Normalized version (e.g., "2.5.0")
    pub fn as_str(&self) -> &str {
        &self.version
    }

    /// Release tag the version was derived from (e.g., "v2.5.0")
    pub fn tag(&self) -> &str {
        &self.tag
    }
}

impl fmt::Display for NormalizedVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.version)
    }
}

/// Resolves the latest mesh version from a release feed
pub struct VersionResolver {
    feed: Arc<dyn ReleaseFeed>,
}

impl VersionResolver {
    /// Create a resolver over a release feed
    pub fn new(feed: Arc<dyn ReleaseFeed>) -> Self {
        Self { feed }
    }

    /// Fetch the most recent release and normalize its tag
    pub async fn resolve_latest(&self) -> Result<NormalizedVersion> {
        let releases = self.feed.latest_releases(1).await.map_err(|e| match e {
            Error::FeedUnavailable { .. } => e,
            other => Error::feed_unavailable(other.to_string()),
        })?;

        let release = releases
            .into_iter()
            .next()
            .ok_or_else(|| Error::feed_unavailable("release feed returned no releases"))?;

        if release.tag_name.trim().is_empty() {
            return Err(Error::feed_unavailable("latest release has an empty tag"));
        }

        let version = NormalizedVersion::from_tag(&release.tag_name);
        debug!("Latest release {} normalized to {}", version.tag(), version);
        Ok(version)
    }
}
