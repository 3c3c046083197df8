//! Error types for capability registration

use thiserror::Error;

/// Result type alias using nginx-mesh-registry's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Failures of a registration pass, by stage
#[derive(Error, Debug)]
pub enum Error {
    /// Release feed failed, returned nothing, or returned an empty tag
    #[error("Could not get latest version: {reason}")]
    FeedUnavailable { reason: String },

    /// Chart repository could not map the app version to a chart version
    #[error("Could not resolve chart version of {chart} for app version {app_version}: {reason}")]
    ChartVersionResolutionFailed {
        chart: String,
        app_version: String,
        reason: String,
    },

    /// Bundle download URL could not be derived
    #[error("Could not derive bundle location: {reason}")]
    BundleLocationFailed { reason: String },

    /// Extraction filter with unset selectors
    #[error("Incomplete extraction filter, missing: {missing}")]
    IncompleteFilter { missing: String },

    /// Meshery rejected the registration or could not be reached
    #[error("Registration rejected by {server}: {reason}")]
    RegistrationRejected { server: String, reason: String },

    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    YamlParse(#[from] serde_yaml_ng::Error),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Configuration error
    #[error(transparent)]
    Config(#[from] nginx_mesh_core::Error),
}

impl Error {
    /// Create a feed unavailable error
    pub fn feed_unavailable(reason: impl Into<String>) -> Self {
        Self::FeedUnavailable {
            reason: reason.into(),
        }
    }

    /// Create a chart version resolution error
    pub fn chart_resolution(
        chart: impl Into<String>,
        app_version: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::ChartVersionResolutionFailed {
            chart: chart.into(),
            app_version: app_version.into(),
            reason: reason.into(),
        }
    }

    /// Create a bundle location error
    pub fn bundle_location(reason: impl Into<String>) -> Self {
        Self::BundleLocationFailed {
            reason: reason.into(),
        }
    }

    /// Create an incomplete filter error from the missing field names
    pub fn incomplete_filter(missing: &[&str]) -> Self {
        Self::IncompleteFilter {
            missing: missing.join(", "),
        }
    }

    /// Create a registration rejected error
    pub fn rejected(server: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::RegistrationRejected {
            server: server.into(),
            reason: reason.into(),
        }
    }
}
