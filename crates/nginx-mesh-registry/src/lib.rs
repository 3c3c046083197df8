//! Capability discovery and registration for the NGINX mesh adapter
//!
//! Provides:
//! - Latest mesh version lookup against GitHub releases
//! - Helm chart version resolution and bundle URL derivation
//! - The declarative CRD extraction rule handed to Meshery
//! - Dynamic and static registration against the Meshery server
//! - A refresh scheduler re-registering on a fixed interval

pub mod chart;
pub mod error;
pub mod extraction;
pub mod registrar;
pub mod releases;
pub mod scheduler;
pub mod sink;

pub use chart::{BundleLocator, BundleReference, ChartCoordinates, ChartResolver, HelmIndexResolver};
pub use error::{Error, Result};
pub use extraction::{ExtractionRule, FilterSpec, GenerationMethod, Selector};
pub use registrar::{register_static, DynamicRegistrar, RegistrationSettings};
pub use releases::{GitHubReleaseFeed, NormalizedVersion, Release, ReleaseFeed, VersionResolver};
pub use scheduler::{RefreshReport, RefreshScheduler};
pub use sink::{CapabilityKind, HttpRegistrationSink, RegistrationSink};

/// Helm repository hosting the NGINX Service Mesh chart
pub const CHART_REPOSITORY_URL: &str = "https://helm.nginx.com/stable";

/// Chart name within the repository
pub const CHART_NAME: &str = "nginx-service-mesh";

/// Location of the packaged chart archives, one `{chart}-{version}.tgz` per release
pub const CHART_ARCHIVE_BASE_URL: &str = "https://github.com/nginxinc/helm-charts/blob/master/stable";

/// Mesh type name reported to Meshery
pub const MESH_NAME: &str = "NGINX_SERVICE_MESH";

/// Operation family this adapter serves
pub const OPERATION: &str = "nginx";

/// Hours between dynamic re-registrations
pub const REREGISTER_INTERVAL_HOURS: u64 = 24;

/// Upper bound, in minutes, for Meshery to process a dynamic registration
pub const SUBMISSION_TIMEOUT_MINUTES: u32 = 60;
