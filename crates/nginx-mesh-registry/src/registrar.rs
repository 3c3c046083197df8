//! Registration passes against the Meshery server

use crate::chart::{BundleLocator, BundleReference, ChartCoordinates, ChartResolver};
use crate::error::{Error, Result};
use crate::extraction::{ExtractionRule, FilterSpec, GenerationMethod};
use crate::releases::{ReleaseFeed, VersionResolver};
use crate::sink::RegistrationSink;
use crate::{MESH_NAME, REREGISTER_INTERVAL_HOURS, SUBMISSION_TIMEOUT_MINUTES};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Fixed parameters of dynamic registration
#[derive(Debug, Clone)]
pub struct RegistrationSettings {
    /// Mesh type name reported to Meshery
    pub mesh_name: String,

    /// Chart the bundle is published under
    pub coordinates: ChartCoordinates,

    /// Processing bound sent with each rule
    pub timeout_minutes: u32,

    /// Time between the end of one pass and the start of the next
    pub interval: Duration,
}

impl RegistrationSettings {
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }
}

impl Default for RegistrationSettings {
    fn default() -> Self {
        Self {
            mesh_name: MESH_NAME.to_string(),
            coordinates: ChartCoordinates::default(),
            timeout_minutes: SUBMISSION_TIMEOUT_MINUTES,
            interval: Duration::from_secs(REREGISTER_INTERVAL_HOURS * 60 * 60),
        }
    }
}

/// Resolves the latest bundle and submits its extraction rule
pub struct DynamicRegistrar {
    versions: VersionResolver,
    bundles: BundleLocator,
    sink: Arc<dyn RegistrationSink>,
    filter: FilterSpec,
    settings: RegistrationSettings,
}

impl DynamicRegistrar {
    pub fn new(
        feed: Arc<dyn ReleaseFeed>,
        resolver: Arc<dyn ChartResolver>,
        sink: Arc<dyn RegistrationSink>,
        settings: RegistrationSettings,
    ) -> Self {
        Self {
            versions: VersionResolver::new(feed),
            bundles: BundleLocator::new(resolver),
            sink,
            filter: FilterSpec::custom_resource_definitions(),
            settings,
        }
    }

    /// Replace the CRD filter, e.g. for a differently laid out bundle
    pub fn with_filter(mut self, filter: FilterSpec) -> Self {
        self.filter = filter;
        self
    }

    pub fn settings(&self) -> &RegistrationSettings {
        &self.settings
    }

    /// Run one dynamic registration.
    ///
    /// A chart resolution failure does not stop the pass: the rule is still
    /// submitted, pointing at an unresolved bundle. Every other failure
    /// returns before anything is submitted.
    pub async fn register_dynamic(
        &self,
        server_address: &str,
        self_address: &str,
        coordinates: &ChartCoordinates,
    ) -> Result<()> {
        let version = self.versions.resolve_latest().await?;
        info!(
            "Registering latest workload components for version {}",
            version.tag()
        );

        let bundle = match self.bundles.locate(coordinates, &version).await {
            Ok(bundle) => bundle,
            Err(e @ Error::ChartVersionResolutionFailed { .. }) => {
                warn!("{} (continuing with an unresolved chart version)", e);
                BundleReference::unresolved(coordinates)?
            }
            Err(e) => return Err(e),
        };

        let rule = ExtractionRule::new(
            &self.settings.mesh_name,
            version.as_str(),
            self.filter.clone(),
            GenerationMethod::BundleArchive,
            bundle.download_url,
            self.settings.timeout_minutes,
        )?;

        self.sink
            .register_workloads_dynamically(server_address, self_address, &rule)
            .await
            .map_err(|e| match e {
                Error::RegistrationRejected { .. } => e,
                other => Error::rejected(server_address, other.to_string()),
            })?;

        info!(
            "Latest workload components successfully registered for version {}",
            version
        );
        Ok(())
    }
}

/// Register the embedded workload and trait definitions once.
///
/// Traits are attempted even when workloads fail; the first failure is
/// returned after both have run.
pub async fn register_static(
    sink: &dyn RegistrationSink,
    server_address: &str,
    self_address: &str,
) -> Result<()> {
    let workloads = sink.register_workloads(server_address, self_address).await;
    if let Err(e) = &workloads {
        warn!("Static workload registration failed: {}", e);
    }

    let traits = sink.register_traits(server_address, self_address).await;
    if let Err(e) = &traits {
        warn!("Static trait registration failed: {}", e);
    }

    if workloads.is_ok() && traits.is_ok() {
        info!("Static workload and trait definitions registered");
    }

    workloads.and(traits)
}
