//! Periodic re-registration of dynamic capabilities
//!
//! The scheduler runs one pass immediately, then sleeps for the configured
//! interval and runs the next. The timer only starts once a pass has
//! finished, so a slow pass postpones the next one instead of overlapping
//! it. Failures are logged and counted; the loop keeps going until its
//! cancellation token fires.

use crate::error::Result;
use crate::registrar::DynamicRegistrar;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Pass counts of a finished refresh loop
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshReport {
    /// Passes that ran to completion
    pub passes: u64,

    /// Completed passes that returned an error
    pub failures: u64,
}

/// Re-registers dynamic capabilities on a fixed interval
pub struct RefreshScheduler {
    registrar: Arc<DynamicRegistrar>,
    server_address: String,
    self_address: String,
}

impl RefreshScheduler {
    pub fn new(
        registrar: Arc<DynamicRegistrar>,
        server_address: impl Into<String>,
        self_address: impl Into<String>,
    ) -> Self {
        Self {
            registrar,
            server_address: server_address.into(),
            self_address: self_address.into(),
        }
    }

    /// Run a single registration pass
    pub async fn run_pass(&self) -> Result<()> {
        let coordinates = &self.registrar.settings().coordinates;
        self.registrar
            .register_dynamic(&self.server_address, &self.self_address, coordinates)
            .await
    }

    /// Run passes until `cancel` fires.
    ///
    /// A pass in flight when the token fires is dropped and not counted.
    pub async fn run(&self, cancel: CancellationToken) -> RefreshReport {
        let interval = self.registrar.settings().interval;
        let mut report = RefreshReport::default();

        info!(
            "Starting capability refresh against {}, every {}s",
            self.server_address,
            interval.as_secs()
        );

        loop {
            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                outcome = self.run_pass() => outcome,
            };

            report.passes += 1;
            if let Err(e) = outcome {
                report.failures += 1;
                error!("Dynamic registration pass {} failed: {}", report.passes, e);
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(interval) => {}
            }
        }

        info!(
            "Capability refresh stopped after {} passes ({} failed)",
            report.passes, report.failures
        );
        report
    }
}
