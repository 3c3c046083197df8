//! NGINX mesh adapter
//!
//! Registers static NGINX Service Mesh capabilities with Meshery at startup,
//! then keeps the dynamically generated workload components current by
//! re-registering the latest release on a fixed interval.

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use nginx_mesh_core::{HierarchicalConfigLoader, RuntimeConfig};
use nginx_mesh_registry::{
    register_static, DynamicRegistrar, GitHubReleaseFeed, HelmIndexResolver,
    HttpRegistrationSink, RefreshScheduler, RegistrationSettings,
};
use std::sync::Arc;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize rustls crypto provider (required for rustls 0.23+)
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let config = load_config(&cli)?;
    let server_address = config.server.meshery_url();
    let self_address = config.server.self_address();

    let sink = Arc::new(
        HttpRegistrationSink::new(config.endpoints.clone(), &config.network)
            .context("Failed to build registration client")?,
    );
    let registrar = DynamicRegistrar::new(
        Arc::new(
            GitHubReleaseFeed::new(config.releases.clone(), &config.network)
                .context("Failed to build release feed client")?,
        ),
        Arc::new(
            HelmIndexResolver::new(&config.network)
                .context("Failed to build chart index client")?,
        ),
        sink.clone(),
        RegistrationSettings::default(),
    );
    let scheduler = RefreshScheduler::new(Arc::new(registrar), &server_address, &self_address);

    if cli.once {
        info!("Running a single registration pass against {}", server_address);
        return scheduler
            .run_pass()
            .await
            .context("Dynamic registration failed");
    }

    info!(
        "NGINX mesh adapter {} at {} registering with {}",
        env!("CARGO_PKG_VERSION"),
        self_address,
        server_address
    );

    let cancel = CancellationToken::new();

    let static_task = {
        let (server, adapter) = (server_address.clone(), self_address.clone());
        let cancel = cancel.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {}
                result = register_static(sink.as_ref(), &server, &adapter) => {
                    if result.is_ok() {
                        info!("Static capabilities registered");
                    }
                }
            }
        })
    };

    let refresh_task = {
        let cancel = cancel.clone();
        tokio::spawn(async move { scheduler.run(cancel).await })
    };

    shutdown_signal().await;
    cancel.cancel();

    if let Err(e) = static_task.await {
        warn!("Static registration task ended abnormally: {}", e);
    }
    let report = refresh_task
        .await
        .context("Refresh task ended abnormally")?;

    info!(
        "Shut down after {} registration passes ({} failed)",
        report.passes, report.failures
    );
    Ok(())
}

/// Load the layered runtime config, then apply CLI overrides
fn load_config(cli: &Cli) -> Result<RuntimeConfig> {
    let mut loader = HierarchicalConfigLoader::new().context("Failed to locate config directory")?;
    if let Some(path) = &cli.config {
        loader = loader.with_config_file(path.clone());
    }

    let mut config = loader
        .load_runtime_config()
        .context("Failed to load adapter configuration")?;

    if let Some(port) = cli.port {
        config.server.port = port;
    }

    Ok(config)
}

/// Wait for SIGTERM or SIGINT (Ctrl+C)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}

/// Initialize tracing with appropriate verbosity
fn init_tracing(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("info"),
            1 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();
}
