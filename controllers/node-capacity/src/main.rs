//! Node Capacity Controller
//!
//! Advertises a synthetic capacity resource on cluster nodes.
//!
//! Each node's group is read from a label (by default the kops instance group),
//! looked up in a static group -> capacity table, and written to
//! `status.capacity[<resource name>]` so the scheduler can account for it,
//! for example to cap how many pods an autoscaling group's nodes host.

mod config;
mod controller;
mod error;
mod metrics;
mod reconciler;
#[cfg(test)]
mod test_utils;
mod watcher;

use crate::config::{Cli, ControllerConfig};
use crate::error::ControllerError;
use clap::Parser;
use controller::Controller;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), ControllerError> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // kube's rustls backend needs a process-wide crypto provider
    if rustls::crypto::ring::default_provider().install_default().is_err() {
        info!("rustls crypto provider already installed");
    }

    let cli = Cli::parse();
    let config = ControllerConfig::try_from(cli)?;

    info!("Starting Node Capacity Controller");
    info!("Configuration:");
    info!("  Resource name: {}", config.resource_name);
    info!("  Group label: {}", config.group_label_key);
    info!("  Config file: {}", config.config_file_path.display());
    info!("  Metrics address: {}", config.metrics_bind_address);
    info!(
        "  Kubeconfig: {}",
        config
            .kubeconfig
            .as_deref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "in-cluster / default".to_string())
    );

    // Initialize and run controller
    let controller = Controller::new(config).await?;
    controller.run().await?;

    Ok(())
}
