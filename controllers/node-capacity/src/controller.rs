//! Main controller implementation.
//!
//! This module contains the `Controller` struct that loads the capacity table,
//! connects to the cluster, serves metrics and runs the node watcher until a
//! termination signal arrives.

use crate::config::ControllerConfig;
use crate::error::ControllerError;
use crate::metrics::{self, Metrics};
use crate::reconciler::Reconciler;
use crate::watcher::Watcher;
use capacity::CapacityTable;
use node_client::{ExponentialBackoff, KubeNodeClient};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Upper bound on the initial node listing.
pub const CACHE_SYNC_TIMEOUT: Duration = Duration::from_secs(60);

/// Main controller for node capacity management.
pub struct Controller {
    config: ControllerConfig,
    client: KubeNodeClient,
    reconciler: Arc<Reconciler>,
    metrics: Metrics,
}

impl Controller {
    /// Creates a new controller instance.
    ///
    /// Fails when the capacity table cannot be loaded or the API server
    /// stays unreachable through the connectivity probe.
    pub async fn new(config: ControllerConfig) -> Result<Self, ControllerError> {
        info!("Initializing Node Capacity Controller");

        let table = CapacityTable::load(&config.config_file_path)?;
        if table.is_empty() {
            warn!(
                path = %config.config_file_path.display(),
                "Capacity config has no groups, no node will be patched"
            );
        }
        for (group, capacity) in table.iter() {
            info!(group, capacity, "Capacity group");
        }

        let client =
            KubeNodeClient::connect(config.kubeconfig.as_deref(), &ExponentialBackoff::default())
                .await?;

        if config.dry_run {
            info!("Running in DRY-RUN mode");
        }
        if config.force {
            info!("Force mode: already patched nodes will be patched again");
        }

        let metrics = Metrics::new()?;
        let reconciler = Arc::new(Reconciler::new(
            &config,
            Arc::new(table),
            Arc::new(client.clone()),
            metrics.clone(),
        ));

        Ok(Self {
            config,
            client,
            reconciler,
            metrics,
        })
    }

    /// Runs the controller until shutdown.
    pub async fn run(self) -> Result<(), ControllerError> {
        let shutdown = CancellationToken::new();

        let addr = self.config.metrics_bind_address;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ControllerError::MetricsBind { addr, source })?;
        let metrics_server = tokio::spawn(metrics::serve(
            listener,
            self.metrics.clone(),
            shutdown.clone(),
        ));

        tokio::spawn(handle_signals(shutdown.clone()));

        let watcher = Watcher::new(
            self.client.nodes(),
            self.reconciler.clone(),
            self.config.resource_name.clone(),
            self.config.max_concurrent_reconciles,
        );
        let (synced_tx, synced_rx) = oneshot::channel();
        let mut node_watcher = tokio::spawn(watcher.run(shutdown.clone(), synced_tx));

        tokio::select! {
            result = wait_for_cache_sync(synced_rx, CACHE_SYNC_TIMEOUT) => {
                if let Err(e) = result {
                    shutdown.cancel();
                    node_watcher.abort();
                    return Err(e);
                }
                info!("Node Capacity Controller running");
            }
            _ = shutdown.cancelled() => {
                info!("Shutdown requested before node cache synced");
            }
        }

        // Returns once shutdown is requested and in-flight reconciliations drained
        let result = (&mut node_watcher)
            .await
            .map_err(|e| ControllerError::Watch(format!("Node watcher panicked: {}", e)))
            .and_then(|r| r);

        shutdown.cancel();
        match metrics_server.await {
            Ok(Err(e)) => error!("Metrics server error: {}", e),
            Err(e) => error!("Metrics server panicked: {}", e),
            Ok(Ok(())) => {}
        }

        if result.is_ok() {
            info!("Node Capacity Controller stopped");
        }
        result
    }
}

/// Waits for the watcher's initial listing to complete.
pub async fn wait_for_cache_sync(
    synced: oneshot::Receiver<()>,
    timeout: Duration,
) -> Result<(), ControllerError> {
    match tokio::time::timeout(timeout, synced).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(_)) => Err(ControllerError::CacheSync(
            "node watcher exited before the initial listing completed".to_string(),
        )),
        Err(_) => Err(ControllerError::CacheSync(format!(
            "timed out after {}s waiting for the initial node listing",
            timeout.as_secs()
        ))),
    }
}

/// Cancels `shutdown` on SIGTERM or SIGINT.
async fn handle_signals(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for SIGINT: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT. Terminating..."),
        _ = terminate => info!("Received SIGTERM. Terminating..."),
    }
    shutdown.cancel();
}
