//! Controller-specific error types.
//!
//! Everything here is fatal: per-node failures are logged and recorded as a
//! reconcile outcome instead of being returned as errors.

use capacity::CapacityTableError;
use node_client::NodeClientError;
use thiserror::Error;

/// Errors that can stop the Node Capacity Controller.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// Capacity config file unreadable or malformed
    #[error("Capacity config error: {0}")]
    CapacityTable(#[from] CapacityTableError),

    /// Cluster API unreachable after bounded retry
    #[error("Kubernetes client error: {0}")]
    Client(#[from] NodeClientError),

    /// Invalid command-line or environment value
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Metrics registration failed
    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    /// Metrics listener could not be bound
    #[error("Cannot bind metrics listener on {addr}: {source}")]
    MetricsBind {
        addr: std::net::SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// Initial node listing did not complete in time
    #[error("Failed to sync node cache: {0}")]
    CacheSync(String),

    /// Resource watch failed
    #[error("Resource watch failed: {0}")]
    Watch(String),
}
