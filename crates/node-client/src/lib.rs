//! Kubernetes Node Client
//!
//! Applies capacity patches to the `status` subresource of cluster nodes.
//!
//! # Example
//!
//! ```no_run
//! use node_client::{ExponentialBackoff, KubeNodeClient, NodePatcher};
//!
//! # async fn example() -> Result<(), node_client::NodeClientError> {
//! // Connect using the inferred kubeconfig, probing the API server with bounded retry
//! let client = KubeNodeClient::connect(None, &ExponentialBackoff::default()).await?;
//!
//! let patch = br#"[{"op":"add","path":"/status/capacity/pxfd.tech~1pod-count","value":4}]"#;
//! client.patch_node_status("ip-10-0-0-1", patch).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Features
//!
//! - **Connectivity probe**: server version discovery with exponential backoff and jitter
//! - **Mocking**: `MockNodeClient` behind the `test-util` feature records patches in memory

pub mod backoff;
pub mod client;
pub mod error;
#[path = "trait.rs"]
pub mod patcher;
#[cfg(any(test, feature = "test-util"))]
pub mod mock;

pub use backoff::{retry_with_backoff, ExponentialBackoff};
pub use client::{KubeNodeClient, CLIENT_USER_AGENT};
pub use error::NodeClientError;
pub use patcher::NodePatcher;
#[cfg(any(test, feature = "test-util"))]
pub use mock::{AppliedPatch, MockNodeClient};
