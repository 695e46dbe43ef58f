//! NodePatcher trait for mocking
//!
//! Abstracts the patch-apply call so the reconciler can be tested without a cluster.
//! `KubeNodeClient` is the production implementation, `MockNodeClient` the test one.

use crate::error::NodeClientError;

/// Applies status patches to nodes.
///
/// Implementations must be shareable across concurrently running reconciliations.
#[async_trait::async_trait]
pub trait NodePatcher: Send + Sync {
    /// Applies a JSON-patch body to the `status` subresource of `node_name`.
    async fn patch_node_status(&self, node_name: &str, patch: &[u8]) -> Result<(), NodeClientError>;
}
