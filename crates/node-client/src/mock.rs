//! Mock NodePatcher for unit testing
//!
//! Records every patch in memory instead of sending it to a cluster, and can be
//! switched into a failing mode to exercise error paths.

use crate::error::NodeClientError;
use crate::patcher::NodePatcher;
use std::sync::{Arc, Mutex};

/// A patch received by the mock
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedPatch {
    /// Target node
    pub node_name: String,
    /// Raw patch body
    pub body: Vec<u8>,
}

impl AppliedPatch {
    /// Body decoded as JSON
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).unwrap_or(serde_json::Value::Null)
    }
}

/// Mock node client for testing
///
/// Clones share the same recorded state.
#[derive(Debug, Clone, Default)]
pub struct MockNodeClient {
    applied: Arc<Mutex<Vec<AppliedPatch>>>,
    // Every call fails with this message while set
    failure: Arc<Mutex<Option<String>>>,
    calls: Arc<Mutex<usize>>,
}

impl MockNodeClient {
    /// Creates a mock that accepts every patch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes all subsequent calls fail with `message`.
    pub fn fail_with(&self, message: impl Into<String>) {
        *self.failure.lock().unwrap() = Some(message.into());
    }

    /// Makes subsequent calls succeed again.
    pub fn recover(&self) {
        *self.failure.lock().unwrap() = None;
    }

    /// Successfully applied patches, in call order.
    pub fn applied(&self) -> Vec<AppliedPatch> {
        self.applied.lock().unwrap().clone()
    }

    /// Number of calls, failed ones included.
    pub fn call_count(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait::async_trait]
impl NodePatcher for MockNodeClient {
    async fn patch_node_status(&self, node_name: &str, patch: &[u8]) -> Result<(), NodeClientError> {
        *self.calls.lock().unwrap() += 1;

        if let Some(message) = self.failure.lock().unwrap().clone() {
            return Err(NodeClientError::Api(message));
        }

        // Reject bodies the real client could not decode either
        let _: serde_json::Value = serde_json::from_slice(patch)?;

        self.applied.lock().unwrap().push(AppliedPatch {
            node_name: node_name.to_string(),
            body: patch.to_vec(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_records_patches() {
        let mock = MockNodeClient::new();
        mock.patch_node_status("node-a", br#"[{"op":"add","path":"/status/capacity/pods","value":3}]"#)
            .await
            .unwrap();

        let applied = mock.applied();
        assert_eq!(applied.len(), 1);
        assert_eq!(applied[0].node_name, "node-a");
        assert_eq!(applied[0].json()[0]["value"], 3);
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn test_mock_failure_mode() {
        let mock = MockNodeClient::new();
        mock.fail_with("connection reset");

        let err = mock.patch_node_status("node-a", b"[]").await.unwrap_err();
        assert!(matches!(err, NodeClientError::Api(ref m) if m == "connection reset"));
        assert!(mock.applied().is_empty());

        mock.recover();
        mock.patch_node_status("node-a", b"[]").await.unwrap();
        assert_eq!(mock.applied().len(), 1);
        assert_eq!(mock.call_count(), 2);
    }

    #[tokio::test]
    async fn test_mock_rejects_invalid_json() {
        let mock = MockNodeClient::new();
        let err = mock.patch_node_status("node-a", b"not json").await.unwrap_err();
        assert!(matches!(err, NodeClientError::InvalidPatch(_)));
    }
}
