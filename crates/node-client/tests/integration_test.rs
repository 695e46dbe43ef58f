//! Integration tests for the node client
//!
//! These tests require a reachable cluster (KUBECONFIG or in-cluster config)
//! and permission to patch `nodes/status`. Set TEST_NODE_NAME to pick the node.

use node_client::{ExponentialBackoff, KubeNodeClient, NodePatcher};
use std::time::Duration;

fn quick_backoff() -> ExponentialBackoff {
    ExponentialBackoff::new(Duration::from_millis(200), 1.5, 0.1, 3)
}

#[tokio::test]
#[ignore] // Requires running cluster
async fn test_connect_discovers_version() {
    let client = KubeNodeClient::connect(None, &quick_backoff())
        .await
        .expect("Failed to connect to cluster");

    let version = client.client().apiserver_version().await
        .expect("Failed to query server version");
    assert!(!version.major.is_empty());
}

#[tokio::test]
#[ignore] // Requires running cluster
async fn test_patch_node_status() {
    let node_name = std::env::var("TEST_NODE_NAME")
        .expect("TEST_NODE_NAME environment variable must be set");

    let client = KubeNodeClient::connect(None, &quick_backoff())
        .await
        .expect("Failed to connect to cluster");

    let patch = capacity::build_patch("example.com/integration-test", 1)
        .expect("Failed to build patch");
    client.patch_node_status(&node_name, &patch).await
        .expect("Failed to patch node status");

    let node = client.nodes().get_status(&node_name).await
        .expect("Failed to read node status");
    let recorded = node.status
        .and_then(|s| s.capacity)
        .and_then(|c| c.get("example.com/integration-test").cloned());
    assert_eq!(recorded.map(|q| q.0), Some("1".to_string()));
}

#[tokio::test]
async fn test_connect_with_missing_kubeconfig_fails() {
    let result = KubeNodeClient::connect(
        Some(std::path::Path::new("/nonexistent/kubeconfig")),
        &quick_backoff(),
    )
    .await;

    assert!(matches!(result, Err(node_client::NodeClientError::Kubeconfig(_))));
}
