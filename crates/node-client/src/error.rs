//! Node client errors

use thiserror::Error;

/// Errors that can occur when talking to the Kubernetes API
#[derive(Debug, Error)]
pub enum NodeClientError {
    /// Explicit kubeconfig could not be loaded
    #[error("Kubeconfig error: {0}")]
    Kubeconfig(#[from] kube::config::KubeconfigError),

    /// Neither in-cluster nor default kubeconfig could be resolved
    #[error("Cannot infer cluster configuration: {0}")]
    InferConfig(#[from] kube::config::InferConfigError),

    /// Kubernetes API request failed
    #[error("Kubernetes API error: {0}")]
    Kube(#[from] kube::Error),

    /// Patch body is not a valid JSON patch
    #[error("Invalid patch: {0}")]
    InvalidPatch(#[from] serde_json::Error),

    /// Error injected by a test double or reported without an underlying cause
    #[error("API error: {0}")]
    Api(String),
}
