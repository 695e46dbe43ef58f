//! Kubernetes node client
//!
//! Builds a `kube::Client` from an explicit kubeconfig path or the inferred
//! environment, checks connectivity by discovering the server version, and
//! applies JSON patches to the node `status` subresource.

use crate::backoff::{retry_with_backoff, ExponentialBackoff};
use crate::error::NodeClientError;
use crate::patcher::NodePatcher;
use http::header::{HeaderValue, USER_AGENT};
use k8s_openapi::api::core::v1::Node;
use kube::api::{Patch, PatchParams};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Api, Client, Config};
use std::path::Path;
use tracing::{debug, info};

/// User agent sent with every API request
pub const CLIENT_USER_AGENT: &str = "pod-as-resource";

/// Adds the controller's user agent to `config`, replacing any set before.
pub fn with_user_agent(mut config: Config) -> Config {
    config.headers.retain(|(name, _)| name != USER_AGENT);
    config
        .headers
        .push((USER_AGENT, HeaderValue::from_static(CLIENT_USER_AGENT)));
    config
}

/// Node client backed by the Kubernetes API
#[derive(Clone)]
pub struct KubeNodeClient {
    client: Client,
    nodes: Api<Node>,
}

impl KubeNodeClient {
    /// Wraps an existing client.
    pub fn new(client: Client) -> Self {
        let nodes = Api::all(client.clone());
        Self { client, nodes }
    }

    /// Creates a client and probes the API server until it answers.
    ///
    /// With no `kubeconfig` the configuration is inferred: in-cluster service
    /// account first, then `$KUBECONFIG` / `~/.kube/config`.
    pub async fn connect(
        kubeconfig: Option<&Path>,
        backoff: &ExponentialBackoff,
    ) -> Result<Self, NodeClientError> {
        let config = match kubeconfig {
            Some(path) => {
                let kubeconfig = Kubeconfig::read_from(path)?;
                Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default()).await?
            }
            None => Config::infer().await?,
        };

        info!(host = %config.cluster_url, "Creating API client");
        let client = Client::try_from(with_user_agent(config))?;

        debug!("Trying to discover Kubernetes version");
        let version = retry_with_backoff(backoff, "discover Kubernetes version", || {
            client.apiserver_version()
        })
        .await?;

        info!(
            major = %version.major,
            minor = %version.minor,
            git = %version.git_version,
            state = %version.git_tree_state,
            commit = %version.git_commit,
            platform = %version.platform,
            "Running in Kubernetes cluster"
        );

        Ok(Self::new(client))
    }

    /// Underlying client, for building watchers.
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Cluster-scoped node API.
    pub fn nodes(&self) -> Api<Node> {
        self.nodes.clone()
    }
}

#[async_trait::async_trait]
impl NodePatcher for KubeNodeClient {
    async fn patch_node_status(&self, node_name: &str, patch: &[u8]) -> Result<(), NodeClientError> {
        let ops: json_patch::Patch = serde_json::from_slice(patch)?;
        let node = self
            .nodes
            .patch_status(node_name, &PatchParams::default(), &Patch::Json::<()>(ops))
            .await?;

        debug!(
            node = node_name,
            capacity = ?node.status.and_then(|s| s.capacity),
            "Patched node status"
        );
        Ok(())
    }
}
