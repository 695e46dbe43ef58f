//! Reconciliation logic for node capacity.
//!
//! For every observed node the reconciler decides whether the node should
//! advertise the capacity configured for its group, and patches the node
//! status when it should. Each call is independent: the only state it reads
//! besides the node snapshot is the immutable capacity table.

use crate::config::ControllerConfig;
use crate::metrics::Metrics;
use capacity::{build_patch, classify, CapacityTable, ClassifyError, NodeSnapshot};
use node_client::NodePatcher;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Why a node was skipped as not ready.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotReadyReason {
    /// `Ready` condition is not `True`
    NodeNotReady,
    /// Group maps to a capacity below 1
    ZeroCapacity,
}

/// Result of one reconciliation, for logs and metrics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Node not ready, or its group has no usable capacity
    SkippedNotReady(NotReadyReason),
    /// Group could not be resolved
    SkippedUnclassified(ClassifyError),
    /// Resource already recorded and not forced
    SkippedAlreadyPatched,
    /// Patch sent and accepted
    Applied,
    /// Patch logged instead of sent
    DryRunLogged,
    /// Patch rejected or not sent
    ApplyFailed,
}

impl Outcome {
    /// Metric label value
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::SkippedNotReady(NotReadyReason::NodeNotReady) => "skipped_not_ready",
            Outcome::SkippedNotReady(NotReadyReason::ZeroCapacity) => "skipped_zero_capacity",
            Outcome::SkippedUnclassified(_) => "skipped_unclassified",
            Outcome::SkippedAlreadyPatched => "skipped_already_patched",
            Outcome::Applied => "applied",
            Outcome::DryRunLogged => "dry_run_logged",
            Outcome::ApplyFailed => "apply_failed",
        }
    }
}

/// Receives node add/update notifications from the watcher.
#[async_trait::async_trait]
pub trait NodeEventHandler: Send + Sync {
    /// First sighting of a node.
    async fn on_add(&self, node: &NodeSnapshot);
    /// Later sighting, with the previously seen snapshot.
    async fn on_update(&self, old: &NodeSnapshot, new: &NodeSnapshot);
}

/// Reconciles the capacity resource of cluster nodes.
pub struct Reconciler {
    table: Arc<CapacityTable>,
    group_label_key: String,
    resource_name: String,
    dry_run: bool,
    force: bool,
    patcher: Arc<dyn NodePatcher>,
    metrics: Metrics,
}

impl Reconciler {
    /// Creates a new reconciler instance.
    pub fn new(
        config: &ControllerConfig,
        table: Arc<CapacityTable>,
        patcher: Arc<dyn NodePatcher>,
        metrics: Metrics,
    ) -> Self {
        Self {
            table,
            group_label_key: config.group_label_key.clone(),
            resource_name: config.resource_name.clone(),
            dry_run: config.dry_run,
            force: config.force,
            patcher,
            metrics,
        }
    }

    /// Reconciles a single node snapshot.
    ///
    /// Steps, stopping at the first that applies:
    /// 1. Skip nodes that are not ready
    /// 2. Skip nodes whose group cannot be resolved
    /// 3. Skip groups configured with a capacity below 1
    /// 4. In dry-run mode, log the patch and stop
    /// 5. Skip nodes that already carry the resource, unless forced
    /// 6. Apply the patch; failures are logged and left to the next event
    pub async fn reconcile(&self, node: &NodeSnapshot) -> Outcome {
        let outcome = self.decide_and_apply(node).await;
        self.metrics.record_outcome(&outcome);
        debug!(node = %node.name, outcome = outcome.as_str(), "Reconciled node");
        outcome
    }

    async fn decide_and_apply(&self, node: &NodeSnapshot) -> Outcome {
        let name = node.name.as_str();

        if !node.ready {
            info!(node = name, "Node NOTREADY");
            return Outcome::SkippedNotReady(NotReadyReason::NodeNotReady);
        }

        let capacity = match classify(&node.labels, &self.group_label_key, &self.table) {
            Ok(capacity) => capacity,
            Err(e) => {
                warn!(node = name, kind = e.kind(), "Cannot get resources for node: {}", e);
                return Outcome::SkippedUnclassified(e);
            }
        };

        // Bounded by classify to u32::MAX
        let value = match u32::try_from(capacity) {
            Ok(value) if value >= 1 => value,
            _ => {
                warn!(
                    node = name,
                    capacity,
                    "Zero capacity node, check the capacity config"
                );
                return Outcome::SkippedNotReady(NotReadyReason::ZeroCapacity);
            }
        };

        let patch = match build_patch(&self.resource_name, value) {
            Ok(patch) => patch,
            Err(e) => {
                error!(node = name, "Create patch failed: {}", e);
                return Outcome::ApplyFailed;
            }
        };

        if self.dry_run {
            info!(
                node = name,
                patch = %String::from_utf8_lossy(&patch),
                "DRY RUN patch node"
            );
            return Outcome::DryRunLogged;
        }

        if let Some(existing) = node.existing_capacity.as_deref() {
            if !self.force {
                info!(
                    node = name,
                    resource = %self.resource_name,
                    existing,
                    "Node already has resource value"
                );
                return Outcome::SkippedAlreadyPatched;
            }
            info!(
                node = name,
                resource = %self.resource_name,
                existing,
                capacity = value,
                "Forcing patch over existing resource value"
            );
        }

        let started = Instant::now();
        let result = self.patcher.patch_node_status(name, &patch).await;
        self.metrics.observe_patch_duration(started.elapsed().as_secs_f64());

        match result {
            Ok(()) => {
                info!(
                    node = name,
                    resource = %self.resource_name,
                    capacity = value,
                    "Patched node"
                );
                Outcome::Applied
            }
            Err(e) => {
                error!(node = name, "FAILED patching node: {}", e);
                Outcome::ApplyFailed
            }
        }
    }
}

#[async_trait::async_trait]
impl NodeEventHandler for Reconciler {
    async fn on_add(&self, node: &NodeSnapshot) {
        info!(node = %node.name, "Processing node");
        self.reconcile(node).await;
    }

    async fn on_update(&self, _old: &NodeSnapshot, new: &NodeSnapshot) {
        debug!(node = %new.name, "Update event for node");
        self.reconcile(new).await;
    }
}
