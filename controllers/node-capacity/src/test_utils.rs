//! Test utilities for unit testing the reconciler and watcher
//!
//! Builders for node snapshots, raw `Node` objects and controller settings.

use crate::config::ControllerConfig;
use capacity::NodeSnapshot;
use k8s_openapi::api::core::v1::{Node, NodeCondition, NodeStatus};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use std::collections::BTreeMap;
use std::path::PathBuf;

pub const GROUP_LABEL: &str = "instancegroup";
pub const RESOURCE: &str = "pxfd.tech/pod-count";

/// Settings used by tests: label `instancegroup`, default resource name, no dry run, no force
pub fn test_config() -> ControllerConfig {
    ControllerConfig {
        kubeconfig: None,
        resource_name: RESOURCE.to_string(),
        config_file_path: PathBuf::from("/etc/pod-as-resource/config.yaml"),
        dry_run: false,
        group_label_key: GROUP_LABEL.to_string(),
        metrics_bind_address: ([127, 0, 0, 1], 0).into(),
        force: false,
        max_concurrent_reconciles: 4,
    }
}

/// Ready node snapshot, optionally labeled with a group and carrying a recorded value
pub fn ready_node(name: &str, group: Option<&str>, existing: Option<&str>) -> NodeSnapshot {
    NodeSnapshot {
        name: name.to_string(),
        labels: group
            .map(|g| BTreeMap::from([(GROUP_LABEL.to_string(), g.to_string())]))
            .unwrap_or_default(),
        ready: true,
        existing_capacity: existing.map(str::to_string),
    }
}

/// Not-ready, unpatched node snapshot
pub fn not_ready_node(name: &str, group: Option<&str>) -> NodeSnapshot {
    NodeSnapshot {
        ready: false,
        ..ready_node(name, group, None)
    }
}

/// Raw `Node` as delivered by the API server
pub fn test_node(name: &str, group: &str, ready: bool, existing: Option<&str>) -> Node {
    let capacity = existing.map(|value| BTreeMap::from([(RESOURCE.to_string(), Quantity(value.to_string()))]));
    Node {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            labels: Some(BTreeMap::from([(GROUP_LABEL.to_string(), group.to_string())])),
            ..Default::default()
        },
        spec: None,
        status: Some(NodeStatus {
            conditions: Some(vec![NodeCondition {
                type_: "Ready".to_string(),
                status: if ready { "True" } else { "False" }.to_string(),
                ..Default::default()
            }]),
            capacity,
            ..Default::default()
        }),
    }
}
