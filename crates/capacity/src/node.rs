//! Node snapshot
//!
//! The subset of a `Node` the reconciler decides on, captured at event time.

use k8s_openapi::api::core::v1::Node;
use std::collections::BTreeMap;

/// Read-only view of one node at the time of an event.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NodeSnapshot {
    /// Node name
    pub name: String,
    /// Node labels
    pub labels: BTreeMap<String, String>,
    /// `Ready` condition reported `True`
    pub ready: bool,
    /// Quantity already recorded for the capacity resource, as the API server returned it.
    ///
    /// The server canonicalizes quantities (`1000` reads back as `1k`), so only
    /// presence is meaningful.
    pub existing_capacity: Option<String>,
}

impl NodeSnapshot {
    /// Captures `node`, reading the recorded value of `resource_name` from `status.capacity`.
    ///
    /// Returns `None` for objects without a name.
    pub fn from_node(node: &Node, resource_name: &str) -> Option<Self> {
        let name = node.metadata.name.clone()?;
        let labels = node.metadata.labels.clone().unwrap_or_default();
        let status = node.status.as_ref();

        let ready = status
            .and_then(|s| s.conditions.as_ref())
            .and_then(|conditions| conditions.iter().find(|c| c.type_ == "Ready"))
            .is_some_and(|c| c.status == "True");

        let existing_capacity = status
            .and_then(|s| s.capacity.as_ref())
            .and_then(|capacity| capacity.get(resource_name))
            .map(|quantity| quantity.0.clone());

        Some(Self {
            name,
            labels,
            ready,
            existing_capacity,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::core::v1::{NodeCondition, NodeStatus};
    use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

    const RESOURCE: &str = "pxfd.tech/pod-count";

    fn node(ready: &str, capacity: Option<&str>) -> Node {
        let mut caps = BTreeMap::from([("pods".to_string(), Quantity("110".to_string()))]);
        if let Some(value) = capacity {
            caps.insert(RESOURCE.to_string(), Quantity(value.to_string()));
        }
        Node {
            metadata: ObjectMeta {
                name: Some("ip-10-0-0-1".to_string()),
                labels: Some(BTreeMap::from([(
                    "kops.k8s.io/instancegroup".to_string(),
                    "workers-a".to_string(),
                )])),
                ..Default::default()
            },
            spec: None,
            status: Some(NodeStatus {
                conditions: Some(vec![
                    NodeCondition {
                        type_: "MemoryPressure".to_string(),
                        status: "False".to_string(),
                        ..Default::default()
                    },
                    NodeCondition {
                        type_: "Ready".to_string(),
                        status: ready.to_string(),
                        ..Default::default()
                    },
                ]),
                capacity: Some(caps),
                ..Default::default()
            }),
        }
    }

    #[test]
    fn test_snapshot_ready_unpatched() {
        let snapshot = NodeSnapshot::from_node(&node("True", None), RESOURCE).unwrap();

        assert_eq!(snapshot.name, "ip-10-0-0-1");
        assert!(snapshot.ready);
        assert_eq!(snapshot.existing_capacity, None);
        assert_eq!(
            snapshot.labels.get("kops.k8s.io/instancegroup").map(String::as_str),
            Some("workers-a")
        );
    }

    #[test]
    fn test_snapshot_not_ready() {
        assert!(!NodeSnapshot::from_node(&node("False", None), RESOURCE).unwrap().ready);
        assert!(!NodeSnapshot::from_node(&node("Unknown", None), RESOURCE).unwrap().ready);
    }

    #[test]
    fn test_snapshot_without_status_is_not_ready() {
        let mut n = node("True", None);
        n.status = None;
        let snapshot = NodeSnapshot::from_node(&n, RESOURCE).unwrap();
        assert!(!snapshot.ready);
        assert_eq!(snapshot.existing_capacity, None);
    }

    #[test]
    fn test_snapshot_existing_capacity() {
        let snapshot = NodeSnapshot::from_node(&node("True", Some("4")), RESOURCE).unwrap();
        assert_eq!(snapshot.existing_capacity.as_deref(), Some("4"));
    }

    #[test]
    fn test_snapshot_canonicalized_quantity_is_recorded() {
        // 1000 and 1000000 come back from the API server with SI suffixes
        for quantity in ["1k", "1M", "500m"] {
            let snapshot = NodeSnapshot::from_node(&node("True", Some(quantity)), RESOURCE).unwrap();
            assert_eq!(snapshot.existing_capacity.as_deref(), Some(quantity));
        }
    }

    #[test]
    fn test_snapshot_requires_name() {
        let mut n = node("True", None);
        n.metadata.name = None;
        assert!(NodeSnapshot::from_node(&n, RESOURCE).is_none());
    }
}
