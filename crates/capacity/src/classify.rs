//! Node classification
//!
//! Maps a node's group label to the capacity configured for that group.

use crate::error::ClassifyError;
use crate::table::CapacityTable;
use std::collections::BTreeMap;

/// Resolves the capacity for a node from its labels.
///
/// Zero or negative capacities are returned as-is; deciding what to do with
/// them is up to the caller.
pub fn classify(
    labels: &BTreeMap<String, String>,
    group_label_key: &str,
    table: &CapacityTable,
) -> Result<i64, ClassifyError> {
    let group = labels
        .get(group_label_key)
        .ok_or_else(|| ClassifyError::NoGroupLabel {
            label: group_label_key.to_string(),
        })?;

    let capacity = table.get(group).ok_or_else(|| ClassifyError::UnknownGroup {
        group: group.clone(),
    })?;

    if capacity > i64::from(u32::MAX) {
        return Err(ClassifyError::InvalidCapacityValue {
            group: group.clone(),
            value: capacity,
        });
    }

    Ok(capacity)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn table() -> CapacityTable {
        CapacityTable::from_entries([("workers-a", "10"), ("workers-b", "4"), ("idle", "0")]).unwrap()
    }

    #[test]
    fn test_classify_known_group() {
        let labels = labels(&[("instancegroup", "workers-b"), ("kubernetes.io/os", "linux")]);
        assert_eq!(classify(&labels, "instancegroup", &table()), Ok(4));
    }

    #[test]
    fn test_classify_missing_label() {
        let labels = labels(&[("kubernetes.io/os", "linux")]);
        assert_eq!(
            classify(&labels, "instancegroup", &table()),
            Err(ClassifyError::NoGroupLabel {
                label: "instancegroup".to_string()
            })
        );
    }

    #[test]
    fn test_classify_empty_labels() {
        let err = classify(&BTreeMap::new(), "instancegroup", &table()).unwrap_err();
        assert_eq!(err.kind(), "NoGroupLabel");
    }

    #[test]
    fn test_classify_unknown_group() {
        let labels = labels(&[("instancegroup", "gpu")]);
        assert_eq!(
            classify(&labels, "instancegroup", &table()),
            Err(ClassifyError::UnknownGroup {
                group: "gpu".to_string()
            })
        );
    }

    #[test]
    fn test_classify_label_key_is_exact() {
        // Group value present only under a different key
        let labels = labels(&[("kops.k8s.io/instancegroup", "workers-a")]);
        assert!(matches!(
            classify(&labels, "instancegroup", &table()),
            Err(ClassifyError::NoGroupLabel { .. })
        ));
    }

    #[test]
    fn test_classify_zero_capacity_is_not_an_error() {
        let labels = labels(&[("instancegroup", "idle")]);
        assert_eq!(classify(&labels, "instancegroup", &table()), Ok(0));
    }

    #[test]
    fn test_classify_capacity_out_of_range() {
        let table = CapacityTable::from_entries([("huge", "4294967296")]).unwrap();
        let labels = labels(&[("instancegroup", "huge")]);
        assert_eq!(
            classify(&labels, "instancegroup", &table),
            Err(ClassifyError::InvalidCapacityValue {
                group: "huge".to_string(),
                value: 4_294_967_296,
            })
        );

        let table = CapacityTable::from_entries([("max", "4294967295")]).unwrap();
        let labels = labels_for("max");
        assert_eq!(classify(&labels, "instancegroup", &table), Ok(4_294_967_295));
    }

    fn labels_for(group: &str) -> BTreeMap<String, String> {
        labels(&[("instancegroup", group)])
    }
}
