//! Capacity table
//!
//! Static mapping from node group to capacity, loaded once from a YAML
//! document such as:
//!
//! ```yaml
//! workers-a: "10"
//! workers-b: 4
//! ```
//!
//! Values may be quoted or bare integers. Anything else fails the load.

use crate::error::CapacityTableError;
use serde_yaml::Value;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

/// Immutable group -> capacity mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapacityTable {
    entries: BTreeMap<String, i64>,
}

impl CapacityTable {
    /// Reads and parses the config file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CapacityTableError> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path).map_err(|source| CapacityTableError::Read {
            path: path.display().to_string(),
            source,
        })?;
        debug!(path = %path.display(), "Loaded capacity config file");
        Self::from_yaml_str(&data)
    }

    /// Parses a YAML mapping document. An empty document yields an empty table.
    pub fn from_yaml_str(data: &str) -> Result<Self, CapacityTableError> {
        if data.trim().is_empty() {
            return Ok(Self::default());
        }

        let raw: BTreeMap<String, Value> = serde_yaml::from_str(data)?;
        let mut entries = BTreeMap::new();
        for (group, value) in raw {
            let capacity = match &value {
                Value::String(s) => s.trim().parse::<i64>().ok(),
                Value::Number(n) => n.as_i64(),
                _ => None,
            };
            let Some(capacity) = capacity else {
                return Err(CapacityTableError::InvalidCapacity {
                    group,
                    value: render_value(&value),
                });
            };
            entries.insert(group, capacity);
        }

        Ok(Self { entries })
    }

    /// Builds a table from string pairs, validating each value the same way the file loader does.
    pub fn from_entries<I, K, V>(entries: I) -> Result<Self, CapacityTableError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: AsRef<str>,
    {
        let mut table = BTreeMap::new();
        for (group, value) in entries {
            let group = group.into();
            let value = value.as_ref();
            let capacity = value.trim().parse::<i64>().map_err(|_| {
                CapacityTableError::InvalidCapacity {
                    group: group.clone(),
                    value: value.to_string(),
                }
            })?;
            table.insert(group, capacity);
        }
        Ok(Self { entries: table })
    }

    /// Capacity configured for `group`, if any.
    pub fn get(&self, group: &str) -> Option<i64> {
        self.entries.get(group).copied()
    }

    /// Number of configured groups.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no group is configured.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates entries in group order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, i64)> {
        self.entries.iter().map(|(group, capacity)| (group.as_str(), *capacity))
    }
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_else(|_| format!("{other:?}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_quoted_and_bare_values() {
        let table = CapacityTable::from_yaml_str("workers-a: \"10\"\nworkers-b: 4\n").unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.get("workers-a"), Some(10));
        assert_eq!(table.get("workers-b"), Some(4));
        assert_eq!(table.get("workers-c"), None);
    }

    #[test]
    fn test_zero_and_negative_values_load() {
        // Rejected later by the reconciler, not by the loader
        let table = CapacityTable::from_yaml_str("idle: \"0\"\nbroken: -3\n").unwrap();
        assert_eq!(table.get("idle"), Some(0));
        assert_eq!(table.get("broken"), Some(-3));
    }

    #[test]
    fn test_non_numeric_value_is_fatal() {
        let err = CapacityTable::from_yaml_str("workers-a: \"ten\"\n").unwrap_err();
        match err {
            CapacityTableError::InvalidCapacity { group, value } => {
                assert_eq!(group, "workers-a");
                assert_eq!(value, "ten");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_float_and_nested_values_are_fatal() {
        assert!(matches!(
            CapacityTable::from_yaml_str("workers-a: 1.5\n"),
            Err(CapacityTableError::InvalidCapacity { .. })
        ));
        assert!(matches!(
            CapacityTable::from_yaml_str("workers-a:\n  nested: 1\n"),
            Err(CapacityTableError::InvalidCapacity { .. })
        ));
    }

    #[test]
    fn test_non_mapping_document_is_fatal() {
        assert!(matches!(
            CapacityTable::from_yaml_str("- workers-a\n- workers-b\n"),
            Err(CapacityTableError::Parse(_))
        ));
    }

    #[test]
    fn test_empty_document_yields_empty_table() {
        let table = CapacityTable::from_yaml_str("\n").unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn test_from_entries_validates() {
        let table = CapacityTable::from_entries([("workers-a", "10"), ("workers-b", "4")]).unwrap();
        assert_eq!(table.iter().collect::<Vec<_>>(), vec![("workers-a", 10), ("workers-b", 4)]);

        assert!(CapacityTable::from_entries([("workers-a", "x")]).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "workers-a: \"10\"").unwrap();
        writeln!(file, "workers-b: \"4\"").unwrap();

        let table = CapacityTable::load(file.path()).unwrap();
        assert_eq!(table.get("workers-b"), Some(4));
    }

    #[test]
    fn test_load_missing_file() {
        let err = CapacityTable::load("/nonexistent/pod-as-resource/config.yaml").unwrap_err();
        assert!(matches!(err, CapacityTableError::Read { .. }));
    }
}
