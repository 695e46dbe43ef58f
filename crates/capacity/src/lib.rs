//! Node Capacity Core
//!
//! Pure decision pieces of the node capacity controller:
//! - `CapacityTable`: static group -> capacity mapping loaded once at startup
//! - `classify`: resolves a node's capacity from its group label
//! - `build_patch`: builds the JSON-patch that records the capacity on the node status
//! - `NodeSnapshot`: read-only view of a node as seen by a single event
//!
//! # Example
//!
//! ```
//! use capacity::{build_patch, classify, CapacityTable};
//! use std::collections::BTreeMap;
//!
//! let table = CapacityTable::from_yaml_str("workers-a: \"10\"\nworkers-b: \"4\"\n").unwrap();
//! let labels = BTreeMap::from([("instancegroup".to_string(), "workers-b".to_string())]);
//!
//! let capacity = classify(&labels, "instancegroup", &table).unwrap();
//! assert_eq!(capacity, 4);
//!
//! let patch = build_patch("pxfd.tech/pod-count", 4).unwrap();
//! assert_eq!(
//!     String::from_utf8(patch).unwrap(),
//!     r#"[{"op":"add","path":"/status/capacity/pxfd.tech~1pod-count","value":4}]"#
//! );
//! ```

pub mod classify;
pub mod error;
pub mod node;
pub mod patch;
pub mod table;

pub use classify::classify;
pub use error::{CapacityTableError, ClassifyError, PatchError};
pub use node::NodeSnapshot;
pub use patch::{build_patch, escape_path_segment, PatchOperation, STATUS_CAPACITY_PATH};
pub use table::CapacityTable;
