//! Status capacity patch
//!
//! Builds the JSON-patch body sent to the node `status` subresource:
//!
//! ```json
//! [{"op":"add","path":"/status/capacity/pxfd.tech~1pod-count","value":5}]
//! ```

use crate::error::PatchError;
use serde::{Deserialize, Serialize};

/// Path prefix of the node's advertised capacity map.
pub const STATUS_CAPACITY_PATH: &str = "/status/capacity";

/// Single JSON-patch operation carrying a 32-bit value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchOperation {
    /// Operation name, always `add` here
    pub op: String,
    /// JSON pointer to the target member
    pub path: String,
    /// Capacity value
    pub value: u32,
}

impl PatchOperation {
    /// `add` operation for `resource_name` under the status capacity map.
    pub fn add_capacity(resource_name: &str, value: u32) -> Self {
        Self {
            op: "add".to_string(),
            path: format!("{}/{}", STATUS_CAPACITY_PATH, escape_path_segment(resource_name)),
            value,
        }
    }
}

/// Escapes a JSON pointer reference token (RFC 6901).
///
/// `~` must be replaced before `/`, otherwise the `~` introduced by `~1`
/// would itself be escaped.
pub fn escape_path_segment(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}

/// Serialized patch adding `value` for `resource_name` to the node status capacity.
pub fn build_patch(resource_name: &str, value: u32) -> Result<Vec<u8>, PatchError> {
    let ops = [PatchOperation::add_capacity(resource_name, value)];
    Ok(serde_json::to_vec(&ops)?)
}
