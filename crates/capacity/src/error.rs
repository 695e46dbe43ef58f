//! Capacity core errors

use thiserror::Error;

/// Errors raised while loading the capacity table. All of them are fatal at startup.
#[derive(Debug, Error)]
pub enum CapacityTableError {
    /// Config file could not be read
    #[error("cannot read config file {path}: {source}")]
    Read {
        /// Path that failed to read
        path: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Config document is not a mapping of group to capacity
    #[error("cannot parse config file: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// A group maps to something that is not an integer
    #[error("invalid capacity {value:?} for group {group:?}")]
    InvalidCapacity {
        /// Group with the bad value
        group: String,
        /// Offending value as written in the document
        value: String,
    },
}

/// Reasons a node could not be mapped to a capacity.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClassifyError {
    /// Node carries no value for the group label key
    #[error("node has no {label:?} label")]
    NoGroupLabel {
        /// Label key that was looked up
        label: String,
    },

    /// Node's group is not present in the capacity table
    #[error("group {group:?} not found in capacity table")]
    UnknownGroup {
        /// Group read from the node label
        group: String,
    },

    /// Table value does not fit the capacity resource
    #[error("capacity {value} for group {group:?} does not fit a 32-bit resource value")]
    InvalidCapacityValue {
        /// Group read from the node label
        group: String,
        /// Configured capacity
        value: i64,
    },
}

impl ClassifyError {
    /// Short kind label, used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            ClassifyError::NoGroupLabel { .. } => "NoGroupLabel",
            ClassifyError::UnknownGroup { .. } => "UnknownGroup",
            ClassifyError::InvalidCapacityValue { .. } => "InvalidCapacityValue",
        }
    }
}

/// Patch serialization error
#[derive(Debug, Error)]
pub enum PatchError {
    /// Patch operations could not be encoded as JSON
    #[error("cannot serialize patch: {0}")]
    Serialization(#[from] serde_json::Error),
}
