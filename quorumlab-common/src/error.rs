use thiserror::Error;

use crate::env::types::StateGroup;
use crate::utils::NodeId;

pub type Result<T> = std::result::Result<T, SimError>;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("Node {0} is crashed/inactive")]
    NodeUnavailable(NodeId),

    #[error("Quorum not met: {responded} responses, need {required}")]
    QuorumNotMet {
        responded: usize,
        required: usize,
        groups: Vec<StateGroup>,
    },

    #[error("Consistency violation: replicas reported {} distinct states", groups.len())]
    ConsistencyViolation { groups: Vec<StateGroup> },

    #[error("No leader is currently elected")]
    NoLeader,

    #[error("No active nodes available")]
    NoQuorumAvailable,

    #[error("Unknown node: {0}")]
    UnknownNode(NodeId),

    #[error("Protocol {protocol} does not support operation {operation}")]
    UnsupportedOperation {
        protocol: String,
        operation: String,
    },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Invalid config: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SimError {
    /// Replica groups observed by a failed read, if the failure carries any.
    pub fn groups(&self) -> &[StateGroup] {
        match self {
            SimError::QuorumNotMet { groups, .. } | SimError::ConsistencyViolation { groups } => groups,
            _ => &[],
        }
    }
}
