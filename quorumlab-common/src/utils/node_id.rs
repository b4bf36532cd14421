use serde::{Deserialize, Serialize};

/// Unique identifier for a node in the simulated cluster.
///
/// `NodeId` is a lightweight wrapper around `u32`, designed to:
/// - Ensure type safety across APIs
/// - Enable strong `HashMap`/`BTreeMap` keys
/// - Provide readable formatting and conversions
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u32);

impl std::fmt::Display for NodeId {
    /// Enables direct formatting via `{}` for logging and messages.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for NodeId {
    /// Example:
    /// ```rust
    /// use quorumlab_common::NodeId;
    /// let id: NodeId = 3.into();
    /// assert_eq!(id.0, 3);
    /// ```
    fn from(id: u32) -> Self {
        NodeId(id)
    }
}

impl std::str::FromStr for NodeId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<u32>().map(NodeId)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{BTreeMap, HashSet};

    #[test]
    fn test_node_id_construction_and_display() {
        let id = NodeId(7);
        assert_eq!(id.0, 7);
        assert_eq!(format!("{}", id), "7");
    }

    #[test]
    fn test_node_id_from_u32_and_str() {
        let id: NodeId = 4.into();
        assert_eq!(id, NodeId(4));

        let parsed: NodeId = " 12 ".parse().unwrap();
        assert_eq!(parsed, NodeId(12));
        assert!("node-1".parse::<NodeId>().is_err());
    }

    #[test]
    fn test_node_id_ordering_and_hashing() {
        let mut map = BTreeMap::new();
        map.insert(NodeId(2), "b");
        map.insert(NodeId(1), "a");
        let keys: Vec<_> = map.keys().copied().collect();
        assert_eq!(keys, vec![NodeId(1), NodeId(2)]);

        let set: HashSet<NodeId> = map.keys().copied().collect();
        assert!(set.contains(&NodeId(1)));
    }

    #[test]
    fn test_node_id_serializes_as_plain_integer() {
        let json = serde_json::to_string(&NodeId(3)).unwrap();
        assert_eq!(json, "3");
        let back: NodeId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, NodeId(3));
    }
}
