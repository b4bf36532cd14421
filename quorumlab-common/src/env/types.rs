use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::utils::NodeId;

/// Key type of every replica's key-value state.
pub type Key = u64;

/// Full replica state, ordered by key so two snapshots compare deterministically.
pub type StateSnapshot = BTreeMap<Key, String>;

/// Fault status of a node as seen by the fault-injection controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeStatus {
    Healthy,
    /// Active, but lies during Byzantine-aware writes.
    Byzantine,
    Crashed,
}

impl fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NodeStatus::Healthy => "ACTIVE",
            NodeStatus::Byzantine => "BYZANTINE",
            NodeStatus::Crashed => "CRASHED",
        };
        write!(f, "{}", s)
    }
}

/// Nodes that reported one identical full-state snapshot during a read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateGroup {
    pub snapshot: StateSnapshot,
    pub nodes: Vec<NodeId>,
}

impl StateGroup {
    /// Adds `node` to the group in `groups` holding `snapshot`, opening a new
    /// group (in first-seen order) when none matches.
    pub fn insert(groups: &mut Vec<StateGroup>, node: NodeId, snapshot: StateSnapshot) {
        match groups.iter_mut().find(|g| g.snapshot == snapshot) {
            Some(group) => group.nodes.push(node),
            None => groups.push(StateGroup { snapshot, nodes: vec![node] }),
        }
    }
}

impl fmt::Display for StateGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let nodes: Vec<String> = self.nodes.iter().map(|n| n.to_string()).collect();
        let state = serde_json::to_string(&self.snapshot).map_err(|_| fmt::Error)?;
        write!(f, "{} reported by nodes [{}]", state, nodes.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(pairs: &[(Key, &str)]) -> StateSnapshot {
        pairs.iter().map(|(k, v)| (*k, v.to_string())).collect()
    }

    #[test]
    fn test_grouping_keeps_first_seen_order() {
        let mut groups = Vec::new();
        StateGroup::insert(&mut groups, NodeId(1), snapshot(&[(1, "a")]));
        StateGroup::insert(&mut groups, NodeId(2), snapshot(&[(1, "b")]));
        StateGroup::insert(&mut groups, NodeId(3), snapshot(&[(1, "a")]));

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].nodes, vec![NodeId(1), NodeId(3)]);
        assert_eq!(groups[1].nodes, vec![NodeId(2)]);
    }

    #[test]
    fn test_grouping_compares_whole_state() {
        let mut groups = Vec::new();
        StateGroup::insert(&mut groups, NodeId(1), snapshot(&[(1, "a"), (2, "x")]));
        StateGroup::insert(&mut groups, NodeId(2), snapshot(&[(1, "a")]));
        assert_eq!(groups.len(), 2);
    }

    #[test]
    fn test_group_display() {
        let group = StateGroup { snapshot: snapshot(&[(1, "a")]), nodes: vec![NodeId(1), NodeId(4)] };
        assert_eq!(group.to_string(), r#"{"1":"a"} reported by nodes [1, 4]"#);
    }
}
