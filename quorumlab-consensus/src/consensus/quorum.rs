use std::fmt;

use quorumlab_common::{Key, NodeId, Result, SimError, StateGroup};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::evaluator::QuorumPolicy;
use crate::cluster::{
    core::{pause_for, Cluster},
    node::ApplyOutcome,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReadValue {
    Found(String),
    NotFound,
}

impl fmt::Display for ReadValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadValue::Found(v) => write!(f, "{}", v),
            ReadValue::NotFound => write!(f, "<not found>"),
        }
    }
}

/// A read every responding replica agreed on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadResponse {
    pub key: Key,
    pub value: ReadValue,
    /// Always a single group on success; kept for rendering.
    pub groups: Vec<StateGroup>,
}

/// Per-node tally of one quorum write.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteReport {
    pub key: Key,
    /// Nodes that reported the write as applied, honest or not.
    pub acknowledged: Vec<NodeId>,
    /// Subset of `acknowledged` that stored a tampered value.
    pub corrupted: Vec<NodeId>,
    /// Inactive nodes that did not participate.
    pub skipped: Vec<NodeId>,
    /// Active nodes whose store rejected the write.
    pub failed: Vec<NodeId>,
    pub required: usize,
    pub total_nodes: usize,
}

impl WriteReport {
    pub fn acknowledgements(&self) -> usize {
        self.acknowledged.len()
    }

    pub fn quorum_met(&self) -> bool {
        self.acknowledgements() >= self.required
    }
}

/// Drives single-round quorum reads and writes across every node.
#[derive(Debug, Clone, Default)]
pub struct QuorumCoordinator {
    policy: QuorumPolicy,
}

impl QuorumCoordinator {
    pub fn new(policy: QuorumPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> QuorumPolicy {
        self.policy
    }

    /// Reads `key` from a quorum of replicas that agree on their full state.
    ///
    /// Replicas are grouped by whole snapshot, not only by the requested key,
    /// so any divergence refuses the read instead of being outvoted.
    pub async fn read_key(&self, cluster: &Cluster, key: Key) -> Result<ReadResponse> {
        let events = cluster.events();
        let mut groups: Vec<StateGroup> = Vec::new();
        let mut responded = 0usize;

        for node in cluster.nodes() {
            match node.get_state() {
                Ok(state) => {
                    StateGroup::insert(&mut groups, node.id(), state);
                    responded += 1;
                }
                Err(SimError::NodeUnavailable(id)) => {
                    debug!("Read skipped unavailable node {}", id);
                }
                Err(e) => {
                    warn!("Node {} failed to report state: {}", node.id(), e);
                    events.warning(format!("⚠️ Node {} could not report its state: {}", node.id(), e));
                }
            }
            cluster.pause().await;
        }

        let required = self.policy.quorum_size;
        if responded < required {
            events.warning(format!("❌ Read failed: {} responses, need {} for QC.", responded, required));
            return Err(SimError::QuorumNotMet { responded, required, groups });
        }

        if groups.len() > 1 {
            events.error("🚨 MAJOR CONSISTENCY FAILURE DETECTED! (Different states received)");
            for group in &groups {
                events.info(group.to_string());
            }
            return Err(SimError::ConsistencyViolation { groups });
        }

        let value = groups
            .first()
            .and_then(|g| g.snapshot.get(&key).cloned())
            .map(ReadValue::Found)
            .unwrap_or(ReadValue::NotFound);

        match &value {
            ReadValue::Found(v) => events.success(format!("✅ FINALIZED Read Result for Key {}: {}", key, v)),
            ReadValue::NotFound => events.info(format!("Key '{}' not found.", key)),
        }

        Ok(ReadResponse { key, value, groups })
    }

    /// Broadcasts `key = value` to every active node as a Byzantine-aware
    /// write. Corrupted acknowledgements still count toward the quorum.
    pub async fn write_key(&self, cluster: &mut Cluster, key: Key, value: &str) -> WriteReport {
        let total_nodes = cluster.len();
        let (nodes, events, delay) = cluster.parts_mut();
        let mut report = WriteReport {
            key,
            required: self.policy.quorum_size,
            total_nodes,
            ..Default::default()
        };

        events.info(format!("🔑 PROPOSE: Leader sends transaction (SET {} = '{}')", key, value));

        for node in nodes.iter_mut() {
            let id = node.id();
            if !node.is_active() {
                events.warning(format!("⚠️ Node {} inactive.", id));
                report.skipped.push(id);
                continue;
            }

            match node.apply_transaction(key, value, true) {
                Ok(ApplyOutcome::Committed) => {
                    events.success(format!("✅ Node {} Committed.", id));
                    report.acknowledged.push(id);
                }
                Ok(ApplyOutcome::Corrupted) => {
                    events.error(format!("😈 Node {} is BYZANTINE! Committed corrupted data.", id));
                    report.acknowledged.push(id);
                    report.corrupted.push(id);
                }
                Err(SimError::NodeUnavailable(_)) => {
                    events.error(format!("❌ Node {} crashed.", id));
                    report.skipped.push(id);
                }
                Err(e) => {
                    events.error(format!("❌ Node {} error: {}", id, e));
                    report.failed.push(id);
                }
            }
            pause_for(delay).await;
        }

        if report.quorum_met() {
            events.success(format!(
                "🎉 DECIDE SUCCESSFUL! QC Achieved ({}/{})",
                report.acknowledgements(),
                total_nodes
            ));
        } else {
            events.error(format!("🛑 DECIDE FAILED! Quorum ({}) not met.", report.required));
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quorumlab_common::{env::events::drain, EventSink, Severity};

    #[tokio::test]
    async fn test_read_agreed_initial_state_fails_on_divergence() {
        // Every node seeds key 1 with its own id, so a fresh cluster disagrees.
        let cluster = Cluster::with_nodes(4);
        let coordinator = QuorumCoordinator::default();

        let err = coordinator.read_key(&cluster, 1).await.unwrap_err();
        match err {
            SimError::ConsistencyViolation { groups } => assert_eq!(groups.len(), 4),
            other => panic!("expected consistency violation, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_write_counts_store_failures_separately() {
        use crate::cluster::node::Node;
        use crate::storage::FileStore;

        let dir = tempfile::tempdir().unwrap();
        let data_dir = dir.path().join("n1");
        let store = FileStore::open(&data_dir, NodeId(1)).unwrap();
        let mut nodes = vec![Node::with_store(NodeId(1), Box::new(store)).unwrap()];
        nodes.extend((2..=4).map(|id| Node::new(NodeId(id))));
        let mut cluster = Cluster::new(nodes, EventSink::disabled());
        std::fs::remove_dir_all(&data_dir).unwrap();

        let report = QuorumCoordinator::default().write_key(&mut cluster, 4, "v").await;
        assert_eq!(report.failed, vec![NodeId(1)]);
        assert_eq!(report.acknowledgements(), 3);
        assert!(report.quorum_met());
        assert!(cluster.node(NodeId(1)).unwrap().get(4).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_write_then_read_converges() {
        let mut cluster = Cluster::with_nodes(4);
        let coordinator = QuorumCoordinator::default();

        // Overwrite the per-node seed so replicas agree.
        assert!(coordinator.write_key(&mut cluster, 1, "seed").await.quorum_met());
        let report = coordinator.write_key(&mut cluster, 4, "HBBFT NEW VALUE").await;
        assert_eq!(report.acknowledgements(), 4);

        let read = coordinator.read_key(&cluster, 4).await.unwrap();
        assert_eq!(read.value, ReadValue::Found("HBBFT NEW VALUE".into()));
        assert_eq!(read.groups.len(), 1);
        assert_eq!(read.groups[0].nodes.len(), 4);

        let missing = coordinator.read_key(&cluster, 99).await.unwrap();
        assert_eq!(missing.value, ReadValue::NotFound);
    }

    #[tokio::test]
    async fn test_write_skips_inactive_nodes() {
        let mut cluster = Cluster::with_nodes(4);
        cluster.set_active(NodeId(1), false).unwrap();
        cluster.set_active(NodeId(2), false).unwrap();

        let report = QuorumCoordinator::default().write_key(&mut cluster, 4, "v").await;
        assert_eq!(report.skipped, vec![NodeId(1), NodeId(2)]);
        assert_eq!(report.acknowledgements(), 2);
        assert!(!report.quorum_met());
    }

    #[tokio::test]
    async fn test_write_emits_progress_events() {
        let (sink, mut rx) = EventSink::channel();
        let mut cluster = Cluster::with_nodes(4);
        cluster.set_events(sink);
        cluster.set_byzantine(NodeId(3), true).unwrap();

        QuorumCoordinator::default().write_key(&mut cluster, 4, "v").await;

        let events = drain(&mut rx);
        assert!(events[0].message.contains("PROPOSE"));
        assert!(events.iter().any(|e| e.severity == Severity::Error && e.message.contains("Node 3 is BYZANTINE")));
        assert!(events.last().unwrap().message.contains("QC Achieved (4/4)"));
    }
}
