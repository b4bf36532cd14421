use async_trait::async_trait;
use quorumlab_common::{Key, NodeId, RandomSource, Result, SeededRandom, SimError};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::{Operation, OperationOutcome, ProtocolDriver, ProtocolKind};
use crate::cluster::core::{pause_for, Cluster};

pub const DEFAULT_ABORT_PROBABILITY: f64 = 0.15;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TransactionOutcome {
    /// Every polled node voted YES and all active nodes applied the value.
    GlobalCommit { participants: Vec<NodeId> },
    /// `aborted_by` voted NO; nodes after it were never polled.
    GlobalAbort { aborted_by: NodeId, polled: Vec<NodeId> },
}

impl TransactionOutcome {
    pub fn is_commit(&self) -> bool {
        matches!(self, TransactionOutcome::GlobalCommit { .. })
    }
}

/// Two-Phase Commit coordinator.
///
/// Phase 1 polls active nodes in order; each independently votes NO with
/// `abort_probability` (a simulated network or local failure), which stops
/// polling at once. Phase 2 commits on every active node only if all polled
/// nodes voted YES. An abort leaves every replica untouched.
pub struct TwoPhaseCommitProtocol {
    abort_probability: f64,
    rng: Box<dyn RandomSource>,
}

impl Default for TwoPhaseCommitProtocol {
    fn default() -> Self {
        Self::new(DEFAULT_ABORT_PROBABILITY, Box::new(SeededRandom::from_entropy()))
    }
}

impl TwoPhaseCommitProtocol {
    pub fn new(abort_probability: f64, rng: Box<dyn RandomSource>) -> Self {
        Self {
            abort_probability: abort_probability.clamp(0.0, 1.0),
            rng,
        }
    }

    pub fn abort_probability(&self) -> f64 {
        self.abort_probability
    }

    pub async fn run_transaction(
        &mut self,
        cluster: &mut Cluster,
        key: Key,
        value: &str,
    ) -> Result<TransactionOutcome> {
        let (nodes, events, delay) = cluster.parts_mut();
        let active: Vec<usize> = nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.is_active())
            .map(|(i, _)| i)
            .collect();

        if active.is_empty() {
            events.error("No active nodes for 2PC.");
            return Err(SimError::NoQuorumAvailable);
        }

        events.info("Phase 1: VOTE Request (PREPARE)");
        let mut polled = Vec::with_capacity(active.len());
        let mut aborted_by = None;

        for &i in &active {
            pause_for(delay).await;
            let id = nodes[i].id();
            polled.push(id);

            if self.rng.next_f64() < self.abort_probability {
                events.error(format!("❌ Coordinator: Node {} ABORTED (Simulated network/local failure).", id));
                aborted_by = Some(id);
                break;
            }
            events.success(format!("✅ Node {}: Voted YES (Prepared to commit).", id));
        }

        events.info("Phase 2: Global Decision (COMMIT/ABORT)");

        if let Some(aborted_by) = aborted_by {
            events.error("🛑 GLOBAL ABORT: At least one node voted NO or failed. Sending ABORT message.");
            for &i in &active {
                events.warning(format!("⚠️ Node {}: ABORTED and rolled back.", nodes[i].id()));
            }
            info!("2PC key={} aborted by node {}", key, aborted_by);
            return Ok(TransactionOutcome::GlobalAbort { aborted_by, polled });
        }

        events.success("🎉 GLOBAL COMMIT: All nodes voted YES. Sending COMMIT message.");
        let mut participants = Vec::with_capacity(active.len());
        for &i in &active {
            let node = &mut nodes[i];
            match node.apply_transaction(key, value, false) {
                Ok(_) => {
                    events.info(format!("✅ Node {}: COMMIT successful (State updated).", node.id()));
                    participants.push(node.id());
                }
                Err(e) => {
                    warn!("Node {} failed to commit key {}: {}", node.id(), key, e);
                    events.warning(format!("⚠️ Node {}: COMMIT failed: {}", node.id(), e));
                }
            }
        }

        info!("2PC key={} committed on {:?}", key, participants);
        Ok(TransactionOutcome::GlobalCommit { participants })
    }
}

#[async_trait]
impl ProtocolDriver for TwoPhaseCommitProtocol {
    fn kind(&self) -> ProtocolKind {
        ProtocolKind::TwoPhase
    }

    async fn run(&mut self, cluster: &mut Cluster, operation: Operation) -> Result<OperationOutcome> {
        match operation {
            Operation::Transaction { key, value } => Ok(OperationOutcome::Transaction(
                self.run_transaction(cluster, key, &value).await?,
            )),
            other => Err(self.unsupported(&other)),
        }
    }
}
