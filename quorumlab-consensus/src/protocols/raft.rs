use std::collections::BTreeMap;

use async_trait::async_trait;
use quorumlab_common::{Key, NodeId, RandomSource, Result, SeededRandom, SimError};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::{Operation, OperationOutcome, ProtocolDriver, ProtocolKind};
use crate::cluster::core::{pause_for, Cluster};
use crate::consensus::majority;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub term: u64,
    pub command: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectionOutcome {
    pub term: u64,
    pub leader: NodeId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ReplicationOutcome {
    Committed { acks: usize, majority: usize },
    Failed { acks: usize, majority: usize },
}

impl ReplicationOutcome {
    pub fn is_committed(&self) -> bool {
        matches!(self, ReplicationOutcome::Committed { .. })
    }
}

/// Raft-style leader election and log replication.
///
/// Elections pick a uniformly random active node, standing in for randomised
/// election timeouts without simulating vote splitting. The log is keyed by
/// the written key; entries are overwritten by later writes to the same key
/// but never truncated or reconciled when leadership changes, so the log
/// matching property of real Raft is not enforced.
pub struct RaftProtocol {
    term: u64,
    leader: Option<NodeId>,
    log: BTreeMap<Key, LogEntry>,
    rng: Box<dyn RandomSource>,
}

impl Default for RaftProtocol {
    fn default() -> Self {
        Self::new(Some(NodeId(1)), Box::new(SeededRandom::from_entropy()))
    }
}

impl RaftProtocol {
    /// Term 1 with `initial_leader` already in charge.
    pub fn new(initial_leader: Option<NodeId>, rng: Box<dyn RandomSource>) -> Self {
        Self {
            term: 1,
            leader: initial_leader,
            log: BTreeMap::new(),
            rng,
        }
    }

    pub fn term(&self) -> u64 {
        self.term
    }

    pub fn leader(&self) -> Option<NodeId> {
        self.leader
    }

    pub fn log(&self) -> &BTreeMap<Key, LogEntry> {
        &self.log
    }

    /// Starts a new term and elects a random active node.
    pub fn trigger_election(&mut self, cluster: &Cluster) -> Result<ElectionOutcome> {
        self.term += 1;
        let events = cluster.events();
        let candidates = cluster.active_ids();

        if candidates.is_empty() {
            self.leader = None;
            events.error(format!("Term {}: cannot elect a leader, no active nodes!", self.term));
            return Err(SimError::NoQuorumAvailable);
        }

        let leader = candidates[self.rng.pick(candidates.len())];
        self.leader = Some(leader);

        info!("👑 Term {}: node {} elected among {:?}", self.term, leader, candidates);
        events.success(format!("🚨 Term {}: Node {} elected as the new LEADER!", self.term, leader));

        Ok(ElectionOutcome { term: self.term, leader })
    }

    /// Appends `SET key = 'value'` on the leader and commits it once a
    /// majority of all nodes acknowledged.
    pub async fn replicate_log_entry(
        &mut self,
        cluster: &mut Cluster,
        key: Key,
        value: &str,
    ) -> Result<ReplicationOutcome> {
        let leader = match self.leader {
            Some(leader) => leader,
            None => {
                cluster.events().error("No leader is currently elected. Cannot commit log.");
                return Err(SimError::NoLeader);
            }
        };
        if cluster.node(leader).is_err() {
            cluster.events().error(format!("Leader {} is not a member of the cluster. Cannot commit log.", leader));
            return Err(SimError::UnknownNode(leader));
        }

        let total = cluster.len();
        let majority = majority(total);
        let (nodes, events, delay) = cluster.parts_mut();

        if !nodes.iter().any(|n| n.id() == leader && n.is_active()) {
            warn!("Leader {} is inactive but still drives replication in term {}", leader, self.term);
        }

        events.info(format!("Leader (Node {}) is appending log entry {} to its log.", leader, key));
        self.log.insert(
            key,
            LogEntry {
                term: self.term,
                command: format!("SET {} = '{}'", key, value),
            },
        );
        let mut acks = 1usize;

        for node in nodes.iter().filter(|n| n.is_active() && n.id() != leader) {
            pause_for(delay).await;
            events.success(format!("✅ Follower Node {} acknowledges log entry {}.", node.id(), key));
            acks += 1;
        }

        if acks < majority {
            events.error(format!(
                "🛑 Log replication failed. Only {} responses received (Need {}).",
                acks, majority
            ));
            return Ok(ReplicationOutcome::Failed { acks, majority });
        }

        events.success(format!(
            "🎉 Log Entry {} Committed! Replicated by {}/{} nodes (Majority: {}).",
            key, acks, total, majority
        ));

        for node in nodes.iter_mut().filter(|n| n.is_active()) {
            if let Err(e) = node.apply_transaction(key, value, false) {
                warn!("Node {} failed to apply committed entry {}: {}", node.id(), key, e);
                events.warning(format!("⚠️ Node {} could not apply entry {}: {}", node.id(), key, e));
            }
        }

        Ok(ReplicationOutcome::Committed { acks, majority })
    }
}

#[async_trait]
impl ProtocolDriver for RaftProtocol {
    fn kind(&self) -> ProtocolKind {
        ProtocolKind::Raft
    }

    async fn run(&mut self, cluster: &mut Cluster, operation: Operation) -> Result<OperationOutcome> {
        match operation {
            Operation::Elect => Ok(OperationOutcome::Election(self.trigger_election(cluster)?)),
            Operation::Replicate { key, value } => Ok(OperationOutcome::Replication(
                self.replicate_log_entry(cluster, key, &value).await?,
            )),
            other => Err(self.unsupported(&other)),
        }
    }
}
