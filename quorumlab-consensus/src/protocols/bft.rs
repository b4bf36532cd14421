use async_trait::async_trait;
use quorumlab_common::{Key, Result};
use tracing::info;

use super::{Operation, OperationOutcome, ProtocolDriver, ProtocolKind};
use crate::cluster::core::Cluster;
use crate::consensus::{fault_tolerance, QuorumCoordinator, QuorumPolicy, ReadResponse, WriteReport};

/// Byzantine quorum broadcast over the shared node set.
///
/// Commits and reads need 2f+1 replicas. While at most f nodes are crashed or
/// Byzantine, writes reach quorum; a read that sees divergent replicas fails
/// with a consistency violation instead of trusting the larger group.
#[derive(Debug, Clone, Default)]
pub struct ByzantineQuorumProtocol {
    coordinator: QuorumCoordinator,
}

impl ByzantineQuorumProtocol {
    pub fn new(policy: QuorumPolicy) -> Self {
        Self { coordinator: QuorumCoordinator::new(policy) }
    }

    /// Quorum derived from the cluster size (2f+1).
    pub fn for_cluster(cluster: &Cluster) -> Self {
        Self::new(QuorumPolicy::bft(cluster.len()))
    }

    pub fn policy(&self) -> QuorumPolicy {
        self.coordinator.policy()
    }

    /// Faults the quorum tolerates: f such that quorum = 2f+1.
    pub fn fault_tolerance(&self) -> usize {
        self.policy().quorum_size.saturating_sub(1) / 2
    }

    /// Whether crashed plus Byzantine nodes stay within what both the quorum
    /// and the cluster size can absorb.
    pub fn within_tolerance(&self, cluster: &Cluster) -> bool {
        let f = self.fault_tolerance().min(fault_tolerance(cluster.len()));
        cluster.faulty_count() <= f
    }

    pub async fn write(&self, cluster: &mut Cluster, key: Key, value: &str) -> WriteReport {
        info!(
            "BFT write key={} (quorum {}, tolerating f={})",
            key,
            self.policy().quorum_size,
            self.fault_tolerance()
        );
        self.coordinator.write_key(cluster, key, value).await
    }

    pub async fn read(&self, cluster: &Cluster, key: Key) -> Result<ReadResponse> {
        self.coordinator.read_key(cluster, key).await
    }
}

#[async_trait]
impl ProtocolDriver for ByzantineQuorumProtocol {
    fn kind(&self) -> ProtocolKind {
        ProtocolKind::Bft
    }

    async fn run(&mut self, cluster: &mut Cluster, operation: Operation) -> Result<OperationOutcome> {
        match operation {
            Operation::Write { key, value } => Ok(OperationOutcome::Write(self.write(cluster, key, &value).await)),
            Operation::Read { key } => Ok(OperationOutcome::Read(self.read(cluster, key).await?)),
            other => Err(self.unsupported(&other)),
        }
    }
}
