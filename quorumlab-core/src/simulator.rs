use quorumlab_common::{EventSink, NodeId, Result};
use quorumlab_consensus::{
    ByzantineQuorumProtocol, Cluster, Operation, OperationOutcome, ProtocolDriver, ProtocolKind, RaftProtocol,
    TwoPhaseCommitProtocol,
};
use tracing::{info, warn};

use crate::config::SimConfig;
use crate::scenario::{Scenario, ScenarioReport, Step, StepReport};

/// One cluster plus one instance of every protocol driver.
///
/// Drivers keep their own state (Raft term, leader and log) across
/// operations, so a session behaves like the long-lived dashboard it
/// models rather than restarting each protocol per call.
pub struct Simulator {
    cluster: Cluster,
    bft: ByzantineQuorumProtocol,
    raft: RaftProtocol,
    two_phase: TwoPhaseCommitProtocol,
}

impl Simulator {
    pub fn new(
        cluster: Cluster,
        bft: ByzantineQuorumProtocol,
        raft: RaftProtocol,
        two_phase: TwoPhaseCommitProtocol,
    ) -> Self {
        Self { cluster, bft, raft, two_phase }
    }

    pub fn from_config(config: &SimConfig, events: EventSink) -> Result<Self> {
        let cluster = config.build_cluster(events)?;
        Ok(Self::new(cluster, config.bft(), config.raft(), config.two_phase()))
    }

    pub fn cluster(&self) -> &Cluster {
        &self.cluster
    }

    pub fn cluster_mut(&mut self) -> &mut Cluster {
        &mut self.cluster
    }

    pub fn raft(&self) -> &RaftProtocol {
        &self.raft
    }

    /// Marks `crashed` inactive and `byzantine` malicious before any operation runs.
    pub fn inject_faults(&mut self, crashed: &[u32], byzantine: &[u32]) -> Result<()> {
        for &id in crashed {
            self.cluster.set_active(NodeId(id), false)?;
        }
        for &id in byzantine {
            self.cluster.set_byzantine(NodeId(id), true)?;
        }
        Ok(())
    }

    pub async fn run(&mut self, kind: ProtocolKind, operation: Operation) -> Result<OperationOutcome> {
        info!("▶️ {} {}", kind, operation.name());
        if kind == ProtocolKind::Bft && !self.bft.within_tolerance(&self.cluster) {
            warn!(
                "⚠️ {} faulty nodes exceed what quorum {} tolerates",
                self.cluster.faulty_count(),
                self.bft.policy().quorum_size
            );
        }

        let driver: &mut dyn ProtocolDriver = match kind {
            ProtocolKind::Bft => &mut self.bft,
            ProtocolKind::Raft => &mut self.raft,
            ProtocolKind::TwoPhase => &mut self.two_phase,
        };
        driver.run(&mut self.cluster, operation).await
    }

    pub async fn apply_step(&mut self, step: &Step) -> Result<Option<OperationOutcome>> {
        match step {
            Step::Crash { node } => self.cluster.set_active(NodeId(*node), false).map(|_| None),
            Step::Recover { node } => self.cluster.set_active(NodeId(*node), true).map(|_| None),
            Step::Byzantine { node } => self.cluster.set_byzantine(NodeId(*node), true).map(|_| None),
            Step::Honest { node } => self.cluster.set_byzantine(NodeId(*node), false).map(|_| None),
            Step::Run { protocol, operation } => self.run(*protocol, operation.clone()).await.map(Some),
        }
    }

    /// Runs every step in order. A failing step is recorded and the run continues.
    pub async fn run_scenario(&mut self, scenario: &Scenario) -> ScenarioReport {
        let mut report = ScenarioReport::start(&scenario.name);

        for (index, step) in scenario.steps.iter().enumerate() {
            let result = self.apply_step(step).await;
            if let Err(e) = &result {
                warn!("Scenario '{}' step {} ({}) failed: {}", scenario.name, index, step, e);
            }
            report.steps.push(StepReport::new(index, step.clone(), result));
        }

        info!(
            "Scenario '{}' finished: {}/{} steps succeeded",
            scenario.name,
            report.succeeded(),
            report.steps.len()
        );
        report
    }
}
