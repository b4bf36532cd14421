use std::time::Duration;

use quorumlab_common::{EventSink, NodeId, NodeStatus, Result, SimError, StateSnapshot};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::node::Node;

/// Point-in-time view of one replica, as rendered by a dashboard or audit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeView {
    pub id: NodeId,
    pub status: NodeStatus,
    /// `None` while the node is crashed.
    pub state: Option<StateSnapshot>,
}

/// The simulated cluster: every replica plus the sink progress events go to.
///
/// Protocol drivers borrow the cluster mutably for the duration of one
/// operation, so operations never overlap and each fault flag is read once,
/// at the moment its node is visited.
pub struct Cluster {
    nodes: Vec<Node>,
    events: EventSink,
    step_delay: Duration,
}

impl Cluster {
    pub fn new(nodes: Vec<Node>, events: EventSink) -> Self {
        Self {
            nodes,
            events,
            step_delay: Duration::ZERO,
        }
    }

    /// In-memory cluster of nodes `1..=n` with a tracing-only event sink.
    pub fn with_nodes(n: u32) -> Self {
        let nodes = (1..=n).map(|id| Node::new(NodeId(id))).collect();
        Self::new(nodes, EventSink::disabled())
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node(&self, id: NodeId) -> Result<&Node> {
        self.nodes
            .iter()
            .find(|n| n.id() == id)
            .ok_or(SimError::UnknownNode(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        self.nodes
            .iter_mut()
            .find(|n| n.id() == id)
            .ok_or(SimError::UnknownNode(id))
    }

    /// Crash (`false`) or recover (`true`) a node.
    pub fn set_active(&mut self, id: NodeId, active: bool) -> Result<()> {
        self.node_mut(id)?.set_active(active);
        info!("Fault injection: node {} {}", id, if active { "recovered" } else { "crashed" });
        Ok(())
    }

    pub fn set_byzantine(&mut self, id: NodeId, byzantine: bool) -> Result<()> {
        self.node_mut(id)?.set_byzantine(byzantine);
        info!("Fault injection: node {} byzantine={}", id, byzantine);
        Ok(())
    }

    pub fn active_ids(&self) -> Vec<NodeId> {
        self.nodes.iter().filter(|n| n.is_active()).map(Node::id).collect()
    }

    /// Crashed nodes plus active Byzantine ones.
    pub fn faulty_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| n.status() != NodeStatus::Healthy)
            .count()
    }

    pub fn view(&self) -> Vec<NodeView> {
        self.nodes
            .iter()
            .map(|n| NodeView {
                id: n.id(),
                status: n.status(),
                state: n.get_state().ok(),
            })
            .collect()
    }

    pub fn events(&self) -> &EventSink {
        &self.events
    }

    pub fn set_events(&mut self, events: EventSink) {
        self.events = events;
    }

    pub fn step_delay(&self) -> Duration {
        self.step_delay
    }

    /// Artificial per-node delay so a renderer can follow an operation. It
    /// has no effect on ordering or outcomes.
    pub fn set_step_delay(&mut self, delay: Duration) {
        self.step_delay = delay;
    }

    pub(crate) async fn pause(&self) {
        if !self.step_delay.is_zero() {
            tokio::time::sleep(self.step_delay).await;
        }
    }

    pub(crate) fn parts_mut(&mut self) -> (&mut [Node], &EventSink, Duration) {
        (&mut self.nodes, &self.events, self.step_delay)
    }
}

pub(crate) async fn pause_for(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}
