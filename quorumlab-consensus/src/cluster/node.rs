use std::fmt;

use quorumlab_common::{utils::time, Key, NodeId, NodeStatus, Result, SimError, StateSnapshot};
use tracing::debug;

use crate::storage::{KvStore, MemoryStore};

/// Result of applying a transaction on a single replica.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The requested value was stored verbatim.
    Committed,
    /// A Byzantine replica stored a tampered value instead.
    Corrupted,
}

impl fmt::Display for ApplyOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApplyOutcome::Committed => write!(f, "COMMITTED"),
            ApplyOutcome::Corrupted => write!(f, "CORRUPTED"),
        }
    }
}

/// Represents one replica of the simulated cluster.
///
/// State is reachable only while the node is active. The Byzantine flag only
/// takes effect on writes applied with `byzantine_aware = true`: corruption
/// manifests during quorum broadcast, never during a direct state-machine
/// commit.
pub struct Node {
    id: NodeId,
    active: bool,
    byzantine: bool,
    store: Box<dyn KvStore>,
}

impl Node {
    /// Builds an in-memory node with key `1` seeded.
    pub fn new(id: NodeId) -> Self {
        let seed = StateSnapshot::from([(1, Self::initial_value(id))]);
        Self {
            id,
            active: true,
            byzantine: false,
            store: Box::new(MemoryStore::from_snapshot(seed)),
        }
    }

    /// Builds a node over `store`, seeding key `1` when the store lacks it.
    pub fn with_store(id: NodeId, mut store: Box<dyn KvStore>) -> Result<Self> {
        if store.get(1)?.is_none() {
            store.upsert(1, Self::initial_value(id))?;
        }

        Ok(Self {
            id,
            active: true,
            byzantine: false,
            store,
        })
    }

    pub fn initial_value(id: NodeId) -> String {
        format!("Initial Value for Node {}", id)
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_byzantine(&self) -> bool {
        self.byzantine
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    pub fn set_byzantine(&mut self, byzantine: bool) {
        self.byzantine = byzantine;
    }

    pub fn status(&self) -> NodeStatus {
        match (self.active, self.byzantine) {
            (false, _) => NodeStatus::Crashed,
            (true, true) => NodeStatus::Byzantine,
            (true, false) => NodeStatus::Healthy,
        }
    }

    fn ensure_active(&self) -> Result<()> {
        if self.active {
            Ok(())
        } else {
            Err(SimError::NodeUnavailable(self.id))
        }
    }

    /// Snapshot of every stored pair, ordered by key.
    pub fn get_state(&self) -> Result<StateSnapshot> {
        self.ensure_active()?;
        self.store.snapshot()
    }

    pub fn get(&self, key: Key) -> Result<Option<String>> {
        self.ensure_active()?;
        self.store.get(key)
    }

    /// Upserts `key = value`, tampering with the value when both the caller
    /// opted into Byzantine-aware application and this node is Byzantine.
    pub fn apply_transaction(&mut self, key: Key, value: &str, byzantine_aware: bool) -> Result<ApplyOutcome> {
        self.ensure_active()?;

        if byzantine_aware && self.byzantine {
            let mut corrupt = format!("CORRUPTED BY NODE {} @ {}", self.id, time::timestamp());
            if corrupt == value {
                corrupt.push('!');
            }
            debug!("Node {} corrupting key {}", self.id, key);
            self.store.upsert(key, corrupt)?;
            return Ok(ApplyOutcome::Corrupted);
        }

        self.store.upsert(key, value.to_string())?;
        Ok(ApplyOutcome::Committed)
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("active", &self.active)
            .field("byzantine", &self.byzantine)
            .finish()
    }
}
