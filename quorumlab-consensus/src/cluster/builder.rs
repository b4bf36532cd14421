use std::path::PathBuf;
use std::time::Duration;

use quorumlab_common::{EventSink, NodeId, Result, SimError};
use tracing::info;

use super::{core::Cluster, node::Node};
use crate::storage::{FileStore, KvStore, MemoryStore};

/// Where each node keeps its key-value state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum StorageBackend {
    #[default]
    Memory,
    /// One JSON file per node under the directory.
    File(PathBuf),
}

/// Builder for a [`Cluster`] with node ids `1..=size`.
#[derive(Debug, Clone)]
pub struct ClusterBuilder {
    size: u32,
    storage: StorageBackend,
    events: EventSink,
    step_delay: Duration,
}

impl Default for ClusterBuilder {
    fn default() -> Self {
        Self {
            size: 4,
            storage: StorageBackend::Memory,
            events: EventSink::disabled(),
            step_delay: Duration::ZERO,
        }
    }
}

impl ClusterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn size(mut self, size: u32) -> Self {
        self.size = size;
        self
    }

    pub fn storage(mut self, storage: StorageBackend) -> Self {
        self.storage = storage;
        self
    }

    pub fn events(mut self, events: EventSink) -> Self {
        self.events = events;
        self
    }

    pub fn step_delay(mut self, delay: Duration) -> Self {
        self.step_delay = delay;
        self
    }

    pub fn build(self) -> Result<Cluster> {
        if self.size == 0 {
            return Err(SimError::Config("cluster needs at least one node".into()));
        }

        let mut nodes = Vec::with_capacity(self.size as usize);
        for raw in 1..=self.size {
            let id = NodeId(raw);
            let store: Box<dyn KvStore> = match &self.storage {
                StorageBackend::Memory => Box::new(MemoryStore::new()),
                StorageBackend::File(dir) => Box::new(FileStore::open(dir, id)?),
            };
            nodes.push(Node::with_store(id, store)?);
        }

        info!("Cluster built: {} nodes ({:?} storage)", self.size, self.storage);

        let mut cluster = Cluster::new(nodes, self.events);
        cluster.set_step_delay(self.step_delay);
        Ok(cluster)
    }
}
