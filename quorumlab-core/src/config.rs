use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use quorumlab_common::{EventSink, NodeId, Result, SeededRandom, SimError};
use quorumlab_consensus::{
    ByzantineQuorumProtocol, Cluster, ClusterBuilder, QuorumPolicy, RaftProtocol, StorageBackend,
    TwoPhaseCommitProtocol, DEFAULT_ABORT_PROBABILITY,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StorageConfig {
    #[default]
    Memory,
    File { data_dir: PathBuf },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub nodes: u32,
    /// Explicit quorum size; derived as `2f + 1` from `nodes` when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quorum_size: Option<usize>,
    pub election_seed: Option<u64>,
    pub vote_seed: Option<u64>,
    pub abort_probability: f64,
    pub initial_leader: Option<u32>,
    pub step_delay_ms: u64,
    pub storage: StorageConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            nodes: 4,
            quorum_size: None,
            election_seed: None,
            vote_seed: None,
            abort_probability: DEFAULT_ABORT_PROBABILITY,
            initial_leader: Some(1),
            step_delay_ms: 0,
            storage: StorageConfig::Memory,
        }
    }
}

/// Command-line values that win over the file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub nodes: Option<u32>,
    pub seed: Option<u64>,
    pub data_dir: Option<PathBuf>,
}

impl SimConfig {
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = fs::read_to_string(path)?;
        let parsed = serde_json::from_str::<SimConfig>(&data)?;
        Ok(parsed)
    }

    pub fn apply(&mut self, overrides: &Overrides) {
        if let Some(nodes) = overrides.nodes {
            self.nodes = nodes;
        }
        if let Some(seed) = overrides.seed {
            self.election_seed = Some(seed);
            self.vote_seed = Some(seed);
        }
        if let Some(dir) = &overrides.data_dir {
            self.storage = StorageConfig::File { data_dir: dir.clone() };
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.nodes == 0 {
            return Err(SimError::Config("nodes must be at least 1".into()));
        }
        let quorum = self.quorum_policy().quorum_size;
        if quorum == 0 || quorum > self.nodes as usize {
            return Err(SimError::Config(format!(
                "quorum_size {} must be between 1 and the node count {}",
                quorum, self.nodes
            )));
        }
        if !(0.0..=1.0).contains(&self.abort_probability) {
            return Err(SimError::Config(format!(
                "abort_probability {} is outside [0, 1]",
                self.abort_probability
            )));
        }
        if let Some(leader) = self.initial_leader {
            if leader == 0 || leader > self.nodes {
                return Err(SimError::Config(format!(
                    "initial_leader {} is not one of nodes 1..={}",
                    leader, self.nodes
                )));
            }
        }
        Ok(())
    }

    pub fn quorum_policy(&self) -> QuorumPolicy {
        match self.quorum_size {
            Some(size) => QuorumPolicy::new(size),
            None => QuorumPolicy::bft(self.nodes as usize),
        }
    }

    pub fn step_delay(&self) -> Duration {
        Duration::from_millis(self.step_delay_ms)
    }

    pub fn storage_backend(&self) -> StorageBackend {
        match &self.storage {
            StorageConfig::Memory => StorageBackend::Memory,
            StorageConfig::File { data_dir } => StorageBackend::File(data_dir.clone()),
        }
    }

    pub fn build_cluster(&self, events: EventSink) -> Result<Cluster> {
        self.validate()?;
        ClusterBuilder::new()
            .size(self.nodes)
            .storage(self.storage_backend())
            .events(events)
            .step_delay(self.step_delay())
            .build()
    }

    pub fn bft(&self) -> ByzantineQuorumProtocol {
        ByzantineQuorumProtocol::new(self.quorum_policy())
    }

    pub fn raft(&self) -> RaftProtocol {
        RaftProtocol::new(
            self.initial_leader.map(NodeId),
            Box::new(SeededRandom::from_option(self.election_seed)),
        )
    }

    pub fn two_phase(&self) -> TwoPhaseCommitProtocol {
        TwoPhaseCommitProtocol::new(
            self.abort_probability,
            Box::new(SeededRandom::from_option(self.vote_seed)),
        )
    }
}
