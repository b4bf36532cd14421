//! Node/quorum simulation engine.
//!
//! Replicas with crash and Byzantine fault flags, a quorum read/write
//! coordinator, and three interchangeable protocol drivers (Byzantine quorum
//! broadcast, Raft-style replication, Two-Phase Commit) that run against one
//! shared [`Cluster`].

pub mod cluster;
pub mod consensus;
pub mod protocols;
pub mod storage;

pub use cluster::builder::{ClusterBuilder, StorageBackend};
pub use cluster::core::{Cluster, NodeView};
pub use cluster::node::{ApplyOutcome, Node};
pub use consensus::{QuorumCoordinator, QuorumPolicy, ReadResponse, ReadValue, WriteReport};
pub use protocols::{
    ByzantineQuorumProtocol, ElectionOutcome, LogEntry, Operation, OperationOutcome, Protocol, ProtocolDriver,
    ProtocolKind, RaftProtocol, ReplicationOutcome, TransactionOutcome, TwoPhaseCommitProtocol,
    DEFAULT_ABORT_PROBABILITY,
};
pub use storage::{FileStore, KvStore, MemoryStore};
