//! Protocol drivers over the shared node set.
//!
//! Each driver implements [`ProtocolDriver`]; [`Protocol`] is the closed set
//! a caller picks from. Drivers are interchangeable and never composed: one
//! operation runs one driver against the whole cluster.

pub mod bft;
pub mod raft;
pub mod two_phase;

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use quorumlab_common::{Key, Result, SimError};
use serde::{Deserialize, Serialize};

use crate::cluster::core::Cluster;
use crate::consensus::{ReadResponse, WriteReport};

pub use bft::ByzantineQuorumProtocol;
pub use raft::{ElectionOutcome, LogEntry, RaftProtocol, ReplicationOutcome};
pub use two_phase::{TransactionOutcome, TwoPhaseCommitProtocol, DEFAULT_ABORT_PROBABILITY};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProtocolKind {
    Bft,
    Raft,
    TwoPhase,
}

impl fmt::Display for ProtocolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ProtocolKind::Bft => "bft",
            ProtocolKind::Raft => "raft",
            ProtocolKind::TwoPhase => "two-phase",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for ProtocolKind {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "bft" => Ok(ProtocolKind::Bft),
            "raft" => Ok(ProtocolKind::Raft),
            "two-phase" | "two_phase" | "2pc" => Ok(ProtocolKind::TwoPhase),
            other => Err(SimError::Config(format!("unknown protocol '{}'", other))),
        }
    }
}

/// Parameters of one protocol operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    /// BFT quorum read.
    Read { key: Key },
    /// BFT quorum write.
    Write { key: Key, value: String },
    /// Raft election.
    Elect,
    /// Raft log replication.
    Replicate { key: Key, value: String },
    /// Two-phase commit transaction.
    Transaction { key: Key, value: String },
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Read { .. } => "read",
            Operation::Write { .. } => "write",
            Operation::Elect => "elect",
            Operation::Replicate { .. } => "replicate",
            Operation::Transaction { .. } => "transaction",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum OperationOutcome {
    Read(ReadResponse),
    Write(WriteReport),
    Election(ElectionOutcome),
    Replication(ReplicationOutcome),
    Transaction(TransactionOutcome),
}

#[async_trait]
pub trait ProtocolDriver: Send {
    fn kind(&self) -> ProtocolKind;

    /// Runs one operation to completion against `cluster`.
    async fn run(&mut self, cluster: &mut Cluster, operation: Operation) -> Result<OperationOutcome>;

    fn unsupported(&self, operation: &Operation) -> SimError {
        SimError::UnsupportedOperation {
            protocol: self.kind().to_string(),
            operation: operation.name().to_string(),
        }
    }
}

/// The driver a caller selected for the shared cluster.
pub enum Protocol {
    Bft(ByzantineQuorumProtocol),
    Raft(RaftProtocol),
    TwoPhase(TwoPhaseCommitProtocol),
}

impl Protocol {
    fn driver(&mut self) -> &mut dyn ProtocolDriver {
        match self {
            Protocol::Bft(p) => p,
            Protocol::Raft(p) => p,
            Protocol::TwoPhase(p) => p,
        }
    }

    pub fn kind(&self) -> ProtocolKind {
        match self {
            Protocol::Bft(p) => p.kind(),
            Protocol::Raft(p) => p.kind(),
            Protocol::TwoPhase(p) => p.kind(),
        }
    }

    pub async fn run(&mut self, cluster: &mut Cluster, operation: Operation) -> Result<OperationOutcome> {
        self.driver().run(cluster, operation).await
    }
}

impl From<ByzantineQuorumProtocol> for Protocol {
    fn from(p: ByzantineQuorumProtocol) -> Self {
        Protocol::Bft(p)
    }
}

impl From<RaftProtocol> for Protocol {
    fn from(p: RaftProtocol) -> Self {
        Protocol::Raft(p)
    }
}

impl From<TwoPhaseCommitProtocol> for Protocol {
    fn from(p: TwoPhaseCommitProtocol) -> Self {
        Protocol::TwoPhase(p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quorumlab_common::ScriptedRandom;

    #[test]
    fn test_protocol_kind_parsing() {
        assert_eq!("BFT".parse::<ProtocolKind>().unwrap(), ProtocolKind::Bft);
        assert_eq!("2pc".parse::<ProtocolKind>().unwrap(), ProtocolKind::TwoPhase);
        assert!("paxos".parse::<ProtocolKind>().is_err());
        assert_eq!(ProtocolKind::TwoPhase.to_string(), "two-phase");
    }

    #[test]
    fn test_operation_json_shape() {
        let op: Operation = serde_json::from_str(r#"{"op":"write","key":4,"value":"v"}"#).unwrap();
        assert_eq!(op, Operation::Write { key: 4, value: "v".into() });
        let elect: Operation = serde_json::from_str(r#"{"op":"elect"}"#).unwrap();
        assert_eq!(elect.name(), "elect");
    }

    #[tokio::test]
    async fn test_dispatch_through_enum() {
        let mut cluster = Cluster::with_nodes(4);
        let mut protocol: Protocol =
            TwoPhaseCommitProtocol::new(0.0, Box::new(ScriptedRandom::constant(0.5))).into();
        assert_eq!(protocol.kind(), ProtocolKind::TwoPhase);

        let outcome = protocol
            .run(&mut cluster, Operation::Transaction { key: 20, value: "v".into() })
            .await
            .unwrap();
        assert!(matches!(outcome, OperationOutcome::Transaction(TransactionOutcome::GlobalCommit { .. })));

        let err = protocol.run(&mut cluster, Operation::Read { key: 1 }).await.unwrap_err();
        assert!(matches!(err, SimError::UnsupportedOperation { .. }));
    }
}
