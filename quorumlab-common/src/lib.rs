//! Shared vocabulary for the quorumlab workspace.
//!
//! Node identifiers, replica state snapshots, the error taxonomy, progress
//! events and the injectable random sources used by the protocol drivers.

pub mod env;
pub mod error;
pub mod rng;
pub mod utils;

pub use env::events::{EventSink, ProtocolEvent, Severity};
pub use env::types::{Key, NodeStatus, StateGroup, StateSnapshot};
pub use error::{Result, SimError};
pub use rng::{RandomSource, ScriptedRandom, SeededRandom};
pub use utils::NodeId;
