//! consensus.rs
//!
//! Quorum arithmetic and the single-round quorum coordinator.
//!
//! The coordinator visits every replica in cluster order, tallies who
//! responded and refuses reads when replicas disagree. It is a conceptual
//! model of quorum broadcast, not a production-grade implementation.

pub mod evaluator;
pub mod quorum;

pub use evaluator::{fault_tolerance, majority, QuorumPolicy};
pub use quorum::{QuorumCoordinator, ReadResponse, ReadValue, WriteReport};
