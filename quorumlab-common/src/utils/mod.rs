//! utils.rs
//!
//! Common types and helper implementations shared across quorumlab.
//!
//! This module provides basic utilities such as unique node identifiers
//! and a wall-clock timestamp helper.

pub mod node_id;
pub use node_id::NodeId;

pub mod time;
