//! storage.rs
//!
//! Persistence collaborator backing each node's key-value state.
//!
//! A node only needs three things from its store: point lookups, upserts and
//! a full ordered snapshot. Any keyed store satisfying that contract can back
//! a replica; the workspace ships an in-memory map and a JSON file per node.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use quorumlab_common::{Key, Result, StateSnapshot};

pub trait KvStore: Send + Sync {
    fn get(&self, key: Key) -> Result<Option<String>>;

    /// Inserts or overwrites the value stored under `key`.
    fn upsert(&mut self, key: Key, value: String) -> Result<()>;

    fn snapshot(&self) -> Result<StateSnapshot>;
}
