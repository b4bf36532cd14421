use quorumlab_common::{Key, Result, StateSnapshot};

use super::KvStore;

/// Volatile store; state lives as long as the process.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: StateSnapshot,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(entries: StateSnapshot) -> Self {
        Self { entries }
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: Key) -> Result<Option<String>> {
        Ok(self.entries.get(&key).cloned())
    }

    fn upsert(&mut self, key: Key, value: String) -> Result<()> {
        self.entries.insert(key, value);
        Ok(())
    }

    fn snapshot(&self) -> Result<StateSnapshot> {
        Ok(self.entries.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upsert_overwrites() {
        let mut store = MemoryStore::new();
        store.upsert(4, "a".into()).unwrap();
        store.upsert(4, "b".into()).unwrap();

        assert_eq!(store.get(4).unwrap().as_deref(), Some("b"));
        assert_eq!(store.snapshot().unwrap().len(), 1);
    }

    #[test]
    fn test_missing_key() {
        let store = MemoryStore::new();
        assert!(store.get(9).unwrap().is_none());
    }
}
