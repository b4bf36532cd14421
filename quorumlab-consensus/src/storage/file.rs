use std::fs;
use std::path::{Path, PathBuf};

use quorumlab_common::{Key, NodeId, Result, SimError, StateSnapshot};
use tracing::debug;

use super::KvStore;

/// Durable store keeping one pretty-printed JSON document per node.
///
/// The whole map is rewritten on each upsert and reloaded on open, so a
/// replica's state survives process restarts.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: StateSnapshot,
}

impl FileStore {
    /// Opens (or creates) `node_{id}.json` under `data_dir`.
    pub fn open<P: AsRef<Path>>(data_dir: P, id: NodeId) -> Result<Self> {
        let data_dir = data_dir.as_ref();
        fs::create_dir_all(data_dir)?;
        let path = data_dir.join(format!("node_{}.json", id));

        let entries = if path.exists() {
            let data = fs::read_to_string(&path)?;
            serde_json::from_str::<StateSnapshot>(&data)
                .map_err(|e| SimError::Storage(format!("corrupt store {}: {}", path.display(), e)))?
        } else {
            StateSnapshot::new()
        };

        debug!("Opened store {} ({} keys)", path.display(), entries.len());
        Ok(Self { path, entries })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.entries)?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}

impl KvStore for FileStore {
    fn get(&self, key: Key) -> Result<Option<String>> {
        Ok(self.entries.get(&key).cloned())
    }

    fn upsert(&mut self, key: Key, value: String) -> Result<()> {
        let previous = self.entries.insert(key, value);
        if let Err(e) = self.flush() {
            // Keep memory and disk in agreement when the write fails.
            match previous {
                Some(old) => self.entries.insert(key, old),
                None => self.entries.remove(&key),
            };
            return Err(e);
        }
        Ok(())
    }

    fn snapshot(&self) -> Result<StateSnapshot> {
        Ok(self.entries.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_state_survives_reopen() {
        let dir = tempdir().expect("Failed to create temp dir");

        {
            let mut store = FileStore::open(dir.path(), NodeId(2)).unwrap();
            store.upsert(1, "first".into()).unwrap();
            store.upsert(7, "seven".into()).unwrap();
        }

        let store = FileStore::open(dir.path(), NodeId(2)).unwrap();
        assert_eq!(store.get(7).unwrap().as_deref(), Some("seven"));
        assert_eq!(store.snapshot().unwrap().len(), 2);
        assert!(store.path().ends_with("node_2.json"));
    }

    #[test]
    fn test_stores_are_per_node() {
        let dir = tempdir().unwrap();
        let mut a = FileStore::open(dir.path(), NodeId(1)).unwrap();
        a.upsert(1, "a".into()).unwrap();

        let b = FileStore::open(dir.path(), NodeId(2)).unwrap();
        assert!(b.snapshot().unwrap().is_empty());
    }

    #[test]
    fn test_failed_flush_rolls_back_memory() {
        let dir = tempdir().unwrap();
        let data_dir = dir.path().join("node-data");
        let mut store = FileStore::open(&data_dir, NodeId(4)).unwrap();
        store.upsert(1, "old".into()).unwrap();

        fs::remove_dir_all(&data_dir).unwrap();

        assert!(matches!(store.upsert(1, "new".into()), Err(SimError::Io(_))));
        assert!(matches!(store.upsert(2, "fresh".into()), Err(SimError::Io(_))));
        assert_eq!(store.get(1).unwrap().as_deref(), Some("old"));
        assert_eq!(store.get(2).unwrap(), None);
        assert_eq!(store.snapshot().unwrap().len(), 1);
    }

    #[test]
    fn test_corrupt_file_is_a_storage_error() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("node_3.json"), "not json").unwrap();

        let err = FileStore::open(dir.path(), NodeId(3)).unwrap_err();
        assert!(matches!(err, SimError::Storage(_)));
    }
}
