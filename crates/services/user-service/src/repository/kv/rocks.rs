//! RocksDB engine.

use std::path::Path;

use rocksdb::{Direction, IteratorMode, Options, DB};

use super::engine::{KvEngine, KvError, KvResult};

/// Persistent engine over a single RocksDB instance.
pub struct RocksDbEngine {
    db: DB,
}

impl std::fmt::Debug for RocksDbEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RocksDbEngine")
            .field("path", &self.db.path())
            .finish()
    }
}

fn io(err: rocksdb::Error) -> KvError {
    KvError::Io(err.into_string())
}

impl RocksDbEngine {
    /// Open (creating if missing) the database at `path`.
    pub fn open(path: impl AsRef<Path>) -> KvResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| KvError::Io(e.to_string()))?;
        }

        let mut opts = Options::default();
        opts.create_if_missing(true);
        let db = DB::open(&opts, path).map_err(io)?;

        tracing::info!(path = %path.display(), "Opened RocksDB user store");
        Ok(Self { db })
    }
}

impl KvEngine for RocksDbEngine {
    fn get(&self, key: &[u8]) -> KvResult<Option<Vec<u8>>> {
        self.db.get(key).map_err(io)
    }

    fn put(&self, key: &[u8], value: &[u8]) -> KvResult<()> {
        self.db.put(key, value).map_err(io)
    }

    fn delete(&self, key: &[u8]) -> KvResult<()> {
        self.db.delete(key).map_err(io)
    }

    fn scan_prefix(&self, prefix: &[u8]) -> KvResult<Vec<(Vec<u8>, Vec<u8>)>> {
        // Read from a snapshot so concurrent writes do not tear the listing
        let snapshot = self.db.snapshot();
        let mut out = Vec::new();
        for item in snapshot.iterator(IteratorMode::From(prefix, Direction::Forward)) {
            let (key, value) = item.map_err(io)?;
            if !key.starts_with(prefix) {
                break;
            }
            out.push((key.to_vec(), value.to_vec()));
        }
        Ok(out)
    }
}
