//! Key-value storage engines.
//!
//! The user store only needs point reads, point writes, deletes and ordered
//! prefix scans. RocksDB provides these on disk; [`MemoryEngine`] provides
//! them in-process for tests and throwaway deployments.

mod engine;
mod memory;
#[cfg(feature = "rocksdb")]
mod rocks;

pub use engine::{KvEngine, KvEngineAsync, KvError, KvResult};
pub use memory::MemoryEngine;
#[cfg(feature = "rocksdb")]
pub use rocks::RocksDbEngine;
