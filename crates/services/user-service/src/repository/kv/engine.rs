//! Engine trait and its async adapter.

use std::sync::Arc;

use async_trait::async_trait;
use common::AppError;
use thiserror::Error;

/// Result type for engine operations.
pub type KvResult<T> = Result<T, KvError>;

/// Errors raised by a key-value engine.
#[derive(Debug, Clone, Error)]
pub enum KvError {
    /// Generic I/O error from underlying storage
    #[error("I/O error: {0}")]
    Io(String),

    /// Stored bytes could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A lock guarding in-process state was poisoned
    #[error("Lock poisoned: {0}")]
    LockPoisoned(String),

    /// The blocking task running the operation panicked or was cancelled
    #[error("Background task failed: {0}")]
    Join(String),
}

impl From<KvError> for AppError {
    fn from(err: KvError) -> Self {
        AppError::storage(err.to_string())
    }
}

/// Synchronous key-value engine.
///
/// Every method is a single engine operation; a `put` either lands entirely
/// or not at all.
pub trait KvEngine: Send + Sync {
    /// Get value by key
    fn get(&self, key: &[u8]) -> KvResult<Option<Vec<u8>>>;

    /// Insert or overwrite a value
    fn put(&self, key: &[u8], value: &[u8]) -> KvResult<()>;

    /// Remove a key. Missing keys are ignored.
    fn delete(&self, key: &[u8]) -> KvResult<()>;

    /// All pairs whose key starts with `prefix`, in ascending key order.
    ///
    /// Results are collected from a consistent view of the store.
    fn scan_prefix(&self, prefix: &[u8]) -> KvResult<Vec<(Vec<u8>, Vec<u8>)>>;
}

/// Async wrappers that run engine calls on the blocking thread pool.
#[async_trait]
pub trait KvEngineAsync: Send + Sync {
    async fn get_async(&self, key: Vec<u8>) -> KvResult<Option<Vec<u8>>>;

    async fn put_async(&self, key: Vec<u8>, value: Vec<u8>) -> KvResult<()>;

    async fn delete_async(&self, key: Vec<u8>) -> KvResult<()>;

    async fn scan_prefix_async(&self, prefix: Vec<u8>) -> KvResult<Vec<(Vec<u8>, Vec<u8>)>>;
}

fn join_error(err: tokio::task::JoinError) -> KvError {
    KvError::Join(format!("spawn_blocking join error: {}", err))
}

#[async_trait]
impl KvEngineAsync for Arc<dyn KvEngine> {
    async fn get_async(&self, key: Vec<u8>) -> KvResult<Option<Vec<u8>>> {
        let engine = Arc::clone(self);
        tokio::task::spawn_blocking(move || engine.get(&key))
            .await
            .map_err(join_error)?
    }

    async fn put_async(&self, key: Vec<u8>, value: Vec<u8>) -> KvResult<()> {
        let engine = Arc::clone(self);
        tokio::task::spawn_blocking(move || engine.put(&key, &value))
            .await
            .map_err(join_error)?
    }

    async fn delete_async(&self, key: Vec<u8>) -> KvResult<()> {
        let engine = Arc::clone(self);
        tokio::task::spawn_blocking(move || engine.delete(&key))
            .await
            .map_err(join_error)?
    }

    async fn scan_prefix_async(&self, prefix: Vec<u8>) -> KvResult<Vec<(Vec<u8>, Vec<u8>)>> {
        let engine = Arc::clone(self);
        tokio::task::spawn_blocking(move || engine.scan_prefix(&prefix))
            .await
            .map_err(join_error)?
    }
}
