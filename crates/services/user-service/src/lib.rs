//! User Service Library
//!
//! User management over swappable storage backends. The gateway embeds this
//! crate and talks to it only through [`service::UserService`].

pub mod config;
pub mod infra;
pub mod repository;
pub mod service;

use std::sync::Arc;

use tracing::info;

use common::{AppError, AppResult};
use domain::{Argon2Hasher, UuidGenerator};

use crate::config::{StorageBackend, UserServiceConfig};
use crate::infra::Database;
use crate::repository::kv::MemoryEngine;
use crate::repository::{KvUserStore, SqlUserStore, UserRepository};
use crate::service::{UserManager, UserService};

/// Open the configured backend.
pub async fn build_repository(config: &UserServiceConfig) -> AppResult<Arc<dyn UserRepository>> {
    let repo: Arc<dyn UserRepository> = match config.backend {
        StorageBackend::Sql => {
            let db = Database::connect(&config.database).await?;
            Arc::new(SqlUserStore::new(db.get_connection()))
        }
        StorageBackend::Memory => Arc::new(KvUserStore::new(Arc::new(MemoryEngine::new()))),
        StorageBackend::RocksDb => open_rocksdb(config)?,
    };

    info!(backend = ?config.backend, scheme = %repo.identity_scheme(), "User store ready");
    Ok(repo)
}

#[cfg(feature = "rocksdb")]
fn open_rocksdb(config: &UserServiceConfig) -> AppResult<Arc<dyn UserRepository>> {
    use crate::repository::kv::RocksDbEngine;

    let engine = RocksDbEngine::open(&config.kv_path)?;
    Ok(Arc::new(KvUserStore::new(Arc::new(engine))))
}

#[cfg(not(feature = "rocksdb"))]
fn open_rocksdb(_config: &UserServiceConfig) -> AppResult<Arc<dyn UserRepository>> {
    Err(AppError::internal(
        "RocksDB backend requested but user-service was built without the `rocksdb` feature",
    ))
}

/// Wire the configured backend, hasher and id generator into a service.
pub async fn build_user_service(config: &UserServiceConfig) -> AppResult<Arc<dyn UserService>> {
    let repo = build_repository(config).await?;
    let cost = config.password_hash;
    let hasher = Argon2Hasher::with_params(cost.memory_kib, cost.iterations, cost.parallelism)
        .map_err(AppError::from)?;

    Ok(Arc::new(UserManager::new(
        repo,
        Arc::new(hasher),
        Arc::new(UuidGenerator),
    )))
}
