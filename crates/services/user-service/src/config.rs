//! User service configuration.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use clap::ValueEnum;
use common::{env_or, DatabaseConfig, PasswordHashConfig};

/// Which storage backend holds user records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum StorageBackend {
    /// Relational database via SeaORM (SQLite or PostgreSQL)
    #[default]
    Sql,
    /// Embedded RocksDB key-value store
    #[value(name = "rocksdb")]
    RocksDb,
    /// In-process key-value store, lost on exit
    Memory,
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sql" | "sqlite" | "postgres" => Ok(Self::Sql),
            "rocksdb" | "kv" => Ok(Self::RocksDb),
            "memory" => Ok(Self::Memory),
            other => Err(format!("unknown storage backend '{}'", other)),
        }
    }
}

/// User service configuration.
#[derive(Debug, Clone)]
pub struct UserServiceConfig {
    /// Selected storage backend
    pub backend: StorageBackend,
    /// Connection settings for the SQL backend
    pub database: DatabaseConfig,
    /// Data directory for the RocksDB backend
    pub kv_path: PathBuf,
    /// Argon2 cost settings
    pub password_hash: PasswordHashConfig,
}

impl UserServiceConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            backend: env_or("USER_STORE_BACKEND", defaults.backend),
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").unwrap_or(defaults.database.url),
                max_connections: env_or(
                    "DATABASE_MAX_CONNECTIONS",
                    defaults.database.max_connections,
                ),
                min_connections: defaults.database.min_connections,
            },
            kv_path: env::var("KV_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.kv_path),
            password_hash: PasswordHashConfig::from_env(),
        }
    }
}

impl Default for UserServiceConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            database: DatabaseConfig::default(),
            kv_path: PathBuf::from("./data/users"),
            password_hash: PasswordHashConfig::default(),
        }
    }
}
