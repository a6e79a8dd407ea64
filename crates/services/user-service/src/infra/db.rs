//! Database connection and initialization.

use sea_orm::{
    ConnectOptions, ConnectionTrait, Database as SeaDatabase, DatabaseConnection, DbErr, Schema,
};

use common::DatabaseConfig;

use crate::repository::entities::{user, user_list};

/// Database wrapper for connection management
#[derive(Clone)]
pub struct Database {
    connection: DatabaseConnection,
}

impl Database {
    /// Initialize database connection and create the schema if missing.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, DbErr> {
        // SQLite serializes writers; one pooled connection keeps transactions from
        // failing with SQLITE_BUSY under concurrent requests
        let max_connections = if config.is_sqlite() {
            1
        } else {
            config.max_connections.max(1)
        };

        let mut options = ConnectOptions::new(config.url.clone());
        options
            .max_connections(max_connections)
            .min_connections(config.min_connections.min(max_connections))
            .sqlx_logging(false);

        let connection = SeaDatabase::connect(options).await?;
        let db = Self { connection };
        db.ensure_schema().await?;
        tracing::info!(max_connections, "Database connected and schema ensured");

        Ok(db)
    }

    /// Get a clone of the database connection.
    pub fn get_connection(&self) -> DatabaseConnection {
        self.connection.clone()
    }

    /// Create the `users` and `user_lists` tables if they do not exist.
    pub async fn ensure_schema(&self) -> Result<(), DbErr> {
        let backend = self.connection.get_database_backend();
        let schema = Schema::new(backend);

        let mut users = schema.create_table_from_entity(user::Entity);
        users.if_not_exists();
        self.connection.execute(backend.build(&users)).await?;

        let mut lists = schema.create_table_from_entity(user_list::Entity);
        lists.if_not_exists();
        self.connection.execute(backend.build(&lists)).await?;

        Ok(())
    }
}
