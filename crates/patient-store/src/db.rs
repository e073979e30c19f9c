use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;

use crate::error::StoreResult;
use crate::patients::PatientRepository;
use crate::sessions::SessionStore;
use crate::users::UserRepository;

#[derive(Clone)]
pub struct PatientDb {
    pool: SqlitePool,
}

impl PatientDb {
    /// Open (creating if needed) the database and apply the schema.
    pub async fn new(database_url: &str) -> StoreResult<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true);

        // Every connection to an in-memory database is a separate database,
        // so those pools are pinned to one long-lived connection.
        let in_memory = database_url.contains(":memory:");
        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };

        let pool = pool_options.connect_with(options).await?;

        let db = Self { pool };
        db.init_schema().await?;

        tracing::debug!("Patient database ready at {}", database_url);
        Ok(db)
    }

    /// Initialize database schema
    async fn init_schema(&self) -> StoreResult<()> {
        let schema = include_str!("../schema.sql");

        // sqlx executes one statement per query
        for statement in schema.split(';') {
            let stmt = statement.trim();
            if !stmt.is_empty() {
                sqlx::query(stmt).execute(&self.pool).await?;
            }
        }

        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn patients(&self) -> PatientRepository {
        PatientRepository::new(self.pool.clone())
    }

    pub fn users(&self, bcrypt_cost: u32) -> UserRepository {
        UserRepository::new(self.pool.clone(), bcrypt_cost)
    }

    pub fn sessions(&self, ttl: chrono::Duration) -> SessionStore {
        SessionStore::new(self.pool.clone(), ttl)
    }
}
