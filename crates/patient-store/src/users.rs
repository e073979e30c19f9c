use sqlx::SqlitePool;
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use crate::models::User;

#[derive(sqlx::FromRow)]
struct Credentials {
    id: String,
    username: String,
    password_hash: String,
}

/// Accounts with bcrypt-hashed passwords. Kept in their own table, apart
/// from health data.
#[derive(Clone)]
pub struct UserRepository {
    pool: SqlitePool,
    bcrypt_cost: u32,
}

impl UserRepository {
    pub fn new(pool: SqlitePool, bcrypt_cost: u32) -> Self {
        Self { pool, bcrypt_cost }
    }

    /// Create an account. The plain password is hashed and dropped.
    pub async fn create(&self, username: &str, password: &str) -> StoreResult<User> {
        if username.is_empty() || password.is_empty() {
            return Err(StoreError::Validation(
                "Username and password required.".to_string(),
            ));
        }
        if self.find_by_username(username).await?.is_some() {
            return Err(StoreError::DuplicateUsername);
        }

        let password = password.to_string();
        let cost = self.bcrypt_cost;
        // bcrypt is deliberately slow; keep it off the async workers
        let password_hash =
            tokio::task::spawn_blocking(move || bcrypt::hash(password, cost)).await??;

        let user = User {
            id: Uuid::new_v4().to_string(),
            username: username.to_string(),
        };

        sqlx::query("INSERT INTO users (id, username, password_hash) VALUES (?, ?, ?)")
            .bind(&user.id)
            .bind(&user.username)
            .bind(&password_hash)
            .execute(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(db) if db.is_unique_violation() => {
                    StoreError::DuplicateUsername
                }
                other => StoreError::Database(other),
            })?;

        tracing::info!("User created: {}", user.username);
        Ok(user)
    }

    pub async fn find_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT id, username FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    /// Check a username/password pair. `None` covers both an unknown user
    /// and a wrong password.
    pub async fn verify_credentials(
        &self,
        username: &str,
        password: &str,
    ) -> StoreResult<Option<User>> {
        let credentials = sqlx::query_as::<_, Credentials>(
            "SELECT id, username, password_hash FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        let Some(credentials) = credentials else {
            return Ok(None);
        };

        let password = password.to_string();
        let hash = credentials.password_hash.clone();
        let matches =
            tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash)).await??;

        Ok(matches.then(|| User {
            id: credentials.id,
            username: credentials.username,
        }))
    }
}
