use std::str::FromStr;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use tracing::info;

use shared::types::{NewUser, User, UserId, UserStatus};

use crate::database::{StoreError, UserStore};

/// SQLite-backed store over a `sqlx` pool.
#[derive(Debug, Clone)]
pub struct SqliteUserStore {
    pool: SqlitePool,
}

impl SqliteUserStore {
    /// Open (creating if needed) the database at `url` and ensure the schema.
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);

        // Every connection to `:memory:` is its own database, so pin the pool
        // to one connection that never gets recycled.
        let pool = if url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        } else {
            SqlitePoolOptions::new()
                .max_connections(8)
                .connect_with(options)
                .await?
        };

        let store = Self { pool };
        store.create_tables().await?;
        Ok(store)
    }

    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create_tables(&self) -> Result<(), StoreError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS users (
                id            INTEGER PRIMARY KEY AUTOINCREMENT,
                email         TEXT    NOT NULL UNIQUE,
                password_hash TEXT    NOT NULL,
                status        TEXT    NOT NULL DEFAULT 'user'
            )",
        )
        .execute(&self.pool)
        .await?;

        info!("Users table ready");
        Ok(())
    }
}

fn user_from_row(row: &SqliteRow) -> Result<User, StoreError> {
    let status: String = row.try_get("status")?;

    Ok(User {
        id: UserId::new(row.try_get("id")?),
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
        status: UserStatus::from_str(&status).map_err(|e| StoreError::Corrupt(e.to_string()))?,
    })
}

#[async_trait]
impl UserStore for SqliteUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        sqlx::query("SELECT id, email, password_hash, status FROM users WHERE email = ?1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?
            .as_ref()
            .map(user_from_row)
            .transpose()
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, StoreError> {
        sqlx::query("SELECT id, email, password_hash, status FROM users WHERE id = ?1")
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await?
            .as_ref()
            .map(user_from_row)
            .transpose()
    }

    async fn insert(&self, new_user: NewUser) -> Result<User, StoreError> {
        let result = sqlx::query(
            "INSERT INTO users (email, password_hash, status) VALUES (?1, ?2, ?3)",
        )
        .bind(&new_user.email)
        .bind(&new_user.password_hash)
        .bind(new_user.status.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                StoreError::DuplicateEmail(new_user.email.clone())
            }
            other => StoreError::Database(other),
        })?;

        let user = User {
            id: UserId::new(result.last_insert_rowid()),
            email: new_user.email,
            password_hash: new_user.password_hash,
            status: new_user.status,
        };
        info!("New user made! {}", user.id);

        Ok(user)
    }

    async fn list(&self) -> Result<Vec<User>, StoreError> {
        sqlx::query("SELECT id, email, password_hash, status FROM users ORDER BY id")
            .fetch_all(&self.pool)
            .await?
            .iter()
            .map(user_from_row)
            .collect()
    }
}
