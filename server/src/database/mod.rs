//! User store collaborator.
//!
//! The auth core only needs lookups by email and id plus insertion; listing
//! backs the `allUsers` query.

pub mod memory;
pub mod sqlite;

pub use memory::MemoryUserStore;
pub use sqlite::SqliteUserStore;

use async_trait::async_trait;
use thiserror::Error;

use shared::types::{NewUser, User, UserId};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("email is already registered: {0}")]
    DuplicateEmail(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("corrupt user row: {0}")]
    Corrupt(String),
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, StoreError>;

    /// Insert a new user and return it with its generated id.
    async fn insert(&self, new_user: NewUser) -> Result<User, StoreError>;

    async fn list(&self) -> Result<Vec<User>, StoreError>;
}
