use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::info;

use shared::types::{NewUser, User, UserId};

use crate::database::{StoreError, UserStore};

#[derive(Debug, Default)]
struct Table {
    rows: Vec<User>,
    next_id: i64,
}

/// Process-local store. Ids are assigned sequentially from 1.
#[derive(Debug, Default)]
pub struct MemoryUserStore {
    table: RwLock<Table>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop a row, as if the account had been deleted elsewhere.
    pub async fn remove(&self, id: UserId) -> Option<User> {
        let mut table = self.table.write().await;
        let pos = table.rows.iter().position(|u| u.id == id)?;
        Some(table.rows.remove(pos))
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let table = self.table.read().await;
        Ok(table.rows.iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, StoreError> {
        let table = self.table.read().await;
        Ok(table.rows.iter().find(|u| u.id == id).cloned())
    }

    async fn insert(&self, new_user: NewUser) -> Result<User, StoreError> {
        let mut table = self.table.write().await;

        if table.rows.iter().any(|u| u.email == new_user.email) {
            return Err(StoreError::DuplicateEmail(new_user.email));
        }

        table.next_id += 1;
        let user = User {
            id: UserId::new(table.next_id),
            email: new_user.email,
            password_hash: new_user.password_hash,
            status: new_user.status,
        };
        table.rows.push(user.clone());
        info!("New user made! {}", user.id);

        Ok(user)
    }

    async fn list(&self) -> Result<Vec<User>, StoreError> {
        Ok(self.table.read().await.rows.clone())
    }
}
