use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::ads::query::{AdFilter, AdQuery};
use crate::ads::repo_types::Ad;
use crate::auth::repo_types::User;

/// Failure reported by a persistence backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique constraint rejected the write.
    #[error("unique constraint violated")]
    Duplicate,
    #[error("database error: {0}")]
    Database(#[source] sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::Duplicate,
            _ => StoreError::Database(e),
        }
    }
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Persist a new user. Returns `StoreError::Duplicate` when the login is taken.
    async fn create_user(&self, user: &User) -> Result<(), StoreError>;
    async fn get_user_by_login(&self, login: &str) -> Result<Option<User>, StoreError>;
    async fn get_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;
}

#[async_trait]
pub trait AdStore: Send + Sync {
    async fn create_ad(&self, ad: &Ad) -> Result<(), StoreError>;
    async fn get_ad_by_id(&self, id: Uuid) -> Result<Option<Ad>, StoreError>;
    /// One page of ads matching the query's filter, in the query's order.
    async fn list_ads(&self, query: &AdQuery) -> Result<Vec<Ad>, StoreError>;
    /// Number of ads matching the filter, ignoring sort and pagination.
    async fn count_ads(&self, filter: &AdFilter) -> Result<i64, StoreError>;
}
