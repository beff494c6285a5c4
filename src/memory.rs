//! In-process stores for tests.
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;

use crate::ads::query::{AdFilter, AdQuery};
use crate::ads::repo_types::Ad;
use crate::auth::repo_types::User;
use crate::store::{AdStore, StoreError, UserStore};

#[derive(Default)]
pub struct InMemoryUserStore {
    users: Mutex<HashMap<Uuid, User>>,
    hide_lookups: AtomicBool,
}

impl InMemoryUserStore {
    /// Make login lookups miss, so only the insert-time uniqueness check can catch duplicates.
    pub fn hide_lookups(&self) {
        self.hide_lookups.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn create_user(&self, user: &User) -> Result<(), StoreError> {
        let mut users = self.users.lock().unwrap();
        if users.values().any(|u| u.login == user.login) {
            return Err(StoreError::Duplicate);
        }
        users.insert(user.id, user.clone());
        Ok(())
    }

    async fn get_user_by_login(&self, login: &str) -> Result<Option<User>, StoreError> {
        if self.hide_lookups.load(Ordering::SeqCst) {
            return Ok(None);
        }
        let users = self.users.lock().unwrap();
        Ok(users.values().find(|u| u.login == login).cloned())
    }

    async fn get_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.users.lock().unwrap().get(&id).cloned())
    }
}

#[derive(Default)]
pub struct InMemoryAdStore {
    ads: Mutex<Vec<Ad>>,
}

#[async_trait]
impl AdStore for InMemoryAdStore {
    async fn create_ad(&self, ad: &Ad) -> Result<(), StoreError> {
        self.ads.lock().unwrap().push(ad.clone());
        Ok(())
    }

    async fn get_ad_by_id(&self, id: Uuid) -> Result<Option<Ad>, StoreError> {
        Ok(self.ads.lock().unwrap().iter().find(|a| a.id == id).cloned())
    }

    async fn list_ads(&self, query: &AdQuery) -> Result<Vec<Ad>, StoreError> {
        Ok(query.apply(self.ads.lock().unwrap().iter()))
    }

    async fn count_ads(&self, filter: &AdFilter) -> Result<i64, StoreError> {
        let ads = self.ads.lock().unwrap();
        Ok(ads.iter().filter(|a| filter.matches(a)).count() as i64)
    }
}

/// Every call fails as if the database were unreachable.
pub struct FailingStore;

fn unreachable_db() -> StoreError {
    StoreError::Database(sqlx::Error::PoolTimedOut)
}

#[async_trait]
impl UserStore for FailingStore {
    async fn create_user(&self, _user: &User) -> Result<(), StoreError> {
        Err(unreachable_db())
    }
    async fn get_user_by_login(&self, _login: &str) -> Result<Option<User>, StoreError> {
        Err(unreachable_db())
    }
    async fn get_user_by_id(&self, _id: Uuid) -> Result<Option<User>, StoreError> {
        Err(unreachable_db())
    }
}

#[async_trait]
impl AdStore for FailingStore {
    async fn create_ad(&self, _ad: &Ad) -> Result<(), StoreError> {
        Err(unreachable_db())
    }
    async fn get_ad_by_id(&self, _id: Uuid) -> Result<Option<Ad>, StoreError> {
        Err(unreachable_db())
    }
    async fn list_ads(&self, _query: &AdQuery) -> Result<Vec<Ad>, StoreError> {
        Err(unreachable_db())
    }
    async fn count_ads(&self, _filter: &AdFilter) -> Result<i64, StoreError> {
        Err(unreachable_db())
    }
}
