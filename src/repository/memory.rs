//! In-memory user registry.
//!
//! Thread-safe registry with the same observable behavior as the PostgreSQL
//! repository (id assignment, "empty field means no change" updates, affected
//! row counts). Used by the integration tests and handy for local runs
//! without a database.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::UserRepository;
use crate::error::{Error, Result};
use crate::user::User;

/// User repository backed by a locked hash map.
pub struct MemoryUserRepository {
    users: Arc<RwLock<HashMap<i64, User>>>,
    next_id: Arc<AtomicI64>,
}

impl MemoryUserRepository {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            users: Arc::new(RwLock::new(HashMap::new())),
            next_id: Arc::new(AtomicI64::new(1)),
        }
    }
}

impl Default for MemoryUserRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for MemoryUserRepository {
    fn clone(&self) -> Self {
        Self {
            users: Arc::clone(&self.users),
            next_id: Arc::clone(&self.next_id),
        }
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn insert(&self, mut user: User) -> Result<User> {
        let mut users = self.users.write().await;

        if users
            .values()
            .any(|existing| existing.name == user.name || existing.email == user.email)
        {
            return Err(Error::Validation("name or email already taken".to_string()));
        }

        user.id = self.next_id.fetch_add(1, Ordering::Relaxed);
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn get_by_id(&self, id: i64) -> Result<User> {
        let users = self.users.read().await;
        users.get(&id).cloned().ok_or(Error::NotFound)
    }

    async fn get_by_name(&self, name: &str) -> Result<User> {
        let users = self.users.read().await;
        users
            .values()
            .find(|user| user.name == name)
            .cloned()
            .ok_or(Error::NotFound)
    }

    async fn get_by_email(&self, email: &str) -> Result<User> {
        let users = self.users.read().await;
        users
            .values()
            .find(|user| user.email == email)
            .cloned()
            .ok_or(Error::NotFound)
    }

    async fn list(&self) -> Result<Vec<User>> {
        let users = self.users.read().await;
        let mut all: Vec<User> = users.values().cloned().collect();
        all.sort_by_key(|user| user.id);
        Ok(all)
    }

    async fn update(&self, user: User) -> Result<i64> {
        let mut users = self.users.write().await;

        let Some(stored) = users.get_mut(&user.id) else {
            return Ok(0);
        };

        if !user.name.is_empty() {
            stored.name = user.name;
        }
        if !user.email.is_empty() {
            stored.email = user.email;
        }
        if !user.password.is_empty() {
            stored.password = user.password;
        }

        Ok(1)
    }

    async fn remove(&self, id: i64) -> Result<i64> {
        let mut users = self.users.write().await;
        Ok(i64::from(users.remove(&id).is_some()))
    }
}
