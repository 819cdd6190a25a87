use async_trait::async_trait;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use thiserror::Error;

use crate::models::{NewUser, User};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("email already registered")]
    DuplicateEmail,
    #[error("user not found")]
    NotFound,
    #[error("constraint violation: {0}")]
    Constraint(&'static str),
    #[error("store unavailable: {0}")]
    Unavailable(#[from] anyhow::Error),
}

/// Persistence port for identities. The service talks to this trait
/// only, so the in-memory store below can be swapped for a database
/// implementation without touching the flows.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Lookup by email, case-insensitive, excluding soft-deleted rows.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// Lookup by id, excluding soft-deleted rows.
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, StoreError>;

    /// Mint a new identity. Fails with [`StoreError::DuplicateEmail`]
    /// when the email already belongs to a live identity.
    async fn insert(&self, new_user: NewUser) -> Result<User, StoreError>;

    /// Replace the stored record for `user.id` wholesale.
    async fn update(&self, user: &User) -> Result<(), StoreError>;
}

/// Concurrent in-memory [`UserStore`] keyed by id with a normalized
/// email index for uniqueness and lookups.
pub struct InMemoryUserStore {
    users: DashMap<i64, User>,
    email_index: DashMap<String, i64>,
    next_id: AtomicI64,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        InMemoryUserStore {
            users: DashMap::new(),
            email_index: DashMap::new(),
            next_id: AtomicI64::new(1),
        }
    }
}

impl Default for InMemoryUserStore {
    fn default() -> Self {
        Self::new()
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let id = match self.email_index.get(&normalize_email(email)) {
            Some(entry) => *entry.value(),
            None => return Ok(None),
        };
        Ok(self
            .users
            .get(&id)
            .map(|entry| entry.value().clone())
            .filter(|u| !u.is_deleted))
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, StoreError> {
        Ok(self
            .users
            .get(&id)
            .map(|entry| entry.value().clone())
            .filter(|u| !u.is_deleted))
    }

    async fn insert(&self, new_user: NewUser) -> Result<User, StoreError> {
        if new_user.password_hash.is_none() && new_user.oauth_provider.is_none() {
            return Err(StoreError::Constraint(
                "identity without a password hash must carry an oauth provider",
            ));
        }

        let normalized = normalize_email(&new_user.email);

        // The email index entry doubles as the uniqueness lock: the
        // vacant entry is held while the user row is written.
        match self.email_index.entry(normalized) {
            Entry::Occupied(_) => Err(StoreError::DuplicateEmail),
            Entry::Vacant(slot) => {
                let id = self.next_id.fetch_add(1, Ordering::SeqCst);
                let now = Utc::now();
                let user = User {
                    id,
                    email: new_user.email.trim().to_string(),
                    password_hash: new_user.password_hash,
                    name: new_user.name,
                    role: new_user.role,
                    oauth_provider: new_user.oauth_provider,
                    email_verified: new_user.email_verified,
                    is_deleted: false,
                    created_at: now,
                    updated_at: now,
                    last_login_at: None,
                    admin_converted_at: None,
                };
                self.users.insert(id, user.clone());
                slot.insert(id);
                Ok(user)
            }
        }
    }

    async fn update(&self, user: &User) -> Result<(), StoreError> {
        match self.users.get_mut(&user.id) {
            Some(mut entry) => {
                // Soft deletion frees the email for future signups.
                if user.is_deleted && !entry.is_deleted {
                    self.email_index.remove(&normalize_email(&entry.email));
                }
                *entry = user.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserRole;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            email: email.to_string(),
            password_hash: Some("$argon2id$test".to_string()),
            name: "Test".to_string(),
            role: UserRole::General,
            oauth_provider: None,
            email_verified: false,
        }
    }

    #[tokio::test]
    async fn assigns_monotonic_ids() {
        let store = InMemoryUserStore::new();
        let a = store.insert(new_user("a@example.com")).await.unwrap();
        let b = store.insert(new_user("b@example.com")).await.unwrap();
        assert!(b.id > a.id);
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected_case_insensitively() {
        let store = InMemoryUserStore::new();
        store.insert(new_user("Alice@Example.com")).await.unwrap();

        let err = store.insert(new_user("alice@example.com")).await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateEmail));
    }

    #[tokio::test]
    async fn lookup_by_email_ignores_case_and_whitespace() {
        let store = InMemoryUserStore::new();
        let created = store.insert(new_user("carol@example.com")).await.unwrap();

        let found = store.find_by_email("  CAROL@example.COM ").await.unwrap();
        assert_eq!(found.map(|u| u.id), Some(created.id));
    }

    #[tokio::test]
    async fn soft_deleted_users_disappear_and_free_their_email() {
        let store = InMemoryUserStore::new();
        let mut user = store.insert(new_user("dave@example.com")).await.unwrap();

        user.is_deleted = true;
        store.update(&user).await.unwrap();

        assert!(store.find_by_id(user.id).await.unwrap().is_none());
        assert!(store.find_by_email("dave@example.com").await.unwrap().is_none());

        // Email is reusable once the old identity is gone.
        store.insert(new_user("dave@example.com")).await.unwrap();
    }

    #[tokio::test]
    async fn passwordless_identity_requires_a_provider() {
        let store = InMemoryUserStore::new();
        let mut user = new_user("erin@example.com");
        user.password_hash = None;

        let err = store.insert(user.clone()).await.unwrap_err();
        assert!(matches!(err, StoreError::Constraint(_)));

        user.oauth_provider = Some("google".to_string());
        store.insert(user).await.unwrap();
    }

    #[tokio::test]
    async fn update_of_missing_user_errors() {
        let store = InMemoryUserStore::new();
        let user = store.insert(new_user("frank@example.com")).await.unwrap();
        let mut ghost = user.clone();
        ghost.id = 9999;

        assert!(matches!(
            store.update(&ghost).await.unwrap_err(),
            StoreError::NotFound
        ));
    }
}
