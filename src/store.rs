//! In-memory user registry.
//!
//! Records live in an insertion-ordered map behind a read/write lock. The store only grows:
//! there is no update or delete path, and nothing survives a process restart.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use thiserror::Error;

/// A registered user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Caller-assigned identifier, unique within the store.
    pub id: i64,
    /// Display name. Stored as given.
    pub username: String,
    /// Contact address. Treated as an opaque string.
    pub email: String,
    /// Whether the account is active. Defaults to `true` when omitted.
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

/// Failures surfaced by [`UserStore`] operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// No user is registered under the requested id.
    #[error("User not found")]
    NotFound(i64),
    /// A user is already registered under the id being created.
    #[error("User already exists")]
    AlreadyExists(i64),
}

/// Abstraction over the user registry used by the HTTP surface.
pub trait UserStore: Send + Sync {
    /// Fetch the user registered under `id`.
    fn get(&self, id: i64) -> Result<User, StoreError>;

    /// Register a new user. Fails if the id is taken; the existing record is left untouched.
    fn create(&self, user: User) -> Result<(), StoreError>;

    /// List users in insertion order, optionally keeping only those whose `active` flag matches.
    fn list(&self, active: Option<bool>) -> Vec<User>;

    /// Number of registered users.
    fn len(&self) -> usize;

    /// Whether the store holds no users.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// [`UserStore`] backed by a lock-guarded [`IndexMap`].
#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    users: RwLock<IndexMap<i64, User>>,
}

impl InMemoryUserStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    // A panic while holding the lock cannot leave the map half-written: every mutation is a
    // single `insert`, so the poisoned guard is still consistent.
    fn read(&self) -> RwLockReadGuard<'_, IndexMap<i64, User>> {
        self.users.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, IndexMap<i64, User>> {
        self.users.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl UserStore for InMemoryUserStore {
    fn get(&self, id: i64) -> Result<User, StoreError> {
        self.read().get(&id).cloned().ok_or(StoreError::NotFound(id))
    }

    fn create(&self, user: User) -> Result<(), StoreError> {
        let mut users = self.write();
        if users.contains_key(&user.id) {
            return Err(StoreError::AlreadyExists(user.id));
        }
        tracing::info!(id = user.id, username = %user.username, "User created");
        users.insert(user.id, user);
        Ok(())
    }

    fn list(&self, active: Option<bool>) -> Vec<User> {
        self.read()
            .values()
            .filter(|user| active.is_none_or(|flag| user.active == flag))
            .cloned()
            .collect()
    }

    fn len(&self) -> usize {
        self.read().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn user(id: i64, username: &str, active: bool) -> User {
        User {
            id,
            username: username.to_string(),
            email: format!("{username}@example.com"),
            active,
        }
    }

    #[test]
    fn create_then_get_returns_same_record() {
        let store = InMemoryUserStore::new();
        let alice = user(1, "alice", true);
        store.create(alice.clone()).expect("create");
        assert_eq!(store.get(1), Ok(alice));
    }

    #[test]
    fn duplicate_create_keeps_first_record() {
        let store = InMemoryUserStore::new();
        store.create(user(7, "first", true)).expect("create");

        let err = store.create(user(7, "second", false)).unwrap_err();
        assert_eq!(err, StoreError::AlreadyExists(7));
        assert_eq!(store.get(7).expect("get").username, "first");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn get_missing_is_not_found() {
        let store = InMemoryUserStore::new();
        assert_eq!(store.get(999), Err(StoreError::NotFound(999)));
        assert!(store.is_empty());
    }

    #[test]
    fn list_filters_by_active_flag() {
        let store = InMemoryUserStore::new();
        store.create(user(1, "a", true)).unwrap();
        store.create(user(2, "b", false)).unwrap();
        store.create(user(3, "c", true)).unwrap();

        let ids = |users: Vec<User>| users.into_iter().map(|u| u.id).collect::<Vec<_>>();
        assert_eq!(ids(store.list(None)), vec![1, 2, 3]);
        assert_eq!(ids(store.list(Some(true))), vec![1, 3]);
        assert_eq!(ids(store.list(Some(false))), vec![2]);
    }

    #[test]
    fn list_preserves_insertion_order() {
        let store = InMemoryUserStore::new();
        for id in [5, 1, 3] {
            store.create(user(id, "u", true)).unwrap();
        }
        let ids: Vec<i64> = store.list(None).iter().map(|u| u.id).collect();
        assert_eq!(ids, vec![5, 1, 3]);
    }

    #[test]
    fn active_defaults_to_true_when_missing() {
        let parsed: User =
            serde_json::from_str(r#"{"id":1,"username":"x","email":"x@example.com"}"#).unwrap();
        assert!(parsed.active);
    }

    #[test]
    fn decoding_rejects_missing_or_mistyped_fields() {
        assert!(serde_json::from_str::<User>(r#"{"id":1,"username":"x"}"#).is_err());
        assert!(
            serde_json::from_str::<User>(r#"{"id":"1","username":"x","email":"e"}"#).is_err()
        );
        assert!(
            serde_json::from_str::<User>(r#"{"id":1,"username":"x","email":"e","active":"yes"}"#)
                .is_err()
        );
    }

    #[test]
    fn concurrent_creates_of_same_id_yield_one_success() {
        let store = Arc::new(InMemoryUserStore::new());
        let handles: Vec<_> = (0..16)
            .map(|n| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || store.create(user(42, &format!("racer{n}"), true)))
            })
            .collect();

        let successes = handles
            .into_iter()
            .map(|handle| handle.join().expect("thread"))
            .filter(Result::is_ok)
            .count();
        assert_eq!(successes, 1);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn concurrent_creates_of_distinct_ids_all_land() {
        let store = Arc::new(InMemoryUserStore::new());
        let handles: Vec<_> = (0..32)
            .map(|id| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || store.create(user(id, "worker", id % 2 == 0)))
            })
            .collect();
        for handle in handles {
            handle.join().expect("thread").expect("create");
        }
        assert_eq!(store.len(), 32);
        assert_eq!(store.list(Some(true)).len(), 16);
    }
}
