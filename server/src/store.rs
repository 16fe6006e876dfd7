//! User storage, keyed by email.
//!
//! The service talks to storage through the `UserStore` trait so the backing
//! engine can be swapped. `MemoryUserStore` is the in-process implementation.
//!
//! # Thread Safety
//!
//! `MemoryUserStore` uses `RwLock` so concurrent lookups do not block each
//! other; inserts take the write lock.
//!
//! # Invariants
//!
//! - Each email maps to at most one `User`.
//! - Users are never modified or removed through this interface.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::RwLock;

use crate::types::User;

/// Errors that can occur when reading or writing users.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A user with this email already exists.
    DuplicateEmail,
    /// The store lock was poisoned by a panicking writer.
    LockPoisoned,
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateEmail => write!(f, "email already registered"),
            Self::LockPoisoned => write!(f, "user store lock poisoned"),
        }
    }
}

impl std::error::Error for StoreError {}

/// Key-value storage of users by email.
pub trait UserStore: Send + Sync {
    /// Look up a user by exact email.
    ///
    /// # Errors
    /// Returns `StoreError` if the backing store cannot be read.
    fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// Insert a new user.
    ///
    /// # Errors
    /// Returns `StoreError::DuplicateEmail` if the email is taken, checked
    /// atomically with the insert.
    fn create_user(&self, email: &str, password_hash: &str) -> Result<User, StoreError>;
}

/// In-memory user store.
#[derive(Debug, Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<String, User>>,
}

impl MemoryUserStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl UserStore for MemoryUserStore {
    fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let users = self.users.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(users.get(email).cloned())
    }

    #[allow(clippy::significant_drop_tightening)] // The write lock must cover check and insert
    fn create_user(&self, email: &str, password_hash: &str) -> Result<User, StoreError> {
        let mut users = self.users.write().map_err(|_| StoreError::LockPoisoned)?;

        match users.entry(email.to_string()) {
            Entry::Occupied(_) => Err(StoreError::DuplicateEmail),
            Entry::Vacant(slot) => {
                let user = User::new(email.to_string(), password_hash.to_string());
                slot.insert(user.clone());
                Ok(user)
            }
        }
    }
}
