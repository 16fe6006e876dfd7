//! User records.
//!
//! A `User` is created once at signup and never modified. The stored hash
//! stays inside the crate boundary: responses use `PublicUser`.

use serde::Serialize;

/// A registered user, as held by the user store.
#[derive(Clone, PartialEq, Eq)]
pub struct User {
    /// Unique identifier; lookups are by exact match.
    pub email: String,
    /// bcrypt hash of the user's password.
    pub password_hash: String,
}

impl User {
    #[must_use]
    pub const fn new(email: String, password_hash: String) -> Self {
        Self {
            email,
            password_hash,
        }
    }
}

impl std::fmt::Debug for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("User")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// The externally visible part of a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublicUser {
    pub email: String,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            email: user.email.clone(),
        }
    }
}
