//! Request-scoped credentials.

use serde::Deserialize;

/// Email and plaintext password as submitted to signup or login.
///
/// Both operations accept the same shape; unknown fields are ignored.
/// This type is deliberately not `Serialize`, and its `Debug` output omits
/// the password.
#[derive(Clone, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    #[must_use]
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}
