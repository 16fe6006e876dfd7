//! Password hashing and verification.
//!
//! Wraps bcrypt with a cost fixed at construction time.
//!
//! # Invariants
//! - Plaintext passwords are never stored, logged or compared by equality.
//! - Every hash produced here carries its own random salt.
//! - `verify` never fails: an unreadable hash simply does not match.

use super::auth_config::{MAX_BCRYPT_COST, MIN_BCRYPT_COST};

/// Longest password bcrypt consumes; anything past this would be ignored.
pub const MAX_PASSWORD_BYTES: usize = 72;

/// Error returned when a password cannot be hashed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialError {
    /// The configured cost is outside the range bcrypt accepts.
    CostOutOfRange(u32),
    /// The password exceeds bcrypt's input limit.
    PasswordTooLong,
    /// The hashing primitive itself failed.
    Hashing(String),
}

impl std::fmt::Display for CredentialError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CostOutOfRange(cost) => write!(f, "bcrypt cost {cost} is out of range"),
            Self::PasswordTooLong => {
                write!(f, "password must be at most {MAX_PASSWORD_BYTES} bytes")
            }
            Self::Hashing(reason) => write!(f, "password hashing failed: {reason}"),
        }
    }
}

impl std::error::Error for CredentialError {}

/// Hashes and verifies passwords.
///
/// Holds no mutable state, so one instance can be shared across threads.
#[derive(Debug, Clone, Copy)]
pub struct CredentialManager {
    cost: u32,
}

impl CredentialManager {
    /// Create a manager that hashes at the given bcrypt cost.
    ///
    /// # Errors
    /// Returns `CredentialError::CostOutOfRange` if bcrypt would reject `cost`.
    pub fn new(cost: u32) -> Result<Self, CredentialError> {
        if !(MIN_BCRYPT_COST..=MAX_BCRYPT_COST).contains(&cost) {
            return Err(CredentialError::CostOutOfRange(cost));
        }
        Ok(Self { cost })
    }

    /// The bcrypt cost used for new hashes.
    #[must_use]
    pub const fn cost(&self) -> u32 {
        self.cost
    }

    /// Hash a password with a fresh random salt.
    ///
    /// # Errors
    /// Returns `CredentialError::PasswordTooLong` for inputs bcrypt would
    /// truncate, or `CredentialError::Hashing` if bcrypt fails.
    pub fn hash(&self, password: &str) -> Result<String, CredentialError> {
        if password.len() > MAX_PASSWORD_BYTES {
            return Err(CredentialError::PasswordTooLong);
        }
        bcrypt::hash(password, self.cost).map_err(|e| CredentialError::Hashing(e.to_string()))
    }

    /// Check a password against a stored hash.
    ///
    /// Returns `false` for a wrong password and for a malformed hash alike.
    #[must_use]
    pub fn verify(&self, password: &str, hash: &str) -> bool {
        match bcrypt::verify(password, hash) {
            Ok(matches) => matches,
            Err(e) => {
                tracing::debug!("password verification rejected unreadable hash: {e}");
                false
            }
        }
    }
}
