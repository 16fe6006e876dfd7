//! Authentication configuration.
//!
//! # Pre-conditions
//! - The signing secret must be a non-empty byte string.
//! - The bcrypt cost must lie within the range bcrypt accepts.
//!
//! # Post-conditions
//! - `AuthConfig` instances are immutable once created.
//!
//! # Invariants
//! - `jwt_secret` is never empty.
//! - `token_ttl` is never zero.
//! - `bcrypt_cost` is always in `MIN_BCRYPT_COST..=MAX_BCRYPT_COST`.

use std::time::Duration;

/// Smallest cost bcrypt will accept.
pub const MIN_BCRYPT_COST: u32 = 4;
/// Largest cost bcrypt will accept.
pub const MAX_BCRYPT_COST: u32 = 31;

/// Error returned when authentication configuration is invalid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthConfigError {
    /// The HS256 signing secret is empty.
    EmptySecret,
    /// The token lifetime is zero.
    ZeroTtl,
    /// The bcrypt cost is outside the supported range.
    CostOutOfRange(u32),
}

impl std::fmt::Display for AuthConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptySecret => write!(f, "HS256 secret must not be empty"),
            Self::ZeroTtl => write!(f, "token TTL must be greater than zero"),
            Self::CostOutOfRange(cost) => write!(
                f,
                "bcrypt cost {cost} is outside {MIN_BCRYPT_COST}..={MAX_BCRYPT_COST}"
            ),
        }
    }
}

impl std::error::Error for AuthConfigError {}

/// Process-wide authentication settings.
///
/// Constructed once at startup and handed to both the credential manager and
/// the token service. Nothing mutates it afterwards.
#[derive(Clone)]
pub struct AuthConfig {
    jwt_secret: Vec<u8>,
    token_ttl: Duration,
    bcrypt_cost: u32,
}

impl AuthConfig {
    /// Default lifetime of an access token.
    pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(30 * 60);
    /// Default bcrypt work factor.
    pub const DEFAULT_BCRYPT_COST: u32 = 12;

    /// Create a new authentication configuration.
    ///
    /// # Errors
    /// Returns `AuthConfigError` if the secret is empty, the TTL is zero or
    /// the cost is out of range.
    pub fn new(
        jwt_secret: Vec<u8>,
        token_ttl: Duration,
        bcrypt_cost: u32,
    ) -> Result<Self, AuthConfigError> {
        if jwt_secret.is_empty() {
            return Err(AuthConfigError::EmptySecret);
        }
        if token_ttl.is_zero() {
            return Err(AuthConfigError::ZeroTtl);
        }
        if !(MIN_BCRYPT_COST..=MAX_BCRYPT_COST).contains(&bcrypt_cost) {
            return Err(AuthConfigError::CostOutOfRange(bcrypt_cost));
        }

        Ok(Self {
            jwt_secret,
            token_ttl,
            bcrypt_cost,
        })
    }

    /// The HS256 signing secret.
    #[must_use]
    pub fn jwt_secret(&self) -> &[u8] {
        &self.jwt_secret
    }

    /// How long an issued token stays valid.
    #[must_use]
    pub const fn token_ttl(&self) -> Duration {
        self.token_ttl
    }

    /// The bcrypt work factor used for new hashes.
    #[must_use]
    pub const fn bcrypt_cost(&self) -> u32 {
        self.bcrypt_cost
    }
}

// The secret must never end up in logs.
impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"<redacted>")
            .field("token_ttl", &self.token_ttl)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .finish()
    }
}
