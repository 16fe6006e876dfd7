//! Signup, login and current-user resolution.
//!
//! `AuthService` wires the credential manager, the token service and a user
//! store together. It is the only layer that decides which error a client
//! sees; lower layers report their own error types and this module folds
//! them into `AuthError`.
//!
//! # Post-conditions
//! - Errors carry generic messages only. Causes are logged, never returned.
//! - Unknown email and wrong password are indistinguishable to the caller.

use std::sync::Arc;

use crate::auth::{
    AuthConfig, CredentialError, CredentialManager, MAX_PASSWORD_BYTES, TokenService,
};
use crate::store::{StoreError, UserStore};
use crate::time::TimeSource;
use crate::types::{AccessToken, Credentials, User};

/// Password hashed at startup and verified against when a login names an
/// unknown email, so that path costs the same as a wrong password.
const TIMING_DUMMY_PASSWORD: &str = "rollbase-timing-equalizer";

/// Client-facing failure of an authentication operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Signup for an email that is already registered.
    DuplicateEmail,
    /// Login with an unknown email or a wrong password.
    InvalidCredentials,
    /// A bearer token that is missing, malformed, forged or expired.
    InvalidOrExpiredToken,
    /// A valid token whose subject no longer exists.
    UserNotFound,
    /// The request body failed validation.
    InvalidRequest(&'static str),
    /// Storage or hashing failed; details are only logged.
    Internal,
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateEmail => write!(f, "Email already registered"),
            Self::InvalidCredentials => write!(f, "Invalid credentials"),
            Self::InvalidOrExpiredToken => write!(f, "Invalid token"),
            Self::UserNotFound => write!(f, "User not found"),
            Self::InvalidRequest(reason) => write!(f, "{reason}"),
            Self::Internal => write!(f, "Internal server error"),
        }
    }
}

impl std::error::Error for AuthError {}

impl From<StoreError> for AuthError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::DuplicateEmail => Self::DuplicateEmail,
            StoreError::LockPoisoned => {
                tracing::error!("user store unavailable: {e}");
                Self::Internal
            }
        }
    }
}

impl From<CredentialError> for AuthError {
    fn from(e: CredentialError) -> Self {
        match e {
            CredentialError::PasswordTooLong => Self::InvalidRequest("password is too long"),
            CredentialError::CostOutOfRange(_) | CredentialError::Hashing(_) => {
                tracing::error!("password hashing failed: {e}");
                Self::Internal
            }
        }
    }
}

/// The application layer behind the HTTP routes.
pub struct AuthService {
    credentials: CredentialManager,
    tokens: TokenService,
    store: Arc<dyn UserStore>,
    dummy_hash: String,
}

impl AuthService {
    /// Build the service from startup configuration.
    ///
    /// Hashes a dummy password once, so this takes as long as one bcrypt
    /// round at the configured cost.
    ///
    /// # Errors
    /// Returns `CredentialError` if the configured cost cannot be used.
    pub fn new(
        config: &AuthConfig,
        store: Arc<dyn UserStore>,
        time_source: Arc<dyn TimeSource>,
    ) -> Result<Self, CredentialError> {
        let credentials = CredentialManager::new(config.bcrypt_cost())?;
        let dummy_hash = credentials.hash(TIMING_DUMMY_PASSWORD)?;

        Ok(Self {
            credentials,
            tokens: TokenService::new(config, time_source),
            store,
            dummy_hash,
        })
    }

    /// Register a new user.
    ///
    /// # Errors
    /// `InvalidRequest` for a malformed email or password, `DuplicateEmail`
    /// if the email is taken.
    pub fn signup(&self, credentials: &Credentials) -> Result<User, AuthError> {
        validate_email(&credentials.email)?;
        validate_new_password(&credentials.password)?;

        if self.store.find_user_by_email(&credentials.email)?.is_some() {
            tracing::debug!("signup rejected: email already registered");
            return Err(AuthError::DuplicateEmail);
        }

        let password_hash = self.credentials.hash(&credentials.password)?;
        // The store re-checks uniqueness, which covers two signups racing
        // past the lookup above.
        let user = self
            .store
            .create_user(&credentials.email, &password_hash)?;

        tracing::info!("registered new user");
        Ok(user)
    }

    /// Check credentials and issue an access token.
    ///
    /// # Errors
    /// `InvalidCredentials` when the email is unknown or the password is
    /// wrong, including an empty one; `InvalidRequest` for a malformed email.
    pub fn login(&self, credentials: &Credentials) -> Result<AccessToken, AuthError> {
        validate_email(&credentials.email)?;

        // Signup never stores a password over the bcrypt limit, so a longer
        // one cannot match and is rejected like an unknown email.
        let user = match self.store.find_user_by_email(&credentials.email)? {
            Some(user) if credentials.password.len() <= MAX_PASSWORD_BYTES => user,
            _ => {
                let _ = self
                    .credentials
                    .verify(&credentials.password, &self.dummy_hash);
                tracing::debug!("login rejected: unknown email or oversized password");
                return Err(AuthError::InvalidCredentials);
            }
        };

        if !self
            .credentials
            .verify(&credentials.password, &user.password_hash)
        {
            tracing::debug!("login rejected: password mismatch");
            return Err(AuthError::InvalidCredentials);
        }

        let token = self.tokens.issue(&user.email).map_err(|e| {
            tracing::error!("failed to issue token: {e}");
            AuthError::Internal
        })?;

        tracing::debug!("issued access token");
        Ok(AccessToken::bearer(token))
    }

    /// Resolve the user a bearer token belongs to.
    ///
    /// # Errors
    /// `InvalidOrExpiredToken` if the token does not validate,
    /// `UserNotFound` if its subject is not in the store.
    pub fn current_user(&self, token: &str) -> Result<User, AuthError> {
        let claims = self.tokens.validate(token).map_err(|e| {
            tracing::debug!("token rejected: {e}");
            AuthError::InvalidOrExpiredToken
        })?;

        self.store
            .find_user_by_email(&claims.sub)?
            .ok_or(AuthError::UserNotFound)
    }

    #[cfg(test)]
    pub(crate) const fn tokens(&self) -> &TokenService {
        &self.tokens
    }
}

fn validate_email(email: &str) -> Result<(), AuthError> {
    if is_plausible_email(email) {
        Ok(())
    } else {
        Err(AuthError::InvalidRequest("email is not a valid address"))
    }
}

/// Password rules applied when a password is first stored.
fn validate_new_password(password: &str) -> Result<(), AuthError> {
    if password.is_empty() {
        return Err(AuthError::InvalidRequest("password must not be empty"));
    }
    if password.len() > MAX_PASSWORD_BYTES {
        return Err(AuthError::InvalidRequest("password is too long"));
    }
    Ok(())
}

/// `local@domain` with both parts present and no whitespace.
fn is_plausible_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && !domain.is_empty() && !domain.contains('@'),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryUserStore;
    use crate::testing::{ManualTimeSource, test_auth_config};

    fn service() -> (AuthService, Arc<ManualTimeSource>) {
        let clock = Arc::new(ManualTimeSource::new(1_000));
        let service = AuthService::new(
            &test_auth_config(),
            Arc::new(MemoryUserStore::new()),
            clock.clone(),
        )
        .expect("service");
        (service, clock)
    }

    #[test]
    fn test_signup_then_duplicate() {
        let (service, _clock) = service();

        let user = service
            .signup(&Credentials::new("a@b.com", "pw1"))
            .expect("first signup");
        assert_eq!(user.email, "a@b.com");
        assert_ne!(user.password_hash, "pw1");

        assert_eq!(
            service.signup(&Credentials::new("a@b.com", "pw2")),
            Err(AuthError::DuplicateEmail)
        );
    }

    #[test]
    fn test_login_wrong_then_right_password() {
        let (service, _clock) = service();
        service
            .signup(&Credentials::new("a@b.com", "pw1"))
            .expect("signup");

        assert_eq!(
            service.login(&Credentials::new("a@b.com", "wrongpw")),
            Err(AuthError::InvalidCredentials)
        );

        let token = service
            .login(&Credentials::new("a@b.com", "pw1"))
            .expect("login");
        assert_eq!(token.token_type, "bearer");

        let claims = service
            .tokens()
            .validate(&token.access_token)
            .expect("valid token");
        assert_eq!(claims.sub, "a@b.com");
    }

    #[test]
    fn test_login_unknown_email_matches_wrong_password() {
        let (service, _clock) = service();
        service
            .signup(&Credentials::new("a@b.com", "pw1"))
            .expect("signup");

        let unknown = service.login(&Credentials::new("nobody@b.com", "pw1"));
        let wrong = service.login(&Credentials::new("a@b.com", "nope"));

        assert_eq!(unknown, Err(AuthError::InvalidCredentials));
        assert_eq!(unknown, wrong);
    }

    #[test]
    fn test_current_user_round_trip() {
        let (service, _clock) = service();
        service
            .signup(&Credentials::new("a@b.com", "pw1"))
            .expect("signup");
        let token = service
            .login(&Credentials::new("a@b.com", "pw1"))
            .expect("login");

        let user = service
            .current_user(&token.access_token)
            .expect("current user");
        assert_eq!(user.email, "a@b.com");
    }

    #[test]
    fn test_current_user_expired_token() {
        let (service, clock) = service();
        service
            .signup(&Credentials::new("a@b.com", "pw1"))
            .expect("signup");
        let token = service
            .login(&Credentials::new("a@b.com", "pw1"))
            .expect("login");

        clock.advance(test_auth_config().token_ttl().as_secs());
        assert_eq!(
            service.current_user(&token.access_token),
            Err(AuthError::InvalidOrExpiredToken)
        );
    }

    #[test]
    fn test_current_user_garbage_token() {
        let (service, _clock) = service();

        assert_eq!(
            service.current_user("garbage"),
            Err(AuthError::InvalidOrExpiredToken)
        );
    }

    #[test]
    fn test_current_user_subject_missing() {
        let (service, _clock) = service();
        let token = service.tokens().issue("ghost@b.com").expect("issue");

        assert_eq!(service.current_user(&token), Err(AuthError::UserNotFound));
    }

    #[test]
    fn test_signup_rejects_invalid_requests() {
        let (service, _clock) = service();

        for email in ["", "no-at-sign", "@b.com", "a@", "a b@c.com", "a@b@c.com"] {
            assert!(
                matches!(
                    service.signup(&Credentials::new(email, "pw1")),
                    Err(AuthError::InvalidRequest(_))
                ),
                "{email:?} should be rejected"
            );
        }
        assert!(matches!(
            service.signup(&Credentials::new("a@b.com", "")),
            Err(AuthError::InvalidRequest(_))
        ));
        assert!(matches!(
            service.signup(&Credentials::new("a@b.com", "x".repeat(MAX_PASSWORD_BYTES + 1))),
            Err(AuthError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_login_empty_password_is_a_mismatch() {
        let (service, _clock) = service();
        service
            .signup(&Credentials::new("a@b.com", "pw1"))
            .expect("signup");

        assert_eq!(
            service.login(&Credentials::new("a@b.com", "")),
            Err(AuthError::InvalidCredentials)
        );
    }

    #[test]
    fn test_login_oversized_password_is_a_mismatch() {
        let (service, _clock) = service();
        let password = "p".repeat(MAX_PASSWORD_BYTES);
        service
            .signup(&Credentials::new("a@b.com", password.clone()))
            .expect("signup");

        assert_eq!(
            service.login(&Credentials::new("a@b.com", format!("{password}extra"))),
            Err(AuthError::InvalidCredentials)
        );
        assert!(service.login(&Credentials::new("a@b.com", password)).is_ok());
    }

    #[test]
    fn test_login_still_checks_email_shape() {
        let (service, _clock) = service();

        assert!(matches!(
            service.login(&Credentials::new("not-an-email", "pw1")),
            Err(AuthError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_is_plausible_email() {
        assert!(is_plausible_email("a@b.com"));
        assert!(is_plausible_email("first.last+tag@example.co.uk"));
        assert!(!is_plausible_email("a@b .com"));
        assert!(!is_plausible_email("ab.com"));
    }

    #[test]
    fn test_auth_error_display() {
        assert_eq!(
            AuthError::DuplicateEmail.to_string(),
            "Email already registered"
        );
        assert_eq!(
            AuthError::InvalidCredentials.to_string(),
            "Invalid credentials"
        );
        assert_eq!(AuthError::InvalidOrExpiredToken.to_string(), "Invalid token");
        assert_eq!(AuthError::UserNotFound.to_string(), "User not found");
        assert_eq!(
            AuthError::InvalidRequest("bad email").to_string(),
            "bad email"
        );
        assert_eq!(AuthError::Internal.to_string(), "Internal server error");
    }

    #[test]
    fn test_store_error_conversion() {
        assert_eq!(
            AuthError::from(StoreError::DuplicateEmail),
            AuthError::DuplicateEmail
        );
        assert_eq!(AuthError::from(StoreError::LockPoisoned), AuthError::Internal);
    }
}
