//! JWT issuance and verification.
//!
//! Issues and verifies HS256-signed JSON Web Tokens carrying a subject,
//! issued-at and expiry claim.
//!
//! # Pre-conditions
//! - The signing secret comes from a validated `AuthConfig`.
//!
//! # Post-conditions
//! - `issue` returns a token that `validate` accepts until its expiry.
//! - On failure, `validate` returns a `TokenError` naming what went wrong
//!   without echoing key material.
//!
//! # Invariants
//! - Keys are derived once at construction and never change.
//! - Verification is stateless and does not modify any external state.
//! - A token is expired once `now >= exp`; no leeway is applied.

use std::sync::Arc;

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use super::AuthConfig;
use crate::time::TimeSource;

/// Claims carried by an access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject claim containing the user's email.
    pub sub: String,
    /// Issued-at time, seconds since Unix epoch.
    pub iat: u64,
    /// Expiry time, seconds since Unix epoch.
    pub exp: u64,
}

/// Error returned when issuing or verifying a JWT fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// The JWT signature is invalid.
    InvalidSignature,
    /// The JWT has expired.
    TokenExpired,
    /// The JWT is malformed or cannot be parsed.
    MalformedToken,
    /// The 'sub' claim is missing or empty.
    MissingSubClaim,
    /// The token could not be signed.
    Encoding(String),
}

impl std::fmt::Display for TokenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidSignature => write!(f, "invalid JWT signature"),
            Self::TokenExpired => write!(f, "JWT has expired"),
            Self::MalformedToken => write!(f, "malformed JWT"),
            Self::MissingSubClaim => write!(f, "missing 'sub' claim in JWT"),
            Self::Encoding(reason) => write!(f, "failed to sign JWT: {reason}"),
        }
    }
}

impl std::error::Error for TokenError {}

/// Issues and validates access tokens.
///
/// # Thread Safety
///
/// Holds only immutable key material and a shared time source; one instance
/// serves every request concurrently.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl_secs: u64,
    time_source: Arc<dyn TimeSource>,
}

impl TokenService {
    /// Create a token service from the process configuration.
    #[must_use]
    pub fn new(config: &AuthConfig, time_source: Arc<dyn TimeSource>) -> Self {
        let secret = config.jwt_secret();

        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked against `time_source` in `validate`.
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            ttl_secs: config.token_ttl().as_secs(),
            time_source,
        }
    }

    /// Issue a signed token for `subject`.
    ///
    /// # Errors
    /// Returns `TokenError::MissingSubClaim` for an empty subject, or
    /// `TokenError::Encoding` if signing fails.
    pub fn issue(&self, subject: &str) -> Result<String, TokenError> {
        if subject.is_empty() {
            return Err(TokenError::MissingSubClaim);
        }

        let now = self.time_source.now_secs();
        let claims = Claims {
            sub: subject.to_string(),
            iat: now,
            exp: now.saturating_add(self.ttl_secs),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Encoding(e.to_string()))
    }

    /// Verify a token and return its claims.
    ///
    /// # Errors
    /// Returns `TokenError` if the token is malformed, carries a bad
    /// signature, has no subject, or has expired.
    pub fn validate(&self, token: &str) -> Result<Claims, TokenError> {
        let token_data =
            decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(map_jwt_error)?;
        let claims = token_data.claims;

        if claims.sub.is_empty() {
            return Err(TokenError::MissingSubClaim);
        }
        if self.time_source.now_secs() >= claims.exp {
            return Err(TokenError::TokenExpired);
        }

        Ok(claims)
    }
}

/// Maps jsonwebtoken errors to our `TokenError` type.
fn map_jwt_error(error: jsonwebtoken::errors::Error) -> TokenError {
    use jsonwebtoken::errors::ErrorKind;

    match error.kind() {
        ErrorKind::InvalidSignature => TokenError::InvalidSignature,
        ErrorKind::ExpiredSignature => TokenError::TokenExpired,
        ErrorKind::MissingRequiredClaim(claim) if claim == "sub" => TokenError::MissingSubClaim,
        ErrorKind::InvalidToken
        | ErrorKind::InvalidAlgorithm
        | ErrorKind::Base64(_)
        | ErrorKind::Json(_)
        | ErrorKind::Utf8(_) => TokenError::MalformedToken,
        _ => TokenError::MalformedToken,
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::testing::{ManualTimeSource, test_auth_config};

    const SECRET: &[u8] = b"test-secret-key-that-is-long-enough";

    fn service_with_clock(start_secs: u64) -> (TokenService, Arc<ManualTimeSource>) {
        let clock = Arc::new(ManualTimeSource::new(start_secs));
        let service = TokenService::new(&test_auth_config(), clock.clone());
        (service, clock)
    }

    fn service_with_secret(secret: &[u8]) -> TokenService {
        let config = AuthConfig::new(secret.to_vec(), Duration::from_secs(60), 4)
            .expect("valid config");
        TokenService::new(&config, Arc::new(ManualTimeSource::new(1_000)))
    }

    fn hand_signed(claims: &serde_json::Value, secret: &[u8], algorithm: Algorithm) -> String {
        encode(&Header::new(algorithm), claims, &EncodingKey::from_secret(secret))
            .expect("failed to create test token")
    }

    /// Replace the first character of the signature segment with a different
    /// base64url character, flipping bits in the first signature byte.
    fn flip_signature_bit(token: &str) -> String {
        let (signed_part, signature) = token.rsplit_once('.').expect("three segments");
        let mut chars: Vec<char> = signature.chars().collect();
        chars[0] = if chars[0] == 'A' { 'B' } else { 'A' };
        format!("{signed_part}.{}", chars.into_iter().collect::<String>())
    }

    #[test]
    fn test_issue_then_validate() {
        let (service, _clock) = service_with_clock(1_000);
        let token = service.issue("a@b.com").expect("issue");

        let claims = service.validate(&token).expect("valid token");
        assert_eq!(claims.sub, "a@b.com");
        assert_eq!(claims.iat, 1_000);
        assert_eq!(claims.exp, 1_000 + 30 * 60);
    }

    #[test]
    fn test_token_has_three_segments() {
        let (service, _clock) = service_with_clock(1_000);
        let token = service.issue("a@b.com").expect("issue");

        assert_eq!(token.split('.').count(), 3);
    }

    #[test]
    fn test_token_valid_until_expiry() {
        let (service, clock) = service_with_clock(1_000);
        let token = service.issue("a@b.com").expect("issue");

        clock.advance(30 * 60 - 1);
        assert!(service.validate(&token).is_ok());

        clock.advance(1);
        assert_eq!(service.validate(&token), Err(TokenError::TokenExpired));
    }

    #[test]
    fn test_expired_token_stays_expired() {
        let (service, clock) = service_with_clock(1_000);
        let token = service.issue("a@b.com").expect("issue");

        clock.advance(24 * 60 * 60);
        assert_eq!(service.validate(&token), Err(TokenError::TokenExpired));
        clock.advance(1);
        assert_eq!(service.validate(&token), Err(TokenError::TokenExpired));
    }

    #[test]
    fn test_flipped_signature_bit_is_rejected() {
        let (service, _clock) = service_with_clock(1_000);
        let token = service.issue("a@b.com").expect("issue");

        let tampered = flip_signature_bit(&token);
        assert_ne!(tampered, token);
        assert_eq!(service.validate(&tampered), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn test_tampered_payload_is_rejected() {
        let (service, _clock) = service_with_clock(1_000);
        let token = service.issue("a@b.com").expect("issue");
        let forged = service.issue("mallory@b.com").expect("issue");

        let segments: Vec<&str> = token.split('.').collect();
        let forged_segments: Vec<&str> = forged.split('.').collect();
        let spliced = format!("{}.{}.{}", segments[0], forged_segments[1], segments[2]);

        assert_eq!(service.validate(&spliced), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn test_validate_with_wrong_secret() {
        let issuer = service_with_secret(SECRET);
        let verifier = service_with_secret(b"wrong-secret-key-that-is-different");
        let token = issuer.issue("a@b.com").expect("issue");

        assert_eq!(verifier.validate(&token), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn test_validate_malformed_token() {
        let (service, _clock) = service_with_clock(1_000);

        assert_eq!(service.validate("not-a-valid-jwt"), Err(TokenError::MalformedToken));
        assert_eq!(service.validate("a.b.c"), Err(TokenError::MalformedToken));
    }

    #[test]
    fn test_validate_empty_token() {
        let (service, _clock) = service_with_clock(1_000);

        assert_eq!(service.validate(""), Err(TokenError::MalformedToken));
    }

    #[test]
    fn test_validate_rejects_other_algorithm() {
        let service = service_with_secret(SECRET);
        let claims = serde_json::json!({ "sub": "a@b.com", "iat": 1_000, "exp": 2_000 });
        let token = hand_signed(&claims, SECRET, Algorithm::HS512);

        assert_eq!(service.validate(&token), Err(TokenError::MalformedToken));
    }

    #[test]
    fn test_validate_rejects_missing_exp() {
        let service = service_with_secret(SECRET);
        let claims = serde_json::json!({ "sub": "a@b.com", "iat": 1_000 });
        let token = hand_signed(&claims, SECRET, Algorithm::HS256);

        assert!(service.validate(&token).is_err());
    }

    #[test]
    fn test_validate_empty_sub_claim() {
        let service = service_with_secret(SECRET);
        let claims = serde_json::json!({ "sub": "", "iat": 1_000, "exp": 2_000 });
        let token = hand_signed(&claims, SECRET, Algorithm::HS256);

        assert_eq!(service.validate(&token), Err(TokenError::MissingSubClaim));
    }

    #[test]
    fn test_issue_empty_subject() {
        let (service, _clock) = service_with_clock(1_000);

        assert_eq!(service.issue(""), Err(TokenError::MissingSubClaim));
    }

    #[test]
    fn test_tokens_for_different_users() {
        let (service, _clock) = service_with_clock(1_000);

        let alice = service.issue("alice@example.com").expect("issue");
        let bob = service.issue("bob@example.com").expect("issue");

        assert_eq!(
            service.validate(&alice).expect("alice token").sub,
            "alice@example.com"
        );
        assert_eq!(
            service.validate(&bob).expect("bob token").sub,
            "bob@example.com"
        );
    }

    #[test]
    fn test_token_error_display() {
        assert_eq!(
            TokenError::InvalidSignature.to_string(),
            "invalid JWT signature"
        );
        assert_eq!(TokenError::TokenExpired.to_string(), "JWT has expired");
        assert_eq!(TokenError::MalformedToken.to_string(), "malformed JWT");
        assert_eq!(
            TokenError::MissingSubClaim.to_string(),
            "missing 'sub' claim in JWT"
        );
        assert_eq!(
            TokenError::Encoding("bad key".to_string()).to_string(),
            "failed to sign JWT: bad key"
        );
    }
}
