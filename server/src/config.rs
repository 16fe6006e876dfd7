//! Server configuration module.
//!
//! This module provides configuration loading for the rollbase server from
//! environment variables.
//!
//! # Environment Variables
//!
//! - `ROLLBASE_JWT_SECRET`: HS256 signing secret (default: 32 random bytes generated at startup)
//! - `ROLLBASE_TOKEN_TTL_MINUTES`: Access token lifetime in minutes (default: `30`)
//! - `ROLLBASE_BCRYPT_COST`: bcrypt work factor, 4-31 (default: `12`)
//! - `ROLLBASE_LISTEN_PORT`: Port to listen on (default: `8000`)
//!
//! # Invariants
//!
//! - `auth` is always a validated `AuthConfig`
//! - `listen_port` is always a valid port number (1-65535)

use std::time::Duration;

use rand::Rng;

use crate::auth::{AuthConfig, AuthConfigError};

const JWT_SECRET_VAR: &str = "ROLLBASE_JWT_SECRET";
const TOKEN_TTL_VAR: &str = "ROLLBASE_TOKEN_TTL_MINUTES";
const BCRYPT_COST_VAR: &str = "ROLLBASE_BCRYPT_COST";
const LISTEN_PORT_VAR: &str = "ROLLBASE_LISTEN_PORT";

/// Length of a generated signing secret.
const GENERATED_SECRET_BYTES: usize = 32;

/// Server configuration.
///
/// Contains all configuration parameters needed to run the rollbase server.
///
/// # Post-conditions
///
/// - `listen_port` is always in the valid range (1-65535)
/// - `auth` satisfies every `AuthConfig` invariant
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Credential and token settings shared by the auth components.
    pub auth: AuthConfig,
    /// Whether the signing secret was generated because none was configured.
    /// Tokens signed with a generated secret do not survive a restart.
    pub jwt_secret_generated: bool,
    /// Port to listen on for HTTP connections.
    pub listen_port: u16,
}

/// Error returned when loading configuration fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// An environment variable has an invalid value.
    InvalidValue { name: String, message: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue { name, message } => {
                write!(f, "invalid value for {name}: {message}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl ServerConfig {
    /// Default port for the server.
    pub const DEFAULT_PORT: u16 = 8000;
    /// Default token lifetime in minutes.
    pub const DEFAULT_TOKEN_TTL_MINUTES: u64 = 30;

    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if any variable is set to an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `ROLLBASE_JWT_SECRET` is set but empty
    /// - `ROLLBASE_TOKEN_TTL_MINUTES` is not a positive integer
    /// - `ROLLBASE_BCRYPT_COST` is not an integer in 4-31
    /// - `ROLLBASE_LISTEN_PORT` is not a valid port number
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let (jwt_secret, jwt_secret_generated) = Self::load_jwt_secret(&lookup)?;
        let token_ttl = Self::load_token_ttl(&lookup)?;
        let bcrypt_cost = Self::load_bcrypt_cost(&lookup)?;
        let listen_port = Self::load_listen_port(&lookup)?;

        let auth = AuthConfig::new(jwt_secret, token_ttl, bcrypt_cost).map_err(|e| {
            let name = match e {
                AuthConfigError::EmptySecret => JWT_SECRET_VAR,
                AuthConfigError::ZeroTtl => TOKEN_TTL_VAR,
                AuthConfigError::CostOutOfRange(_) => BCRYPT_COST_VAR,
            };
            ConfigError::InvalidValue {
                name: name.to_string(),
                message: e.to_string(),
            }
        })?;

        Ok(Self {
            auth,
            jwt_secret_generated,
            listen_port,
        })
    }

    /// Load the signing secret, generating one if it is not set.
    ///
    /// # Errors
    ///
    /// Returns an error if the variable is set to an empty string.
    fn load_jwt_secret<F>(lookup: &F) -> Result<(Vec<u8>, bool), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        match lookup(JWT_SECRET_VAR) {
            Some(secret) if secret.is_empty() => Err(ConfigError::InvalidValue {
                name: JWT_SECRET_VAR.to_string(),
                message: "must not be empty".to_string(),
            }),
            Some(secret) => Ok((secret.into_bytes(), false)),
            None => {
                let mut secret = [0u8; GENERATED_SECRET_BYTES];
                rand::rng().fill(&mut secret);
                Ok((secret.to_vec(), true))
            }
        }
    }

    /// Load the token lifetime.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not a positive number of minutes.
    fn load_token_ttl<F>(lookup: &F) -> Result<Duration, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let minutes = match lookup(TOKEN_TTL_VAR) {
            Some(value) => match value.parse::<u64>() {
                Ok(minutes) if minutes > 0 => minutes,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        name: TOKEN_TTL_VAR.to_string(),
                        message: format!("'{value}' is not a positive number of minutes"),
                    });
                }
            },
            None => Self::DEFAULT_TOKEN_TTL_MINUTES,
        };

        let secs = minutes.checked_mul(60).ok_or_else(|| ConfigError::InvalidValue {
            name: TOKEN_TTL_VAR.to_string(),
            message: format!("{minutes} minutes is too large"),
        })?;
        Ok(Duration::from_secs(secs))
    }

    /// Load the bcrypt work factor.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not an integer.
    fn load_bcrypt_cost<F>(lookup: &F) -> Result<u32, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        match lookup(BCRYPT_COST_VAR) {
            Some(value) => value.parse::<u32>().map_err(|_| ConfigError::InvalidValue {
                name: BCRYPT_COST_VAR.to_string(),
                message: format!("'{value}' is not a valid bcrypt cost"),
            }),
            None => Ok(AuthConfig::DEFAULT_BCRYPT_COST),
        }
    }

    /// Load the listen port.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is set but not a valid port number.
    fn load_listen_port<F>(lookup: &F) -> Result<u16, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        match lookup(LISTEN_PORT_VAR) {
            Some(value) => match value.parse::<u16>() {
                Ok(port) if port > 0 => Ok(port),
                _ => Err(ConfigError::InvalidValue {
                    name: LISTEN_PORT_VAR.to_string(),
                    message: format!("'{value}' is not a valid port number (must be 1-65535)"),
                }),
            },
            None => Ok(Self::DEFAULT_PORT),
        }
    }
}
