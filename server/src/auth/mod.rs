//! Authentication module.
//!
//! This module provides password hashing and access-token handling for the
//! rollbase server.
//!
//! # Pre-conditions
//! - An `AuthConfig` must be constructed (and validated) before any component.
//!
//! # Post-conditions
//! - Authentication configuration is immutable once loaded.
//!
//! # Invariants
//! - The signing secret is never empty and never leaves this module in logs.

pub mod auth_config;
pub mod credentials;
pub mod jwt;

pub use auth_config::{AuthConfig, AuthConfigError};
pub use credentials::{CredentialError, CredentialManager, MAX_PASSWORD_BYTES};
pub use jwt::{Claims, TokenError, TokenService};
