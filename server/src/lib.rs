// Forbid unwrap()/expect() in production code.
// Test code is allowed to use them for convenience.
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

// Life of a request:
// 1. JSON or a bearer header comes in over HTTP
// 2. Validate it into `Credentials` / a raw token
// 3. Signup: hash the password, insert the user
//    Login: look up the user, verify the password, sign a token
//    Current user: verify the token, look up its subject
// 4. Map the outcome onto a status code and a JSON body
//
// System components:
//  - Credential manager (bcrypt)
//  - Token service (HS256 JWT)
//  - User store
//  - Auth service and HTTP routes

pub mod auth;
pub mod config;
mod e2e_tests;
pub mod http;
pub mod service;
pub mod store;
#[cfg(test)]
mod testing;
pub mod time;
pub mod types;

pub use service::{AuthError, AuthService};
