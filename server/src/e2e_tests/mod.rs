//! End-to-end tests at the HTTP request/response level.
//!
//! Each test file covers a specific scenario, driving the router in-process
//! with deterministic inputs and a manually advanced clock.

#![cfg(test)]

mod helpers;

mod test_current_user;
mod test_health;
mod test_login;
mod test_signup;
