//! Time source abstraction for token expiry.
//!
//! Token issuance and validation read the clock through `TimeSource`, so
//! production uses the system clock while tests can move time forward
//! deterministically.

use std::time::{SystemTime, UNIX_EPOCH};

/// Abstraction over the wall clock.
///
/// Implementations must be shareable across request threads.
pub trait TimeSource: Send + Sync {
    /// Get the current time in whole seconds since Unix epoch.
    fn now_secs(&self) -> u64;
}

/// Real time source using the system clock.
///
/// This is the default implementation used in production.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now_secs(&self) -> u64 {
        // A clock set before 1970 reads as the epoch.
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |duration| duration.as_secs())
    }
}
