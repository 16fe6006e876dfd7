//! Shared fixtures for unit and end-to-end tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::auth::AuthConfig;
use crate::auth::auth_config::MIN_BCRYPT_COST;
use crate::service::AuthService;
use crate::store::MemoryUserStore;
use crate::time::TimeSource;

/// Secret used by every test configuration.
pub const TEST_SECRET: &[u8] = b"rollbase-test-secret-key";

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualTimeSource {
    now_secs: AtomicU64,
}

impl ManualTimeSource {
    #[must_use]
    pub const fn new(start_secs: u64) -> Self {
        Self {
            now_secs: AtomicU64::new(start_secs),
        }
    }

    /// Move the clock forward.
    pub fn advance(&self, secs: u64) {
        let _ = self.now_secs.fetch_add(secs, Ordering::SeqCst);
    }
}

impl TimeSource for ManualTimeSource {
    fn now_secs(&self) -> u64 {
        self.now_secs.load(Ordering::SeqCst)
    }
}

/// Auth configuration with the default TTL and the cheapest bcrypt cost.
#[must_use]
pub fn test_auth_config() -> AuthConfig {
    AuthConfig::new(
        TEST_SECRET.to_vec(),
        Duration::from_secs(30 * 60),
        MIN_BCRYPT_COST,
    )
    .expect("test auth config is valid")
}

/// A fresh service over an empty in-memory store, driven by `clock`.
#[must_use]
pub fn new_test_service(clock: Arc<ManualTimeSource>) -> AuthService {
    AuthService::new(&test_auth_config(), Arc::new(MemoryUserStore::new()), clock)
        .expect("test service")
}
