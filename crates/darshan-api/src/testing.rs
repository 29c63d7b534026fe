//! Test helpers: an in-memory application with cheap hashing

use crate::auth::{CredentialHasher, JwtConfig, PasswordConfig};
use crate::state::AppState;
use darshan_core::{AppConfig, MemoryStore};
use std::sync::Arc;

/// Signing secret shared by tests that need to mint their own tokens
pub const TEST_JWT_SECRET: &str = "darshan-test-secret-darshan-test-secret";

/// Application state over a fresh [`MemoryStore`]
pub fn test_state() -> Arc<AppState> {
    test_state_with_store(Arc::new(MemoryStore::new()))
}

/// Application state over the given store, so tests can inspect it
pub fn test_state_with_store(store: Arc<MemoryStore>) -> Arc<AppState> {
    let hasher = CredentialHasher::new(&PasswordConfig::insecure_fast())
        .unwrap_or_else(|_| CredentialHasher::default());

    Arc::new(AppState::new(
        AppConfig::default(),
        JwtConfig::new(TEST_JWT_SECRET),
        hasher,
        store.clone(),
        store,
    ))
}
