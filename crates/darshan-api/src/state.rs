//! Application state management

use crate::auth::{AuthService, CredentialHasher, JwtConfig, TokenService};
use crate::gems::GemService;
use darshan_core::{AppConfig, FareTariff, GemRepository, UserRepository};
use std::sync::Arc;
use std::time::Instant;

/// Application state shared across handlers
///
/// Read-only after startup.
pub struct AppState {
    /// Application configuration
    pub config: AppConfig,
    /// Server start time
    pub start_time: Instant,
    /// Bearer token issuer/verifier
    pub tokens: TokenService,
    /// Sign-up / sign-in
    pub auth: AuthService,
    /// Hidden gems
    pub gems: GemService,
    /// Cab fare tariff
    pub tariff: FareTariff,
}

impl AppState {
    /// Wire services over the given repositories
    pub fn new(
        config: AppConfig,
        jwt: JwtConfig,
        hasher: CredentialHasher,
        users: Arc<dyn UserRepository>,
        gems: Arc<dyn GemRepository>,
    ) -> Self {
        let tokens = TokenService::new(jwt);
        let tariff = FareTariff::from(&config.fare);

        Self {
            auth: AuthService::new(users, Arc::new(hasher), tokens.clone()),
            gems: GemService::new(gems),
            tokens,
            tariff,
            config,
            start_time: Instant::now(),
        }
    }

    /// Get uptime in seconds
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
