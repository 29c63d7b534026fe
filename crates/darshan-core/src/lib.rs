//! Darshan Core - Domain models, traits, and shared types
//!
//! This crate defines the core abstractions used by the Dilli Darshan backend:
//! - Principals (users) and community-submitted hidden gems
//! - Ownership rules for mutable resources
//! - Common error types
//! - Storage traits with PostgreSQL and in-memory implementations
//! - Cab fare estimation
//! - Idempotent seeding of initial data
//! - Configuration management

pub mod config;
pub mod fare;
pub mod memory;
pub mod seed;
pub mod store;

pub use config::{
    AppConfig, AuthConfig, ConfigError, DatabaseConfig, Environment, FareConfig,
    DEFAULT_TOKEN_TTL_SECS, MAX_TOKEN_TTL_SECS, MIN_SECRET_LEN,
};
pub use fare::{haversine_km, FareEstimate, FareTariff};
pub use memory::MemoryStore;
pub use store::{GemRepository, PgStore, UserRepository};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

// ============================================================================
// Error Types
// ============================================================================

/// Core error types for Darshan operations
#[derive(Error, Debug)]
pub enum DarshanError {
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, DarshanError>;

// ============================================================================
// Principals
// ============================================================================

/// Stored principal record
///
/// `password_hash` is a PHC string and never leaves the server; use
/// [`User::public`] for anything sent to a client.
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Public projection of the user
    pub fn public(&self) -> UserPublic {
        UserPublic {
            id: self.id,
            email: self.email.clone(),
        }
    }
}

/// Fields of a principal that may be returned to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPublic {
    pub id: Uuid,
    pub email: String,
}

/// Data required to persist a new principal
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
}

// ============================================================================
// Hidden Gems
// ============================================================================

/// Anything that records the principal who created it
pub trait Owned {
    fn owner_id(&self) -> Uuid;
}

/// Owner details embedded in hidden gem responses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GemOwner {
    pub email: String,
}

/// Community-submitted location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HiddenGem {
    pub id: Uuid,
    /// Creator of the gem; set once at creation
    pub user_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub address: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub user: GemOwner,
}

impl Owned for HiddenGem {
    fn owner_id(&self) -> Uuid {
        self.user_id
    }
}

/// Validated payload for a new hidden gem
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GemDraft {
    pub name: String,
    pub description: Option<String>,
    pub address: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub image: Option<String>,
}

/// Partial update; `None` leaves the stored value untouched
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GemPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub address: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub image: Option<String>,
}

impl GemPatch {
    /// Apply the patch in place and bump `updated_at`
    pub fn apply(&self, gem: &mut HiddenGem) {
        if let Some(name) = &self.name {
            gem.name = name.clone();
        }
        if let Some(description) = &self.description {
            gem.description = Some(description.clone());
        }
        if let Some(address) = &self.address {
            gem.address = Some(address.clone());
        }
        if let Some(lat) = self.lat {
            gem.lat = Some(lat);
        }
        if let Some(lng) = self.lng {
            gem.lng = Some(lng);
        }
        if let Some(image) = &self.image {
            gem.image = Some(image.clone());
        }
        gem.updated_at = Utc::now();
    }

    pub fn is_empty(&self) -> bool {
        self == &GemPatch::default()
    }
}

/// Check that optional coordinates are finite and within WGS84 bounds
pub fn validate_coordinates(lat: Option<f64>, lng: Option<f64>) -> Result<()> {
    if let Some(lat) = lat {
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(DarshanError::ValidationError(
                "Latitude must be between -90 and 90".to_string(),
            ));
        }
    }
    if let Some(lng) = lng {
        if !lng.is_finite() || !(-180.0..=180.0).contains(&lng) {
            return Err(DarshanError::ValidationError(
                "Longitude must be between -180 and 180".to_string(),
            ));
        }
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_gem() -> HiddenGem {
        let now = Utc::now();
        HiddenGem {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            name: "Agrasen ki Baoli".to_string(),
            description: None,
            address: Some("Hailey Rd, Connaught Place".to_string()),
            lat: Some(28.6304),
            lng: Some(77.1991),
            image: None,
            created_at: now,
            updated_at: now,
            user: GemOwner {
                email: "admin@delhidiscover.com".to_string(),
            },
        }
    }

    #[test]
    fn test_patch_only_touches_supplied_fields() {
        let mut gem = sample_gem();
        let before = gem.clone();

        let patch = GemPatch {
            description: Some("60-metre stepwell".to_string()),
            ..Default::default()
        };
        patch.apply(&mut gem);

        assert_eq!(gem.name, before.name);
        assert_eq!(gem.address, before.address);
        assert_eq!(gem.description.as_deref(), Some("60-metre stepwell"));
        assert_eq!(gem.user_id, before.user_id);
        assert!(gem.updated_at >= before.updated_at);
    }

    #[test]
    fn test_empty_patch() {
        assert!(GemPatch::default().is_empty());
        assert!(!GemPatch {
            lat: Some(1.0),
            ..Default::default()
        }
        .is_empty());
    }

    #[test]
    fn test_owner_id() {
        let gem = sample_gem();
        assert_eq!(gem.owner_id(), gem.user_id);
    }

    #[test]
    fn test_user_public_projection() {
        let user = User {
            id: Uuid::new_v4(),
            email: "a@x.com".to_string(),
            password_hash: "$argon2id$v=19$...".to_string(),
            created_at: Utc::now(),
        };

        let public = user.public();
        assert_eq!(public.id, user.id);
        let json = serde_json::to_string(&public).unwrap();
        assert!(!json.contains("argon2"));
    }

    #[test]
    fn test_coordinate_bounds() {
        assert!(validate_coordinates(None, None).is_ok());
        assert!(validate_coordinates(Some(28.61), Some(77.20)).is_ok());
        assert!(validate_coordinates(Some(90.0), Some(-180.0)).is_ok());
        assert!(validate_coordinates(Some(90.5), None).is_err());
        assert!(validate_coordinates(None, Some(181.0)).is_err());
        assert!(validate_coordinates(Some(f64::NAN), None).is_err());
    }
}
