//! JWT token generation and validation
//!
//! Implements stateless bearer tokens with HMAC-SHA256 signing.
//! A token carries only the principal id, issuer and validity window; it is
//! valid until its expiry and cannot be revoked early.

use base64::Engine;
use darshan_core::{AuthConfig, ConfigError, Environment, DEFAULT_TOKEN_TTL_SECS};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use uuid::Uuid;

/// JWT Claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Token issuer
    pub iss: String,
    /// Subject - principal id
    pub sub: String,
    /// Issued at timestamp (Unix epoch)
    pub iat: u64,
    /// Expiration timestamp (Unix epoch)
    pub exp: u64,
}

/// JWT token generation and validation errors
#[derive(Debug, Error)]
pub enum JwtError {
    #[error("Failed to encode JWT: {0}")]
    EncodingError(#[from] jsonwebtoken::errors::Error),

    #[error("Invalid token format")]
    InvalidToken,

    #[error("Token has expired")]
    ExpiredToken,

    #[error("Invalid token signature")]
    InvalidSignature,

    #[error("Invalid token subject")]
    InvalidSubject,

    #[error("Token expiry overflows the clock")]
    ExpiryOverflow,

    #[error("System time error: {0}")]
    SystemTimeError(#[from] std::time::SystemTimeError),
}

/// JWT Configuration
///
/// Built once at startup and handed to [`TokenService::new`].
#[derive(Clone)]
pub struct JwtConfig {
    /// Secret key for HMAC signing
    pub secret: String,
    /// Token validity window in seconds
    pub expiration_secs: u64,
    /// Token issuer identifier
    pub issuer: String,
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"<redacted>")
            .field("expiration_secs", &self.expiration_secs)
            .field("issuer", &self.issuer)
            .finish()
    }
}

impl JwtConfig {
    /// Configuration with an explicit secret and default window and issuer
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            expiration_secs: DEFAULT_TOKEN_TTL_SECS,
            issuer: AuthConfig::default().issuer,
        }
    }

    /// Resolve the signing configuration for the given environment
    ///
    /// Production requires `jwt_secret`. In development a missing secret is
    /// replaced by a random per-process key, so tokens do not survive a restart.
    pub fn from_auth_config(auth: &AuthConfig, env: Environment) -> Result<Self, ConfigError> {
        let secret = match &auth.jwt_secret {
            Some(secret) if !secret.is_empty() => secret.clone(),
            _ if env.is_production() => {
                return Err(ConfigError::MissingRequired("JWT_SECRET".to_string()));
            }
            _ => {
                tracing::warn!(
                    "JWT_SECRET not set; using an ephemeral signing key (tokens will not survive a restart)"
                );
                generate_secret()
            }
        };

        Ok(Self {
            secret,
            expiration_secs: auth.token_ttl_secs,
            issuer: auth.issuer.clone(),
        })
    }
}

/// 256-bit random secret, URL-safe base64 encoded
fn generate_secret() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

/// Issues and verifies bearer tokens
///
/// Cheap to clone; keys are derived once and shared.
#[derive(Clone)]
pub struct TokenService {
    config: Arc<JwtConfig>,
    keys: Arc<TokenKeys>,
}

impl TokenService {
    pub fn new(config: JwtConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&config.issuer]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);
        validation.leeway = 0;

        let keys = TokenKeys {
            encoding: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
        };

        Self {
            config: Arc::new(config),
            keys: Arc::new(keys),
        }
    }

    /// Issue a signed token for a principal
    ///
    /// # Example
    ///
    /// ```no_run
    /// use darshan_api::auth::jwt::{JwtConfig, TokenService};
    /// use uuid::Uuid;
    ///
    /// let tokens = TokenService::new(JwtConfig::new("a-long-random-secret-from-the-environment"));
    /// let user_id = Uuid::new_v4();
    /// let token = tokens.issue(user_id).expect("Failed to issue token");
    /// assert_eq!(tokens.verify(&token), Some(user_id));
    /// ```
    pub fn issue(&self, user_id: Uuid) -> Result<String, JwtError> {
        let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();
        let exp = now
            .checked_add(self.config.expiration_secs)
            .ok_or(JwtError::ExpiryOverflow)?;

        let claims = Claims {
            iss: self.config.issuer.clone(),
            sub: user_id.to_string(),
            iat: now,
            exp,
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.keys.encoding)?;

        Ok(token)
    }

    /// Verify a token and return the principal id it names
    ///
    /// Every failure (bad signature, malformed, expired, wrong issuer) is `None`.
    pub fn verify(&self, token: &str) -> Option<Uuid> {
        self.decode_claims(token)
            .ok()
            .and_then(|claims| Uuid::parse_str(&claims.sub).ok())
    }

    /// Decode and validate claims, keeping the failure reason for logging
    pub fn decode_claims(&self, token: &str) -> Result<Claims, JwtError> {
        let token_data = decode::<Claims>(token, &self.keys.decoding, &self.keys.validation)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::ExpiredToken,
                jsonwebtoken::errors::ErrorKind::InvalidSignature => JwtError::InvalidSignature,
                _ => JwtError::InvalidToken,
            })?;

        if Uuid::parse_str(&token_data.claims.sub).is_err() {
            return Err(JwtError::InvalidSubject);
        }

        Ok(token_data.claims)
    }
}
