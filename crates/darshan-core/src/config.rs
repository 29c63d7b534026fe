//! Darshan Configuration Management
//!
//! Handles configuration from environment variables and TOML config files
//! with sensible defaults for development.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Minimum accepted length of a token signing secret, in bytes
pub const MIN_SECRET_LEN: usize = 32;

/// Default token validity window: 7 days
pub const DEFAULT_TOKEN_TTL_SECS: u64 = 7 * 24 * 60 * 60;

/// Longest accepted token validity window (one year)
pub const MAX_TOKEN_TTL_SECS: u64 = 365 * 24 * 60 * 60;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Deployment environment
    pub environment: Environment,

    /// Server configuration
    pub server: ServerConfig,

    /// Database connection
    pub database: DatabaseConfig,

    /// Token signing configuration
    pub auth: AuthConfig,

    /// Cab fare tariff
    pub fare: FareConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_env_override()
    }

    /// Load from a TOML file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::FileReadError {
            path: path.clone(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path,
            message: e.to_string(),
        })
    }

    /// Overlay environment variables on top of this configuration (env takes precedence)
    pub fn with_env_override(mut self) -> Result<Self, ConfigError> {
        if let Ok(env) = std::env::var("APP_ENV") {
            self.environment = env.parse()?;
        }

        // Server
        if let Ok(host) = std::env::var("API_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("API_PORT").or_else(|_| std::env::var("PORT")) {
            self.server.port = parse_var("API_PORT", &port)?;
        }
        if let Ok(origins) = std::env::var("CORS_ORIGINS") {
            self.server.cors_origins = origins
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        // PostgreSQL
        if let Ok(url) = std::env::var("DATABASE_URL") {
            self.database.url = Some(url);
        }
        if let Ok(size) = std::env::var("DATABASE_POOL_SIZE") {
            self.database.pool_size = parse_var("DATABASE_POOL_SIZE", &size)?;
        }

        // Tokens
        if let Ok(secret) = std::env::var("JWT_SECRET") {
            self.auth.jwt_secret = Some(secret);
        }
        if let Ok(secs) = std::env::var("JWT_EXPIRATION_SECS") {
            self.auth.token_ttl_secs = parse_var("JWT_EXPIRATION_SECS", &secs)?;
        }
        if let Ok(issuer) = std::env::var("JWT_ISSUER") {
            self.auth.issuer = issuer;
        }

        // Fare
        if let Ok(base) = std::env::var("FARE_BASE") {
            self.fare.base_fare = parse_var("FARE_BASE", &base)?;
        }
        if let Ok(per_km) = std::env::var("FARE_PER_KM") {
            self.fare.per_km = parse_var("FARE_PER_KM", &per_km)?;
        }

        // Logging
        if let Ok(level) = std::env::var("LOG_LEVEL") {
            self.logging.level = level;
        }

        Ok(self)
    }

    /// Reject configurations that must not reach a running server
    ///
    /// Production requires a database and an explicit signing secret of at
    /// least [`MIN_SECRET_LEN`] bytes.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(secret) = &self.auth.jwt_secret {
            if secret.len() < MIN_SECRET_LEN && self.environment.is_production() {
                return Err(ConfigError::InvalidValue {
                    key: "JWT_SECRET".to_string(),
                    value: format!("<{} bytes, need at least {MIN_SECRET_LEN}>", secret.len()),
                });
            }
        }

        if self.environment.is_production() {
            if self.auth.jwt_secret.is_none() {
                return Err(ConfigError::MissingRequired("JWT_SECRET".to_string()));
            }
            if self.database.url.is_none() {
                return Err(ConfigError::MissingRequired("DATABASE_URL".to_string()));
            }
        }

        if self.auth.token_ttl_secs == 0 || self.auth.token_ttl_secs > MAX_TOKEN_TTL_SECS {
            return Err(ConfigError::InvalidValue {
                key: "JWT_EXPIRATION_SECS".to_string(),
                value: self.auth.token_ttl_secs.to_string(),
            });
        }

        if !self.fare.base_fare.is_finite()
            || !self.fare.per_km.is_finite()
            || self.fare.base_fare < 0.0
            || self.fare.per_km < 0.0
        {
            return Err(ConfigError::InvalidValue {
                key: "FARE_BASE/FARE_PER_KM".to_string(),
                value: format!("{}/{}", self.fare.base_fare, self.fare.per_km),
            });
        }

        Ok(())
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}

/// Deployment environment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

impl std::str::FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            _ => Err(ConfigError::InvalidValue {
                key: "APP_ENV".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Production => write!(f, "production"),
        }
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Allowed origins for CORS; empty means any origin
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            cors_origins: vec![],
        }
    }
}

/// Database connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL; `None` selects the in-memory store
    pub url: Option<String>,

    /// PostgreSQL connection pool size
    pub pool_size: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            pool_size: 5,
        }
    }
}

/// Token signing configuration
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HMAC signing secret; required in production
    pub jwt_secret: Option<String>,

    /// Token validity window in seconds
    pub token_ttl_secs: u64,

    /// Issuer claim written into and required from every token
    pub issuer: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            token_ttl_secs: DEFAULT_TOKEN_TTL_SECS,
            issuer: "darshan-api".to_string(),
        }
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &self.jwt_secret.as_ref().map(|_| "<redacted>"))
            .field("token_ttl_secs", &self.token_ttl_secs)
            .field("issuer", &self.issuer)
            .finish()
    }
}

/// Cab fare tariff in rupees
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FareConfig {
    pub base_fare: f64,
    pub per_km: f64,
}

impl Default for FareConfig {
    fn default() -> Self {
        Self {
            base_fare: 50.0,
            per_km: 12.0,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// JSON format for logs
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "debug".to_string(),
            json_format: false,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.auth.token_ttl_secs, 604_800);
        assert_eq!(config.environment, Environment::Development);
        assert!(config.database.url.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_environment_parse() {
        assert_eq!(
            "production".parse::<Environment>().unwrap(),
            Environment::Production
        );
        assert_eq!("DEV".parse::<Environment>().unwrap(), Environment::Development);
        assert!("staging".parse::<Environment>().is_err());
    }

    #[test]
    fn test_production_requires_secret() {
        let mut config = AppConfig {
            environment: Environment::Production,
            ..Default::default()
        };
        config.database.url = Some("postgres://localhost/darshan".to_string());

        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::MissingRequired(ref k) if k == "JWT_SECRET"));

        config.auth.jwt_secret = Some("too-short".to_string());
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { .. })
        ));

        config.auth.jwt_secret = Some("x".repeat(MIN_SECRET_LEN));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_production_requires_database() {
        let mut config = AppConfig {
            environment: Environment::Production,
            ..Default::default()
        };
        config.auth.jwt_secret = Some("s".repeat(48));

        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingRequired(ref k)) if k == "DATABASE_URL"
        ));
    }

    #[test]
    fn test_development_allows_missing_secret() {
        let config = AppConfig::default();
        assert!(config.auth.jwt_secret.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_token_ttl_bounds() {
        let mut config = AppConfig::default();

        config.auth.token_ttl_secs = 0;
        assert!(config.validate().is_err());

        config.auth.token_ttl_secs = u64::MAX;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { ref key, .. }) if key == "JWT_EXPIRATION_SECS"
        ));

        config.auth.token_ttl_secs = MAX_TOKEN_TTL_SECS;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_negative_tariff_rejected() {
        let mut config = AppConfig::default();
        config.fare.per_km = -1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_parse() {
        let raw = r#"
            environment = "production"

            [server]
            port = 9000

            [auth]
            issuer = "darshan-test"
        "#;
        let config: AppConfig = toml::from_str(raw).unwrap();
        assert_eq!(config.environment, Environment::Production);
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.auth.issuer, "darshan-test");
        assert_eq!(config.auth.token_ttl_secs, 604_800);
    }

    #[test]
    fn test_secret_is_redacted_in_debug() {
        let auth = AuthConfig {
            jwt_secret: Some("super-secret-value".to_string()),
            ..Default::default()
        };
        let rendered = format!("{auth:?}");
        assert!(!rendered.contains("super-secret-value"));
        assert!(rendered.contains("<redacted>"));
    }
}
