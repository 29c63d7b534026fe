//! Authentication and authorization module
//!
//! - Argon2id credential hashing
//! - Stateless HS256 bearer tokens
//! - Middleware that turns a bearer token into a [`Principal`]
//! - Ownership checks for mutating owned resources
//! - Sign-up / sign-in service

pub mod access;
pub mod jwt;
pub mod middleware;
pub mod password;
pub mod service;

pub use access::{authorize_mutation, ensure_owner};
pub use jwt::{Claims, JwtConfig, JwtError, TokenService};
pub use middleware::{auth_middleware, authenticate, bearer_token, AuthError, Principal};
pub use password::{CredentialHasher, PasswordConfig, PasswordError, MIN_PASSWORD_LEN};
pub use service::{AuthResponse, AuthService, CredentialsRequest, MeResponse};
