//! Authentication service layer
//!
//! Business logic for sign-up, sign-in and principal lookup. Handlers only
//! parse the request and hand over to this service.

use super::jwt::TokenService;
use super::middleware::Principal;
use super::password::{validate_password_policy, CredentialHasher};
use crate::audit::{audit_log, AuditEvent, ClientInfo};
use crate::error::AppError;
use darshan_core::{DarshanError, NewUser, User, UserPublic, UserRepository};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use validator::ValidateEmail;

/// Message for every rejected sign-in, whatever the cause
pub const INVALID_CREDENTIALS: &str = "Invalid credentials";

/// Plaintext behind the hash checked when a sign-in names an unknown email
const DECOY_PASSWORD: &str = "darshan-decoy-credential";

/// Sign-up and sign-in request body
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct CredentialsRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Principal plus a freshly issued token
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    #[schema(value_type = UserView)]
    pub user: UserPublic,
    pub token: String,
}

/// Current principal
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MeResponse {
    #[schema(value_type = UserView)]
    pub user: UserPublic,
}

/// Schema mirror of `UserPublic` for the OpenAPI document
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct UserView {
    id: uuid::Uuid,
    email: String,
}

/// Check the email field; first violated rule wins
fn validate_email(email: &str) -> Result<(), AppError> {
    if email.trim().is_empty() {
        return Err(AppError::BadRequest("Email is required".to_string()));
    }
    if !email.validate_email() {
        return Err(AppError::BadRequest("Invalid email address".to_string()));
    }
    Ok(())
}

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    hasher: Arc<CredentialHasher>,
    tokens: TokenService,
    /// Hashed once so unknown emails cost the same Argon2 run as known ones
    decoy_hash: Option<Arc<str>>,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        hasher: Arc<CredentialHasher>,
        tokens: TokenService,
    ) -> Self {
        let decoy_hash = match hasher.hash(DECOY_PASSWORD) {
            Ok(hash) => Some(Arc::from(hash)),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to prepare decoy credential hash");
                None
            }
        };

        Self {
            users,
            hasher,
            tokens,
            decoy_hash,
        }
    }

    /// Register a new principal and issue its first token
    ///
    /// # Returns
    ///
    /// * `Ok(AuthResponse)` - Newly created principal and token
    /// * `Err(AppError)` - 400 on validation, 409 on a taken email
    pub async fn sign_up(
        &self,
        request: CredentialsRequest,
        client: &ClientInfo,
    ) -> Result<AuthResponse, AppError> {
        let email = request.email.trim().to_string();

        let checked = validate_email(&email).and_then(|()| {
            validate_password_policy(&request.password).map_err(AppError::BadRequest)
        });
        if let Err(err) = checked {
            self.audit_sign_up_failure(&email, &err, client);
            return Err(err);
        }

        if self.users.find_by_email(&email).await?.is_some() {
            let err = AppError::Conflict("Email already registered".to_string());
            self.audit_sign_up_failure(&email, &err, client);
            return Err(err);
        }

        let password_hash = self.hash_blocking(request.password).await?;

        // A concurrent sign-up can still win the race; the store's unique
        // constraint reports it as a conflict
        let user = match self
            .users
            .create_user(NewUser {
                email: email.clone(),
                password_hash,
            })
            .await
        {
            Ok(user) => user,
            Err(DarshanError::Conflict(msg)) => {
                let err = AppError::Conflict(msg);
                self.audit_sign_up_failure(&email, &err, client);
                return Err(err);
            }
            Err(e) => return Err(e.into()),
        };

        let token = self.issue_token(&user)?;

        audit_log(&AuditEvent::SignUpSuccess {
            user_id: user.id,
            email: user.email.clone(),
            ip_address: client.ip_address.clone(),
            user_agent: client.user_agent.clone(),
        });

        Ok(AuthResponse {
            user: user.public(),
            token,
        })
    }

    /// Exchange email and password for a token
    ///
    /// Unknown email and wrong password are indistinguishable to the caller.
    pub async fn sign_in(
        &self,
        request: CredentialsRequest,
        client: &ClientInfo,
    ) -> Result<AuthResponse, AppError> {
        let email = request.email.trim().to_string();

        validate_email(&email)?;
        if request.password.is_empty() {
            return Err(AppError::BadRequest("Password is required".to_string()));
        }

        let Some(user) = self.users.find_by_email(&email).await? else {
            if let Some(decoy) = &self.decoy_hash {
                self.verify_blocking(request.password, decoy.to_string())
                    .await?;
            }
            self.audit_sign_in_failure(&email, "unknown email", client);
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        };

        if !self
            .verify_blocking(request.password, user.password_hash.clone())
            .await?
        {
            self.audit_sign_in_failure(&email, "wrong password", client);
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        }

        let token = self.issue_token(&user)?;

        audit_log(&AuditEvent::SignInSuccess {
            user_id: user.id,
            email: user.email.clone(),
            ip_address: client.ip_address.clone(),
            user_agent: client.user_agent.clone(),
        });

        Ok(AuthResponse {
            user: user.public(),
            token,
        })
    }

    /// Look up the calling principal
    pub async fn current_user(&self, principal: &Principal) -> Result<UserPublic, AppError> {
        self.users
            .find_by_id(principal.user_id)
            .await?
            .map(|user| user.public())
            .ok_or_else(|| AppError::NotFound("User".to_string()))
    }

    fn issue_token(&self, user: &User) -> Result<String, AppError> {
        self.tokens
            .issue(user.id)
            .map_err(|e| AppError::Internal(format!("Failed to issue token: {e}")))
    }

    async fn hash_blocking(&self, password: String) -> Result<String, AppError> {
        let hasher = Arc::clone(&self.hasher);
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| AppError::Internal(format!("Hashing task failed: {e}")))?
            .map_err(|e| AppError::Internal(e.to_string()))
    }

    async fn verify_blocking(&self, password: String, hash: String) -> Result<bool, AppError> {
        let hasher = Arc::clone(&self.hasher);
        tokio::task::spawn_blocking(move || hasher.verify(&password, &hash))
            .await
            .map_err(|e| AppError::Internal(format!("Verification task failed: {e}")))?
            .map_err(|e| AppError::Internal(e.to_string()))
    }

    fn audit_sign_up_failure(&self, email: &str, err: &AppError, client: &ClientInfo) {
        audit_log(&AuditEvent::SignUpFailure {
            email: email.to_string(),
            reason: err.to_string(),
            ip_address: client.ip_address.clone(),
            user_agent: client.user_agent.clone(),
        });
    }

    fn audit_sign_in_failure(&self, email: &str, reason: &str, client: &ClientInfo) {
        audit_log(&AuditEvent::SignInFailure {
            email: email.to_string(),
            reason: reason.to_string(),
            ip_address: client.ip_address.clone(),
            user_agent: client.user_agent.clone(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::JwtConfig;
    use crate::auth::password::PasswordConfig;
    use axum::http::StatusCode;
    use darshan_core::MemoryStore;

    fn service() -> (AuthService, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let hasher = CredentialHasher::new(&PasswordConfig::insecure_fast()).unwrap();
        let tokens = TokenService::new(JwtConfig::new("service-test-secret-service-test"));
        (
            AuthService::new(store.clone(), Arc::new(hasher), tokens),
            store,
        )
    }

    fn creds(email: &str, password: &str) -> CredentialsRequest {
        CredentialsRequest {
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn test_sign_up_then_sign_in() {
        let (auth, _) = service();
        let client = ClientInfo::default();

        let signed_up = auth.sign_up(creds("a@x.com", "secret1"), &client).await.unwrap();
        assert_eq!(signed_up.user.email, "a@x.com");
        assert!(!signed_up.token.is_empty());

        let signed_in = auth.sign_in(creds("a@x.com", "secret1"), &client).await.unwrap();
        assert_eq!(signed_in.user.id, signed_up.user.id);
    }

    #[tokio::test]
    async fn test_sign_up_validation_order() {
        let (auth, store) = service();
        let client = ClientInfo::default();

        let err = auth.sign_up(creds("", ""), &client).await.unwrap_err();
        assert_eq!(err.to_string(), "Email is required");

        let err = auth.sign_up(creds("not-an-email", "x"), &client).await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid email address");

        let err = auth.sign_up(creds("a@x.com", "12345"), &client).await.unwrap_err();
        assert_eq!(err.to_string(), "Password must be at least 6 characters");
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        assert_eq!(store.user_count().await, 0);
    }

    #[tokio::test]
    async fn test_duplicate_sign_up_is_conflict() {
        let (auth, store) = service();
        let client = ClientInfo::default();

        auth.sign_up(creds("a@x.com", "secret1"), &client).await.unwrap();
        let err = auth
            .sign_up(creds("a@x.com", "another1"), &client)
            .await
            .unwrap_err();

        assert_eq!(err.status(), StatusCode::CONFLICT);
        assert_eq!(store.user_count().await, 1);
    }

    #[tokio::test]
    async fn test_sign_in_failures_are_identical() {
        let (auth, _) = service();
        let client = ClientInfo::default();
        auth.sign_up(creds("a@x.com", "secret1"), &client).await.unwrap();

        let wrong_password = auth
            .sign_in(creds("a@x.com", "secret2"), &client)
            .await
            .unwrap_err();
        let unknown_email = auth
            .sign_in(creds("b@x.com", "secret1"), &client)
            .await
            .unwrap_err();

        assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(wrong_password.to_string(), unknown_email.to_string());
        assert_eq!(wrong_password.to_string(), INVALID_CREDENTIALS);
    }

    #[tokio::test]
    async fn test_unknown_email_is_checked_against_decoy_hash() {
        let (auth, _) = service();

        let decoy = auth.decoy_hash.clone().expect("decoy hash prepared");
        assert!(decoy.starts_with("$argon2id$"));
        assert!(auth.hasher.verify(DECOY_PASSWORD, &decoy).unwrap());

        // Even the decoy plaintext does not sign in an unknown email
        let err = auth
            .sign_in(creds("ghost@x.com", DECOY_PASSWORD), &ClientInfo::default())
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(err.to_string(), INVALID_CREDENTIALS);
    }

    #[tokio::test]
    async fn test_stored_hash_is_not_plaintext() {
        let (auth, store) = service();
        auth.sign_up(creds("a@x.com", "secret1"), &ClientInfo::default())
            .await
            .unwrap();

        let user = store.find_by_email("a@x.com").await.unwrap().unwrap();
        assert!(user.password_hash.starts_with("$argon2id$"));
        assert!(!user.password_hash.contains("secret1"));
    }

    #[tokio::test]
    async fn test_current_user_missing_principal() {
        let (auth, _) = service();
        let principal = Principal {
            user_id: uuid::Uuid::new_v4(),
        };

        let err = auth.current_user(&principal).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }
}
