/// Authentication middleware for protecting routes
///
/// Extracts and verifies the bearer token from the Authorization header.
/// On success, adds the [`Principal`] to request extensions; on failure the
/// request is answered with 401 and never reaches the handler.
use super::jwt::TokenService;
use crate::audit::{audit_log, AuditEvent, ClientInfo};
use crate::error::ApiError;
use crate::state::AppState;
use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// Identity established by a verified token
///
/// Handlers take it via `Extension<Principal>` and pass it explicitly to
/// any service call that needs to know who is acting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub user_id: Uuid,
}

/// Authentication middleware errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    /// Header absent, not valid ASCII, wrong scheme or empty token
    #[error("No token provided")]
    MissingToken,

    /// Signature, expiry, issuer or subject check failed
    #[error("Invalid or expired token")]
    InvalidToken,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        (
            StatusCode::UNAUTHORIZED,
            Json(ApiError::unauthorized(self.to_string())),
        )
            .into_response()
    }
}

/// Pull the token out of an `Authorization: Bearer <token>` header
///
/// The scheme is matched case-insensitively.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();

    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return None;
    }

    Some(token)
}

/// Resolve the principal for a request, without touching the response
pub fn authenticate(tokens: &TokenService, headers: &HeaderMap) -> Result<Principal, AuthError> {
    let token = bearer_token(headers).ok_or(AuthError::MissingToken)?;

    match tokens.decode_claims(token) {
        Ok(claims) => Uuid::parse_str(&claims.sub)
            .map(|user_id| Principal { user_id })
            .map_err(|_| AuthError::InvalidToken),
        Err(e) => {
            let client = ClientInfo::from_headers(headers);
            audit_log(&AuditEvent::InvalidToken {
                ip_address: client.ip_address,
                user_agent: client.user_agent,
                reason: e.to_string(),
            });
            Err(AuthError::InvalidToken)
        }
    }
}

/// Authentication middleware that requires a valid bearer token
///
/// # Usage
///
/// ```ignore
/// use axum::{middleware, routing::post, Router};
/// use darshan_api::auth::middleware::auth_middleware;
///
/// let protected = Router::new()
///     .route("/hidden-gems", post(create_gem))
///     .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));
/// ```
///
/// In handlers, extract the principal:
///
/// ```ignore
/// use axum::Extension;
/// use darshan_api::auth::Principal;
///
/// async fn create_gem(Extension(principal): Extension<Principal>) -> String {
///     principal.user_id.to_string()
/// }
/// ```
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AuthError> {
    let principal = authenticate(&state.tokens, request.headers())?;

    tracing::debug!(user_id = %principal.user_id, "Authenticated request");
    request.extensions_mut().insert(principal);

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::JwtConfig;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    fn tokens() -> TokenService {
        TokenService::new(JwtConfig::new("middleware-test-secret-middleware-test"))
    }

    #[test]
    fn test_bearer_token_extraction() {
        assert_eq!(bearer_token(&headers("Bearer abc.def.ghi")), Some("abc.def.ghi"));
        assert_eq!(bearer_token(&headers("bearer abc")), Some("abc"));
        assert_eq!(bearer_token(&headers("BEARER  abc ")), Some("abc"));
        assert_eq!(bearer_token(&headers("Basic dXNlcjpwYXNz")), None);
        assert_eq!(bearer_token(&headers("Bearer")), None);
        assert_eq!(bearer_token(&headers("Bearer ")), None);
        assert_eq!(bearer_token(&headers("abc.def.ghi")), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }

    #[test]
    fn test_authenticate_valid_token() {
        let tokens = tokens();
        let user_id = Uuid::new_v4();
        let token = tokens.issue(user_id).unwrap();

        let principal = authenticate(&tokens, &headers(&format!("Bearer {token}"))).unwrap();
        assert_eq!(principal.user_id, user_id);
    }

    #[test]
    fn test_authenticate_missing_vs_invalid() {
        let tokens = tokens();

        assert_eq!(
            authenticate(&tokens, &HeaderMap::new()),
            Err(AuthError::MissingToken)
        );
        assert_eq!(
            authenticate(&tokens, &headers("Token abc")),
            Err(AuthError::MissingToken)
        );
        assert_eq!(
            authenticate(&tokens, &headers("Bearer not-a-jwt")),
            Err(AuthError::InvalidToken)
        );

        let foreign = TokenService::new(JwtConfig::new("some-other-secret-some-other-secret"))
            .issue(Uuid::new_v4())
            .unwrap();
        assert_eq!(
            authenticate(&tokens, &headers(&format!("Bearer {foreign}"))),
            Err(AuthError::InvalidToken)
        );
    }

    #[tokio::test]
    async fn test_auth_error_response() {
        let response = AuthError::MissingToken.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["error"], "No token provided");
        assert_eq!(json["code"], "UNAUTHORIZED");
    }
}
