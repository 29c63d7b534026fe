//! Hidden gems API handlers

use crate::auth::Principal;
use crate::error::AppError;
use crate::gems::{parse_gem_id, GemPayload};
use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use darshan_core::HiddenGem;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

/// Schema mirror of `HiddenGem` for the OpenAPI document
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct GemView {
    id: Uuid,
    user_id: Uuid,
    name: String,
    description: Option<String>,
    address: Option<String>,
    lat: Option<f64>,
    lng: Option<f64>,
    image: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    user: OwnerView,
}

#[derive(ToSchema)]
#[allow(dead_code)]
pub struct OwnerView {
    email: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct GemListResponse {
    #[schema(value_type = Vec<GemView>)]
    pub gems: Vec<HiddenGem>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct GemResponse {
    #[schema(value_type = GemView)]
    pub gem: HiddenGem,
}

/// Mutation acknowledgement; `gem` is absent after a delete
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct GemMutationResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<GemView>)]
    pub gem: Option<HiddenGem>,
}

/// List all hidden gems, newest first
#[utoipa::path(
    get,
    path = "/api/hidden-gems",
    tag = "hidden-gems",
    responses(
        (status = 200, description = "All hidden gems", body = GemListResponse),
    )
)]
pub async fn list_gems(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, AppError> {
    let gems = state.gems.list().await?;

    Ok(Json(GemListResponse { gems }))
}

/// Get a hidden gem by id
#[utoipa::path(
    get,
    path = "/api/hidden-gems/{id}",
    tag = "hidden-gems",
    params(("id" = String, Path, description = "Hidden gem id")),
    responses(
        (status = 200, description = "Hidden gem", body = GemResponse),
        (status = 404, description = "Hidden gem not found", body = crate::error::ApiError),
    )
)]
pub async fn get_gem(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let gem = state.gems.get(parse_gem_id(&id)?).await?;

    Ok(Json(GemResponse { gem }))
}

/// Create a hidden gem owned by the caller
#[utoipa::path(
    post,
    path = "/api/hidden-gems",
    tag = "hidden-gems",
    security(("bearer_auth" = [])),
    request_body = GemPayload,
    responses(
        (status = 201, description = "Hidden gem created", body = GemMutationResponse),
        (status = 400, description = "Invalid input", body = crate::error::ApiError),
        (status = 401, description = "Missing or invalid token", body = crate::error::ApiError),
    )
)]
pub async fn create_gem(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    payload: Result<Json<GemPayload>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(payload) = payload?;
    let gem = state.gems.create(&principal, payload).await?;

    Ok((
        StatusCode::CREATED,
        Json(GemMutationResponse {
            success: true,
            message: "Hidden gem created successfully".to_string(),
            gem: Some(gem),
        }),
    ))
}

/// Update a hidden gem (owner only)
#[utoipa::path(
    put,
    path = "/api/hidden-gems/{id}",
    tag = "hidden-gems",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Hidden gem id")),
    request_body = GemPayload,
    responses(
        (status = 200, description = "Hidden gem updated", body = GemMutationResponse),
        (status = 400, description = "Invalid input", body = crate::error::ApiError),
        (status = 401, description = "Missing or invalid token", body = crate::error::ApiError),
        (status = 403, description = "Not the owner", body = crate::error::ApiError),
        (status = 404, description = "Hidden gem not found", body = crate::error::ApiError),
    )
)]
pub async fn update_gem(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
    payload: Result<Json<GemPayload>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_gem_id(&id)?;

    let gem = match payload {
        Ok(Json(payload)) => state.gems.update(&principal, id, payload).await?,
        Err(rejection) => {
            // A malformed body is reported only after existence and ownership
            state.gems.authorize(&principal, id).await?;
            return Err(rejection.into());
        }
    };

    Ok(Json(GemMutationResponse {
        success: true,
        message: "Hidden gem updated successfully".to_string(),
        gem: Some(gem),
    }))
}

/// Delete a hidden gem (owner only)
#[utoipa::path(
    delete,
    path = "/api/hidden-gems/{id}",
    tag = "hidden-gems",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Hidden gem id")),
    responses(
        (status = 200, description = "Hidden gem deleted", body = GemMutationResponse),
        (status = 401, description = "Missing or invalid token", body = crate::error::ApiError),
        (status = 403, description = "Not the owner", body = crate::error::ApiError),
        (status = 404, description = "Hidden gem not found", body = crate::error::ApiError),
    )
)]
pub async fn delete_gem(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    state.gems.delete(&principal, parse_gem_id(&id)?).await?;

    Ok(Json(GemMutationResponse {
        success: true,
        message: "Hidden gem deleted successfully".to_string(),
        gem: None,
    }))
}
