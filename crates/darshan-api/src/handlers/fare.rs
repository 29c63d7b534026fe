//! Cab fare estimation handler

use crate::error::AppError;
use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    response::IntoResponse,
    Json,
};
use darshan_core::FareEstimate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

/// Either a driving distance or a pickup/drop pair
///
/// `distance_km` wins when both are present.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct FareRequest {
    pub distance_km: Option<f64>,
    pub pickup: Option<Coordinates>,
    pub drop: Option<Coordinates>,
}

/// Schema mirror of `FareEstimate` for the OpenAPI document
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct FareView {
    distance_km: f64,
    fare: i64,
    currency: String,
    approximate: bool,
}

/// Estimate a cab fare
#[utoipa::path(
    post,
    path = "/api/fare/estimate",
    tag = "fare",
    request_body = FareRequest,
    responses(
        (status = 200, description = "Fare estimate", body = FareView),
        (status = 400, description = "Invalid distance or coordinates", body = crate::error::ApiError),
    )
)]
pub async fn estimate_fare(
    State(state): State<Arc<AppState>>,
    request: Result<Json<FareRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(request) = request?;

    let estimate: FareEstimate = match request {
        FareRequest {
            distance_km: Some(km),
            ..
        } => state.tariff.estimate(km)?,
        FareRequest {
            pickup: Some(pickup),
            drop: Some(drop),
            ..
        } => state
            .tariff
            .estimate_between((pickup.lat, pickup.lng), (drop.lat, drop.lng))?,
        _ => {
            return Err(AppError::BadRequest(
                "Provide distance_km or both pickup and drop".to_string(),
            ))
        }
    };

    Ok(Json(estimate))
}
