//! API route definitions

use crate::auth::middleware::auth_middleware;
use crate::handlers::{auth, fare, hidden_gems};
use crate::state::AppState;
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;

/// Routes mounted under `/api`
///
/// Protected routes sit behind [`auth_middleware`]; public routes never see it.
pub fn api_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    // Public routes (no authentication required)
    let public_routes = Router::new()
        .route("/auth/signup", post(auth::signup_handler))
        .route("/auth/signin", post(auth::signin_handler))
        .route("/hidden-gems", get(hidden_gems::list_gems))
        .route("/hidden-gems/:id", get(hidden_gems::get_gem))
        .route("/fare/estimate", post(fare::estimate_fare));

    // Protected routes (authentication required)
    let protected_routes = Router::new()
        .route("/auth/me", get(auth::me_handler))
        .route("/hidden-gems", post(hidden_gems::create_gem))
        .route(
            "/hidden-gems/:id",
            axum::routing::put(hidden_gems::update_gem).delete(hidden_gems::delete_gem),
        )
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    Router::new().merge(public_routes).merge(protected_routes)
}
