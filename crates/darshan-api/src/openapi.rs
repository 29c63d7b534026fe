//! OpenAPI document served alongside Swagger UI

use crate::auth::service::UserView;
use crate::auth::{AuthResponse, CredentialsRequest, MeResponse};
use crate::error::ApiError;
use crate::gems::GemPayload;
use crate::handlers::fare::{Coordinates, FareRequest, FareView};
use crate::handlers::health::HealthResponse;
use crate::handlers::hidden_gems::{
    GemListResponse, GemMutationResponse, GemResponse, GemView, OwnerView,
};
use crate::handlers::{auth, fare, health, hidden_gems};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

#[derive(OpenApi)]
#[openapi(
    info(title = "Dilli Darshan API", description = "Accounts, hidden gems and cab fares"),
    paths(
        health::health_check,
        auth::signup_handler,
        auth::signin_handler,
        auth::me_handler,
        hidden_gems::list_gems,
        hidden_gems::get_gem,
        hidden_gems::create_gem,
        hidden_gems::update_gem,
        hidden_gems::delete_gem,
        fare::estimate_fare,
    ),
    components(schemas(
        ApiError,
        HealthResponse,
        CredentialsRequest,
        AuthResponse,
        MeResponse,
        UserView,
        GemPayload,
        GemView,
        OwnerView,
        GemListResponse,
        GemResponse,
        GemMutationResponse,
        FareRequest,
        Coordinates,
        FareView,
    )),
    modifiers(&BearerAuth),
    tags(
        (name = "health", description = "Liveness"),
        (name = "auth", description = "Sign-up, sign-in and current user"),
        (name = "hidden-gems", description = "Community-submitted places"),
        (name = "fare", description = "Cab fare estimates"),
    )
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
