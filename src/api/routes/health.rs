//! Health check route.

use axum::{http::Method, response::Json};
use serde::Serialize;
use utoipa::ToSchema;

use super::ApiRoutes;

/// Create the health router
pub fn health_router() -> ApiRoutes {
    ApiRoutes::new().route("/health", Method::GET, health_check)
}

/// Health check response
#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
}

/// GET /health - Service liveness
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is up", body = HealthResponse),
        (status = 405, description = "Method not allowed", body = crate::models::ErrorEnvelope),
        (status = 500, description = "Internal server error", body = crate::models::ErrorEnvelope)
    )
)]
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        service: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
