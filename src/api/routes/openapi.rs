//! OpenAPI specification endpoint.

use axum::{http::Method, response::Json};
use utoipa::OpenApi;

use super::ApiRoutes;
use super::super::openapi::ApiDoc;

/// Create the OpenAPI router
pub fn openapi_router() -> ApiRoutes {
    ApiRoutes::new().route("/openapi.json", Method::GET, serve_openapi_json)
}

/// GET /openapi.json - Serve the OpenAPI specification as JSON
#[utoipa::path(
    get,
    path = "/openapi.json",
    tag = "OpenAPI",
    responses(
        (status = 200, description = "OpenAPI specification", body = Object)
    )
)]
pub async fn serve_openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
