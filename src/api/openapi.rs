//! OpenAPI specification definition.
//!
//! Aggregates route handlers and the shared error envelope schema.

use utoipa::{Modify, OpenApi};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health::health_check,
        crate::routes::openapi::serve_openapi_json,
    ),
    components(schemas(
        crate::models::ErrorEnvelope,
        crate::routes::health::HealthResponse,
    )),
    modifiers(&InfoAddon),
    tags(
        (name = "Health", description = "Service liveness"),
        (name = "OpenAPI", description = "OpenAPI specification"),
    ),
    info(
        title = "Auth Service API",
        description = "API para autenticação Data Cortex",
        version = "1.0.0",
        contact(
            name = "Equipe de Desenvolvimento",
            email = "dev@chronustecnologia.com.br",
            url = "https://chronustecnologia.com.br/devs"
        ),
        license(
            name = "MIT License",
            url = "https://opensource.org/licenses/MIT"
        )
    )
)]
pub struct ApiDoc;

struct InfoAddon;

impl Modify for InfoAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.version = env!("CARGO_PKG_VERSION").to_string();
        openapi.info.terms_of_service = Some("https://chronustecnologia.com.br/terms".to_string());
    }
}
