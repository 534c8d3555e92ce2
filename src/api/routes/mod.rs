pub mod error;
pub mod health;
pub mod openapi;
pub mod table;

pub use error::{ApiError, DomainFailure, ValidatedJson};
pub use table::ApiRoutes;

/// Create the service routes
pub fn create_api_router() -> ApiRoutes {
    ApiRoutes::new()
        .merge(health::health_router())
        .merge(openapi::openapi_router())
}
