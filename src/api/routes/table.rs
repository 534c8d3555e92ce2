//! Route registration that remembers which methods each path accepts.
//!
//! axum only reports the supported methods of a path through the `Allow`
//! header of its default 405 response, and that header is not available
//! to outer layers once a fallback is installed. `ApiRoutes` records the
//! table as routes are added so the 405 envelope can list them.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    Router,
    extract::{MatchedPath, Request},
    handler::Handler,
    http::Method,
    middleware::from_fn_with_state,
    routing::{MethodFilter, on},
};

use super::error::ApiError;
use crate::middleware::{map_errors, route_not_found};
use crate::services::ErrorMapper;

type MethodTable = BTreeMap<String, Vec<Method>>;

#[derive(Default)]
pub struct ApiRoutes {
    router: Router,
    methods: MethodTable,
}

impl ApiRoutes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `method` on `path`. Registering another method
    /// on the same path adds to it.
    ///
    /// # Panics
    ///
    /// Panics if `method` is an extension method axum cannot route, or on the
    /// same conditions as [`Router::route`].
    pub fn route<H, T>(mut self, path: &str, method: Method, handler: H) -> Self
    where
        H: Handler<T, ()>,
        T: 'static,
    {
        let filter = match MethodFilter::try_from(method.clone()) {
            Ok(filter) => filter,
            Err(e) => panic!("Cannot route method '{method}' on {path}: {e}"),
        };
        self.router = self.router.route(path, on(filter, handler));

        let methods = self.methods.entry(path.to_string()).or_default();
        if !methods.contains(&method) {
            methods.push(method);
        }
        self
    }

    pub fn merge(mut self, other: ApiRoutes) -> Self {
        self.router = self.router.merge(other.router);
        for (path, methods) in other.methods {
            let known = self.methods.entry(path).or_default();
            for method in methods {
                if !known.contains(&method) {
                    known.push(method);
                }
            }
        }
        self
    }

    /// Methods registered on `path`, in registration order.
    pub fn allowed_methods(&self, path: &str) -> &[Method] {
        self.methods.get(path).map(Vec::as_slice).unwrap_or_default()
    }

    /// Finish the router: unmatched paths and unsupported methods become
    /// failures, and every failure leaving it is rendered by `mapper`.
    pub fn with_error_mapping(self, mapper: ErrorMapper) -> Router {
        let methods = Arc::new(self.methods);
        self.router
            .method_not_allowed_fallback(move |request: Request| {
                let failure = method_not_allowed(&methods, &request);
                async move { failure }
            })
            .fallback(route_not_found)
            .layer(from_fn_with_state(mapper, map_errors))
    }
}

fn method_not_allowed(methods: &MethodTable, request: &Request) -> ApiError {
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map(MatchedPath::as_str)
        .unwrap_or_else(|| request.uri().path());
    let allowed = methods.get(path).cloned().unwrap_or_default();
    ApiError::method_not_allowed(request.method().clone(), allowed)
}
