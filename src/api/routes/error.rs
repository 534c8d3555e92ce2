//! API error handling utilities.
//!
//! Handlers return [`ApiError`]; the error-mapping middleware turns it into an
//! [`ErrorEnvelope`](crate::models::ErrorEnvelope) once the request context is
//! known. Anything that is not an `ApiError` goes through [`classify`] and
//! falls through to [`ErrorKind::Internal`] when unrecognised.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::Method,
    response::{IntoResponse, Response},
};
use axum_extra::extract::WithRejection;
use thiserror::Error;

use crate::models::{DetailValue, Details, ErrorKind};

/// JSON body extractor whose rejections are rendered as `BadRequest` envelopes.
pub type ValidatedJson<T> = WithRejection<Json<T>, ApiError>;

/// Capability set every failure consumed by the error mapper exposes.
pub trait DomainFailure: fmt::Debug + fmt::Display + Send + Sync {
    fn kind(&self) -> ErrorKind;

    /// Human readable message for the caller.
    fn message(&self) -> String {
        self.to_string()
    }

    /// Structured context, only honoured for kinds that carry details.
    fn details(&self) -> Option<Details> {
        None
    }
}

/// The entity a failed lookup was looking for.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceRef {
    pub resource_name: String,
    pub field_name: Option<String>,
    pub field_value: DetailValue,
}

/// API error raised by handlers and the routing layer.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    #[error("{message}")]
    NotFound {
        message: String,
        resource: Option<ResourceRef>,
    },
    #[error("{0}")]
    BadRequest(String),
    #[error("{message}")]
    Validation {
        message: String,
        errors: Option<BTreeMap<String, String>>,
    },
    #[error(
        "Method '{method}' is not supported for this request. Supported methods: {}",
        join_methods(.allowed)
    )]
    MethodNotAllowed { method: Method, allowed: Vec<Method> },
    #[error("Endpoint '{method} {url}' not found")]
    RouteNotFound { method: Method, url: String },
    #[error("internal error: {0:#}")]
    Internal(Arc<anyhow::Error>),
}

fn join_methods(methods: &[Method]) -> String {
    methods
        .iter()
        .map(Method::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

impl ApiError {
    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound {
            message: message.into(),
            resource: None,
        }
    }

    /// Lookup failure attributable to a specific field, e.g. `User` by `id`.
    pub fn resource_not_found(
        resource_name: impl Into<String>,
        field_name: impl Into<String>,
        field_value: impl Into<DetailValue>,
    ) -> Self {
        let resource = ResourceRef {
            resource_name: resource_name.into(),
            field_name: Some(field_name.into()),
            field_value: field_value.into(),
        };
        ApiError::NotFound {
            message: format!(
                "{} not found with {}: '{}'",
                resource.resource_name,
                resource.field_name.as_deref().unwrap_or_default(),
                resource.field_value
            ),
            resource: Some(resource),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation {
            message: message.into(),
            errors: None,
        }
    }

    pub fn validation_with_errors<K, V>(
        message: impl Into<String>,
        errors: impl IntoIterator<Item = (K, V)>,
    ) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        ApiError::Validation {
            message: message.into(),
            errors: Some(
                errors
                    .into_iter()
                    .map(|(field, violation)| (field.into(), violation.into()))
                    .collect(),
            ),
        }
    }

    pub fn method_not_allowed(method: Method, allowed: Vec<Method>) -> Self {
        ApiError::MethodNotAllowed { method, allowed }
    }

    pub fn route_not_found(method: Method, url: impl Into<String>) -> Self {
        ApiError::RouteNotFound {
            method,
            url: url.into(),
        }
    }

    pub fn internal(error: impl Into<anyhow::Error>) -> Self {
        ApiError::Internal(Arc::new(error.into()))
    }
}

impl DomainFailure for ApiError {
    fn kind(&self) -> ErrorKind {
        match self {
            ApiError::NotFound { .. } => ErrorKind::NotFound,
            ApiError::BadRequest(_) => ErrorKind::BadRequest,
            ApiError::Validation { .. } => ErrorKind::ValidationFailed,
            ApiError::MethodNotAllowed { .. } => ErrorKind::MethodNotAllowed,
            ApiError::RouteNotFound { .. } => ErrorKind::RouteNotFound,
            ApiError::Internal(_) => ErrorKind::Internal,
        }
    }

    fn details(&self) -> Option<Details> {
        match self {
            ApiError::NotFound {
                resource: Some(resource),
                ..
            } => {
                let mut details = Details::new();
                details.insert(
                    "resourceName".to_string(),
                    resource.resource_name.clone().into(),
                );
                details.insert(
                    "fieldName".to_string(),
                    resource.field_name.clone().into(),
                );
                details.insert("fieldValue".to_string(), resource.field_value.clone());
                Some(details)
            }
            ApiError::Validation {
                errors: Some(errors),
                ..
            } => {
                let mut details = Details::new();
                details.insert("validationErrors".to_string(), errors.clone().into());
                Some(details)
            }
            _ => None,
        }
    }
}

/// Ordered classification of an opaque error.
///
/// An `ApiError` keeps its own kind, extractor rejections are bad requests,
/// everything else is internal.
pub fn classify(error: anyhow::Error) -> ApiError {
    let error = match error.downcast::<ApiError>() {
        Ok(api_error) => return api_error,
        Err(error) => error,
    };
    let error = match error.downcast::<JsonRejection>() {
        Ok(rejection) => return rejection.into(),
        Err(error) => error,
    };
    let error = match error.downcast::<PathRejection>() {
        Ok(rejection) => return rejection.into(),
        Err(error) => error,
    };
    let error = match error.downcast::<QueryRejection>() {
        Ok(rejection) => return rejection.into(),
        Err(error) => error,
    };
    ApiError::Internal(Arc::new(error))
}

impl From<anyhow::Error> for ApiError {
    fn from(error: anyhow::Error) -> Self {
        classify(error)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

/// Failure waiting for the error-mapping middleware to render it.
#[derive(Debug, Clone)]
pub struct PendingFailure(pub Arc<ApiError>);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut response = self.kind().status().into_response();
        response
            .extensions_mut()
            .insert(PendingFailure(Arc::new(self)));
        response
    }
}
