//! Failure classification table.
//!
//! Every failure that reaches the error mapper resolves to exactly one
//! [`ErrorKind`]. Status code and title are constants of the kind and never
//! depend on the failure instance.

use std::fmt;

use axum::http::StatusCode;
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Lookup failure, the requested entity does not exist
    NotFound,
    /// Malformed or invalid request shape
    BadRequest,
    /// Field-level semantic validation failure
    ValidationFailed,
    /// A route matched the path but not the HTTP method
    MethodNotAllowed,
    /// No route matched the path
    RouteNotFound,
    /// Anything unclassified
    Internal,
}

impl ErrorKind {
    pub const fn status(self) -> StatusCode {
        match self {
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::BadRequest => StatusCode::BAD_REQUEST,
            ErrorKind::ValidationFailed => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorKind::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ErrorKind::RouteNotFound => StatusCode::NOT_FOUND,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub const fn title(self) -> &'static str {
        match self {
            ErrorKind::NotFound => "Resource Not Found",
            ErrorKind::BadRequest => "Bad Request",
            ErrorKind::ValidationFailed => "Validation Error",
            ErrorKind::MethodNotAllowed => "Method Not Allowed",
            ErrorKind::RouteNotFound => "Endpoint Not Found",
            ErrorKind::Internal => "Internal Server Error",
        }
    }

    /// Whether envelopes of this kind may carry a `details` map.
    pub const fn carries_details(self) -> bool {
        matches!(self, ErrorKind::NotFound | ErrorKind::ValidationFailed)
    }

    pub const fn is_internal(self) -> bool {
        matches!(self, ErrorKind::Internal)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::BadRequest => "BAD_REQUEST",
            ErrorKind::ValidationFailed => "VALIDATION_FAILED",
            ErrorKind::MethodNotAllowed => "METHOD_NOT_ALLOWED",
            ErrorKind::RouteNotFound => "ROUTE_NOT_FOUND",
            ErrorKind::Internal => "INTERNAL",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
