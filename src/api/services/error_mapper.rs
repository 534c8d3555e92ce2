//! Error mapper: classifies a failure, logs it once and renders the envelope.
//!
//! The mapper is stateless apart from its clock and is shared by every request.

use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::ConnectInfo,
    http::{Method, Request, Uri},
    response::{IntoResponse, Response},
};
use tracing::{error, warn};

use super::clock::{Clock, SystemClock};
use crate::models::{ErrorEnvelope, ErrorKind};
use crate::routes::error::DomainFailure;

/// Message returned for every internal failure.
pub const INTERNAL_ERROR_MESSAGE: &str = "An internal server error occurred";

/// Prefix the transport puts in front of the path in a request description.
pub const URI_PREFIX: &str = "uri=";

/// Request metadata supplied by the routing layer.
#[derive(Debug, Clone)]
pub struct RequestContext {
    method: Method,
    url: String,
    description: String,
}

impl RequestContext {
    pub fn new(method: Method, uri: &Uri) -> Self {
        Self {
            method,
            url: uri.to_string(),
            description: format!("{URI_PREFIX}{}", uri.path()),
        }
    }

    pub fn with_description(
        method: Method,
        url: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            method,
            url: url.into(),
            description: description.into(),
        }
    }

    /// Append the remote address to the description, `uri=/x;client=1.2.3.4`.
    pub fn with_client(mut self, client: SocketAddr) -> Self {
        self.description = format!("{};client={}", self.description, client.ip());
        self
    }

    pub fn from_request<B>(request: &Request<B>) -> Self {
        let context = Self::new(request.method().clone(), request.uri());
        match request.extensions().get::<ConnectInfo<SocketAddr>>() {
            Some(ConnectInfo(client)) => context.with_client(*client),
            None => context,
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Raw request path, without the description annotations.
    pub fn path(&self) -> &str {
        extract_path(&self.description)
    }
}

/// Strip the `uri=` prefix and any `;key=value` attributes from a description.
pub fn extract_path(description: &str) -> &str {
    let raw = description.strip_prefix(URI_PREFIX).unwrap_or(description);
    raw.split(';').next().unwrap_or(raw)
}

/// Message exposed to the caller for `failure`.
pub fn render_message(failure: &dyn DomainFailure) -> String {
    match failure.kind() {
        ErrorKind::Internal => INTERNAL_ERROR_MESSAGE.to_string(),
        _ => failure.message(),
    }
}

#[derive(Clone)]
pub struct ErrorMapper {
    clock: Arc<dyn Clock>,
}

impl ErrorMapper {
    pub fn new(clock: impl Clock + 'static) -> Self {
        Self {
            clock: Arc::new(clock),
        }
    }

    pub fn system() -> Self {
        Self::new(SystemClock)
    }

    /// Build the envelope without logging.
    pub fn render(&self, failure: &dyn DomainFailure, context: &RequestContext) -> ErrorEnvelope {
        let kind = failure.kind();
        let details = if kind.carries_details() {
            failure.details()
        } else {
            None
        };
        ErrorEnvelope::new(
            kind,
            render_message(failure),
            context.path(),
            self.clock.now(),
            details,
        )
    }

    /// Render the envelope and emit the single log event for this failure.
    pub fn handle(&self, failure: &dyn DomainFailure, context: &RequestContext) -> ErrorEnvelope {
        let envelope = self.render(failure, context);
        log_failure(failure, &envelope, context);
        envelope
    }

    pub fn respond(&self, failure: &dyn DomainFailure, context: &RequestContext) -> Response {
        self.handle(failure, context).into_response()
    }
}

impl Default for ErrorMapper {
    fn default() -> Self {
        Self::system()
    }
}

impl fmt::Debug for ErrorMapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorMapper").finish_non_exhaustive()
    }
}

fn log_failure(failure: &dyn DomainFailure, envelope: &ErrorEnvelope, context: &RequestContext) {
    if envelope.kind().is_internal() {
        error!(
            method = %context.method(),
            path = envelope.path(),
            error = ?failure,
            "Internal server error: {}",
            failure
        );
    } else {
        warn!(
            kind = %envelope.kind(),
            method = %context.method(),
            path = envelope.path(),
            "{}: {}",
            envelope.title(),
            envelope.message()
        );
    }
}
