//! Error-mapping middleware.
//!
//! Sits between the router and the transport. Every failure leaving the
//! router is rendered here exactly once:
//! - `ApiError` values returned by handlers or the fallback
//! - handler panics, as `Internal`
//! - error responses produced without an envelope, such as extractor
//!   rejections, bare status codes and axum's default `405`

use std::any::Any;
use std::panic::AssertUnwindSafe;

use axum::{
    body::to_bytes,
    extract::{OriginalUri, Request, State},
    http::{HeaderMap, Method, StatusCode, header},
    middleware::Next,
    response::Response,
};
use futures_util::FutureExt;

use crate::models::RenderedEnvelope;
use crate::routes::error::{ApiError, PendingFailure};
use crate::services::error_mapper::{ErrorMapper, RequestContext};

/// Largest error body read back to build a message from.
const MAX_ERROR_BODY: usize = 64 * 1024;

tokio::task_local! {
    static MAPPED_REQUEST: ();
}

pub async fn map_errors(State(mapper): State<ErrorMapper>, request: Request, next: Next) -> Response {
    let context = RequestContext::from_request(&request);

    let outcome = MAPPED_REQUEST
        .scope((), AssertUnwindSafe(next.run(request)).catch_unwind())
        .await;
    let mut response = match outcome {
        Ok(response) => response,
        Err(panic) => return mapper.respond(&panic_failure(panic), &context),
    };

    if let Some(PendingFailure(failure)) = response.extensions_mut().remove::<PendingFailure>() {
        return mapper.respond(failure.as_ref(), &context);
    }

    let status = response.status();
    if !(status.is_client_error() || status.is_server_error())
        || response.extensions().get::<RenderedEnvelope>().is_some()
    {
        return response;
    }

    let failure = unmapped_failure(&context, response).await;
    mapper.respond(&failure, &context)
}

/// True while a panic raised on this task will be caught and rendered by
/// [`map_errors`].
pub fn panic_is_mapped() -> bool {
    MAPPED_REQUEST.try_with(|_| ()).is_ok()
}

/// Router fallback for requests no route matched.
pub async fn route_not_found(method: Method, OriginalUri(uri): OriginalUri) -> ApiError {
    ApiError::route_not_found(method, uri.path())
}

/// Classify an error response that carries no envelope.
async fn unmapped_failure(context: &RequestContext, response: Response) -> ApiError {
    let status = response.status();
    if status == StatusCode::METHOD_NOT_ALLOWED {
        return ApiError::method_not_allowed(
            context.method().clone(),
            allowed_methods(response.headers()),
        );
    }

    let text = response_text(response).await;
    if status == StatusCode::NOT_FOUND {
        ApiError::not_found(text)
    } else if status.is_server_error() {
        ApiError::internal(anyhow::anyhow!("handler returned {status}: {text}"))
    } else {
        ApiError::bad_request(text)
    }
}

/// Body of `response` as text, or the status reason when the body is empty.
async fn response_text(response: Response) -> String {
    let status = response.status();
    let text = match to_bytes(response.into_body(), MAX_ERROR_BODY).await {
        Ok(bytes) => String::from_utf8_lossy(&bytes).trim().to_string(),
        Err(_) => String::new(),
    };
    if text.is_empty() {
        status.canonical_reason().unwrap_or("Request failed").to_string()
    } else {
        text
    }
}

/// Methods listed in an `Allow` header, in header order. `HEAD` is dropped
/// when `GET` is listed, since axum adds it implicitly.
pub fn allowed_methods(headers: &HeaderMap) -> Vec<Method> {
    let methods: Vec<Method> = headers
        .get_all(header::ALLOW)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .map(str::trim)
        .filter(|method| !method.is_empty())
        .filter_map(|method| method.parse().ok())
        .collect();

    if methods.contains(&Method::GET) {
        methods.into_iter().filter(|method| *method != Method::HEAD).collect()
    } else {
        methods
    }
}

/// Text of a panic payload.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

fn panic_failure(panic: Box<dyn Any + Send>) -> ApiError {
    ApiError::internal(anyhow::anyhow!("handler panicked: {}", panic_message(panic.as_ref())))
}
