//! Error envelope returned to API callers.
//!
//! Every failure rendered by the error mapper produces exactly one
//! [`ErrorEnvelope`]. The envelope is immutable: fields are private, there is
//! a single constructor, and `status`/`title` come from the [`ErrorKind`].

use std::collections::BTreeMap;
use std::fmt;

use axum::{
    Json,
    response::{IntoResponse, Response},
};
use chrono::{NaiveDateTime, Timelike};
use serde::{Serialize, Serializer};
use utoipa::ToSchema;

use super::error_kind::ErrorKind;

/// Wire format of `timestamp`: second precision, no timezone suffix.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Structured context attached to an envelope.
pub type Details = BTreeMap<String, DetailValue>;

/// Value of a `details` entry.
///
/// Serialized untagged, so callers see plain JSON scalars and objects.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DetailValue {
    Null,
    Bool(bool),
    Integer(i64),
    Text(String),
    Map(BTreeMap<String, DetailValue>),
}

impl fmt::Display for DetailValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DetailValue::Null => f.write_str("null"),
            DetailValue::Bool(value) => write!(f, "{value}"),
            DetailValue::Integer(value) => write!(f, "{value}"),
            DetailValue::Text(value) => f.write_str(value),
            DetailValue::Map(entries) => {
                f.write_str("{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                f.write_str("}")
            }
        }
    }
}

impl From<&str> for DetailValue {
    fn from(value: &str) -> Self {
        DetailValue::Text(value.to_string())
    }
}

impl From<String> for DetailValue {
    fn from(value: String) -> Self {
        DetailValue::Text(value)
    }
}

impl From<bool> for DetailValue {
    fn from(value: bool) -> Self {
        DetailValue::Bool(value)
    }
}

impl From<i32> for DetailValue {
    fn from(value: i32) -> Self {
        DetailValue::Integer(i64::from(value))
    }
}

impl From<i64> for DetailValue {
    fn from(value: i64) -> Self {
        DetailValue::Integer(value)
    }
}

impl From<u32> for DetailValue {
    fn from(value: u32) -> Self {
        DetailValue::Integer(i64::from(value))
    }
}

impl<T: Into<DetailValue>> From<Option<T>> for DetailValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(DetailValue::Null, Into::into)
    }
}

impl From<BTreeMap<String, String>> for DetailValue {
    fn from(entries: BTreeMap<String, String>) -> Self {
        DetailValue::Map(
            entries
                .into_iter()
                .map(|(key, value)| (key, DetailValue::Text(value)))
                .collect(),
        )
    }
}

/// Standardized API error response
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ErrorEnvelope {
    #[serde(skip)]
    kind: ErrorKind,
    /// HTTP error title
    #[schema(value_type = String, example = "Resource Not Found")]
    title: &'static str,
    /// Error message
    message: String,
    /// Request path
    #[schema(example = "/api/v1/users/42")]
    path: String,
    /// HTTP status code
    #[schema(example = 404)]
    status: u16,
    /// Date and time of the failure
    #[serde(serialize_with = "serialize_timestamp")]
    #[schema(value_type = String, example = "2025-01-15T10:30:00")]
    timestamp: NaiveDateTime,
    /// Additional error details
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    details: Option<Details>,
}

impl ErrorEnvelope {
    /// Build the envelope for `kind`.
    ///
    /// `details` is dropped for kinds that never carry structured context,
    /// and the timestamp is truncated to whole seconds.
    pub fn new(
        kind: ErrorKind,
        message: impl Into<String>,
        path: impl Into<String>,
        timestamp: NaiveDateTime,
        details: Option<Details>,
    ) -> Self {
        Self {
            kind,
            title: kind.title(),
            message: message.into(),
            path: path.into(),
            status: kind.status().as_u16(),
            timestamp: timestamp.with_nanosecond(0).unwrap_or(timestamp),
            details: details.filter(|_| kind.carries_details()),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn title(&self) -> &str {
        self.title
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn timestamp(&self) -> NaiveDateTime {
        self.timestamp
    }

    pub fn details(&self) -> Option<&Details> {
        self.details.as_ref()
    }
}

/// Marker left on responses whose body is already a rendered envelope.
#[derive(Debug, Clone, Copy)]
pub struct RenderedEnvelope(pub ErrorKind);

impl IntoResponse for ErrorEnvelope {
    fn into_response(self) -> Response {
        let kind = self.kind;
        let mut response = (kind.status(), Json(self)).into_response();
        response.extensions_mut().insert(RenderedEnvelope(kind));
        response
    }
}

fn serialize_timestamp<S>(timestamp: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_str(&timestamp.format(TIMESTAMP_FORMAT))
}
