// Models module - error classification and the error envelope

pub mod error_envelope;
pub mod error_kind;

pub use error_envelope::{DetailValue, Details, ErrorEnvelope, RenderedEnvelope, TIMESTAMP_FORMAT};
pub use error_kind::ErrorKind;
