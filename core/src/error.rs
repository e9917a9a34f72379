//! Error types for the sideHUSTLE client core.
//!
//! # Design
//! The transport layer classifies every failure into one `ApiError` variant
//! and returns it; the session layer catches at its operation boundary and
//! keeps only the rendered message. Variants that come from an HTTP response
//! carry the status so FFI callers can surface it separately.

use std::collections::BTreeMap;

use thiserror::Error;

/// Errors produced by request building, transport and response decoding.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced an HTTP response (DNS, connect, body read).
    #[error("{0}")]
    Network(String),

    /// The server declared a JSON body that does not parse.
    #[error("Server returned invalid JSON: {status} {status_text} - {body_prefix}")]
    MalformedResponse {
        status: u16,
        status_text: String,
        body_prefix: String,
    },

    /// A non-2xx response whose body is not JSON.
    #[error("Server error: {status} {status_text} - {body_prefix}")]
    Transport {
        status: u16,
        status_text: String,
        body_prefix: String,
    },

    /// A non-2xx JSON response; `message` is taken from the payload.
    #[error("{message}")]
    Api { status: u16, message: String },

    /// Caller-side input checks failed before any request was made.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A successful payload did not have the expected shape.
    #[error("unexpected response shape: {0}")]
    Deserialization(String),

    /// A request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// Durable storage could not be read or written.
    #[error("storage failure: {0}")]
    Storage(#[from] StorageError),
}

impl ApiError {
    /// HTTP status carried by response-derived errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::MalformedResponse { status, .. }
            | ApiError::Transport { status, .. }
            | ApiError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Failures of a `KeyValueStore` backend.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupt store contents: {0}")]
    Corrupt(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Field-level input errors, keyed by the wire name of the field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Error)]
#[error("invalid input: {}", summary(.fields))]
pub struct ValidationError {
    pub fields: BTreeMap<String, String>,
}

impl ValidationError {
    pub(crate) fn add(&mut self, field: &str, message: &str) {
        self.fields
            .entry(field.to_string())
            .or_insert_with(|| message.to_string());
    }

    pub(crate) fn into_result(self) -> Result<(), ValidationError> {
        if self.fields.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }

    pub fn message_for(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }
}

fn summary(fields: &BTreeMap<String, String>) -> String {
    fields
        .iter()
        .map(|(field, message)| format!("{field}: {message}"))
        .collect::<Vec<_>>()
        .join("; ")
}
