//! Client error types

use questscribe_core::CoreError;
use thiserror::Error;

/// Client error types.
///
/// Every variant displays as a human-readable message suitable for showing to
/// the user as-is.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Network or request error
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Server returned a non-success status
    #[error("{message}")]
    Api { status: u16, message: String },

    /// The session is no longer accepted; the user has to log in again
    #[error("{message}")]
    Unauthenticated { status: Option<u16>, message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// Session storage failed
    #[error(transparent)]
    Session(#[from] CoreError),
}

impl ClientError {
    /// Create error from HTTP status code
    pub fn from_status(status: reqwest::StatusCode, message: String) -> Self {
        match status.as_u16() {
            401 | 403 => Self::Unauthenticated {
                status: Some(status.as_u16()),
                message,
            },
            _ => Self::Api {
                status: status.as_u16(),
                message,
            },
        }
    }

    /// Whether the session must be re-established
    pub fn is_unauthenticated(&self) -> bool {
        matches!(self, Self::Unauthenticated { .. })
    }

    /// HTTP status of the failed response, if there was one
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Unauthenticated { status, .. } => *status,
            Self::Request(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Generic message for a failed response without a usable body
pub(crate) fn status_message(status: reqwest::StatusCode) -> String {
    format!("HTTP error! status: {}", status.as_u16())
}

/// Extract a message from an error body.
///
/// A JSON body yields its `message` string, or the compact JSON text when it
/// has none. Non-JSON bodies and JSON `null` yield `None`.
pub(crate) fn message_from_body(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    if value.is_null() {
        return None;
    }
    match value.get("message").and_then(|m| m.as_str()) {
        Some(message) if !message.is_empty() => Some(message.to_string()),
        _ => Some(value.to_string()),
    }
}
