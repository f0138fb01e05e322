//! Client call errors.

use reqwest::StatusCode;
use thiserror::Error;

use crate::codec::{CodecError, ResponseEnvelope};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("unknown operation {0:?}")]
    UnknownOperation(String),

    #[error("operation {operation}: arguments ({found}) do not match the declared ({expected})")]
    ArgumentMismatch {
        operation: String,
        expected: String,
        found: String,
    },

    #[error("operation {operation}: result {found} does not match the declared {expected}")]
    ReturnMismatch {
        operation: String,
        expected: String,
        found: String,
    },

    #[error("operation {operation}: no value for route placeholder {placeholder:?}")]
    MissingRouteValue {
        operation: String,
        placeholder: String,
    },

    /// The server answered with a non-success status; the envelope is kept whole.
    #[error("HTTP {}: {}", .0.status, .0.body_text())]
    UnsuccessfulStatus(ResponseEnvelope),

    #[error("operation {0}: the response carried no content")]
    MissingResponse(String),

    #[error("failed to decode response: {0}")]
    Decode(#[source] CodecError),

    #[error("failed to encode argument: {0}")]
    Encode(#[source] CodecError),

    #[error("call cancelled")]
    Cancelled,

    #[error("unknown serializer profile {0:?}")]
    UnknownProfile(String),

    #[error("invalid base URL {url:?}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

impl ClientError {
    /// Status of an unsuccessful response.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::UnsuccessfulStatus(envelope) => Some(envelope.status),
            ClientError::Transport(err) => err.status(),
            _ => None,
        }
    }

    /// Body text of an unsuccessful response.
    pub fn body(&self) -> Option<String> {
        match self {
            ClientError::UnsuccessfulStatus(envelope) => Some(envelope.body_text()),
            _ => None,
        }
    }

    /// The full envelope of an unsuccessful response.
    pub fn envelope(&self) -> Option<&ResponseEnvelope> {
        match self {
            ClientError::UnsuccessfulStatus(envelope) => Some(envelope),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsuccessful_status_accessors() {
        let err = ClientError::UnsuccessfulStatus(ResponseEnvelope::text(
            StatusCode::NOT_FOUND,
            "That file not found",
        ));
        assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
        assert_eq!(err.body().as_deref(), Some("That file not found"));
        assert_eq!(err.to_string(), "HTTP 404 Not Found: That file not found");
        assert_eq!(ClientError::Cancelled.status(), None);
    }
}
