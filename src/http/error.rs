//! Errors raised on the dispatch path.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::codec::{ResponseEnvelope, SerializerProfile};
use crate::security::AccessDenied;

/// An exact HTTP response raised by service logic.
///
/// The dispatcher copies the envelope to the wire unchanged, and a bridge
/// client surfaces it as an unsuccessful status with the same body.
///
/// ```
/// use axum::http::StatusCode;
/// use interface_bridge::HttpResponseError;
///
/// let err = HttpResponseError::with_message(StatusCode::NOT_FOUND, "That file not found");
/// assert_eq!(err.status(), StatusCode::NOT_FOUND);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("HTTP {}: {}", .envelope.status, .envelope.body_text())]
pub struct HttpResponseError {
    envelope: ResponseEnvelope,
}

impl HttpResponseError {
    /// A response with a status and no body.
    pub fn new(status: StatusCode) -> Self {
        Self {
            envelope: ResponseEnvelope::new(status),
        }
    }

    /// A plain-text body.
    pub fn with_message(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            envelope: ResponseEnvelope::text(status, message),
        }
    }

    /// A structured body, written through the web profile.
    pub fn with_json<T: Serialize + ?Sized>(status: StatusCode, value: &T) -> Result<Self, serde_json::Error> {
        let body = SerializerProfile::web().to_bytes(value)?;
        Ok(Self::with_content(status, crate::codec::returns::JSON_CONTENT_TYPE, body))
    }

    pub fn with_content(
        status: StatusCode,
        content_type: impl Into<String>,
        body: impl Into<bytes::Bytes>,
    ) -> Self {
        Self {
            envelope: ResponseEnvelope::new(status)
                .with_content_type(content_type)
                .with_body(body),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.envelope.status
    }

    pub fn envelope(&self) -> &ResponseEnvelope {
        &self.envelope
    }

    pub fn into_envelope(self) -> ResponseEnvelope {
        self.envelope
    }
}

impl From<ResponseEnvelope> for HttpResponseError {
    fn from(envelope: ResponseEnvelope) -> Self {
        Self { envelope }
    }
}

impl IntoResponse for HttpResponseError {
    fn into_response(self) -> Response {
        self.envelope.into_response()
    }
}

/// What a service handler returns on failure.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Forwarded to the caller byte-for-byte.
    #[error(transparent)]
    Response(#[from] HttpResponseError),

    /// Any other fault; logged and answered with a bare 500.
    #[error("internal error: {0}")]
    Internal(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ServiceError {
    pub fn internal<E>(err: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        ServiceError::Internal(err.into())
    }
}

/// Per-request failures detected before the handler runs.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("File expected for {0}")]
    MissingFile(String),

    #[error("Invalid value for {name}: {reason}")]
    InvalidArgument { name: String, reason: String },

    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    #[error("Request body too large")]
    PayloadTooLarge,

    #[error("Authentication required")]
    Unauthenticated,

    #[error("Access denied")]
    Forbidden,

    /// The handler and operation disagree; mount checks should prevent this.
    #[error("Handler arguments do not match operation {0}")]
    ArgumentMismatch(String),
}

impl DispatchError {
    pub fn status(&self) -> StatusCode {
        match self {
            DispatchError::MissingFile(_)
            | DispatchError::InvalidArgument { .. }
            | DispatchError::MalformedRequest(_) => StatusCode::BAD_REQUEST,
            DispatchError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            DispatchError::Unauthenticated => StatusCode::UNAUTHORIZED,
            DispatchError::Forbidden => StatusCode::FORBIDDEN,
            DispatchError::ArgumentMismatch(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<AccessDenied> for DispatchError {
    fn from(denied: AccessDenied) -> Self {
        match denied {
            AccessDenied::Unauthenticated => DispatchError::Unauthenticated,
            AccessDenied::Forbidden(_) => DispatchError::Forbidden,
        }
    }
}

impl IntoResponse for DispatchError {
    fn into_response(self) -> Response {
        ResponseEnvelope::text(self.status(), self.to_string()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header;

    #[tokio::test]
    async fn test_http_response_error_is_forwarded_verbatim() {
        let response = HttpResponseError::with_content(StatusCode::IM_A_TEAPOT, "application/x-tea", "earl grey")
            .into_response();
        assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/x-tea");
        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        assert_eq!(&body[..], b"earl grey");
    }

    #[test]
    fn test_with_json_uses_web_naming() {
        #[derive(Serialize)]
        struct Problem {
            error_code: u32,
        }
        let err = HttpResponseError::with_json(StatusCode::CONFLICT, &Problem { error_code: 7 }).unwrap();
        assert_eq!(err.envelope().body_text(), r#"{"errorCode":7}"#);
    }

    #[test]
    fn test_dispatch_error_statuses() {
        assert_eq!(DispatchError::MissingFile("file".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(DispatchError::MissingFile("file".into()).to_string(), "File expected for file");
        assert_eq!(DispatchError::Unauthenticated.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            DispatchError::from(AccessDenied::Forbidden(crate::security::Requirement::Authenticated)).status(),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn test_internal_from_str() {
        let err = ServiceError::internal("database unavailable");
        assert_eq!(err.to_string(), "internal error: database unavailable");
    }
}
