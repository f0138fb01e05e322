//! Operation results and the response envelope.

use axum::{
    body::Body,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::{CodecError, FilePart, Json, SerializerProfile};

pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";
pub const TEXT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Status, content metadata and body of one HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseEnvelope {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub content_length: Option<u64>,
    /// File name carried in `Content-Disposition`.
    pub file_name: Option<String>,
    pub body: Bytes,
}

impl ResponseEnvelope {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            content_type: None,
            content_length: None,
            file_name: None,
            body: Bytes::new(),
        }
    }

    pub fn no_content() -> Self {
        Self::new(StatusCode::NO_CONTENT)
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn text(status: StatusCode, text: impl Into<String>) -> Self {
        Self::new(status)
            .with_content_type(TEXT_CONTENT_TYPE)
            .with_body(text.into())
    }

    pub fn json<T: Serialize + ?Sized>(
        status: StatusCode,
        value: &T,
        profile: &SerializerProfile,
    ) -> Result<Self, CodecError> {
        Ok(Self::new(status)
            .with_content_type(JSON_CONTENT_TYPE)
            .with_body(profile.to_bytes(value)?))
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Body as text, replacing invalid UTF-8.
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

impl IntoResponse for ResponseEnvelope {
    fn into_response(self) -> Response {
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status;

        let headers = response.headers_mut();
        if let Some(value) = self
            .content_type
            .as_deref()
            .and_then(|value| HeaderValue::from_str(value).ok())
        {
            headers.insert(header::CONTENT_TYPE, value);
        }
        if let Some(value) = self
            .file_name
            .as_deref()
            .and_then(|name| HeaderValue::from_str(&content_disposition(name)).ok())
        {
            headers.insert(header::CONTENT_DISPOSITION, value);
        }
        response
    }
}

/// RFC 5987 `attr-char`: everything else is percent-encoded in `filename*`.
const ATTR_CHAR: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'!')
    .remove(b'#')
    .remove(b'$')
    .remove(b'&')
    .remove(b'+')
    .remove(b'-')
    .remove(b'.')
    .remove(b'^')
    .remove(b'_')
    .remove(b'`')
    .remove(b'|')
    .remove(b'~');

/// Non-ASCII names get an ASCII `filename` fallback plus `filename*`.
fn content_disposition(file_name: &str) -> String {
    let fallback: String = file_name
        .chars()
        .map(|c| if c.is_ascii() { c } else { '_' })
        .collect();
    let escaped = fallback.replace('\\', "\\\\").replace('"', "\\\"");
    if file_name.is_ascii() {
        format!("attachment; filename=\"{escaped}\"")
    } else {
        let encoded = utf8_percent_encode(file_name, ATTR_CHAR);
        format!("attachment; filename=\"{escaped}\"; filename*=UTF-8''{encoded}")
    }
}

/// How a result travels in the response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnKind {
    /// No value; 204 No Content.
    Unit,
    /// Raw UTF-8 text, taken verbatim.
    Text,
    /// Raw bytes with file metadata in headers.
    File,
    /// Structured serializer (JSON) through the bridge's profile.
    Structured,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReturnShape {
    pub type_name: &'static str,
    pub kind: ReturnKind,
    pub nullable: bool,
    pub sequence: bool,
}

impl ReturnShape {
    pub fn of<T: ?Sized>(kind: ReturnKind) -> Self {
        Self {
            type_name: std::any::type_name::<T>(),
            kind,
            nullable: false,
            sequence: false,
        }
    }
}

impl std::fmt::Display for ReturnShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.nullable {
            write!(f, "Option<{}>", self.type_name)
        } else {
            f.write_str(self.type_name)
        }
    }
}

/// A type that can be returned by an operation.
pub trait WireReturn: Sized + Send + 'static {
    fn return_shape() -> ReturnShape;

    /// Server-side encoding of a successful result.
    fn into_envelope(self, profile: &SerializerProfile) -> Result<ResponseEnvelope, CodecError>;

    /// Client-side decoding of a successful response.
    fn from_envelope(envelope: ResponseEnvelope, profile: &SerializerProfile)
        -> Result<Self, CodecError>;
}

impl WireReturn for () {
    fn return_shape() -> ReturnShape {
        ReturnShape::of::<()>(ReturnKind::Unit)
    }

    fn into_envelope(self, _profile: &SerializerProfile) -> Result<ResponseEnvelope, CodecError> {
        Ok(ResponseEnvelope::no_content())
    }

    fn from_envelope(_envelope: ResponseEnvelope, _profile: &SerializerProfile) -> Result<Self, CodecError> {
        Ok(())
    }
}

impl WireReturn for String {
    fn return_shape() -> ReturnShape {
        ReturnShape::of::<String>(ReturnKind::Text)
    }

    fn into_envelope(self, _profile: &SerializerProfile) -> Result<ResponseEnvelope, CodecError> {
        Ok(ResponseEnvelope::text(StatusCode::OK, self))
    }

    fn from_envelope(envelope: ResponseEnvelope, _profile: &SerializerProfile) -> Result<Self, CodecError> {
        String::from_utf8(envelope.body.to_vec())
            .map_err(|err| CodecError::invalid::<String>("<response body>", err))
    }
}

impl WireReturn for FilePart {
    fn return_shape() -> ReturnShape {
        ReturnShape::of::<FilePart>(ReturnKind::File)
    }

    fn into_envelope(self, _profile: &SerializerProfile) -> Result<ResponseEnvelope, CodecError> {
        Ok(ResponseEnvelope {
            status: StatusCode::OK,
            content_type: Some(self.content_type.unwrap_or_else(|| OCTET_STREAM.to_string())),
            content_length: Some(self.content.len() as u64),
            file_name: self.file_name,
            body: self.content,
        })
    }

    fn from_envelope(envelope: ResponseEnvelope, _profile: &SerializerProfile) -> Result<Self, CodecError> {
        Ok(FilePart {
            file_name: envelope.file_name,
            content_type: envelope.content_type,
            length: envelope.content_length,
            content: envelope.body,
        })
    }
}

/// Decodes a structured body, rejecting `null` for non-nullable results.
fn decode_structured<T: DeserializeOwned>(
    envelope: &ResponseEnvelope,
    profile: &SerializerProfile,
) -> Result<T, CodecError> {
    if envelope.body.iter().all(u8::is_ascii_whitespace) {
        return Err(CodecError::NullResult(std::any::type_name::<T>()));
    }
    match profile.parse_value(&envelope.body)? {
        Value::Null => Err(CodecError::NullResult(std::any::type_name::<T>())),
        value => Ok(profile.from_value(value)?),
    }
}

impl<T> WireReturn for Json<T>
where
    T: Serialize + DeserializeOwned + Send + 'static,
{
    fn return_shape() -> ReturnShape {
        ReturnShape::of::<T>(ReturnKind::Structured)
    }

    fn into_envelope(self, profile: &SerializerProfile) -> Result<ResponseEnvelope, CodecError> {
        ResponseEnvelope::json(StatusCode::OK, &self.0, profile)
    }

    fn from_envelope(envelope: ResponseEnvelope, profile: &SerializerProfile) -> Result<Self, CodecError> {
        decode_structured(&envelope, profile).map(Json)
    }
}

impl<T> WireReturn for Vec<T>
where
    T: Serialize + DeserializeOwned + Send + 'static,
{
    fn return_shape() -> ReturnShape {
        ReturnShape {
            sequence: true,
            ..ReturnShape::of::<Self>(ReturnKind::Structured)
        }
    }

    fn into_envelope(self, profile: &SerializerProfile) -> Result<ResponseEnvelope, CodecError> {
        ResponseEnvelope::json(StatusCode::OK, &self, profile)
    }

    fn from_envelope(envelope: ResponseEnvelope, profile: &SerializerProfile) -> Result<Self, CodecError> {
        decode_structured(&envelope, profile)
    }
}

macro_rules! structured_scalar_return {
    ($($ty:ty),+) => {$(
        impl WireReturn for $ty {
            fn return_shape() -> ReturnShape {
                ReturnShape::of::<$ty>(ReturnKind::Structured)
            }

            fn into_envelope(self, profile: &SerializerProfile) -> Result<ResponseEnvelope, CodecError> {
                ResponseEnvelope::json(StatusCode::OK, &self, profile)
            }

            fn from_envelope(envelope: ResponseEnvelope, profile: &SerializerProfile) -> Result<Self, CodecError> {
                decode_structured(&envelope, profile)
            }
        }
    )+};
}

structured_scalar_return!(i8, i16, i32, i64, u8, u16, u32, u64, f32, f64, bool, Uuid);

/// `None` is sent as 204 No Content, so an empty string or file stays `Some`.
impl<R: WireReturn> WireReturn for Option<R> {
    fn return_shape() -> ReturnShape {
        ReturnShape {
            nullable: true,
            ..R::return_shape()
        }
    }

    fn into_envelope(self, profile: &SerializerProfile) -> Result<ResponseEnvelope, CodecError> {
        match self {
            Some(value) => value.into_envelope(profile),
            None => Ok(ResponseEnvelope::no_content()),
        }
    }

    fn from_envelope(envelope: ResponseEnvelope, profile: &SerializerProfile) -> Result<Self, CodecError> {
        if envelope.status == StatusCode::NO_CONTENT {
            return Ok(None);
        }
        if R::return_shape().kind == ReturnKind::Structured
            && matches!(profile.parse_value(&envelope.body), Ok(Value::Null))
        {
            return Ok(None);
        }
        R::from_envelope(envelope, profile).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct TestResponse {
        full_name: String,
        age: i32,
    }

    fn profile() -> SerializerProfile {
        SerializerProfile::web()
    }

    fn round_trip<R: WireReturn>(value: R) -> R {
        let envelope = value.into_envelope(&profile()).unwrap();
        R::from_envelope(envelope, &profile()).unwrap()
    }

    fn structured(body: &'static str) -> ResponseEnvelope {
        ResponseEnvelope::new(StatusCode::OK)
            .with_content_type(JSON_CONTENT_TYPE)
            .with_body(body)
    }

    #[test]
    fn test_unit_is_no_content() {
        let envelope = ().into_envelope(&profile()).unwrap();
        assert_eq!(envelope.status, StatusCode::NO_CONTENT);
        assert!(envelope.body.is_empty());
    }

    #[test]
    fn test_string_is_verbatim_text() {
        let envelope = "Hello, \"World\"".to_string().into_envelope(&profile()).unwrap();
        assert_eq!(envelope.content_type.as_deref(), Some(TEXT_CONTENT_TYPE));
        assert_eq!(&envelope.body[..], b"Hello, \"World\"");
        assert_eq!(round_trip(String::new()), "");
    }

    #[test]
    fn test_structured_round_trip() {
        let value = Json(TestResponse {
            full_name: "Jane".into(),
            age: 30,
        });
        let envelope = value.clone().into_envelope(&profile()).unwrap();
        assert!(envelope.body_text().contains("\"fullName\""));
        assert_eq!(round_trip(value.clone()), value);
        assert_eq!(round_trip(vec![1u8, 2, 3]), vec![1, 2, 3]);
        assert_eq!(round_trip(42i64), 42);
    }

    #[test]
    fn test_null_for_non_nullable_is_an_error() {
        let err = Json::<TestResponse>::from_envelope(structured("null"), &profile());
        assert!(matches!(err, Err(CodecError::NullResult(_))));
        let err = Vec::<TestResponse>::from_envelope(structured(""), &profile());
        assert!(matches!(err, Err(CodecError::NullResult(_))));
    }

    #[test]
    fn test_nullable_results() {
        assert_eq!(round_trip(None::<Json<TestResponse>>), None);
        assert_eq!(round_trip(Some(String::new())), Some(String::new()));
        let decoded = Option::<Json<TestResponse>>::from_envelope(structured("null"), &profile()).unwrap();
        assert_eq!(decoded, None);
    }

    #[test]
    fn test_file_result_headers() {
        let part = FilePart::new(&b"\x89PNG"[..])
            .with_file_name("logo.png")
            .with_content_type("image/png");
        let response = part.into_envelope(&profile()).unwrap().into_response();
        assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"logo.png\""
        );
    }

    #[test]
    fn test_non_ascii_file_name_is_extended() {
        let response = FilePart::new(&b"%PDF"[..])
            .with_file_name("résumé 1.pdf")
            .into_envelope(&profile())
            .unwrap()
            .into_response();
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"r_sum_ 1.pdf\"; filename*=UTF-8''r%C3%A9sum%C3%A9%201.pdf"
        );
    }

    #[test]
    fn test_file_result_defaults_to_octet_stream() {
        let envelope = FilePart::new(Bytes::new()).into_envelope(&profile()).unwrap();
        assert_eq!(envelope.content_type.as_deref(), Some(OCTET_STREAM));
        assert_eq!(envelope.content_length, Some(0));
        assert_eq!(envelope.file_name, None);
    }
}
