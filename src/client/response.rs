//! Response decoding.

use percent_encoding::percent_decode_str;
use reqwest::{header, StatusCode};

use super::ClientError;
use crate::codec::{ResponseEnvelope, ReturnKind, SerializerProfile, WireReturn};

/// Reads status, content metadata and the whole body of `response`.
pub async fn read_envelope(response: reqwest::Response) -> Result<ResponseEnvelope, ClientError> {
    let status = response.status();
    let headers = response.headers();
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    let file_name = headers
        .get(header::CONTENT_DISPOSITION)
        .and_then(|value| disposition_file_name(&String::from_utf8_lossy(value.as_bytes())));
    let declared_length = headers
        .get(header::CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<u64>().ok());

    let body = response.bytes().await?;
    Ok(ResponseEnvelope {
        status,
        content_type,
        content_length: declared_length.or(Some(body.len() as u64)),
        file_name,
        body,
    })
}

/// Decodes a response envelope into the operation's result type.
pub fn decode<R: WireReturn>(
    operation: &str,
    envelope: ResponseEnvelope,
    profile: &SerializerProfile,
) -> Result<R, ClientError> {
    if !envelope.is_success() {
        return Err(ClientError::UnsuccessfulStatus(envelope));
    }
    let shape = R::return_shape();
    if envelope.status == StatusCode::NO_CONTENT && !shape.nullable && shape.kind != ReturnKind::Unit {
        return Err(ClientError::MissingResponse(operation.to_string()));
    }
    R::from_envelope(envelope, profile).map_err(ClientError::Decode)
}

/// File name from a `Content-Disposition` value.
///
/// `filename*=UTF-8''…` wins over `filename="…"` or a bare `filename=` token.
fn disposition_file_name(value: &str) -> Option<String> {
    extended_file_name(value).or_else(|| plain_file_name(value))
}

fn extended_file_name(value: &str) -> Option<String> {
    let start = value.find("filename*=")? + "filename*=".len();
    let encoded = value[start..].split(';').next()?.trim();
    let mut parts = encoded.splitn(3, '\'');
    let charset = parts.next()?;
    let _language = parts.next()?;
    let name = parts.next()?;
    if !charset.eq_ignore_ascii_case("utf-8") {
        return None;
    }
    percent_decode_str(name)
        .decode_utf8()
        .ok()
        .map(|name| name.into_owned())
        .filter(|name| !name.is_empty())
}

fn plain_file_name(value: &str) -> Option<String> {
    let start = value.find("filename=")? + "filename=".len();
    let rest = value[start..].trim_start();
    if let Some(quoted) = rest.strip_prefix('"') {
        let mut name = String::new();
        let mut chars = quoted.chars();
        while let Some(c) = chars.next() {
            match c {
                '\\' => name.extend(chars.next()),
                '"' => return Some(name),
                c => name.push(c),
            }
        }
        None
    } else {
        let token = rest.split(';').next()?.trim();
        (!token.is_empty()).then(|| token.to_string())
    }
}
