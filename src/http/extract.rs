//! Request value extraction.
//!
//! Three string-keyed sources are merged with ascending priority: form
//! fields, then query parameters, then route segments. Uploaded files are
//! kept apart, first file per field name wins.

use std::collections::HashMap;

use axum::{
    body::Bytes,
    extract::{FromRequest, FromRequestParts, Multipart, RawPathParams, Request},
    http::{header, request::Parts, StatusCode},
};

use super::DispatchError;
use crate::codec::FilePart;

const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";
const MULTIPART_FORM_DATA: &str = "multipart/form-data";

/// Values carried by one request, merged by priority.
#[derive(Debug, Default)]
pub struct RequestValues {
    values: HashMap<String, String>,
    files: HashMap<String, FilePart>,
}

impl RequestValues {
    /// Takes the value for `name`; empty values count as absent.
    pub fn take_value(&mut self, name: &str) -> Option<String> {
        self.values.remove(name).filter(|value| !value.is_empty())
    }

    pub fn take_file(&mut self, name: &str) -> Option<FilePart> {
        self.files.remove(name)
    }

    pub fn value(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn has_file(&self, name: &str) -> bool {
        self.files.contains_key(name)
    }
}

/// Reads route segments, the query string and a form or multipart body.
///
/// `route_bound` is false for operations without placeholders, which skips
/// path extraction entirely.
pub async fn extract_values(request: Request, route_bound: bool) -> Result<RequestValues, DispatchError> {
    let (mut parts, body) = request.into_parts();

    let route = if route_bound {
        route_values(&mut parts).await?
    } else {
        Vec::new()
    };
    let query: Vec<(String, String)> = parts
        .uri
        .query()
        .map(|query| parse_urlencoded(query.as_bytes()))
        .unwrap_or_default();

    let content_type = parts
        .headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    let mut extracted = RequestValues::default();
    let request = Request::from_parts(parts, body);
    if content_type.starts_with(FORM_URLENCODED) {
        let bytes = Bytes::from_request(request, &())
            .await
            .map_err(|rejection| body_error(rejection.status(), rejection.body_text()))?;
        for (name, value) in parse_urlencoded(&bytes) {
            extracted.values.entry(name).or_insert(value);
        }
    } else if content_type.starts_with(MULTIPART_FORM_DATA) {
        read_multipart(request, &mut extracted).await?;
    }

    extracted.values.extend(query.into_iter().rev());
    extracted.values.extend(route);
    Ok(extracted)
}

async fn route_values(parts: &mut Parts) -> Result<Vec<(String, String)>, DispatchError> {
    let params = RawPathParams::from_request_parts(parts, &())
        .await
        .map_err(|rejection| DispatchError::MalformedRequest(rejection.body_text()))?;
    Ok(params
        .iter()
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect())
}

async fn read_multipart(request: Request, extracted: &mut RequestValues) -> Result<(), DispatchError> {
    let mut multipart = Multipart::from_request(request, &())
        .await
        .map_err(|rejection| body_error(rejection.status(), rejection.body_text()))?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| body_error(err.status(), err.body_text()))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let content = field
            .bytes()
            .await
            .map_err(|err| body_error(err.status(), err.body_text()))?;

        match file_name {
            Some(file_name) => {
                extracted.files.entry(name).or_insert_with(|| FilePart {
                    file_name: Some(file_name),
                    content_type,
                    length: Some(content.len() as u64),
                    content,
                });
            }
            None => {
                let text = String::from_utf8(content.to_vec()).map_err(|_| {
                    DispatchError::MalformedRequest(format!("field {name} is not valid UTF-8"))
                })?;
                extracted.values.entry(name).or_insert(text);
            }
        }
    }
    Ok(())
}

/// Pairs in order; later duplicates are dropped by the caller's merge.
fn parse_urlencoded(input: &[u8]) -> Vec<(String, String)> {
    url::form_urlencoded::parse(input)
        .map(|(name, value)| (name.into_owned(), value.into_owned()))
        .collect()
}

fn body_error(status: StatusCode, message: String) -> DispatchError {
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        DispatchError::PayloadTooLarge
    } else {
        DispatchError::MalformedRequest(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, routing::post, Router};
    use tower::ServiceExt;

    async fn echo(request: Request) -> String {
        let mut values = extract_values(request, true).await.unwrap();
        let file = values
            .take_file("file")
            .map(|f| format!("{}:{}", f.file_name.unwrap_or_default(), f.length.unwrap_or(0)))
            .unwrap_or_default();
        format!(
            "id={} name={} file={}",
            values.take_value("id").unwrap_or_default(),
            values.take_value("name").unwrap_or_default(),
            file
        )
    }

    async fn send(uri: &str, content_type: &str, body: impl Into<Body>) -> String {
        let app = Router::new().route("/items/{id}", post(echo));
        let request = axum::http::Request::post(uri)
            .header(header::CONTENT_TYPE, content_type)
            .body(body.into())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let bytes = axum::body::to_bytes(response.into_body(), 1 << 16).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_route_beats_query_beats_form() {
        let body = send("/items/route?id=query&name=query", FORM_URLENCODED, "id=form&name=form").await;
        assert_eq!(body, "id=route name=query file=");

        let body = send("/items/route", FORM_URLENCODED, "name=form").await;
        assert_eq!(body, "id=route name=form file=");
    }

    #[tokio::test]
    async fn test_first_query_value_wins() {
        let body = send("/items/7?name=a&name=b", "text/plain", "").await;
        assert_eq!(body, "id=7 name=a file=");
    }

    #[tokio::test]
    async fn test_multipart_fields_and_files() {
        let boundary = "XBOUNDARYX";
        let body = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"name\"\r\n\r\nmulti\r\n\
             --{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"nothing.png\"\r\n\
             Content-Type: image/png\r\n\r\n\r\n\
             --{b}--\r\n",
            b = boundary
        );
        let content_type = format!("{MULTIPART_FORM_DATA}; boundary={boundary}");
        let body = send("/items/1", &content_type, body).await;
        assert_eq!(body, "id=1 name=multi file=nothing.png:0");
    }

    #[tokio::test]
    async fn test_percent_decoding() {
        let body = send("/items/a%20b?name=J%C3%B6rg+M", "text/plain", "").await;
        assert_eq!(body, "id=a b name=Jörg M file=");
    }

    #[test]
    fn test_empty_values_are_absent() {
        let mut values = RequestValues::default();
        values.values.insert("name".into(), String::new());
        assert_eq!(values.value("name"), Some(""));
        assert_eq!(values.take_value("name"), None);
    }
}
