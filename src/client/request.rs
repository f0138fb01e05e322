//! Request building.
//!
//! Walks the operation's parameters in order and places each encoded value
//! by role: route placeholders fill the path, GET arguments go to the query,
//! the rest to a form or multipart body. Null arguments are omitted.

use reqwest::{
    multipart::{Form, Part},
    Method,
};
use tokio_util::sync::CancellationToken;
use url::Url;

use super::ClientError;
use crate::codec::{CodecError, FilePart, WireValue};
use crate::contract::{Operation, Placement, ResolvedBody, Segment, Verb};

/// An outgoing call, fully placed but not yet sent.
#[derive(Debug)]
pub struct PreparedRequest {
    pub method: Method,
    pub url: Url,
    pub body: PreparedBody,
    /// The caller's cancellation signal, if the operation declares one.
    pub cancellation: Option<CancellationToken>,
}

#[derive(Debug, PartialEq)]
pub enum PreparedBody {
    Empty,
    Form(Vec<(String, String)>),
    Multipart(Vec<PreparedPart>),
}

#[derive(Debug, PartialEq)]
pub enum PreparedPart {
    Text { name: String, value: String },
    File { name: String, part: FilePart },
}

impl PreparedRequest {
    /// Places `values` (one per parameter, in order) for `operation`.
    pub fn build(base_url: &Url, operation: &Operation, values: Vec<WireValue>) -> Result<Self, ClientError> {
        let verb = operation.verb();
        let mut route_values: Vec<(&str, String)> = Vec::new();
        let mut query: Vec<(String, String)> = Vec::new();
        let mut form: Vec<(String, String)> = Vec::new();
        let mut parts: Vec<PreparedPart> = Vec::new();
        let mut cancellation = None;

        for (parameter, value) in operation.parameters().iter().zip(values) {
            let name = parameter.name.clone();
            let value = match value {
                WireValue::Null => continue,
                WireValue::Cancellation(token) => {
                    cancellation = Some(token);
                    continue;
                }
                value => value,
            };
            match parameter.placement(verb, operation.body()) {
                Placement::Path => route_values.push((parameter.name.as_str(), text(value)?)),
                Placement::Query => query.push((name, text(value)?)),
                Placement::Form => form.push((name, text(value)?)),
                Placement::MultipartText => parts.push(PreparedPart::Text {
                    name,
                    value: text(value)?,
                }),
                Placement::MultipartFile => match value {
                    WireValue::File(part) => parts.push(PreparedPart::File { name, part }),
                    _ => {
                        return Err(ClientError::Encode(CodecError::UnexpectedWire {
                            expected: "file",
                        }))
                    }
                },
                Placement::Detached => {}
            }
        }

        let mut url = base_url.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|()| ClientError::InvalidBaseUrl {
                url: base_url.to_string(),
                reason: "cannot be a base".into(),
            })?;
            segments.pop_if_empty();
            for segment in operation.route().segments() {
                match segment {
                    Segment::Literal(literal) => {
                        segments.push(literal);
                    }
                    Segment::Param(placeholder) | Segment::CatchAll(placeholder) => {
                        let value = route_values
                            .iter()
                            .find(|(name, _)| *name == placeholder.as_str())
                            .map(|(_, value)| value.as_str())
                            .ok_or_else(|| ClientError::MissingRouteValue {
                                operation: operation.name().to_string(),
                                placeholder: placeholder.clone(),
                            })?;
                        if matches!(segment, Segment::CatchAll(_)) {
                            segments.extend(value.split('/').filter(|part| !part.is_empty()));
                        } else {
                            segments.push(value);
                        }
                    }
                }
            }
        }

        url.set_query(operation.route().query());
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(&query);
        }

        let body = match operation.body() {
            _ if verb == Verb::Get => PreparedBody::Empty,
            ResolvedBody::None => PreparedBody::Empty,
            ResolvedBody::FormUrlEncoded => PreparedBody::Form(form),
            ResolvedBody::Multipart => PreparedBody::Multipart(parts),
        };

        Ok(Self {
            method: verb.method(),
            url,
            body,
            cancellation,
        })
    }

    /// Turns the placed call into a reqwest request.
    pub fn into_request(
        self,
        http: &reqwest::Client,
        api_key: Option<&str>,
    ) -> Result<reqwest::RequestBuilder, ClientError> {
        let mut request = http.request(self.method, self.url);
        if let Some(key) = api_key {
            request = request.bearer_auth(key);
        }
        Ok(match self.body {
            PreparedBody::Empty => request,
            PreparedBody::Form(pairs) => request.form(&pairs),
            PreparedBody::Multipart(parts) => request.multipart(multipart_form(parts)?),
        })
    }
}

fn text(value: WireValue) -> Result<String, ClientError> {
    value
        .into_text()
        .map(Option::unwrap_or_default)
        .map_err(ClientError::Encode)
}

fn multipart_form(parts: Vec<PreparedPart>) -> Result<Form, ClientError> {
    let mut form = Form::new();
    for part in parts {
        form = match part {
            PreparedPart::Text { name, value } => form.text(name, value),
            PreparedPart::File { name, part } => {
                let length = part.length.unwrap_or(part.content.len() as u64);
                // The server binds file parts by field name; a file name must be present.
                let file_name = part.file_name.clone().unwrap_or_else(|| name.clone());
                let mut file = Part::stream_with_length(part.content, length).file_name(file_name);
                if let Some(content_type) = part.content_type.as_deref() {
                    file = file.mime_str(content_type)?;
                }
                form.part(name, file)
            }
        };
    }
    Ok(form)
}
