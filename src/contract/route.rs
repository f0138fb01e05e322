//! Route templates.
//!
//! A template is a `/`-separated path whose segments are either literal text
//! or a whole-segment placeholder: `{name}`, `{name:constraint}` or the
//! catch-all `{*name}`. Constraint suffixes are dropped, so the simplified
//! template is exactly the axum path syntax used for registration.

use std::collections::HashSet;
use std::fmt;

use thiserror::Error;

/// Errors raised while parsing a route template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    #[error("route is empty")]
    Empty,

    #[error("route prefix is empty")]
    EmptyPrefix,

    #[error("unbalanced braces in segment {0:?}")]
    UnbalancedBraces(String),

    #[error("placeholder must span a whole segment: {0:?}")]
    PartialSegment(String),

    #[error("invalid placeholder name {0:?}")]
    InvalidName(String),

    #[error("duplicate placeholder {0:?}")]
    DuplicatePlaceholder(String),

    #[error("catch-all placeholder {0:?} must be the last segment")]
    CatchAllNotLast(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Param(String),
    /// Matches the rest of the path, slashes included.
    CatchAll(String),
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Literal(text) => f.write_str(text),
            Segment::Param(name) => write!(f, "{{{name}}}"),
            Segment::CatchAll(name) => write!(f, "{{*{name}}}"),
        }
    }
}

/// A validated, simplified route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTemplate {
    segments: Vec<Segment>,
    /// Literal query text after `?`, kept verbatim for the client.
    query: Option<String>,
}

impl RouteTemplate {
    pub fn parse(template: &str) -> Result<Self, RouteError> {
        let (path, query) = split_query(template);

        let raw: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        if raw.is_empty() {
            return Err(RouteError::Empty);
        }

        let mut seen = HashSet::new();
        let mut segments = Vec::with_capacity(raw.len());
        for (index, text) in raw.iter().enumerate() {
            let segment = parse_segment(text)?;
            match &segment {
                Segment::Param(name) | Segment::CatchAll(name) => {
                    if !seen.insert(name.clone()) {
                        return Err(RouteError::DuplicatePlaceholder(name.clone()));
                    }
                    if matches!(segment, Segment::CatchAll(_)) && index + 1 != raw.len() {
                        return Err(RouteError::CatchAllNotLast(name.clone()));
                    }
                }
                Segment::Literal(_) => {}
            }
            segments.push(segment);
        }

        Ok(Self {
            segments,
            query: query.filter(|q| !q.is_empty()).map(str::to_string),
        })
    }

    /// Combines a bridge prefix with an operation route.
    ///
    /// A route starting with `/` is absolute and ignores the prefix.
    pub fn join(prefix: Option<&str>, route: &str) -> Result<Self, RouteError> {
        if route.trim_matches('/').is_empty() {
            return Err(RouteError::Empty);
        }
        if route.starts_with('/') {
            return Self::parse(route);
        }
        match prefix {
            Some(prefix) => {
                let prefix = prefix.trim_matches('/');
                if prefix.is_empty() {
                    return Err(RouteError::EmptyPrefix);
                }
                Self::parse(&format!("{prefix}/{route}"))
            }
            None => Self::parse(route),
        }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    /// Placeholder names in order of appearance.
    pub fn placeholder_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Param(name) | Segment::CatchAll(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    pub fn has_placeholder(&self, name: &str) -> bool {
        self.placeholder_names().any(|p| p == name)
    }

    /// The path pattern registered with the router, e.g. `/api/hello/{name}`.
    pub fn path(&self) -> String {
        self.segments
            .iter()
            .map(|segment| format!("/{segment}"))
            .collect()
    }

    /// The path with placeholder names erased; two routes with the same key
    /// match the same requests.
    pub fn match_key(&self) -> String {
        self.segments
            .iter()
            .map(|segment| match segment {
                Segment::Literal(text) => format!("/{text}"),
                Segment::Param(_) => "/{}".to_string(),
                Segment::CatchAll(_) => "/{*}".to_string(),
            })
            .collect()
    }
}

impl fmt::Display for RouteTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())?;
        if let Some(query) = &self.query {
            write!(f, "?{query}")?;
        }
        Ok(())
    }
}

/// Strips constraint suffixes and returns the simplified template with its
/// placeholder names.
pub fn simplify(template: &str) -> Result<(String, Vec<String>), RouteError> {
    let route = RouteTemplate::parse(template)?;
    let names = route.placeholder_names().map(str::to_string).collect();
    Ok((route.to_string(), names))
}

/// Splits at the first `?` outside a placeholder.
fn split_query(template: &str) -> (&str, Option<&str>) {
    let mut depth = 0usize;
    for (index, c) in template.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => depth = depth.saturating_sub(1),
            '?' if depth == 0 => return (&template[..index], Some(&template[index + 1..])),
            _ => {}
        }
    }
    (template, None)
}

fn parse_segment(text: &str) -> Result<Segment, RouteError> {
    let opens = text.matches('{').count();
    let closes = text.matches('}').count();
    if opens == 0 && closes == 0 {
        return Ok(Segment::Literal(text.to_string()));
    }
    if opens != closes {
        return Err(RouteError::UnbalancedBraces(text.to_string()));
    }
    let inner = match text.strip_prefix('{').and_then(|t| t.strip_suffix('}')) {
        Some(inner) if opens == 1 => inner,
        _ => return Err(RouteError::PartialSegment(text.to_string())),
    };

    let name = inner.split_once(':').map_or(inner, |(name, _constraint)| name);
    let (catch_all, name) = match name.strip_prefix('*') {
        Some(rest) => (true, rest.strip_prefix('*').unwrap_or(rest)),
        None => (false, name),
    };
    if !is_valid_name(name) {
        return Err(RouteError::InvalidName(name.to_string()));
    }

    Ok(if catch_all {
        Segment::CatchAll(name.to_string())
    } else {
        Segment::Param(name.to_string())
    })
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simplify_strips_constraints() {
        let (path, names) = simplify("api/items/{id:guid}/{slot:int:min(1)}").unwrap();
        assert_eq!(path, "/api/items/{id}/{slot}");
        assert_eq!(names, vec!["id", "slot"]);
        assert!(!path.contains(':'));
    }

    #[test]
    fn test_no_placeholders() {
        let (path, names) = simplify("api/fulltest/all").unwrap();
        assert_eq!(path, "/api/fulltest/all");
        assert!(names.is_empty());
    }

    #[test]
    fn test_malformed_braces() {
        assert_eq!(
            RouteTemplate::parse("api/{id").unwrap_err(),
            RouteError::UnbalancedBraces("{id".into())
        );
        assert_eq!(
            RouteTemplate::parse("api/item-{id}").unwrap_err(),
            RouteError::PartialSegment("item-{id}".into())
        );
        assert_eq!(
            RouteTemplate::parse("api/{}").unwrap_err(),
            RouteError::InvalidName(String::new())
        );
        assert!(matches!(
            RouteTemplate::parse("api/{id?}"),
            Err(RouteError::InvalidName(_))
        ));
    }

    #[test]
    fn test_question_mark_inside_placeholder_is_not_a_query() {
        let route = RouteTemplate::parse("api/{x:regex(^a?b$)}?v=1").unwrap();
        assert_eq!(route.path(), "/api/{x}");
        assert_eq!(route.query(), Some("v=1"));

        let route = RouteTemplate::parse("api/{x:regex(^a?b$)}").unwrap();
        assert_eq!(route.query(), None);
    }

    #[test]
    fn test_duplicate_and_catch_all_rules() {
        assert_eq!(
            RouteTemplate::parse("{id}/x/{id}").unwrap_err(),
            RouteError::DuplicatePlaceholder("id".into())
        );
        assert_eq!(
            RouteTemplate::parse("files/{*path}/meta").unwrap_err(),
            RouteError::CatchAllNotLast("path".into())
        );
        let route = RouteTemplate::parse("files/{**path}").unwrap();
        assert_eq!(route.path(), "/files/{*path}");
    }

    #[test]
    fn test_join_prefix_and_route() {
        let route = RouteTemplate::join(Some("/api/hello/"), "greet/{name}").unwrap();
        assert_eq!(route.path(), "/api/hello/greet/{name}");

        let route = RouteTemplate::join(Some("api//x"), "//a///b/").unwrap();
        assert_eq!(route.path(), "/a/b");

        let route = RouteTemplate::join(Some("api"), "a//b").unwrap();
        assert_eq!(route.path(), "/api/a/b");
    }

    #[test]
    fn test_absolute_route_ignores_prefix() {
        let route = RouteTemplate::join(Some("api/test"), "/version").unwrap();
        assert_eq!(route.path(), "/version");
    }

    #[test]
    fn test_join_rejects_empty_parts() {
        assert_eq!(RouteTemplate::join(Some("api"), "//").unwrap_err(), RouteError::Empty);
        assert_eq!(RouteTemplate::join(Some("/"), "x").unwrap_err(), RouteError::EmptyPrefix);
    }

    #[test]
    fn test_literal_query_is_kept() {
        let route = RouteTemplate::join(Some("api"), "search?mode=full").unwrap();
        assert_eq!(route.path(), "/api/search");
        assert_eq!(route.query(), Some("mode=full"));
        assert_eq!(route.to_string(), "/api/search?mode=full");
    }

    #[test]
    fn test_match_key_ignores_names() {
        let a = RouteTemplate::parse("items/{id}").unwrap();
        let b = RouteTemplate::parse("items/{key:int}").unwrap();
        assert_ne!(a.path(), b.path());
        assert_eq!(a.match_key(), b.match_key());
    }
}
