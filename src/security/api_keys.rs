//! Bearer API keys.
//!
//! A small host-side way to put a [`Principal`] on requests: a request with
//! `Authorization: Bearer <key>` for a configured key gets that key's
//! principal. Requests without a known key pass through anonymous; the
//! dispatcher decides whether the operation needs more.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, Request},
    middleware::Next,
    response::Response,
};

use super::Principal;
use crate::config::schema::ApiKeyConfig;

#[derive(Debug, Clone, Default)]
pub struct ApiKeyStore {
    keys: Arc<HashMap<String, Principal>>,
}

impl ApiKeyStore {
    pub fn from_config(keys: &[ApiKeyConfig]) -> Self {
        let keys = keys
            .iter()
            .map(|entry| {
                let principal = Principal::new(&entry.name).with_roles(entry.roles.iter().cloned());
                (entry.key.clone(), principal)
            })
            .collect();
        Self {
            keys: Arc::new(keys),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn lookup(&self, key: &str) -> Option<&Principal> {
        self.keys.get(key)
    }
}

/// Inserts the principal of a known bearer key into request extensions.
pub async fn api_key_middleware(
    State(store): State<ApiKeyStore>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let principal = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .and_then(|key| store.lookup(key.trim()))
        .cloned();

    match principal {
        Some(principal) => {
            tracing::debug!(principal = %principal.name, "Request authenticated by API key");
            req.extensions_mut().insert(principal);
        }
        None if req.headers().contains_key(header::AUTHORIZATION) => {
            tracing::debug!("Unknown API key, continuing anonymous");
        }
        None => {}
    }

    next.run(req).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, middleware, routing::get, Router};
    use tower::ServiceExt;

    fn store() -> ApiKeyStore {
        ApiKeyStore::from_config(&[ApiKeyConfig {
            key: "secret".into(),
            name: "alice".into(),
            roles: vec!["Admin".into()],
        }])
    }

    async fn whoami(req: Request<Body>) -> String {
        req.extensions()
            .get::<Principal>()
            .map_or_else(|| "anonymous".to_string(), |p| p.name.clone())
    }

    fn app() -> Router {
        Router::new()
            .route("/whoami", get(whoami))
            .layer(middleware::from_fn_with_state(store(), api_key_middleware))
    }

    async fn call(auth: Option<&str>) -> String {
        let mut builder = Request::builder().uri("/whoami");
        if let Some(auth) = auth {
            builder = builder.header(header::AUTHORIZATION, auth);
        }
        let response = app().oneshot(builder.body(Body::empty()).unwrap()).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        String::from_utf8(body.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_known_key_sets_principal() {
        assert_eq!(call(Some("Bearer secret")).await, "alice");
    }

    #[tokio::test]
    async fn test_unknown_or_missing_key_is_anonymous() {
        assert_eq!(call(Some("Bearer nope")).await, "anonymous");
        assert_eq!(call(None).await, "anonymous");
    }

    #[test]
    fn test_store_roles() {
        let store = store();
        assert!(store.lookup("secret").unwrap().is_in_role("Admin"));
        assert!(store.lookup("other").is_none());
    }
}
