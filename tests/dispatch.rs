//! Dispatcher behaviour driven in-process through the layered router.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use interface_bridge::{
    BridgeConfig, BridgeDefinition, BridgeServer, BridgeService, OperationSpec, RouteDispatcher, ServiceError,
};
use tower::ServiceExt;

struct Echo;

impl Echo {
    async fn echo(self: Arc<Self>, id: String, name: Option<String>, count: i32) -> Result<String, ServiceError> {
        Ok(format!("{id}/{}/{count}", name.unwrap_or_default()))
    }

    async fn nothing(self: Arc<Self>, id: String) -> Result<Option<String>, ServiceError> {
        Ok((id != "none").then_some(id))
    }
}

fn router() -> Router {
    let definition = Arc::new(
        BridgeDefinition::builder("Echo")
            .prefix("echo")
            .operation(
                OperationSpec::post("echo", "{id}")
                    .param::<String>("id")
                    .param::<Option<String>>("name")
                    .param::<i32>("count")
                    .returns::<String>(),
            )
            .operation(
                OperationSpec::get("nothing", "maybe/{id}")
                    .param::<String>("id")
                    .returns::<Option<String>>(),
            )
            .build()
            .unwrap(),
    );
    let service = BridgeService::new(definition, Echo)
        .handle("echo", Echo::echo)
        .handle("nothing", Echo::nothing);
    let dispatcher = RouteDispatcher::default().mount(service).unwrap();
    BridgeServer::new(&BridgeConfig::default(), dispatcher).router()
}

async fn send(request: Request<Body>) -> (StatusCode, String) {
    let response = router().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), 1 << 16).await.unwrap();
    (status, String::from_utf8(body.to_vec()).unwrap())
}

fn form(uri: &str, body: &str) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_route_value_wins_over_query_and_form() {
    let (status, body) = send(form("/echo/route?id=query&name=query", "id=form&name=form&count=2")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "route/query/2");
}

#[tokio::test]
async fn test_query_wins_over_form() {
    let (_, body) = send(form("/echo/1?count=5", "count=3&name=form")).await;
    assert_eq!(body, "1/form/5");
}

#[tokio::test]
async fn test_missing_and_empty_values_use_defaults() {
    let (status, body) = send(form("/echo/1", "name=&count=")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "1//0");
}

#[tokio::test]
async fn test_undecodable_scalar_is_400() {
    let (status, body) = send(form("/echo/1", "count=lots")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("count"), "{body}");
}

#[tokio::test]
async fn test_null_result_is_204() {
    let (status, body) = send(Request::get("/echo/maybe/none").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_empty());

    let (status, body) = send(Request::get("/echo/maybe/some").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "some");
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let (status, _) = send(Request::get("/echo/1/extra").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
