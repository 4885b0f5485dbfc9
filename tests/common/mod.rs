//! Shared helpers for HTTP integration tests

#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use pkgshare::http::auth::AuthMiddleware;
use pkgshare::http::create_router;
use pkgshare::http::handlers::AppState;
use pkgshare::{RegistryService, ServiceConfig};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

pub const OWNER: &str = "test_user";
pub const PKG: &str = "pkgtoshare";
pub const OTHER: &str = "anotheruser";

/// Router over a fresh in-memory registry
pub async fn router_with(auth: AuthMiddleware) -> Router {
    let mut service = RegistryService::new(ServiceConfig::default()).await.unwrap();
    service.initialize().await.unwrap();
    create_router(AppState::new(Arc::new(service), auth))
}

pub async fn plain_router() -> Router {
    router_with(AuthMiddleware::plain()).await
}

/// Send a request; `authorization` is the raw header value
pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    authorization: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(value) = authorization {
        builder = builder.header(header::AUTHORIZATION, value);
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    send_request(app, request).await
}

/// Send a prebuilt request and decode the JSON body
pub async fn send_request(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

pub fn package_url(owner: &str, pkg: &str) -> String {
    format!("/api/package/{}/{}", owner, pkg)
}

pub fn access_url(owner: &str, pkg: &str, principal: &str) -> String {
    format!("/api/access/{}/{}/{}", owner, pkg, principal)
}

pub async fn push(app: &Router, as_user: &str, hash: &str) -> (StatusCode, Value) {
    send(
        app,
        Method::PUT,
        &package_url(OWNER, PKG),
        Some(as_user),
        Some(serde_json::json!({"hash": hash, "description": ""})),
    )
    .await
}

pub async fn share(app: &Router, with: &str) -> StatusCode {
    send(app, Method::PUT, &access_url(OWNER, PKG, with), Some(OWNER), None)
        .await
        .0
}

pub async fn unshare(app: &Router, with: &str) -> StatusCode {
    send(app, Method::DELETE, &access_url(OWNER, PKG, with), Some(OWNER), None)
        .await
        .0
}

pub async fn read(app: &Router, as_user: Option<&str>) -> StatusCode {
    send(app, Method::GET, &package_url(OWNER, PKG), as_user, None)
        .await
        .0
}

/// Router holding `test_user/pkgtoshare` with hash `123`
pub async fn router_with_package() -> Router {
    let app = plain_router().await;
    let (status, _) = push(&app, OWNER, "123").await;
    assert_eq!(status, StatusCode::OK);
    app
}

pub fn users(body: &Value) -> Vec<String> {
    body["users"]
        .as_array()
        .expect("users array")
        .iter()
        .map(|u| u.as_str().expect("user string").to_string())
        .collect()
}
