//! Integration tests for HTTP authentication middleware

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod common;

use axum::http::{Method, StatusCode};
use common::*;
use pkgshare::http::auth::{AuthMiddleware, JwtService};
use serde_json::json;
use std::sync::Arc;

fn jwt_service() -> Arc<JwtService> {
    Arc::new(JwtService::new("test-secret", "pkgshare", 3600))
}

async fn issue_token(app: &axum::Router, username: &str) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/auth/token",
        None,
        Some(json!({ "username": username })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["token_type"], "Bearer");
    assert_eq!(body["principal"], username);
    format!("Bearer {}", body["token"].as_str().unwrap())
}

#[tokio::test]
async fn test_jwt_mode_resolves_subject() {
    let app = router_with(AuthMiddleware::jwt(jwt_service())).await;
    let owner = issue_token(&app, OWNER).await;
    let other = issue_token(&app, OTHER).await;

    let (status, body) = send(
        &app,
        Method::PUT,
        &package_url(OWNER, PKG),
        Some(&owner),
        Some(json!({"hash": "123", "description": ""})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["created_by"], OWNER);

    let (status, _) = send(&app, Method::GET, &package_url(OWNER, PKG), Some(&other), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        Method::PUT,
        &access_url(OWNER, PKG, OTHER),
        Some(&owner),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, Method::GET, &package_url(OWNER, PKG), Some(&other), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_jwt_mode_rejects_bad_credentials() {
    let app = router_with(AuthMiddleware::jwt(jwt_service())).await;

    // A plain principal name is not accepted as a token
    let (status, body) = send(&app, Method::GET, &package_url(OWNER, PKG), Some(OWNER), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");

    let forged = JwtService::new("other-secret", "pkgshare", 3600)
        .generate_token(OWNER)
        .unwrap();
    let (status, _) = send(
        &app,
        Method::GET,
        &package_url(OWNER, PKG),
        Some(&format!("Bearer {}", forged.token)),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // No header is an anonymous caller, not an error
    let (status, _) = send(&app, Method::GET, &package_url(OWNER, PKG), None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_token_for_public_is_refused() {
    let app = router_with(AuthMiddleware::jwt(jwt_service())).await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/auth/token",
        None,
        Some(json!({ "username": pkgshare::PUBLIC })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_token_endpoint_requires_jwt_mode() {
    let app = plain_router().await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/auth/token",
        None,
        Some(json!({ "username": OWNER })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(&app, Method::GET, "/api/status", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["auth_mode"], "plain");
}

#[tokio::test]
async fn test_plain_mode_trims_header() {
    let app = router_with_package().await;

    let (status, _) = send(
        &app,
        Method::GET,
        &package_url(OWNER, PKG),
        Some(&format!("  {}  ", OWNER)),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}
