// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! MCP endpoint authentication and CORS tests.
//!
//! These tests verify that:
//! 1. `/mcp` rejects requests without a valid bearer token when one is configured
//! 2. `/mcp` accepts the configured token, and is open when none is configured
//! 3. Public routes and CORS preflight bypass the token check

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use serde_json::{json, Value};
use strava_mcp::config::Config;
use strava_mcp::middleware::auth::{INVALID_API_TOKEN, MISSING_AUTH_HEADER};
use tower::ServiceExt;

mod common;

const API_TOKEN: &str = "s3cret-operator-token";

fn guarded_config() -> Config {
    Config {
        api_token: Some(API_TOKEN.to_string()),
        ..Config::default()
    }
}

fn ping_request(authorization: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/mcp")
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(value) = authorization {
        builder = builder.header(header::AUTHORIZATION, value);
    }
    builder
        .body(Body::from(
            json!({"jsonrpc": "2.0", "id": 1, "method": "ping"}).to_string(),
        ))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_mcp_without_token() {
    let app = common::create_test_app(guarded_config(), vec![]);

    let response = app.router.oneshot(ping_request(None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(response).await["detail"], MISSING_AUTH_HEADER);
}

#[tokio::test]
async fn test_mcp_with_non_bearer_scheme() {
    let app = common::create_test_app(guarded_config(), vec![]);

    let response = app
        .router
        .oneshot(ping_request(Some(&format!("Basic {}", API_TOKEN))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_mcp_with_wrong_token() {
    let app = common::create_test_app(guarded_config(), vec![]);

    let response = app
        .router
        .oneshot(ping_request(Some("Bearer not-the-token")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(json_body(response).await["detail"], INVALID_API_TOKEN);
}

#[tokio::test]
async fn test_mcp_with_valid_token() {
    let app = common::create_test_app(guarded_config(), vec![]);

    let response = app
        .router
        .oneshot(ping_request(Some(&format!("Bearer {}", API_TOKEN))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["id"], 1);
    assert_eq!(body["result"], json!({}));
}

#[tokio::test]
async fn test_mcp_open_without_configured_token() {
    let app = common::create_test_app(Config::default(), vec![]);

    let response = app.router.oneshot(ping_request(None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_public_route_no_auth_required() {
    let app = common::create_test_app(guarded_config(), vec![]);

    let response = app
        .router
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    // Health should be accessible without auth
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("x-content-type-options").unwrap(),
        "nosniff"
    );
    let body = json_body(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_cors_preflight() {
    let app = common::create_test_app(guarded_config(), vec![]);

    let response = app
        .router
        .oneshot(
            Request::builder()
                .method("OPTIONS")
                .uri("/mcp")
                .header(header::ORIGIN, "https://claude.ai")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    // OPTIONS should return 200 (CORS preflight success)
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response
        .headers()
        .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
    assert!(response
        .headers()
        .contains_key(header::ACCESS_CONTROL_ALLOW_METHODS));
}
