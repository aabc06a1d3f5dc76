// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Bearer-token gate for the MCP endpoint.
//!
//! Open when no `API_TOKEN` is configured.

use crate::AppState;
use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use subtle::ConstantTimeEq;

pub const MISSING_AUTH_HEADER: &str = "Missing or invalid Authorization header";
pub const INVALID_API_TOKEN: &str = "Invalid API token";

fn reject(status: StatusCode, detail: &str) -> Response {
    (status, Json(json!({ "detail": detail }))).into_response()
}

/// Middleware that requires `Authorization: Bearer <API_TOKEN>`.
pub async fn require_api_token(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let Some(expected) = state.config.api_token.as_deref() else {
        return next.run(request).await;
    };

    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let token = match auth_header.and_then(|h| h.strip_prefix("Bearer ")) {
        Some(token) => token,
        None => return reject(StatusCode::UNAUTHORIZED, MISSING_AUTH_HEADER),
    };

    if !bool::from(token.as_bytes().ct_eq(expected.as_bytes())) {
        tracing::warn!("Rejected MCP request with invalid API token");
        return reject(StatusCode::FORBIDDEN, INVALID_API_TOKEN);
    }

    next.run(request).await
}
