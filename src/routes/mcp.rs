// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! MCP over HTTP: one JSON-RPC message per POST.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde_json::Value;
use std::sync::Arc;

use crate::mcp::jsonrpc::{JsonRpcResponse, PARSE_ERROR};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/mcp", post(handle_mcp))
}

/// Notifications are acknowledged with 202 and no body.
async fn handle_mcp(
    State(state): State<Arc<AppState>>,
    body: std::result::Result<Json<Value>, JsonRejection>,
) -> Response {
    let Json(message) = match body {
        Ok(body) => body,
        Err(rejection) => {
            tracing::warn!(error = %rejection.body_text(), "Malformed MCP request body");
            let response = JsonRpcResponse::error(
                None,
                PARSE_ERROR,
                format!("Parse error: {}", rejection.body_text()),
            );
            return (StatusCode::OK, Json(response)).into_response();
        }
    };

    match state.mcp.handle_value(message).await {
        Some(response) => (StatusCode::OK, Json(response)).into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    }
}
