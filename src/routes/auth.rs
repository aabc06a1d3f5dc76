// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Strava OAuth web flow: home page, connect, callback and logout.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::config::STRAVA_OAUTH_SCOPE;
use crate::error::{AppError, Result};
use crate::services::session::generate_session_id;
use crate::AppState;

// Type alias for HMAC-SHA256
type HmacSha256 = Hmac<Sha256>;

/// Browser session cookie.
pub const SESSION_COOKIE: &str = "strava_mcp_session";

/// OAuth round trips older than this are rejected.
const STATE_MAX_AGE_MS: u128 = 15 * 60 * 1000;

const STRAVA_AUTHORIZE_URL: &str = "https://www.strava.com/oauth/authorize";

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(home))
        .route("/auth", get(auth_start))
        .route("/auth/callback", get(auth_callback))
        .route("/logout", get(logout))
}

fn now_millis() -> Result<u128> {
    Ok(SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("System time error: {}", e)))?
        .as_millis())
}

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

const PAGE_STYLE: &str = "font-family: sans-serif; padding: 40px; max-width: 600px; margin: 0 auto;";

fn page(body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>Strava MCP Server</title></head>\n\
         <body style=\"{}\">\n{}\n</body>\n</html>\n",
        PAGE_STYLE, body
    )
}

fn connected_page(public_url: &str) -> String {
    page(&format!(
        "<h1>✅ Connected to Strava!</h1>\n\
         <p>Your MCP server is ready. Send JSON-RPC requests to:</p>\n\
         <pre style=\"background: #f0f0f0; padding: 10px;\">{}/mcp</pre>\n\
         <p><a href=\"/logout\">Disconnect</a></p>",
        escape_html(public_url)
    ))
}

fn connect_page() -> String {
    page(
        "<h1>🏃 Strava MCP Server</h1>\n\
         <p>Connect your Strava account to use this MCP server with AI assistants.</p>\n\
         <a href=\"/auth\" style=\"display: inline-block; background: #fc4c02; color: white; \
         padding: 12px 24px; text-decoration: none; border-radius: 5px; font-weight: bold;\">Connect with Strava</a>\n\
         <h2>Available Tools</h2>\n\
         <ul>\n\
         <li><strong>get_activities</strong> - Get your latest activities</li>\n\
         <li><strong>get_activity</strong> - Get details for a specific activity</li>\n\
         <li><strong>get_stats</strong> - Get your ride/run totals</li>\n\
         <li><strong>detect_generic_named_activities</strong> - Find generic names</li>\n\
         <li><strong>detect_ebike_activities</strong> - Find rides done on an e-bike</li>\n\
         <li><strong>get_activity_details_for_naming</strong> - Get naming info</li>\n\
         <li><strong>rename_activity</strong> - Rename an activity</li>\n\
         <li><strong>update_activity_type</strong> - Change the sport type</li>\n\
         <li><strong>fix_ebike_activity</strong> - Mark a ride as E-Mountain Bike</li>\n\
         </ul>",
    )
}

fn failure_page(status: StatusCode, title: &str, error: &str) -> Response {
    let body = page(&format!(
        "<h1>❌ {}</h1>\n<p>Error: {}</p>\n<a href=\"/\">Try again</a>",
        title,
        escape_html(error)
    ));
    (status, Html(body)).into_response()
}

/// Home page: connection status and connect/disconnect links.
async fn home(State(state): State<Arc<AppState>>, jar: CookieJar) -> Html<String> {
    let connected = match jar.get(SESSION_COOKIE) {
        Some(cookie) => state.sessions.get(cookie.value()).await.is_some(),
        None => false,
    };

    if connected {
        Html(connected_page(&state.config.public_url))
    } else {
        Html(connect_page())
    }
}

/// Start OAuth flow - redirect to Strava authorization.
async fn auth_start(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<(CookieJar, Redirect)> {
    let session_id = generate_session_id()
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to generate session id")))?;

    let oauth_state = sign_state(&session_id, now_millis()?, &state.config.secret_key)?;
    let callback_url = state.config.callback_url();

    let auth_url = format!(
        "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&state={}",
        STRAVA_AUTHORIZE_URL,
        urlencoding::encode(&state.config.strava_client_id),
        urlencoding::encode(&callback_url),
        urlencoding::encode(STRAVA_OAUTH_SCOPE),
        oauth_state
    );

    let cookie = Cookie::build((SESSION_COOKIE, session_id))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(state.config.public_url.starts_with("https://"));

    tracing::info!(
        client_id = %state.config.strava_client_id,
        callback_url = %callback_url,
        "Starting OAuth flow, redirecting to Strava"
    );

    Ok((jar.add(cookie), Redirect::temporary(&auth_url)))
}

#[derive(Deserialize)]
pub struct CallbackParams {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// OAuth callback - exchange code for tokens and bind them to the session.
async fn auth_callback(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(params): Query<CallbackParams>,
) -> Result<Response> {
    if let Some(error) = params.error {
        tracing::warn!(error = %error, "OAuth error from Strava");
        return Ok(failure_page(
            StatusCode::BAD_REQUEST,
            "Authorization Failed",
            &error,
        ));
    }

    let code = params
        .code
        .filter(|c| !c.is_empty())
        .ok_or_else(|| AppError::BadRequest("Missing authorization code".to_string()))?;

    let session_id = params
        .state
        .as_deref()
        .and_then(|s| verify_and_decode_state(s, &state.config.secret_key))
        .filter(|(_, issued_at)| {
            now_millis()
                .map(|now| now.saturating_sub(*issued_at) <= STATE_MAX_AGE_MS)
                .unwrap_or(false)
        })
        .map(|(session_id, _)| session_id)
        .filter(|session_id| {
            jar.get(SESSION_COOKIE)
                .is_some_and(|cookie| cookie.value() == session_id)
        })
        .ok_or_else(|| AppError::BadRequest("Invalid state parameter".to_string()))?;

    tracing::info!("Exchanging authorization code for tokens");

    match state.strava.handle_oauth_callback(&code, &session_id).await {
        Ok(result) => {
            tracing::info!(
                athlete_id = ?result.athlete_id,
                firstname = ?result.firstname,
                "OAuth successful, tokens stored"
            );
            Ok(Redirect::to("/").into_response())
        }
        Err(e) => {
            tracing::error!(error = %e, "OAuth token exchange failed");
            Ok(failure_page(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Token Exchange Failed",
                &e.to_string(),
            ))
        }
    }
}

/// Forget the session's tokens and clear the cookie.
async fn logout(State(state): State<Arc<AppState>>, jar: CookieJar) -> (CookieJar, Redirect) {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        if state.sessions.delete(cookie.value()).await {
            tracing::info!("Session tokens removed");
        }
    }

    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    (jar, Redirect::to("/"))
}

/// Sign `session_id|timestamp_hex` and encode it for the `state` parameter.
pub fn sign_state(session_id: &str, issued_at_ms: u128, secret: &[u8]) -> Result<String> {
    let payload = format!("{}|{:x}", session_id, issued_at_ms);

    let mut mac = HmacSha256::new_from_slice(secret)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("HMAC init failed: {}", e)))?;
    mac.update(payload.as_bytes());
    let signature = mac.finalize().into_bytes();

    let signed_state = format!("{}|{}", payload, hex::encode(signature));
    Ok(URL_SAFE_NO_PAD.encode(signed_state.as_bytes()))
}

/// Verify the HMAC signature of a `state` value.
///
/// Returns the embedded session id and issue time (ms since epoch).
pub fn verify_and_decode_state(state: &str, secret: &[u8]) -> Option<(String, u128)> {
    let bytes = URL_SAFE_NO_PAD.decode(state).ok()?;
    let state_str = String::from_utf8(bytes).ok()?;

    // Format is "session_id|timestamp_hex|signature_hex"
    let parts: Vec<&str> = state_str.splitn(3, '|').collect();
    let [session_id, timestamp_hex, signature_hex] = parts[..] else {
        return None;
    };

    let signature = hex::decode(signature_hex).ok()?;
    let mut mac = HmacSha256::new_from_slice(secret).ok()?;
    mac.update(format!("{}|{}", session_id, timestamp_hex).as_bytes());

    if mac.verify_slice(&signature).is_err() {
        tracing::error!("OAuth state signature mismatch! Potential tampering.");
        return None;
    }

    let issued_at = u128::from_str_radix(timestamp_hex, 16).ok()?;
    Some((session_id.to_string(), issued_at))
}
