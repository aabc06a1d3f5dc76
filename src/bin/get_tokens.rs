// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Obtain a Strava access/refresh token pair for stdio mode.
//!
//! Runs the OAuth authorization-code flow against a one-shot callback
//! server on localhost and prints the `STRAVA_*_TOKEN` lines to paste
//! into `.env`.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use clap::Parser;
use serde::Deserialize;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use strava_mcp::config::STRAVA_OAUTH_SCOPE;
use strava_mcp::routes::auth::{sign_state, verify_and_decode_state};
use strava_mcp::services::session::generate_session_id;
use strava_mcp::services::strava::TokenExchangeResponse;
use strava_mcp::services::StravaClient;
use tokio::sync::{mpsc, Mutex};

#[derive(Parser, Debug)]
#[command(about = "Fetch Strava OAuth tokens for the MCP server")]
struct Args {
    /// Strava client ID (defaults to STRAVA_CLIENT_ID)
    #[arg(long, env = "STRAVA_CLIENT_ID")]
    client_id: String,

    /// Strava client secret (defaults to STRAVA_CLIENT_SECRET)
    #[arg(long, env = "STRAVA_CLIENT_SECRET", hide_env_values = true)]
    client_secret: String,

    /// Local port for the OAuth callback
    #[arg(long, default_value_t = 8000)]
    port: u16,
}

type Outcome = Result<TokenExchangeResponse, String>;

struct CallbackState {
    client: StravaClient,
    /// Value embedded in the signed `state` of this run's authorize URL
    nonce: String,
    secret: Vec<u8>,
    done: Mutex<Option<mpsc::Sender<Outcome>>>,
}

#[derive(Deserialize)]
struct CallbackParams {
    code: Option<String>,
    error: Option<String>,
    state: Option<String>,
}

/// True when `state` was signed by this run for `nonce`.
fn state_matches(state: Option<&str>, nonce: &str, secret: &[u8]) -> bool {
    state
        .and_then(|s| verify_and_decode_state(s, secret))
        .is_some_and(|(signed_nonce, _)| signed_nonce == nonce)
}

const SUCCESS_PAGE: &str = "<html><body style=\"font-family: sans-serif; padding: 40px;\">\
<h1>Success!</h1><p>Tokens received. Check your terminal for the new tokens.</p>\
<p>You can close this window.</p></body></html>";

async fn authorized(
    State(state): State<Arc<CallbackState>>,
    Query(params): Query<CallbackParams>,
) -> Response {
    // Stray requests must not end the wait for the real callback
    if !state_matches(params.state.as_deref(), &state.nonce, &state.secret) {
        tracing::warn!("Ignoring callback with missing or foreign state");
        return (StatusCode::BAD_REQUEST, "Invalid state parameter").into_response();
    }

    let (outcome, response) = match (params.code, params.error) {
        (Some(code), _) => match state.client.exchange_code(&code).await {
            Ok(tokens) => (Ok(tokens), Html(SUCCESS_PAGE).into_response()),
            Err(e) => (
                Err(format!("Error exchanging code: {}", e)),
                StatusCode::INTERNAL_SERVER_ERROR.into_response(),
            ),
        },
        (None, error) => (
            Err(format!(
                "Authorization failed: {}",
                error.unwrap_or_else(|| "Unknown".to_string())
            )),
            StatusCode::BAD_REQUEST.into_response(),
        ),
    };

    // Only the first callback counts
    if let Some(done) = state.done.lock().await.take() {
        let _ = done.send(outcome).await;
    }
    response
}

fn authorize_url(client_id: &str, redirect_uri: &str, state: &str) -> String {
    format!(
        "https://www.strava.com/oauth/authorize?client_id={}&redirect_uri={}&response_type=code&approval_prompt=force&scope={}&state={}",
        urlencoding::encode(client_id),
        urlencoding::encode(redirect_uri),
        urlencoding::encode(STRAVA_OAUTH_SCOPE),
        state
    )
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let args = Args::parse();
    let redirect_uri = format!("http://localhost:{}/authorized", args.port);

    let nonce = generate_session_id().ok_or_else(|| anyhow::anyhow!("no system randomness"))?;
    let secret = generate_session_id()
        .ok_or_else(|| anyhow::anyhow!("no system randomness"))?
        .into_bytes();
    let issued_at = SystemTime::now().duration_since(UNIX_EPOCH)?.as_millis();
    let signed_state = sign_state(&nonce, issued_at, &secret)?;

    let (tx, mut rx) = mpsc::channel::<Outcome>(1);
    let state = Arc::new(CallbackState {
        client: StravaClient::new(args.client_id.clone(), args.client_secret),
        nonce,
        secret,
        done: Mutex::new(Some(tx)),
    });

    let app = Router::new()
        .route("/authorized", get(authorized))
        .with_state(state);
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", args.port)).await?;

    println!("\n1. Open this URL in your browser to authorize:\n");
    println!(
        "   {}\n",
        authorize_url(&args.client_id, &redirect_uri, &signed_state)
    );
    println!(
        "2. Waiting for Strava callback on http://localhost:{} ...",
        args.port
    );
    println!("   (Press Ctrl+C to cancel)\n");

    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
    let server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = stop_rx.await;
            })
            .await
    });

    let outcome = rx
        .recv()
        .await
        .ok_or_else(|| anyhow::anyhow!("callback server stopped unexpectedly"))?;
    let _ = stop_tx.send(());
    server.await??;

    match outcome {
        Ok(tokens) => {
            if let Some(athlete) = tokens.athlete.as_ref() {
                println!(
                    "✅ Authorized athlete {} ({})",
                    athlete.id,
                    athlete.firstname.as_deref().unwrap_or("unknown")
                );
            }
            println!("\n{}", "=".repeat(50));
            println!("Copy these to your .env file and MCP client config:");
            println!("{}", "=".repeat(50));
            println!("STRAVA_ACCESS_TOKEN={}", tokens.access_token);
            println!("STRAVA_REFRESH_TOKEN={}", tokens.refresh_token);
            Ok(())
        }
        Err(message) => {
            eprintln!("\n❌ {}", message);
            std::process::exit(1);
        }
    }
}
