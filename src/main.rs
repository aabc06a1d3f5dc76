// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Strava MCP Server
//!
//! Serves Strava activity tools to AI assistants over MCP, either as an
//! HTTP service with the OAuth connect flow or over stdin/stdout.

use clap::{Parser, Subcommand};
use std::sync::Arc;
use strava_mcp::{config::Config, mcp::transport, AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(version, about = "Strava tools for AI assistants over MCP")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the web flow and `POST /mcp` over HTTP (default)
    Serve,
    /// Speak MCP over stdin/stdout using STRAVA_ACCESS_TOKEN/STRAVA_REFRESH_TOKEN
    Stdio,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize structured JSON logging
    init_logging()?;

    // Load configuration from environment
    let config = Config::from_env()?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::Stdio => {
            config.require_env_tokens()?;
            let state = AppState::from_config(config)?;
            transport::run_stdio(state.mcp.clone()).await?;
            Ok(())
        }
    }
}

async fn serve(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let port = config.port;
    tracing::info!(
        port,
        public_url = %config.public_url,
        api_token = config.api_token.is_some(),
        geocoder = config.geocoder_enabled,
        "Starting Strava MCP server"
    );
    if config.api_token.is_none() {
        tracing::warn!("API_TOKEN not set, /mcp is open to anyone who can reach it");
    }
    tracing::warn!(
        "Strava account is shared: whoever last completes /auth is the athlete every /mcp caller acts on"
    );

    // Build shared state and router
    let state = Arc::new(AppState::from_config(config)?);
    let app = strava_mcp::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging on stderr.
///
/// stdout is reserved for protocol frames in stdio mode.
fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            EnvFilter::from_default_env()
                .add_directive("strava_mcp=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}
