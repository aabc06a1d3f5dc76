// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! strava-mcp: Strava activity tools for AI assistants
//!
//! This crate exposes Strava activities through the Model Context Protocol,
//! with heuristics for spotting generic activity names and rides recorded
//! on an e-bike, plus the OAuth web flow that connects a Strava account.

pub mod config;
pub mod error;
pub mod mcp;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use error::AppError;
use mcp::McpProcessor;
use services::{
    FitnessApi, InMemorySessionStore, LocationResolver, NoopGeocoder, NominatimGeocoder,
    ReverseGeocoder, SessionStore, StravaClient, StravaService, ToolService,
};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub sessions: Arc<dyn SessionStore>,
    /// OAuth exchange and credential handling
    pub strava: StravaService,
    pub mcp: McpProcessor,
}

impl AppState {
    /// Wire the production services from configuration.
    pub fn from_config(config: Config) -> Result<Self, AppError> {
        let sessions: Arc<dyn SessionStore> = Arc::new(InMemorySessionStore::new());

        let env_tokens = config
            .strava_access_token
            .clone()
            .zip(config.strava_refresh_token.clone());
        let strava = StravaService::new(
            StravaClient::new(
                config.strava_client_id.clone(),
                config.strava_client_secret.clone(),
            ),
            sessions.clone(),
            env_tokens,
        );

        let geocoder: Arc<dyn ReverseGeocoder> = if config.geocoder_enabled {
            let nominatim = NominatimGeocoder::new(&config.geocoder_url).map_err(|e| {
                AppError::Config(format!("Failed to build geocoding client: {}", e))
            })?;
            Arc::new(nominatim)
        } else {
            tracing::info!("Reverse geocoding disabled");
            Arc::new(NoopGeocoder)
        };

        let api: Arc<dyn FitnessApi> = Arc::new(strava.clone());
        Ok(Self::from_parts(config, sessions, strava, api, geocoder))
    }

    /// Assemble state from explicit collaborators.
    pub fn from_parts(
        config: Config,
        sessions: Arc<dyn SessionStore>,
        strava: StravaService,
        api: Arc<dyn FitnessApi>,
        geocoder: Arc<dyn ReverseGeocoder>,
    ) -> Self {
        let tools = ToolService::new(api, LocationResolver::new(geocoder));
        Self {
            config,
            sessions,
            strava,
            mcp: McpProcessor::new(tools),
        }
    }
}
