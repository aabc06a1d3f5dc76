// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! A `.env` file is honoured for local development. Strava client
//! credentials are mandatory; everything else has a default.

use std::env;

/// Default public URL of the web flow (also the OAuth redirect base).
pub const DEFAULT_PUBLIC_URL: &str = "http://localhost:7860";

/// Default Nominatim instance used for reverse geocoding.
pub const DEFAULT_GEOCODER_URL: &str = "https://nominatim.openstreetmap.org";

/// OAuth scopes requested from Strava.
pub const STRAVA_OAUTH_SCOPE: &str = "read,activity:read_all,activity:write,profile:read_all";

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Strava OAuth client ID (public)
    pub strava_client_id: String,
    /// Strava OAuth client secret
    pub strava_client_secret: String,
    /// Pre-issued access token (stdio mode, or fallback for the web flow)
    pub strava_access_token: Option<String>,
    /// Pre-issued refresh token
    pub strava_refresh_token: Option<String>,
    /// Public base URL of this server, used for the OAuth callback
    pub public_url: String,
    /// Server port
    pub port: u16,
    /// Key used to sign the OAuth `state` parameter (raw bytes)
    pub secret_key: Vec<u8>,
    /// Bearer token guarding the MCP endpoint; open when unset
    pub api_token: Option<String>,
    /// Reverse geocoding base URL
    pub geocoder_url: String,
    /// Whether reverse geocoding is performed at all
    pub geocoder_enabled: bool,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            strava_client_id: "test_client_id".to_string(),
            strava_client_secret: "test_secret".to_string(),
            strava_access_token: None,
            strava_refresh_token: None,
            public_url: DEFAULT_PUBLIC_URL.to_string(),
            port: 7860,
            secret_key: b"test_secret_key_32_bytes_minimum".to_vec(),
            api_token: None,
            geocoder_url: DEFAULT_GEOCODER_URL.to_string(),
            geocoder_enabled: false,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let secret_key = match non_empty_var("SECRET_KEY") {
            Some(key) => key.into_bytes(),
            None => {
                tracing::warn!("SECRET_KEY not set, generating an ephemeral key");
                random_key()?
            }
        };

        Ok(Self {
            strava_client_id: non_empty_var("STRAVA_CLIENT_ID")
                .ok_or(ConfigError::Missing("STRAVA_CLIENT_ID"))?,
            strava_client_secret: non_empty_var("STRAVA_CLIENT_SECRET")
                .ok_or(ConfigError::Missing("STRAVA_CLIENT_SECRET"))?,
            strava_access_token: non_empty_var("STRAVA_ACCESS_TOKEN"),
            strava_refresh_token: non_empty_var("STRAVA_REFRESH_TOKEN"),
            public_url: non_empty_var("PUBLIC_URL")
                .or_else(|| non_empty_var("SPACE_URL"))
                .unwrap_or_else(|| DEFAULT_PUBLIC_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            port: env::var("PORT")
                .unwrap_or_else(|_| "7860".to_string())
                .parse()
                .unwrap_or(7860),
            secret_key,
            api_token: non_empty_var("API_TOKEN"),
            geocoder_url: non_empty_var("GEOCODER_URL")
                .unwrap_or_else(|| DEFAULT_GEOCODER_URL.to_string()),
            geocoder_enabled: env::var("GEOCODER_ENABLED")
                .map(|v| !matches!(v.trim(), "0" | "false" | "no"))
                .unwrap_or(true),
        })
    }

    /// Require the pre-issued token pair (stdio mode has no web flow).
    pub fn require_env_tokens(&self) -> Result<(String, String), ConfigError> {
        let access = self
            .strava_access_token
            .clone()
            .ok_or(ConfigError::Missing("STRAVA_ACCESS_TOKEN"))?;
        let refresh = self
            .strava_refresh_token
            .clone()
            .ok_or(ConfigError::Missing("STRAVA_REFRESH_TOKEN"))?;
        Ok((access, refresh))
    }

    /// OAuth callback URL registered with Strava.
    pub fn callback_url(&self) -> String {
        format!("{}/auth/callback", self.public_url)
    }
}

/// Read an env var, trimming whitespace and treating empty values as unset.
fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn random_key() -> Result<Vec<u8>, ConfigError> {
    use ring::rand::{SecureRandom, SystemRandom};

    let mut key = vec![0u8; 32];
    SystemRandom::new()
        .fill(&mut key)
        .map_err(|_| ConfigError::Random)?;
    Ok(key)
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Failed to generate a random secret key")]
    Random,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env() {
        // Set required env vars for test
        env::set_var("STRAVA_CLIENT_ID", "test_id");
        env::set_var("STRAVA_CLIENT_SECRET", " test_secret ");
        env::set_var("SECRET_KEY", "test_secret_key");
        env::set_var("PUBLIC_URL", "https://example.hf.space/");

        let config = Config::from_env().expect("Config should load");

        assert_eq!(config.strava_client_id, "test_id");
        assert_eq!(config.strava_client_secret, "test_secret");
        assert_eq!(config.secret_key, b"test_secret_key".to_vec());
        assert_eq!(
            config.callback_url(),
            "https://example.hf.space/auth/callback"
        );
    }

    #[test]
    fn test_require_env_tokens_missing() {
        let config = Config::default();
        let err = config.require_env_tokens().unwrap_err();
        assert!(matches!(err, ConfigError::Missing("STRAVA_ACCESS_TOKEN")));
    }

    #[test]
    fn test_require_env_tokens_present() {
        let config = Config {
            strava_access_token: Some("access".to_string()),
            strava_refresh_token: Some("refresh".to_string()),
            ..Config::default()
        };
        let (access, refresh) = config.require_env_tokens().unwrap();
        assert_eq!(access, "access");
        assert_eq!(refresh, "refresh");
    }
}
