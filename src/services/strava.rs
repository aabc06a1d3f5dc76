// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Strava API client for reading and updating activities.
//!
//! Handles:
//! - Activity listing (paginated) and detail fetches
//! - Activity name / sport type updates
//! - Athlete statistics
//! - OAuth code exchange and token refresh

use crate::error::AppError;
use crate::models::{Activity, ActivityUpdate, AthleteStats};
use crate::services::session::{SessionStore, SessionTokens, ENV_SESSION_ID};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const STRAVA_API_URL: &str = "https://www.strava.com/api/v3";
const STRAVA_TOKEN_URL: &str = "https://www.strava.com/oauth/token";

/// Strava caps `per_page` at 200.
pub const MAX_PER_PAGE: usize = 200;

/// Operations the tool surface needs from the fitness platform.
#[async_trait]
pub trait FitnessApi: Send + Sync {
    /// Most recent activities, newest first.
    async fn list_activities(&self, limit: usize) -> Result<Vec<Activity>, AppError>;

    async fn get_activity(&self, activity_id: u64) -> Result<Activity, AppError>;

    /// Totals of the authenticated athlete.
    async fn get_athlete_stats(&self) -> Result<AthleteStats, AppError>;

    /// Apply a partial update and return the updated activity.
    async fn update_activity(
        &self,
        activity_id: u64,
        update: &ActivityUpdate,
    ) -> Result<Activity, AppError>;
}

/// Strava API client.
#[derive(Clone)]
pub struct StravaClient {
    http: reqwest::Client,
    base_url: String,
    token_url: String,
    client_id: String,
    client_secret: String,
}

impl StravaClient {
    /// Create a new Strava client with OAuth credentials.
    pub fn new(client_id: String, client_secret: String) -> Self {
        Self::with_urls(client_id, client_secret, STRAVA_API_URL, STRAVA_TOKEN_URL)
    }

    /// Client against non-default endpoints.
    pub fn with_urls(
        client_id: String,
        client_secret: String,
        base_url: &str,
        token_url: &str,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token_url: token_url.to_string(),
            client_id,
            client_secret,
        }
    }

    /// List the latest `limit` activities, paging as needed.
    pub async fn list_activities(
        &self,
        access_token: &str,
        limit: usize,
    ) -> Result<Vec<Activity>, AppError> {
        let url = format!("{}/athlete/activities", self.base_url);
        let per_page = limit.clamp(1, MAX_PER_PAGE);
        let mut activities = Vec::with_capacity(limit);
        let mut page = 1u32;

        while activities.len() < limit {
            let response = self
                .http
                .get(&url)
                .bearer_auth(access_token)
                .query(&[("page", page.to_string()), ("per_page", per_page.to_string())])
                .send()
                .await
                .map_err(|e| AppError::StravaApi(e.to_string()))?;

            let batch: Vec<Activity> = self.check_response_json(response).await?;
            let exhausted = batch.len() < per_page;
            activities.extend(batch);

            if exhausted {
                break;
            }
            page += 1;
        }

        activities.truncate(limit);
        tracing::debug!(count = activities.len(), pages = page, "Listed activities");
        Ok(activities)
    }

    /// Get a detailed activity by ID.
    pub async fn get_activity(
        &self,
        access_token: &str,
        activity_id: u64,
    ) -> Result<Activity, AppError> {
        let url = format!("{}/activities/{}", self.base_url, activity_id);
        self.get_json(&url, access_token).await
    }

    /// Update name and/or sport type of an activity.
    pub async fn update_activity(
        &self,
        access_token: &str,
        activity_id: u64,
        update: &ActivityUpdate,
    ) -> Result<Activity, AppError> {
        let url = format!("{}/activities/{}", self.base_url, activity_id);

        let response = self
            .http
            .put(&url)
            .bearer_auth(access_token)
            .json(update)
            .send()
            .await
            .map_err(|e| AppError::StravaApi(e.to_string()))?;

        self.check_response_json(response).await
    }

    /// Get authenticated athlete profile.
    pub async fn get_athlete(&self, access_token: &str) -> Result<StravaAthlete, AppError> {
        let url = format!("{}/athlete", self.base_url);
        self.get_json(&url, access_token).await
    }

    /// Ride/run totals of an athlete.
    pub async fn get_athlete_stats(
        &self,
        access_token: &str,
        athlete_id: u64,
    ) -> Result<AthleteStats, AppError> {
        let url = format!("{}/athletes/{}/stats", self.base_url, athlete_id);
        self.get_json(&url, access_token).await
    }

    /// Refresh an expired access token.
    pub async fn refresh_token(
        &self,
        refresh_token: &str,
    ) -> Result<TokenRefreshResponse, AppError> {
        let response = self
            .http
            .post(&self.token_url)
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("refresh_token", refresh_token),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await
            .map_err(|e| AppError::StravaApi(format!("Token refresh request failed: {}", e)))?;

        self.check_response_json(response).await
    }

    /// Exchange an authorization code for tokens.
    pub async fn exchange_code(&self, code: &str) -> Result<TokenExchangeResponse, AppError> {
        let response = self
            .http
            .post(&self.token_url)
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("code", code),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .map_err(|e| AppError::StravaApi(format!("Token exchange failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "Strava token exchange failed");
            return Err(AppError::StravaApi(format!(
                "Token exchange failed with status {}",
                status
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::StravaApi(format!("Failed to parse token response: {}", e)))
    }

    /// Generic GET request with JSON response.
    async fn get_json<T: for<'de> Deserialize<'de>>(
        &self,
        url: &str,
        access_token: &str,
    ) -> Result<T, AppError> {
        let response = self
            .http
            .get(url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AppError::StravaApi(e.to_string()))?;

        self.check_response_json(response).await
    }

    /// Check response and parse JSON body.
    async fn check_response_json<T: for<'de> Deserialize<'de>>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, AppError> {
        let status = response.status();
        if !status.is_success() {
            let url = response.url().path().to_string();
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status.as_u16(), &url, &body));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::StravaApi(format!("JSON parse error: {}", e)))
    }
}

/// Map a non-success Strava status to an application error.
fn status_error(status: u16, path: &str, body: &str) -> AppError {
    match status {
        429 => {
            tracing::warn!("Strava rate limit hit (429)");
            AppError::RateLimited
        }
        401 => AppError::StravaApi(AppError::STRAVA_TOKEN_ERROR.to_string()),
        404 => AppError::NotFound(path.to_string()),
        _ => AppError::StravaApi(format!("HTTP {}: {}", status, body)),
    }
}

/// Token refresh response from Strava.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenRefreshResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: i64,
}

/// Token exchange response from Strava OAuth (includes athlete info).
#[derive(Debug, Clone, Deserialize)]
pub struct TokenExchangeResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: i64,
    #[serde(default)]
    pub athlete: Option<StravaAthlete>,
}

/// Athlete profile (subset).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StravaAthlete {
    pub id: u64,
    #[serde(default)]
    pub firstname: Option<String>,
    #[serde(default)]
    pub lastname: Option<String>,
}

/// Result of handling OAuth callback.
#[derive(Debug, Clone)]
pub struct OAuthResult {
    pub athlete_id: Option<u64>,
    pub firstname: Option<String>,
}

// ─── Service ────────────────────────────────────────────────

/// High-level Strava service that owns credential lookup and refresh.
///
/// Credentials come from the most recently stored session, falling back to
/// the token pair supplied through the environment. There is one shared
/// account per process: whoever last completed `/auth` is the athlete every
/// MCP caller reads and modifies.
///
/// Expiring tokens are refreshed best-effort: a failed refresh is logged and
/// the stale token is used as-is. A session whose token Strava rejects is
/// dropped, so the next call falls back to the next credential.
#[derive(Clone)]
pub struct StravaService {
    client: StravaClient,
    sessions: Arc<dyn SessionStore>,
    env_tokens: Option<(String, String)>,
}

impl StravaService {
    pub fn new(
        client: StravaClient,
        sessions: Arc<dyn SessionStore>,
        env_tokens: Option<(String, String)>,
    ) -> Self {
        Self {
            client,
            sessions,
            env_tokens,
        }
    }

    // ─── Token Management ───────────────────────────────────────

    /// Get an access token, refreshing it first if it is about to expire.
    pub async fn access_token(&self) -> Result<String, AppError> {
        self.credentials().await.map(|(_, token)| token)
    }

    /// Session id and access token to use for the next API call.
    async fn credentials(&self) -> Result<(String, String), AppError> {
        let (session_id, tokens) = match self.sessions.most_recent().await {
            Some(found) => found,
            None => match &self.env_tokens {
                Some((access, refresh)) => (
                    ENV_SESSION_ID.to_string(),
                    SessionTokens::new(access.clone(), refresh.clone(), None),
                ),
                None => {
                    return Err(AppError::Unauthorized(
                        AppError::NOT_AUTHENTICATED.to_string(),
                    ))
                }
            },
        };

        if !tokens.needs_refresh(chrono::Utc::now()) {
            return Ok((session_id, tokens.access_token));
        }

        match self.client.refresh_token(&tokens.refresh_token).await {
            Ok(new_tokens) => {
                let mut refreshed = SessionTokens::from_unix_expiry(
                    new_tokens.access_token,
                    new_tokens.refresh_token,
                    new_tokens.expires_at,
                );
                // keep the session's position in most_recent ordering
                if session_id != ENV_SESSION_ID {
                    refreshed.stored_at = tokens.stored_at;
                }
                let access_token = refreshed.access_token.clone();
                self.sessions.put(&session_id, refreshed).await;
                tracing::info!("Access token refreshed");
                Ok((session_id, access_token))
            }
            Err(e) => {
                tracing::warn!(error = %e, "Token refresh failed, using existing access token");
                Ok((session_id, tokens.access_token))
            }
        }
    }

    /// Drop the session behind a token Strava rejected.
    async fn forget_if_rejected<T>(
        &self,
        session_id: &str,
        result: Result<T, AppError>,
    ) -> Result<T, AppError> {
        if let Err(e) = &result {
            if e.is_strava_token_error() && self.sessions.delete(session_id).await {
                tracing::warn!(session_id, "Strava rejected stored token, session dropped");
            }
        }
        result
    }

    // ─── OAuth Callback Handling ────────────────────────────────

    /// Exchange the OAuth code and store the tokens under `session_id`.
    pub async fn handle_oauth_callback(
        &self,
        code: &str,
        session_id: &str,
    ) -> Result<OAuthResult, AppError> {
        let response = self.client.exchange_code(code).await?;

        let tokens = SessionTokens::from_unix_expiry(
            response.access_token,
            response.refresh_token,
            response.expires_at,
        );
        self.sessions.put(session_id, tokens).await;

        let athlete_id = response.athlete.as_ref().map(|a| a.id);
        tracing::info!(?athlete_id, "OAuth callback handled, tokens stored");

        Ok(OAuthResult {
            athlete_id,
            firstname: response.athlete.and_then(|a| a.firstname),
        })
    }
}

// ─── API Wrappers ───────────────────────────────────────────────

#[async_trait]
impl FitnessApi for StravaService {
    async fn list_activities(&self, limit: usize) -> Result<Vec<Activity>, AppError> {
        let (session_id, access_token) = self.credentials().await?;
        let result = self.client.list_activities(&access_token, limit).await;
        self.forget_if_rejected(&session_id, result).await
    }

    async fn get_activity(&self, activity_id: u64) -> Result<Activity, AppError> {
        let (session_id, access_token) = self.credentials().await?;
        let result = self.client.get_activity(&access_token, activity_id).await;
        self.forget_if_rejected(&session_id, result).await
    }

    async fn get_athlete_stats(&self) -> Result<AthleteStats, AppError> {
        let (session_id, access_token) = self.credentials().await?;
        let result = match self.client.get_athlete(&access_token).await {
            Ok(athlete) => {
                self.client
                    .get_athlete_stats(&access_token, athlete.id)
                    .await
            }
            Err(e) => Err(e),
        };
        self.forget_if_rejected(&session_id, result).await
    }

    async fn update_activity(
        &self,
        activity_id: u64,
        update: &ActivityUpdate,
    ) -> Result<Activity, AppError> {
        let (session_id, access_token) = self.credentials().await?;
        let result = self
            .client
            .update_activity(&access_token, activity_id, update)
            .await;
        let updated = self.forget_if_rejected(&session_id, result).await?;
        tracing::info!(activity_id, ?update, "Activity updated");
        Ok(updated)
    }
}
