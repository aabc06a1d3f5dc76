// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Strava credentials keyed by browser session.
//!
//! Sessions live in process memory; the store is a trait so a persistent
//! backend can be swapped in without touching the routes.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use ring::rand::{SecureRandom, SystemRandom};

/// Margin before token expiration when we proactively refresh (5 minutes).
pub const TOKEN_REFRESH_MARGIN_SECS: i64 = 5 * 60;

/// Reserved key under which env-provided credentials are cached.
pub const ENV_SESSION_ID: &str = "__env__";

/// Credential pair for one session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionTokens {
    pub access_token: String,
    pub refresh_token: String,
    /// Unknown for tokens supplied through the environment
    pub expires_at: Option<DateTime<Utc>>,
    pub stored_at: DateTime<Utc>,
}

impl SessionTokens {
    pub fn new(
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
            expires_at,
            stored_at: Utc::now(),
        }
    }

    /// Build from a Strava token response (`expires_at` is a unix timestamp).
    pub fn from_unix_expiry(access_token: String, refresh_token: String, expires_at: i64) -> Self {
        Self::new(
            access_token,
            refresh_token,
            DateTime::from_timestamp(expires_at, 0),
        )
    }

    /// True when the expiry is unknown or falls within the refresh margin.
    pub fn needs_refresh(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(expires_at) => now + Duration::seconds(TOKEN_REFRESH_MARGIN_SECS) >= expires_at,
            None => true,
        }
    }
}

/// Session id to credential store.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, session_id: &str) -> Option<SessionTokens>;

    async fn put(&self, session_id: &str, tokens: SessionTokens);

    /// Returns whether a session was removed.
    async fn delete(&self, session_id: &str) -> bool;

    /// Most recently stored session, used by the single-user tool surface.
    async fn most_recent(&self) -> Option<(String, SessionTokens)>;
}

/// Process-local store backed by a concurrent map.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    sessions: DashMap<String, SessionTokens>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, session_id: &str) -> Option<SessionTokens> {
        self.sessions.get(session_id).map(|entry| entry.clone())
    }

    async fn put(&self, session_id: &str, tokens: SessionTokens) {
        self.sessions.insert(session_id.to_string(), tokens);
    }

    async fn delete(&self, session_id: &str) -> bool {
        self.sessions.remove(session_id).is_some()
    }

    async fn most_recent(&self) -> Option<(String, SessionTokens)> {
        self.sessions
            .iter()
            .max_by_key(|entry| entry.value().stored_at)
            .map(|entry| (entry.key().clone(), entry.value().clone()))
    }
}

/// Generate an opaque, URL-safe session id (32 random bytes, hex).
pub fn generate_session_id() -> Option<String> {
    let mut bytes = [0u8; 32];
    SystemRandom::new().fill(&mut bytes).ok()?;
    Some(hex::encode(bytes))
}
