// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod classifier;
pub mod geocoding;
pub mod naming;
pub mod session;
pub mod strava;
pub mod tools;

pub use geocoding::{LocationResolver, NoopGeocoder, NominatimGeocoder, ReverseGeocoder};
pub use session::{InMemorySessionStore, SessionStore, SessionTokens};
pub use strava::{FitnessApi, OAuthResult, StravaClient, StravaService};
pub use tools::ToolService;
