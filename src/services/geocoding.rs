// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Best-effort place names for activities.
//!
//! Strava's own `location_*` fields are often empty, so missing parts are
//! filled in from a reverse-geocoding lookup on the start coordinates.
//! Lookup failures never surface as errors.

use crate::models::LatLng;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Display name used when nothing is known about the location.
pub const UNKNOWN_LOCATION: &str = "Lieu inconnu";

const USER_AGENT: &str = "strava-mcp-server";
const LOOKUP_LANGUAGE: &str = "fr";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Address fields returned by a reverse lookup.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GeocodedAddress {
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub suburb: Option<String>,
    pub county: Option<String>,
    pub full_address: Option<String>,
}

/// Coordinates to address lookup.
#[async_trait]
pub trait ReverseGeocoder: Send + Sync {
    /// `None` when the lookup failed or found no address.
    async fn reverse(&self, lat: f64, lng: f64) -> Option<GeocodedAddress>;
}

/// Geocoder used when lookups are disabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopGeocoder;

#[async_trait]
impl ReverseGeocoder for NoopGeocoder {
    async fn reverse(&self, _lat: f64, _lng: f64) -> Option<GeocodedAddress> {
        None
    }
}

/// Nominatim (OpenStreetMap) reverse geocoder.
#[derive(Clone)]
pub struct NominatimGeocoder {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct NominatimResponse {
    display_name: Option<String>,
    address: Option<NominatimAddress>,
}

#[derive(Debug, Default, Deserialize)]
struct NominatimAddress {
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    municipality: Option<String>,
    hamlet: Option<String>,
    state: Option<String>,
    country: Option<String>,
    suburb: Option<String>,
    county: Option<String>,
}

impl NominatimResponse {
    fn into_address(self) -> Option<GeocodedAddress> {
        let address = self.address?;
        let city = address
            .city
            .or(address.town)
            .or(address.village)
            .or(address.municipality)
            .or(address.hamlet);

        Some(GeocodedAddress {
            city,
            state: address.state,
            country: address.country,
            suburb: address.suburb,
            county: address.county,
            full_address: self.display_name,
        })
    }
}

impl NominatimGeocoder {
    pub fn new(base_url: &str) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn lookup(&self, lat: f64, lng: f64) -> Result<NominatimResponse, reqwest::Error> {
        self.http
            .get(format!("{}/reverse", self.base_url))
            .query(&[
                ("lat", lat.to_string()),
                ("lon", lng.to_string()),
                ("format", "jsonv2".to_string()),
                ("addressdetails", "1".to_string()),
                ("accept-language", LOOKUP_LANGUAGE.to_string()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
    }
}

#[async_trait]
impl ReverseGeocoder for NominatimGeocoder {
    async fn reverse(&self, lat: f64, lng: f64) -> Option<GeocodedAddress> {
        match self.lookup(lat, lng).await {
            Ok(response) => {
                let address = response.into_address();
                if address.is_none() {
                    tracing::debug!(lat, lng, "Reverse geocoding returned no address");
                }
                address
            }
            Err(e) => {
                tracing::warn!(lat, lng, error = %e, "Reverse geocoding failed");
                None
            }
        }
    }
}

/// Location fields Strava reported for the activity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExplicitLocation {
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
}

impl ExplicitLocation {
    pub fn new(
        city: Option<String>,
        state: Option<String>,
        country: Option<String>,
    ) -> Self {
        // Strava sends "" as often as null
        let clean = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
        Self {
            city: clean(city),
            state: clean(state),
            country: clean(country),
        }
    }

    fn is_complete(&self) -> bool {
        self.city.is_some() && self.state.is_some() && self.country.is_some()
    }
}

/// Merged location of an activity.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResolvedLocation {
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub suburb: Option<String>,
    pub county: Option<String>,
    pub full_address: Option<String>,
}

impl ResolvedLocation {
    /// `"city, state, country"` with empty parts skipped.
    pub fn display_name(&self) -> String {
        let parts: Vec<&str> = [&self.city, &self.state, &self.country]
            .into_iter()
            .filter_map(|p| p.as_deref())
            .filter(|p| !p.is_empty())
            .collect();

        if parts.is_empty() {
            UNKNOWN_LOCATION.to_string()
        } else {
            parts.join(", ")
        }
    }
}

/// Combines explicit fields with reverse-geocoded ones.
#[derive(Clone)]
pub struct LocationResolver {
    geocoder: Arc<dyn ReverseGeocoder>,
}

impl LocationResolver {
    pub fn new(geocoder: Arc<dyn ReverseGeocoder>) -> Self {
        Self { geocoder }
    }

    /// Resolve a location; explicit fields always win.
    pub async fn resolve(
        &self,
        explicit: ExplicitLocation,
        coordinates: Option<LatLng>,
    ) -> ResolvedLocation {
        let mut resolved = ResolvedLocation {
            city: explicit.city.clone(),
            state: explicit.state.clone(),
            country: explicit.country.clone(),
            ..ResolvedLocation::default()
        };

        let Some(coords) = coordinates else {
            return resolved;
        };
        if explicit.is_complete() {
            return resolved;
        }

        if let Some(found) = self.geocoder.reverse(coords.lat, coords.lng).await {
            resolved.city = resolved.city.or(found.city);
            resolved.state = resolved.state.or(found.state);
            resolved.country = resolved.country.or(found.country);
            resolved.suburb = found.suburb;
            resolved.county = found.county;
            resolved.full_address = found.full_address;
        }

        resolved
    }
}
