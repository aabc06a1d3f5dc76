// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use strava_mcp::config::Config;
use strava_mcp::error::AppError;
use strava_mcp::models::{Activity, ActivityTotals, ActivityUpdate, AthleteStats, LatLng};
use strava_mcp::routes::create_router;
use strava_mcp::services::geocoding::GeocodedAddress;
use strava_mcp::services::{
    FitnessApi, InMemorySessionStore, ReverseGeocoder, SessionStore, StravaClient, StravaService,
};
use strava_mcp::AppState;

/// In-memory stand-in for the Strava API.
#[derive(Default)]
pub struct FakeFitnessApi {
    activities: Mutex<Vec<Activity>>,
    updates: Mutex<Vec<(u64, ActivityUpdate)>>,
    /// Number of `get_activity` calls made
    pub detail_calls: AtomicUsize,
}

#[allow(dead_code)]
impl FakeFitnessApi {
    pub fn with_activities(activities: Vec<Activity>) -> Self {
        Self {
            activities: Mutex::new(activities),
            ..Self::default()
        }
    }

    pub fn updates(&self) -> Vec<(u64, ActivityUpdate)> {
        self.updates.lock().unwrap().clone()
    }

    pub fn detail_calls(&self) -> usize {
        self.detail_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FitnessApi for FakeFitnessApi {
    async fn list_activities(&self, limit: usize) -> Result<Vec<Activity>, AppError> {
        let activities = self.activities.lock().unwrap();
        Ok(activities.iter().take(limit).cloned().collect())
    }

    async fn get_activity(&self, activity_id: u64) -> Result<Activity, AppError> {
        self.detail_calls.fetch_add(1, Ordering::SeqCst);
        self.activities
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.id == activity_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("/activities/{}", activity_id)))
    }

    async fn get_athlete_stats(&self) -> Result<AthleteStats, AppError> {
        Ok(AthleteStats {
            ytd_ride_totals: Some(ActivityTotals {
                count: 42,
                distance: 1_234_000.0,
                moving_time: 180_000,
                elapsed_time: 200_000,
                elevation_gain: 25_000.0,
            }),
            ..AthleteStats::default()
        })
    }

    async fn update_activity(
        &self,
        activity_id: u64,
        update: &ActivityUpdate,
    ) -> Result<Activity, AppError> {
        let mut activities = self.activities.lock().unwrap();
        let activity = activities
            .iter_mut()
            .find(|a| a.id == activity_id)
            .ok_or_else(|| AppError::NotFound(format!("/activities/{}", activity_id)))?;

        if let Some(name) = &update.name {
            activity.name = name.clone();
        }
        if let Some(sport_type) = &update.sport_type {
            activity.sport_type = Some(sport_type.clone());
        }
        self.updates
            .lock()
            .unwrap()
            .push((activity_id, update.clone()));
        Ok(activity.clone())
    }
}

/// Geocoder answering every lookup with the same city.
#[derive(Default)]
pub struct FakeGeocoder {
    pub calls: AtomicUsize,
}

#[allow(dead_code)]
impl FakeGeocoder {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ReverseGeocoder for FakeGeocoder {
    async fn reverse(&self, _lat: f64, _lng: f64) -> Option<GeocodedAddress> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Some(GeocodedAddress {
            city: Some("Chamonix-Mont-Blanc".to_string()),
            state: Some("Auvergne-Rhône-Alpes".to_string()),
            country: Some("France".to_string()),
            suburb: None,
            county: Some("Haute-Savoie".to_string()),
            full_address: Some("Chamonix-Mont-Blanc, Haute-Savoie, France".to_string()),
        })
    }
}

/// Strava client whose endpoints refuse connections immediately.
#[allow(dead_code)]
pub fn offline_client() -> StravaClient {
    StravaClient::with_urls(
        "test_client_id".to_string(),
        "test_secret".to_string(),
        "http://127.0.0.1:9",
        "http://127.0.0.1:9/oauth/token",
    )
}

/// Everything a test may want to poke at after building the app.
#[allow(dead_code)]
pub struct TestApp {
    pub router: axum::Router,
    pub state: Arc<AppState>,
    pub api: Arc<FakeFitnessApi>,
    pub geocoder: Arc<FakeGeocoder>,
    pub sessions: Arc<InMemorySessionStore>,
}

/// Create a test app backed by fakes, with no network access.
#[allow(dead_code)]
pub fn create_test_app(config: Config, activities: Vec<Activity>) -> TestApp {
    create_test_app_with_client(config, activities, offline_client())
}

/// Like `create_test_app`, with OAuth traffic going to `client`.
#[allow(dead_code)]
pub fn create_test_app_with_client(
    config: Config,
    activities: Vec<Activity>,
    client: StravaClient,
) -> TestApp {
    let sessions = Arc::new(InMemorySessionStore::new());
    let store: Arc<dyn SessionStore> = sessions.clone();
    let strava = StravaService::new(client, store.clone(), None);
    let api = Arc::new(FakeFitnessApi::with_activities(activities));
    let geocoder = Arc::new(FakeGeocoder::default());

    let state = Arc::new(AppState::from_parts(
        config,
        store,
        strava,
        api.clone(),
        geocoder.clone(),
    ));

    TestApp {
        router: create_router(state.clone()),
        state,
        api,
        geocoder,
        sessions,
    }
}

/// A ride as the list endpoint returns it, with detail-only fields set.
#[allow(dead_code)]
pub fn ride(id: u64, name: &str, sport_type: &str) -> Activity {
    let mut activity = Activity {
        id,
        name: name.to_string(),
        activity_type: "Ride".to_string(),
        sport_type: Some(sport_type.to_string()),
        distance: Some(15000.0),
        moving_time: Some(3600),
        elapsed_time: Some(3900),
        total_elevation_gain: Some(800.0),
        start_date_local: Some("2025-06-14T09:30:00Z".to_string()),
        start_latlng: Some(LatLng::new(45.92, 6.87)),
        ..Activity::default()
    };
    activity.performance.suffer_score = Some(60.0);
    activity
}
