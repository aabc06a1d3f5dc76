// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Strava activity model as returned by the API.

use crate::time_utils::{parse_local_datetime, to_seconds};
use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize};

/// GPS coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// `[lat, lng]`, the shape exposed to tool callers.
    pub fn to_pair(self) -> [f64; 2] {
        [self.lat, self.lng]
    }
}

/// Strava sends `[lat, lng]`, or `[]` when the activity has no GPS.
fn deserialize_latlng<'de, D>(deserializer: D) -> Result<Option<LatLng>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<Vec<f64>> = Option::deserialize(deserializer)?;
    Ok(match raw.as_deref() {
        Some([lat, lng]) => Some(LatLng::new(*lat, *lng)),
        _ => None,
    })
}

/// Optional performance fields.
///
/// Not every activity (or API version) reports these; absence means the
/// device did not record the metric.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    /// Average speed (m/s)
    #[serde(default)]
    pub average_speed: Option<f64>,
    /// Max speed (m/s)
    #[serde(default)]
    pub max_speed: Option<f64>,
    #[serde(default)]
    pub average_heartrate: Option<f64>,
    #[serde(default)]
    pub max_heartrate: Option<f64>,
    /// Average pedalling (or stride) cadence
    #[serde(default)]
    pub average_cadence: Option<f64>,
    #[serde(default)]
    pub average_watts: Option<f64>,
    /// Strava "relative effort"
    #[serde(default)]
    pub suffer_score: Option<f64>,
}

/// Strava activity (summary or detailed representation).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    /// Coarse activity type (Ride, Run, ...)
    #[serde(rename = "type", default)]
    pub activity_type: String,
    /// Fine-grained sport type (MountainBikeRide, EBikeRide, ...)
    #[serde(default)]
    pub sport_type: Option<String>,
    /// Distance in meters
    #[serde(default)]
    pub distance: Option<f64>,
    /// Moving time in seconds
    #[serde(default)]
    pub moving_time: Option<u64>,
    /// Elapsed time in seconds
    #[serde(default)]
    pub elapsed_time: Option<u64>,
    /// Elevation gain in meters
    #[serde(default)]
    pub total_elevation_gain: Option<f64>,
    #[serde(default)]
    pub start_date_local: Option<String>,
    #[serde(default, deserialize_with = "deserialize_latlng")]
    pub start_latlng: Option<LatLng>,
    #[serde(default, deserialize_with = "deserialize_latlng")]
    pub end_latlng: Option<LatLng>,
    #[serde(default)]
    pub location_city: Option<String>,
    #[serde(default)]
    pub location_state: Option<String>,
    #[serde(default)]
    pub location_country: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub kudos_count: Option<u32>,
    #[serde(flatten)]
    pub performance: PerformanceMetrics,
}

impl Activity {
    pub fn distance_m(&self) -> f64 {
        self.distance.unwrap_or(0.0)
    }

    pub fn elevation_gain_m(&self) -> f64 {
        self.total_elevation_gain.unwrap_or(0.0)
    }

    pub fn moving_secs(&self) -> u64 {
        to_seconds(self.moving_time)
    }

    pub fn elapsed_secs(&self) -> u64 {
        to_seconds(self.elapsed_time)
    }

    pub fn sport_type_str(&self) -> &str {
        self.sport_type.as_deref().unwrap_or("")
    }

    /// Local start time, if Strava sent a parseable one.
    pub fn start_local(&self) -> Option<NaiveDateTime> {
        self.start_date_local
            .as_deref()
            .and_then(parse_local_datetime)
    }
}

/// Fields that may be patched through `PUT /activities/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ActivityUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sport_type: Option<String>,
}

impl ActivityUpdate {
    pub fn rename(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn retype(sport_type: impl Into<String>) -> Self {
        Self {
            sport_type: Some(sport_type.into()),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_detailed_activity() {
        let json = r#"{
            "id": 12345678,
            "name": "Morning Ride",
            "type": "Ride",
            "sport_type": "MountainBikeRide",
            "distance": 15000.0,
            "moving_time": 3600,
            "elapsed_time": 3900,
            "total_elevation_gain": 800.0,
            "start_date_local": "2025-06-14T09:30:00Z",
            "start_latlng": [45.76, 4.83],
            "end_latlng": [],
            "average_cadence": 72.5,
            "suffer_score": 60.0,
            "kudos_count": 4
        }"#;

        let activity: Activity = serde_json::from_str(json).unwrap();
        assert_eq!(activity.id, 12345678);
        assert_eq!(activity.activity_type, "Ride");
        assert_eq!(activity.sport_type_str(), "MountainBikeRide");
        assert_eq!(activity.moving_secs(), 3600);
        assert_eq!(activity.start_latlng, Some(LatLng::new(45.76, 4.83)));
        assert_eq!(activity.end_latlng, None);
        assert_eq!(activity.performance.average_cadence, Some(72.5));
        assert_eq!(activity.performance.suffer_score, Some(60.0));
        assert_eq!(activity.performance.average_watts, None);
    }

    #[test]
    fn test_deserialize_minimal_summary() {
        let activity: Activity = serde_json::from_str(r#"{"id": 1}"#).unwrap();
        assert_eq!(activity.distance_m(), 0.0);
        assert_eq!(activity.moving_secs(), 0);
        assert!(activity.start_local().is_none());
        assert!(activity.start_latlng.is_none());
    }

    #[test]
    fn test_activity_update_serializes_only_set_fields() {
        let body = serde_json::to_value(ActivityUpdate::rename("Col du Galibier")).unwrap();
        assert_eq!(body, serde_json::json!({ "name": "Col du Galibier" }));
    }
}
