// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Athlete statistics (ride/run totals).

use serde::{Deserialize, Serialize};

/// Aggregate totals for one bucket (recent / year-to-date / all-time).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActivityTotals {
    #[serde(default)]
    pub count: u32,
    /// Distance in meters
    #[serde(default)]
    pub distance: f64,
    /// Moving time in seconds
    #[serde(default)]
    pub moving_time: u64,
    /// Elapsed time in seconds
    #[serde(default)]
    pub elapsed_time: u64,
    /// Elevation gain in meters
    #[serde(default)]
    pub elevation_gain: f64,
}

/// `GET /athletes/{id}/stats` response, reduced to the ride/run totals.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AthleteStats {
    #[serde(default)]
    pub recent_ride_totals: Option<ActivityTotals>,
    #[serde(default)]
    pub recent_run_totals: Option<ActivityTotals>,
    #[serde(default)]
    pub ytd_ride_totals: Option<ActivityTotals>,
    #[serde(default)]
    pub ytd_run_totals: Option<ActivityTotals>,
    #[serde(default)]
    pub all_ride_totals: Option<ActivityTotals>,
    #[serde(default)]
    pub all_run_totals: Option<ActivityTotals>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_deserialize_ignores_unknown_fields() {
        let json = r#"{
            "biggest_ride_distance": 120000.0,
            "recent_ride_totals": {
                "count": 5, "distance": 100000.0, "moving_time": 10000,
                "elapsed_time": 11000, "elevation_gain": 500.0, "achievement_count": 2
            },
            "all_run_totals": {
                "count": 500, "distance": 6000000.0, "moving_time": 600000,
                "elapsed_time": 650000, "elevation_gain": 30000.0
            }
        }"#;

        let stats: AthleteStats = serde_json::from_str(json).unwrap();
        let recent = stats.recent_ride_totals.unwrap();
        assert_eq!(recent.count, 5);
        assert_eq!(recent.elevation_gain, 500.0);
        assert_eq!(stats.all_run_totals.unwrap().count, 500);
        assert!(stats.ytd_ride_totals.is_none());
    }
}
