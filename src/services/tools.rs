// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Activity tools exposed to assistants.
//!
//! Each tool fetches what it needs through [`FitnessApi`], runs the pure
//! classification/naming logic and reshapes the result into flat JSON.
//! Calls are issued one after another; nothing is spawned.

use crate::error::{AppError, Result};
use crate::models::{Activity, ActivityUpdate, AthleteStats};
use crate::services::classifier::{
    classify_ebike, is_ebike_candidate, is_generic_name, EbikeThresholds,
};
use crate::services::geocoding::{ExplicitLocation, LocationResolver};
use crate::services::naming::{
    analyze, round_to, speed_kmh, Characteristics, EffortLevel, NamingHints, NamingInput,
    NamingMetrics,
};
use crate::services::strava::{FitnessApi, MAX_PER_PAGE};
use crate::time_utils::{day_of_week, format_local_iso, time_of_day};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use validator::{Validate, ValidationError};

/// Sport type applied by `fix_ebike_activity`.
pub const EMTB_SPORT_TYPE: &str = "EMountainBikeRide";

/// Largest `limit` a tool accepts.
pub const MAX_LIMIT: usize = MAX_PER_PAGE;

const NAME_SUGGESTION: &str = "Use suggest_activity_name prompt to generate a better name";

/// Tools the server exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    GetActivities,
    GetActivity,
    GetStats,
    RenameActivity,
    UpdateActivityType,
    FixEbikeActivity,
    DetectGenericNamedActivities,
    DetectEbikeActivities,
    GetActivityDetailsForNaming,
}

impl Tool {
    pub const ALL: [Tool; 9] = [
        Tool::GetActivities,
        Tool::GetActivity,
        Tool::GetStats,
        Tool::RenameActivity,
        Tool::UpdateActivityType,
        Tool::FixEbikeActivity,
        Tool::DetectGenericNamedActivities,
        Tool::DetectEbikeActivities,
        Tool::GetActivityDetailsForNaming,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Tool::GetActivities => "get_activities",
            Tool::GetActivity => "get_activity",
            Tool::GetStats => "get_stats",
            Tool::RenameActivity => "rename_activity",
            Tool::UpdateActivityType => "update_activity_type",
            Tool::FixEbikeActivity => "fix_ebike_activity",
            Tool::DetectGenericNamedActivities => "detect_generic_named_activities",
            Tool::DetectEbikeActivities => "detect_ebike_activities",
            Tool::GetActivityDetailsForNaming => "get_activity_details_for_naming",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tool| tool.name() == name)
    }
}

// ─── Arguments ──────────────────────────────────────────────

fn default_list_limit() -> usize {
    30
}

fn default_scan_limit() -> usize {
    50
}

fn default_effort_ratio_threshold() -> f64 {
    EbikeThresholds::default().effort_ratio_threshold
}

fn default_min_elevation() -> f64 {
    EbikeThresholds::default().min_elevation
}

fn not_blank(value: &str) -> std::result::Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate)]
pub struct ListArgs {
    #[serde(default = "default_list_limit")]
    #[validate(range(min = 1, max = 200))]
    pub limit: usize,
}

#[derive(Debug, Deserialize, Validate)]
pub struct GenericScanArgs {
    #[serde(default = "default_scan_limit")]
    #[validate(range(min = 1, max = 200))]
    pub limit: usize,
}

#[derive(Debug, Deserialize, Validate)]
pub struct EbikeScanArgs {
    #[serde(default = "default_list_limit")]
    #[validate(range(min = 1, max = 200))]
    pub limit: usize,
    #[serde(default = "default_effort_ratio_threshold")]
    #[validate(range(min = 0.0))]
    pub effort_ratio_threshold: f64,
    #[serde(default = "default_min_elevation")]
    #[validate(range(min = 0.0))]
    pub min_elevation: f64,
    #[serde(default)]
    pub check_steep_speed: bool,
}

impl EbikeScanArgs {
    fn thresholds(&self) -> EbikeThresholds {
        EbikeThresholds {
            effort_ratio_threshold: self.effort_ratio_threshold,
            min_elevation: self.min_elevation,
            check_steep_speed: self.check_steep_speed,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct ActivityIdArgs {
    pub activity_id: u64,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RenameArgs {
    pub activity_id: u64,
    #[validate(length(min = 1, max = 255), custom(function = "not_blank"))]
    pub new_name: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateTypeArgs {
    pub activity_id: u64,
    #[validate(length(min = 1, max = 64), custom(function = "not_blank"))]
    pub sport_type: String,
}

/// Deserialize and validate tool arguments.
pub fn parse_args<T: DeserializeOwned + Validate>(arguments: Value) -> Result<T> {
    let arguments = match arguments {
        Value::Null => Value::Object(Default::default()),
        other => other,
    };
    let args: T = serde_json::from_value(arguments)
        .map_err(|e| AppError::BadRequest(format!("Invalid arguments: {}", e)))?;
    args.validate()
        .map_err(|e| AppError::BadRequest(format!("Invalid arguments: {}", e)))?;
    Ok(args)
}

// ─── Results ────────────────────────────────────────────────

fn local_date(activity: &Activity) -> Option<String> {
    match activity.start_local() {
        Some(date) => Some(format_local_iso(date)),
        None => activity.start_date_local.clone(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivitySummaryView {
    pub id: u64,
    pub name: String,
    #[serde(rename = "type")]
    pub activity_type: String,
    pub distance: f64,
    pub moving_time: u64,
    pub elapsed_time: u64,
    pub elevation_gain: f64,
    pub start_date_local: Option<String>,
}

impl From<&Activity> for ActivitySummaryView {
    fn from(activity: &Activity) -> Self {
        Self {
            id: activity.id,
            name: activity.name.clone(),
            activity_type: activity.activity_type.clone(),
            distance: activity.distance_m(),
            moving_time: activity.moving_secs(),
            elapsed_time: activity.elapsed_secs(),
            elevation_gain: activity.elevation_gain_m(),
            start_date_local: local_date(activity),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityDetailView {
    #[serde(flatten)]
    pub summary: ActivitySummaryView,
    pub average_speed: f64,
    pub max_speed: f64,
    pub average_heartrate: Option<f64>,
    pub max_heartrate: Option<f64>,
    pub suffer_score: Option<f64>,
    pub kudos_count: Option<u32>,
}

impl From<&Activity> for ActivityDetailView {
    fn from(activity: &Activity) -> Self {
        let perf = &activity.performance;
        Self {
            summary: ActivitySummaryView::from(activity),
            average_speed: perf.average_speed.unwrap_or(0.0),
            max_speed: perf.max_speed.unwrap_or(0.0),
            average_heartrate: perf.average_heartrate,
            max_heartrate: perf.max_heartrate,
            suffer_score: perf.suffer_score,
            kudos_count: activity.kudos_count,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenameView {
    pub id: u64,
    pub name: String,
    #[serde(rename = "type")]
    pub activity_type: String,
    pub sport_type: Option<String>,
    pub distance_km: f64,
    pub start_date_local: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SportTypeUpdateView {
    pub id: u64,
    pub name: String,
    #[serde(rename = "type")]
    pub activity_type: String,
    pub sport_type: Option<String>,
    pub distance: f64,
    pub moving_time: u64,
    pub start_date_local: Option<String>,
    pub message: String,
}

impl SportTypeUpdateView {
    fn new(updated: &Activity, message: String) -> Self {
        Self {
            id: updated.id,
            name: updated.name.clone(),
            activity_type: updated.activity_type.clone(),
            sport_type: updated.sport_type.clone(),
            distance: updated.distance_m(),
            moving_time: updated.moving_secs(),
            start_date_local: local_date(updated),
            message,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenericNameView {
    pub id: u64,
    pub current_name: String,
    #[serde(rename = "type")]
    pub activity_type: String,
    pub sport_type: Option<String>,
    pub date: Option<String>,
    pub location: String,
    pub coordinates: Option<[f64; 2]>,
    pub distance_km: f64,
    pub elevation_gain: f64,
    pub moving_time_min: f64,
    pub suffer_score: Option<f64>,
    pub suggestion: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuspectedEbikeView {
    pub id: u64,
    pub name: String,
    pub date: Option<String>,
    #[serde(rename = "type")]
    pub activity_type: String,
    pub distance_km: f64,
    pub elevation_gain: f64,
    pub moving_time_min: f64,
    pub speed_kmh: f64,
    pub average_cadence: Option<f64>,
    pub suffer_score: Option<f64>,
    pub effort_ratio: Option<f64>,
    pub average_hr: Option<f64>,
    pub average_watts: Option<f64>,
    pub reasons: Vec<String>,
    pub recommendation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationView {
    pub name: String,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub suburb: Option<String>,
    pub county: Option<String>,
    pub full_address: Option<String>,
    pub start_coordinates: Option<[f64; 2]>,
    pub end_coordinates: Option<[f64; 2]>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EffortView {
    pub suffer_score: Option<f64>,
    pub effort_level: EffortLevel,
    pub average_heartrate: Option<f64>,
    pub max_heartrate: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamingDetailsView {
    pub id: u64,
    pub current_name: String,
    #[serde(rename = "type")]
    pub activity_type: String,
    pub sport_type: Option<String>,
    pub date: Option<String>,
    pub day_of_week: Option<String>,
    pub time_of_day: Option<String>,
    pub description: Option<String>,
    pub location: LocationView,
    pub metrics: NamingMetrics,
    pub effort: EffortView,
    pub characteristics: Characteristics,
    pub naming_hints: NamingHints,
}

fn explicit_location(activity: &Activity) -> ExplicitLocation {
    ExplicitLocation::new(
        activity.location_city.clone(),
        activity.location_state.clone(),
        activity.location_country.clone(),
    )
}

// ─── Service ────────────────────────────────────────────────

/// Tool implementations over an injected API and geocoder.
#[derive(Clone)]
pub struct ToolService {
    api: Arc<dyn FitnessApi>,
    locations: LocationResolver,
}

impl ToolService {
    pub fn new(api: Arc<dyn FitnessApi>, locations: LocationResolver) -> Self {
        Self { api, locations }
    }

    /// Run a tool with raw JSON arguments.
    pub async fn call(&self, tool: Tool, arguments: Value) -> Result<Value> {
        tracing::debug!(tool = tool.name(), "Executing tool");

        let result = self.dispatch(tool, arguments).await;
        if let Err(ref e) = result {
            tracing::warn!(tool = tool.name(), error = %e, "Tool failed");
        }
        result
    }

    async fn dispatch(&self, tool: Tool, arguments: Value) -> Result<Value> {
        match tool {
            Tool::GetActivities => to_json(self.get_activities(parse_args(arguments)?).await?),
            Tool::GetActivity => to_json(self.get_activity(parse_args(arguments)?).await?),
            Tool::GetStats => to_json(self.get_stats().await?),
            Tool::RenameActivity => to_json(self.rename_activity(parse_args(arguments)?).await?),
            Tool::UpdateActivityType => {
                to_json(self.update_activity_type(parse_args(arguments)?).await?)
            }
            Tool::FixEbikeActivity => {
                to_json(self.fix_ebike_activity(parse_args(arguments)?).await?)
            }
            Tool::DetectGenericNamedActivities => {
                to_json(self.detect_generic_named_activities(parse_args(arguments)?).await?)
            }
            Tool::DetectEbikeActivities => {
                to_json(self.detect_ebike_activities(parse_args(arguments)?).await?)
            }
            Tool::GetActivityDetailsForNaming => {
                to_json(self.get_activity_details_for_naming(parse_args(arguments)?).await?)
            }
        }
    }

    pub async fn get_activities(&self, args: ListArgs) -> Result<Vec<ActivitySummaryView>> {
        let activities = self.api.list_activities(args.limit).await?;
        Ok(activities.iter().map(ActivitySummaryView::from).collect())
    }

    pub async fn get_activity(&self, args: ActivityIdArgs) -> Result<ActivityDetailView> {
        let activity = self.api.get_activity(args.activity_id).await?;
        Ok(ActivityDetailView::from(&activity))
    }

    pub async fn get_stats(&self) -> Result<AthleteStats> {
        self.api.get_athlete_stats().await
    }

    pub async fn rename_activity(&self, args: RenameArgs) -> Result<RenameView> {
        let new_name = args.new_name.trim().to_string();
        let updated = self
            .api
            .update_activity(args.activity_id, &ActivityUpdate::rename(new_name.clone()))
            .await?;

        Ok(RenameView {
            id: updated.id,
            name: updated.name.clone(),
            activity_type: updated.activity_type.clone(),
            sport_type: updated.sport_type.clone(),
            distance_km: round_to(updated.distance_m() / 1000.0, 1),
            start_date_local: local_date(&updated),
            message: format!("Activity successfully renamed to '{}'", new_name),
        })
    }

    pub async fn update_activity_type(&self, args: UpdateTypeArgs) -> Result<SportTypeUpdateView> {
        let sport_type = args.sport_type.trim().to_string();
        let updated = self
            .api
            .update_activity(args.activity_id, &ActivityUpdate::retype(sport_type.clone()))
            .await?;

        Ok(SportTypeUpdateView::new(
            &updated,
            format!("Activity successfully updated to {}", sport_type),
        ))
    }

    pub async fn fix_ebike_activity(&self, args: ActivityIdArgs) -> Result<SportTypeUpdateView> {
        let updated = self
            .api
            .update_activity(args.activity_id, &ActivityUpdate::retype(EMTB_SPORT_TYPE))
            .await?;

        Ok(SportTypeUpdateView::new(
            &updated,
            "Activity successfully updated to E-Mountain Bike".to_string(),
        ))
    }

    pub async fn detect_generic_named_activities(
        &self,
        args: GenericScanArgs,
    ) -> Result<Vec<GenericNameView>> {
        let activities = self.api.list_activities(args.limit).await?;
        let mut found = Vec::new();

        for activity in activities.iter().filter(|a| is_generic_name(&a.name)) {
            let detailed = self.api.get_activity(activity.id).await?;
            let location = self
                .locations
                .resolve(explicit_location(&detailed), detailed.start_latlng)
                .await;

            found.push(GenericNameView {
                id: activity.id,
                current_name: activity.name.clone(),
                activity_type: activity.activity_type.clone(),
                sport_type: activity.sport_type.clone(),
                date: local_date(activity),
                location: location.display_name(),
                coordinates: detailed.start_latlng.map(|c| c.to_pair()),
                distance_km: round_to(activity.distance_m() / 1000.0, 1),
                elevation_gain: activity.elevation_gain_m().round(),
                moving_time_min: (activity.moving_secs() as f64 / 60.0).round(),
                suffer_score: detailed.performance.suffer_score,
                suggestion: NAME_SUGGESTION.to_string(),
            });
        }

        tracing::info!(
            scanned = activities.len(),
            generic = found.len(),
            "Generic name scan complete"
        );
        Ok(found)
    }

    pub async fn detect_ebike_activities(
        &self,
        args: EbikeScanArgs,
    ) -> Result<Vec<SuspectedEbikeView>> {
        let thresholds = args.thresholds();
        let activities = self.api.list_activities(args.limit).await?;
        let mut suspicious = Vec::new();

        for activity in activities.iter().filter(|a| is_ebike_candidate(a)) {
            // cadence and suffer score only come with the detailed representation
            let detailed = self.api.get_activity(activity.id).await?;
            let perf = &detailed.performance;
            let result = classify_ebike(activity, perf, &thresholds);
            if !result.suspicious {
                continue;
            }

            suspicious.push(SuspectedEbikeView {
                id: activity.id,
                name: activity.name.clone(),
                date: local_date(activity),
                activity_type: activity.activity_type.clone(),
                distance_km: round_to(activity.distance_m() / 1000.0, 1),
                elevation_gain: activity.elevation_gain_m().round(),
                moving_time_min: (activity.moving_secs() as f64 / 60.0).round(),
                speed_kmh: round_to(
                    speed_kmh(activity.distance_m(), activity.moving_secs()),
                    1,
                ),
                average_cadence: perf.average_cadence.map(f64::round),
                suffer_score: perf.suffer_score,
                effort_ratio: result.effort_ratio.map(|r| round_to(r, 2)),
                average_hr: perf.average_heartrate.map(f64::round),
                average_watts: perf.average_watts.map(f64::round),
                reasons: result.reasons,
                recommendation: result.recommendation,
            });
        }

        tracing::info!(
            scanned = activities.len(),
            suspicious = suspicious.len(),
            "E-bike scan complete"
        );
        Ok(suspicious)
    }

    pub async fn get_activity_details_for_naming(
        &self,
        args: ActivityIdArgs,
    ) -> Result<NamingDetailsView> {
        let activity = self.api.get_activity(args.activity_id).await?;
        let location = self
            .locations
            .resolve(explicit_location(&activity), activity.start_latlng)
            .await;
        let location_name = location.display_name();

        let analysis = analyze(&NamingInput {
            activity_type: &activity.activity_type,
            sport_type: activity.sport_type.as_deref(),
            distance_m: activity.distance_m(),
            elevation_m: activity.elevation_gain_m(),
            moving_secs: activity.moving_secs(),
            elapsed_secs: activity.elapsed_secs(),
            suffer_score: activity.performance.suffer_score,
            location_name: &location_name,
        });
        let start = activity.start_local();

        Ok(NamingDetailsView {
            id: activity.id,
            current_name: activity.name.clone(),
            activity_type: activity.activity_type.clone(),
            sport_type: activity.sport_type.clone(),
            date: local_date(&activity),
            day_of_week: start.map(day_of_week),
            time_of_day: start.map(time_of_day),
            description: activity.description.clone(),
            location: LocationView {
                name: location_name,
                city: location.city,
                state: location.state,
                country: location.country,
                suburb: location.suburb,
                county: location.county,
                full_address: location.full_address,
                start_coordinates: activity.start_latlng.map(|c| c.to_pair()),
                end_coordinates: activity.end_latlng.map(|c| c.to_pair()),
            },
            metrics: analysis.metrics,
            effort: EffortView {
                suffer_score: activity.performance.suffer_score,
                effort_level: analysis.effort_level,
                average_heartrate: activity.performance.average_heartrate,
                max_heartrate: activity.performance.max_heartrate,
            },
            characteristics: analysis.characteristics,
            naming_hints: analysis.naming_hints,
        })
    }
}

fn to_json<T: Serialize>(value: T) -> Result<Value> {
    serde_json::to_value(value)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to serialize tool result: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tool_names_round_trip() {
        for tool in Tool::ALL {
            assert_eq!(Tool::from_name(tool.name()), Some(tool));
        }
        assert_eq!(Tool::from_name("delete_everything"), None);
    }

    #[test]
    fn test_list_args_default_limit() {
        let args: ListArgs = parse_args(Value::Null).unwrap();
        assert_eq!(args.limit, 30);
        let args: GenericScanArgs = parse_args(json!({})).unwrap();
        assert_eq!(args.limit, 50);
    }

    #[test]
    fn test_limit_out_of_range() {
        assert!(matches!(
            parse_args::<ListArgs>(json!({"limit": 0})),
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            parse_args::<ListArgs>(json!({"limit": 201})),
            Err(AppError::BadRequest(_))
        ));
        assert!(parse_args::<ListArgs>(json!({"limit": 200})).is_ok());
    }

    #[test]
    fn test_ebike_scan_defaults() {
        let args: EbikeScanArgs = parse_args(json!({})).unwrap();
        assert_eq!(args.thresholds(), EbikeThresholds::default());
        assert_eq!(args.limit, 30);
    }

    #[test]
    fn test_rename_args_validation() {
        assert!(parse_args::<RenameArgs>(json!({"activity_id": 1, "new_name": ""})).is_err());
        assert!(parse_args::<RenameArgs>(json!({"activity_id": 1, "new_name": "   "})).is_err());
        let too_long = "x".repeat(256);
        assert!(
            parse_args::<RenameArgs>(json!({"activity_id": 1, "new_name": too_long})).is_err()
        );
        assert!(parse_args::<RenameArgs>(json!({"activity_id": 1, "new_name": "Col"})).is_ok());
    }

    #[test]
    fn test_missing_activity_id() {
        assert!(matches!(
            parse_args::<ActivityIdArgs>(json!({})),
            Err(AppError::BadRequest(msg)) if msg.contains("activity_id")
        ));
    }

    #[test]
    fn test_summary_view_shape() {
        let activity = Activity {
            id: 7,
            name: "Morning Run".to_string(),
            activity_type: "Run".to_string(),
            distance: Some(10000.0),
            moving_time: Some(3000),
            elapsed_time: Some(3100),
            total_elevation_gain: Some(120.0),
            start_date_local: Some("2025-12-10T08:05:00Z".to_string()),
            ..Activity::default()
        };

        let value = serde_json::to_value(ActivitySummaryView::from(&activity)).unwrap();
        assert_eq!(
            value,
            json!({
                "id": 7,
                "name": "Morning Run",
                "type": "Run",
                "distance": 10000.0,
                "moving_time": 3000,
                "elapsed_time": 3100,
                "elevation_gain": 120.0,
                "start_date_local": "2025-12-10T08:05:00"
            })
        );
    }
}
