// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Heuristic activity classification.
//!
//! Two independent checks run over already-fetched activities:
//! - generic (auto-generated) names that are worth renaming
//! - rides whose effort profile suggests electric assistance
//!
//! Both are pure functions of their inputs.

use crate::models::{Activity, PerformanceMetrics};
use crate::services::naming::speed_kmh;
use serde::Serialize;

/// Auto-generated names Strava gives activities (French and English locales).
pub const GENERIC_ACTIVITY_NAMES: &[&str] = &[
    // Français
    "Trail le matin",
    "Trail le midi",
    "Trail dans l'après-midi",
    "Trail en soirée",
    "Trail en fin de journée",
    "Trail matinal",
    "Course le matin",
    "Course le midi",
    "Course dans l'après-midi",
    "Course en soirée",
    "Course en fin de journée",
    "Course matinale",
    "Sortie vélo le matin",
    "Sortie vélo le midi",
    "Sortie vélo dans l'après-midi",
    "Sortie vélo en soirée",
    "Sortie vélo en fin de journée",
    "Vélo le matin",
    "Vélo le midi",
    "Vélo dans l'après-midi",
    "Vélo en soirée",
    "Vélo matinal",
    "VTT le matin",
    "VTT le midi",
    "VTT dans l'après-midi",
    "VTT en soirée",
    "VTT en fin de journée",
    "Randonnée le matin",
    "Randonnée le midi",
    "Randonnée dans l'après-midi",
    "Randonnée en soirée",
    "Randonnée en fin de journée",
    "Marche le matin",
    "Marche le midi",
    "Marche dans l'après-midi",
    "Marche en soirée",
    "Marche en fin de journée",
    // English
    "Morning Run",
    "Lunch Run",
    "Afternoon Run",
    "Evening Run",
    "Night Run",
    "Morning Ride",
    "Lunch Ride",
    "Afternoon Ride",
    "Evening Ride",
    "Night Ride",
    "Morning Walk",
    "Lunch Walk",
    "Afternoon Walk",
    "Evening Walk",
    "Night Walk",
    "Morning Hike",
    "Lunch Hike",
    "Afternoon Hike",
    "Evening Hike",
    "Night Hike",
    "Morning Trail Run",
    "Afternoon Trail Run",
    "Evening Trail Run",
];

/// Free-standing time-of-day fragments found in auto-generated names.
pub const TIME_OF_DAY_TOKENS: &[&str] = &[
    "le matin",
    "le midi",
    "l'après-midi",
    "en soirée",
    "en fin de journée",
    "Morning",
    "Lunch",
    "Afternoon",
    "Evening",
    "Night",
];

/// Check whether an activity name looks auto-generated.
pub fn is_generic_name(name: &str) -> bool {
    let trimmed = name.trim();
    if GENERIC_ACTIVITY_NAMES.contains(&trimmed) {
        return true;
    }

    let lowered = trimmed.to_lowercase();
    let template_match = GENERIC_ACTIVITY_NAMES.iter().any(|template| {
        let template = template.to_lowercase();
        lowered.contains(&template) || template.contains(&lowered)
    });

    template_match
        || TIME_OF_DAY_TOKENS
            .iter()
            .any(|token| lowered.contains(&token.to_lowercase()))
}

// ─── E-bike detection ───────────────────────────────────────

/// Rides shorter than this are not analysed.
pub const MIN_MOVING_TIME_SECS: u64 = 600;

/// Below this climb the effort ratio is too noisy to compute.
const EFFORT_RATIO_MIN_CLIMB_M: f64 = 100.0;

const STEEP_SPEED_KMH: f64 = 14.0;
const STEEP_GRADE_PCT: f64 = 2.0;
const STEEP_EFFORT_RATIO: f64 = 5.0;

/// Corrective action suggested for suspicious rides.
pub const EBIKE_RECOMMENDATION: &str = "Probablement E-MTB - fix_ebike_activity()";

/// Tunable thresholds for e-bike detection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EbikeThresholds {
    /// Effort ratio below this is suspicious
    pub effort_ratio_threshold: f64,
    /// Minimum elevation gain (m) for the effort-ratio signal
    pub min_elevation: f64,
    /// Also flag fast rides over steep terrain with a low effort ratio
    pub check_steep_speed: bool,
}

impl Default for EbikeThresholds {
    fn default() -> Self {
        Self {
            effort_ratio_threshold: 4.5,
            min_elevation: 200.0,
            check_steep_speed: false,
        }
    }
}

/// Outcome of classifying one activity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationResult {
    pub activity_id: u64,
    pub suspicious: bool,
    pub reasons: Vec<String>,
    pub recommendation: Option<String>,
    /// Suffer score per 100 m climbed, when computable
    pub effort_ratio: Option<f64>,
}

impl ClassificationResult {
    fn clean(activity_id: u64, effort_ratio: Option<f64>) -> Self {
        Self {
            activity_id,
            suspicious: false,
            reasons: Vec::new(),
            recommendation: None,
            effort_ratio,
        }
    }
}

/// Whether an activity is a non-electric ride long enough to analyse.
pub fn is_ebike_candidate(activity: &Activity) -> bool {
    activity.activity_type.contains("Ride")
        && !activity.sport_type_str().contains('E')
        && activity.moving_secs() >= MIN_MOVING_TIME_SECS
}

/// Effort points per 100 vertical meters.
pub fn effort_ratio(suffer_score: Option<f64>, elevation_gain: f64) -> Option<f64> {
    let score = suffer_score?;
    if elevation_gain > EFFORT_RATIO_MIN_CLIMB_M {
        Some(score / (elevation_gain / 100.0))
    } else {
        None
    }
}

/// Classify a ride as possibly motor-assisted.
///
/// `metrics` comes from the detailed activity (cadence and suffer score are
/// not part of list responses). Signals accumulate as reasons; the verdict
/// is their logical OR.
pub fn classify_ebike(
    activity: &Activity,
    metrics: &PerformanceMetrics,
    thresholds: &EbikeThresholds,
) -> ClassificationResult {
    let elevation = activity.elevation_gain_m();
    let ratio = effort_ratio(metrics.suffer_score, elevation);

    if !is_ebike_candidate(activity) {
        return ClassificationResult::clean(activity.id, ratio);
    }

    let mut reasons = Vec::new();

    if let Some(cadence) = metrics.average_cadence.filter(|c| *c > 0.0) {
        reasons.push(format!(
            "Données de cadence présentes ({:.0} rpm) - capteur de vélo électrique",
            cadence
        ));
    }

    if let Some(r) = ratio {
        if elevation >= thresholds.min_elevation && r < thresholds.effort_ratio_threshold {
            reasons.push(format!("Effort faible pour le dénivelé (ratio {:.1})", r));
        }
    }

    if thresholds.check_steep_speed {
        let distance = activity.distance_m();
        let speed = speed_kmh(distance, activity.moving_secs());
        let grade = if distance > 0.0 {
            elevation / distance * 100.0
        } else {
            0.0
        };
        let easy_climb = ratio.is_some_and(|r| r < STEEP_EFFORT_RATIO);
        if speed > STEEP_SPEED_KMH && grade > STEEP_GRADE_PCT && easy_climb {
            reasons.push(format!(
                "Vitesse élevée en montée ({:.1} km/h, pente {:.1}%)",
                speed, grade
            ));
        }
    }

    let suspicious = !reasons.is_empty();
    ClassificationResult {
        activity_id: activity.id,
        suspicious,
        reasons,
        recommendation: suspicious.then(|| EBIKE_RECOMMENDATION.to_string()),
        effort_ratio: ratio,
    }
}
