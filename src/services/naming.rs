// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Derived metrics and hints used when suggesting activity names.

use crate::services::geocoding::UNKNOWN_LOCATION;
use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// Round to a fixed number of decimal places.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Average moving speed in km/h (0 without moving time).
pub fn speed_kmh(distance_m: f64, moving_secs: u64) -> f64 {
    if moving_secs == 0 {
        return 0.0;
    }
    (distance_m / 1000.0) / (moving_secs as f64 / 3600.0)
}

/// Average pace in minutes per km (0 without distance).
pub fn pace_min_per_km(distance_m: f64, moving_secs: u64) -> f64 {
    if distance_m <= 0.0 {
        return 0.0;
    }
    (moving_secs as f64 / 60.0) / (distance_m / 1000.0)
}

/// Meters climbed per km (0 without distance).
pub fn elevation_per_km(elevation_m: f64, distance_m: f64) -> f64 {
    if distance_m <= 0.0 {
        return 0.0;
    }
    elevation_m / (distance_m / 1000.0)
}

/// Sports measured by pace rather than speed.
fn is_foot_sport(category: &str) -> bool {
    matches!(category, "Run" | "TrailRun" | "Walk" | "Hike")
}

/// Human-readable pace (`M:SS min/km`) or speed (`S.S km/h`).
pub fn pace_or_speed(category: &str, distance_m: f64, moving_secs: u64) -> String {
    if distance_m <= 0.0 || moving_secs == 0 {
        return "N/A".to_string();
    }

    if is_foot_sport(category) {
        let total_secs = (pace_min_per_km(distance_m, moving_secs) * 60.0).round() as u64;
        format!("{}:{:02} min/km", total_secs / 60, total_secs % 60)
    } else {
        format!("{:.1} km/h", speed_kmh(distance_m, moving_secs))
    }
}

/// Effort bucket derived from the Strava suffer score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffortLevel {
    Easy,
    Moderate,
    Hard,
    VeryHard,
    Extreme,
    Unknown,
}

impl EffortLevel {
    pub fn from_suffer_score(score: Option<f64>) -> Self {
        match score {
            None => Self::Unknown,
            Some(s) if s < 50.0 => Self::Easy,
            Some(s) if s < 100.0 => Self::Moderate,
            Some(s) if s < 150.0 => Self::Hard,
            Some(s) if s < 250.0 => Self::VeryHard,
            Some(_) => Self::Extreme,
        }
    }

    /// French wording used by the naming prompt.
    pub fn description(self) -> Option<&'static str> {
        match self {
            Self::Easy => Some("sortie tranquille, récupération active"),
            Self::Moderate => Some("effort modéré, endurance fondamentale"),
            Self::Hard => Some("effort soutenu, bonne intensité"),
            Self::VeryHard => Some("effort intense, séance difficile"),
            Self::Extreme => Some("effort maximal, dépassement de soi"),
            Self::Unknown => None,
        }
    }
}

/// Terrain/performance flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Characteristics {
    pub is_hilly: bool,
    pub is_long: bool,
    pub is_fast: bool,
}

/// Rounded metrics block of the naming details.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamingMetrics {
    pub distance_km: f64,
    pub elevation_gain_m: f64,
    pub elevation_per_km: f64,
    pub moving_time_min: f64,
    pub elapsed_time_min: f64,
    pub average_speed_kmh: f64,
    pub pace_min_per_km: f64,
    pub pace_or_speed: String,
}

/// What a good name could mention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NamingHints {
    pub use_location: bool,
    pub mention_elevation: bool,
    pub mention_distance: bool,
    pub mention_effort: bool,
}

/// Raw inputs of the synthesizer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NamingInput<'a> {
    /// `type` of the activity (Run, Ride, ...)
    pub activity_type: &'a str,
    /// `sport_type`, preferred for pace/speed display when present
    pub sport_type: Option<&'a str>,
    pub distance_m: f64,
    pub elevation_m: f64,
    pub moving_secs: u64,
    pub elapsed_secs: u64,
    pub suffer_score: Option<f64>,
    /// Resolved display name of the location
    pub location_name: &'a str,
}

/// Everything derived from a [`NamingInput`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamingAnalysis {
    pub metrics: NamingMetrics,
    pub effort_level: EffortLevel,
    pub characteristics: Characteristics,
    pub naming_hints: NamingHints,
}

pub fn analyze(input: &NamingInput<'_>) -> NamingAnalysis {
    let speed = speed_kmh(input.distance_m, input.moving_secs);
    let pace = pace_min_per_km(input.distance_m, input.moving_secs);
    let climb_density = elevation_per_km(input.elevation_m, input.distance_m);

    let is_long = input.distance_m > 20_000.0;
    let is_fast = (input.activity_type.contains("Run") && pace > 0.0 && pace < 5.0)
        || (input.activity_type.contains("Ride") && speed > 25.0);

    let category = input.sport_type.unwrap_or(input.activity_type);

    NamingAnalysis {
        metrics: NamingMetrics {
            distance_km: round_to(input.distance_m / 1000.0, 2),
            elevation_gain_m: input.elevation_m.round(),
            elevation_per_km: round_to(climb_density, 1),
            moving_time_min: (input.moving_secs as f64 / 60.0).round(),
            elapsed_time_min: (input.elapsed_secs as f64 / 60.0).round(),
            average_speed_kmh: round_to(speed, 1),
            pace_min_per_km: round_to(pace, 2),
            pace_or_speed: pace_or_speed(category, input.distance_m, input.moving_secs),
        },
        effort_level: EffortLevel::from_suffer_score(input.suffer_score),
        characteristics: Characteristics {
            is_hilly: climb_density > 30.0,
            is_long,
            is_fast,
        },
        naming_hints: NamingHints {
            use_location: input.location_name != UNKNOWN_LOCATION,
            mention_elevation: input.elevation_m > 300.0,
            mention_distance: is_long,
            mention_effort: input.suffer_score.is_some_and(|s| s > 100.0),
        },
    }
}

// ─── suggest_activity_name prompt ───────────────────────────

/// Arguments of the `suggest_activity_name` prompt.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NamePromptArgs {
    pub activity_type: String,
    pub location: String,
    pub elevation_gain: f64,
    pub distance_km: f64,
    pub moving_time_min: f64,
    #[serde(default)]
    pub suffer_score: Option<f64>,
}

/// Render the French naming prompt for an assistant.
pub fn suggest_activity_name_prompt(args: &NamePromptArgs) -> String {
    let effort = EffortLevel::from_suffer_score(args.suffer_score)
        .description()
        .unwrap_or("Non disponible");

    let speed = if args.moving_time_min > 0.0 {
        args.distance_km / (args.moving_time_min / 60.0)
    } else {
        0.0
    };
    let pace = if args.distance_km > 0.0 {
        args.moving_time_min / args.distance_km
    } else {
        0.0
    };

    let mut prompt = String::from(
        "Tu dois suggérer un nom créatif et mémorable pour une activité Strava.\n\n",
    );
    // Writing to a String cannot fail.
    let _ = write!(
        prompt,
        "**Informations sur l'activité :**\n\
         - Type : {}\n\
         - Lieu : {}\n\
         - Distance : {:.1} km\n\
         - Dénivelé positif : {:.0} m\n\
         - Durée : {:.0} minutes\n\
         - Vitesse moyenne : {:.1} km/h (allure : {:.1} min/km)\n\
         - Niveau d'effort : {}\n\n",
        args.activity_type,
        args.location,
        args.distance_km,
        args.elevation_gain,
        args.moving_time_min,
        speed,
        pace,
        effort,
    );
    prompt.push_str(
        "**Règles pour le nom :**\n\
         1. Court et percutant (3-6 mots maximum)\n\
         2. Évoque le lieu OU l'effort OU un moment marquant\n\
         3. Peut inclure un jeu de mots, une référence culturelle ou de l'humour\n\
         4. Évite les noms génériques comme \"Course du matin\" ou \"Sortie vélo\"\n\n\
         **Exemples de bons noms par type :**\n\
         - Trail/Run : \"Pic Saint-Loup\", \"Crêtes au lever du soleil\", \"Intervalles infernaux\"\n\
         - VTT : \"Single track du Caroux\", \"Descente à Sète\", \"Boue et sueur\"\n\
         - Vélo route : \"Col de la Lozère\", \"Contre le Mistral\", \"100 bornes de bonheur\"\n\
         - Randonnée : \"Panorama Cévennes\", \"Sentier des douaniers\", \"Escapade forestière\"\n\n\
         **Propose 3 suggestions de noms**, du plus descriptif au plus créatif.",
    );
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effort_level_boundaries() {
        assert_eq!(EffortLevel::from_suffer_score(Some(49.0)), EffortLevel::Easy);
        assert_eq!(EffortLevel::from_suffer_score(Some(50.0)), EffortLevel::Moderate);
        assert_eq!(EffortLevel::from_suffer_score(Some(149.0)), EffortLevel::Hard);
        assert_eq!(EffortLevel::from_suffer_score(Some(249.0)), EffortLevel::VeryHard);
        assert_eq!(EffortLevel::from_suffer_score(Some(250.0)), EffortLevel::Extreme);
        assert_eq!(EffortLevel::from_suffer_score(Some(0.0)), EffortLevel::Easy);
        assert_eq!(EffortLevel::from_suffer_score(None), EffortLevel::Unknown);
    }

    #[test]
    fn test_effort_level_serializes_snake_case() {
        assert_eq!(
            serde_json::to_value(EffortLevel::VeryHard).unwrap(),
            serde_json::json!("very_hard")
        );
    }

    #[test]
    fn test_guarded_divisions() {
        assert_eq!(speed_kmh(10000.0, 0), 0.0);
        assert_eq!(pace_min_per_km(0.0, 3600), 0.0);
        assert_eq!(elevation_per_km(500.0, 0.0), 0.0);
        assert_eq!(speed_kmh(15000.0, 3600), 15.0);
        assert_eq!(pace_min_per_km(10000.0, 3000), 5.0);
    }

    #[test]
    fn test_pace_or_speed_display() {
        assert_eq!(pace_or_speed("Run", 10000.0, 3270), "5:27 min/km");
        assert_eq!(pace_or_speed("TrailRun", 10000.0, 3000), "5:00 min/km");
        assert_eq!(pace_or_speed("Ride", 30000.0, 3600), "30.0 km/h");
        assert_eq!(pace_or_speed("Ride", 0.0, 3600), "N/A");
        assert_eq!(pace_or_speed("Hike", 5000.0, 0), "N/A");
    }

    #[test]
    fn test_analyze_hilly_long_ride() {
        let analysis = analyze(&NamingInput {
            activity_type: "Ride",
            sport_type: Some("MountainBikeRide"),
            distance_m: 42000.0,
            elevation_m: 1500.0,
            moving_secs: 5400,
            elapsed_secs: 6000,
            suffer_score: Some(180.0),
            location_name: "Annecy, Auvergne-Rhône-Alpes, France",
        });

        assert_eq!(analysis.metrics.distance_km, 42.0);
        assert_eq!(analysis.metrics.average_speed_kmh, 28.0);
        assert_eq!(analysis.metrics.moving_time_min, 90.0);
        assert_eq!(analysis.metrics.elapsed_time_min, 100.0);
        assert_eq!(analysis.effort_level, EffortLevel::VeryHard);
        assert!(analysis.characteristics.is_hilly);
        assert!(analysis.characteristics.is_long);
        assert!(analysis.characteristics.is_fast);
        assert!(analysis.naming_hints.use_location);
        assert!(analysis.naming_hints.mention_elevation);
        assert!(analysis.naming_hints.mention_distance);
        assert!(analysis.naming_hints.mention_effort);
    }

    #[test]
    fn test_analyze_run_without_distance_is_not_fast() {
        let analysis = analyze(&NamingInput {
            activity_type: "Run",
            moving_secs: 1800,
            location_name: UNKNOWN_LOCATION,
            ..NamingInput::default()
        });

        assert!(!analysis.characteristics.is_fast);
        assert!(!analysis.naming_hints.use_location);
        assert!(!analysis.naming_hints.mention_effort);
        assert_eq!(analysis.effort_level, EffortLevel::Unknown);
        assert_eq!(analysis.metrics.pace_or_speed, "N/A");
    }

    #[test]
    fn test_prompt_contains_activity_facts() {
        let prompt = suggest_activity_name_prompt(&NamePromptArgs {
            activity_type: "TrailRun".to_string(),
            location: "Pic Saint-Loup".to_string(),
            elevation_gain: 650.0,
            distance_km: 12.0,
            moving_time_min: 90.0,
            suffer_score: Some(120.0),
        });

        assert!(prompt.contains("- Type : TrailRun"));
        assert!(prompt.contains("- Lieu : Pic Saint-Loup"));
        assert!(prompt.contains("- Distance : 12.0 km"));
        assert!(prompt.contains("- Dénivelé positif : 650 m"));
        assert!(prompt.contains("8.0 km/h (allure : 7.5 min/km)"));
        assert!(prompt.contains("effort soutenu"));
        assert!(prompt.contains("**Propose 3 suggestions de noms**"));
    }

    #[test]
    fn test_prompt_without_suffer_score() {
        let prompt = suggest_activity_name_prompt(&NamePromptArgs {
            activity_type: "Walk".to_string(),
            location: "Lyon".to_string(),
            elevation_gain: 0.0,
            distance_km: 0.0,
            moving_time_min: 0.0,
            suffer_score: None,
        });
        assert!(prompt.contains("Niveau d'effort : Non disponible"));
        assert!(prompt.contains("0.0 km/h (allure : 0.0 min/km)"));
    }
}
