// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Tool and prompt descriptors returned by `tools/list` and `prompts/list`.

use crate::services::tools::{Tool, MAX_LIMIT};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;

pub const PROTOCOL_VERSION: &str = "2024-11-05";
pub const SERVER_NAME: &str = "strava";

/// Name of the single prompt the server offers.
pub const SUGGEST_NAME_PROMPT: &str = "suggest_activity_name";

#[derive(Debug, Clone, Serialize)]
pub struct ToolSchema {
    pub name: &'static str,
    pub description: &'static str,
    #[serde(rename = "inputSchema")]
    pub input_schema: JsonSchema,
}

#[derive(Debug, Clone, Serialize)]
pub struct JsonSchema {
    #[serde(rename = "type")]
    pub schema_type: &'static str,
    pub properties: BTreeMap<&'static str, PropertySchema>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<&'static str>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PropertySchema {
    #[serde(rename = "type")]
    pub property_type: &'static str,
    pub description: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum: Option<Value>,
}

impl PropertySchema {
    fn new(property_type: &'static str, description: &'static str) -> Self {
        Self {
            property_type,
            description,
            default: None,
            minimum: None,
            maximum: None,
        }
    }

    fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    fn with_range(mut self, minimum: Value, maximum: Option<Value>) -> Self {
        self.minimum = Some(minimum);
        self.maximum = maximum;
        self
    }
}

fn object(
    properties: Vec<(&'static str, PropertySchema)>,
    required: Vec<&'static str>,
) -> JsonSchema {
    JsonSchema {
        schema_type: "object",
        properties: properties.into_iter().collect(),
        required,
    }
}

fn activity_id() -> (&'static str, PropertySchema) {
    (
        "activity_id",
        PropertySchema::new("integer", "The Strava activity ID."),
    )
}

fn limit(description: &'static str, default: usize) -> (&'static str, PropertySchema) {
    (
        "limit",
        PropertySchema::new("integer", description)
            .with_default(json!(default))
            .with_range(json!(1), Some(json!(MAX_LIMIT))),
    )
}

/// Descriptor of one tool.
pub fn tool_schema(tool: Tool) -> ToolSchema {
    let (description, input_schema) = match tool {
        Tool::GetActivities => (
            "Get the latest Strava activities with id, name, type, distance, time, elevation and date.",
            object(
                vec![limit("Maximum number of activities to return.", 30)],
                vec![],
            ),
        ),
        Tool::GetActivity => (
            "Get detailed information about a Strava activity, including speed, heart rate, suffer score and kudos.",
            object(vec![activity_id()], vec!["activity_id"]),
        ),
        Tool::GetStats => (
            "Get athlete statistics: recent, year-to-date and all-time totals for rides and runs.",
            object(vec![], vec![]),
        ),
        Tool::RenameActivity => (
            "Rename a Strava activity with a new custom name.",
            object(
                vec![
                    activity_id(),
                    (
                        "new_name",
                        PropertySchema::new("string", "The new name for the activity (1-255 characters)."),
                    ),
                ],
                vec!["activity_id", "new_name"],
            ),
        ),
        Tool::UpdateActivityType => (
            "Update the sport type of a Strava activity (Ride, MountainBikeRide, EMountainBikeRide, EBikeRide, Run, TrailRun, Walk, Hike).",
            object(
                vec![
                    activity_id(),
                    (
                        "sport_type",
                        PropertySchema::new("string", "The new Strava sport type."),
                    ),
                ],
                vec!["activity_id", "sport_type"],
            ),
        ),
        Tool::FixEbikeActivity => (
            "Mark a mountain bike ride as an electric mountain bike ride (EMountainBikeRide).",
            object(vec![activity_id()], vec!["activity_id"]),
        ),
        Tool::DetectGenericNamedActivities => (
            "Find activities with auto-generated names (\"Morning Run\", \"Trail le midi\", ...) that should be renamed, with location and effort data.",
            object(
                vec![limit("Maximum number of activities to scan.", 50)],
                vec![],
            ),
        ),
        Tool::DetectEbikeActivities => (
            "Find rides that were probably done on an e-bike, using cadence data and the effort-to-climbing ratio.",
            object(
                vec![
                    limit("Maximum number of activities to analyze.", 30),
                    (
                        "effort_ratio_threshold",
                        PropertySchema::new(
                            "number",
                            "Suffer score per 100 m of climbing below which a ride is suspicious.",
                        )
                        .with_default(json!(4.5))
                        .with_range(json!(0), None),
                    ),
                    (
                        "min_elevation",
                        PropertySchema::new(
                            "number",
                            "Minimum elevation gain in meters for the effort-ratio check.",
                        )
                        .with_default(json!(200))
                        .with_range(json!(0), None),
                    ),
                    (
                        "check_steep_speed",
                        PropertySchema::new(
                            "boolean",
                            "Also flag fast rides on steep terrain with a low effort ratio.",
                        )
                        .with_default(json!(false)),
                    ),
                ],
                vec![],
            ),
        ),
        Tool::GetActivityDetailsForNaming => (
            "Get location, effort, terrain and performance data useful for suggesting a meaningful activity name.",
            object(vec![activity_id()], vec!["activity_id"]),
        ),
    };

    ToolSchema {
        name: tool.name(),
        description,
        input_schema,
    }
}

/// Descriptors of every tool.
pub fn get_tools() -> Vec<ToolSchema> {
    Tool::ALL.into_iter().map(tool_schema).collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct PromptArgument {
    pub name: &'static str,
    pub description: &'static str,
    pub required: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct PromptSchema {
    pub name: &'static str,
    pub description: &'static str,
    pub arguments: Vec<PromptArgument>,
}

pub fn get_prompts() -> Vec<PromptSchema> {
    let arg = |name: &'static str, description: &'static str, required: bool| PromptArgument {
        name,
        description,
        required,
    };

    vec![PromptSchema {
        name: SUGGEST_NAME_PROMPT,
        description: "Suggest a creative name for a Strava activity.",
        arguments: vec![
            arg(
                "activity_type",
                "Activity type (Run, TrailRun, Ride, MountainBikeRide, Hike, Walk)",
                true,
            ),
            arg("location", "Place (city, region, mountain, park, ...)", true),
            arg("elevation_gain", "Elevation gain in meters", true),
            arg("distance_km", "Distance in kilometers", true),
            arg("moving_time_min", "Moving time in minutes", true),
            arg("suffer_score", "Strava suffer score (0-400+)", false),
        ],
    }]
}

/// `initialize` result.
pub fn server_info() -> Value {
    json!({
        "protocolVersion": PROTOCOL_VERSION,
        "capabilities": {
            "tools": { "listChanged": false },
            "prompts": { "listChanged": false }
        },
        "serverInfo": {
            "name": SERVER_NAME,
            "version": env!("CARGO_PKG_VERSION")
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_tool_has_object_schema() {
        let tools = get_tools();
        assert_eq!(tools.len(), Tool::ALL.len());

        for tool in &tools {
            let value = serde_json::to_value(tool).unwrap();
            assert_eq!(value["inputSchema"]["type"], "object");
            assert!(!tool.description.is_empty());
            for required in &tool.input_schema.required {
                assert!(tool.input_schema.properties.contains_key(required));
            }
        }
    }

    #[test]
    fn test_ebike_defaults_advertised() {
        let schema = serde_json::to_value(tool_schema(Tool::DetectEbikeActivities)).unwrap();
        let props = &schema["inputSchema"]["properties"];
        assert_eq!(props["limit"]["default"], 30);
        assert_eq!(props["limit"]["maximum"], 200);
        assert_eq!(props["effort_ratio_threshold"]["default"], 4.5);
        assert_eq!(props["min_elevation"]["default"], 200);
        assert_eq!(props["check_steep_speed"]["default"], false);
    }

    #[test]
    fn test_get_stats_has_no_required_fields() {
        let schema = serde_json::to_value(tool_schema(Tool::GetStats)).unwrap();
        assert!(schema["inputSchema"].get("required").is_none());
    }
}
