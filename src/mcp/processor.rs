// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! MCP request routing, shared by the stdio and HTTP transports.

use super::jsonrpc::{
    JsonRpcRequest, JsonRpcResponse, INVALID_PARAMS, INVALID_REQUEST, JSONRPC_VERSION,
    METHOD_NOT_FOUND, PARSE_ERROR,
};
use super::schema::{self, SUGGEST_NAME_PROMPT};
use crate::error::AppError;
use crate::services::naming::{suggest_activity_name_prompt, NamePromptArgs};
use crate::services::tools::{Tool, ToolService};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
struct ToolCallParams {
    name: String,
    #[serde(default)]
    arguments: Value,
}

#[derive(Debug, Deserialize)]
struct PromptGetParams {
    name: String,
    #[serde(default)]
    arguments: Map<String, Value>,
}

/// Routes MCP methods to the tool service.
#[derive(Clone)]
pub struct McpProcessor {
    tools: ToolService,
}

impl McpProcessor {
    pub fn new(tools: ToolService) -> Self {
        Self { tools }
    }

    /// Handle one raw JSON-RPC message; `None` for notifications.
    pub async fn handle_message(&self, raw: &str) -> Option<JsonRpcResponse> {
        let value: Value = match serde_json::from_str(raw) {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, "Unparseable MCP message");
                return Some(JsonRpcResponse::error(
                    None,
                    PARSE_ERROR,
                    format!("Parse error: {}", e),
                ));
            }
        };
        self.handle_value(value).await
    }

    /// Handle an already-parsed JSON-RPC message.
    pub async fn handle_value(&self, value: Value) -> Option<JsonRpcResponse> {
        let id = value.get("id").cloned();
        match serde_json::from_value::<JsonRpcRequest>(value) {
            Ok(request) => self.handle_request(request).await,
            Err(e) => Some(JsonRpcResponse::error(
                id,
                INVALID_REQUEST,
                format!("Invalid request: {}", e),
            )),
        }
    }

    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        let start = std::time::Instant::now();
        debug!(mcp_method = %request.method, mcp_id = ?request.id, "Received MCP request");

        if request.is_notification() {
            debug!(mcp_method = %request.method, "Notification ignored");
            return None;
        }

        let id = request.id.clone();
        let response = if request.jsonrpc != JSONRPC_VERSION {
            JsonRpcResponse::error(
                id,
                INVALID_REQUEST,
                format!("Invalid JSON-RPC version: {}", request.jsonrpc),
            )
        } else {
            match request.method.as_str() {
                "initialize" => JsonRpcResponse::success(id, schema::server_info()),
                "ping" => JsonRpcResponse::success(id, json!({})),
                "tools/list" => {
                    JsonRpcResponse::success(id, json!({ "tools": schema::get_tools() }))
                }
                "tools/call" => self.handle_tools_call(id, request.params).await,
                "prompts/list" => {
                    JsonRpcResponse::success(id, json!({ "prompts": schema::get_prompts() }))
                }
                "prompts/get" => Self::handle_prompts_get(id, request.params),
                other => {
                    warn!(mcp_method = %other, "Unknown MCP method");
                    JsonRpcResponse::error(id, METHOD_NOT_FOUND, format!("Unknown method: {}", other))
                }
            }
        };

        debug!(
            mcp_method = %request.method,
            duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(0),
            is_error = response.is_error(),
            "Completed MCP request"
        );
        Some(response)
    }

    async fn handle_tools_call(&self, id: Option<Value>, params: Option<Value>) -> JsonRpcResponse {
        let params: ToolCallParams = match params.map(serde_json::from_value) {
            Some(Ok(params)) => params,
            Some(Err(e)) => {
                return JsonRpcResponse::error(id, INVALID_PARAMS, format!("Invalid params: {}", e))
            }
            None => {
                return JsonRpcResponse::error(id, INVALID_PARAMS, "Missing parameters for tools/call")
            }
        };

        let Some(tool) = Tool::from_name(&params.name) else {
            return JsonRpcResponse::error(
                id,
                INVALID_PARAMS,
                format!("Unknown tool: {}", params.name),
            );
        };

        let result = match self.tools.call(tool, params.arguments).await {
            Ok(value) => tool_success(value),
            Err(e) => tool_error(&e),
        };
        JsonRpcResponse::success(id, result)
    }

    fn handle_prompts_get(id: Option<Value>, params: Option<Value>) -> JsonRpcResponse {
        let params: PromptGetParams = match params.map(serde_json::from_value) {
            Some(Ok(params)) => params,
            Some(Err(e)) => {
                return JsonRpcResponse::error(id, INVALID_PARAMS, format!("Invalid params: {}", e))
            }
            None => {
                return JsonRpcResponse::error(id, INVALID_PARAMS, "Missing parameters for prompts/get")
            }
        };

        if params.name != SUGGEST_NAME_PROMPT {
            return JsonRpcResponse::error(
                id,
                INVALID_PARAMS,
                format!("Unknown prompt: {}", params.name),
            );
        }

        let args = match prompt_args(&params.arguments) {
            Ok(args) => args,
            Err(msg) => return JsonRpcResponse::error(id, INVALID_PARAMS, msg),
        };

        JsonRpcResponse::success(
            id,
            json!({
                "description": "Suggest a creative name for a Strava activity.",
                "messages": [{
                    "role": "user",
                    "content": { "type": "text", "text": suggest_activity_name_prompt(&args) }
                }]
            }),
        )
    }
}

/// MCP tool result wrapping a successful value.
pub fn tool_success(value: Value) -> Value {
    let text = serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string());
    // structuredContent must be an object
    let structured = if value.is_object() {
        value
    } else {
        json!({ "result": value })
    };

    json!({
        "content": [{ "type": "text", "text": text }],
        "structuredContent": structured,
        "isError": false
    })
}

/// MCP tool result reporting a failure to the assistant.
pub fn tool_error(error: &AppError) -> Value {
    json!({
        "content": [{ "type": "text", "text": error.to_string() }],
        "structuredContent": error.to_body(),
        "isError": true
    })
}

/// Prompt arguments arrive as strings per MCP; numbers are accepted too.
fn prompt_args(arguments: &Map<String, Value>) -> Result<NamePromptArgs, String> {
    fn text(arguments: &Map<String, Value>, key: &str) -> Result<String, String> {
        match arguments.get(key) {
            Some(Value::String(s)) => Ok(s.clone()),
            Some(Value::Number(n)) => Ok(n.to_string()),
            _ => Err(format!("Missing prompt argument: {}", key)),
        }
    }

    fn number(arguments: &Map<String, Value>, key: &str) -> Result<Option<f64>, String> {
        match arguments.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Number(n)) => Ok(n.as_f64()),
            Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
            Some(Value::String(s)) => s
                .trim()
                .parse()
                .map(Some)
                .map_err(|_| format!("Prompt argument {} must be a number", key)),
            Some(_) => Err(format!("Prompt argument {} must be a number", key)),
        }
    }

    let required = |key: &str| -> Result<f64, String> {
        number(arguments, key)?.ok_or_else(|| format!("Missing prompt argument: {}", key))
    };

    Ok(NamePromptArgs {
        activity_type: text(arguments, "activity_type")?,
        location: text(arguments, "location")?,
        elevation_gain: required("elevation_gain")?,
        distance_km: required("distance_km")?,
        moving_time_min: required("moving_time_min")?,
        suffer_score: number(arguments, "suffer_score")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_prompt_args_from_strings() {
        let args = prompt_args(&map(json!({
            "activity_type": "Ride",
            "location": "Lyon",
            "elevation_gain": "450",
            "distance_km": "32.5",
            "moving_time_min": 95
        })))
        .unwrap();

        assert_eq!(args.elevation_gain, 450.0);
        assert_eq!(args.distance_km, 32.5);
        assert_eq!(args.moving_time_min, 95.0);
        assert_eq!(args.suffer_score, None);
    }

    #[test]
    fn test_prompt_args_missing_required() {
        let err = prompt_args(&map(json!({"activity_type": "Ride", "location": "Lyon"})))
            .unwrap_err();
        assert!(err.contains("elevation_gain"));
    }

    #[test]
    fn test_prompt_args_rejects_non_numeric() {
        let err = prompt_args(&map(json!({
            "activity_type": "Ride",
            "location": "Lyon",
            "elevation_gain": "beaucoup",
            "distance_km": "1",
            "moving_time_min": "1"
        })))
        .unwrap_err();
        assert!(err.contains("must be a number"));
    }

    #[test]
    fn test_tool_success_wraps_lists() {
        let result = tool_success(json!([1, 2]));
        assert_eq!(result["structuredContent"], json!({ "result": [1, 2] }));
        assert_eq!(result["isError"], false);
        assert_eq!(result["content"][0]["type"], "text");
    }

    #[test]
    fn test_tool_error_body() {
        let result = tool_error(&AppError::BadRequest("limit".to_string()));
        assert_eq!(result["isError"], true);
        assert_eq!(result["structuredContent"]["error"], "bad_request");
        assert_eq!(result["content"][0]["text"], "Invalid request: limit");
    }
}
