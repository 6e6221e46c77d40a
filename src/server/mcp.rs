//! MCP protocol implementation for JSON-RPC 2.0 communication.
//!
//! This module provides the core MCP server implementation including:
//! - JSON-RPC 2.0 request/response handling
//! - Tool definitions and schemas
//! - Stdio-based server communication

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, error, info};

use super::{handle_tool_call, SharedState};

#[cfg(test)]
#[path = "mcp_tests.rs"]
mod mcp_tests;

/// Name reported during the initialize handshake.
pub const SERVER_NAME: &str = "mcp-cognitive-models";

/// JSON-RPC 2.0 request structure.
#[derive(Debug, Deserialize)]
pub struct JsonRpcRequest {
    /// JSON-RPC version (must be "2.0").
    pub jsonrpc: String,
    /// Request identifier (None for notifications).
    pub id: Option<Value>,
    /// The method name to invoke.
    pub method: String,
    /// Optional parameters for the method.
    #[serde(default)]
    pub params: Option<Value>,
}

/// JSON-RPC 2.0 response structure.
#[derive(Debug, Serialize)]
pub struct JsonRpcResponse {
    /// JSON-RPC version (always "2.0").
    pub jsonrpc: String,
    /// Request identifier (null for parse errors).
    pub id: Value,
    /// The result on success (mutually exclusive with error).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// The error on failure (mutually exclusive with result).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

/// JSON-RPC 2.0 error object.
#[derive(Debug, Serialize)]
pub struct JsonRpcError {
    /// Error code (negative for predefined errors).
    pub code: i32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional error data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// MCP server information returned during initialization.
#[derive(Debug, Serialize)]
pub struct ServerInfo {
    /// The server name identifier.
    pub name: String,
    /// The server version string.
    pub version: String,
}

/// MCP server capabilities advertised to clients.
#[derive(Debug, Serialize)]
pub struct Capabilities {
    /// Tool-related capabilities.
    pub tools: ToolCapabilities,
}

/// Tool-specific capabilities.
#[derive(Debug, Serialize)]
pub struct ToolCapabilities {
    /// Whether the tool list can change dynamically.
    #[serde(rename = "listChanged")]
    pub list_changed: bool,
}

/// Result of the MCP initialize handshake.
#[derive(Debug, Serialize)]
pub struct InitializeResult {
    /// The MCP protocol version supported.
    #[serde(rename = "protocolVersion")]
    pub protocol_version: String,
    /// Server capabilities.
    pub capabilities: Capabilities,
    /// Server identification information.
    #[serde(rename = "serverInfo")]
    pub server_info: ServerInfo,
}

/// MCP tool definition with JSON Schema.
#[derive(Debug, Clone, Serialize)]
pub struct Tool {
    /// Unique tool name (used in tool calls).
    pub name: String,
    /// Human-readable description of the tool.
    pub description: String,
    /// JSON Schema for the tool's input parameters.
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

/// Parameters for a tools/call request.
#[derive(Debug, Deserialize)]
pub struct ToolCallParams {
    /// The name of the tool to invoke.
    pub name: String,
    /// Optional arguments for the tool.
    #[serde(default)]
    pub arguments: Option<Value>,
}

/// Content item within a tool result.
#[derive(Debug, Serialize)]
pub struct ToolResultContent {
    /// The content type (e.g., "text").
    #[serde(rename = "type")]
    pub content_type: String,
    /// The text content of the result.
    pub text: String,
}

/// Result of a tool invocation.
#[derive(Debug, Serialize)]
pub struct ToolCallResult {
    /// The result content items.
    pub content: Vec<ToolResultContent>,
    /// Whether the result represents an error.
    #[serde(rename = "isError", skip_serializing_if = "Option::is_none")]
    pub is_error: Option<bool>,
}

impl JsonRpcResponse {
    /// Create a success response
    pub fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id: id.unwrap_or(Value::Null),
            result: Some(result),
            error: None,
        }
    }

    /// Create an error response
    pub fn error(id: Option<Value>, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id: id.unwrap_or(Value::Null),
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
                data: None,
            }),
        }
    }
}

/// MCP Server running over stdio.
///
/// Reads one JSON-RPC message per line from stdin and writes one response
/// per line to stdout. Logs never go to stdout.
pub struct McpServer {
    /// Shared application state.
    state: SharedState,
}

impl McpServer {
    /// Create a new MCP server
    pub fn new(state: SharedState) -> Self {
        Self { state }
    }

    /// Run the server using async stdio
    pub async fn run(&self) -> std::io::Result<()> {
        info!(server = SERVER_NAME, "MCP server starting...");

        let stdin = tokio::io::stdin();
        let mut stdout = tokio::io::stdout();
        let mut reader = BufReader::new(stdin);
        let mut line = String::new();

        loop {
            line.clear();
            let bytes_read = reader.read_line(&mut line).await?;

            // EOF reached
            if bytes_read == 0 {
                info!("EOF received, shutting down");
                break;
            }

            if let Some(response) = self.process_line(&line).await {
                let response_json = serde_json::to_string(&response)?;
                debug!(response = %response_json, "Sending response");

                stdout.write_all(response_json.as_bytes()).await?;
                stdout.write_all(b"\n").await?;
                stdout.flush().await?;
            }
        }

        Ok(())
    }

    /// Handle one line of input.
    ///
    /// Returns `None` for blank lines and notifications.
    pub async fn process_line(&self, line: &str) -> Option<JsonRpcResponse> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return None;
        }

        debug!(request = %trimmed, "Received request");

        match serde_json::from_str::<JsonRpcRequest>(trimmed) {
            Ok(request) => self.handle_request(request).await,
            Err(e) => {
                error!(error = %e, "Failed to parse request");
                Some(JsonRpcResponse::error(
                    None,
                    -32700,
                    format!("Parse error: {}", e),
                ))
            }
        }
    }

    /// Handle a single JSON-RPC request
    /// Returns None for notifications (requests without id)
    async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        let is_notification = request.id.is_none();

        match request.method.as_str() {
            "initialize" => Some(self.handle_initialize(request.id)),
            "initialized" | "notifications/initialized" => {
                debug!("Received initialized notification");
                None
            }
            "notifications/cancelled" => {
                debug!("Received cancelled notification");
                None
            }
            "tools/list" => Some(self.handle_tools_list(request.id)),
            "tools/call" => Some(self.handle_tool_call(request.id, request.params).await),
            "ping" => Some(JsonRpcResponse::success(
                request.id,
                Value::Object(Default::default()),
            )),
            method => {
                if is_notification {
                    debug!(method = %method, "Unknown notification, ignoring");
                    None
                } else {
                    error!(method = %method, "Unknown method");
                    Some(JsonRpcResponse::error(
                        request.id,
                        -32601,
                        format!("Method not found: {}", method),
                    ))
                }
            }
        }
    }

    /// Handle initialize request
    fn handle_initialize(&self, id: Option<Value>) -> JsonRpcResponse {
        info!("Handling initialize request");

        let result = InitializeResult {
            protocol_version: "2024-11-05".to_string(),
            capabilities: Capabilities {
                tools: ToolCapabilities {
                    list_changed: false,
                },
            },
            server_info: ServerInfo {
                name: SERVER_NAME.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        };

        match serde_json::to_value(result) {
            Ok(val) => JsonRpcResponse::success(id, val),
            Err(e) => {
                error!(error = %e, "Failed to serialize initialize result");
                JsonRpcResponse::error(id, -32603, format!("Internal error: {}", e))
            }
        }
    }

    /// Handle tools/list request
    fn handle_tools_list(&self, id: Option<Value>) -> JsonRpcResponse {
        info!("Handling tools/list request");

        JsonRpcResponse::success(
            id,
            serde_json::json!({
                "tools": tool_definitions()
            }),
        )
    }

    /// Handle tools/call request
    async fn handle_tool_call(&self, id: Option<Value>, params: Option<Value>) -> JsonRpcResponse {
        let params: ToolCallParams = match params {
            Some(p) => match serde_json::from_value(p) {
                Ok(p) => p,
                Err(e) => {
                    return JsonRpcResponse::error(id, -32602, format!("Invalid params: {}", e));
                }
            },
            None => {
                return JsonRpcResponse::error(id, -32602, "Missing params");
            }
        };

        info!(tool = %params.name, "Handling tool call");

        let (content, is_error) =
            match handle_tool_call(&self.state, &params.name, params.arguments).await {
                Ok(result) => {
                    let text = serde_json::to_string_pretty(&result).unwrap_or_else(|e| {
                        error!(error = %e, "Failed to serialize tool result");
                        format!("{{\"error\": \"Serialization failed: {}\"}}", e)
                    });
                    (
                        ToolResultContent {
                            content_type: "text".to_string(),
                            text,
                        },
                        None,
                    )
                }
                Err(e) => {
                    error!(tool = %params.name, error = %e, "Tool call failed");
                    (
                        ToolResultContent {
                            content_type: "text".to_string(),
                            text: format!("Error: {}", e),
                        },
                        Some(true),
                    )
                }
            };

        let tool_result = ToolCallResult {
            content: vec![content],
            is_error,
        };

        match serde_json::to_value(tool_result) {
            Ok(val) => JsonRpcResponse::success(id, val),
            Err(e) => {
                error!(error = %e, "Failed to serialize tool call result");
                JsonRpcResponse::error(id, -32603, format!("Internal error: {}", e))
            }
        }
    }
}

/// Every tool the server advertises, in listing order.
pub fn tool_definitions() -> Vec<Tool> {
    vec![
        // Normalization
        get_normalize_tool(),
        get_conversion_stats_tool(),
        // Index queries
        get_search_tool(),
        get_find_by_belief_domain_tool(),
        get_find_by_emotion_tool(),
        get_find_by_style_tool(),
        get_training_scenario_tool(),
        get_model_tool(),
        get_index_stats_tool(),
        // Insights
        get_insights_tool(),
    ]
}

/// Get the normalization tool definition
fn get_normalize_tool() -> Tool {
    Tool {
        name: "patient_normalize".to_string(),
        description: "Normalize raw simulated-patient records into cognitive models and replace the indexed collection with the accepted ones.".to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "records": {
                    "type": "array",
                    "items": { "type": "object" },
                    "description": "Raw patient records (camelCase or snake_case keys)"
                },
                "strict": {
                    "type": "boolean",
                    "description": "Abort the whole batch on the first failure (default: server setting)"
                }
            },
            "required": ["records"],
            "additionalProperties": false
        }),
    }
}

/// Get the conversion statistics tool definition
fn get_conversion_stats_tool() -> Tool {
    Tool {
        name: "patient_conversion_stats".to_string(),
        description: "Report running normalization counters and averages.".to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "reset": {
                    "type": "boolean",
                    "description": "Reset the counters after reading them (default: false)"
                }
            },
            "additionalProperties": false
        }),
    }
}

/// Get the multi-criteria search tool definition
fn get_search_tool() -> Tool {
    let range = serde_json::json!({
        "type": "object",
        "properties": {
            "min": { "type": "number" },
            "max": { "type": "number" }
        },
        "required": ["min", "max"]
    });
    let strings = serde_json::json!({ "type": "array", "items": { "type": "string" } });

    Tool {
        name: "patient_search".to_string(),
        description: "Score and rank indexed models against weighted criteria. Results are sorted by score, ties by id.".to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "belief_domains": strings,
                "belief_categories": strings,
                "belief_strength_range": range,
                "emotion_types": strings,
                "emotion_intensity_range": range,
                "situation_themes": strings,
                "conversational_styles": strings,
                "diagnoses": strings,
                "age_range": {
                    "type": "object",
                    "properties": {
                        "min": { "type": "integer", "minimum": 0 },
                        "max": { "type": "integer", "minimum": 0 }
                    },
                    "required": ["min", "max"]
                },
                "gender": { "type": "string" },
                "max_results": {
                    "type": "integer",
                    "minimum": 1,
                    "description": "Maximum results (default: server setting)"
                },
                "match_all": {
                    "type": "boolean",
                    "description": "Require every criterion to match (default: false)"
                }
            },
            "additionalProperties": false
        }),
    }
}

/// Get the belief domain lookup tool definition
fn get_find_by_belief_domain_tool() -> Tool {
    Tool {
        name: "patient_find_by_belief_domain".to_string(),
        description: "List ids of models holding a core belief in the given domain.".to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "domain": {
                    "type": "string",
                    "description": "Belief domain, e.g. self, others, world, future"
                }
            },
            "required": ["domain"],
            "additionalProperties": false
        }),
    }
}

/// Get the emotion lookup tool definition
fn get_find_by_emotion_tool() -> Tool {
    Tool {
        name: "patient_find_by_emotion".to_string(),
        description: "List ids of models showing an emotion, optionally at or above an intensity.".to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "emotion": {
                    "type": "string",
                    "description": "Emotion label, e.g. sadness"
                },
                "min_intensity": {
                    "type": "number",
                    "minimum": 0,
                    "maximum": 10,
                    "description": "Minimum intensity (0-10)"
                }
            },
            "required": ["emotion"],
            "additionalProperties": false
        }),
    }
}

/// Get the style lookup tool definition
fn get_find_by_style_tool() -> Tool {
    Tool {
        name: "patient_find_by_style".to_string(),
        description: "List ids of models with the given conversational style or difficulty tag.".to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "style": {
                    "type": "string",
                    "description": "Style label, e.g. plain, upset, hostile, guarded"
                }
            },
            "required": ["style"],
            "additionalProperties": false
        }),
    }
}

/// Get the training scenario tool definition
fn get_training_scenario_tool() -> Tool {
    Tool {
        name: "patient_training_scenario".to_string(),
        description: "Select models suited to a training scenario by difficulty and clinical focus.".to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "difficulty": {
                    "type": "string",
                    "enum": ["beginner", "intermediate", "advanced"],
                    "description": "Trainee level"
                },
                "focus": {
                    "type": "string",
                    "enum": ["depression", "anxiety", "trauma", "general"],
                    "description": "Clinical focus"
                },
                "style_preference": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Styles to use instead of those implied by the difficulty"
                }
            },
            "required": ["difficulty", "focus"],
            "additionalProperties": false
        }),
    }
}

/// Get the model lookup tool definition
fn get_model_tool() -> Tool {
    Tool {
        name: "patient_get_model".to_string(),
        description: "Fetch one normalized cognitive model by id.".to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "id": {
                    "type": "string",
                    "description": "Model id"
                }
            },
            "required": ["id"],
            "additionalProperties": false
        }),
    }
}

/// Get the index statistics tool definition
fn get_index_stats_tool() -> Tool {
    Tool {
        name: "patient_index_stats".to_string(),
        description: "Report model count and distinct keys per secondary index.".to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {},
            "additionalProperties": false
        }),
    }
}

/// Get the dataset insights tool definition
fn get_insights_tool() -> Tool {
    Tool {
        name: "patient_insights".to_string(),
        description: "Aggregate statistics over the current collection: beliefs, emotions, communication, distortions, therapeutic guidance and dataset metrics.".to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "focus_areas": {
                    "type": "array",
                    "items": {
                        "type": "string",
                        "enum": ["beliefs", "emotions", "communication", "distortions", "therapeutic"]
                    },
                    "description": "Areas to compute (default: all)"
                }
            },
            "additionalProperties": false
        }),
    }
}
