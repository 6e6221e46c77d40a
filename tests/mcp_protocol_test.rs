//! Integration tests for MCP protocol handling
//!
//! Drives a server session line by line, the way the stdio loop does,
//! against in-memory state.

use std::sync::Arc;

use mcp_cognitive_models::config::Config;
use mcp_cognitive_models::server::{AppState, McpServer, SERVER_NAME};
use serde_json::{json, Value};

fn server() -> McpServer {
    McpServer::new(Arc::new(AppState::new(Config::default())))
}

async fn send(server: &McpServer, request: Value) -> Value {
    let response = server
        .process_line(&request.to_string())
        .await
        .expect("request should produce a response");
    serde_json::to_value(response).unwrap()
}

async fn call_tool(server: &McpServer, id: u64, name: &str, arguments: Value) -> Value {
    let response = send(
        server,
        json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": "tools/call",
            "params": { "name": name, "arguments": arguments }
        }),
    )
    .await;
    assert_valid_jsonrpc_response(&response);
    response
}

/// Parse the JSON body of a successful tool result.
fn tool_body(response: &Value) -> Value {
    assert!(
        response["result"].get("isError").is_none(),
        "tool failed: {}",
        response["result"]
    );
    let text = response["result"]["content"][0]["text"].as_str().unwrap();
    serde_json::from_str(text).unwrap()
}

/// Verify JSON-RPC 2.0 response structure
fn assert_valid_jsonrpc_response(response: &Value) {
    assert_eq!(response["jsonrpc"], "2.0", "Invalid JSON-RPC version");
    assert!(
        response.get("result").is_some() || response.get("error").is_some(),
        "Response must have result or error"
    );
}

fn record(id: &str, diagnosis: &str, style: &str) -> Value {
    json!({
        "id": id,
        "name": format!("Patient {}", id),
        "demographics": { "age": 31, "gender": "male" },
        "diagnosis": { "primary": diagnosis },
        "presentingIssues": ["low energy"],
        "coreBeliefs": [{ "belief": "I am worthless", "strength": 8 }],
        "automaticThoughts": ["I never get anything right"],
        "emotions": [{ "emotion": "sadness", "intensity": 6, "triggers": ["mistakes"] }],
        "copingStrategies": ["staying in bed"],
        "history": ["Bullied at school"],
        "conversationalStyle": { "style": style },
        "goals": ["get back to work"]
    })
}

async fn seeded() -> McpServer {
    let server = server();
    let response = call_tool(
        &server,
        1,
        "patient_normalize",
        json!({ "records": [
            record("calm", "Major Depressive Disorder", "plain"),
            record("angry", "Major Depressive Disorder", "upset"),
            { "id": "thin", "name": "Sparse" }
        ]}),
    )
    .await;

    let body = tool_body(&response);
    assert_eq!(body["accepted"].as_array().unwrap().len(), 2);
    assert_eq!(body["rejected"][0]["source_id"], "thin");
    server
}

#[tokio::test]
async fn test_initialize_and_list_tools() {
    let server = server();

    let response = send(
        &server,
        json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "initialize",
            "params": {
                "protocolVersion": "2024-11-05",
                "capabilities": {},
                "clientInfo": { "name": "test-client", "version": "1.0.0" }
            }
        }),
    )
    .await;
    assert_valid_jsonrpc_response(&response);
    assert_eq!(response["result"]["protocolVersion"], "2024-11-05");
    assert_eq!(response["result"]["serverInfo"]["name"], SERVER_NAME);
    assert!(response["result"]["capabilities"]["tools"].is_object());

    let initialized = server
        .process_line(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
        .await;
    assert!(initialized.is_none());

    let response = send(&server, json!({"jsonrpc": "2.0", "id": 2, "method": "tools/list"})).await;
    let tools = response["result"]["tools"].as_array().unwrap();
    assert_eq!(tools.len(), 10);
    assert!(tools
        .iter()
        .all(|t| t["inputSchema"]["type"] == "object" && t["description"].is_string()));
}

#[tokio::test]
async fn test_ping() {
    let response = send(&server(), json!({"jsonrpc": "2.0", "id": "p", "method": "ping"})).await;
    assert_eq!(response["id"], "p");
    assert!(response["result"].is_object());
}

#[tokio::test]
async fn test_malformed_line_is_parse_error() {
    let response = server().process_line("{not json").await.unwrap();
    let response = serde_json::to_value(response).unwrap();
    assert_eq!(response["error"]["code"], -32700);
    assert_eq!(response["id"], Value::Null);
}

#[tokio::test]
async fn test_invalid_tool_arguments() {
    let server = server();
    let response = call_tool(&server, 3, "patient_search", json!({"max_results": "lots"})).await;
    assert_eq!(response["result"]["isError"], true);

    let response = send(
        &server,
        json!({"jsonrpc": "2.0", "id": 4, "method": "tools/call", "params": {"arguments": {}}}),
    )
    .await;
    assert_eq!(response["error"]["code"], -32602);
}

#[tokio::test]
async fn test_training_scenario_session() {
    let server = seeded().await;

    let response = call_tool(
        &server,
        2,
        "patient_training_scenario",
        json!({ "difficulty": "beginner", "focus": "depression" }),
    )
    .await;
    let body = tool_body(&response);
    assert_eq!(body["total"], 1);
    assert_eq!(body["results"][0]["model_id"], "calm");

    let response = call_tool(
        &server,
        3,
        "patient_training_scenario",
        json!({
            "difficulty": "beginner",
            "focus": "depression",
            "style_preference": ["upset"]
        }),
    )
    .await;
    assert_eq!(tool_body(&response)["results"][0]["model_id"], "angry");

    let response = call_tool(&server, 4, "patient_find_by_style", json!({"style": "Upset"})).await;
    assert_eq!(tool_body(&response)["model_ids"], json!(["angry"]));

    let response = call_tool(&server, 5, "patient_get_model", json!({"id": "calm"})).await;
    let model = tool_body(&response);
    assert_eq!(model["id"], "calm");
    assert_eq!(model["name"], "Patient calm");
}

#[tokio::test]
async fn test_conversion_stats_reset() {
    let server = seeded().await;

    let stats = tool_body(&call_tool(&server, 2, "patient_conversion_stats", json!({"reset": true})).await);
    assert_eq!(stats["total_processed"], 3);
    assert_eq!(stats["successful"], 2);
    assert_eq!(stats["failed"], 1);

    let stats = tool_body(&call_tool(&server, 3, "patient_conversion_stats", json!({})).await);
    assert_eq!(stats["total_processed"], 0);
}

#[tokio::test]
async fn test_focused_insights_and_index_stats() {
    let server = seeded().await;

    let insights = tool_body(
        &call_tool(&server, 2, "patient_insights", json!({"focus_areas": ["beliefs"]})).await,
    );
    assert_eq!(insights["model_count"], 2);
    assert_eq!(insights["belief_distribution"]["most_common"][0]["frequency"], 2);
    assert_eq!(insights["emotional_patterns"]["by_emotion"], json!({}));

    let stats = tool_body(&call_tool(&server, 3, "patient_index_stats", json!({})).await);
    assert_eq!(stats["model_count"], 2);
    assert_eq!(stats["indices"]["diagnosis"], 1);
}

#[tokio::test]
async fn test_normalize_batch_with_loosely_typed_records() {
    let server = server();
    let response = call_tool(
        &server,
        1,
        "patient_normalize",
        json!({ "records": [
            record("good", "Major Depressive Disorder", "plain"),
            { "id": "loose", "demographics": { "age": "35" } },
            { "id": 42 },
            { "id": "fraction", "demographics": { "age": 35.5 } },
            { "id": "textual", "coreBeliefs": [{ "belief": "I am weak", "strength": "high" }] },
            { "id": "shape", "coreBeliefs": "none" }
        ]}),
    )
    .await;

    let body = tool_body(&response);
    assert_eq!(body["accepted"].as_array().unwrap().len(), 1);
    assert_eq!(body["accepted"][0]["model_id"], "good");
    let rejected: Vec<&str> = body["rejected"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["source_id"].as_str().unwrap())
        .collect();
    assert_eq!(rejected, vec!["loose", "42", "fraction", "textual", "shape"]);
    assert_eq!(body["index"]["model_count"], 1);

    let stats = tool_body(&call_tool(&server, 2, "patient_conversion_stats", json!({})).await);
    assert_eq!(stats["total_processed"], 6);
    assert_eq!(stats["failed"], 5);
}
