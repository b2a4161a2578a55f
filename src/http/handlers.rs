//! Axum HTTP handlers for the web server
//!
//! Provides the Model Context Protocol endpoint, its usage page and the health check.

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::domain::tools::SAVE_CONVERSATION;
use crate::errors::McpError;
use crate::mcp::rpc::{JsonRpcResponse, INTERNAL_ERROR, INVALID_REQUEST, PARSE_ERROR};
use crate::mcp::server::SERVER_NAME;
use crate::AppState;

pub const MCP_PATH: &str = "/mcp";
pub const HEALTH_PATH: &str = "/health";

#[derive(Debug, Serialize)]
pub struct EndpointMap {
    pub mcp: &'static str,
    pub health: &'static str,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub server: &'static str,
    pub version: &'static str,
    pub timestamp: String,
    pub uptime: f64,
    pub endpoints: EndpointMap,
}

#[derive(Debug, Serialize)]
pub struct ToolSummary {
    pub name: &'static str,
    pub description: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageResponse {
    pub message: String,
    pub note: &'static str,
    pub server: String,
    pub protocol: &'static str,
    pub available_tools: Vec<ToolSummary>,
    pub usage: &'static str,
    pub examples: Vec<&'static str>,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        server: SERVER_NAME,
        version: env!("CARGO_PKG_VERSION"),
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        uptime: state.started_at.elapsed().as_secs_f64(),
        endpoints: EndpointMap {
            mcp: MCP_PATH,
            health: HEALTH_PATH,
        },
    })
}

pub async fn usage() -> Json<UsageResponse> {
    Json(UsageResponse {
        message: format!("{SERVER_NAME} is running"),
        note: "Use POST requests for MCP protocol communication",
        server: format!("{SERVER_NAME} v{}", env!("CARGO_PKG_VERSION")),
        protocol: "JSON-RPC 2.0 over HTTP",
        available_tools: vec![ToolSummary {
            name: SAVE_CONVERSATION,
            description: "Save LLM conversations to aiarchives with shareable URLs",
        }],
        usage: "Ask your assistant to \"Save this conversation\"; it formats the chat as HTML and calls save_conversation",
        examples: vec![
            "Save this conversation",
            "Please save our chat to aiarchives",
            "Archive this conversation with a shareable link",
        ],
    })
}

pub async fn mcp_endpoint(State(state): State<AppState>, body: Bytes) -> Response {
    let payload: Value = match serde_json::from_slice(&body) {
        Ok(value) => value,
        Err(err) => {
            warn!(error = %err, "request body is not valid JSON");
            let response =
                JsonRpcResponse::failure(Value::Null, McpError::ParseError.to_json_rpc());
            return (status_for(&response), Json(response)).into_response();
        }
    };

    match state.dispatcher.dispatch(payload).await {
        Some(response) => (status_for(&response), Json(response)).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}

/// Coarse HTTP signal alongside the JSON-RPC `error` field.
pub fn status_for(response: &JsonRpcResponse) -> StatusCode {
    match response.error_code() {
        Some(PARSE_ERROR | INVALID_REQUEST) => StatusCode::BAD_REQUEST,
        Some(INTERNAL_ERROR) => StatusCode::INTERNAL_SERVER_ERROR,
        _ => StatusCode::OK,
    }
}
