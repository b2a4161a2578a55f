//! The central Model Context Protocol engine
//!
//! Classifies each inbound envelope as notification or request, validates request shape,
//! routes by method name and shapes every outcome into a JSON-RPC response.

use std::{any::Any, panic::AssertUnwindSafe, sync::Arc};

use futures::FutureExt;
use rust_mcp_sdk::schema::{
    Implementation, InitializeResult, ListToolsResult, ServerCapabilities,
    ServerCapabilitiesTools,
};
use serde_json::Value;
use tracing::{error, info, warn};

use crate::archive_client::Archiver;
use crate::domain::tools::{build_tools_list, handle_tools_call};
use crate::errors::McpError;
use crate::mcp::rpc::{JsonRpcEnvelope, JsonRpcResponse};

pub const PROTOCOL_VERSION: &str = "2025-06-18";
pub const SERVER_NAME: &str = "AI Archives MCP Server";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum McpMethod {
    Initialize,
    ListTools,
    CallTool,
    Unknown(String),
}

impl McpMethod {
    pub fn from_name(name: &str) -> Self {
        match name {
            "initialize" => Self::Initialize,
            "tools/list" => Self::ListTools,
            "tools/call" => Self::CallTool,
            other => Self::Unknown(other.to_string()),
        }
    }
}

pub struct Dispatcher {
    archiver: Arc<dyn Archiver>,
    model_label: String,
}

impl Dispatcher {
    pub fn new(archiver: Arc<dyn Archiver>, model_label: impl Into<String>) -> Self {
        Self {
            archiver,
            model_label: model_label.into(),
        }
    }

    /// Handles one decoded payload. `None` means the message was a notification and no
    /// body must be sent back.
    pub async fn dispatch(&self, payload: Value) -> Option<JsonRpcResponse> {
        let Some(envelope) = JsonRpcEnvelope::from_value(payload) else {
            return Some(JsonRpcResponse::failure(
                Value::Null,
                McpError::InvalidRequest.to_json_rpc(),
            ));
        };

        if envelope.is_notification() {
            match envelope.method.as_deref() {
                Some(method) => acknowledge_notification(method),
                None => warn!(
                    method = %envelope.raw_method.unwrap_or_default(),
                    "ignoring notification with non-string method"
                ),
            }
            return None;
        }

        let id = envelope.response_id();
        if !envelope.has_required_fields() {
            warn!(id = %id, "rejecting request with missing required fields");
            return Some(JsonRpcResponse::failure(
                id,
                McpError::InvalidRequest.to_json_rpc(),
            ));
        }

        let method = envelope.method.as_deref().unwrap_or_default();
        let outcome = AssertUnwindSafe(self.handle_request(method, envelope.params.as_ref()))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| {
                let reason = panic_message(panic.as_ref());
                error!(method = %method, reason = %reason, "request handler panicked");
                Err(McpError::Internal(reason))
            });

        info!(
            method = %method,
            params = %summarize_audit_params(envelope.params.as_ref()),
            outcome = if outcome.is_err() { "failure" } else { "success" },
            "mcp action audited"
        );

        Some(match outcome {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(err) => JsonRpcResponse::failure(id, err.to_json_rpc()),
        })
    }

    async fn handle_request(&self, method: &str, params: Option<&Value>) -> Result<Value, McpError> {
        match McpMethod::from_name(method) {
            McpMethod::Initialize => Ok(serde_json::to_value(initialize_result())?),
            McpMethod::ListTools => {
                info!("listing available tools");
                Ok(serde_json::to_value(ListToolsResult {
                    meta: None,
                    next_cursor: None,
                    tools: build_tools_list(),
                })?)
            }
            McpMethod::CallTool => {
                handle_tools_call(self.archiver.as_ref(), &self.model_label, params).await
            }
            McpMethod::Unknown(method) => Err(McpError::MethodNotFound { method }),
        }
    }
}

pub fn initialize_result() -> InitializeResult {
    InitializeResult {
        server_info: Implementation {
            name: SERVER_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            title: None,
            description: None,
            icons: vec![],
            website_url: None,
        },
        capabilities: ServerCapabilities {
            tools: Some(ServerCapabilitiesTools { list_changed: None }),
            ..Default::default()
        },
        protocol_version: PROTOCOL_VERSION.to_string(),
        instructions: None,
        meta: None,
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    panic
        .downcast_ref::<&str>()
        .map(|message| message.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "request handler panicked".to_string())
}

fn acknowledge_notification(method: &str) {
    match method {
        "notifications/initialized" => info!("client finished MCP initialization"),
        "notifications/cancelled" => info!("client cancelled a pending request"),
        other => warn!(method = %other, "ignoring unknown notification"),
    }
}

pub fn summarize_audit_params(params: Option<&Value>) -> Value {
    params.map(summarize_audit_value).unwrap_or(Value::Null)
}

/// Replaces conversation bodies with their size so audit lines stay small.
fn summarize_audit_value(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, item)| match (key.as_str(), item) {
                    ("conversation", Value::String(text)) => {
                        (key.clone(), Value::String(format!("[{} bytes]", text.len())))
                    }
                    _ => (key.clone(), summarize_audit_value(item)),
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(summarize_audit_value).collect()),
        _ => value.clone(),
    }
}
