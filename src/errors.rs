use serde_json::{json, Value};
use thiserror::Error;

use crate::{
    archive_client::ArchiveError,
    mcp::rpc::{
        JsonRpcError, INTERNAL_ERROR, INVALID_PARAMS, INVALID_REQUEST, METHOD_NOT_FOUND,
        PARSE_ERROR,
    },
};

#[derive(Debug, Error)]
pub enum ArgumentError {
    #[error("Invalid Params: no conversation (HTML string) provided")]
    MissingConversation,
    #[error("Invalid Params: conversation must be a non-empty string")]
    InvalidConversation,
}

impl ArgumentError {
    fn code(&self) -> &'static str {
        match self {
            Self::MissingConversation => "missing_conversation",
            Self::InvalidConversation => "invalid_conversation",
        }
    }
}

#[derive(Debug, Error)]
pub enum McpError {
    #[error("Parse error")]
    ParseError,
    #[error("Invalid Request")]
    InvalidRequest,
    #[error("Method not found: {method}. Available methods: initialize, tools/list, tools/call")]
    MethodNotFound { method: String },
    #[error("Invalid parameters - tools/call request missing tool name")]
    MissingToolName,
    #[error("Unknown tool: {name}. Available tools: {available}")]
    UnknownTool { name: String, available: String },
    #[error(transparent)]
    InvalidArguments(#[from] ArgumentError),
    #[error("Failed to save conversation to aiarchives: {0}")]
    ArchiveFailed(#[from] ArchiveError),
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for McpError {
    fn from(err: serde_json::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl McpError {
    pub fn code(&self) -> i32 {
        match self {
            Self::ParseError => PARSE_ERROR,
            Self::InvalidRequest => INVALID_REQUEST,
            Self::MethodNotFound { .. } | Self::UnknownTool { .. } => METHOD_NOT_FOUND,
            Self::MissingToolName | Self::InvalidArguments(_) => INVALID_PARAMS,
            Self::ArchiveFailed(_) | Self::Internal(_) => INTERNAL_ERROR,
        }
    }

    fn data(&self) -> Option<Value> {
        match self {
            Self::InvalidRequest => Some(Value::String(
                "Missing required fields: method, params, or jsonrpc".to_string(),
            )),
            Self::MethodNotFound { method } => Some(json!({
                "code": "method_not_found",
                "details": { "method": method },
            })),
            Self::UnknownTool { name, available } => Some(json!({
                "code": "tool_not_found",
                "details": { "name": name, "available": available },
            })),
            Self::MissingToolName => Some(json!({
                "code": "missing_tool_name",
                "details": {},
            })),
            Self::InvalidArguments(err) => Some(json!({
                "code": err.code(),
                "details": { "argument": "conversation" },
            })),
            Self::ParseError | Self::ArchiveFailed(_) | Self::Internal(_) => None,
        }
    }

    pub fn to_json_rpc(&self) -> JsonRpcError {
        JsonRpcError {
            code: self.code(),
            message: self.to_string(),
            data: self.data(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_not_found_lists_supported_methods() {
        let error = McpError::MethodNotFound {
            method: "resources/list".to_string(),
        }
        .to_json_rpc();

        assert_eq!(error.code, -32601);
        assert_eq!(
            error.message,
            "Method not found: resources/list. Available methods: initialize, tools/list, tools/call"
        );
    }

    #[test]
    fn invalid_request_carries_missing_fields_hint() {
        let error = McpError::InvalidRequest.to_json_rpc();

        assert_eq!(error.code, -32600);
        assert_eq!(error.message, "Invalid Request");
        assert_eq!(
            error.data,
            Some(Value::String(
                "Missing required fields: method, params, or jsonrpc".to_string()
            ))
        );
    }

    #[test]
    fn archive_failure_embeds_underlying_reason() {
        let error = McpError::from(ArchiveError::Status {
            status: 503,
            body: "maintenance".to_string(),
        })
        .to_json_rpc();

        assert_eq!(error.code, -32603);
        assert_eq!(
            error.message,
            "Failed to save conversation to aiarchives: API request failed: 503 maintenance"
        );
        assert!(error.data.is_none());
    }

    #[test]
    fn argument_errors_are_invalid_params() {
        let error = McpError::from(ArgumentError::InvalidConversation).to_json_rpc();

        assert_eq!(error.code, -32602);
        assert_eq!(error.data.expect("data")["code"], "invalid_conversation");
    }

    #[test]
    fn serialization_failures_are_internal_errors() {
        let err = serde_json::from_str::<Value>("{").expect_err("invalid json");
        let error = McpError::from(err).to_json_rpc();

        assert_eq!(error.code, -32603);
        assert!(error.message.starts_with("Internal server error: "));
    }
}
