//! JSON-RPC protocol representations and formatting utilities
//!
//! Ids are kept as raw JSON values so every response echoes the caller's id exactly,
//! whether it was a string, a number or `null`.

use serde::Serialize;
use serde_json::{Map, Value};

pub const JSONRPC_VERSION: &str = "2.0";

pub const PARSE_ERROR: i32 = -32700;
pub const INVALID_REQUEST: i32 = -32600;
pub const METHOD_NOT_FOUND: i32 = -32601;
pub const INVALID_PARAMS: i32 = -32602;
pub const INTERNAL_ERROR: i32 = -32603;

/// A decoded inbound message. Fields of the wrong JSON type are treated as absent.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonRpcEnvelope {
    pub jsonrpc: Option<String>,
    /// The `method` member exactly as sent, whatever its type.
    pub raw_method: Option<Value>,
    pub method: Option<String>,
    pub params: Option<Value>,
    /// `None` when the key is absent; `Some(Value::Null)` when it was sent as `null`.
    pub id: Option<Value>,
}

impl JsonRpcEnvelope {
    /// Returns `None` for payloads that are not JSON objects.
    pub fn from_value(payload: Value) -> Option<Self> {
        let Value::Object(mut object) = payload else {
            return None;
        };

        Some(Self::from_object(&mut object))
    }

    fn from_object(object: &mut Map<String, Value>) -> Self {
        let raw_method = object.remove("method");
        Self {
            jsonrpc: object
                .remove("jsonrpc")
                .and_then(|value| value.as_str().map(str::to_string)),
            method: raw_method
                .as_ref()
                .and_then(Value::as_str)
                .filter(|method| !method.is_empty())
                .map(str::to_string),
            raw_method,
            params: object.remove("params").filter(|params| !is_falsy(params)),
            id: object.remove("id"),
        }
    }

    /// No `id` and a truthy `method` of any type.
    pub fn is_notification(&self) -> bool {
        self.id.is_none() && self.raw_method.as_ref().is_some_and(|method| !is_falsy(method))
    }

    /// The id to echo back, `null` when none was supplied.
    pub fn response_id(&self) -> Value {
        self.id.clone().unwrap_or(Value::Null)
    }

    pub fn has_required_fields(&self) -> bool {
        self.method.is_some()
            && self.params.is_some()
            && self.jsonrpc.as_deref() == Some(JSONRPC_VERSION)
    }
}

/// Loose truthiness: `null`, `false`, `0` and `""` count as not supplied.
pub fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(flag) => !flag,
        Value::Number(number) => number.as_f64() == Some(0.0),
        Value::String(text) => text.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponsePayload {
    Result(Value),
    Error(JsonRpcError),
}

/// Carries exactly one of `result` or `error`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: &'static str,
    pub id: Value,
    #[serde(flatten)]
    pub payload: ResponsePayload,
}

impl JsonRpcResponse {
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            payload: ResponsePayload::Result(result),
        }
    }

    pub fn failure(id: Value, error: JsonRpcError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            payload: ResponsePayload::Error(error),
        }
    }

    pub fn error_code(&self) -> Option<i32> {
        match &self.payload {
            ResponsePayload::Error(error) => Some(error.code),
            ResponsePayload::Result(_) => None,
        }
    }
}
