//! Model Context Protocol (MCP) server handling and JSON-RPC implementations
//!
//! Provides protocol-level specifics surrounding JSON-RPC envelope reading, request
//! validation, method routing and response formatting.

pub mod rpc;
pub mod server;
