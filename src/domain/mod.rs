//! Tool integrations exposed over the MCP protocol

pub mod tools;
