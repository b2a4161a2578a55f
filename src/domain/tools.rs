//! Tools exposed via Model Context Protocol
//!
//! Provides `save_conversation`, which validates the supplied conversation and hands it to
//! the configured [`Archiver`], wrapping the shareable URL in a text content block.

use rust_mcp_sdk::{
    macros,
    schema::{CallToolResult, ContentBlock, TextContent, Tool},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info};

use crate::{
    archive_client::Archiver,
    errors::{ArgumentError, McpError},
    mcp::rpc::is_falsy,
};

pub const SAVE_CONVERSATION: &str = "save_conversation";

#[macros::mcp_tool(
    name = "save_conversation",
    description = "Saves your entire LLM conversation to aiarchives and returns a shareable URL. Provide the full conversation content as HTML in the conversation parameter. Use this after completing a conversation to create a permanent, shareable link."
)]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, macros::JsonSchema)]
pub struct SaveConversationTool {
    /// Complete conversation content formatted as HTML with all messages and proper structure
    pub conversation: String,
}

impl SaveConversationTool {
    pub fn from_arguments(arguments: Option<&Value>) -> Result<Self, ArgumentError> {
        let conversation = arguments
            .and_then(|arguments| arguments.get("conversation"))
            .filter(|value| !is_falsy(value))
            .ok_or(ArgumentError::MissingConversation)?;

        match conversation.as_str() {
            Some(text) if !text.trim().is_empty() => Ok(Self {
                conversation: text.to_string(),
            }),
            _ => Err(ArgumentError::InvalidConversation),
        }
    }
}

/// A tool invocation whose arguments have already been validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolCall {
    SaveConversation(SaveConversationTool),
}

impl ToolCall {
    pub fn parse(name: &str, arguments: Option<&Value>) -> Result<Self, McpError> {
        match name {
            SAVE_CONVERSATION => Ok(Self::SaveConversation(
                SaveConversationTool::from_arguments(arguments)?,
            )),
            _ => Err(McpError::UnknownTool {
                name: name.to_string(),
                available: available_tool_names(),
            }),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::SaveConversation(_) => SAVE_CONVERSATION,
        }
    }
}

pub fn build_tools_list() -> Vec<Tool> {
    vec![SaveConversationTool::tool()]
}

fn available_tool_names() -> String {
    build_tools_list()
        .into_iter()
        .map(|tool| tool.name)
        .collect::<Vec<_>>()
        .join(", ")
}

pub async fn handle_tools_call(
    archiver: &dyn Archiver,
    model_label: &str,
    params: Option<&Value>,
) -> Result<Value, McpError> {
    let name = params
        .and_then(|params| params.get("name"))
        .and_then(Value::as_str)
        .filter(|name| !name.is_empty())
        .ok_or(McpError::MissingToolName)?;

    let call = ToolCall::parse(name, params.and_then(|params| params.get("arguments")))?;
    info!(tool = call.name(), "calling tool");

    let result = match call {
        ToolCall::SaveConversation(args) => {
            save_conversation(archiver, model_label, &args.conversation).await?
        }
    };

    Ok(serde_json::to_value(result)?)
}

async fn save_conversation(
    archiver: &dyn Archiver,
    model_label: &str,
    conversation: &str,
) -> Result<CallToolResult, McpError> {
    let receipt = archiver
        .archive(conversation, model_label)
        .await
        .map_err(|err| {
            error!(error = %err, "save_conversation failed");
            McpError::ArchiveFailed(err)
        })?;

    info!(url = %receipt.url, "conversation archived");

    Ok(CallToolResult {
        content: vec![ContentBlock::from(TextContent::new(
            success_message(&receipt.url),
            None,
            None,
        ))],
        is_error: None,
        meta: None,
        structured_content: None,
    })
}

fn success_message(url: &str) -> String {
    format!(
        "Conversation saved successfully to aiarchives!\nShareable URL: {url}\nHTML content processed and archived"
    )
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn validate(arguments: Value) -> Result<SaveConversationTool, ArgumentError> {
        SaveConversationTool::from_arguments(Some(&arguments))
    }

    #[test]
    fn accepts_html_conversation_untrimmed() {
        let args = validate(json!({ "conversation": "  <p>hi</p>\n" })).expect("valid args");
        assert_eq!(args.conversation, "  <p>hi</p>\n");
    }

    #[test]
    fn missing_or_falsy_conversation_is_reported_as_missing() {
        for arguments in [
            json!({}),
            json!({ "conversation": null }),
            json!({ "conversation": "" }),
            json!({ "conversation": false }),
            json!({ "conversation": 0 }),
        ] {
            let error = validate(arguments.clone()).expect_err("expected missing conversation");
            assert!(
                matches!(error, ArgumentError::MissingConversation),
                "unexpected error for {arguments}"
            );
        }

        let error = SaveConversationTool::from_arguments(None).expect_err("no arguments");
        assert!(matches!(error, ArgumentError::MissingConversation));
    }

    #[test]
    fn whitespace_or_non_string_conversation_is_invalid() {
        for arguments in [
            json!({ "conversation": "   \n\t" }),
            json!({ "conversation": 42 }),
            json!({ "conversation": ["<p>hi</p>"] }),
            json!({ "conversation": { "html": "<p>hi</p>" } }),
        ] {
            let error = validate(arguments.clone()).expect_err("expected invalid conversation");
            assert!(
                matches!(error, ArgumentError::InvalidConversation),
                "unexpected error for {arguments}"
            );
        }
    }

    #[test]
    fn unknown_tool_names_available_tools() {
        let error = ToolCall::parse("delete_conversation", None).expect_err("unknown tool");
        assert_eq!(
            error.to_string(),
            "Unknown tool: delete_conversation. Available tools: save_conversation"
        );
        assert_eq!(error.code(), -32601);
    }

    #[test]
    fn tool_descriptor_requires_string_conversation() {
        let tools = build_tools_list();
        assert_eq!(tools.len(), 1);

        let descriptor = serde_json::to_value(&tools[0]).expect("tool serialization");
        assert_eq!(descriptor["name"], SAVE_CONVERSATION);
        assert!(descriptor["description"]
            .as_str()
            .is_some_and(|description| !description.is_empty()));
        assert_eq!(descriptor["inputSchema"]["type"], "object");
        assert_eq!(
            descriptor["inputSchema"]["properties"]["conversation"]["type"],
            "string"
        );
        assert_eq!(descriptor["inputSchema"]["required"], json!(["conversation"]));
    }

    #[test]
    fn success_message_contains_url() {
        let message = success_message("https://aiarchives.example/c/1");
        assert!(message.contains("https://aiarchives.example/c/1"));
    }
}
