// SPDX-FileCopyrightText: 2026 Flock Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wire types for the OpenAI Conversations and Responses endpoints.

use serde::{Deserialize, Serialize};

use flock_core::types::{LlmItem, LlmResponse, ToolCall};

/// Request body for `POST /conversations`.
#[derive(Debug, Clone, Serialize)]
pub struct ConversationRequest {
    pub metadata: ConversationMetadata,
    pub items: Vec<ConversationItem>,
}

/// Conversation metadata; `topic` carries the member's phone number so
/// conversations are traceable upstream.
#[derive(Debug, Clone, Serialize)]
pub struct ConversationMetadata {
    pub topic: String,
}

/// A seed item for a freshly created conversation.
#[derive(Debug, Clone, Serialize)]
pub struct ConversationItem {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub role: &'static str,
    pub content: String,
}

impl ConversationItem {
    /// An assistant-authored seed message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            kind: "message",
            role: "assistant",
            content: content.into(),
        }
    }
}

/// Response body for `POST /conversations`.
#[derive(Debug, Clone, Deserialize)]
pub struct ConversationCreated {
    pub id: String,
}

/// Request body for `POST /responses`.
#[derive(Debug, Clone, Serialize)]
pub struct ResponsesRequest {
    pub model: String,
    pub conversation: String,
    pub store: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    pub input: Vec<InputItem>,
    pub tools: Vec<serde_json::Value>,
    pub tool_choice: &'static str,
}

/// One input item: either a user message or a tool execution result.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum InputItem {
    UserMessage {
        role: &'static str,
        content: Vec<InputContent>,
    },
    FunctionCallOutput {
        #[serde(rename = "type")]
        kind: &'static str,
        call_id: String,
        /// JSON-encoded tool outcome.
        output: String,
    },
}

impl InputItem {
    pub fn user_text(text: impl Into<String>) -> Self {
        InputItem::UserMessage {
            role: "user",
            content: vec![InputContent {
                kind: "input_text",
                text: text.into(),
            }],
        }
    }

    pub fn function_call_output(call_id: impl Into<String>, output: String) -> Self {
        InputItem::FunctionCallOutput {
            kind: "function_call_output",
            call_id: call_id.into(),
            output,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct InputContent {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub text: String,
}

/// Raw response body for `POST /responses`.
#[derive(Debug, Clone, Deserialize)]
pub struct ResponsesApiResponse {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub output: Vec<RawOutputItem>,
}

/// One raw output item. The API is additive; unknown item kinds and extra
/// fields are tolerated and skipped during normalization.
#[derive(Debug, Clone, Deserialize)]
pub struct RawOutputItem {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub content: Option<Vec<RawContentPart>>,
    #[serde(default)]
    pub call_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub arguments: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawContentPart {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub text: Option<String>,
}

impl ResponsesApiResponse {
    /// Normalize into the domain response: completed messages become text
    /// items (first `output_text` part), completed function calls become
    /// tool-call items. Everything else is dropped.
    pub fn normalize(self) -> LlmResponse {
        let mut items = Vec::new();
        for output in self.output {
            if output.status.as_deref() != Some("completed") {
                continue;
            }
            match output.kind.as_str() {
                "message" => {
                    let text = output.content.iter().flatten().find_map(|part| {
                        if part.kind == "output_text" {
                            part.text.clone()
                        } else {
                            None
                        }
                    });
                    if let Some(text) = text {
                        items.push(LlmItem::Message { text });
                    }
                }
                "function_call" => {
                    if let (Some(call_id), Some(name)) = (output.call_id, output.name) {
                        items.push(LlmItem::ToolCall(ToolCall {
                            call_id,
                            name,
                            arguments: output.arguments.unwrap_or_else(|| "{}".to_string()),
                        }));
                    }
                }
                _ => {}
            }
        }
        LlmResponse {
            id: self.id,
            items,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_extracts_messages_and_tool_calls_in_order() {
        let raw: ResponsesApiResponse = serde_json::from_value(serde_json::json!({
            "id": "resp_1",
            "output": [
                {
                    "type": "function_call",
                    "status": "completed",
                    "id": "fc_1",
                    "call_id": "call_1",
                    "name": "manage_user",
                    "arguments": "{\"name\":\"Renko\"}"
                },
                {
                    "type": "message",
                    "status": "completed",
                    "content": [
                        {"type": "reasoning", "text": "ignored"},
                        {"type": "output_text", "text": "Hello Renko!"}
                    ]
                }
            ]
        }))
        .unwrap();

        let response = raw.normalize();
        assert_eq!(response.id.as_deref(), Some("resp_1"));
        assert_eq!(response.items.len(), 2);
        let calls = response.tool_calls();
        assert_eq!(calls[0].name, "manage_user");
        assert_eq!(calls[0].arguments, "{\"name\":\"Renko\"}");
        assert_eq!(response.text(), Some("Hello Renko!"));
    }

    #[test]
    fn normalize_skips_incomplete_and_unknown_items() {
        let raw: ResponsesApiResponse = serde_json::from_value(serde_json::json!({
            "output": [
                {"type": "message", "status": "in_progress",
                 "content": [{"type": "output_text", "text": "partial"}]},
                {"type": "function_call", "status": "completed", "name": "orphan"},
                {"type": "reasoning", "status": "completed"},
                {"type": "message", "status": "completed",
                 "content": [{"type": "output_text", "text": "done"}]}
            ]
        }))
        .unwrap();

        let response = raw.normalize();
        assert_eq!(response.items.len(), 1);
        assert_eq!(response.text(), Some("done"));
    }

    #[test]
    fn normalize_defaults_missing_arguments_to_empty_object() {
        let raw: ResponsesApiResponse = serde_json::from_value(serde_json::json!({
            "output": [
                {"type": "function_call", "status": "completed",
                 "call_id": "call_2", "name": "handle_sermon"}
            ]
        }))
        .unwrap();

        let calls = raw.normalize().tool_calls();
        assert_eq!(calls[0].arguments, "{}");
    }

    #[test]
    fn input_items_serialize_to_wire_shapes() {
        let user = serde_json::to_value(InputItem::user_text("hi")).unwrap();
        assert_eq!(
            user,
            serde_json::json!({
                "role": "user",
                "content": [{"type": "input_text", "text": "hi"}]
            })
        );

        let output =
            serde_json::to_value(InputItem::function_call_output("call_1", "{\"success\":true}".to_string()))
                .unwrap();
        assert_eq!(
            output,
            serde_json::json!({
                "type": "function_call_output",
                "call_id": "call_1",
                "output": "{\"success\":true}"
            })
        );
    }
}
