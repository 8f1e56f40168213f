// SPDX-FileCopyrightText: 2026 Flock Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! LLM conversation API contract.

use async_trait::async_trait;

use crate::error::FlockError;
use crate::types::{LlmResponse, Member};

/// Request/response RPC onto the LLM conversation service.
///
/// Implementations retry transient upstream failures (429/5xx, network)
/// internally with bounded backoff; an `Err` from any of these methods is a
/// hard failure and routes to the caller's ticket-level error handling.
#[async_trait]
pub trait ConversationService: Send + Sync {
    /// Creates a new conversation seeded with `opening_message` as an
    /// assistant turn, returning the opaque conversation handle.
    async fn create_conversation(
        &self,
        member: &Member,
        opening_message: &str,
    ) -> Result<String, FlockError>;

    /// Sends a user message into an existing conversation.
    async fn send_message(
        &self,
        conversation_id: &str,
        text: &str,
        church_id: i64,
        member: &Member,
    ) -> Result<LlmResponse, FlockError>;

    /// Feeds a tool execution result back into the conversation, yielding
    /// the follow-up response.
    async fn send_tool_output(
        &self,
        conversation_id: &str,
        call_id: &str,
        output: &serde_json::Value,
        member: &Member,
        church_id: i64,
    ) -> Result<LlmResponse, FlockError>;
}
