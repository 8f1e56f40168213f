// SPDX-FileCopyrightText: 2026 Flock Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock conversation service for deterministic testing.
//!
//! `MockLlm` implements `ConversationService` with pre-configured responses,
//! enabling fast, CI-runnable tests without external API calls.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use flock_core::types::{LlmItem, LlmResponse, Member};
use flock_core::{ConversationService, FlockError};

/// One recorded call into the mock.
#[derive(Debug, Clone, PartialEq)]
pub enum LlmCall {
    CreateConversation {
        member_id: String,
        opening_message: String,
    },
    SendMessage {
        conversation_id: String,
        text: String,
        church_id: i64,
    },
    ToolOutput {
        conversation_id: String,
        call_id: String,
        output: serde_json::Value,
    },
}

/// A mock conversation service that returns pre-configured responses.
///
/// Responses are popped from a FIFO queue by `send_message` and
/// `send_tool_output`. When the queue is empty, a default one-message
/// response is returned. All calls are recorded for assertion.
pub struct MockLlm {
    responses: Arc<Mutex<VecDeque<LlmResponse>>>,
    calls: Arc<Mutex<Vec<LlmCall>>>,
    fail_next: Arc<Mutex<bool>>,
}

impl MockLlm {
    /// Create a new mock with an empty response queue.
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
            fail_next: Arc::new(Mutex::new(false)),
        }
    }

    /// Create a mock pre-loaded with the given responses.
    pub fn with_responses(responses: Vec<LlmResponse>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::from(responses))),
            calls: Arc::new(Mutex::new(Vec::new())),
            fail_next: Arc::new(Mutex::new(false)),
        }
    }

    /// Add a response to the end of the queue.
    pub async fn add_response(&self, response: LlmResponse) {
        self.responses.lock().await.push_back(response);
    }

    /// Make the next call return a provider error.
    pub async fn fail_next(&self) {
        *self.fail_next.lock().await = true;
    }

    /// All recorded calls, in order.
    pub async fn calls(&self) -> Vec<LlmCall> {
        self.calls.lock().await.clone()
    }

    /// Build a plain one-message response.
    pub fn text_response(text: &str) -> LlmResponse {
        LlmResponse {
            id: Some(format!("mock-resp-{}", uuid::Uuid::new_v4())),
            items: vec![LlmItem::Message {
                text: text.to_string(),
            }],
        }
    }

    async fn take_failure(&self) -> Result<(), FlockError> {
        let mut flag = self.fail_next.lock().await;
        if *flag {
            *flag = false;
            return Err(FlockError::provider("mock failure"));
        }
        Ok(())
    }

    async fn next_response(&self) -> LlmResponse {
        self.responses
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Self::text_response("mock response"))
    }
}

impl Default for MockLlm {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConversationService for MockLlm {
    async fn create_conversation(
        &self,
        member: &Member,
        opening_message: &str,
    ) -> Result<String, FlockError> {
        self.take_failure().await?;
        self.calls.lock().await.push(LlmCall::CreateConversation {
            member_id: member.id.clone(),
            opening_message: opening_message.to_string(),
        });
        Ok(format!("mock-conv-{}", uuid::Uuid::new_v4()))
    }

    async fn send_message(
        &self,
        conversation_id: &str,
        text: &str,
        church_id: i64,
        _member: &Member,
    ) -> Result<LlmResponse, FlockError> {
        self.take_failure().await?;
        self.calls.lock().await.push(LlmCall::SendMessage {
            conversation_id: conversation_id.to_string(),
            text: text.to_string(),
            church_id,
        });
        Ok(self.next_response().await)
    }

    async fn send_tool_output(
        &self,
        conversation_id: &str,
        call_id: &str,
        output: &serde_json::Value,
        _member: &Member,
        _church_id: i64,
    ) -> Result<LlmResponse, FlockError> {
        self.take_failure().await?;
        self.calls.lock().await.push(LlmCall::ToolOutput {
            conversation_id: conversation_id.to_string(),
            call_id: call_id.to_string(),
            output: output.clone(),
        });
        Ok(self.next_response().await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn queued_responses_returned_in_order() {
        let llm = MockLlm::with_responses(vec![
            MockLlm::text_response("first"),
            MockLlm::text_response("second"),
        ]);
        let member = Member::new("+31612345678");

        let first = llm.send_message("conv-1", "hi", 1, &member).await.unwrap();
        assert_eq!(first.text(), Some("first"));
        let second = llm.send_message("conv-1", "hi", 1, &member).await.unwrap();
        assert_eq!(second.text(), Some("second"));
        // Queue exhausted, falls back to default.
        let third = llm.send_message("conv-1", "hi", 1, &member).await.unwrap();
        assert_eq!(third.text(), Some("mock response"));
    }

    #[tokio::test]
    async fn calls_are_recorded() {
        let llm = MockLlm::new();
        let member = Member::new("+31612345678");

        let conv = llm.create_conversation(&member, "welcome").await.unwrap();
        assert!(conv.starts_with("mock-conv-"));
        llm.send_message("conv-1", "hello", 3, &member).await.unwrap();

        let calls = llm.calls().await;
        assert_eq!(calls.len(), 2);
        assert_eq!(
            calls[0],
            LlmCall::CreateConversation {
                member_id: member.id.clone(),
                opening_message: "welcome".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn fail_next_errors_once() {
        let llm = MockLlm::new();
        let member = Member::new("+31612345678");

        llm.fail_next().await;
        assert!(llm.send_message("c", "x", 1, &member).await.is_err());
        assert!(llm.send_message("c", "x", 1, &member).await.is_ok());
    }
}
