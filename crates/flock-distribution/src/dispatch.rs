// SPDX-FileCopyrightText: 2026 Flock Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tool-call dispatch loop.
//!
//! Tool calls are executed strictly sequentially in response order. Each
//! result is fed back into the conversation, and any tool calls in the
//! follow-up response are handled depth-first before the next sibling call.
//! The recursion is driven by an explicit work stack with a hard depth
//! bound, so a model that keeps requesting tools cannot wedge a ticket.

use std::collections::VecDeque;
use std::sync::Arc;

use tracing::{debug, warn};

use flock_core::types::{LlmResponse, Member, ToolCall};
use flock_core::{ConversationService, FlockError};

use crate::tools::ToolExecutor;

/// Follow-up responses deeper than this stop descending; pending calls at
/// the cut-off are dropped and the loop unwinds.
pub const MAX_TOOL_DEPTH: usize = 8;

/// Runs tool calls from an LLM response to completion.
pub struct ToolDispatcher {
    llm: Arc<dyn ConversationService>,
    executor: ToolExecutor,
}

impl ToolDispatcher {
    pub fn new(llm: Arc<dyn ConversationService>, executor: ToolExecutor) -> Self {
        Self { llm, executor }
    }

    /// Drives `response` until a response with zero tool calls arrives, and
    /// returns that response's text. A response that never produces a final
    /// message yields `None`.
    pub async fn dispatch(
        &self,
        response: LlmResponse,
        conversation_id: &str,
        member: &mut Member,
        church_id: i64,
    ) -> Result<Option<String>, FlockError> {
        let calls = response.tool_calls();
        if calls.is_empty() {
            return Ok(response.text().map(str::to_string));
        }

        let mut final_text = None;
        let mut stack: Vec<VecDeque<ToolCall>> = vec![VecDeque::from(calls)];

        while let Some(frame) = stack.last_mut() {
            let Some(call) = frame.pop_front() else {
                stack.pop();
                continue;
            };

            debug!(tool = %call.name, call_id = %call.call_id, depth = stack.len(), "executing tool call");
            let outcome = self.executor.run(&call.name, &call.arguments, member).await;
            let output = serde_json::to_value(&outcome)
                .map_err(|e| FlockError::Internal(format!("tool outcome encoding: {e}")))?;

            let next = self
                .llm
                .send_tool_output(conversation_id, &call.call_id, &output, member, church_id)
                .await?;
            let next_calls = next.tool_calls();
            if next_calls.is_empty() {
                if let Some(text) = next.text() {
                    final_text = Some(text.to_string());
                }
            } else if stack.len() >= MAX_TOOL_DEPTH {
                warn!(
                    conversation_id,
                    depth = stack.len(),
                    "tool-call depth bound reached, dropping further calls"
                );
            } else {
                stack.push(VecDeque::from(next_calls));
            }
        }

        Ok(final_text)
    }
}
