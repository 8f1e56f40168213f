// SPDX-FileCopyrightText: 2026 Flock Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Handling of inbound Signal messages.
//!
//! Delivery from the bus is at-least-once; everything here tolerates
//! replays. A member only ever sees assistant text or one of the fixed
//! notices below; internal errors stay in the logs.

use std::sync::Arc;

use serde_json::json;
use tracing::{debug, error, info, warn};

use flock_core::types::{ChatEntry, ChatRole, InboundMessageEvent, Member};
use flock_core::{
    ChatHistoryStore, ConversationService, FlockError, MemberStore, NotificationChannel,
};
use flock_signal::normalize_phone_number;

use crate::dispatch::ToolDispatcher;

pub const NOT_REGISTERED_NOTICE: &str =
    "You are not registered yet. Please contact your church to get started.";
pub const NO_CONVERSATION_NOTICE: &str =
    "There is no active conversation for you right now. You will hear from us as soon as new content is ready.";
pub const GENERIC_ERROR_NOTICE: &str =
    "Something went wrong while processing your message. Please try again later.";

pub struct InboundHandler {
    members: Arc<dyn MemberStore>,
    history: Arc<dyn ChatHistoryStore>,
    llm: Arc<dyn ConversationService>,
    notifier: Arc<dyn NotificationChannel>,
    dispatcher: ToolDispatcher,
}

impl InboundHandler {
    pub fn new(
        members: Arc<dyn MemberStore>,
        history: Arc<dyn ChatHistoryStore>,
        llm: Arc<dyn ConversationService>,
        notifier: Arc<dyn NotificationChannel>,
        dispatcher: ToolDispatcher,
    ) -> Self {
        Self {
            members,
            history,
            llm,
            notifier,
            dispatcher,
        }
    }

    /// Handles one inbound message. Never fails outward: every error path
    /// ends in a fixed notice to the sender.
    pub async fn handle(&self, event: &InboundMessageEvent) {
        let phone = normalize_phone_number(&event.sender);
        debug!(phone, "inbound message");

        let mut member = match self.members.find_by_phone(&phone).await {
            Ok(Some(member)) => member,
            Ok(None) => {
                info!(phone, "message from unregistered sender");
                self.notify(&phone, NOT_REGISTERED_NOTICE).await;
                return;
            }
            Err(e) => {
                error!(phone, error = %e, "member lookup failed");
                self.notify(&phone, GENERIC_ERROR_NOTICE).await;
                return;
            }
        };

        let Some(conversation_id) = member.conversation_id.clone() else {
            info!(member_id = %member.id, "inbound message without an active conversation");
            self.notify(&phone, NO_CONVERSATION_NOTICE).await;
            return;
        };

        if let Err(e) = self
            .converse(&mut member, &conversation_id, &event.text)
            .await
        {
            error!(member_id = %member.id, error = %e, "inbound processing failed");
            self.notify(&phone, GENERIC_ERROR_NOTICE).await;
        }
    }

    async fn converse(
        &self,
        member: &mut Member,
        conversation_id: &str,
        text: &str,
    ) -> Result<(), FlockError> {
        let church_id = member.primary_church_id().unwrap_or(0);

        self.history
            .append(&ChatEntry::new(
                &member.id,
                conversation_id,
                ChatRole::User,
                text,
            ))
            .await?;

        let response = self
            .llm
            .send_message(conversation_id, text, church_id, member)
            .await?;
        let reply = self
            .dispatcher
            .dispatch(response, conversation_id, member, church_id)
            .await?;

        match reply {
            Some(reply) => {
                let outcome = self
                    .notifier
                    .send(
                        &member.phone_number,
                        &reply,
                        json!({ "conversation_id": conversation_id }),
                    )
                    .await;
                if !outcome.success {
                    warn!(
                        member_id = %member.id,
                        error = outcome.error.as_deref().unwrap_or("unknown"),
                        "reply delivery reported failure"
                    );
                }
                self.history
                    .append(&ChatEntry::new(
                        &member.id,
                        conversation_id,
                        ChatRole::Assistant,
                        &reply,
                    ))
                    .await?;
            }
            None => debug!(member_id = %member.id, "dispatcher produced no final text"),
        }

        member.touch_activity();
        self.members.save(member).await
    }

    async fn notify(&self, phone: &str, notice: &str) {
        let outcome = self.notifier.send(phone, notice, json!({})).await;
        if !outcome.success {
            warn!(
                phone,
                error = outcome.error.as_deref().unwrap_or("unknown"),
                "notice delivery reported failure"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flock_core::types::{LlmItem, LlmResponse, ToolCall};
    use flock_test_utils::{MemoryStore, MockContentService, MockLlm, MockNotifier};

    use crate::tools::ToolExecutor;

    struct Harness {
        store: MemoryStore,
        llm: Arc<MockLlm>,
        notifier: Arc<MockNotifier>,
        handler: InboundHandler,
    }

    fn harness(llm: MockLlm) -> Harness {
        let store = MemoryStore::new();
        let llm = Arc::new(llm);
        let notifier = Arc::new(MockNotifier::new());
        let content = Arc::new(MockContentService::new());
        let handler = InboundHandler::new(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            llm.clone(),
            notifier.clone(),
            ToolDispatcher::new(llm.clone(), ToolExecutor::new(content)),
        );
        Harness {
            store,
            llm,
            notifier,
            handler,
        }
    }

    fn event(sender: &str, text: &str) -> InboundMessageEvent {
        InboundMessageEvent {
            sender: sender.to_string(),
            recipient: "+31600000000".to_string(),
            text: text.to_string(),
            timestamp: None,
        }
    }

    async fn seed_member(store: &MemoryStore, with_conversation: bool) -> Member {
        let mut m = Member::new("+31612345678");
        m.intake_completed = true;
        m.church_ids = vec![5];
        if with_conversation {
            m.conversation_id = Some("conv-1".to_string());
            m.active_content_id = Some("sermon-1".to_string());
        }
        store.add_member(m.clone()).await;
        m
    }

    #[tokio::test]
    async fn unregistered_sender_gets_the_fixed_notice() {
        let h = harness(MockLlm::new());
        h.handler.handle(&event("+31699999999", "hello?")).await;

        let sent = h.notifier.sent().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].text, NOT_REGISTERED_NOTICE);
        assert!(h.llm.calls().await.is_empty());
    }

    #[tokio::test]
    async fn sender_phone_is_normalized_before_lookup() {
        let h = harness(MockLlm::with_responses(vec![MockLlm::text_response("hi!")]));
        seed_member(&h.store, true).await;

        // Same number, national format with formatting noise.
        h.handler.handle(&event("06 1234-5678", "hello")).await;
        assert_eq!(h.notifier.sent_texts().await, vec!["hi!".to_string()]);
    }

    #[tokio::test]
    async fn member_without_conversation_gets_the_fixed_notice() {
        let h = harness(MockLlm::new());
        seed_member(&h.store, false).await;

        h.handler.handle(&event("+31612345678", "anyone there?")).await;
        let sent = h.notifier.sent().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].text, NO_CONVERSATION_NOTICE);
        // Neither history nor tickets are touched.
        assert!(h.store.history().await.is_empty());
    }

    #[tokio::test]
    async fn reply_flows_through_the_conversation() {
        let h = harness(MockLlm::with_responses(vec![MockLlm::text_response(
            "Good question!",
        )]));
        let member = seed_member(&h.store, true).await;

        h.handler
            .handle(&event("+31612345678", "what was the sermon about?"))
            .await;

        assert_eq!(h.notifier.sent_texts().await, vec!["Good question!".to_string()]);
        let history = h.store.history().await;
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].role, ChatRole::User);
        assert_eq!(history[0].content, "what was the sermon about?");
        assert_eq!(history[1].role, ChatRole::Assistant);

        let saved = flock_core::MemberStore::find_by_id(&h.store, &member.id)
            .await
            .unwrap()
            .unwrap();
        assert!(saved.last_activity_at >= member.last_activity_at);
    }

    #[tokio::test]
    async fn tool_calls_in_the_reply_are_dispatched() {
        let tool_response = LlmResponse {
            id: None,
            items: vec![LlmItem::ToolCall(ToolCall {
                call_id: "call-1".into(),
                name: "manage_subscription".into(),
                arguments: r#"{"action":"pause","pause_until":"2026-10-01"}"#.into(),
            })],
        };
        let h = harness(MockLlm::with_responses(vec![
            tool_response,
            MockLlm::text_response("Paused. Enjoy the break!"),
        ]));
        let member = seed_member(&h.store, true).await;

        h.handler.handle(&event("+31612345678", "pause please")).await;
        assert_eq!(
            h.notifier.sent_texts().await,
            vec!["Paused. Enjoy the break!".to_string()]
        );
        // The tool's mutation was persisted along with the activity bump.
        let saved = flock_core::MemberStore::find_by_id(&h.store, &member.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(saved.paused_until.as_deref(), Some("2026-10-01"));
    }

    #[tokio::test]
    async fn llm_failure_ends_in_the_generic_notice() {
        let h = harness(MockLlm::new());
        seed_member(&h.store, true).await;
        h.llm.fail_next().await;

        h.handler.handle(&event("+31612345678", "hello")).await;
        let sent = h.notifier.sent().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].text, GENERIC_ERROR_NOTICE);
    }
}
