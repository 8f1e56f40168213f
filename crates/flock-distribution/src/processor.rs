// SPDX-FileCopyrightText: 2026 Flock Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Queue processing: turning queued tickets into delivered messages.
//!
//! A batch drains up to `limit` queued tickets oldest-first. Each ticket is
//! handed out exactly once; with `workers > 1` tickets run concurrently via
//! `buffer_unordered`, at the cost of strict ordering. Errors are confined
//! to their ticket: the failure transition records them and the batch moves
//! on.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use serde_json::json;
use tracing::{debug, error, info, warn};

use flock_core::types::{ChatEntry, ChatRole, ContentMeta, Ticket, TicketStatus};
use flock_core::{
    ChatHistoryStore, ContentService, ConversationService, FlockError, MemberStore,
    NotificationChannel, TicketStore,
};

use crate::dispatch::ToolDispatcher;
use crate::session::SessionManager;

/// How a ticket left the processing pass.
enum Fate {
    Sent,
    /// Parked in `Waiting` by the use-time multi-church check.
    Held,
}

pub struct QueueProcessor {
    members: Arc<dyn MemberStore>,
    tickets: Arc<dyn TicketStore>,
    history: Arc<dyn ChatHistoryStore>,
    llm: Arc<dyn ConversationService>,
    notifier: Arc<dyn NotificationChannel>,
    content: Arc<dyn ContentService>,
    sessions: SessionManager,
    dispatcher: ToolDispatcher,
    workers: usize,
}

impl QueueProcessor {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        members: Arc<dyn MemberStore>,
        tickets: Arc<dyn TicketStore>,
        history: Arc<dyn ChatHistoryStore>,
        llm: Arc<dyn ConversationService>,
        notifier: Arc<dyn NotificationChannel>,
        content: Arc<dyn ContentService>,
        sessions: SessionManager,
        dispatcher: ToolDispatcher,
        workers: usize,
    ) -> Self {
        Self {
            members,
            tickets,
            history,
            llm,
            notifier,
            content,
            sessions,
            dispatcher,
            workers: workers.max(1),
        }
    }

    /// Processes one batch of queued tickets.
    ///
    /// Returns the number of tickets that reached `Sent`. Tickets parked in
    /// `Waiting` or routed through the failure transition were drained from
    /// the queue but are not counted as processed.
    pub async fn process_queue(&self, limit: usize) -> Result<usize, FlockError> {
        let batch = self
            .tickets
            .find_by_status(TicketStatus::Queued, limit)
            .await?;
        if batch.is_empty() {
            return Ok(0);
        }
        debug!(batch = batch.len(), workers = self.workers, "processing queue");

        let sent = stream::iter(batch)
            .map(|ticket| self.process_ticket(ticket))
            .buffer_unordered(self.workers)
            .filter(|sent| futures::future::ready(*sent))
            .count()
            .await;
        info!(sent, "queue batch complete");
        Ok(sent)
    }

    /// Runs one ticket to a terminal outcome for this pass. Errors feed the
    /// ticket's failure transition; they never escape the batch.
    async fn process_ticket(&self, mut ticket: Ticket) -> bool {
        match self.deliver(&mut ticket).await {
            Ok(Fate::Sent) => true,
            Ok(Fate::Held) => false,
            Err(e) => {
                let status = ticket.record_failure(e.to_string());
                warn!(
                    ticket_id = %ticket.id,
                    member_id = %ticket.member_id,
                    error = %e,
                    retry_count = ticket.retry_count,
                    requeued = status == TicketStatus::Queued,
                    "ticket processing failed"
                );
                if let Err(e) = self.tickets.save(&ticket).await {
                    error!(ticket_id = %ticket.id, error = %e, "failed to persist ticket failure");
                }
                false
            }
        }
    }

    async fn deliver(&self, ticket: &mut Ticket) -> Result<Fate, FlockError> {
        let mut member = self
            .members
            .find_by_id(&ticket.member_id)
            .await?
            .ok_or_else(|| FlockError::NotFound {
                entity: "member",
                id: ticket.member_id.clone(),
            })?;

        // Membership at use time is authoritative: a member who joined a
        // second church since fan-out goes on hold here.
        if member.has_multiple_churches() {
            ticket.mark_waiting();
            self.tickets.save(ticket).await?;
            debug!(ticket_id = %ticket.id, "member joined multiple churches, holding ticket");
            return Ok(Fate::Held);
        }

        let template = content_message(&ticket.meta);
        let message = match self
            .content
            .content_details(&ticket.content_id, ticket.meta.summary_audience.as_deref())
            .await
        {
            Ok(Some(rich)) => rich,
            Ok(None) => template.clone(),
            Err(e) => {
                warn!(content_id = %ticket.content_id, error = %e, "content lookup failed, using template");
                template.clone()
            }
        };

        let (conversation_id, created) = self
            .sessions
            .ensure_conversation(&mut member, &ticket.content_id, &message)
            .await?;

        // A fresh conversation was seeded with the content message, so that
        // is what the member receives. A reused one gets the message routed
        // through the assistant first.
        let delivered = if created {
            message.clone()
        } else {
            let response = self
                .llm
                .send_message(&conversation_id, &message, ticket.church_id, &member)
                .await?;
            let reply = self
                .dispatcher
                .dispatch(response, &conversation_id, &mut member, ticket.church_id)
                .await?;
            reply.unwrap_or(message)
        };

        let outcome = self
            .notifier
            .send(
                &member.phone_number,
                &delivered,
                json!({ "content_id": ticket.content_id, "ticket_id": ticket.id }),
            )
            .await;
        if !outcome.success {
            // Delivery is fire-and-log; the ticket still counts as sent.
            warn!(
                ticket_id = %ticket.id,
                error = outcome.error.as_deref().unwrap_or("unknown"),
                "notification delivery reported failure"
            );
        }

        // Past the point of delivery: persistence problems are logged, never
        // requeued, so the member cannot be messaged twice.
        ticket.mark_sent();
        member.touch_activity();
        let entry = ChatEntry::new(
            &member.id,
            &conversation_id,
            ChatRole::Assistant,
            &delivered,
        );
        if let Err(e) = self.history.append(&entry).await {
            warn!(ticket_id = %ticket.id, error = %e, "failed to append chat history");
        }
        if let Err(e) = self.tickets.save(ticket).await {
            error!(ticket_id = %ticket.id, error = %e, "failed to persist sent ticket");
        }
        if let Err(e) = self.members.save(&member).await {
            error!(member_id = %member.id, error = %e, "failed to persist member");
        }
        Ok(Fate::Sent)
    }
}

/// Renders the templated outbound message from the ticket metadata. Used as
/// the conversation opener and as the fallback when the content service has
/// nothing richer.
pub fn content_message(meta: &ContentMeta) -> String {
    let mut lines = vec!["New sermon available!".to_string(), String::new()];
    if let Some(title) = &meta.title {
        lines.push(format!("Title: {title}"));
    }
    if let Some(speaker) = &meta.speaker {
        lines.push(format!("Speaker: {speaker}"));
    }
    if let Some(date) = &meta.service_date {
        lines.push(format!("Date: {date}"));
    }
    lines.push(String::new());
    lines.push("Reply to this message if you would like to talk about it.".to_string());
    lines.join("\n")
}

/// Requeues an errored ticket by explicit operator action.
pub async fn retry_ticket(tickets: &dyn TicketStore, ticket_id: &str) -> Result<Ticket, FlockError> {
    let mut ticket = tickets
        .find_by_id(ticket_id)
        .await?
        .ok_or_else(|| FlockError::NotFound {
            entity: "ticket",
            id: ticket_id.to_string(),
        })?;
    if !ticket.retry() {
        return Err(FlockError::Internal(format!(
            "ticket {ticket_id} is {} and cannot be retried",
            ticket.status
        )));
    }
    tickets.save(&ticket).await?;
    info!(ticket_id, retry_count = ticket.retry_count, "ticket requeued for retry");
    Ok(ticket)
}

/// Releases a waiting (multi-church) ticket back into the queue. Holds never
/// expire on their own; this is the explicit exit.
pub async fn release_ticket(
    tickets: &dyn TicketStore,
    ticket_id: &str,
) -> Result<Ticket, FlockError> {
    let mut ticket = tickets
        .find_by_id(ticket_id)
        .await?
        .ok_or_else(|| FlockError::NotFound {
            entity: "ticket",
            id: ticket_id.to_string(),
        })?;
    if ticket.status != TicketStatus::Waiting {
        return Err(FlockError::Internal(format!(
            "ticket {ticket_id} is {} and cannot be released",
            ticket.status
        )));
    }
    ticket.status = TicketStatus::Queued;
    ticket.updated_at = flock_core::types::now_rfc3339();
    tickets.save(&ticket).await?;
    info!(ticket_id, "waiting ticket released into the queue");
    Ok(ticket)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flock_core::types::{LlmItem, LlmResponse, Member, ToolCall, MAX_DELIVERY_ATTEMPTS};
    use flock_test_utils::{MemoryStore, MockContentService, MockLlm, MockNotifier};

    use crate::tools::ToolExecutor;

    struct Harness {
        store: MemoryStore,
        llm: Arc<MockLlm>,
        notifier: Arc<MockNotifier>,
        content: Arc<MockContentService>,
        processor: QueueProcessor,
    }

    fn harness(llm: MockLlm) -> Harness {
        let store = MemoryStore::new();
        let llm = Arc::new(llm);
        let notifier = Arc::new(MockNotifier::new());
        let content = Arc::new(MockContentService::new());
        let processor = QueueProcessor::new(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            llm.clone(),
            notifier.clone(),
            content.clone(),
            SessionManager::new(llm.clone()),
            ToolDispatcher::new(llm.clone(), ToolExecutor::new(content.clone())),
            1,
        );
        Harness {
            store,
            llm,
            notifier,
            content,
            processor,
        }
    }

    async fn seed(harness: &Harness) -> (Member, Ticket) {
        let mut member = Member::new("+31612345678");
        member.intake_completed = true;
        member.church_ids = vec![5];
        harness.store.add_member(member.clone()).await;

        let ticket = Ticket::new(
            "sermon-1",
            &member.id,
            5,
            TicketStatus::Queued,
            None,
            ContentMeta {
                title: Some("On Hope".to_string()),
                speaker: Some("Rev. de Vries".to_string()),
                service_date: None,
                summary_audience: None,
            },
        );
        harness.store.add_ticket(ticket.clone()).await;
        (member, ticket)
    }

    async fn ticket_by_id(store: &MemoryStore, id: &str) -> Ticket {
        flock_core::TicketStore::find_by_id(store, id)
            .await
            .unwrap()
            .unwrap()
    }

    #[tokio::test]
    async fn fresh_conversation_delivers_the_content_message() {
        let h = harness(MockLlm::new());
        let (member, ticket) = seed(&h).await;

        let sent = h.processor.process_queue(10).await.unwrap();
        assert_eq!(sent, 1);

        // Conversation created, but the content message went out directly.
        let texts = h.notifier.sent_texts().await;
        assert_eq!(texts.len(), 1);
        assert!(texts[0].contains("New sermon available!"));
        assert!(texts[0].contains("Title: On Hope"));
        assert!(h
            .llm
            .calls()
            .await
            .iter()
            .all(|c| matches!(c, flock_test_utils::LlmCall::CreateConversation { .. })));

        let stored = ticket_by_id(&h.store, &ticket.id).await;
        assert_eq!(stored.status, TicketStatus::Sent);
        assert!(stored.sent_at.is_some());

        let saved_member = flock_core::MemberStore::find_by_id(&h.store, &member.id)
            .await
            .unwrap()
            .unwrap();
        assert!(saved_member.conversation_id.is_some());
        assert_eq!(saved_member.active_content_id.as_deref(), Some("sermon-1"));

        let history = h.store.history().await;
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].role, ChatRole::Assistant);
    }

    #[tokio::test]
    async fn content_service_override_replaces_the_template() {
        let h = harness(MockLlm::new());
        seed(&h).await;
        h.content.set_details("A richer announcement").await;

        h.processor.process_queue(10).await.unwrap();
        let texts = h.notifier.sent_texts().await;
        assert_eq!(texts[0], "A richer announcement");
    }

    #[tokio::test]
    async fn reused_conversation_routes_through_the_assistant() {
        let h = harness(MockLlm::with_responses(vec![MockLlm::text_response(
            "Here is a follow-up thought.",
        )]));
        let (mut member, _) = seed(&h).await;
        member.conversation_id = Some("conv-1".to_string());
        member.active_content_id = Some("sermon-1".to_string());
        h.store.add_member(member).await;

        let sent = h.processor.process_queue(10).await.unwrap();
        assert_eq!(sent, 1);
        assert_eq!(
            h.notifier.sent_texts().await,
            vec!["Here is a follow-up thought.".to_string()]
        );
    }

    #[tokio::test]
    async fn reused_conversation_with_tool_calls_runs_the_dispatcher() {
        let tool_response = LlmResponse {
            id: None,
            items: vec![LlmItem::ToolCall(ToolCall {
                call_id: "call-1".into(),
                name: "manage_user".into(),
                arguments: r#"{"first_name":"Anna","age":34}"#.into(),
            })],
        };
        let h = harness(MockLlm::with_responses(vec![
            tool_response,
            MockLlm::text_response("All set, Anna!"),
        ]));
        let (mut member, _) = seed(&h).await;
        member.conversation_id = Some("conv-1".to_string());
        member.active_content_id = Some("sermon-1".to_string());
        h.store.add_member(member.clone()).await;

        h.processor.process_queue(10).await.unwrap();
        assert_eq!(h.notifier.sent_texts().await, vec!["All set, Anna!".to_string()]);

        // Tool mutations were persisted with the ticket.
        let saved = flock_core::MemberStore::find_by_id(&h.store, &member.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(saved.first_name.as_deref(), Some("Anna"));
    }

    #[tokio::test]
    async fn textless_final_response_falls_back_to_the_content_message() {
        // The assistant answers with an empty response.
        let h = harness(MockLlm::with_responses(vec![LlmResponse::default()]));
        let (mut member, _) = seed(&h).await;
        member.conversation_id = Some("conv-1".to_string());
        member.active_content_id = Some("sermon-1".to_string());
        h.store.add_member(member).await;

        h.processor.process_queue(10).await.unwrap();
        let texts = h.notifier.sent_texts().await;
        assert!(texts[0].contains("New sermon available!"));
    }

    #[tokio::test]
    async fn multi_church_member_parks_the_ticket() {
        let h = harness(MockLlm::new());
        let (mut member, ticket) = seed(&h).await;
        // The member joined a second church after fan-out.
        member.church_ids = vec![5, 9];
        h.store.add_member(member).await;

        let sent = h.processor.process_queue(10).await.unwrap();
        assert_eq!(sent, 0);
        assert_eq!(
            ticket_by_id(&h.store, &ticket.id).await.status,
            TicketStatus::Waiting
        );
        assert!(h.notifier.sent().await.is_empty());

        // Holds do not expire, even once the member is back to one church;
        // only an explicit release requeues the ticket.
        let mut member = flock_core::MemberStore::find_by_id(&h.store, &ticket.member_id)
            .await
            .unwrap()
            .unwrap();
        member.church_ids = vec![5];
        h.store.add_member(member).await;
        h.processor.process_queue(10).await.unwrap();
        assert_eq!(
            ticket_by_id(&h.store, &ticket.id).await.status,
            TicketStatus::Waiting
        );

        release_ticket(&h.store, &ticket.id).await.unwrap();
        let sent = h.processor.process_queue(10).await.unwrap();
        assert_eq!(sent, 1);
        assert_eq!(
            ticket_by_id(&h.store, &ticket.id).await.status,
            TicketStatus::Sent
        );
    }

    #[tokio::test]
    async fn missing_member_records_a_failure() {
        let h = harness(MockLlm::new());
        let ticket = Ticket::new(
            "sermon-1",
            "ghost",
            5,
            TicketStatus::Queued,
            None,
            ContentMeta::default(),
        );
        h.store.add_ticket(ticket.clone()).await;

        let sent = h.processor.process_queue(10).await.unwrap();
        assert_eq!(sent, 0);
        let stored = ticket_by_id(&h.store, &ticket.id).await;
        assert_eq!(stored.status, TicketStatus::Queued);
        assert_eq!(stored.retry_count, 1);
        assert!(stored.error_message.as_deref().unwrap_or_default().contains("not found"));
    }

    #[tokio::test]
    async fn failures_exhaust_into_error_after_three_attempts() {
        let h = harness(MockLlm::new());
        let (mut member, ticket) = seed(&h).await;
        member.conversation_id = Some("conv-1".to_string());
        member.active_content_id = Some("sermon-1".to_string());
        h.store.add_member(member).await;

        for attempt in 1..=MAX_DELIVERY_ATTEMPTS {
            h.llm.fail_next().await;
            h.processor.process_queue(10).await.unwrap();
            let stored = ticket_by_id(&h.store, &ticket.id).await;
            assert_eq!(stored.retry_count, attempt);
            if attempt < MAX_DELIVERY_ATTEMPTS {
                assert_eq!(stored.status, TicketStatus::Queued);
            } else {
                assert_eq!(stored.status, TicketStatus::Error);
            }
        }

        // Errored tickets are out of the queue for good.
        assert_eq!(h.processor.process_queue(10).await.unwrap(), 0);
        assert!(h.notifier.sent().await.is_empty());
    }

    #[tokio::test]
    async fn notifier_failure_still_marks_the_ticket_sent() {
        let h = harness(MockLlm::new());
        let (_, ticket) = seed(&h).await;
        h.notifier.fail_all().await;

        let sent = h.processor.process_queue(10).await.unwrap();
        assert_eq!(sent, 1);
        assert_eq!(
            ticket_by_id(&h.store, &ticket.id).await.status,
            TicketStatus::Sent
        );
    }

    #[tokio::test]
    async fn batch_respects_the_limit_oldest_first() {
        let h = harness(MockLlm::new());
        let mut member = Member::new("+31612345678");
        member.intake_completed = true;
        member.church_ids = vec![5];
        h.store.add_member(member.clone()).await;

        for i in 0..3 {
            let mut t = Ticket::new(
                format!("sermon-{i}"),
                &member.id,
                5,
                TicketStatus::Queued,
                None,
                ContentMeta::default(),
            );
            t.created_at = format!("2026-01-0{}T00:00:00+00:00", i + 1);
            h.store.add_ticket(t).await;
        }

        let sent = h.processor.process_queue(2).await.unwrap();
        assert_eq!(sent, 2);
        let remaining = flock_core::TicketStore::find_by_status(&h.store, TicketStatus::Queued, 10)
            .await
            .unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].content_id, "sermon-2");
    }

    #[tokio::test]
    async fn one_failing_ticket_does_not_halt_the_batch() {
        let h = harness(MockLlm::new());
        let (_member, _) = seed(&h).await;
        let mut orphan = Ticket::new(
            "sermon-1",
            "ghost",
            5,
            TicketStatus::Queued,
            None,
            ContentMeta::default(),
        );
        // The orphan is older, so it is attempted first.
        orphan.created_at = "2020-01-01T00:00:00+00:00".to_string();
        h.store.add_ticket(orphan).await;

        let sent = h.processor.process_queue(10).await.unwrap();
        assert_eq!(sent, 1);
        let texts = h.notifier.sent_texts().await;
        assert_eq!(texts.len(), 1);
    }

    #[tokio::test]
    async fn manual_retry_requeues_an_errored_ticket() {
        let store = MemoryStore::new();
        let mut ticket = Ticket::new(
            "sermon-1",
            "member-1",
            5,
            TicketStatus::Queued,
            None,
            ContentMeta::default(),
        );
        for _ in 0..MAX_DELIVERY_ATTEMPTS {
            ticket.record_failure("boom");
        }
        store.add_ticket(ticket.clone()).await;

        let requeued = retry_ticket(&store, &ticket.id).await.unwrap();
        assert_eq!(requeued.status, TicketStatus::Queued);
        assert_eq!(requeued.retry_count, MAX_DELIVERY_ATTEMPTS + 1);

        // A second retry on the now-queued ticket is rejected.
        assert!(retry_ticket(&store, &ticket.id).await.is_err());
        // Unknown ids are a NotFound error.
        assert!(retry_ticket(&store, "nope").await.is_err());
    }

    #[tokio::test]
    async fn release_moves_a_waiting_ticket_into_the_queue() {
        let store = MemoryStore::new();
        let ticket = Ticket::new(
            "sermon-1",
            "member-1",
            5,
            TicketStatus::Waiting,
            None,
            ContentMeta::default(),
        );
        store.add_ticket(ticket.clone()).await;

        let released = release_ticket(&store, &ticket.id).await.unwrap();
        assert_eq!(released.status, TicketStatus::Queued);
        assert!(release_ticket(&store, &ticket.id).await.is_err());
    }

    #[test]
    fn content_message_skips_missing_fields() {
        let message = content_message(&ContentMeta {
            title: Some("On Hope".into()),
            speaker: None,
            service_date: None,
            summary_audience: None,
        });
        assert!(message.contains("Title: On Hope"));
        assert!(!message.contains("Speaker:"));
    }
}
