// SPDX-FileCopyrightText: 2026 Flock Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory store implementing the persistence traits.
//!
//! Mirrors the SQLite store's query semantics (ordering, filters) so
//! processor and fan-out tests exercise the same contracts.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use flock_core::types::{ChatEntry, Member, Ticket, TicketStatus};
use flock_core::{ChatHistoryStore, FlockError, MemberStore, TicketStore};

/// In-memory member, ticket, and chat-history store.
#[derive(Clone, Default)]
pub struct MemoryStore {
    members: Arc<Mutex<HashMap<String, Member>>>,
    tickets: Arc<Mutex<HashMap<String, Ticket>>>,
    history: Arc<Mutex<Vec<ChatEntry>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a member directly.
    pub async fn add_member(&self, member: Member) {
        self.members.lock().await.insert(member.id.clone(), member);
    }

    /// Seed a ticket directly.
    pub async fn add_ticket(&self, ticket: Ticket) {
        self.tickets.lock().await.insert(ticket.id.clone(), ticket);
    }

    /// All tickets, in no particular order.
    pub async fn all_tickets(&self) -> Vec<Ticket> {
        self.tickets.lock().await.values().cloned().collect()
    }

    /// All chat history entries, in append order.
    pub async fn history(&self) -> Vec<ChatEntry> {
        self.history.lock().await.clone()
    }
}

#[async_trait]
impl MemberStore for MemoryStore {
    async fn find_by_id(&self, id: &str) -> Result<Option<Member>, FlockError> {
        Ok(self.members.lock().await.get(id).cloned())
    }

    async fn find_by_phone(&self, phone_number: &str) -> Result<Option<Member>, FlockError> {
        Ok(self
            .members
            .lock()
            .await
            .values()
            .find(|m| m.phone_number == phone_number)
            .cloned())
    }

    async fn find_active_by_church(&self, church_id: i64) -> Result<Vec<Member>, FlockError> {
        let mut members: Vec<Member> = self
            .members
            .lock()
            .await
            .values()
            .filter(|m| {
                m.intake_completed && m.notify_new_content && m.is_member_of(church_id)
            })
            .cloned()
            .collect();
        members.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(members)
    }

    async fn save(&self, member: &Member) -> Result<(), FlockError> {
        self.members
            .lock()
            .await
            .insert(member.id.clone(), member.clone());
        Ok(())
    }
}

#[async_trait]
impl TicketStore for MemoryStore {
    async fn find_by_status(
        &self,
        status: TicketStatus,
        limit: usize,
    ) -> Result<Vec<Ticket>, FlockError> {
        let mut tickets: Vec<Ticket> = self
            .tickets
            .lock()
            .await
            .values()
            .filter(|t| t.status == status)
            .cloned()
            .collect();
        tickets.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        tickets.truncate(limit);
        Ok(tickets)
    }

    async fn find_open_by_member_and_content(
        &self,
        member_id: &str,
        content_id: &str,
    ) -> Result<Option<Ticket>, FlockError> {
        Ok(self
            .tickets
            .lock()
            .await
            .values()
            .find(|t| t.member_id == member_id && t.content_id == content_id && t.is_open())
            .cloned())
    }

    async fn find_due_scheduled(&self, now: &str) -> Result<Vec<Ticket>, FlockError> {
        let mut tickets: Vec<Ticket> = self
            .tickets
            .lock()
            .await
            .values()
            .filter(|t| t.is_due(now))
            .cloned()
            .collect();
        tickets.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(tickets)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Ticket>, FlockError> {
        Ok(self.tickets.lock().await.get(id).cloned())
    }

    async fn insert(&self, ticket: &Ticket) -> Result<(), FlockError> {
        self.tickets
            .lock()
            .await
            .insert(ticket.id.clone(), ticket.clone());
        Ok(())
    }

    async fn save(&self, ticket: &Ticket) -> Result<(), FlockError> {
        self.tickets
            .lock()
            .await
            .insert(ticket.id.clone(), ticket.clone());
        Ok(())
    }
}

#[async_trait]
impl ChatHistoryStore for MemoryStore {
    async fn append(&self, entry: &ChatEntry) -> Result<(), FlockError> {
        self.history.lock().await.push(entry.clone());
        Ok(())
    }
}
