// SPDX-FileCopyrightText: 2026 Flock Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persistence contracts for members, tickets, and chat history.

use async_trait::async_trait;

use crate::error::FlockError;
use crate::types::{ChatEntry, Member, Ticket, TicketStatus};

/// Member directory access.
#[async_trait]
pub trait MemberStore: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Option<Member>, FlockError>;

    /// Lookup by E.164 phone number.
    async fn find_by_phone(&self, phone_number: &str) -> Result<Option<Member>, FlockError>;

    /// Members eligible for distribution in a church: intake completed,
    /// opted in to new-content notifications, and a member of `church_id`.
    async fn find_active_by_church(&self, church_id: i64) -> Result<Vec<Member>, FlockError>;

    /// Insert-or-update by id.
    async fn save(&self, member: &Member) -> Result<(), FlockError>;
}

/// Content status record (ticket) access.
#[async_trait]
pub trait TicketStore: Send + Sync {
    /// Tickets in `status`, oldest-created first, at most `limit`.
    async fn find_by_status(
        &self,
        status: TicketStatus,
        limit: usize,
    ) -> Result<Vec<Ticket>, FlockError>;

    /// The open (non-terminal) ticket for a (member, content) pair, if one
    /// exists. Creation is idempotent against this lookup.
    async fn find_open_by_member_and_content(
        &self,
        member_id: &str,
        content_id: &str,
    ) -> Result<Option<Ticket>, FlockError>;

    /// All `Scheduled` tickets whose fire time is at or before `now`
    /// (tickets without a fire time count as due).
    async fn find_due_scheduled(&self, now: &str) -> Result<Vec<Ticket>, FlockError>;

    async fn find_by_id(&self, id: &str) -> Result<Option<Ticket>, FlockError>;

    async fn insert(&self, ticket: &Ticket) -> Result<(), FlockError>;

    /// Update an existing ticket by id.
    async fn save(&self, ticket: &Ticket) -> Result<(), FlockError>;
}

/// Append-only chat history sink.
#[async_trait]
pub trait ChatHistoryStore: Send + Sync {
    async fn append(&self, entry: &ChatEntry) -> Result<(), FlockError>;
}
