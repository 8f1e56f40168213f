// SPDX-FileCopyrightText: 2026 Flock Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the core store traits.

use async_trait::async_trait;

use flock_core::types::{ChatEntry, Member, Ticket, TicketStatus};
use flock_core::{ChatHistoryStore, FlockError, MemberStore, TicketStore};

use crate::database::Database;
use crate::queries;

/// SQLite-backed store.
///
/// Wraps a [`Database`] handle and delegates all operations to the typed
/// query modules. Cheap to clone; all clones share one connection.
#[derive(Clone)]
pub struct SqliteStore {
    db: Database,
}

impl SqliteStore {
    /// Open (or create) the database at `path` and run migrations.
    pub async fn open(path: &str) -> Result<Self, FlockError> {
        let db = Database::open(path).await?;
        Ok(Self { db })
    }

    /// Wrap an already-open database handle.
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }
}

#[async_trait]
impl MemberStore for SqliteStore {
    async fn find_by_id(&self, id: &str) -> Result<Option<Member>, FlockError> {
        queries::members::find_by_id(&self.db, id).await
    }

    async fn find_by_phone(&self, phone_number: &str) -> Result<Option<Member>, FlockError> {
        queries::members::find_by_phone(&self.db, phone_number).await
    }

    async fn find_active_by_church(&self, church_id: i64) -> Result<Vec<Member>, FlockError> {
        queries::members::find_active_by_church(&self.db, church_id).await
    }

    async fn save(&self, member: &Member) -> Result<(), FlockError> {
        queries::members::upsert(&self.db, member).await
    }
}

#[async_trait]
impl TicketStore for SqliteStore {
    async fn find_by_status(
        &self,
        status: TicketStatus,
        limit: usize,
    ) -> Result<Vec<Ticket>, FlockError> {
        queries::tickets::find_by_status(&self.db, status, limit).await
    }

    async fn find_open_by_member_and_content(
        &self,
        member_id: &str,
        content_id: &str,
    ) -> Result<Option<Ticket>, FlockError> {
        queries::tickets::find_open_by_member_and_content(&self.db, member_id, content_id).await
    }

    async fn find_due_scheduled(&self, now: &str) -> Result<Vec<Ticket>, FlockError> {
        queries::tickets::find_due_scheduled(&self.db, now).await
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Ticket>, FlockError> {
        queries::tickets::find_by_id(&self.db, id).await
    }

    async fn insert(&self, ticket: &Ticket) -> Result<(), FlockError> {
        queries::tickets::insert(&self.db, ticket).await
    }

    async fn save(&self, ticket: &Ticket) -> Result<(), FlockError> {
        queries::tickets::update(&self.db, ticket).await
    }
}

#[async_trait]
impl ChatHistoryStore for SqliteStore {
    async fn append(&self, entry: &ChatEntry) -> Result<(), FlockError> {
        queries::history::append(&self.db, entry).await
    }
}
