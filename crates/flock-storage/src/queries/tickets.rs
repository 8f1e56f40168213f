// SPDX-FileCopyrightText: 2026 Flock Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ticket CRUD operations for the distribution queue.

use flock_core::types::{to_utc_rfc3339, Ticket, TicketStatus};
use flock_core::FlockError;
use rusqlite::params;

use crate::database::Database;
use crate::queries::{decode_enum, decode_json};

const TICKET_COLUMNS: &str = "id, content_id, member_id, church_id, status, schedule_at,
     sent_at, error_message, retry_count, meta, created_at, updated_at";

fn ticket_from_row(row: &rusqlite::Row<'_>) -> Result<Ticket, rusqlite::Error> {
    let status: String = row.get(4)?;
    let meta: String = row.get(9)?;
    Ok(Ticket {
        id: row.get(0)?,
        content_id: row.get(1)?,
        member_id: row.get(2)?,
        church_id: row.get(3)?,
        status: decode_enum(4, &status)?,
        schedule_at: row.get(5)?,
        sent_at: row.get(6)?,
        error_message: row.get(7)?,
        retry_count: row.get(8)?,
        meta: decode_json(9, &meta)?,
        created_at: row.get(10)?,
        updated_at: row.get(11)?,
    })
}

/// Tickets in `status`, oldest-created first, at most `limit`.
pub async fn find_by_status(
    db: &Database,
    status: TicketStatus,
    limit: usize,
) -> Result<Vec<Ticket>, FlockError> {
    let status = status.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {TICKET_COLUMNS} FROM tickets
                 WHERE status = ?1 ORDER BY created_at ASC LIMIT ?2"
            ))?;
            let rows = stmt.query_map(params![status, limit as i64], ticket_from_row)?;
            let mut tickets = Vec::new();
            for row in rows {
                tickets.push(row?);
            }
            Ok(tickets)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// The open (non-terminal) ticket for a (member, content) pair, if any.
///
/// At most one open ticket exists per pair; fan-out is idempotent against
/// this lookup.
pub async fn find_open_by_member_and_content(
    db: &Database,
    member_id: &str,
    content_id: &str,
) -> Result<Option<Ticket>, FlockError> {
    let member_id = member_id.to_string();
    let content_id = content_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {TICKET_COLUMNS} FROM tickets
                 WHERE member_id = ?1 AND content_id = ?2 AND status != 'sent'
                 ORDER BY created_at ASC LIMIT 1"
            ))?;
            let result = stmt.query_row(params![member_id, content_id], ticket_from_row);
            match result {
                Ok(ticket) => Ok(Some(ticket)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// All scheduled tickets whose fire time is at or before `now`. A missing
/// fire time counts as due.
pub async fn find_due_scheduled(db: &Database, now: &str) -> Result<Vec<Ticket>, FlockError> {
    let now = now.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {TICKET_COLUMNS} FROM tickets
                 WHERE status = 'scheduled'
                   AND (schedule_at IS NULL OR schedule_at <= ?1)
                 ORDER BY created_at ASC"
            ))?;
            let rows = stmt.query_map(params![now], ticket_from_row)?;
            let mut tickets = Vec::new();
            for row in rows {
                tickets.push(row?);
            }
            Ok(tickets)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Get a ticket by ID.
pub async fn find_by_id(db: &Database, id: &str) -> Result<Option<Ticket>, FlockError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {TICKET_COLUMNS} FROM tickets WHERE id = ?1"
            ))?;
            let result = stmt.query_row(params![id], ticket_from_row);
            match result {
                Ok(ticket) => Ok(Some(ticket)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Insert a new ticket.
///
/// Fire times are written in UTC form so `find_due_scheduled`'s string
/// comparison sees instants.
pub async fn insert(db: &Database, ticket: &Ticket) -> Result<(), FlockError> {
    let mut ticket = ticket.clone();
    ticket.schedule_at = ticket.schedule_at.as_deref().map(to_utc_rfc3339);
    let meta = serde_json::to_string(&ticket.meta)
        .map_err(|e| FlockError::Internal(format!("encoding ticket meta: {e}")))?;
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO tickets (id, content_id, member_id, church_id, status,
                     schedule_at, sent_at, error_message, retry_count, meta,
                     created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                params![
                    ticket.id,
                    ticket.content_id,
                    ticket.member_id,
                    ticket.church_id,
                    ticket.status.to_string(),
                    ticket.schedule_at,
                    ticket.sent_at,
                    ticket.error_message,
                    ticket.retry_count,
                    meta,
                    ticket.created_at,
                    ticket.updated_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Update an existing ticket by ID.
pub async fn update(db: &Database, ticket: &Ticket) -> Result<(), FlockError> {
    let mut ticket = ticket.clone();
    ticket.schedule_at = ticket.schedule_at.as_deref().map(to_utc_rfc3339);
    let meta = serde_json::to_string(&ticket.meta)
        .map_err(|e| FlockError::Internal(format!("encoding ticket meta: {e}")))?;
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE tickets SET status = ?2, schedule_at = ?3, sent_at = ?4,
                     error_message = ?5, retry_count = ?6, meta = ?7, updated_at = ?8
                 WHERE id = ?1",
                params![
                    ticket.id,
                    ticket.status.to_string(),
                    ticket.schedule_at,
                    ticket.sent_at,
                    ticket.error_message,
                    ticket.retry_count,
                    meta,
                    ticket.updated_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}
