// SPDX-FileCopyrightText: 2026 Flock Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Append-only chat history writes.

use flock_core::types::ChatEntry;
use flock_core::FlockError;
use rusqlite::params;

use crate::database::Database;

/// Append one conversation turn.
pub async fn append(db: &Database, entry: &ChatEntry) -> Result<(), FlockError> {
    let entry = entry.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO chat_history (id, member_id, conversation_id, role, content,
                     tool_calls, response_id, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    entry.id,
                    entry.member_id,
                    entry.conversation_id,
                    entry.role.to_string(),
                    entry.content,
                    entry.tool_calls,
                    entry.response_id,
                    entry.created_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}
