// SPDX-FileCopyrightText: 2026 Flock Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Member directory CRUD operations.

use flock_core::types::Member;
use flock_core::FlockError;
use rusqlite::params;

use crate::database::Database;
use crate::queries::{decode_enum, decode_json};

const MEMBER_COLUMNS: &str = "id, phone_number, first_name, age, target_group, church_ids,
     conversation_id, active_content_id, intake_completed, notify_new_content,
     notify_reflection, notification_frequency, paused_until, last_attendance_at,
     unsubscribe_reason, unsubscribed_at, last_activity_at, created_at, updated_at";

fn member_from_row(row: &rusqlite::Row<'_>) -> Result<Member, rusqlite::Error> {
    let target_group: Option<String> = row.get(4)?;
    let church_ids: String = row.get(5)?;
    Ok(Member {
        id: row.get(0)?,
        phone_number: row.get(1)?,
        first_name: row.get(2)?,
        age: row.get(3)?,
        target_group: target_group.as_deref().map(|g| decode_enum(4, g)).transpose()?,
        church_ids: decode_json(5, &church_ids)?,
        conversation_id: row.get(6)?,
        active_content_id: row.get(7)?,
        intake_completed: row.get(8)?,
        notify_new_content: row.get(9)?,
        notify_reflection: row.get(10)?,
        notification_frequency: row.get(11)?,
        paused_until: row.get(12)?,
        last_attendance_at: row.get(13)?,
        unsubscribe_reason: row.get(14)?,
        unsubscribed_at: row.get(15)?,
        last_activity_at: row.get(16)?,
        created_at: row.get(17)?,
        updated_at: row.get(18)?,
    })
}

/// Get a member by ID.
pub async fn find_by_id(db: &Database, id: &str) -> Result<Option<Member>, FlockError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {MEMBER_COLUMNS} FROM members WHERE id = ?1"
            ))?;
            let result = stmt.query_row(params![id], member_from_row);
            match result {
                Ok(member) => Ok(Some(member)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Get a member by E.164 phone number.
pub async fn find_by_phone(
    db: &Database,
    phone_number: &str,
) -> Result<Option<Member>, FlockError> {
    let phone_number = phone_number.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {MEMBER_COLUMNS} FROM members WHERE phone_number = ?1"
            ))?;
            let result = stmt.query_row(params![phone_number], member_from_row);
            match result {
                Ok(member) => Ok(Some(member)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Members eligible for distribution in a church: intake completed, opted in
/// to new-content notifications, and carrying `church_id` in their JSON
/// membership array.
pub async fn find_active_by_church(
    db: &Database,
    church_id: i64,
) -> Result<Vec<Member>, FlockError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {MEMBER_COLUMNS} FROM members
                 WHERE intake_completed = 1
                   AND notify_new_content = 1
                   AND EXISTS (
                       SELECT 1 FROM json_each(members.church_ids)
                       WHERE json_each.value = ?1
                   )
                 ORDER BY created_at ASC"
            ))?;
            let rows = stmt.query_map(params![church_id], member_from_row)?;
            let mut members = Vec::new();
            for row in rows {
                members.push(row?);
            }
            Ok(members)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Insert or update a member by ID.
pub async fn upsert(db: &Database, member: &Member) -> Result<(), FlockError> {
    let member = member.clone();
    let church_ids = serde_json::to_string(&member.church_ids)
        .map_err(|e| FlockError::Internal(format!("encoding church_ids: {e}")))?;
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO members (id, phone_number, first_name, age, target_group,
                     church_ids, conversation_id, active_content_id, intake_completed,
                     notify_new_content, notify_reflection, notification_frequency,
                     paused_until, last_attendance_at, unsubscribe_reason, unsubscribed_at,
                     last_activity_at, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14,
                     ?15, ?16, ?17, ?18, ?19)
                 ON CONFLICT(id) DO UPDATE SET
                     phone_number = excluded.phone_number,
                     first_name = excluded.first_name,
                     age = excluded.age,
                     target_group = excluded.target_group,
                     church_ids = excluded.church_ids,
                     conversation_id = excluded.conversation_id,
                     active_content_id = excluded.active_content_id,
                     intake_completed = excluded.intake_completed,
                     notify_new_content = excluded.notify_new_content,
                     notify_reflection = excluded.notify_reflection,
                     notification_frequency = excluded.notification_frequency,
                     paused_until = excluded.paused_until,
                     last_attendance_at = excluded.last_attendance_at,
                     unsubscribe_reason = excluded.unsubscribe_reason,
                     unsubscribed_at = excluded.unsubscribed_at,
                     last_activity_at = excluded.last_activity_at,
                     updated_at = excluded.updated_at",
                params![
                    member.id,
                    member.phone_number,
                    member.first_name,
                    member.age,
                    member.target_group.map(|g| g.to_string()),
                    church_ids,
                    member.conversation_id,
                    member.active_content_id,
                    member.intake_completed,
                    member.notify_new_content,
                    member.notify_reflection,
                    member.notification_frequency,
                    member.paused_until,
                    member.last_attendance_at,
                    member.unsubscribe_reason,
                    member.unsubscribed_at,
                    member.last_activity_at,
                    member.created_at,
                    member.updated_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}
