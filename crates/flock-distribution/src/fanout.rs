// SPDX-FileCopyrightText: 2026 Flock Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ticket fan-out for content-ready events.

use std::sync::Arc;

use tracing::{info, warn};

use flock_core::types::{
    now_rfc3339, to_utc_rfc3339, ContentMeta, ContentReadyEvent, Ticket, TicketStatus,
};
use flock_core::{FlockError, MemberStore, TicketStore};

/// Creates one ticket per eligible member when new content is ready.
pub struct FanOut {
    members: Arc<dyn MemberStore>,
    tickets: Arc<dyn TicketStore>,
}

impl FanOut {
    pub fn new(members: Arc<dyn MemberStore>, tickets: Arc<dyn TicketStore>) -> Self {
        Self { members, tickets }
    }

    /// Fans out `event` to the active members of its church and returns the
    /// number of tickets created.
    ///
    /// A (member, content) pair with an open ticket is skipped, so replayed
    /// events are harmless. Zero eligible members is a warning, not an error.
    pub async fn fan_out(&self, event: &ContentReadyEvent) -> Result<usize, FlockError> {
        let members = self.members.find_active_by_church(event.church_id).await?;
        if members.is_empty() {
            warn!(
                church_id = event.church_id,
                content_id = %event.content_id,
                "no active members to notify"
            );
            return Ok(0);
        }

        let meta = ContentMeta {
            title: event.title.clone(),
            speaker: event.speaker.clone(),
            service_date: event.service_date.clone(),
            summary_audience: event.summary_audience.clone(),
        };

        let now = now_rfc3339();
        // Event fire times may carry any offset; compare in UTC.
        let schedule_at = event.schedule_at.as_deref().map(to_utc_rfc3339);
        let mut created = 0;
        for member in &members {
            let existing = self
                .tickets
                .find_open_by_member_and_content(&member.id, &event.content_id)
                .await?;
            if existing.is_some() {
                continue;
            }

            let status = if member.has_multiple_churches() {
                TicketStatus::Waiting
            } else if schedule_at.as_deref().is_some_and(|at| at > now.as_str()) {
                TicketStatus::Scheduled
            } else {
                TicketStatus::Queued
            };
            let ticket = Ticket::new(
                &event.content_id,
                &member.id,
                event.church_id,
                status,
                schedule_at.clone(),
                meta.clone(),
            );
            self.tickets.insert(&ticket).await?;
            created += 1;
        }

        info!(
            church_id = event.church_id,
            content_id = %event.content_id,
            created,
            eligible = members.len(),
            "fan-out complete"
        );
        Ok(created)
    }
}
