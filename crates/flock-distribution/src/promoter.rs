// SPDX-FileCopyrightText: 2026 Flock Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Promotion of due scheduled tickets into the queue.

use std::sync::Arc;

use tracing::info;

use flock_core::types::{now_rfc3339, TicketStatus};
use flock_core::{FlockError, TicketStore};

pub struct Promoter {
    tickets: Arc<dyn TicketStore>,
}

impl Promoter {
    pub fn new(tickets: Arc<dyn TicketStore>) -> Self {
        Self { tickets }
    }

    /// Moves every due scheduled ticket to `Queued` and returns the count.
    /// One batch per pass; a second pass with nothing due promotes nothing.
    pub async fn promote_due(&self) -> Result<usize, FlockError> {
        let now = now_rfc3339();
        let due = self.tickets.find_due_scheduled(&now).await?;
        let promoted = due.len();
        for mut ticket in due {
            ticket.status = TicketStatus::Queued;
            ticket.updated_at = now_rfc3339();
            self.tickets.save(&ticket).await?;
        }
        if promoted > 0 {
            info!(promoted, "promoted scheduled tickets");
        }
        Ok(promoted)
    }
}
