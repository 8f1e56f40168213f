// SPDX-FileCopyrightText: 2026 Flock Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound notification channel contract.

use async_trait::async_trait;

use crate::types::SendOutcome;

/// Fire-and-log delivery of a message to a member.
///
/// Never fails at the type level: transport errors are folded into the
/// returned [`SendOutcome`] and logged by the implementation.
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    async fn send(
        &self,
        recipient: &str,
        text: &str,
        meta: serde_json::Value,
    ) -> SendOutcome;
}
