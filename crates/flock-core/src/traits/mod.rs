// SPDX-FileCopyrightText: 2026 Flock Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator trait definitions.
//!
//! Every external collaborator of the distribution core — stores, the LLM
//! conversation API, the outbound notification channel, and the content
//! detail service — is consumed through one of these contracts.

pub mod content;
pub mod conversation;
pub mod notify;
pub mod store;

pub use content::ContentService;
pub use conversation::ConversationService;
pub use notify::NotificationChannel;
pub use store::{ChatHistoryStore, MemberStore, TicketStore};
