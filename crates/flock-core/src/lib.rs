// SPDX-FileCopyrightText: 2026 Flock Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Flock church-chat backend.
//!
//! This crate provides the domain types, error type, and collaborator trait
//! definitions used throughout the Flock workspace. The distribution core
//! consumes every external system — stores, the LLM conversation API, the
//! notification channel, the content service — through traits defined here.

pub mod error;
pub mod traits;
pub mod types;

pub use error::FlockError;
pub use traits::{
    ChatHistoryStore, ContentService, ConversationService, MemberStore,
    NotificationChannel, TicketStore,
};
pub use types::{
    ChatEntry, ChatRole, ContentMeta, LlmItem, LlmResponse, Member, SendOutcome,
    TargetGroup, Ticket, TicketStatus, ToolCall,
};
