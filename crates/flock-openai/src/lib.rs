// SPDX-FileCopyrightText: 2026 Flock Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! OpenAI Responses API client for the Flock distribution service.
//!
//! Implements the [`flock_core::ConversationService`] contract on top of the
//! `/conversations` and `/responses` endpoints, with bounded linear-backoff
//! retry for transient failures and a fixed five-tool function toolset.

pub mod client;
pub mod instructions;
pub mod toolset;
pub mod types;

pub use client::OpenAiService;
