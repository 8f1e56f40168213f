// SPDX-FileCopyrightText: 2026 Flock Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Flock integration tests.
//!
//! Provides mock collaborators and in-memory stores for fast, deterministic,
//! CI-runnable tests without external services.
//!
//! # Components
//!
//! - [`MockLlm`] - Mock conversation service with scripted responses
//! - [`MockNotifier`] - Mock notification channel with send capture
//! - [`MockContentService`] - Mock content service with configurable lookups
//! - [`MemoryStore`] - In-memory member/ticket/chat-history store

pub mod memory;
pub mod mock_content;
pub mod mock_llm;
pub mod mock_notifier;

pub use memory::MemoryStore;
pub use mock_content::MockContentService;
pub use mock_llm::{LlmCall, MockLlm};
pub use mock_notifier::MockNotifier;
