// SPDX-FileCopyrightText: 2026 Flock Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Content distribution core.
//!
//! Everything between "a piece of content is ready" and "a member got a
//! message about it" lives here: fan-out into per-member tickets, the
//! scheduled-ticket promoter, the queue processor, conversation session
//! management, the tool-call dispatcher, and the inbound message handler.
//! External systems are reached exclusively through the `flock-core` traits,
//! so the whole crate runs against in-memory doubles in tests.

pub mod dispatch;
pub mod fanout;
pub mod inbound;
pub mod processor;
pub mod promoter;
pub mod session;
pub mod tools;

pub use dispatch::ToolDispatcher;
pub use fanout::FanOut;
pub use inbound::InboundHandler;
pub use processor::{content_message, release_ticket, retry_ticket, QueueProcessor};
pub use promoter::Promoter;
pub use session::SessionManager;
pub use tools::{ToolExecutor, ToolKind, ToolOutcome};
