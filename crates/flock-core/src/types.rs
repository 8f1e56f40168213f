// SPDX-FileCopyrightText: 2026 Flock Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared across the Flock workspace.
//!
//! Timestamps are RFC 3339 strings throughout (UTC); they are generated via
//! [`now_rfc3339`] and compared lexicographically or in SQL.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Current UTC time as an RFC 3339 string.
pub fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Rewrites an RFC 3339 timestamp into its UTC form, so stored timestamps
/// compare correctly as plain strings. A string that does not parse is
/// returned unchanged.
pub fn to_utc_rfc3339(ts: &str) -> String {
    match chrono::DateTime::parse_from_rfc3339(ts) {
        Ok(parsed) => parsed.with_timezone(&chrono::Utc).to_rfc3339(),
        Err(_) => ts.to_string(),
    }
}

/// Audience a member's content is tailored to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TargetGroup {
    Adult,
    Deepening,
    Youth,
}

/// A registered church member reachable over Signal.
///
/// Conversation linkage is typed: `conversation_id` and `active_content_id`
/// always change together (see the session manager). The former ad hoc
/// metadata bag is replaced by the explicit optional fields below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub id: String,
    /// E.164, unique.
    pub phone_number: String,
    pub first_name: Option<String>,
    pub age: Option<i64>,
    pub target_group: Option<TargetGroup>,
    /// Church memberships; may be empty or hold more than one entry.
    pub church_ids: Vec<i64>,
    /// Opaque handle into the LLM conversation service.
    pub conversation_id: Option<String>,
    /// The content item the current conversation is about.
    pub active_content_id: Option<String>,
    pub intake_completed: bool,
    pub notify_new_content: bool,
    pub notify_reflection: bool,
    pub notification_frequency: Option<String>,
    pub paused_until: Option<String>,
    pub last_attendance_at: Option<String>,
    pub unsubscribe_reason: Option<String>,
    pub unsubscribed_at: Option<String>,
    pub last_activity_at: String,
    pub created_at: String,
    pub updated_at: String,
}

impl Member {
    /// Creates a member with defaults, identified by an E.164 phone number.
    pub fn new(phone_number: impl Into<String>) -> Self {
        let now = now_rfc3339();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            phone_number: phone_number.into(),
            first_name: None,
            age: None,
            target_group: None,
            church_ids: Vec::new(),
            conversation_id: None,
            active_content_id: None,
            intake_completed: false,
            notify_new_content: true,
            notify_reflection: true,
            notification_frequency: None,
            paused_until: None,
            last_attendance_at: None,
            unsubscribe_reason: None,
            unsubscribed_at: None,
            last_activity_at: now.clone(),
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// True when the member belongs to more than one church.
    ///
    /// Evaluated both at ticket creation and immediately before processing;
    /// membership at use time is authoritative.
    pub fn has_multiple_churches(&self) -> bool {
        self.church_ids.len() > 1
    }

    pub fn is_member_of(&self, church_id: i64) -> bool {
        self.church_ids.contains(&church_id)
    }

    /// The member's first (primary) church, if any.
    pub fn primary_church_id(&self) -> Option<i64> {
        self.church_ids.first().copied()
    }

    /// Bumps the activity and update timestamps.
    pub fn touch_activity(&mut self) {
        let now = now_rfc3339();
        self.last_activity_at = now.clone();
        self.updated_at = now;
    }
}

/// Delivery status of a [`Ticket`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TicketStatus {
    /// Has a future fire time; not yet actionable.
    Scheduled,
    /// Member belongs to more than one church; held pending disambiguation.
    Waiting,
    /// Eligible for immediate processing.
    Queued,
    /// Terminal success.
    Sent,
    /// Retries exhausted; requeueable only by an explicit retry action.
    Error,
}

/// Immutable descriptive metadata captured at ticket creation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentMeta {
    pub title: Option<String>,
    pub speaker: Option<String>,
    pub service_date: Option<String>,
    /// Audience hint for fetching a richer summary from the content service.
    pub summary_audience: Option<String>,
}

/// One unit of distribution work: deliver one content item to one member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: String,
    pub content_id: String,
    pub member_id: String,
    pub church_id: i64,
    pub status: TicketStatus,
    pub schedule_at: Option<String>,
    pub sent_at: Option<String>,
    pub error_message: Option<String>,
    pub retry_count: i64,
    pub meta: ContentMeta,
    pub created_at: String,
    pub updated_at: String,
}

/// Automatic retries stop after this many failed processing attempts.
pub const MAX_DELIVERY_ATTEMPTS: i64 = 3;

impl Ticket {
    pub fn new(
        content_id: impl Into<String>,
        member_id: impl Into<String>,
        church_id: i64,
        status: TicketStatus,
        schedule_at: Option<String>,
        meta: ContentMeta,
    ) -> Self {
        let now = now_rfc3339();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            content_id: content_id.into(),
            member_id: member_id.into(),
            church_id,
            status,
            // Fire times arrive with arbitrary offsets; store them in UTC
            // so SQL and string comparisons see instants, not wall clocks.
            schedule_at: schedule_at.map(|at| to_utc_rfc3339(&at)),
            sent_at: None,
            error_message: None,
            retry_count: 0,
            meta,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// A ticket still in flight. At most one non-terminal ticket may exist
    /// per (member, content) pair.
    pub fn is_open(&self) -> bool {
        !matches!(self.status, TicketStatus::Sent)
    }

    /// Terminal success: records the send time and clears any stale error.
    pub fn mark_sent(&mut self) {
        let now = now_rfc3339();
        self.status = TicketStatus::Sent;
        self.sent_at = Some(now.clone());
        self.error_message = None;
        self.updated_at = now;
    }

    /// Multi-church hold; exited only by an explicit external requeue.
    pub fn mark_waiting(&mut self) {
        self.status = TicketStatus::Waiting;
        self.updated_at = now_rfc3339();
    }

    /// Records a processing failure and applies the retry rule: back to
    /// `Queued` until [`MAX_DELIVERY_ATTEMPTS`] is reached, then `Error`.
    ///
    /// Returns the resulting status.
    pub fn record_failure(&mut self, message: impl Into<String>) -> TicketStatus {
        self.error_message = Some(message.into());
        self.retry_count += 1;
        self.status = if self.retry_count >= MAX_DELIVERY_ATTEMPTS {
            TicketStatus::Error
        } else {
            TicketStatus::Queued
        };
        self.updated_at = now_rfc3339();
        self.status
    }

    /// Manual retry of an errored ticket: requeues and increments the retry
    /// count (never resets it); the stored error message stays until the
    /// next success or failure overwrites it. No-op unless in `Error`.
    pub fn retry(&mut self) -> bool {
        if self.status != TicketStatus::Error {
            return false;
        }
        self.status = TicketStatus::Queued;
        self.retry_count += 1;
        self.updated_at = now_rfc3339();
        true
    }

    /// True for a `Scheduled` ticket whose fire time has passed (a missing
    /// fire time means "ready immediately").
    pub fn is_due(&self, now: &str) -> bool {
        if self.status != TicketStatus::Scheduled {
            return false;
        }
        match &self.schedule_at {
            None => true,
            // Compare as instants when both sides parse, so a fire time that
            // slipped in with a non-UTC offset still fires on time.
            Some(at) => match (
                chrono::DateTime::parse_from_rfc3339(at),
                chrono::DateTime::parse_from_rfc3339(now),
            ) {
                (Ok(at), Ok(now)) => at <= now,
                _ => at.as_str() <= now,
            },
        }
    }
}

/// Role of a chat history entry.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
    System,
}

/// Append-only record of one conversation turn. Write-only from the core;
/// conversational context itself lives with the LLM service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatEntry {
    pub id: String,
    pub member_id: String,
    pub conversation_id: String,
    pub role: ChatRole,
    pub content: String,
    /// JSON-encoded tool-call payload, when the turn carried one.
    pub tool_calls: Option<String>,
    /// Upstream response id, when known.
    pub response_id: Option<String>,
    pub created_at: String,
}

impl ChatEntry {
    pub fn new(
        member_id: impl Into<String>,
        conversation_id: impl Into<String>,
        role: ChatRole,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            member_id: member_id.into(),
            conversation_id: conversation_id.into(),
            role,
            content: content.into(),
            tool_calls: None,
            response_id: None,
            created_at: now_rfc3339(),
        }
    }
}

/// A function call requested by the LLM, to be executed locally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub call_id: String,
    pub name: String,
    /// JSON-encoded argument object as returned by the API.
    pub arguments: String,
}

/// One item of an LLM response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LlmItem {
    Message { text: String },
    ToolCall(ToolCall),
}

/// Normalized LLM response: an ordered list of message and tool-call items.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LlmResponse {
    pub id: Option<String>,
    pub items: Vec<LlmItem>,
}

impl LlmResponse {
    /// Text of the first message item, if any.
    pub fn text(&self) -> Option<&str> {
        self.items.iter().find_map(|item| match item {
            LlmItem::Message { text } => Some(text.as_str()),
            LlmItem::ToolCall(_) => None,
        })
    }

    /// All tool calls, in response order.
    pub fn tool_calls(&self) -> Vec<ToolCall> {
        self.items
            .iter()
            .filter_map(|item| match item {
                LlmItem::ToolCall(call) => Some(call.clone()),
                LlmItem::Message { .. } => None,
            })
            .collect()
    }
}

/// Result of one outbound notification delivery. Never an `Err`: delivery is
/// fire-and-log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SendOutcome {
    pub success: bool,
    pub error: Option<String>,
}

impl SendOutcome {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
        }
    }
}

/// Bus event: a new piece of content is ready for distribution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentReadyEvent {
    pub content_id: String,
    pub church_id: i64,
    pub title: Option<String>,
    pub speaker: Option<String>,
    pub service_date: Option<String>,
    pub summary_audience: Option<String>,
    /// Future fire time; when set, tickets start out `Scheduled`.
    pub schedule_at: Option<String>,
}

/// Bus event: an inbound Signal message from a (prospective) member.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundMessageEvent {
    pub sender: String,
    pub recipient: String,
    pub text: String,
    pub timestamp: Option<String>,
}

/// A feedback ticket raised through the `process_feedback` tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackTicket {
    pub id: String,
    pub kind: String,
    pub message: String,
    pub severity: String,
    pub member_id: String,
    pub member_name: Option<String>,
    pub phone: String,
    pub church_ids: Vec<i64>,
    pub created_at: String,
}

/// A sermon summary fetched from the content service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SermonSummary {
    pub content: String,
    pub reflection_questions: Option<Vec<String>>,
}

/// A church resolved by name lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChurchRef {
    pub id: i64,
    pub name: String,
}
