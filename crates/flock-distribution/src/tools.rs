// SPDX-FileCopyrightText: 2026 Flock Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The fixed tool set the assistant may call, and its executor.
//!
//! Tool names arrive as free-form strings from the LLM and are parsed into
//! the closed [`ToolKind`] enum at the boundary; an unknown name yields a
//! structured failure result, never a panic. Required arguments are checked
//! against a fixed per-tool table before execution.

use std::str::FromStr;

use serde::Serialize;
use serde_json::{json, Map, Value};
use strum::{Display, EnumString};
use tracing::{error, info, warn};

use flock_core::types::{now_rfc3339, FeedbackTicket, Member, TargetGroup};
use flock_core::ContentService;

/// The closed set of tools exposed to the assistant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum ToolKind {
    ManageUser,
    HandleSermon,
    ManageSubscription,
    AnswerQuestion,
    ProcessFeedback,
}

impl ToolKind {
    /// Arguments that must be present (and non-null) before execution.
    pub fn required_args(self) -> &'static [&'static str] {
        match self {
            ToolKind::ManageUser => &[],
            ToolKind::HandleSermon => &["action"],
            ToolKind::ManageSubscription => &["action"],
            ToolKind::AnswerQuestion => &["question", "category"],
            ToolKind::ProcessFeedback => &["kind", "message"],
        }
    }
}

/// Result of one tool execution, fed back to the conversation verbatim.
#[derive(Debug, Clone, Serialize)]
pub struct ToolOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ToolOutcome {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            error: None,
            extra: Map::new(),
        }
    }

    pub fn ok_with(message: impl Into<String>, extra: Map<String, Value>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            error: None,
            extra,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: None,
            error: Some(error.into()),
            extra: Map::new(),
        }
    }
}

/// Executes tool calls against a member's typed state.
///
/// Mutations are applied to the borrowed member in place; persistence is the
/// caller's responsibility (ticket and member are saved together at the end
/// of a processing pass).
pub struct ToolExecutor {
    content: std::sync::Arc<dyn ContentService>,
}

impl ToolExecutor {
    pub fn new(content: std::sync::Arc<dyn ContentService>) -> Self {
        Self { content }
    }

    /// Parses, validates, and executes one tool call.
    ///
    /// Never fails: unknown tools, malformed arguments, and unexpected
    /// execution errors all come back as failure outcomes.
    pub async fn run(&self, name: &str, arguments: &str, member: &mut Member) -> ToolOutcome {
        let Ok(kind) = ToolKind::from_str(name) else {
            warn!(tool = name, "unknown tool requested");
            return ToolOutcome::failure(format!("Unknown tool: {name}"));
        };
        let args: Value = match serde_json::from_str(arguments) {
            Ok(Value::Object(map)) => Value::Object(map),
            Ok(_) => return ToolOutcome::failure("Tool arguments must be a JSON object"),
            Err(e) => return ToolOutcome::failure(format!("Invalid tool arguments: {e}")),
        };
        for required in kind.required_args() {
            if args.get(*required).is_none_or(Value::is_null) {
                return ToolOutcome::failure(format!("Missing required argument: {required}"));
            }
        }
        match kind {
            ToolKind::ManageUser => self.manage_user(&args, member).await,
            ToolKind::HandleSermon => self.handle_sermon(&args, member).await,
            ToolKind::ManageSubscription => self.manage_subscription(&args, member),
            ToolKind::AnswerQuestion => self.answer_question(&args, member),
            ToolKind::ProcessFeedback => self.process_feedback(&args, member).await,
        }
    }

    async fn manage_user(&self, args: &Value, member: &mut Member) -> ToolOutcome {
        let mut updated = Vec::new();

        if let Some(name) = str_arg(args, "first_name") {
            member.first_name = Some(name.to_string());
            updated.push("name");
        }
        if let Some(age) = args.get("age").and_then(Value::as_i64) {
            member.age = Some(age);
            updated.push("age");
        }
        if let Some(group) = str_arg(args, "target_group") {
            match TargetGroup::from_str(group) {
                Ok(group) => {
                    member.target_group = Some(group);
                    updated.push("target group");
                }
                Err(_) => {
                    return ToolOutcome::failure(format!("Unknown target group: {group}"));
                }
            }
        }
        if let Some(church_name) = str_arg(args, "church") {
            match self.content.church_by_name(church_name).await {
                Ok(Some(church)) => {
                    if !member.is_member_of(church.id) {
                        member.church_ids.push(church.id);
                    }
                    updated.push("church");
                }
                Ok(None) => {
                    return ToolOutcome::failure(format!("Church not found: {church_name}"));
                }
                Err(e) => {
                    error!(error = %e, church = church_name, "church lookup failed");
                    return ToolOutcome::failure("Could not look up the church right now");
                }
            }
        }

        // The intake is complete once we know who we are talking to.
        if !member.intake_completed && member.first_name.is_some() && member.age.is_some() {
            member.intake_completed = true;
            updated.push("intake completed");
        }
        member.updated_at = now_rfc3339();

        if updated.is_empty() {
            ToolOutcome::ok("Nothing to update")
        } else {
            ToolOutcome::ok(format!("Updated: {}", updated.join(", ")))
        }
    }

    async fn handle_sermon(&self, args: &Value, member: &mut Member) -> ToolOutcome {
        let action = str_arg(args, "action").unwrap_or_default();
        match action {
            "get_summary" => {
                let Some(content_id) = member.active_content_id.clone() else {
                    return ToolOutcome::failure("No active sermon for this member");
                };
                let audience = member
                    .target_group
                    .map(|g| g.to_string())
                    .unwrap_or_else(|| "adult".to_string());
                match self.content.sermon_summary(&content_id, &audience).await {
                    Ok(Some(summary)) => {
                        let mut extra = Map::new();
                        extra.insert("summary".into(), json!(summary.content));
                        if let Some(questions) = summary.reflection_questions {
                            extra.insert("reflection_questions".into(), json!(questions));
                        }
                        ToolOutcome::ok_with("Summary retrieved", extra)
                    }
                    Ok(None) => ToolOutcome::failure("No summary available for this sermon"),
                    Err(e) => {
                        error!(error = %e, content_id, "sermon summary fetch failed");
                        ToolOutcome::failure("Could not fetch the summary right now")
                    }
                }
            }
            "register_attendance" => {
                member.last_attendance_at = Some(now_rfc3339());
                member.updated_at = now_rfc3339();
                let online = args.get("online").and_then(Value::as_bool).unwrap_or(false);
                if online {
                    ToolOutcome::ok("Online attendance registered")
                } else {
                    ToolOutcome::ok("Attendance registered")
                }
            }
            "register_absence" => match str_arg(args, "alternative_church") {
                Some(other) => ToolOutcome::ok(format!(
                    "Absence registered; attended {other} instead"
                )),
                None => ToolOutcome::ok("Absence registered"),
            },
            other => ToolOutcome::failure(format!("Unknown action: {other}")),
        }
    }

    fn manage_subscription(&self, args: &Value, member: &mut Member) -> ToolOutcome {
        let action = str_arg(args, "action").unwrap_or_default();
        let outcome = match action {
            "pause" => {
                member.paused_until = str_arg(args, "pause_until").map(str::to_string);
                match &member.paused_until {
                    Some(until) => ToolOutcome::ok(format!("Notifications paused until {until}")),
                    None => ToolOutcome::ok("Notifications paused"),
                }
            }
            "resume" => {
                member.paused_until = None;
                member.notify_new_content = true;
                member.notify_reflection = true;
                ToolOutcome::ok("Notifications resumed")
            }
            "change_frequency" => {
                let Some(frequency) = str_arg(args, "frequency") else {
                    return ToolOutcome::failure("Missing required argument: frequency");
                };
                member.notification_frequency = Some(frequency.to_string());
                if frequency == "never" {
                    member.notify_new_content = false;
                    member.notify_reflection = false;
                }
                ToolOutcome::ok(format!("Notification frequency set to {frequency}"))
            }
            "unsubscribe" => {
                member.notify_new_content = false;
                member.notify_reflection = false;
                member.unsubscribe_reason = str_arg(args, "reason").map(str::to_string);
                member.unsubscribed_at = Some(now_rfc3339());
                ToolOutcome::ok("Unsubscribed from all notifications")
            }
            other => return ToolOutcome::failure(format!("Unknown action: {other}")),
        };
        member.updated_at = now_rfc3339();
        outcome
    }

    fn answer_question(&self, args: &Value, member: &Member) -> ToolOutcome {
        let question = str_arg(args, "question").unwrap_or_default();
        let category = str_arg(args, "category").unwrap_or_default();
        let vector_search = args
            .get("use_vector_search")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        info!(
            member_id = %member.id,
            category,
            vector_search,
            question,
            "member question"
        );
        let mut extra = Map::new();
        extra.insert("category".into(), json!(category));
        extra.insert("vector_search".into(), json!(vector_search));
        ToolOutcome::ok_with("Question logged", extra)
    }

    async fn process_feedback(&self, args: &Value, member: &Member) -> ToolOutcome {
        let kind = str_arg(args, "kind").unwrap_or_default();
        let message = str_arg(args, "message").unwrap_or_default();
        let severity = str_arg(args, "severity").unwrap_or("normal");
        if severity == "high" {
            warn!(member_id = %member.id, kind, message, "high-severity feedback");
        }
        let ticket = FeedbackTicket {
            id: uuid::Uuid::new_v4().to_string(),
            kind: kind.to_string(),
            message: message.to_string(),
            severity: severity.to_string(),
            member_id: member.id.clone(),
            member_name: member.first_name.clone(),
            phone: member.phone_number.clone(),
            church_ids: member.church_ids.clone(),
            created_at: now_rfc3339(),
        };
        let submitted = match self.content.submit_feedback(&ticket).await {
            Ok(submitted) => submitted,
            Err(e) => {
                error!(error = %e, ticket_id = %ticket.id, "feedback submission failed");
                false
            }
        };
        let mut extra = Map::new();
        extra.insert("ticket_id".into(), json!(ticket.id));
        extra.insert("submitted".into(), json!(submitted));
        if submitted {
            ToolOutcome::ok_with("Feedback recorded", extra)
        } else {
            ToolOutcome::ok_with(
                "Feedback recorded, but could not be forwarded yet",
                extra,
            )
        }
    }
}

fn str_arg<'a>(args: &'a Value, key: &str) -> Option<&'a str> {
    args.get(key).and_then(Value::as_str).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use flock_core::types::ChurchRef;
    use flock_test_utils::MockContentService;

    fn executor() -> (ToolExecutor, Arc<MockContentService>) {
        let content = Arc::new(MockContentService::new());
        (ToolExecutor::new(content.clone()), content)
    }

    fn member() -> Member {
        Member::new("+31612345678")
    }

    #[tokio::test]
    async fn unknown_tool_is_a_structured_failure() {
        let (executor, _) = executor();
        let mut m = member();
        let outcome = executor.run("launch_missiles", "{}", &mut m).await;
        assert!(!outcome.success);
        assert_eq!(
            outcome.error.as_deref(),
            Some("Unknown tool: launch_missiles")
        );
    }

    #[tokio::test]
    async fn missing_required_argument_is_rejected() {
        let (executor, _) = executor();
        let mut m = member();
        let outcome = executor.run("handle_sermon", "{}", &mut m).await;
        assert!(!outcome.success);
        assert_eq!(
            outcome.error.as_deref(),
            Some("Missing required argument: action")
        );
    }

    #[tokio::test]
    async fn malformed_arguments_are_rejected() {
        let (executor, _) = executor();
        let mut m = member();
        let outcome = executor.run("manage_user", "not json", &mut m).await;
        assert!(!outcome.success);

        let outcome = executor.run("manage_user", "[1,2]", &mut m).await;
        assert!(!outcome.success);
    }

    #[tokio::test]
    async fn manage_user_completes_intake_once_name_and_age_known() {
        let (executor, _) = executor();
        let mut m = member();
        assert!(!m.intake_completed);

        let outcome = executor
            .run("manage_user", r#"{"first_name":"Anna"}"#, &mut m)
            .await;
        assert!(outcome.success);
        assert!(!m.intake_completed);

        let outcome = executor.run("manage_user", r#"{"age":34}"#, &mut m).await;
        assert!(outcome.success);
        assert!(m.intake_completed);
        assert_eq!(m.first_name.as_deref(), Some("Anna"));
        assert_eq!(m.age, Some(34));
    }

    #[tokio::test]
    async fn manage_user_resolves_church_by_name() {
        let (executor, content) = executor();
        content
            .set_church(ChurchRef {
                id: 42,
                name: "Hope Church".into(),
            })
            .await;
        let mut m = member();

        let outcome = executor
            .run("manage_user", r#"{"church":"Hope"}"#, &mut m)
            .await;
        assert!(outcome.success);
        assert_eq!(m.church_ids, vec![42]);

        // Re-registering the same church is not duplicated.
        executor
            .run("manage_user", r#"{"church":"Hope"}"#, &mut m)
            .await;
        assert_eq!(m.church_ids, vec![42]);
    }

    #[tokio::test]
    async fn manage_user_rejects_unknown_church() {
        let (executor, _) = executor();
        let mut m = member();
        let outcome = executor
            .run("manage_user", r#"{"church":"Nowhere"}"#, &mut m)
            .await;
        assert!(!outcome.success);
        assert!(m.church_ids.is_empty());
    }

    #[tokio::test]
    async fn handle_sermon_summary_requires_active_content() {
        let (executor, _) = executor();
        let mut m = member();
        let outcome = executor
            .run("handle_sermon", r#"{"action":"get_summary"}"#, &mut m)
            .await;
        assert!(!outcome.success);
    }

    #[tokio::test]
    async fn handle_sermon_attendance_sets_timestamp() {
        let (executor, _) = executor();
        let mut m = member();
        let outcome = executor
            .run(
                "handle_sermon",
                r#"{"action":"register_attendance","online":true}"#,
                &mut m,
            )
            .await;
        assert!(outcome.success);
        assert_eq!(outcome.message.as_deref(), Some("Online attendance registered"));
        assert!(m.last_attendance_at.is_some());
    }

    #[tokio::test]
    async fn subscription_never_frequency_disables_notifications() {
        let (executor, _) = executor();
        let mut m = member();
        let outcome = executor
            .run(
                "manage_subscription",
                r#"{"action":"change_frequency","frequency":"never"}"#,
                &mut m,
            )
            .await;
        assert!(outcome.success);
        assert!(!m.notify_new_content);
        assert!(!m.notify_reflection);

        let outcome = executor
            .run("manage_subscription", r#"{"action":"resume"}"#, &mut m)
            .await;
        assert!(outcome.success);
        assert!(m.notify_new_content);
        assert!(m.notify_reflection);
    }

    #[tokio::test]
    async fn unsubscribe_records_reason_and_date() {
        let (executor, _) = executor();
        let mut m = member();
        let outcome = executor
            .run(
                "manage_subscription",
                r#"{"action":"unsubscribe","reason":"moving away"}"#,
                &mut m,
            )
            .await;
        assert!(outcome.success);
        assert!(!m.notify_new_content);
        assert_eq!(m.unsubscribe_reason.as_deref(), Some("moving away"));
        assert!(m.unsubscribed_at.is_some());
    }

    #[tokio::test]
    async fn feedback_is_submitted_to_the_content_service() {
        let (executor, content) = executor();
        let mut m = member();
        let outcome = executor
            .run(
                "process_feedback",
                r#"{"kind":"complaint","message":"audio was bad","severity":"high"}"#,
                &mut m,
            )
            .await;
        assert!(outcome.success);
        assert_eq!(outcome.extra.get("submitted"), Some(&json!(true)));

        let feedback = content.feedback().await;
        assert_eq!(feedback.len(), 1);
        assert_eq!(feedback[0].kind, "complaint");
        assert_eq!(feedback[0].severity, "high");
    }

    #[tokio::test]
    async fn feedback_submission_failure_is_non_fatal() {
        let (executor, content) = executor();
        content.reject_feedback().await;
        let mut m = member();
        let outcome = executor
            .run(
                "process_feedback",
                r#"{"kind":"idea","message":"more youth events"}"#,
                &mut m,
            )
            .await;
        assert!(outcome.success);
        assert_eq!(outcome.extra.get("submitted"), Some(&json!(false)));
    }

    #[test]
    fn tool_names_parse_into_the_closed_set() {
        assert_eq!(
            ToolKind::from_str("manage_user").unwrap(),
            ToolKind::ManageUser
        );
        assert_eq!(
            ToolKind::from_str("process_feedback").unwrap(),
            ToolKind::ProcessFeedback
        );
        assert!(ToolKind::from_str("bogus").is_err());
        assert_eq!(ToolKind::AnswerQuestion.required_args(), &["question", "category"]);
    }
}
