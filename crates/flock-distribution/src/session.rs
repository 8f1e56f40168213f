// SPDX-FileCopyrightText: 2026 Flock Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation session management.
//!
//! Conversations are scoped to content, not to members: a member talks about
//! one content item at a time, and a new item replaces the old conversation
//! handle outright.

use std::sync::Arc;

use tracing::debug;

use flock_core::types::{now_rfc3339, Member};
use flock_core::{ConversationService, FlockError};

pub struct SessionManager {
    llm: Arc<dyn ConversationService>,
}

impl SessionManager {
    pub fn new(llm: Arc<dyn ConversationService>) -> Self {
        Self { llm }
    }

    /// Resolves the conversation for `(member, content_id)`.
    ///
    /// Reuses the stored handle when the member's active content matches;
    /// otherwise creates a fresh conversation seeded with `opening` and
    /// stores the new handle and content id on the member (the caller
    /// persists the member). Returns the handle and whether it is fresh.
    pub async fn ensure_conversation(
        &self,
        member: &mut Member,
        content_id: &str,
        opening: &str,
    ) -> Result<(String, bool), FlockError> {
        if let (Some(conversation_id), Some(active)) =
            (&member.conversation_id, &member.active_content_id)
        {
            if active == content_id {
                return Ok((conversation_id.clone(), false));
            }
        }

        let conversation_id = self.llm.create_conversation(member, opening).await?;
        debug!(member_id = %member.id, content_id, conversation_id, "created conversation");
        member.conversation_id = Some(conversation_id.clone());
        member.active_content_id = Some(content_id.to_string());
        member.updated_at = now_rfc3339();
        Ok((conversation_id, true))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flock_test_utils::{LlmCall, MockLlm};

    #[tokio::test]
    async fn creates_when_member_has_no_conversation() {
        let llm = Arc::new(MockLlm::new());
        let sessions = SessionManager::new(llm.clone());
        let mut member = Member::new("+31612345678");

        let (conv, created) = sessions
            .ensure_conversation(&mut member, "sermon-1", "welcome")
            .await
            .unwrap();
        assert!(created);
        assert_eq!(member.conversation_id.as_deref(), Some(conv.as_str()));
        assert_eq!(member.active_content_id.as_deref(), Some("sermon-1"));

        let calls = llm.calls().await;
        assert_eq!(
            calls[0],
            LlmCall::CreateConversation {
                member_id: member.id.clone(),
                opening_message: "welcome".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn reuses_for_the_same_content() {
        let llm = Arc::new(MockLlm::new());
        let sessions = SessionManager::new(llm.clone());
        let mut member = Member::new("+31612345678");
        member.conversation_id = Some("conv-old".to_string());
        member.active_content_id = Some("sermon-1".to_string());

        let (conv, created) = sessions
            .ensure_conversation(&mut member, "sermon-1", "welcome")
            .await
            .unwrap();
        assert!(!created);
        assert_eq!(conv, "conv-old");
        assert!(llm.calls().await.is_empty());
    }

    #[tokio::test]
    async fn new_content_replaces_the_conversation() {
        let llm = Arc::new(MockLlm::new());
        let sessions = SessionManager::new(llm.clone());
        let mut member = Member::new("+31612345678");
        member.conversation_id = Some("conv-old".to_string());
        member.active_content_id = Some("sermon-1".to_string());

        let (conv, created) = sessions
            .ensure_conversation(&mut member, "sermon-2", "new content")
            .await
            .unwrap();
        assert!(created);
        assert_ne!(conv, "conv-old");
        assert_eq!(member.conversation_id.as_deref(), Some(conv.as_str()));
        assert_eq!(member.active_content_id.as_deref(), Some("sermon-2"));
    }
}
