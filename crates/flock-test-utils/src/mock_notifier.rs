// SPDX-FileCopyrightText: 2026 Flock Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock notification channel with send capture.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use flock_core::types::SendOutcome;
use flock_core::NotificationChannel;

/// One captured outbound message.
#[derive(Debug, Clone, PartialEq)]
pub struct SentMessage {
    pub recipient: String,
    pub text: String,
    pub meta: serde_json::Value,
}

/// A mock notification channel that records every send.
///
/// By default every send succeeds; `fail_all` turns the channel into a
/// black hole that reports failure outcomes (it still records the sends).
pub struct MockNotifier {
    sent: Arc<Mutex<Vec<SentMessage>>>,
    fail_all: Arc<Mutex<bool>>,
}

impl MockNotifier {
    pub fn new() -> Self {
        Self {
            sent: Arc::new(Mutex::new(Vec::new())),
            fail_all: Arc::new(Mutex::new(false)),
        }
    }

    /// Make every subsequent send report a failure outcome.
    pub async fn fail_all(&self) {
        *self.fail_all.lock().await = true;
    }

    /// All captured sends, in order.
    pub async fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().await.clone()
    }

    /// Texts of all captured sends, in order.
    pub async fn sent_texts(&self) -> Vec<String> {
        self.sent.lock().await.iter().map(|m| m.text.clone()).collect()
    }
}

impl Default for MockNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NotificationChannel for MockNotifier {
    async fn send(&self, recipient: &str, text: &str, meta: serde_json::Value) -> SendOutcome {
        self.sent.lock().await.push(SentMessage {
            recipient: recipient.to_string(),
            text: text.to_string(),
            meta,
        });
        if *self.fail_all.lock().await {
            SendOutcome::failure("mock delivery failure")
        } else {
            SendOutcome::ok()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_sends_and_outcomes() {
        let notifier = MockNotifier::new();
        let outcome = notifier
            .send("+31612345678", "hello", serde_json::json!({}))
            .await;
        assert!(outcome.success);

        notifier.fail_all().await;
        let outcome = notifier
            .send("+31612345678", "again", serde_json::json!({}))
            .await;
        assert!(!outcome.success);

        let sent = notifier.sent().await;
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].text, "hello");
        assert_eq!(sent[1].text, "again");
    }
}
