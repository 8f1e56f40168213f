// SPDX-FileCopyrightText: 2026 Flock Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock content service with configurable lookup results.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use flock_core::types::{ChurchRef, FeedbackTicket, SermonSummary};
use flock_core::{ContentService, FlockError};

/// A mock content service.
///
/// All lookups default to `Ok(None)` (the contract's "unavailable" answer);
/// individual results can be configured per test. Feedback submissions are
/// captured for assertion.
pub struct MockContentService {
    details: Arc<Mutex<Option<String>>>,
    summary: Arc<Mutex<Option<SermonSummary>>>,
    church: Arc<Mutex<Option<ChurchRef>>>,
    vector_store: Arc<Mutex<Option<String>>>,
    accept_feedback: Arc<Mutex<bool>>,
    feedback: Arc<Mutex<Vec<FeedbackTicket>>>,
}

impl MockContentService {
    pub fn new() -> Self {
        Self {
            details: Arc::new(Mutex::new(None)),
            summary: Arc::new(Mutex::new(None)),
            church: Arc::new(Mutex::new(None)),
            vector_store: Arc::new(Mutex::new(None)),
            accept_feedback: Arc::new(Mutex::new(true)),
            feedback: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub async fn set_details(&self, details: &str) {
        *self.details.lock().await = Some(details.to_string());
    }

    pub async fn set_summary(&self, summary: SermonSummary) {
        *self.summary.lock().await = Some(summary);
    }

    pub async fn set_church(&self, church: ChurchRef) {
        *self.church.lock().await = Some(church);
    }

    pub async fn set_vector_store(&self, id: &str) {
        *self.vector_store.lock().await = Some(id.to_string());
    }

    pub async fn reject_feedback(&self) {
        *self.accept_feedback.lock().await = false;
    }

    /// All captured feedback tickets, in order.
    pub async fn feedback(&self) -> Vec<FeedbackTicket> {
        self.feedback.lock().await.clone()
    }
}

impl Default for MockContentService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContentService for MockContentService {
    async fn content_details(
        &self,
        _content_id: &str,
        _audience: Option<&str>,
    ) -> Result<Option<String>, FlockError> {
        Ok(self.details.lock().await.clone())
    }

    async fn sermon_summary(
        &self,
        _content_id: &str,
        _audience: &str,
    ) -> Result<Option<SermonSummary>, FlockError> {
        Ok(self.summary.lock().await.clone())
    }

    async fn church_by_name(&self, _name: &str) -> Result<Option<ChurchRef>, FlockError> {
        Ok(self.church.lock().await.clone())
    }

    async fn vector_store_id(&self, _church_id: i64) -> Result<Option<String>, FlockError> {
        Ok(self.vector_store.lock().await.clone())
    }

    async fn submit_feedback(&self, ticket: &FeedbackTicket) -> Result<bool, FlockError> {
        self.feedback.lock().await.push(ticket.clone());
        Ok(*self.accept_feedback.lock().await)
    }
}
