// SPDX-FileCopyrightText: 2026 Flock Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Content detail service contract.

use async_trait::async_trait;

use crate::error::FlockError;
use crate::types::{ChurchRef, FeedbackTicket, SermonSummary};

/// Read access to the external content service.
///
/// Every lookup is non-fatal by contract: absence and upstream failure both
/// surface as `Ok(None)` (implementations log the failure); callers fall
/// back to templated content.
#[async_trait]
pub trait ContentService: Send + Sync {
    /// A richer, audience-tailored rendition of a content item, when one
    /// is available.
    async fn content_details(
        &self,
        content_id: &str,
        audience: Option<&str>,
    ) -> Result<Option<String>, FlockError>;

    async fn sermon_summary(
        &self,
        content_id: &str,
        audience: &str,
    ) -> Result<Option<SermonSummary>, FlockError>;

    async fn church_by_name(&self, name: &str) -> Result<Option<ChurchRef>, FlockError>;

    /// Vector store backing a church's sermon corpus, for file search.
    async fn vector_store_id(&self, church_id: i64) -> Result<Option<String>, FlockError>;

    /// Submits a feedback ticket; `false` means the submission did not land
    /// (non-fatal, the caller reports it in its result).
    async fn submit_feedback(&self, ticket: &FeedbackTicket) -> Result<bool, FlockError>;
}
