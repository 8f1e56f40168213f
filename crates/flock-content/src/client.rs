// SPDX-FileCopyrightText: 2026 Flock Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the external content service.
//!
//! Implements the [`ContentService`] contract: every read is non-fatal, an
//! unreachable service or non-200 answer degrades to `Ok(None)` with a
//! warning so callers fall back to templated content.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{info, warn};

use flock_core::types::{ChurchRef, FeedbackTicket, SermonSummary};
use flock_core::{ContentService, FlockError};

#[derive(Debug, Deserialize)]
struct ContentDetailsBody {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SermonSummaryBody {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    reflection_questions: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct VectorStoreBody {
    #[serde(default)]
    vector_store_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChurchSearchBody {
    #[serde(default)]
    data: Vec<ChurchRef>,
}

/// Client for the content service HTTP API.
#[derive(Debug, Clone)]
pub struct ContentClient {
    client: reqwest::Client,
    service_url: String,
}

impl ContentClient {
    pub fn new(service_url: String) -> Result<Self, FlockError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| FlockError::Internal(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            service_url: service_url.trim_end_matches('/').to_string(),
        })
    }

    /// GET a JSON body; `Ok(None)` for 404, upstream errors, and transport
    /// failures (logged).
    async fn get_json<R: serde::de::DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, &str)],
    ) -> Option<R> {
        let url = format!("{}{}", self.service_url, endpoint);
        let response = match self.client.get(&url).query(query).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(endpoint, error = %e, "content service unreachable");
                return None;
            }
        };

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return None;
        }
        if !status.is_success() {
            warn!(endpoint, status = %status, "content service request failed");
            return None;
        }

        match response.json::<R>().await {
            Ok(body) => Some(body),
            Err(e) => {
                warn!(endpoint, error = %e, "content service returned malformed body");
                None
            }
        }
    }
}

#[async_trait]
impl ContentService for ContentClient {
    async fn content_details(
        &self,
        content_id: &str,
        audience: Option<&str>,
    ) -> Result<Option<String>, FlockError> {
        let endpoint = format!("/api/v1/content/{content_id}");
        let query: Vec<(&str, &str)> = audience.map(|a| ("audience", a)).into_iter().collect();
        let body: Option<ContentDetailsBody> = self.get_json(&endpoint, &query).await;
        Ok(body.and_then(|b| b.content).filter(|c| !c.is_empty()))
    }

    async fn sermon_summary(
        &self,
        content_id: &str,
        audience: &str,
    ) -> Result<Option<SermonSummary>, FlockError> {
        let endpoint = format!("/api/v1/sermons/{content_id}/summary");
        let body: Option<SermonSummaryBody> =
            self.get_json(&endpoint, &[("audience", audience)]).await;
        Ok(body.and_then(|b| {
            b.content.map(|content| SermonSummary {
                content,
                reflection_questions: b.reflection_questions,
            })
        }))
    }

    async fn church_by_name(&self, name: &str) -> Result<Option<ChurchRef>, FlockError> {
        let body: Option<ChurchSearchBody> = self
            .get_json("/api/v1/churches/search", &[("name", name)])
            .await;
        let Some(body) = body else { return Ok(None) };

        // Prefer a case-insensitive substring match, then the first result.
        let needle = name.to_lowercase();
        let matched = body
            .data
            .iter()
            .find(|c| c.name.to_lowercase().contains(&needle))
            .or_else(|| body.data.first())
            .cloned();
        Ok(matched)
    }

    async fn vector_store_id(&self, church_id: i64) -> Result<Option<String>, FlockError> {
        let endpoint = format!("/api/v1/vector-store/{church_id}");
        let body: Option<VectorStoreBody> = self.get_json(&endpoint, &[]).await;
        Ok(body.and_then(|b| b.vector_store_id))
    }

    async fn submit_feedback(&self, ticket: &FeedbackTicket) -> Result<bool, FlockError> {
        let url = format!("{}/api/v1/feedback", self.service_url);
        let response = match self.client.post(&url).json(ticket).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(feedback_id = %ticket.id, error = %e, "feedback submission failed");
                return Ok(false);
            }
        };

        if response.status().is_success() {
            info!(feedback_id = %ticket.id, "feedback submitted");
            Ok(true)
        } else {
            warn!(feedback_id = %ticket.id, status = %response.status(), "feedback rejected");
            Ok(false)
        }
    }
}
