// SPDX-FileCopyrightText: 2026 Flock Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the OpenAI Conversations and Responses endpoints.
//!
//! Provides [`OpenAiService`] which handles request construction,
//! authentication, transient error retry, and normalization of raw API
//! output into domain responses.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use flock_core::types::{LlmResponse, Member};
use flock_core::{ContentService, ConversationService, FlockError};

use crate::instructions::proactive_instructions;
use crate::toolset::build_toolset;
use crate::types::{
    ConversationCreated, ConversationItem, ConversationMetadata, ConversationRequest,
    InputItem, ResponsesApiResponse, ResponsesRequest,
};

/// Maximum request attempts per API call.
const MAX_ATTEMPTS: u32 = 3;

/// Base delay between attempts; grows linearly with the attempt number.
const RETRY_DELAY: Duration = Duration::from_millis(1000);

/// Client for the OpenAI Responses API.
///
/// Holds a content service handle for the vector store lookup that backs
/// file search; that lookup is non-fatal, a failure just disables file
/// search for the call.
pub struct OpenAiService {
    client: reqwest::Client,
    model: String,
    base_url: String,
    content: Arc<dyn ContentService>,
}

impl OpenAiService {
    /// Creates a new client.
    ///
    /// # Arguments
    /// * `api_key` - OpenAI API key for bearer authentication
    /// * `model` - Model identifier sent with every response request
    /// * `base_url` - API base, e.g. `https://api.openai.com/v1`
    pub fn new(
        api_key: &str,
        model: String,
        base_url: String,
        content: Arc<dyn ContentService>,
    ) -> Result<Self, FlockError> {
        let mut headers = HeaderMap::new();
        let bearer = format!("Bearer {api_key}");
        headers.insert(
            "authorization",
            HeaderValue::from_str(&bearer)
                .map_err(|e| FlockError::Config(format!("invalid API key header value: {e}")))?,
        );
        headers.insert("content-type", HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| FlockError::Provider {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
            content,
        })
    }

    /// Overrides the base URL (for testing with wiremock).
    #[cfg(test)]
    pub fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    /// Vector store for a church, or `None` when unknown or unreachable.
    async fn vector_store_for(&self, church_id: i64) -> Option<String> {
        match self.content.vector_store_id(church_id).await {
            Ok(id) => id,
            Err(e) => {
                warn!(church_id, error = %e, "vector store lookup failed, continuing without file search");
                None
            }
        }
    }

    /// POST a JSON body and decode the JSON response.
    ///
    /// Transient upstream failures (429, 5xx, network errors) are retried up
    /// to [`MAX_ATTEMPTS`] times with a linearly growing delay. Any other
    /// status fails immediately.
    async fn post_json<B: Serialize, R: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<R, FlockError> {
        let url = format!("{}{}", self.base_url, endpoint);
        let mut last_error = None;

        for attempt in 1..=MAX_ATTEMPTS {
            if attempt > 1 {
                warn!(attempt, endpoint, "retrying request after transient error");
                tokio::time::sleep(RETRY_DELAY * (attempt - 1)).await;
            }

            let response = match self.client.post(&url).json(body).send().await {
                Ok(response) => response,
                Err(e) => {
                    // Network errors are transient too.
                    last_error = Some(FlockError::Provider {
                        message: format!("HTTP request failed: {e}"),
                        source: Some(Box::new(e)),
                    });
                    continue;
                }
            };

            let status = response.status();
            debug!(status = %status, attempt, endpoint, "response received");

            if status.is_success() {
                let body = response.text().await.map_err(|e| FlockError::Provider {
                    message: format!("failed to read response body: {e}"),
                    source: Some(Box::new(e)),
                })?;
                return serde_json::from_str(&body).map_err(|e| FlockError::Provider {
                    message: format!("failed to parse API response: {e}"),
                    source: Some(Box::new(e)),
                });
            }

            let body = response.text().await.unwrap_or_default();
            if is_transient_error(status) {
                warn!(status = %status, body = %body, "transient error");
                last_error = Some(FlockError::provider(format!(
                    "API returned {status}: {body}"
                )));
                continue;
            }

            return Err(FlockError::provider(format!(
                "API returned {status}: {body}"
            )));
        }

        Err(last_error
            .unwrap_or_else(|| FlockError::provider("request failed after retries")))
    }
}

#[async_trait]
impl ConversationService for OpenAiService {
    async fn create_conversation(
        &self,
        member: &Member,
        opening_message: &str,
    ) -> Result<String, FlockError> {
        let request = ConversationRequest {
            metadata: ConversationMetadata {
                topic: member.phone_number.clone(),
            },
            items: vec![ConversationItem::assistant(opening_message)],
        };
        let created: ConversationCreated = self.post_json("/conversations", &request).await?;
        debug!(conversation_id = %created.id, member_id = %member.id, "conversation created");
        Ok(created.id)
    }

    async fn send_message(
        &self,
        conversation_id: &str,
        text: &str,
        church_id: i64,
        member: &Member,
    ) -> Result<LlmResponse, FlockError> {
        let vector_store = self.vector_store_for(church_id).await;
        let request = ResponsesRequest {
            model: self.model.clone(),
            conversation: conversation_id.to_string(),
            store: true,
            instructions: Some(proactive_instructions(member.target_group)),
            input: vec![InputItem::user_text(text)],
            tools: build_toolset(vector_store.as_deref()),
            tool_choice: "auto",
        };
        let raw: ResponsesApiResponse = self.post_json("/responses", &request).await?;
        Ok(raw.normalize())
    }

    async fn send_tool_output(
        &self,
        conversation_id: &str,
        call_id: &str,
        output: &serde_json::Value,
        _member: &Member,
        church_id: i64,
    ) -> Result<LlmResponse, FlockError> {
        let vector_store = self.vector_store_for(church_id).await;
        let encoded = serde_json::to_string(output)
            .map_err(|e| FlockError::Internal(format!("encoding tool output: {e}")))?;
        let request = ResponsesRequest {
            model: self.model.clone(),
            conversation: conversation_id.to_string(),
            store: true,
            instructions: None,
            input: vec![InputItem::function_call_output(call_id, encoded)],
            tools: build_toolset(vector_store.as_deref()),
            tool_choice: "auto",
        };
        let raw: ResponsesApiResponse = self.post_json("/responses", &request).await?;
        Ok(raw.normalize())
    }
}

/// Returns true for HTTP status codes that indicate transient errors worth retrying.
fn is_transient_error(status: reqwest::StatusCode) -> bool {
    status.as_u16() == 429 || status.is_server_error()
}
