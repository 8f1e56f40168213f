// SPDX-FileCopyrightText: 2026 Flock Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the Signal bridge service.
//!
//! Delivery is fire-and-log per the [`NotificationChannel`] contract: every
//! transport or status error is folded into the returned [`SendOutcome`].

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{info, warn};

use flock_core::types::SendOutcome;
use flock_core::{FlockError, NotificationChannel};

use crate::phone::normalize_phone_number;

#[derive(Debug, Serialize)]
struct SendPayload<'a> {
    from: &'a str,
    to: String,
    message: &'a str,
    metadata: serde_json::Value,
}

/// Client for the Signal bridge's send endpoint.
#[derive(Debug, Clone)]
pub struct SignalClient {
    client: reqwest::Client,
    service_url: String,
    sender_number: String,
}

impl SignalClient {
    pub fn new(service_url: String, sender_number: String) -> Result<Self, FlockError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| FlockError::Channel {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;
        Ok(Self {
            client,
            service_url: service_url.trim_end_matches('/').to_string(),
            sender_number,
        })
    }
}

#[async_trait]
impl NotificationChannel for SignalClient {
    async fn send(&self, recipient: &str, text: &str, meta: serde_json::Value) -> SendOutcome {
        let payload = SendPayload {
            from: &self.sender_number,
            to: normalize_phone_number(recipient),
            message: text,
            metadata: meta,
        };
        let url = format!("{}/api/v1/send", self.service_url);

        let response = match self.client.post(&url).json(&payload).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(recipient, error = %e, "signal send failed");
                return SendOutcome::failure(format!("signal request failed: {e}"));
            }
        };

        let status = response.status();
        if status.is_success() {
            info!(recipient, message_length = text.len(), "message sent via signal bridge");
            SendOutcome::ok()
        } else {
            let body = response.text().await.unwrap_or_default();
            warn!(recipient, status = %status, body = %body, "signal bridge rejected send");
            SendOutcome::failure(format!("signal bridge returned {status}"))
        }
    }
}
