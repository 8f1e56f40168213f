// SPDX-FileCopyrightText: 2026 Flock Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Flock backend.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup.

use serde::{Deserialize, Serialize};

/// Top-level Flock configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable
/// overrides. All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FlockConfig {
    /// Service-level behavior (logging, queue sizing, polling).
    #[serde(default)]
    pub service: ServiceConfig,

    /// OpenAI Responses API settings.
    #[serde(default)]
    pub openai: OpenAiConfig,

    /// Signal send service settings.
    #[serde(default)]
    pub signal: SignalConfig,

    /// Content detail service settings.
    #[serde(default)]
    pub content: ContentConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Service-level behavior configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Maximum tickets drained per processing pass.
    #[serde(default = "default_queue_limit")]
    pub queue_limit: usize,

    /// Seconds between processing passes in `serve` mode.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Bounded ticket-processing parallelism within one pass.
    /// 1 preserves strict oldest-first ordering.
    #[serde(default = "default_workers")]
    pub workers: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            queue_limit: default_queue_limit(),
            poll_interval_secs: default_poll_interval_secs(),
            workers: default_workers(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_queue_limit() -> usize {
    10
}

fn default_poll_interval_secs() -> u64 {
    5
}

fn default_workers() -> usize {
    1
}

/// OpenAI Responses API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OpenAiConfig {
    /// API key. `None` requires the `OPENAI_API_KEY` environment variable.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Model identifier for conversation responses.
    #[serde(default = "default_openai_model")]
    pub model: String,

    /// API base URL (overridable for testing).
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_openai_model(),
            base_url: default_openai_base_url(),
        }
    }
}

fn default_openai_model() -> String {
    "gpt-5-nano".to_string()
}

fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

/// Signal send service configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SignalConfig {
    /// Base URL of the Signal send service. `None` disables delivery.
    #[serde(default)]
    pub service_url: Option<String>,

    /// Sender phone number (E.164).
    #[serde(default)]
    pub sender_number: Option<String>,
}

/// Content detail service configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ContentConfig {
    /// Base URL of the content service.
    #[serde(default = "default_content_url")]
    pub service_url: String,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            service_url: default_content_url(),
        }
    }
}

fn default_content_url() -> String {
    "http://church-content-service:8101".to_string()
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

fn default_database_path() -> String {
    "flock.db".to_string()
}
