// SPDX-FileCopyrightText: 2026 Flock Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `flock serve` and the one-shot operational commands.
//!
//! Wires the SQLite store, the OpenAI conversation service, the Signal
//! channel, and the content client into the distribution core, then runs the
//! periodic promote/process loop. Ctrl-C stops new batches; an in-flight
//! batch always finishes first.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info};

use flock_config::model::FlockConfig;
use flock_content::ContentClient;
use flock_core::types::ContentReadyEvent;
use flock_core::{ContentService, FlockError};
use flock_distribution::{
    release_ticket, retry_ticket, FanOut, Promoter, QueueProcessor, SessionManager,
    ToolDispatcher, ToolExecutor,
};
use flock_openai::OpenAiService;
use flock_signal::SignalClient;
use flock_storage::SqliteStore;

/// The wired-up service graph.
struct Services {
    store: Arc<SqliteStore>,
    processor: QueueProcessor,
    promoter: Promoter,
}

impl Services {
    async fn build(config: &FlockConfig) -> Result<Self, FlockError> {
        let store = Arc::new(SqliteStore::open(&config.storage.database_path).await?);

        let content: Arc<dyn ContentService> =
            Arc::new(ContentClient::new(config.content.service_url.clone())?);

        let api_key = config
            .openai
            .api_key
            .as_deref()
            .ok_or_else(|| FlockError::Config("openai.api_key is not set".to_string()))?;
        let llm = Arc::new(OpenAiService::new(
            api_key,
            config.openai.model.clone(),
            config.openai.base_url.clone(),
            content.clone(),
        )?);

        let service_url = config
            .signal
            .service_url
            .clone()
            .ok_or_else(|| FlockError::Config("signal.service_url is not set".to_string()))?;
        let sender_number = config
            .signal
            .sender_number
            .clone()
            .ok_or_else(|| FlockError::Config("signal.sender_number is not set".to_string()))?;
        let notifier = Arc::new(SignalClient::new(service_url, sender_number)?);

        let processor = QueueProcessor::new(
            store.clone(),
            store.clone(),
            store.clone(),
            llm.clone(),
            notifier,
            content.clone(),
            SessionManager::new(llm.clone()),
            ToolDispatcher::new(llm, ToolExecutor::new(content)),
            config.service.workers,
        );
        let promoter = Promoter::new(store.clone());

        Ok(Self {
            store,
            processor,
            promoter,
        })
    }

    /// One promote-then-process pass.
    async fn pass(&self, limit: usize) -> usize {
        match self.promoter.promote_due().await {
            Ok(promoted) if promoted > 0 => info!(promoted, "scheduled tickets promoted"),
            Ok(_) => {}
            Err(e) => error!(error = %e, "promoter pass failed"),
        }
        match self.processor.process_queue(limit).await {
            Ok(sent) => sent,
            Err(e) => {
                error!(error = %e, "queue pass failed");
                0
            }
        }
    }
}

/// Runs the periodic distribution loop until Ctrl-C.
pub async fn run_serve(config: FlockConfig) -> Result<(), FlockError> {
    let services = Services::build(&config).await?;
    let interval = Duration::from_secs(config.service.poll_interval_secs);
    info!(
        poll_interval_secs = config.service.poll_interval_secs,
        queue_limit = config.service.queue_limit,
        workers = config.service.workers,
        "starting flock serve"
    );

    loop {
        services.pass(config.service.queue_limit).await;

        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = tokio::signal::ctrl_c() => {
                info!("shutdown signal received");
                break;
            }
        }
    }

    services.store.database().clone().close().await?;
    info!("flock serve shutdown complete");
    Ok(())
}

/// Processes one batch of queued tickets and exits.
pub async fn run_process_queue(
    config: FlockConfig,
    limit: Option<usize>,
) -> Result<(), FlockError> {
    let limit = limit.unwrap_or(config.service.queue_limit);
    let services = Services::build(&config).await?;
    let sent = services.pass(limit).await;
    println!("processed {sent} ticket(s)");
    services.store.database().clone().close().await
}

/// Fans a content-ready event from a JSON file out into tickets.
pub async fn run_fan_out(config: FlockConfig, event_path: &Path) -> Result<(), FlockError> {
    let raw = std::fs::read_to_string(event_path)
        .map_err(|e| FlockError::Config(format!("cannot read {}: {e}", event_path.display())))?;
    let event: ContentReadyEvent = serde_json::from_str(&raw)
        .map_err(|e| FlockError::Config(format!("invalid content-ready event: {e}")))?;

    let store = Arc::new(SqliteStore::open(&config.storage.database_path).await?);
    let fanout = FanOut::new(store.clone(), store.clone());
    let created = fanout.fan_out(&event).await?;
    println!("created {created} ticket(s)");
    store.database().clone().close().await
}

/// Requeues an errored ticket.
pub async fn run_retry(config: FlockConfig, ticket_id: &str) -> Result<(), FlockError> {
    let store = Arc::new(SqliteStore::open(&config.storage.database_path).await?);
    let ticket = retry_ticket(store.as_ref(), ticket_id).await?;
    println!("ticket {} requeued (attempt {})", ticket.id, ticket.retry_count);
    store.database().clone().close().await
}

/// Releases a waiting ticket into the queue.
pub async fn run_release(config: FlockConfig, ticket_id: &str) -> Result<(), FlockError> {
    let store = Arc::new(SqliteStore::open(&config.storage.database_path).await?);
    let ticket = release_ticket(store.as_ref(), ticket_id).await?;
    println!("ticket {} released into the queue", ticket.id);
    store.database().clone().close().await
}
