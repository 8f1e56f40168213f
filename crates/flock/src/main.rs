// SPDX-FileCopyrightText: 2026 Flock Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Flock - church-chat content distribution over Signal.
//!
//! This is the binary entry point for the Flock service.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod serve;

/// Flock - church-chat content distribution over Signal.
#[derive(Parser, Debug)]
#[command(name = "flock", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the distribution service: promote, process, sleep, repeat.
    Serve,
    /// Process one batch of queued tickets and exit.
    ProcessQueue {
        /// Maximum number of tickets to process.
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Fan a content-ready event (JSON file) out into tickets.
    FanOut {
        /// Path to the event JSON.
        event: PathBuf,
    },
    /// Requeue an errored ticket.
    Retry {
        /// Id of the ticket to retry.
        ticket_id: String,
    },
    /// Release a waiting (multi-church) ticket into the queue.
    Release {
        /// Id of the ticket to release.
        ticket_id: String,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match flock_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            eprintln!("flock: invalid configuration");
            for error in errors {
                eprintln!("  - {error}");
            }
            std::process::exit(1);
        }
    };

    init_tracing(&config.service.log_level);

    let result = match cli.command {
        Some(Commands::Serve) => serve::run_serve(config).await,
        Some(Commands::ProcessQueue { limit }) => serve::run_process_queue(config, limit).await,
        Some(Commands::FanOut { event }) => serve::run_fan_out(config, &event).await,
        Some(Commands::Retry { ticket_id }) => serve::run_retry(config, &ticket_id).await,
        Some(Commands::Release { ticket_id }) => serve::run_release(config, &ticket_id).await,
        None => {
            println!("flock: use --help for available commands");
            return;
        }
    };

    if let Err(e) = result {
        eprintln!("flock: {e}");
        std::process::exit(1);
    }
}

fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{log_level},hyper=warn,reqwest=warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}

#[cfg(test)]
mod tests {
    #[test]
    fn binary_loads_config_defaults() {
        // Defaults alone must form a valid configuration.
        let config = flock_config::load_and_validate()
            .expect("default config should be valid");
        assert_eq!(config.service.log_level, "info");
        assert_eq!(config.service.workers, 1);
    }
}
