// SPDX-FileCopyrightText: 2026 Wiser Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wiser - offline message queue and sync client.
//!
//! This is the binary entry point for the Wiser sync client.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod host;
mod queue;
mod serve;
mod status;
mod sync;

use clap::{Parser, Subcommand};
use tracing::error;
use wiser_core::types::Role;

use crate::queue::EnqueueArgs;

/// Wiser - offline message queue and sync client.
#[derive(Parser, Debug)]
#[command(name = "wiser", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Queue a chat message for the next sync.
    Enqueue {
        /// Conversation the message belongs to.
        #[arg(long = "chat")]
        chat_id: String,
        /// Message author: user or assistant.
        #[arg(long)]
        role: Role,
        /// Conversation mode label.
        #[arg(long)]
        mode: Option<String>,
        /// Use this id instead of a generated one.
        #[arg(long)]
        id: Option<String>,
        /// Message text.
        content: String,
    },
    /// List queued messages.
    List {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Remove one queued message without syncing it.
    Remove {
        /// Message id.
        id: String,
    },
    /// Remove every queued message without syncing.
    Clear,
    /// Sync queued messages to the backend now.
    Sync,
    /// Run the sync runner until interrupted.
    Serve {
        /// Start in the offline state until the host reports `online`.
        #[arg(long)]
        offline: bool,
    },
    /// Show queue size and sync readiness.
    Status {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
        /// Disable colors.
        #[arg(long)]
        plain: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Load and validate configuration at startup
    let config = match wiser_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            wiser_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.client.log_level);

    let result = match cli.command {
        Some(Commands::Enqueue {
            chat_id,
            role,
            mode,
            id,
            content,
        }) => {
            let args = EnqueueArgs {
                chat_id,
                role,
                mode,
                id,
                content,
            };
            queue::run_enqueue(&config, args).await
        }
        Some(Commands::List { json }) => queue::run_list(&config, json).await,
        Some(Commands::Remove { id }) => queue::run_remove(&config, &id).await,
        Some(Commands::Clear) => queue::run_clear(&config).await,
        Some(Commands::Sync) => sync::run_sync(&config).await,
        Some(Commands::Serve { offline }) => serve::run_serve(config, offline).await,
        Some(Commands::Status { json, plain }) => status::run_status(&config, json, plain).await,
        None => {
            println!("wiser: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        error!(error = %e, "command failed");
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("wiser={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .init();
}
