//! CLI module: command parsing and dispatch
//!
//! All CLI logic lives here. `main.rs` calls `cli::run()`.

pub mod agent;
pub mod common;
pub mod config;
pub mod memory;
pub mod threads;
pub mod tools;

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};

use common::DEFAULT_THREAD;

#[derive(Parser)]
#[command(name = "chefbot")]
#[command(version)]
#[command(about = "Recipe chef bot with a resumable tool-calling agent", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive chat
    Chat {
        /// Conversation thread to use
        #[arg(long, default_value = DEFAULT_THREAD)]
        thread: String,
    },
    /// Send a single message and print the answer
    Ask {
        /// Message to process
        #[arg(short, long)]
        message: String,
        /// Conversation thread to use
        #[arg(long, default_value = DEFAULT_THREAD)]
        thread: String,
    },
    /// Answer a pending confirmation and continue the turn
    Resume {
        /// Thread that is waiting for a decision
        #[arg(long, default_value = DEFAULT_THREAD)]
        thread: String,
        /// Reply, e.g. "yes" / "네" to continue, anything else to stop
        decision: String,
    },
    /// Inspect checkpointed threads
    Threads {
        #[command(subcommand)]
        action: ThreadsAction,
    },
    /// List registered tools, or show one tool's schema
    Tools {
        /// Tool name
        name: Option<String>,
    },
    /// Inspect long-term memory
    Memory {
        #[command(subcommand)]
        action: MemoryAction,
    },
    /// Validate configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Show version information
    Version,
}

#[derive(Subcommand)]
pub enum ThreadsAction {
    /// List saved threads
    List,
    /// Print a thread's messages
    Show {
        /// Thread id
        thread_id: String,
    },
    /// Delete a thread's checkpoint
    Delete {
        /// Thread id
        thread_id: String,
    },
}

#[derive(Subcommand)]
pub enum MemoryAction {
    /// List all stored memories
    List {
        /// Filter by type (profile, episodic, knowledge)
        #[arg(long = "type")]
        memory_type: Option<String>,
    },
    /// Search memories by query
    Search {
        /// Search query
        query: String,
        /// Maximum number of results
        #[arg(long, default_value_t = 5)]
        top_k: usize,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Check configuration for errors and warnings
    Check,
}

/// Entry point for the CLI, called from main().
pub async fn run() -> Result<()> {
    // Fall back to default logging if the config file is unreadable; the
    // command itself reports the config error.
    let logging_cfg = chefbot::config::Config::load()
        .map(|c| c.logging)
        .unwrap_or_default();
    if let Err(e) = chefbot::utils::logging::init_logging(&logging_cfg) {
        eprintln!("Warning: {}", e);
    }

    let cli = Cli::parse();

    match cli.command {
        None => {
            let mut cmd = Cli::command();
            cmd.print_help()?;
            println!();
        }
        Some(Commands::Version) => {
            println!("chefbot {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Chat { thread }) => {
            agent::cmd_chat(thread).await?;
        }
        Some(Commands::Ask { message, thread }) => {
            agent::cmd_ask(message, thread).await?;
        }
        Some(Commands::Resume { thread, decision }) => {
            agent::cmd_resume(thread, decision).await?;
        }
        Some(Commands::Threads { action }) => {
            threads::cmd_threads(action).await?;
        }
        Some(Commands::Tools { name }) => {
            tools::cmd_tools(name).await?;
        }
        Some(Commands::Memory { action }) => {
            memory::cmd_memory(action).await?;
        }
        Some(Commands::Config { action }) => {
            config::cmd_config(action).await?;
        }
    }

    Ok(())
}
