//! Checkpointed thread inspection.

use anyhow::Result;

use chefbot::session::{CheckpointStore, Message};

use super::common::{load_config, open_store};
use super::ThreadsAction;

pub(crate) async fn cmd_threads(action: ThreadsAction) -> Result<()> {
    let store = open_store(&load_config()?)?;

    match action {
        ThreadsAction::List => {
            let threads = store.list().await?;
            if threads.is_empty() {
                println!("No saved threads.");
                return Ok(());
            }
            println!("Threads ({})", threads.len());
            println!("{}", "-".repeat(60));
            for thread_id in &threads {
                let state = store.load(thread_id).await?;
                let marker = if state.pending_interrupt.is_some() {
                    "  (waiting for decision)"
                } else {
                    ""
                };
                println!(
                    "  {:<24} {:>3} messages  updated {}{}",
                    thread_id,
                    state.message_count(),
                    state.updated_at.format("%Y-%m-%d %H:%M"),
                    marker
                );
            }
        }
        ThreadsAction::Show { thread_id } => {
            let state = store.load(&thread_id).await?;
            if state.is_empty() {
                println!("Thread '{}' has no messages.", thread_id);
                return Ok(());
            }
            println!("Thread: {}", state.thread_id);
            if !state.resource_counters.is_empty() {
                let counters: Vec<String> = state
                    .resource_counters
                    .iter()
                    .map(|(name, count)| format!("{}={}", name, count))
                    .collect();
                println!("Counters: {}", counters.join(", "));
            }
            println!("{}", "-".repeat(60));
            for message in &state.messages {
                match message {
                    Message::Assistant { tool_requests, .. } if !tool_requests.is_empty() => {
                        let names: Vec<&str> =
                            tool_requests.iter().map(|r| r.name.as_str()).collect();
                        println!("[assistant] -> {}", names.join(", "));
                    }
                    Message::ToolResult { tool_name, .. } => {
                        println!("[tool:{}] {}", tool_name, message.content());
                    }
                    _ => println!("[{}] {}", message.role(), message.content()),
                }
            }
            if let Some(interrupt) = &state.pending_interrupt {
                println!();
                println!("Pending: {}", interrupt.reason);
                println!(
                    "Continue with: chefbot resume --thread {} <yes|no>",
                    thread_id
                );
            }
        }
        ThreadsAction::Delete { thread_id } => {
            if !store.exists(&thread_id).await {
                println!("Thread '{}' not found.", thread_id);
                return Ok(());
            }
            store.delete(&thread_id).await?;
            println!("Deleted thread '{}'.", thread_id);
        }
    }
    Ok(())
}
