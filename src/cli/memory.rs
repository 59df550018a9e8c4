//! Memory CLI command handlers.

use anyhow::{Context, Result};

use chefbot::memory::{MemoryEntry, MemoryType};

use super::common::{load_config, open_memory};
use super::MemoryAction;

pub(crate) async fn cmd_memory(action: MemoryAction) -> Result<()> {
    match action {
        MemoryAction::List { memory_type } => cmd_memory_list(memory_type).await,
        MemoryAction::Search { query, top_k } => cmd_memory_search(query, top_k).await,
    }
}

fn print_entry(entry: &MemoryEntry) {
    let tags = if entry.tags.is_empty() {
        String::new()
    } else {
        format!(" [{}]", entry.tags.join(", "))
    };
    println!(
        "  {} ({}, importance {}){}",
        entry.id, entry.memory_type, entry.importance, tags
    );
    println!("    {}", truncate_value(&entry.content, 80));
}

async fn cmd_memory_list(memory_type: Option<String>) -> Result<()> {
    let mem = open_memory(&load_config()?)?;
    let entries = match memory_type.as_deref() {
        Some(kind) => {
            let kind: MemoryType = kind
                .parse()
                .with_context(|| format!("Unknown memory type '{}'", kind))?;
            mem.list_by_type(kind)
        }
        None => mem.list_all(),
    };

    if entries.is_empty() {
        println!("No memories stored yet.");
        return Ok(());
    }

    println!("Long-term Memories ({})", entries.len());
    println!("{}", "-".repeat(60));
    for entry in entries {
        print_entry(entry);
    }
    Ok(())
}

async fn cmd_memory_search(query: String, top_k: usize) -> Result<()> {
    let mut mem = open_memory(&load_config()?)?;
    let results = mem.search(&query, top_k);

    if results.is_empty() {
        println!("No memories matching '{}'.", query);
        return Ok(());
    }

    println!("Search results for '{}' ({})", query, results.len());
    println!("{}", "-".repeat(60));
    for entry in &results {
        print_entry(entry);
    }
    Ok(())
}

/// Shorten to `max` characters, appending "..." when cut.
fn truncate_value(value: &str, max: usize) -> String {
    if value.chars().count() <= max {
        value.to_string()
    } else {
        let cut: String = value.chars().take(max).collect();
        format!("{}...", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_value_short() {
        assert_eq!(truncate_value("김치찌개", 80), "김치찌개");
    }

    #[test]
    fn test_truncate_value_multibyte() {
        assert_eq!(truncate_value("된장찌개를 좋아함", 3), "된장찌...");
    }
}
