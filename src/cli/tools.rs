//! Tools CLI command handler: lists the registered tool schemas.

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::Mutex;

use super::common::{build_registry, load_config, open_memory};

pub(crate) async fn cmd_tools(name: Option<String>) -> Result<()> {
    let config = load_config()?;
    let memory = config
        .memory
        .enabled
        .then(|| open_memory(&config))
        .transpose()?
        .map(|m| Arc::new(Mutex::new(m)));
    let registry = build_registry(&config, memory)?;

    let schemas = registry.schemas();
    match name {
        Some(name) => {
            let Some(def) = schemas.iter().find(|d| d.name == name) else {
                anyhow::bail!(
                    "Unknown tool '{}'. Available: {}",
                    name,
                    registry.names().join(", ")
                );
            };
            println!("{}", def.name);
            println!("  {}", def.description);
            println!();
            println!("{}", serde_json::to_string_pretty(&def.parameters)?);
        }
        None => {
            println!("Tools ({})", schemas.len());
            println!("{}", "-".repeat(60));
            for def in &schemas {
                println!("  {:<24} {}", def.name, def.description);
            }
            println!();
            println!("Show a schema: chefbot tools <name>");
        }
    }
    Ok(())
}
