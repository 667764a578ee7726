//! `agentrun add` — interactive provider registration wizard (spec.md §6:
//! "interactive provider wizard (out of core)"; the registration *data
//! model*, [`ar_core::AgentEntry`] / [`ar_config::RegistryFile`], is in
//! core and shared with `ar-runtime`).

use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result};
use ar_core::AgentEntry;
use ar_config::{registry, ConfigLock};

/// Prompt on stdin for a `<provider>@<model>` name and a description, and
/// append the resulting [`AgentEntry`] to `config.json` under
/// `config_root`.
pub fn handle_add(config_root: &Path) -> Result<()> {
    let name = prompt("Agent name (e.g. claude@sonnet, compat[local]@llama3)")?;
    if name.trim().is_empty() {
        anyhow::bail!("agent name must not be empty");
    }
    let description = prompt("Description (optional)")?;

    let _lock = ConfigLock::acquire(config_root).context("acquiring config lock")?;
    let mut file = registry::read(config_root)?.unwrap_or_default();
    file.models.retain(|m| m.name != name);
    file.models.push(AgentEntry { name: name.clone(), description });
    registry::write(config_root, &file).context("writing config.json")?;

    println!("registered agent: {name}");
    Ok(())
}

fn prompt(label: &str) -> Result<String> {
    print!("{label}: ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}
