//! Uniform request/response schema across the five-plus provider wire
//! formats (spec.md §4.3): a single [`Agent`] trait, one variant module per
//! backend, each translating the canonical [`Message`]/tool-schema shape
//! into (and back out of) its native API.

pub mod agent;
pub mod claude;
mod common;
pub mod compat;
pub mod copilot;
pub mod error;
pub mod gemini;
pub mod nvidia;
pub mod openai;

use std::path::Path;

use ar_core::{AgentEntry, AgentKind};

pub use agent::Agent;
pub use claude::ClaudeAgent;
pub use compat::CompatAgent;
pub use copilot::CopilotAgent;
pub use error::ProviderError;
pub use gemini::GeminiAgent;
pub use nvidia::NvidiaAgent;
pub use openai::OpenAiAgent;

/// Bind an [`AgentEntry`] (`<provider>@<model>` or `compat[<instance>]@<model>`)
/// to a constructed provider client (spec.md §3 `Agent`, §9 "tagged
/// variant"). Copilot is the only variant requiring async construction
/// (it may run the device-code login flow on first use).
pub async fn build_agent(config_root: &Path, entry: &AgentEntry) -> Result<Box<dyn Agent>, ProviderError> {
    let (kind, instance, model) = entry
        .parse_name()
        .ok_or_else(|| ProviderError::Api(format!("unparseable agent name: {}", entry.name)))?;

    // Each single-variant `new()` strips its own `<provider>@` prefix, so it
    // is handed the full entry name; only `CompatAgent` (which also carries
    // a separately-parsed `instance`) takes the bare model string.
    Ok(match kind {
        AgentKind::Copilot => Box::new(CopilotAgent::new(config_root, Some(entry.name.as_str())).await?),
        AgentKind::OpenAi => Box::new(OpenAiAgent::new(config_root, Some(entry.name.as_str()))?),
        AgentKind::Claude => Box::new(ClaudeAgent::new(config_root, Some(entry.name.as_str()))?),
        AgentKind::Gemini => Box::new(GeminiAgent::new(config_root, Some(entry.name.as_str()))?),
        AgentKind::Nvidia => Box::new(NvidiaAgent::new(config_root, Some(entry.name.as_str()))?),
        AgentKind::Compat => Box::new(CompatAgent::new(config_root, instance.as_deref(), &model)?),
    })
}
