//! Named OpenAI-protocol-compatible endpoint (glossary: "Compat provider")
//! (ground truth: `internal/agents/provider/compat/new.go`; per-instance env
//! vars per spec.md §6: `COMPAT_URL`/`COMPAT_API_KEY` for the unnamed
//! instance, `COMPAT_<INSTANCE>_URL`/`COMPAT_<INSTANCE>_API_KEY` for a named
//! `compat[<INSTANCE>]@<model>` entry).

use std::path::Path;

use ar_core::{ChatOutput, Message};
use serde_json::Value;

use crate::agent::Agent;
use crate::common::send_chat_completions;
use crate::error::ProviderError;

const DEFAULT_MODEL: &str = "qwen3:8b";
const DEFAULT_BASE_URL: &str = "http://localhost:11434";
const MODEL_PREFIX: &str = "compat@";

pub struct CompatAgent {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

impl CompatAgent {
    /// `instance` is `Some(name)` for `compat[<name>]@<model>` entries,
    /// `None` for the bare `compat@<model>` entry.
    pub fn new(config_root: &Path, instance: Option<&str>, model: &str) -> Result<Self, ProviderError> {
        let model = model.trim_start_matches(MODEL_PREFIX).to_string();
        let model = if model.is_empty() { DEFAULT_MODEL.to_string() } else { model };

        let (url_var, key_var) = match instance {
            Some(name) => (
                format!("COMPAT_{}_URL", name.to_uppercase()),
                format!("COMPAT_{}_API_KEY", name.to_uppercase()),
            ),
            None => ("COMPAT_URL".to_string(), "COMPAT_API_KEY".to_string()),
        };

        let base_url = ar_config::resolve_credential(config_root, &url_var)
            .map(|(_, v)| v)
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let base_url = base_url.trim_end_matches('/').to_string();
        let api_key = ar_config::resolve_credential(config_root, &key_var).map(|(_, v)| v);

        Ok(Self { client: reqwest::Client::new(), base_url, api_key, model })
    }
}

#[async_trait::async_trait]
impl Agent for CompatAgent {
    async fn send(&self, messages: &[Message], tools: Option<&[Value]>) -> Result<ChatOutput, ProviderError> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let mut headers = Vec::new();
        if let Some(key) = &self.api_key {
            headers.push(("Authorization", format!("Bearer {key}")));
        }
        send_chat_completions(&self.client, &url, &headers, &self.model, messages, tools).await
    }
}
