//! OpenAI Chat Completions provider (ground truth:
//! `internal/agents/provider/openai/{new,send}.go`).

use std::path::Path;

use ar_core::{ChatOutput, Message};
use serde_json::Value;

use crate::agent::Agent;
use crate::common::send_chat_completions;
use crate::error::ProviderError;

const CHAT_API: &str = "https://api.openai.com/v1/chat/completions";
const DEFAULT_MODEL: &str = "gpt-5-mini";
const MODEL_PREFIX: &str = "openai@";

pub struct OpenAiAgent {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl OpenAiAgent {
    pub fn new(config_root: &Path, model: Option<&str>) -> Result<Self, ProviderError> {
        let model = match model {
            Some(m) if m.starts_with(MODEL_PREFIX) => m.trim_start_matches(MODEL_PREFIX).to_string(),
            _ => DEFAULT_MODEL.to_string(),
        };
        let (_, api_key) = ar_config::resolve_credential(config_root, "OPENAI_API_KEY")
            .ok_or_else(|| ProviderError::MissingCredential("OPENAI_API_KEY".into()))?;
        Ok(Self { client: reqwest::Client::new(), api_key, model })
    }
}

#[async_trait::async_trait]
impl Agent for OpenAiAgent {
    async fn send(&self, messages: &[Message], tools: Option<&[Value]>) -> Result<ChatOutput, ProviderError> {
        send_chat_completions(
            &self.client,
            CHAT_API,
            &[("Authorization", format!("Bearer {}", self.api_key))],
            &self.model,
            messages,
            tools,
        )
        .await
    }
}
