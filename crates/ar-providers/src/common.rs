//! Shared request/response plumbing for the OpenAI-wire-shaped providers
//! (OpenAI, Nvidia, Compat, Copilot): canonical [`Message`]/tool-schema
//! values pass through close to verbatim (SPEC_FULL.md §4.3).

use ar_core::{ChatOutput, Message};
use serde_json::{json, Value};

use crate::error::ProviderError;

pub(crate) async fn send_chat_completions(
    client: &reqwest::Client,
    url: &str,
    headers: &[(&str, String)],
    model: &str,
    messages: &[Message],
    tools: Option<&[Value]>,
) -> Result<ChatOutput, ProviderError> {
    let mut body = json!({
        "model": model,
        "messages": messages,
    });
    if let Some(tools) = tools {
        body["tools"] = json!(tools);
    }

    let mut builder = client.post(url).json(&body);
    for (key, value) in headers {
        builder = builder.header(*key, value);
    }

    let output: ChatOutput = builder.send().await?.json().await?;
    if let Some(error) = &output.error {
        return Err(ProviderError::Api(error.message.clone()));
    }
    Ok(output)
}
