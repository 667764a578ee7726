//! Anthropic Messages API provider (ground truth:
//! `internal/agents/provider/claude/{new,send,type}.go`).
//!
//! Unlike the OpenAI-wire-shaped providers, Claude needs real translation:
//! the system prompt moves to a top-level `system` field, tool results
//! become `user` messages carrying `tool_result` blocks, and assistant
//! tool-calls become `tool_use` blocks.

use std::path::Path;

use ar_core::{ChatChoice, ChatOutput, Message, ToolCall};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::agent::Agent;
use crate::error::ProviderError;

const MESSAGES_API: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_MODEL: &str = "claude-sonnet-4-5";
const MODEL_PREFIX: &str = "claude@";
const MAX_TOKENS: u32 = 16384;

pub struct ClaudeAgent {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl ClaudeAgent {
    pub fn new(config_root: &Path, model: Option<&str>) -> Result<Self, ProviderError> {
        let model = match model {
            Some(m) if m.starts_with(MODEL_PREFIX) => m.trim_start_matches(MODEL_PREFIX).to_string(),
            _ => DEFAULT_MODEL.to_string(),
        };
        let (_, api_key) = ar_config::resolve_credential(config_root, "ANTHROPIC_API_KEY")
            .ok_or_else(|| ProviderError::MissingCredential("ANTHROPIC_API_KEY".into()))?;
        Ok(Self { client: reqwest::Client::new(), api_key, model })
    }
}

#[derive(Serialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    input: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none", rename = "tool_use_id")]
    tool_use_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
}

#[derive(Serialize)]
struct ClaudeMessage {
    role: String,
    content: Vec<ContentBlock>,
}

fn convert_to_messages(messages: &[Message]) -> (Option<String>, Vec<ClaudeMessage>) {
    let mut system = None;
    let mut out = Vec::new();

    for m in messages {
        match m.role.as_str() {
            "system" => system = Some(m.content.clone().unwrap_or_default()),
            "tool" => {
                out.push(ClaudeMessage {
                    role: "user".to_string(),
                    content: vec![ContentBlock {
                        kind: "tool_result".to_string(),
                        text: None,
                        id: None,
                        name: None,
                        input: None,
                        tool_use_id: m.tool_call_id.clone(),
                        content: m.content.clone(),
                    }],
                });
            }
            "assistant" if m.has_tool_calls() => {
                let mut blocks = Vec::new();
                if let Some(text) = &m.content {
                    if !text.is_empty() {
                        blocks.push(ContentBlock {
                            kind: "text".to_string(),
                            text: Some(text.clone()),
                            id: None,
                            name: None,
                            input: None,
                            tool_use_id: None,
                            content: None,
                        });
                    }
                }
                for tc in &m.tool_calls {
                    let input: Value =
                        serde_json::from_str(&tc.function.arguments).unwrap_or(json!({}));
                    blocks.push(ContentBlock {
                        kind: "tool_use".to_string(),
                        text: None,
                        id: Some(tc.id.clone()),
                        name: Some(tc.function.name.clone()),
                        input: Some(input),
                        tool_use_id: None,
                        content: None,
                    });
                }
                out.push(ClaudeMessage { role: "assistant".to_string(), content: blocks });
            }
            role => {
                out.push(ClaudeMessage {
                    role: role.to_string(),
                    content: vec![ContentBlock {
                        kind: "text".to_string(),
                        text: Some(m.content.clone().unwrap_or_default()),
                        id: None,
                        name: None,
                        input: None,
                        tool_use_id: None,
                        content: None,
                    }],
                });
            }
        }
    }

    (system, out)
}

fn convert_to_tools(tools: &[Value]) -> Vec<Value> {
    tools
        .iter()
        .filter_map(|t| {
            let f = t.get("function")?;
            Some(json!({
                "name": f.get("name")?,
                "description": f.get("description").cloned().unwrap_or(json!("")),
                "input_schema": f.get("parameters").cloned().unwrap_or(json!({"type": "object", "properties": {}})),
            }))
        })
        .collect()
}

#[derive(Deserialize)]
struct ClaudeOutput {
    content: Vec<ClaudeContent>,
    stop_reason: Option<String>,
    #[serde(default)]
    error: Option<ClaudeError>,
}

#[derive(Deserialize)]
struct ClaudeError {
    message: String,
}

#[derive(Deserialize)]
struct ClaudeContent {
    #[serde(rename = "type")]
    kind: String,
    text: Option<String>,
    id: Option<String>,
    name: Option<String>,
    input: Option<Value>,
}

fn convert_to_output(raw: ClaudeOutput) -> Result<ChatOutput, ProviderError> {
    if let Some(err) = raw.error {
        return Err(ProviderError::Api(err.message));
    }
    if raw.stop_reason.as_deref() == Some("max_tokens") {
        return Err(ProviderError::MaxTokensExceeded(MAX_TOKENS));
    }

    let mut text = String::new();
    let mut tool_calls = Vec::new();
    for block in raw.content {
        match block.kind.as_str() {
            "text" => text.push_str(&block.text.unwrap_or_default()),
            "tool_use" => {
                tool_calls.push(ToolCall {
                    id: block.id.unwrap_or_default(),
                    kind: "function".to_string(),
                    function: ar_core::ToolCallFunction {
                        name: block.name.unwrap_or_default(),
                        arguments: block.input.map(|v| v.to_string()).unwrap_or_else(|| "{}".to_string()),
                    },
                });
            }
            _ => {}
        }
    }

    let message = Message {
        role: ar_core::Role::Assistant,
        content: if text.is_empty() { None } else { Some(text) },
        tool_calls,
        tool_call_id: None,
    };

    Ok(ChatOutput {
        choices: vec![ChatChoice { message, finish_reason: raw.stop_reason }],
        error: None,
    })
}

#[async_trait::async_trait]
impl Agent for ClaudeAgent {
    async fn send(&self, messages: &[Message], tools: Option<&[Value]>) -> Result<ChatOutput, ProviderError> {
        let (system, claude_messages) = convert_to_messages(messages);

        let mut body = json!({
            "model": self.model,
            "max_tokens": MAX_TOKENS,
            "messages": claude_messages,
        });
        if let Some(system) = system {
            body["system"] = json!(system);
        }
        if let Some(tools) = tools {
            body["tools"] = json!(convert_to_tools(tools));
        }

        let raw: ClaudeOutput = self
            .client
            .post(MESSAGES_API)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await?
            .json()
            .await?;

        convert_to_output(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_message_is_extracted_not_inlined() {
        let messages = vec![Message::system("be terse"), Message::user("hi")];
        let (system, out) = convert_to_messages(&messages);
        assert_eq!(system.as_deref(), Some("be terse"));
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].role, "user");
    }

    #[test]
    fn tool_result_becomes_user_message_with_tool_result_block() {
        let messages = vec![Message::tool_result("call_1", "42")];
        let (_, out) = convert_to_messages(&messages);
        assert_eq!(out[0].role, "user");
        assert_eq!(out[0].content[0].kind, "tool_result");
        assert_eq!(out[0].content[0].tool_use_id.as_deref(), Some("call_1"));
    }

    #[test]
    fn max_tokens_stop_reason_is_a_distinct_error() {
        let raw = ClaudeOutput {
            content: vec![ClaudeContent { kind: "text".into(), text: Some("cut off".into()), id: None, name: None, input: None }],
            stop_reason: Some("max_tokens".to_string()),
            error: None,
        };
        let err = convert_to_output(raw).unwrap_err();
        assert!(matches!(err, ProviderError::MaxTokensExceeded(MAX_TOKENS)));
    }

    #[test]
    fn tool_use_block_becomes_tool_call() {
        let raw = ClaudeOutput {
            content: vec![ClaudeContent {
                kind: "tool_use".into(),
                text: None,
                id: Some("toolu_1".into()),
                name: Some("read_file".into()),
                input: Some(json!({"path": "a.txt"})),
            }],
            stop_reason: Some("tool_use".to_string()),
            error: None,
        };
        let output = convert_to_output(raw).unwrap();
        let call = &output.choices[0].message.tool_calls[0];
        assert_eq!(call.id, "toolu_1");
        assert_eq!(call.function.name, "read_file");
    }
}
