//! Google Gemini `generateContent` provider (ground truth:
//! `internal/agents/provider/gemini/{new,send,type}.go`).
//!
//! Gemini has no `tool_call_id` concept: the outbound `tool_call_id` on our
//! canonical [`Message`] becomes the `name` field of a `functionResponse`
//! part, and on the way back the returned `functionCall.name` is reused as
//! the synthesized `ToolCall.id` (SPEC_FULL.md §4.3).

use std::path::Path;

use ar_core::{ChatChoice, ChatOutput, Message, Role, ToolCall, ToolCallFunction};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::agent::Agent;
use crate::error::ProviderError;

const BASE_API: &str = "https://generativelanguage.googleapis.com/v1beta/models/";
const DEFAULT_MODEL: &str = "gemini-2.5-pro";
const MODEL_PREFIX: &str = "gemini@";

pub struct GeminiAgent {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl GeminiAgent {
    pub fn new(config_root: &Path, model: Option<&str>) -> Result<Self, ProviderError> {
        let model = match model {
            Some(m) if m.starts_with(MODEL_PREFIX) => m.trim_start_matches(MODEL_PREFIX).to_string(),
            _ => DEFAULT_MODEL.to_string(),
        };
        let (_, api_key) = ar_config::resolve_credential(config_root, "GEMINI_API_KEY")
            .ok_or_else(|| ProviderError::MissingCredential("GEMINI_API_KEY".into()))?;
        Ok(Self { client: reqwest::Client::new(), api_key, model })
    }
}

#[derive(Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize, Default)]
struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", rename = "functionCall")]
    function_call: Option<FunctionCall>,
    #[serde(skip_serializing_if = "Option::is_none", rename = "functionResponse")]
    function_response: Option<FunctionResponse>,
}

#[derive(Serialize, Deserialize)]
struct FunctionCall {
    name: String,
    args: Value,
}

#[derive(Serialize)]
struct FunctionResponse {
    name: String,
    response: Value,
}

fn convert_to_content(message: &Message) -> Content {
    if let Some(tool_call_id) = &message.tool_call_id {
        let data = json!({ "result": message.content.clone().unwrap_or_default() });
        return Content {
            role: "function".to_string(),
            parts: vec![Part {
                function_response: Some(FunctionResponse {
                    name: tool_call_id.clone(),
                    response: data,
                }),
                ..Default::default()
            }],
        };
    }

    let role = if message.role == Role::Assistant { "model" } else { message.role.as_str() }.to_string();

    if message.has_tool_calls() {
        let parts = message
            .tool_calls
            .iter()
            .map(|tc| Part {
                function_call: Some(FunctionCall {
                    name: tc.function.name.clone(),
                    args: serde_json::from_str(&tc.function.arguments).unwrap_or(json!({})),
                }),
                ..Default::default()
            })
            .collect();
        return Content { role, parts };
    }

    Content {
        role,
        parts: vec![Part {
            text: Some(message.content.clone().unwrap_or_default()),
            ..Default::default()
        }],
    }
}

fn convert_to_tools(tools: &[Value]) -> Vec<Value> {
    let declarations: Vec<Value> = tools
        .iter()
        .filter_map(|t| {
            let f = t.get("function")?;
            Some(json!({
                "name": f.get("name")?,
                "description": f.get("description").cloned().unwrap_or(json!("")),
                "parameters": f.get("parameters").cloned().unwrap_or(json!({"type": "object", "properties": {}})),
            }))
        })
        .collect();
    vec![json!({ "functionDeclarations": declarations })]
}

#[derive(Deserialize)]
struct GeminiOutput {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: CandidateContent,
    #[serde(rename = "finishReason", default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize, Default)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

fn convert_to_output(raw: GeminiOutput) -> ChatOutput {
    let Some(candidate) = raw.candidates.into_iter().next() else {
        return ChatOutput::default();
    };

    let mut text = String::new();
    let mut tool_calls = Vec::new();
    for part in candidate.content.parts {
        if let Some(t) = part.text {
            text.push_str(&t);
        } else if let Some(call) = part.function_call {
            tool_calls.push(ToolCall {
                id: call.name.clone(),
                kind: "function".to_string(),
                function: ToolCallFunction {
                    name: call.name,
                    arguments: call.args.to_string(),
                },
            });
        }
    }

    let message = Message {
        role: Role::Assistant,
        content: if text.is_empty() { None } else { Some(text) },
        tool_calls,
        tool_call_id: None,
    };

    ChatOutput {
        choices: vec![ChatChoice { message, finish_reason: candidate.finish_reason }],
        error: None,
    }
}

#[async_trait::async_trait]
impl Agent for GeminiAgent {
    async fn send(&self, messages: &[Message], tools: Option<&[Value]>) -> Result<ChatOutput, ProviderError> {
        let mut system_prompt = None;
        let mut contents = Vec::new();
        for m in messages {
            if m.role == Role::System {
                system_prompt = m.content.clone();
                continue;
            }
            contents.push(convert_to_content(m));
        }

        let mut body = json!({ "contents": contents });
        if let Some(prompt) = system_prompt {
            body["systemInstruction"] = json!({ "parts": [{ "text": prompt }] });
        }
        if let Some(tools) = tools {
            body["tools"] = json!(convert_to_tools(tools));
        }

        let url = format!("{BASE_API}{}:generateContent?key={}", self.model, self.api_key);
        let raw: GeminiOutput = self.client.post(url).json(&body).send().await?.json().await?;
        Ok(convert_to_output(raw))
    }
}
