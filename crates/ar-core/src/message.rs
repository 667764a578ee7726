use serde::{Deserialize, Serialize};

/// Role of a single chat turn (spec.md §3: `role ∈ {system, user, assistant, tool}`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Tool => "tool",
        }
    }
}

/// A single chat turn. `content` is `None` for an assistant message that is
/// purely tool calls (no narration accompanying them).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: Some(content.into()),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: Some(content.into()),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: Some(content.into()),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: Some(content.into()),
            tool_calls: Vec::new(),
            tool_call_id: Some(tool_call_id.into()),
        }
    }

    /// True for an assistant message carrying one or more structured tool calls.
    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

/// A structured tool call emitted by the model.
/// Canonical shape (spec.md §6): `{id, type:"function", function:{name, arguments}}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    #[serde(rename = "type", default = "default_tool_call_type")]
    pub kind: String,
    pub function: ToolCallFunction,
}

fn default_tool_call_type() -> String {
    "function".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallFunction {
    pub name: String,
    /// JSON-encoded argument object, kept as a string per the canonical wire
    /// shape (the model emits it as a string; providers re-parse as needed).
    pub arguments: String,
}

impl ToolCall {
    /// Normalise the tool name, stripping anything from `<|` onward — a
    /// defensive measure against one provider's tokenisation artefact
    /// leaking into the tool name (spec.md §4.6, §9).
    pub fn normalised_name(&self) -> &str {
        match self.function.name.find("<|") {
            Some(idx) => &self.function.name[..idx],
            None => &self.function.name,
        }
    }

    /// Dedup key used by the reasoning loop: `name|arguments`.
    pub fn dedup_key(&self) -> String {
        format!("{}|{}", self.normalised_name(), self.function.arguments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalised_name_strips_tokeniser_artefact() {
        let call = ToolCall {
            id: "1".into(),
            kind: "function".into(),
            function: ToolCallFunction {
                name: "read_file<|endoftext|>".into(),
                arguments: "{}".into(),
            },
        };
        assert_eq!(call.normalised_name(), "read_file");
    }

    #[test]
    fn normalised_name_passthrough_when_clean() {
        let call = ToolCall {
            id: "1".into(),
            kind: "function".into(),
            function: ToolCallFunction {
                name: "read_file".into(),
                arguments: "{}".into(),
            },
        };
        assert_eq!(call.normalised_name(), "read_file");
    }

    #[test]
    fn dedup_key_combines_name_and_args() {
        let call = ToolCall {
            id: "1".into(),
            kind: "function".into(),
            function: ToolCallFunction {
                name: "read_file".into(),
                arguments: "{\"path\":\"a.txt\"}".into(),
            },
        };
        assert_eq!(call.dedup_key(), "read_file|{\"path\":\"a.txt\"}");
    }
}
