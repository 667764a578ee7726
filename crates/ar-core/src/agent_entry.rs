use serde::{Deserialize, Serialize};

/// Declared model descriptor loaded from the persisted registry
/// (spec.md §3: `name` format `<provider>@<model>` or `compat[<instance>]@<model>`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentEntry {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl AgentEntry {
    /// Split `name` into `(kind, instance, model)`. `instance` is only
    /// present for `compat[<instance>]@<model>` entries.
    pub fn parse_name(&self) -> Option<(AgentKind, Option<String>, String)> {
        let (head, model) = self.name.split_once('@')?;
        if let Some(instance) = head
            .strip_prefix("compat[")
            .and_then(|rest| rest.strip_suffix(']'))
        {
            return Some((AgentKind::Compat, Some(instance.to_string()), model.to_string()));
        }
        let kind = match head {
            "copilot" => AgentKind::Copilot,
            "openai" => AgentKind::OpenAi,
            "claude" => AgentKind::Claude,
            "gemini" => AgentKind::Gemini,
            "nvidia" => AgentKind::Nvidia,
            "compat" => AgentKind::Compat,
            _ => return None,
        };
        Some((kind, None, model.to_string()))
    }
}

/// Provider variant (spec.md §3 `Agent`, §9 "tagged variant").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentKind {
    Copilot,
    OpenAi,
    Claude,
    Gemini,
    Nvidia,
    Compat,
}

impl AgentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentKind::Copilot => "copilot",
            AgentKind::OpenAi => "openai",
            AgentKind::Claude => "claude",
            AgentKind::Gemini => "gemini",
            AgentKind::Nvidia => "nvidia",
            AgentKind::Compat => "compat",
        }
    }
}

impl std::fmt::Display for AgentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_provider_entry() {
        let entry = AgentEntry {
            name: "claude@claude-sonnet-4-5".into(),
            description: String::new(),
        };
        let (kind, instance, model) = entry.parse_name().unwrap();
        assert_eq!(kind, AgentKind::Claude);
        assert!(instance.is_none());
        assert_eq!(model, "claude-sonnet-4-5");
    }

    #[test]
    fn parses_compat_instance_entry() {
        let entry = AgentEntry {
            name: "compat[local]@llama-3".into(),
            description: String::new(),
        };
        let (kind, instance, model) = entry.parse_name().unwrap();
        assert_eq!(kind, AgentKind::Compat);
        assert_eq!(instance.as_deref(), Some("local"));
        assert_eq!(model, "llama-3");
    }

    #[test]
    fn rejects_entry_without_at() {
        let entry = AgentEntry {
            name: "claude".into(),
            description: String::new(),
        };
        assert!(entry.parse_name().is_none());
    }
}
