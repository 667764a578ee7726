//! Skill and agent selectors (spec.md §4.7; ground truth:
//! `internal/agents/exec/selectAgent.go`): two independent, stateless LLM
//! calls over the selector bot, each parsing a single-token answer out of
//! free text.

use std::collections::HashSet;

use ar_core::{AgentEntry, Message};
use ar_providers::Agent;
use ar_skills::SkillList;

use crate::prompts::{AGENT_SELECTOR_PROMPT, SKILL_SELECTOR_PROMPT};

/// Strip surrounding whitespace and `"'` `` ` `` quoting from a selector's
/// free-text reply (spec.md §4.7).
fn clean_answer(raw: &str) -> String {
    raw.trim().trim_matches(|c| "\"'` \n".contains(c)).to_string()
}

fn first_choice_text(output: &ar_core::ChatOutput) -> Option<String> {
    output.first_choice()?.message.content.clone()
}

/// Select a skill by name from `skills` for `user_input`, or `None` if the
/// selector declines (spec.md §4.7 "Skill selector").
pub async fn select_skill(
    bot: &dyn Agent,
    skills: &SkillList,
    user_input: &str,
) -> Option<ar_core::Skill> {
    if skills.by_name.is_empty() {
        return None;
    }

    let mut names: Vec<&String> = skills.by_name.keys().collect();
    names.sort();
    let list = names
        .iter()
        .map(|name| format!("- {}: {}", name, skills.by_name[*name].description))
        .collect::<Vec<_>>()
        .join("\n");

    let messages = vec![
        Message::system(SKILL_SELECTOR_PROMPT),
        Message::user(format!("Available skills:\n{list}\nUser request: {user_input}")),
    ];

    let output = bot.send(&messages, None).await.ok()?;
    let raw = first_choice_text(&output)?;
    let cleaned = clean_answer(&raw);

    if cleaned.is_empty() || cleaned == "NONE" {
        return None;
    }

    skills
        .by_name
        .get(&cleaned)
        .or_else(|| skills.by_name.get(raw.trim()))
        .cloned()
}

/// Select an agent entry's name from `entries` (in declared order, per
/// SPEC_FULL.md §9's Open Question resolution — *not* the fallback-
/// reordered registry) for `user_input`, or `None` if the selector declines
/// (spec.md §4.7 "Agent selector").
pub async fn select_agent(bot: &dyn Agent, entries: &[AgentEntry], user_input: &str) -> Option<String> {
    if entries.is_empty() {
        return None;
    }

    let known: HashSet<&str> = entries.iter().map(|e| e.name.as_str()).collect();
    let entries_json = serde_json::to_string(entries).ok()?;

    let messages = vec![
        Message::system(AGENT_SELECTOR_PROMPT),
        Message::user(format!("Available agents:\n{entries_json}\nUser request: {user_input}")),
    ];

    let output = bot.send(&messages, None).await.ok()?;
    let raw = first_choice_text(&output)?;
    let cleaned = clean_answer(&raw);

    if cleaned.is_empty() || cleaned == "NONE" {
        return None;
    }

    known.contains(cleaned.as_str()).then_some(cleaned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ar_core::{ChatChoice, ChatOutput};
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct ScriptedAgent {
        reply: Mutex<Option<String>>,
    }

    #[async_trait]
    impl Agent for ScriptedAgent {
        async fn send(
            &self,
            _messages: &[Message],
            tools: Option<&[serde_json::Value]>,
        ) -> Result<ChatOutput, ar_providers::ProviderError> {
            assert!(tools.is_none(), "selector calls never pass tools");
            let reply = self.reply.lock().unwrap().clone().unwrap_or_default();
            Ok(ChatOutput {
                choices: vec![ChatChoice { message: Message::assistant(reply), finish_reason: None }],
                error: None,
            })
        }
    }

    fn sample_skills() -> SkillList {
        let mut skills = SkillList::default();
        skills.by_name.insert(
            "writer".to_string(),
            ar_core::Skill {
                name: "writer".to_string(),
                description: "writes prose".to_string(),
                content: "body".to_string(),
                body: "body".to_string(),
                absolute_path: "/tmp/writer/SKILL.md".into(),
                folder_path: "/tmp/writer".into(),
                content_hash: "h".to_string(),
            },
        );
        skills
    }

    #[tokio::test]
    async fn selects_exact_skill_name() {
        let bot = ScriptedAgent { reply: Mutex::new(Some("writer".to_string())) };
        let skill = select_skill(&bot, &sample_skills(), "write me a poem").await;
        assert_eq!(skill.unwrap().name, "writer");
    }

    #[tokio::test]
    async fn none_literal_is_no_selection() {
        let bot = ScriptedAgent { reply: Mutex::new(Some("NONE".to_string())) };
        assert!(select_skill(&bot, &sample_skills(), "what's 2+2").await.is_none());
    }

    #[tokio::test]
    async fn quoted_answer_is_cleaned_before_lookup() {
        let bot = ScriptedAgent { reply: Mutex::new(Some("\"writer\"".to_string())) };
        let skill = select_skill(&bot, &sample_skills(), "write me a poem").await;
        assert_eq!(skill.unwrap().name, "writer");
    }

    #[tokio::test]
    async fn unmatched_answer_is_discarded_silently() {
        let bot = ScriptedAgent { reply: Mutex::new(Some("not-a-real-skill".to_string())) };
        assert!(select_skill(&bot, &sample_skills(), "hi").await.is_none());
    }

    #[tokio::test]
    async fn agent_selector_accepts_exact_entry_name() {
        let entries = vec![AgentEntry { name: "claude@sonnet".into(), description: String::new() }];
        let bot = ScriptedAgent { reply: Mutex::new(Some("claude@sonnet".to_string())) };
        assert_eq!(select_agent(&bot, &entries, "hi").await.as_deref(), Some("claude@sonnet"));
    }

    #[tokio::test]
    async fn agent_selector_rejects_unknown_name() {
        let entries = vec![AgentEntry { name: "claude@sonnet".into(), description: String::new() }];
        let bot = ScriptedAgent { reply: Mutex::new(Some("gpt-5".to_string())) };
        assert!(select_agent(&bot, &entries, "hi").await.is_none());
    }
}
