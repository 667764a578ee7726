//! Fixed prompt text: the system-prompt template, the skill-mode extension
//! block, and the two selector prompts (spec.md §4.6-4.7). These bodies
//! were not retrieved verbatim in `examples/original_source/` (prompt
//! assets were filtered out of the code-only retrieval), so they are
//! authored here to match the behavior spec.md describes; the template
//! placeholders and substitution points are normative, the prose is not.

/// `{{.WorkPath}}`, `{{.SkillPath}}`, `{{.SkillExt}}`, `{{.Content}}`
/// (spec.md §4.6).
pub const SYSTEM_PROMPT_TEMPLATE: &str = "\
You are an autonomous coding and research assistant running from the command line.

Work directory: {{.WorkPath}}
Active skill path: {{.SkillPath}}
{{.SkillExt}}
{{.Content}}

You have access to a set of tools for reading and writing files, searching the \
work directory, running allow-listed shell commands, and fetching web pages or \
HTTP endpoints. Use them to gather whatever information you need before \
answering; do not guess at file contents or command output. When you are \
finished, reply with your final answer as plain text — do not call a tool whose \
result you do not need.";

/// Appended to the system prompt only when a skill is active (spec.md
/// §4.6 `{{.SkillExt}}`).
pub const SKILL_EXTENSION_PROMPT: &str = "\
A skill is active for this request. Its instructions below take precedence \
over your general instructions; follow them for the scope of this task. \
Paths under scripts/, templates/, and assets/ referenced by the skill have \
already been rewritten to absolute paths where those directories exist.";

/// Fixed system prompt preceding the skill-selection request (spec.md
/// §4.7).
pub const SKILL_SELECTOR_PROMPT: &str = "\
You choose which skill, if any, best matches a user's request. You will be \
given a list of available skills as `- <name>: <description>` lines and the \
user's request. Reply with the exact name of the single best-matching skill, \
or the literal word NONE if no skill clearly applies. Reply with nothing else.";

/// Fixed system prompt preceding the agent-selection request (spec.md
/// §4.7).
pub const AGENT_SELECTOR_PROMPT: &str = "\
You choose which configured agent model, if any, best fits a user's request. \
You will be given the available agents as a JSON array of {name, description} \
and the user's request. Reply with the exact `name` of the single best-fitting \
agent, or the literal word NONE to use the default. Reply with nothing else.";

/// Shared fallback text for the empty-choices streak, the iteration-cap
/// fallthrough when the final no-tools summary request also fails, and the
/// nil-content assistant message case (spec.md §4.6 step 2, §9 scenario 6;
/// SPEC_FULL.md §4.6: "the empty-choices fallback text and the iteration
/// cap fallback text are the *same* literal fallback string").
pub const FALLBACK_TEXT: &str = "工具無法取得資料，請稍後再試或改用其他方式查詢。";

/// Appended as a final user turn when the iteration cap is reached without
/// a terminal assistant message (spec.md §4.6 "Iteration cap fallthrough").
pub const ITERATION_CAP_NUDGE: &str = "請根據以上工具查詢結果，整理並總結回答原始問題。";

/// Expand [`SYSTEM_PROMPT_TEMPLATE`] for a request with no active skill.
pub fn system_prompt_without_skill(work_path: &str) -> String {
    SYSTEM_PROMPT_TEMPLATE
        .replace("{{.WorkPath}}", work_path)
        .replace("{{.SkillPath}}", "None")
        .replace("{{.SkillExt}}", "")
        .replace("{{.Content}}", "")
}

/// Expand [`SYSTEM_PROMPT_TEMPLATE`] for a request with an active skill,
/// rewriting `scripts/`, `templates/`, `assets/` path prefixes in
/// `skill_content` to absolute paths when the corresponding directory
/// exists under `skill_folder` (spec.md §4.6).
pub fn system_prompt_with_skill(
    work_path: &str,
    skill_folder: &std::path::Path,
    skill_content: &str,
) -> String {
    let mut content = skill_content.to_string();
    for prefix in ["scripts/", "templates/", "assets/"] {
        let resolved = skill_folder.join(prefix.trim_end_matches('/'));
        if resolved.is_dir() {
            let replacement = format!("{}{}", resolved.display(), std::path::MAIN_SEPARATOR);
            content = content.replace(prefix, &replacement);
        }
    }

    SYSTEM_PROMPT_TEMPLATE
        .replace("{{.WorkPath}}", work_path)
        .replace("{{.SkillPath}}", &skill_folder.display().to_string())
        .replace("{{.SkillExt}}", SKILL_EXTENSION_PROMPT)
        .replace("{{.Content}}", &content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn without_skill_uses_none_literal_and_empty_extension() {
        let prompt = system_prompt_without_skill("/work");
        assert!(prompt.contains("/work"));
        assert!(prompt.contains("Active skill path: None"));
        assert!(!prompt.contains(SKILL_EXTENSION_PROMPT));
    }

    #[test]
    fn with_skill_rewrites_known_prefixes_when_dir_exists() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("scripts")).unwrap();
        let prompt = system_prompt_with_skill("/work", dir.path(), "run scripts/build.sh");
        assert!(prompt.contains(&format!("{}", dir.path().join("scripts").display())));
        assert!(!prompt.contains("run scripts/build.sh"));
    }

    #[test]
    fn with_skill_leaves_prefix_untouched_when_dir_absent() {
        let dir = tempfile::tempdir().unwrap();
        let prompt = system_prompt_with_skill("/work", dir.path(), "run scripts/build.sh");
        assert!(prompt.contains("run scripts/build.sh"));
    }
}
