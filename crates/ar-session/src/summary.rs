//! `extractSummary` and the `summary.json` system-prompt wrapper
//! (spec.md §4.6, §9: "if output begins with `<summary>…</summary>`,
//! persist the inner block and return the remainder; otherwise return the
//! input unchanged").

use std::path::Path;

const SUMMARY_TAG_OPEN: &str = "<summary>";
const SUMMARY_TAG_CLOSE: &str = "</summary>";

/// Template the resumed-session summary is wrapped in before being appended
/// as a system message (spec.md §4.5 step 2).
pub const SUMMARY_PROMPT_TEMPLATE: &str =
    "The following is a summary of the earlier part of this conversation, provided for context:\n\n{{.Summary}}";

/// Split a leading `<summary>...</summary>` block from `text`.
///
/// Returns `(Some(inner), remainder)` when the text begins with the block
/// (after trimming leading whitespace); otherwise `(None, text)` unchanged.
pub fn extract_summary(text: &str) -> (Option<String>, String) {
    let trimmed = text.trim_start();
    if let Some(rest) = trimmed.strip_prefix(SUMMARY_TAG_OPEN) {
        if let Some(idx) = rest.find(SUMMARY_TAG_CLOSE) {
            let inner = rest[..idx].trim().to_string();
            let remainder = rest[idx + SUMMARY_TAG_CLOSE.len()..].trim().to_string();
            return (Some(inner), remainder);
        }
    }
    (None, text.to_string())
}

/// Expand [`SUMMARY_PROMPT_TEMPLATE`] with `summary`'s contents.
pub fn build_summary_system_message(summary: &str) -> String {
    SUMMARY_PROMPT_TEMPLATE.replace("{{.Summary}}", summary)
}

pub fn read_summary(session_dir: &Path) -> Option<String> {
    std::fs::read_to_string(session_dir.join("summary.json"))
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

pub fn write_summary(session_dir: &Path, summary: &str) -> std::io::Result<()> {
    std::fs::create_dir_all(session_dir)?;
    std::fs::write(session_dir.join("summary.json"), summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_summary_block_and_remainder() {
        let (summary, remainder) =
            extract_summary("<summary>earlier context</summary>final answer text");
        assert_eq!(summary.as_deref(), Some("earlier context"));
        assert_eq!(remainder, "final answer text");
    }

    #[test]
    fn passthrough_when_no_summary_block() {
        let (summary, remainder) = extract_summary("just a plain answer");
        assert!(summary.is_none());
        assert_eq!(remainder, "just a plain answer");
    }

    #[test]
    fn passthrough_when_block_unclosed() {
        let (summary, remainder) = extract_summary("<summary>never closed");
        assert!(summary.is_none());
        assert_eq!(remainder, "<summary>never closed");
    }

    #[test]
    fn tolerates_leading_whitespace() {
        let (summary, _) = extract_summary("  \n<summary>s</summary>rest");
        assert_eq!(summary.as_deref(), Some("s"));
    }
}
