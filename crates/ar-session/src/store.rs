//! Resume-or-create and persistence for a [`Session`] (spec.md §4.5;
//! ground truth: `internal/agents/exec/getSession.go`).

use std::path::Path;

use ar_config::{registry, ConfigLock};
use ar_core::Message;

use crate::error::SessionError;
use crate::session::Session;
use crate::summary::{build_summary_system_message, read_summary};

/// Open (resuming prior context) or create the current session under
/// `config_root`, and build the initial message window for `user_input`
/// (spec.md §4.5 "Context construction for a new user turn").
///
/// `system_prompt` is the fully-substituted system prompt for this turn
/// (skill-aware substitution happens one layer up, in `ar-runtime`).
/// `now_unix` is the caller-supplied current Unix timestamp, so this
/// function stays a pure, testable transform over its inputs.
pub fn open_or_create(
    config_root: &Path,
    system_prompt: impl Into<String>,
    user_input: &str,
    now_unix: i64,
) -> Result<Session, SessionError> {
    let _lock = ConfigLock::acquire(config_root)?;
    let session_id = registry::ensure_session_id(config_root)?;
    let session_dir = ar_config::paths::session_dir(config_root, &session_id);
    std::fs::create_dir_all(&session_dir)?;

    let mut messages = vec![Message::system(system_prompt)];
    let mut histories = Vec::new();

    if let Some(summary) = read_summary(&session_dir) {
        messages.push(Message::system(build_summary_system_message(&summary)));
    }

    if let Ok(contents) = std::fs::read_to_string(session_dir.join("history.json")) {
        let loaded: Vec<Message> = serde_json::from_str(&contents)
            .map_err(|e| SessionError::Corrupt(format!("history.json: {e}")))?;
        let tail_start = loaded.len().saturating_sub(4);
        messages.extend(loaded[tail_start..].iter().cloned());
        histories = loaded;
    }

    let turn = format!("ts:{now_unix}\n{}", user_input.trim());
    histories.push(Message::user(turn.clone()));
    messages.push(Message::user(turn));

    Ok(Session {
        id: session_id,
        messages,
        histories,
        tools: Vec::new(),
    })
}

/// Append the assistant's displayed turn to `session.messages` and
/// `session.histories`, then persist `histories` to `history.json`
/// (spec.md §4.6 step 5; P5).
pub fn write_turn(
    config_root: &Path,
    session: &mut Session,
    displayed_text: &str,
    now_unix: i64,
) -> Result<(), SessionError> {
    let turn = format!("ts:{now_unix}\n{displayed_text}");
    session.messages.push(Message::assistant(turn.clone()));
    session.histories.push(Message::assistant(turn));

    let session_dir = ar_config::paths::session_dir(config_root, &session.id);
    std::fs::create_dir_all(&session_dir)?;
    let body = serde_json::to_string_pretty(&session.histories)?;
    std::fs::write(session_dir.join("history.json"), body)?;
    Ok(())
}

/// Write the per-turn tool-action log to
/// `<session>/<YYYY-MM-DD>/<YYYY-MM-DD-HH-MM-SS>.json`, but only when
/// `session.tools` is non-empty (SPEC_FULL.md §4.6: "an empty tool log is
/// never created for a turn with zero tool calls").
pub fn write_tool_log(
    config_root: &Path,
    session: &Session,
    now: chrono::DateTime<chrono::Utc>,
) -> Result<(), SessionError> {
    if session.tools.is_empty() {
        return Ok(());
    }
    let session_dir = ar_config::paths::session_dir(config_root, &session.id);
    let date_dir = session_dir.join(now.format("%Y-%m-%d").to_string());
    std::fs::create_dir_all(&date_dir)?;
    let filename = format!("{}.json", now.format("%Y-%m-%d-%H-%M-%S"));
    let body = serde_json::to_string_pretty(&session.tools)?;
    std::fs::write(date_dir.join(filename), body)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn first_run_mints_session_and_appends_user_turn() {
        let dir = tempdir().unwrap();
        let session = open_or_create(dir.path(), "sys", "hello", 1_700_000_000).unwrap();
        assert_eq!(session.messages.len(), 2); // system + user
        assert_eq!(session.histories.len(), 1);
        assert_eq!(session.histories[0].content.as_deref().unwrap(), "ts:1700000000\nhello");
    }

    #[test]
    fn resume_appends_last_four_history_entries() {
        let dir = tempdir().unwrap();
        let session_id = ar_config::registry::ensure_session_id(dir.path()).unwrap();
        let session_dir = ar_config::paths::session_dir(dir.path(), &session_id);
        std::fs::create_dir_all(&session_dir).unwrap();
        let old: Vec<Message> = (0..10)
            .map(|i| Message::user(format!("turn {i}")))
            .collect();
        std::fs::write(
            session_dir.join("history.json"),
            serde_json::to_string(&old).unwrap(),
        )
        .unwrap();

        let session = open_or_create(dir.path(), "sys", "new input", 1_700_000_100).unwrap();
        // system + last 4 old + new user turn
        assert_eq!(session.messages.len(), 1 + 4 + 1);
        assert_eq!(session.histories.len(), 11);
    }

    #[test]
    fn resume_includes_summary_system_message() {
        let dir = tempdir().unwrap();
        let session_id = ar_config::registry::ensure_session_id(dir.path()).unwrap();
        let session_dir = ar_config::paths::session_dir(dir.path(), &session_id);
        std::fs::create_dir_all(&session_dir).unwrap();
        std::fs::write(session_dir.join("summary.json"), "earlier stuff").unwrap();

        let session = open_or_create(dir.path(), "sys", "hi", 1_700_000_200).unwrap();
        assert_eq!(session.messages.len(), 3); // system + summary + user
        assert!(session.messages[1]
            .content
            .as_deref()
            .unwrap()
            .contains("earlier stuff"));
    }

    #[test]
    fn write_turn_persists_exactly_two_new_entries_p5() {
        let dir = tempdir().unwrap();
        let session_id = ar_config::registry::ensure_session_id(dir.path()).unwrap();
        let session_dir = ar_config::paths::session_dir(dir.path(), &session_id);
        std::fs::create_dir_all(&session_dir).unwrap();
        let old: Vec<Message> = vec![Message::user("old 1"), Message::assistant("old 2")];
        std::fs::write(session_dir.join("history.json"), serde_json::to_string(&old).unwrap()).unwrap();

        let mut session = open_or_create(dir.path(), "sys", "question", 1_700_000_300).unwrap();
        write_turn(dir.path(), &mut session, "the answer", 1_700_000_301).unwrap();

        let on_disk: Vec<Message> =
            serde_json::from_str(&std::fs::read_to_string(session_dir.join("history.json")).unwrap())
                .unwrap();
        assert_eq!(on_disk.len(), 4);
        assert!(on_disk[2].content.as_deref().unwrap().contains("question"));
        assert!(on_disk[3].content.as_deref().unwrap().contains("the answer"));
    }

    #[test]
    fn empty_tool_log_is_never_written() {
        let dir = tempdir().unwrap();
        let session = Session {
            id: "s".into(),
            ..Default::default()
        };
        let now = chrono::Utc::now();
        write_tool_log(dir.path(), &session, now).unwrap();
        let session_dir = ar_config::paths::session_dir(dir.path(), "s");
        assert!(!session_dir.join(now.format("%Y-%m-%d").to_string()).exists());
    }

    #[test]
    fn corrupt_history_json_is_an_error() {
        let dir = tempdir().unwrap();
        let session_id = ar_config::registry::ensure_session_id(dir.path()).unwrap();
        let session_dir = ar_config::paths::session_dir(dir.path(), &session_id);
        std::fs::create_dir_all(&session_dir).unwrap();
        std::fs::write(session_dir.join("history.json"), "{not json").unwrap();

        assert!(open_or_create(dir.path(), "sys", "hi", 1_700_000_400).is_err());
    }
}
