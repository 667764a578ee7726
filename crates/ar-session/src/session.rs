use ar_core::Message;

/// Durable per-session conversation state (spec.md §3).
///
/// `messages` is the prompt-ready window sent to the provider on the next
/// turn; `histories` is the long-term append-only log persisted to
/// `history.json`; `tools` is the per-turn tool-result log persisted to a
/// dated file under the session directory (only when non-empty).
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub id: String,
    pub messages: Vec<Message>,
    pub histories: Vec<Message>,
    pub tools: Vec<Message>,
}
