//! Session store: durable conversation state, resume-or-create context
//! construction, and the history/tool-log/summary persistence layer
//! (spec.md §3, §4.5; ground truth: `internal/agents/exec/getSession.go`).

mod error;
mod session;
mod store;
mod summary;

pub use error::SessionError;
pub use session::Session;
pub use store::{open_or_create, write_tool_log, write_turn};
pub use summary::{build_summary_system_message, extract_summary, read_summary, write_summary};
