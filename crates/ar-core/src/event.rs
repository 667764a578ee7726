use tokio::sync::oneshot;

/// Typed event emitted from the core to the UI/consumer (spec.md §3, §9).
///
/// `ToolConfirm` carries a oneshot reply channel: the consumer sends `true`
/// to proceed or `false` to skip. The reasoning loop blocks on the reply.
#[derive(Debug)]
pub enum Event {
    Text(String),
    ToolCall {
        name: String,
        args: String,
        id: String,
    },
    ToolConfirm {
        name: String,
        args: String,
        id: String,
        reply: oneshot::Sender<bool>,
    },
    ToolResult {
        name: String,
        id: String,
        result: String,
    },
    ToolSkipped {
        name: String,
        id: String,
    },
    Error(String),
    Done,
}

impl Event {
    pub fn kind(&self) -> &'static str {
        match self {
            Event::Text(_) => "text",
            Event::ToolCall { .. } => "tool_call",
            Event::ToolConfirm { .. } => "tool_confirm",
            Event::ToolResult { .. } => "tool_result",
            Event::ToolSkipped { .. } => "tool_skipped",
            Event::Error(_) => "error",
            Event::Done => "done",
        }
    }
}
