/// Error kinds surfaced at the `ar-tools` boundary (spec.md §7).
///
/// Per spec.md §4.2, tool handler failures are *not* meant to unwind the
/// reasoning loop — the loop boundary turns `Err(ToolError)` into a tool
/// result string (`"no data"` or `"Error: ..."`). `ToolError::ArgsParse` is
/// the one variant spec.md calls out as propagating instead (invalid JSON
/// arguments), left to the caller to decide.
#[derive(thiserror::Error, Debug)]
pub enum ToolError {
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    #[error("failed to parse tool arguments: {0}")]
    ArgsParse(#[from] serde_json::Error),

    #[error("path is excluded: {0}")]
    PathExcluded(String),

    #[error("{0} is not an allowed command")]
    CommandNotAllowed(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{0}")]
    Message(String),
}
