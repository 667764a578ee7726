/// Error kinds shared across crates (spec.md §7).
#[derive(thiserror::Error, Debug)]
pub enum CoreError {
    #[error("config lock held by another process: {0}")]
    ConfigLocked(String),

    #[error("session state is corrupt: {0}")]
    SessionCorrupt(String),

    #[error("provider API error: {0}")]
    ProviderError(String),

    #[error("exceeded max_tokens ({0})")]
    MaxTokensExceeded(u32),

    #[error("tool '{0}' is not registered")]
    UnknownTool(String),

    #[error("invalid tool arguments for '{tool}': {message}")]
    InvalidToolArguments { tool: String, message: String },

    #[error("path '{0}' is excluded by ignore rules")]
    PathExcluded(String),
}
