/// Error kinds surfaced at the provider boundary (spec.md §7: "provider API
/// error" / "exceeded max_tokens").
#[derive(thiserror::Error, Debug)]
pub enum ProviderError {
    #[error("missing credential: {0}")]
    MissingCredential(String),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("provider API error: {0}")]
    Api(String),

    #[error("exceeded max_tokens ({0})")]
    MaxTokensExceeded(u32),

    #[error("copilot authentication failed: {0}")]
    Auth(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
