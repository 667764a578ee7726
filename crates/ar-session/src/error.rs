/// Error kinds surfaced by session open/resume/persist (spec.md §7:
/// "Config lock failure" / "Session I/O corruption").
#[derive(thiserror::Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Config(#[from] ar_config::ConfigError),

    #[error("session history is corrupt: {0}")]
    Corrupt(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
