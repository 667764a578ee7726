/// Error kinds surfaced at the `ar-config` boundary (spec.md §7: "Config
/// lock failure" / "Session I/O corruption").
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("config lock failure: {0}")]
    Lock(String),

    #[error("config.json is corrupt: {0}")]
    Corrupt(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
