/// Error kinds surfaced by [`crate::run`] / [`crate::execute`] (spec.md §7).
///
/// Tool execution and argument-parse errors never reach this type — they
/// are folded into a tool-result string at the reasoning-loop boundary
/// (SPEC_FULL.md §7) and never propagate as `Err`.
#[derive(thiserror::Error, Debug)]
pub enum RuntimeError {
    #[error(transparent)]
    Session(#[from] ar_session::SessionError),

    #[error(transparent)]
    Config(#[from] ar_config::ConfigError),

    #[error(transparent)]
    Provider(#[from] ar_providers::ProviderError),

    #[error("current working directory unavailable: {0}")]
    WorkDir(std::io::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
