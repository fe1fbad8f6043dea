use thiserror::Error;

/// Unified error surface for the CLI entry points.
///
/// The three terminal kinds the scan contract distinguishes map onto
/// `Usage` (invalid invocation input, caught before any file I/O),
/// `Plan(PlanError::Read)` (input unreadable), and `Plan(PlanError::Parse)`
/// (malformed or schema-incompatible JSON).
#[derive(Debug, Error)]
pub enum PlangateError {
    #[error("usage error: {0}")]
    Usage(String),

    #[error(transparent)]
    Plan(#[from] crate::plan::PlanError),

    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),

    #[error(transparent)]
    Version(#[from] crate::version::VersionError),

    #[error("failed to encode output: {0}")]
    Encode(serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
