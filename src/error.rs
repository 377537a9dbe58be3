use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by the session core.
///
/// Every variant is fail-fast: nothing here is retryable, all operations are
/// in-memory and deterministic once construction succeeded.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The controller is meaningless without somewhere to read power states from.
    #[error("Session controller requires a power state source")]
    MissingPowerSource,

    #[error("Session controller requires a boot metadata source")]
    MissingBootMetadata,

    #[error("Failed to load configuration from {path}: {message}")]
    Config { path: PathBuf, message: String },
}

pub type Result<T, E = SessionError> = std::result::Result<T, E>;
