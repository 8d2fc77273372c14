//! Logger setup errors

/// Errors raised while building or installing a logger.
#[derive(Debug, thiserror::Error)]
pub enum LogError {
    /// The filter directive could not be parsed.
    #[error("invalid log filter: {0}")]
    Filter(String),

    #[error("invalid log configuration: {0}")]
    Config(String),

    /// A global subscriber was installed before this one.
    #[error("a global logger is already installed")]
    AlreadyInitialized,
}

pub type LogResult<T> = Result<T, LogError>;
