//! Error types shared across the crate.

use std::fmt::{Display, Formatter};

/// Shared result type.
pub type Result<T> = std::result::Result<T, AppError>;

/// Error enumeration covering every stack and persistence failure mode.
///
/// None of these are fatal to the host process; callers decide whether to
/// retry, abandon the nested task, or surface the failure to a human.
#[derive(Debug)]
pub enum AppError {
    /// Configuration parsing or validation failure.
    Config(String),
    /// Durable read or write failed; in-memory stack state is unchanged.
    Persistence(String),
    /// A stored snapshot or checkpoint failed validation on read-back.
    CorruptSnapshot(String),
    /// `interrupt` attempted while the stack is already at maximum depth.
    DepthLimitExceeded(String),
    /// Operation requires a session that does not exist.
    EmptyStack(String),
    /// `begin` (or a restore) called while a stack is already live.
    AlreadyRunning(String),
    /// Root session cannot finish while nested sessions remain open.
    Unresolved(String),
    /// Requested entity does not exist.
    NotFound(String),
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Persistence(msg) => write!(f, "persistence: {msg}"),
            Self::CorruptSnapshot(msg) => write!(f, "corrupt snapshot: {msg}"),
            Self::DepthLimitExceeded(msg) => write!(f, "depth limit exceeded: {msg}"),
            Self::EmptyStack(msg) => write!(f, "empty stack: {msg}"),
            Self::AlreadyRunning(msg) => write!(f, "already running: {msg}"),
            Self::Unresolved(msg) => write!(f, "unresolved: {msg}"),
            Self::NotFound(msg) => write!(f, "not found: {msg}"),
        }
    }
}

impl std::error::Error for AppError {}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(format!("invalid config: {err}"))
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        Self::Persistence(err.to_string())
    }
}
