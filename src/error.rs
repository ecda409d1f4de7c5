//! Error types for svelte-mode

use thiserror::Error;

/// Result type alias for svelte-mode operations
pub type Result<T> = std::result::Result<T, ModeError>;

/// Mode error types
///
/// Everything the region core itself runs into (unterminated regions,
/// delimiters inside comments, stale tags) is recovered locally and never
/// shows up here. These are the failures that cross an API boundary.
#[derive(Error, Debug)]
pub enum ModeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("Position {0} is not on a character boundary")]
    InvalidPosition(usize),

    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("Language backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("{0}")]
    Message(String),
}
