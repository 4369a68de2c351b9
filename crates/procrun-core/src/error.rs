//! Error types for procrun operations

use std::io;
use thiserror::Error;

/// Result type for procrun operations
pub type Result<T> = std::result::Result<T, RunError>;

/// Errors that can occur while preparing or supervising a run, or in the
/// filesystem and text helpers.
///
/// `run` itself never returns these: ordinary command failures are folded
/// into the execution result.
#[derive(Error, Debug)]
pub enum RunError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("failed to start `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Syscall error: {0}")]
    Syscall(String),

    #[error("Invalid glob pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("Glob error: {0}")]
    Glob(#[from] glob::GlobError),

    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Index {index} out of bounds for length {len}")]
    InvalidIndex { index: usize, len: usize },
}
