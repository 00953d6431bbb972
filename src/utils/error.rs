//! Error types for the entire application.
//!
//! We use `thiserror` for library-style errors with custom types,
//! and `anyhow` for application-level error propagation in main.rs and commands.

use thiserror::Error;

/// Errors raised by a clock. Always fatal for the session.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClockError {
    #[error("Clock unavailable: {0}")]
    Unavailable(String),
}

/// Errors raised by the source retrieval collaborator
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    #[error("No source available for function {id}: {reason}")]
    Unavailable { id: u64, reason: String },
}

/// Errors surfaced by a profiling session
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Profiler is already running")]
    AlreadyRunning,

    #[error("Profiler is not running")]
    NotRunning,

    #[error("Clock failure: {0}")]
    Clock(#[from] ClockError),

    #[error("Session aborted after a fatal error: {0}")]
    Aborted(String),

    #[error("Event source failed to arm: {0}")]
    EventSource(String),
}

/// Errors that can occur while parsing a recorded trace
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("JSON deserialization failed: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Failed to read trace: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid trace format: {0}")]
    InvalidFormat(String),

    #[error("Event {index} references unknown function {id}")]
    UnknownFunction { index: usize, id: u64 },

    #[error("Event {index} goes back in time ({t} < {previous})")]
    NonMonotonic { index: usize, t: u64, previous: u64 },
}

/// Errors that can occur during file output
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Failed to write file: {0}")]
    WriteFailed(#[from] std::io::Error),

    #[error("Failed to serialize JSON: {0}")]
    SerializationFailed(#[from] serde_json::Error),

    #[error("Invalid output path: {0}")]
    InvalidPath(String),
}
