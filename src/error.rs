//! Error types for the udpmux crate

use crate::frame::FrameError;
use thiserror::Error;
use udpmux_core::EngineError;

/// Result type for udpmux operations
pub type Result<T> = std::result::Result<T, MuxError>;

/// Errors surfaced across the crate boundary.
///
/// Most failure modes never reach the caller: malformed datagrams are
/// dropped, a full delivery channel counts a drop, and operations on a
/// closed session are no-ops. What remains is below.
#[derive(Error, Debug)]
pub enum MuxError {
    /// I/O related errors (bind, socket teardown)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Application frame codec errors
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),

    /// Reliability engine errors
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),

    /// The session was closed; pending and future receives resolve here
    #[error("session closed")]
    SessionClosed,

    /// Configuration errors
    #[error("configuration error: {message}")]
    Config { message: String },
}

impl MuxError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        MuxError::Config {
            message: message.into(),
        }
    }

    /// Check if this error means the session is gone
    pub fn is_closed(&self) -> bool {
        matches!(self, MuxError::SessionClosed)
    }
}
