//! Error types for the reliability engine

use std::fmt;

/// Result type for engine operations
pub type EngineResult<T> = std::result::Result<T, EngineError>;

/// Error types produced by the reliability engine.
///
/// Intentionally minimal — only the 3 variants the engine actually produces.
#[derive(Debug)]
pub enum EngineError {
    /// Malformed input or conversation-id mismatch
    Protocol { message: String },
    /// Send-side capacity errors (message too large for the window)
    Buffer { message: String },
    /// A segment exceeded the retransmission limit
    DeadLink,
}

impl EngineError {
    pub fn protocol(message: impl Into<String>) -> Self {
        EngineError::Protocol {
            message: message.into(),
        }
    }

    pub fn buffer(message: impl Into<String>) -> Self {
        EngineError::Buffer {
            message: message.into(),
        }
    }

    /// Check if this error means the conversation is beyond recovery
    pub fn is_fatal(&self) -> bool {
        matches!(self, EngineError::DeadLink)
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::Protocol { message } => write!(f, "protocol error: {message}"),
            EngineError::Buffer { message } => write!(f, "buffer error: {message}"),
            EngineError::DeadLink => write!(f, "retransmission limit exceeded"),
        }
    }
}

impl std::error::Error for EngineError {}
