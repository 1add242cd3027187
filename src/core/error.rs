//! Error types for the logger system

use super::level::Level;
use super::registry::Namespace;
use std::fmt;

pub type Result<T> = std::result::Result<T, LoggerError>;

/// Control transfer requested by a Fatal or Panic entry
///
/// Returned from [`Logger::emit`](crate::Logger::emit) after the write step so
/// that the outermost caller (or the configured
/// [`Terminator`](crate::Terminator)) decides how to stop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Abort {
    pub level: Level,
    /// The marshalled entry that triggered the abort
    pub entry: Vec<u8>,
}

impl Abort {
    pub fn is_panic(&self) -> bool {
        self.level == Level::Panic
    }

    pub fn is_fatal(&self) -> bool {
        self.level == Level::Fatal
    }
}

impl fmt::Display for Abort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.level, String::from_utf8_lossy(&self.entry))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    /// IO error with context
    #[error("IO error while {operation}: {source}")]
    IoOperation {
        operation: String,
        #[source]
        source: std::io::Error,
    },

    /// Generic IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Base64 armour could not be decoded
    #[error("base64 error: {0}")]
    Base64Error(#[from] base64::DecodeError),

    /// Payload length does not fit the one-byte length-of-length prefix
    #[error("frame payload of {len} bytes is too large to encode")]
    FrameTooLarge { len: usize },

    /// Length prefix is not a valid ASCII decimal number
    #[error("malformed frame length: {message}")]
    MalformedLength { message: String },

    /// End of stream inside a frame
    #[error("truncated frame while reading {stage}: expected {expected} bytes, got {actual}")]
    TruncatedFrame {
        stage: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Trailing separator byte did not match
    #[error("frame separator mismatch: expected {expected:#04x}, got {actual:#04x}")]
    SeparatorMismatch { expected: u8, actual: u8 },

    /// Malformed or incomplete entry envelope
    #[error("invalid entry envelope: {0}")]
    Envelope(String),

    /// Wire type key with no registered type
    #[error("unknown {namespace} type: {key}")]
    UnknownType { namespace: Namespace, key: String },

    /// Two distinct types produce the same wire key
    #[error("{namespace} type key collision: {key}")]
    KeyCollision { namespace: Namespace, key: String },

    /// Context or event type not declared in the specification
    #[error("{namespace} type {type_name} is not part of the specification")]
    InvalidType {
        namespace: Namespace,
        type_name: String,
    },

    /// Unknown level name or wire value
    #[error("invalid level: {0}")]
    InvalidLevel(String),

    /// Fatal or Panic severity control transfer
    #[error("abort at {}", .0.level)]
    Abort(Abort),

    /// Errors collected while draining a stream
    #[error("{} decode errors: [{}]", .0.len(), join_errors(.0))]
    Aggregate(Vec<LoggerError>),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

fn join_errors(errors: &[LoggerError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

impl LoggerError {
    /// Create an IO operation error with context
    pub fn io_operation(operation: impl Into<String>, source: std::io::Error) -> Self {
        LoggerError::IoOperation {
            operation: operation.into(),
            source,
        }
    }

    /// Create an envelope error
    pub fn envelope(message: impl Into<String>) -> Self {
        LoggerError::Envelope(message.into())
    }

    /// Create a malformed length error
    pub fn malformed_length(message: impl Into<String>) -> Self {
        LoggerError::MalformedLength {
            message: message.into(),
        }
    }

    /// Create a validation error for an undeclared type
    pub fn invalid_type(namespace: Namespace, type_name: impl Into<String>) -> Self {
        LoggerError::InvalidType {
            namespace,
            type_name: type_name.into(),
        }
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        LoggerError::Other(msg.into())
    }

    /// Whether this is a Fatal/Panic control transfer rather than a fault
    pub fn is_abort(&self) -> bool {
        matches!(self, LoggerError::Abort(_))
    }

    /// Whether this reports a specification/code mismatch
    pub fn is_validation(&self) -> bool {
        matches!(self, LoggerError::InvalidType { .. })
    }

    /// Whether the underlying byte source or sink failed
    ///
    /// Truncation is reported as a framing error, not an I/O error.
    pub fn is_io(&self) -> bool {
        matches!(
            self,
            LoggerError::IoError(_) | LoggerError::IoOperation { .. }
        )
    }
}
