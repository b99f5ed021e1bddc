//! Error handling for the eegflow pipeline
//!
//! One error type covers every framework operation so stage boundaries
//! can propagate with `?` without conversion noise.

use core::fmt;

/// Result type alias for eegflow operations
pub type EegResult<T> = Result<T, EegError>;

/// Error taxonomy for pipeline operations
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum EegError {
    /// Invalid parameter combination, rejected at configuration time
    InvalidConfiguration {
        /// Description of the configuration error
        message: String,
    },

    /// Channel count of an input doesn't match the configured count
    ChannelMismatch {
        /// Configured channel count
        expected: usize,
        /// Channel count actually seen
        actual: usize,
    },

    /// An epoch's shape doesn't match the configured transform
    TransformError {
        /// Description of the shape mismatch
        message: String,
    },

    /// The upstream sample source disconnected or errored
    SourceError {
        /// Source-level error description
        message: String,
    },

    /// A recording session failed before completion
    RecordingError {
        /// Recording error description
        message: String,
    },

    /// Bounded buffer capacity exceeded
    BufferOverflow {
        /// Available capacity
        capacity: usize,
        /// Requested size
        requested: usize,
    },
}

impl fmt::Display for EegError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EegError::InvalidConfiguration { message } => {
                write!(f, "Invalid configuration: {}", message)
            }
            EegError::ChannelMismatch { expected, actual } => {
                write!(f, "Channel mismatch: expected {}, got {}", expected, actual)
            }
            EegError::TransformError { message } => {
                write!(f, "Transform error: {}", message)
            }
            EegError::SourceError { message } => {
                write!(f, "Sample source error: {}", message)
            }
            EegError::RecordingError { message } => {
                write!(f, "Recording error: {}", message)
            }
            EegError::BufferOverflow { capacity, requested } => {
                write!(f, "Buffer overflow: capacity {}, requested {}", capacity, requested)
            }
        }
    }
}

impl std::error::Error for EegError {}

/// Convenience macro for creating configuration errors
#[macro_export]
macro_rules! config_error {
    ($($arg:tt)*) => {
        $crate::error::EegError::InvalidConfiguration {
            message: format!($($arg)*),
        }
    };
}
