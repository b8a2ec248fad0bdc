//! Error types for the neuronorm library.
//!
//! Conversion failures are deliberately cheap to recover from: the report layer
//! treats them as a per-field "no data" state rather than aborting, so the
//! variants here carry enough context for the callers that do want to surface
//! them (document loading in particular).

use std::io;

use thiserror::Error;

/// Main result type for neuronorm operations.
pub type Result<T> = std::result::Result<T, NeuronormError>;

/// Comprehensive error type for all neuronorm operations.
#[derive(Error, Debug)]
pub enum NeuronormError {
    /// A score handed to the converter was not a usable number
    #[error("Invalid score: {message}")]
    InvalidScore {
        /// Error description
        message: String,
    },

    /// A scale identifier outside the registered set
    #[error("Unknown norm scale: '{token}'")]
    UnknownScale {
        /// The unrecognized identifier token
        token: String,
    },

    /// A persisted document is missing required structure
    #[error("Malformed document: {message}")]
    MalformedDocument {
        /// Error description
        message: String,
    },

    /// I/O related errors (file operations)
    #[error("I/O error: {message}")]
    Io {
        /// Human-readable error message
        message: String,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Serialization/deserialization errors
    #[error("Serialization error: {message}")]
    Serialization {
        /// Error description
        message: String,
        /// Underlying serialization error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl NeuronormError {
    /// Create a new invalid-score error
    pub fn invalid_score(message: impl Into<String>) -> Self {
        Self::InvalidScore {
            message: message.into(),
        }
    }

    /// Create a new unknown-scale error for an identifier token
    pub fn unknown_scale(token: impl Into<String>) -> Self {
        Self::UnknownScale {
            token: token.into(),
        }
    }

    /// Create a new malformed-document error
    pub fn malformed_document(message: impl Into<String>) -> Self {
        Self::MalformedDocument {
            message: message.into(),
        }
    }

    /// Create a new I/O error with context
    pub fn io(message: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }
}

// Implement From traits for common error types
impl From<io::Error> for NeuronormError {
    fn from(err: io::Error) -> Self {
        Self::io("I/O operation failed", err)
    }
}

impl From<serde_json::Error> for NeuronormError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            message: format!("JSON serialization failed: {err}"),
            source: Some(Box::new(err)),
        }
    }
}
