//! Error types shared by every layer operation.

use thiserror::Error;

use super::layer::LayerId;

/// Errors raised by layer creation, learning, inference and the layer repository.
#[derive(Debug, Error)]
pub enum LayerError {
    /// The settings cannot produce a valid layer.
    #[error("Configuration error: {message}")]
    Configuration {
        /// What is wrong with the settings
        message: String,
    },

    /// An input or one-hot output vector is malformed.
    #[error("Invalid input: {message}")]
    InvalidInput {
        /// What is wrong with the vector
        message: String,
    },

    /// No column fired, so there is nothing to average over.
    #[error("No active columns")]
    EmptyActivation,

    /// No layer is registered under this id.
    #[error("Layer not found: {0}")]
    NotFound(LayerId),

    /// Settings could not be parsed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Settings file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl LayerError {
    /// Create a Configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create an InvalidInput error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Create an InvalidInput error for a vector of the wrong length.
    pub fn length_mismatch(what: &str, expected: usize, actual: usize) -> Self {
        Self::invalid_input(format!("{what} has length {actual}, expected {expected}"))
    }
}

/// Result alias for layer operations.
pub type Result<T> = std::result::Result<T, LayerError>;
