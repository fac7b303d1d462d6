//! Error types for the ROOT histogram codec.

use thiserror::Error;

/// Errors that can occur decoding or encoding ROOT histogram objects.
#[derive(Error, Debug)]
pub enum RootError {
    /// Buffer underflow (tried to read past end).
    #[error("unexpected end of buffer at offset {offset}, need {need} bytes, have {have}")]
    BufferUnderflow {
        /// Current offset in buffer.
        offset: usize,
        /// Bytes requested.
        need: usize,
        /// Bytes remaining.
        have: usize,
    },

    /// Unsupported object class.
    #[error("unsupported class: {0}")]
    UnsupportedClass(String),

    /// Object deserialization error.
    #[error("deserialization error: {0}")]
    Deserialization(String),

    /// Histogram contents rejected by the core model.
    #[error(transparent)]
    Histogram(#[from] hs_core::Error),
}

impl From<RootError> for hs_core::Error {
    fn from(e: RootError) -> Self {
        match e {
            RootError::Histogram(inner) => inner,
            other => hs_core::Error::Validation(other.to_string()),
        }
    }
}

/// Result alias for ROOT operations.
pub type Result<T> = std::result::Result<T, RootError>;
