//! Error types for histogram construction and arithmetic.

use thiserror::Error;

/// Histogram error type
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed construction or import input (lengths, edge ordering, negative errors).
    #[error("Validation error: {0}")]
    Validation(String),

    /// Binary operation between histograms whose bin edges differ.
    #[error("Incompatible binning: {left} bins vs {right} bins with differing edges")]
    IncompatibleBinning {
        /// Bin count of the left operand.
        left: usize,
        /// Bin count of the right operand.
        right: usize,
    },

    /// Scalar operand that cannot be applied (non-finite, or a zero divisor).
    #[error("Invalid scalar operand: {0}")]
    InvalidScalar(f64),

    /// Inconsistent interval request.
    #[error("Invalid range: {0}")]
    InvalidRange(String),

    /// Lookup outside of the histogram range.
    #[error("Value {value} outside of histogram range [{low}, {high}]")]
    OutOfRange {
        /// Requested value (or bin index).
        value: f64,
        /// Lower bound of the valid range.
        low: f64,
        /// Upper bound of the valid range.
        high: f64,
    },

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
