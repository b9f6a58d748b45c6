//! Error types for the navigation core.
//!
//! Errors here cover construction and configuration misuse only. Runtime
//! navigation conditions (out-of-range queries, absent routes, trapped
//! agents) are modeled as fail-soft return values, never as errors.

use thiserror::Error;

/// Result type alias using [`NavError`].
pub type Result<T> = std::result::Result<T, NavError>;

/// Top-level error type for navigation core construction failures.
#[derive(Debug, Error)]
pub enum NavError {
    /// Grid dimensions must both be positive.
    #[error("Invalid grid dimensions: {width}x{height}")]
    InvalidGridDimensions {
        /// Requested width in cells.
        width: u32,
        /// Requested height in cells.
        height: u32,
    },

    /// Bulk terrain write with the wrong number of cells.
    #[error("Cell count mismatch: expected {expected}, got {actual}")]
    CellCountMismatch {
        /// Cell count implied by the grid dimensions.
        expected: usize,
        /// Cell count actually supplied.
        actual: usize,
    },

    /// A configuration value is outside its legal range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
