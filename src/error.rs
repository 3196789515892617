//! Error types for view construction and assignment

use thiserror::Error;

/// Result type for subvector operations
pub type Result<T> = std::result::Result<T, ViewError>;

/// Errors surfaced at the two validation points of the engine
///
/// Both are reported before anything is written, so a failed call leaves
/// the target untouched.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ViewError {
    /// View range exceeds the parent container
    #[error("Invalid subvector range: offset {offset} + length {length} exceeds size {size}")]
    InvalidRange {
        /// Requested first element
        offset: usize,
        /// Requested number of elements
        length: usize,
        /// Size of the container the view was requested on
        size: usize,
    },

    /// Size mismatch between assignment target and source
    #[error("Size mismatch: expected {expected}, got {actual}")]
    SizeMismatch {
        /// Expected size
        expected: usize,
        /// Actual size
        actual: usize,
    },
}
