//! Error types for nib-core.

use std::io;

/// Error type for nib-core operations.
#[derive(Debug, thiserror::Error)]
pub enum NibCoreError {
    /// I/O error (stream write failures are fatal to the driver).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Layout calculation failed.
    #[error("layout error: {0}")]
    Layout(String),

    /// A tree invariant was violated; the current commit is aborted.
    #[error("invariant violation: {0}")]
    Invariant(String),

    /// Rendering failed.
    #[error("render error: {0}")]
    Render(String),
}

/// Result type alias for nib-core operations.
pub type Result<T> = std::result::Result<T, NibCoreError>;
