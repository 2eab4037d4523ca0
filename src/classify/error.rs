//! Classification error types.

use thiserror::Error;

/// Errors produced while assigning a module to a bundle.
#[derive(Debug, Error)]
pub enum ClassifyError {
    /// The module lives in the dependency store but no package name could be
    /// read from its path.
    #[error("module context '{context}' is inside '{marker}' but names no package")]
    MalformedStorePath { context: String, marker: String },

    /// The configured dependency-store marker does not form a valid pattern.
    #[error("invalid dependency store pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}
