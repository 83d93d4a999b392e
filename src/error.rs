//! Error taxonomy for the weave pass.
//!
//! All variants are recoverable at the file-set level: the engine logs them,
//! records them in the report, and moves on to the next aspect or file.

/// Error types for weave operations.
#[derive(Debug, thiserror::Error)]
pub enum WeaveError {
    /// Source was unparsable at phase entry; the phase is skipped for the file
    #[error("failed to parse source: {0}")]
    Parse(String),

    /// An around-rewrite produced text that no longer parses; the rewrite is
    /// discarded and the prior buffer retained
    #[error("rewrite produced unparsable source: {0}")]
    Format(String),

    /// Read or write failure against the backing store
    #[error("io error on {path}: {source}")]
    Io {
        /// File the operation targeted
        path: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
}

impl WeaveError {
    /// Build an Io variant from a path and error
    pub fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        WeaveError::Io {
            path: path.to_string_lossy().to_string(),
            source,
        }
    }
}
