//! Error types for the durable store.

use std::path::{Path, PathBuf};

use agritrace_core::ValidationError;
use agritrace_types::LotId;

/// Errors that can occur while loading, saving or exporting lots.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A record in the data file (or a lot about to be written) is invalid.
    #[error("invalid lot data: {0}")]
    Validation(#[from] ValidationError),

    /// The data file is valid JSON but not the expected shape.
    #[error("invalid data file format: {0}")]
    Format(String),

    /// Two lots share an id.
    #[error("duplicate lot id: {0}")]
    DuplicateId(LotId),

    /// A filesystem operation failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// The file or directory involved.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The data file is not valid JSON, or serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Writing the CSV export failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl StoreError {
    /// Build a mapper that attaches `path` to an I/O error.
    pub(crate) fn io(path: &Path) -> impl FnOnce(std::io::Error) -> Self + '_ {
        move |source| Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}
