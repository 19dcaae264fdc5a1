//! Error types for schema acquisition and the CLI.

use std::path::PathBuf;

use dbdiff_core::DiffError;

/// Errors that can occur while fetching, diffing or rendering schemas.
#[derive(Debug, thiserror::Error)]
pub enum DbDiffError {
    /// Database error while connecting or reading metadata.
    #[error(transparent)]
    Database(#[from] sqlx::Error),

    /// Serialization/deserialization error.
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    /// IO error (reading/writing snapshot files).
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The diff engine rejected its input.
    #[error(transparent)]
    Diff(#[from] DiffError),

    /// No backend is registered under this identifier.
    #[error("{kind} is not supported, available: {}", .available.join(", "))]
    UnsupportedDriver {
        /// The requested backend identifier.
        kind: String,
        /// Registered identifiers.
        available: Vec<String>,
    },

    /// A snapshot file could not be read as a schema.
    #[error("Invalid snapshot file '{path}': {source}")]
    InvalidSnapshot {
        /// Path to the snapshot file.
        path: PathBuf,
        /// Underlying parse error.
        source: serde_json::Error,
    },
}

/// Result type for dbdiff operations.
pub type Result<T> = std::result::Result<T, DbDiffError>;
