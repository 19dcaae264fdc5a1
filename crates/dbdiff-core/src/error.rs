//! Error types for the diff engine.

/// Errors that can occur while building snapshots or rendering DDL.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DiffError {
    /// A table queued for creation carries no field list.
    #[error("Table '{table}' is queued for creation but has no fields")]
    MissingFields {
        /// Name of the table being created.
        table: String,
    },

    /// Two entries of the same kind share a name within one scope.
    #[error("Duplicate {kind} name: {name}")]
    DuplicateName {
        /// What was duplicated ("table", "field", "index").
        kind: &'static str,
        /// The offending name.
        name: String,
    },
}

/// Result type for diff engine operations.
pub type Result<T> = std::result::Result<T, DiffError>;
