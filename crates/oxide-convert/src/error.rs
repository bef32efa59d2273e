//! Error types for the conversion kernel.

/// Errors that can occur while converting a schema.
///
/// Most of these are recovered from inside the engine and turned into
/// [`Diagnostics`](crate::diagnostics::Diagnostics) entries; only the
/// loading helpers and the public per-table entry points hand them to the
/// caller.
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    /// A foreign key references a table that is not in the source schema.
    #[error(
        "Foreign key '{foreign_key}' on table '{table_id}' references unknown table '{referenced_table_id}'"
    )]
    UnresolvedReference {
        /// Owning table id.
        table_id: String,
        /// Foreign key name.
        foreign_key: String,
        /// The missing referenced table id.
        referenced_table_id: String,
    },

    /// A foreign key's owning and referenced column lists differ in length.
    #[error(
        "Foreign key '{foreign_key}' on table '{table_id}' has {columns} column(s) but references {referenced_columns}"
    )]
    ColumnCountMismatch {
        /// Owning table id.
        table_id: String,
        /// Foreign key name.
        foreign_key: String,
        /// Number of owning columns.
        columns: usize,
        /// Number of referenced columns.
        referenced_columns: usize,
    },

    /// A table id was not found in the schema it was looked up in.
    #[error("Table not found: {0}")]
    UnknownTable(String),

    /// The expression verification service could not be reached or answered
    /// with something unusable.
    #[error("Expression verification failed: {0}")]
    Verification(String),

    /// Conversion options failed validation.
    #[error("Invalid options: {0}")]
    InvalidOptions(String),

    /// IO error (reading schema or options files, talking to a verifier process).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ConvertError {
    /// Creates an `UnresolvedReference` error.
    pub fn unresolved(
        table_id: impl Into<String>,
        foreign_key: impl Into<String>,
        referenced_table_id: impl Into<String>,
    ) -> Self {
        Self::UnresolvedReference {
            table_id: table_id.into(),
            foreign_key: foreign_key.into(),
            referenced_table_id: referenced_table_id.into(),
        }
    }
}

/// Result type for conversion operations.
pub type Result<T> = std::result::Result<T, ConvertError>;
