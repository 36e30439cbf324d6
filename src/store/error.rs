//! Store Errors
//!
//! Error types for record store operations.

/// Errors that can occur in the record store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The database could not be opened or did not answer a ping
    #[error("Connection error: {0}")]
    Connection(#[source] sqlx::Error),

    /// No store handle was provided to the caller
    #[error("No store handle attached")]
    NoHandle,

    /// The driver rejected or failed a statement
    #[error("Execution error: {0}")]
    Execution(#[from] sqlx::Error),

    /// Zero rows matched a single-row lookup
    #[error("Record not found in {table}: {id}")]
    NotFound { table: String, id: String },

    /// Handle is neither a store nor an open transaction
    #[error("Invalid handle: expected a store or an open transaction")]
    TransactionType,

    /// Table or column name is not a plain SQL identifier
    #[error("Invalid identifier: {0:?}")]
    InvalidIdentifier(String),

    /// Placeholder count does not match the bound arguments
    #[error("Predicate has {placeholders} placeholders but {args} arguments")]
    PlaceholderMismatch { placeholders: usize, args: usize },

    /// Predicate uses a placeholder form other than a bare `?`
    #[error("Unsupported placeholder in predicate: {0:?}")]
    InvalidPlaceholder(String),

    /// Update called without any column to set
    #[error("Update requires at least one column")]
    EmptyChanges,

    /// Column is not part of the record, or may not be changed
    #[error("Unknown or immutable column {column:?} for table {table}")]
    UnknownColumn { table: &'static str, column: String },

    /// Write attempted through a read-only transaction
    #[error("Write attempted in a read-only transaction")]
    ReadOnly,

    /// Schema migration failed
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Rollback failed after the transaction body returned an error
    #[error("Rollback failed ({rollback}) - {cause}")]
    Rollback {
        rollback: sqlx::Error,
        #[source]
        cause: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl StoreError {
    /// Check if this error is a zero-row lookup
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }

    /// Check if this error is caused by the caller rather than the database
    pub fn is_misuse(&self) -> bool {
        matches!(
            self,
            StoreError::NoHandle
                | StoreError::TransactionType
                | StoreError::InvalidIdentifier(_)
                | StoreError::PlaceholderMismatch { .. }
                | StoreError::InvalidPlaceholder(_)
                | StoreError::EmptyChanges
                | StoreError::UnknownColumn { .. }
                | StoreError::ReadOnly
        )
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
