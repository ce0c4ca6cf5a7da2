use thiserror::Error;

/// Errors that can occur when interacting with the backing store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Another session held the row lock for longer than the lock timeout.
    #[error("Timed out waiting for lock on {table}/{key}")]
    LockTimeout { table: String, key: String },

    /// A row with the same key already exists.
    #[error("Duplicate key {key} in table {table}")]
    DuplicateKey { table: String, key: String },

    /// The row to update does not exist.
    #[error("Row {key} not found in table {table}")]
    RowNotFound { table: String, key: String },

    /// The session was already committed or rolled back.
    #[error("Transaction is closed")]
    TransactionClosed,
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
