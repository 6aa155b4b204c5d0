// Error types for substrate operations

use crate::value::ValueKind;

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StoreError {
    #[error("Unknown table: {0}")]
    UnknownTable(String),

    #[error("Table {table} cannot store a {kind} value")]
    DataClone { table: String, kind: ValueKind },

    #[error("Write to {0} inside a read-only transaction")]
    ReadOnly(String),

    #[error("Write to {0} denied")]
    WriteDenied(String),

    #[error("Transaction aborted: {0}")]
    Aborted(String),

    #[error("Database {0} is closed")]
    Closed(String),

    #[error("Database {name} is at version {current}, cannot open at {requested}")]
    Version {
        name: String,
        current: u32,
        requested: u32,
    },

    #[error("Table {0} already exists")]
    TableExists(String),
}

impl StoreError {
    /// True when the failure ended the enclosing transaction.
    #[must_use]
    pub fn is_abort(&self) -> bool {
        matches!(self, StoreError::Aborted(_))
    }
}
