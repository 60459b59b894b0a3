//! Error types for the core state machines.
//!
//! Lookup misses are only errors when the caller opts into strict handling
//! via [`crate::MissingKey::Error`]; the default policy logs and ignores.

use thiserror::Error;

/// Errors from table operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TableError {
    /// A row key was not present in the current row set.
    #[error("unknown row key: {key}")]
    UnknownRowKey {
        /// The key that was looked up.
        key: String,
    },

    /// A column name was not declared for this table.
    #[error("unknown column: {column}")]
    UnknownColumn {
        /// The column that was looked up.
        column: String,
    },
}
