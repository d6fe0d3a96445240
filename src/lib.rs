//! # Feedstore - Schema-Versioned Embedded Record Store
//!
//! A minimal embedded storage abstraction over SQLite.
//!
//! Feedstore provides:
//! - Value-typed schema contracts (table + columns) from which the DDL derives
//! - A store lifecycle manager with a fixed drop-and-recreate reconcile policy
//! - Read/write handles with parameterized insert/query/update/delete/count
//! - Borrow-scoped query cursors that cannot leak past their handle

pub mod contract;
pub mod value;
pub mod predicate;
pub mod entry;
pub mod rows;
pub mod store;
pub mod config;

// Re-exports for convenient access
pub use contract::{ColumnDef, ColumnKind, StoreProfile, TableContract, ID_COLUMN};
pub use entry::Entry;
pub use predicate::{Direction, OrderBy, Predicate, Query};
pub use rows::{Row, Rows};
pub use store::{Handle, Mode, Store};
pub use value::{RowValues, Value};

/// Result type alias for Feedstore operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for Feedstore operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Insert failed: {0}")]
    InsertFailed(String),

    #[error("Write failed: {0}")]
    WriteFailed(String),

    #[error("Resource misuse: {0}")]
    ResourceMisuse(String),

    #[error("No such column: {0}")]
    NoSuchColumn(String),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),
}
