//! Schema contracts - table and column names plus the DDL derived from them
//!
//! A contract is an immutable value handed to the store constructor, so every
//! statement construction site sees identical names and multiple logical
//! stores can coexist without colliding.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Well-known name of the system-assigned row identifier column
pub const ID_COLUMN: &str = "_id";

/// Storage class of a contract column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    Integer,
    Text,
    Real,
    Blob,
}

impl ColumnKind {
    /// SQL type name used in the create statement
    pub fn as_sql(&self) -> &'static str {
        match self {
            ColumnKind::Integer => "INTEGER",
            ColumnKind::Text => "TEXT",
            ColumnKind::Real => "REAL",
            ColumnKind::Blob => "BLOB",
        }
    }
}

/// A named, typed column in a table contract
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub name: String,
    pub kind: ColumnKind,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, kind: ColumnKind) -> Self {
        Self { name: name.into(), kind }
    }

    /// Shorthand for a TEXT column
    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, ColumnKind::Text)
    }

    /// Shorthand for an INTEGER column
    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, ColumnKind::Integer)
    }
}

/// Single source of truth for one table's name and column identifiers.
///
/// The row identifier column is composed by value into every contract; it is
/// not listed among `columns`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableContract {
    pub table: String,
    pub id_column: String,
    pub columns: Vec<ColumnDef>,
}

impl TableContract {
    /// Create a contract with the well-known `_id` row identifier
    pub fn new(table: impl Into<String>, columns: Vec<ColumnDef>) -> Self {
        Self {
            table: table.into(),
            id_column: ID_COLUMN.to_string(),
            columns,
        }
    }

    /// Override the row identifier column name
    pub fn with_id_column(mut self, name: impl Into<String>) -> Self {
        self.id_column = name.into();
        self
    }

    /// Whether the contract defines `name` (id column included)
    pub fn has_column(&self, name: &str) -> bool {
        name == self.id_column || self.columns.iter().any(|c| c.name == name)
    }

    /// Fail fast with the missing column's name if the contract does not
    /// define it
    pub fn require_column(&self, name: &str) -> Result<()> {
        if self.has_column(name) {
            Ok(())
        } else {
            Err(Error::NoSuchColumn(name.to_string()))
        }
    }

    /// All column names, id column first
    pub fn column_names(&self) -> Vec<String> {
        let mut names = Vec::with_capacity(self.columns.len() + 1);
        names.push(self.id_column.clone());
        names.extend(self.columns.iter().map(|c| c.name.clone()));
        names
    }

    /// CREATE TABLE statement derived from the contract
    pub fn create_sql(&self) -> String {
        let mut cols = Vec::with_capacity(self.columns.len() + 1);
        cols.push(format!("{} INTEGER PRIMARY KEY", self.id_column));
        cols.extend(self.columns.iter().map(|c| format!("{} {}", c.name, c.kind.as_sql())));
        format!("CREATE TABLE {} ({})", self.table, cols.join(", "))
    }

    /// DROP TABLE IF EXISTS statement derived from the contract
    pub fn drop_sql(&self) -> String {
        format!("DROP TABLE IF EXISTS {}", self.table)
    }
}

/// Logical store name, expected schema version and table contract.
///
/// Version 0 is the sentinel SQLite reports for a freshly created file, so
/// profiles start at 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreProfile {
    pub name: String,
    pub version: u32,
    pub contract: TableContract,
}

impl StoreProfile {
    pub fn new(name: impl Into<String>, version: u32, contract: TableContract) -> Self {
        assert!(version >= 1, "schema version must be at least 1");
        Self { name: name.into(), version, contract }
    }

    /// Canonical on-disk file name, `<name>.db`
    pub fn file_name(&self) -> String {
        format!("{}.db", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_contract() -> TableContract {
        TableContract::new(
            "entry",
            vec![ColumnDef::text("title"), ColumnDef::text("subtitle")],
        )
    }

    #[test]
    fn test_create_sql() {
        assert_eq!(
            sample_contract().create_sql(),
            "CREATE TABLE entry (_id INTEGER PRIMARY KEY, title TEXT, subtitle TEXT)"
        );
    }

    #[test]
    fn test_drop_sql() {
        assert_eq!(sample_contract().drop_sql(), "DROP TABLE IF EXISTS entry");
    }

    #[test]
    fn test_column_lookup() {
        let contract = sample_contract();
        assert!(contract.has_column("_id"));
        assert!(contract.has_column("title"));
        assert!(!contract.has_column("body"));

        contract.require_column("subtitle").unwrap();
        let err = contract.require_column("body").unwrap_err();
        assert!(matches!(err, Error::NoSuchColumn(c) if c == "body"));
    }

    #[test]
    fn test_column_names_id_first() {
        assert_eq!(sample_contract().column_names(), vec!["_id", "title", "subtitle"]);
    }

    #[test]
    fn test_custom_id_column() {
        let contract = sample_contract().with_id_column("rowid_alias");
        assert!(contract.has_column("rowid_alias"));
        assert!(!contract.has_column("_id"));
        assert!(contract.create_sql().starts_with("CREATE TABLE entry (rowid_alias INTEGER PRIMARY KEY"));
    }

    #[test]
    fn test_profile_file_name() {
        let profile = StoreProfile::new("FeedReader", 1, sample_contract());
        assert_eq!(profile.file_name(), "FeedReader.db");
    }

    #[test]
    #[should_panic(expected = "schema version must be at least 1")]
    fn test_profile_rejects_version_zero() {
        StoreProfile::new("FeedReader", 0, sample_contract());
    }
}
