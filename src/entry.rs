//! The canonical feed-reader contract and its typed row

use crate::contract::{ColumnDef, StoreProfile, TableContract, ID_COLUMN};
use crate::rows::{Row, Rows};
use crate::value::RowValues;
use crate::Result;
use serde::{Deserialize, Serialize};

/// Logical store name
pub const STORE_NAME: &str = "FeedReader";
/// Expected schema version; bump when the schema changes
pub const STORE_VERSION: u32 = 1;
/// Table holding feed entries
pub const TABLE_NAME: &str = "entry";
/// Entry title column
pub const COLUMN_TITLE: &str = "title";
/// Entry subtitle column
pub const COLUMN_SUBTITLE: &str = "subtitle";

/// Contract for the `entry` table
pub fn contract() -> TableContract {
    TableContract::new(
        TABLE_NAME,
        vec![ColumnDef::text(COLUMN_TITLE), ColumnDef::text(COLUMN_SUBTITLE)],
    )
}

/// The `FeedReader` store profile at the current schema version
pub fn profile() -> StoreProfile {
    StoreProfile::new(STORE_NAME, STORE_VERSION, contract())
}

/// Typed view over a row of the `entry` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub id: i64,
    pub title: Option<String>,
    pub subtitle: Option<String>,
}

impl Entry {
    /// Decode an entry from a projected row.
    ///
    /// The projection must include all three contract columns.
    pub fn from_row(row: &Row<'_>) -> Result<Self> {
        Ok(Self {
            id: row.integer(ID_COLUMN)?,
            title: row.text(COLUMN_TITLE)?,
            subtitle: row.text(COLUMN_SUBTITLE)?,
        })
    }

    /// Drain a cursor into typed entries
    pub fn collect(rows: &mut Rows<'_>) -> Result<Vec<Self>> {
        let mut entries = Vec::new();
        while let Some(row) = rows.next()? {
            entries.push(Self::from_row(&row)?);
        }
        Ok(entries)
    }

    /// Row values for inserting a new entry
    pub fn values(title: &str, subtitle: &str) -> RowValues {
        RowValues::new()
            .with(COLUMN_TITLE, title)
            .with(COLUMN_SUBTITLE, subtitle)
    }
}
