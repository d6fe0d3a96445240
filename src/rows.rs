//! Scoped query cursors
//!
//! A [`Rows`] is a lazy, forward-only walk over a query's results. It borrows
//! the statement it came from, so it only exists inside the closure passed to
//! [`Handle::query`](crate::store::Handle::query) and is released when that
//! scope ends; there is no way to leak the underlying cursor.

use crate::value::Value;
use crate::{Error, Result};

/// Forward-only cursor over projected rows
pub struct Rows<'stmt> {
    inner: rusqlite::Rows<'stmt>,
    columns: Vec<String>,
}

impl<'stmt> Rows<'stmt> {
    pub(crate) fn new(inner: rusqlite::Rows<'stmt>, columns: Vec<String>) -> Self {
        Self { inner, columns }
    }

    /// The projected column names, in projection order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Advance to the next row, or `None` when the sequence is exhausted
    pub fn next(&mut self) -> Result<Option<Row<'_>>> {
        match self.inner.next()? {
            Some(row) => Ok(Some(Row { inner: row, columns: &self.columns })),
            None => Ok(None),
        }
    }
}

/// One projected row, valid until the cursor advances
pub struct Row<'a> {
    inner: &'a rusqlite::Row<'a>,
    columns: &'a [String],
}

impl Row<'_> {
    fn index(&self, column: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c == column)
            .ok_or_else(|| Error::NoSuchColumn(column.to_string()))
    }

    /// Fetch a column as a raw [`Value`]
    pub fn get(&self, column: &str) -> Result<Value> {
        Ok(self.inner.get(self.index(column)?)?)
    }

    /// Fetch a nullable text column
    pub fn text(&self, column: &str) -> Result<Option<String>> {
        Ok(self.inner.get(self.index(column)?)?)
    }

    /// Fetch a non-null integer column
    pub fn integer(&self, column: &str) -> Result<i64> {
        Ok(self.inner.get(self.index(column)?)?)
    }
}
