//! Store lifecycle manager and CRUD handles
//!
//! The [`Store`] owns the on-disk database for one [`StoreProfile`]. Nothing
//! touches storage until the first [`Store::open`], which creates the file,
//! applies the contract's schema, and reconciles the persisted schema version
//! against the expected one. Version reconciliation is a fixed
//! drop-and-recreate: the store is a disposable cache, not a system of
//! record, so a mismatch in either direction discards every row.

use std::cell::{Cell, Ref, RefCell};
use std::path::PathBuf;
use std::rc::Rc;

use rusqlite::{params, Connection, ToSql};
use tracing::{debug, info};

use crate::contract::StoreProfile;
use crate::predicate::{Predicate, Query};
use crate::rows::Rows;
use crate::value::RowValues;
use crate::{Error, Result};

/// Access mode of a handle.
///
/// Mode is a property of the handle, not of the underlying connection; both
/// modes are served by the one cached connection, and mutations through a
/// `Read` handle are rejected at the handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Read,
    Write,
}

enum Location {
    Disk(PathBuf),
    Memory,
}

#[derive(Debug)]
struct Shared {
    profile: StoreProfile,
    conn: RefCell<Option<Connection>>,
    // bumped on every fresh open so handles from a closed generation
    // surface ResourceMisuse instead of touching the new connection
    generation: Cell<u64>,
}

/// Lifecycle manager for a single schema-versioned store
pub struct Store {
    shared: Rc<Shared>,
    location: Location,
}

impl Store {
    /// Create a manager for `profile` backed by the file at `path`.
    ///
    /// No I/O happens here; the file is created on the first [`open`](Self::open).
    pub fn new(profile: StoreProfile, path: impl Into<PathBuf>) -> Self {
        Self {
            shared: Rc::new(Shared {
                profile,
                conn: RefCell::new(None),
                generation: Cell::new(0),
            }),
            location: Location::Disk(path.into()),
        }
    }

    /// Create a manager backed by an in-memory database (for testing).
    ///
    /// Contents vanish when the store is closed.
    pub fn in_memory(profile: StoreProfile) -> Self {
        Self {
            shared: Rc::new(Shared {
                profile,
                conn: RefCell::new(None),
                generation: Cell::new(0),
            }),
            location: Location::Memory,
        }
    }

    pub fn profile(&self) -> &StoreProfile {
        &self.shared.profile
    }

    pub fn is_open(&self) -> bool {
        self.shared.conn.borrow().is_some()
    }

    /// Acquire a handle in the given mode.
    ///
    /// The first open creates the file if needed, applies the schema, and
    /// reconciles the persisted version against the profile's. Opening an
    /// already-open store hands out another view of the existing connection.
    pub fn open(&self, mode: Mode) -> Result<Handle> {
        {
            let mut slot = self.shared.conn.borrow_mut();
            if slot.is_none() {
                debug!(store = %self.shared.profile.name, ?mode, "opening store");
                let conn = match &self.location {
                    Location::Disk(path) => Connection::open(path).map_err(|e| {
                        Error::StorageUnavailable(format!("cannot open {}: {e}", path.display()))
                    })?,
                    Location::Memory => Connection::open_in_memory().map_err(|e| {
                        Error::StorageUnavailable(format!("cannot open in-memory store: {e}"))
                    })?,
                };
                reconcile(&conn, &self.shared.profile)?;
                *slot = Some(conn);
                self.shared.generation.set(self.shared.generation.get() + 1);
            }
        }
        Ok(Handle {
            shared: Rc::clone(&self.shared),
            mode,
            generation: self.shared.generation.get(),
        })
    }

    /// Release the connection. Idempotent; handles acquired before the close
    /// fail with `ResourceMisuse` from then on, and a new [`open`](Self::open)
    /// is required to use the store again.
    pub fn close(&self) {
        // Closing while a query cursor is outstanding is a caller error.
        let Ok(mut slot) = self.shared.conn.try_borrow_mut() else {
            panic!("store closed while a query sequence is outstanding");
        };
        if slot.take().is_some() {
            debug!(store = %self.shared.profile.name, "closing store");
        }
    }
}

/// Read the persisted schema version and bring the schema in line with the
/// profile. Runs inside one transaction so a failure cannot leave a
/// half-built schema behind.
fn reconcile(conn: &Connection, profile: &StoreProfile) -> Result<()> {
    let persisted: i64 = conn
        .query_row("PRAGMA user_version", [], |row| row.get(0))
        .map_err(|e| Error::StorageUnavailable(format!("cannot read schema version: {e}")))?;
    let expected = i64::from(profile.version);
    if persisted == expected {
        debug!(store = %profile.name, version = expected, "schema version unchanged");
        return Ok(());
    }

    let contract = &profile.contract;
    let tx = conn
        .unchecked_transaction()
        .map_err(|e| Error::StorageUnavailable(format!("cannot start schema transaction: {e}")))?;
    if persisted == 0 {
        // fresh file
        info!(store = %profile.name, version = expected, "creating schema");
        tx.execute_batch(&contract.create_sql())
            .map_err(|e| Error::StorageUnavailable(format!("schema creation failed: {e}")))?;
    } else {
        let discarded: i64 = tx
            .query_row(&format!("SELECT COUNT(*) FROM {}", contract.table), [], |row| row.get(0))
            .unwrap_or(0);
        info!(
            store = %profile.name,
            old_version = persisted,
            new_version = expected,
            discarded,
            "schema version changed, dropping and recreating"
        );
        tx.execute_batch(&format!("{};{}", contract.drop_sql(), contract.create_sql()))
            .map_err(|e| Error::StorageUnavailable(format!("schema recreation failed: {e}")))?;
    }
    tx.pragma_update(None, "user_version", profile.version)
        .map_err(|e| Error::StorageUnavailable(format!("cannot record schema version: {e}")))?;
    tx.commit()
        .map_err(|e| Error::StorageUnavailable(format!("schema transaction failed: {e}")))?;
    Ok(())
}

/// An open view on the store, in read or write mode
#[derive(Debug)]
pub struct Handle {
    shared: Rc<Shared>,
    mode: Mode,
    generation: u64,
}

impl Handle {
    pub fn mode(&self) -> Mode {
        self.mode
    }

    fn conn(&self) -> Result<Ref<'_, Connection>> {
        if self.generation != self.shared.generation.get() {
            return Err(Error::ResourceMisuse("handle used after close".to_string()));
        }
        Ref::filter_map(self.shared.conn.borrow(), |slot| slot.as_ref())
            .map_err(|_| Error::ResourceMisuse("store is closed".to_string()))
    }

    // ========== Write Operations ==========

    /// Append one row and return its assigned id.
    ///
    /// Columns not supplied are left unset; an empty `values` appends a row
    /// with every contract column unset.
    pub fn insert(&self, values: &RowValues) -> Result<i64> {
        let conn = self.conn()?;
        if self.mode == Mode::Read {
            return Err(Error::InsertFailed("handle is read-only".to_string()));
        }
        let contract = &self.shared.profile.contract;
        for column in values.columns() {
            contract.require_column(column)?;
        }

        let result = if values.is_empty() {
            conn.execute(&format!("INSERT INTO {} DEFAULT VALUES", contract.table), [])
        } else {
            let columns = values.columns().collect::<Vec<_>>().join(", ");
            let placeholders = vec!["?"; values.len()].join(", ");
            let sql = format!(
                "INSERT INTO {} ({}) VALUES ({})",
                contract.table, columns, placeholders
            );
            let params: Vec<&dyn ToSql> = values.values().map(|v| v as &dyn ToSql).collect();
            conn.execute(&sql, params.as_slice())
        };
        result.map_err(|e| Error::InsertFailed(e.to_string()))?;

        let id = conn.last_insert_rowid();
        debug!(table = %contract.table, id, "inserted row");
        Ok(id)
    }

    /// Apply `values` to every row satisfying `predicate`; returns the number
    /// of rows changed (0 if none matched)
    pub fn update(&self, values: &RowValues, predicate: &Predicate) -> Result<usize> {
        let conn = self.conn()?;
        if self.mode == Mode::Read {
            return Err(Error::WriteFailed("handle is read-only".to_string()));
        }
        if values.is_empty() {
            return Err(Error::WriteFailed("update requires at least one column".to_string()));
        }
        let contract = &self.shared.profile.contract;
        for column in values.columns() {
            contract.require_column(column)?;
        }
        contract.require_column(predicate.column())?;

        let assignments = values
            .columns()
            .map(|c| format!("{c} = ?"))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "UPDATE {} SET {} WHERE {}",
            contract.table,
            assignments,
            predicate.sql_fragment()
        );
        let mut params: Vec<&dyn ToSql> = values.values().map(|v| v as &dyn ToSql).collect();
        params.push(predicate.param());

        let changed = conn
            .execute(&sql, params.as_slice())
            .map_err(|e| Error::WriteFailed(e.to_string()))?;
        debug!(table = %contract.table, changed, "updated rows");
        Ok(changed)
    }

    /// Remove every row satisfying `predicate`; returns the number removed
    /// (0 if none matched)
    pub fn delete(&self, predicate: &Predicate) -> Result<usize> {
        let conn = self.conn()?;
        if self.mode == Mode::Read {
            return Err(Error::WriteFailed("handle is read-only".to_string()));
        }
        let contract = &self.shared.profile.contract;
        contract.require_column(predicate.column())?;

        let sql = format!("DELETE FROM {} WHERE {}", contract.table, predicate.sql_fragment());
        let deleted = conn
            .execute(&sql, params![predicate.param()])
            .map_err(|e| Error::WriteFailed(e.to_string()))?;
        debug!(table = %contract.table, deleted, "deleted rows");
        Ok(deleted)
    }

    // ========== Read Operations ==========

    /// Run a query and hand the result cursor to `consume`.
    ///
    /// The cursor borrows the prepared statement and is released when
    /// `consume` returns, so it cannot outlive the handle. Every column named
    /// anywhere in the query is validated against the contract before any SQL
    /// is built.
    pub fn query<T, F>(&self, query: &Query, consume: F) -> Result<T>
    where
        F: FnOnce(&mut Rows<'_>) -> Result<T>,
    {
        let conn = self.conn()?;
        let contract = &self.shared.profile.contract;
        let columns = if query.columns.is_empty() {
            contract.column_names()
        } else {
            query.columns.clone()
        };
        for column in &columns {
            contract.require_column(column)?;
        }
        if let Some(predicate) = &query.predicate {
            contract.require_column(predicate.column())?;
        }
        if let Some(order) = &query.order_by {
            contract.require_column(&order.column)?;
        }

        let mut sql = format!("SELECT {} FROM {}", columns.join(", "), contract.table);
        if let Some(predicate) = &query.predicate {
            sql.push_str(" WHERE ");
            sql.push_str(&predicate.sql_fragment());
        }
        if let Some(order) = &query.order_by {
            sql.push_str(" ORDER BY ");
            sql.push_str(&order.sql_fragment());
        }

        let mut stmt = conn.prepare(&sql)?;
        let raw = match &query.predicate {
            Some(predicate) => stmt.query(params![predicate.param()])?,
            None => stmt.query([])?,
        };
        consume(&mut Rows::new(raw, columns))
    }

    /// Count rows matching `predicate`, or all rows when `None`
    pub fn count(&self, predicate: Option<&Predicate>) -> Result<usize> {
        let conn = self.conn()?;
        let contract = &self.shared.profile.contract;
        let mut sql = format!("SELECT COUNT(*) FROM {}", contract.table);
        let count: i64 = match predicate {
            Some(p) => {
                contract.require_column(p.column())?;
                sql.push_str(" WHERE ");
                sql.push_str(&p.sql_fragment());
                conn.query_row(&sql, params![p.param()], |row| row.get(0))?
            }
            None => conn.query_row(&sql, [], |row| row.get(0))?,
        };
        Ok(count as usize)
    }
}
