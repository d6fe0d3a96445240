//! Parameterized filter predicates, ordering, and the query shape
//!
//! A predicate renders to SQL as its column name plus a `?` placeholder and
//! nothing else; the compared value always travels as a bound parameter.

use crate::value::Value;
use rusqlite::ToSql;

/// A parameterized filter over a single column
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// `column = ?`
    Equals(String, Value),
    /// `column LIKE ?`
    Matches(String, String),
}

impl Predicate {
    pub fn equals(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Predicate::Equals(column.into(), value.into())
    }

    pub fn matches(column: impl Into<String>, pattern: impl Into<String>) -> Self {
        Predicate::Matches(column.into(), pattern.into())
    }

    /// The column the predicate filters on
    pub fn column(&self) -> &str {
        match self {
            Predicate::Equals(c, _) => c,
            Predicate::Matches(c, _) => c,
        }
    }

    pub(crate) fn sql_fragment(&self) -> String {
        match self {
            Predicate::Equals(c, _) => format!("{c} = ?"),
            Predicate::Matches(c, _) => format!("{c} LIKE ?"),
        }
    }

    pub(crate) fn param(&self) -> &dyn ToSql {
        match self {
            Predicate::Equals(_, v) => v,
            Predicate::Matches(_, p) => p,
        }
    }
}

/// Sort direction for an order-by clause
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

impl Direction {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Direction::Ascending => "ASC",
            Direction::Descending => "DESC",
        }
    }
}

/// Ordering of a query's result sequence
#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub column: String,
    pub direction: Direction,
}

impl OrderBy {
    pub fn ascending(column: impl Into<String>) -> Self {
        Self { column: column.into(), direction: Direction::Ascending }
    }

    pub fn descending(column: impl Into<String>) -> Self {
        Self { column: column.into(), direction: Direction::Descending }
    }

    pub(crate) fn sql_fragment(&self) -> String {
        format!("{} {}", self.column, self.direction.as_sql())
    }
}

/// Projection, optional predicate and optional ordering for a read.
///
/// An empty projection selects every contract column, id column first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub columns: Vec<String>,
    pub predicate: Option<Predicate>,
    pub order_by: Option<OrderBy>,
}

impl Query {
    /// Select every contract column
    pub fn all() -> Self {
        Self::default()
    }

    /// Select only the named columns
    pub fn select<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.predicate = Some(predicate);
        self
    }

    pub fn order_by(mut self, order: OrderBy) -> Self {
        self.order_by = Some(order);
        self
    }
}
