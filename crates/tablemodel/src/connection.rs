//! The driver boundary.
//!
//! A [`Connection`] is whatever owns the live database handle: it prepares SQL, runs
//! prepared statements with positional parameters, and reports its driver name and the
//! last generated key. Everything above this trait is driver-agnostic.

use crate::error::OrmResult;
use crate::value::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// A blocking database connection.
///
/// Errors are always returned, never swallowed; callers propagate them unmodified.
pub trait Connection {
    /// Driver-level prepared statement handle.
    type Statement: Clone;

    /// Driver name (`mysql`, `pgsql`, `sqlite`, ...), or `None` when no live handle exists.
    fn driver_name(&self) -> Option<String>;

    /// Prepare `sql`, which uses `?` positional placeholders.
    fn prepare(&self, sql: &str) -> OrmResult<Self::Statement>;

    /// Run a prepared statement with positional parameters.
    fn run(&self, stmt: &Self::Statement, params: &[Value]) -> OrmResult<ResultSet>;

    /// Key generated by the most recent insert on this connection.
    fn last_insert_id(&self) -> OrmResult<Value>;
}

impl<C: Connection + ?Sized> Connection for &C {
    type Statement = C::Statement;

    fn driver_name(&self) -> Option<String> {
        (**self).driver_name()
    }

    fn prepare(&self, sql: &str) -> OrmResult<Self::Statement> {
        (**self).prepare(sql)
    }

    fn run(&self, stmt: &Self::Statement, params: &[Value]) -> OrmResult<ResultSet> {
        (**self).run(stmt, params)
    }

    fn last_insert_id(&self) -> OrmResult<Value> {
        (**self).last_insert_id()
    }
}

/// Rows and affected-row count produced by one statement execution.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    columns: Arc<[String]>,
    rows: Vec<Vec<Value>>,
    rows_affected: u64,
}

impl ResultSet {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>, rows_affected: u64) -> Self {
        Self {
            columns: columns.into(),
            rows,
            rows_affected,
        }
    }

    /// A result with no rows, only an affected-row count.
    pub fn affected(rows_affected: u64) -> Self {
        Self {
            rows_affected,
            ..Self::default()
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn rows_affected(&self) -> u64 {
        self.rows_affected
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// First column of the first row.
    pub fn scalar(&self) -> Option<&Value> {
        self.rows.first().and_then(|row| row.first())
    }

    /// Values of column `idx` across every row.
    pub fn column_values(&self, idx: usize) -> impl Iterator<Item = &Value> {
        self.rows.iter().filter_map(move |row| row.get(idx))
    }

    /// Each row as a column name → value map.
    pub fn into_maps(self) -> Vec<BTreeMap<String, Value>> {
        let columns = self.columns;
        self.rows
            .into_iter()
            .map(|row| columns.iter().cloned().zip(row).collect())
            .collect()
    }
}
