//! SQLite adapter on `rusqlite`.

use crate::connection::{Connection, ResultSet};
use crate::error::{OrmError, OrmResult};
use crate::value::{TIMESTAMP_FORMAT, Value};
use rusqlite::types::{ToSql, ToSqlOutput, ValueRef};
use std::path::Path;
use std::sync::Arc;

/// Capacity of rusqlite's per-connection statement cache. Large enough that statements
/// built by this crate are never evicted.
const STATEMENT_CACHE_CAPACITY: usize = 4096;

/// A blocking SQLite connection reporting the `sqlite` driver.
#[derive(Debug)]
pub struct SqliteConnection {
    conn: rusqlite::Connection,
}

/// Prepared statement handle.
///
/// The compiled statement itself lives in rusqlite's cache on the owning connection;
/// the handle only carries the key.
#[derive(Debug, Clone)]
pub struct SqliteStatement {
    sql: Arc<str>,
}

impl SqliteStatement {
    pub fn sql(&self) -> &str {
        &self.sql
    }
}

impl SqliteConnection {
    /// Open (or create) a database file.
    pub fn open(path: impl AsRef<Path>) -> OrmResult<Self> {
        Ok(Self::from_connection(rusqlite::Connection::open(path)?))
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> OrmResult<Self> {
        Ok(Self::from_connection(rusqlite::Connection::open_in_memory()?))
    }

    /// Wrap an existing rusqlite connection.
    pub fn from_connection(conn: rusqlite::Connection) -> Self {
        conn.set_prepared_statement_cache_capacity(STATEMENT_CACHE_CAPACITY);
        Self { conn }
    }

    pub fn inner(&self) -> &rusqlite::Connection {
        &self.conn
    }

    pub fn into_inner(self) -> rusqlite::Connection {
        self.conn
    }
}

impl Connection for SqliteConnection {
    type Statement = SqliteStatement;

    fn driver_name(&self) -> Option<String> {
        Some("sqlite".to_string())
    }

    fn prepare(&self, sql: &str) -> OrmResult<SqliteStatement> {
        // Compile now so syntax errors surface at prepare time.
        self.conn.prepare_cached(sql)?;
        Ok(SqliteStatement { sql: sql.into() })
    }

    fn run(&self, stmt: &SqliteStatement, params: &[Value]) -> OrmResult<ResultSet> {
        let mut prepared = self.conn.prepare_cached(&stmt.sql)?;
        let bind = rusqlite::params_from_iter(params.iter());

        if prepared.column_count() == 0 {
            let affected = prepared.execute(bind)?;
            return Ok(ResultSet::affected(affected as u64));
        }

        let columns: Vec<String> = prepared
            .column_names()
            .into_iter()
            .map(String::from)
            .collect();
        let mut rows = prepared.query(bind)?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let mut values = Vec::with_capacity(columns.len());
            for (idx, name) in columns.iter().enumerate() {
                values.push(from_sqlite(row.get_ref(idx)?, name)?);
            }
            out.push(values);
        }
        let count = out.len() as u64;
        Ok(ResultSet::new(columns, out, count))
    }

    fn last_insert_id(&self) -> OrmResult<Value> {
        Ok(Value::Int(self.conn.last_insert_rowid()))
    }
}

fn from_sqlite(value: ValueRef<'_>, column: &str) -> OrmResult<Value> {
    Ok(match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Int(i),
        ValueRef::Real(f) => Value::Float(f),
        ValueRef::Text(bytes) => Value::Text(
            std::str::from_utf8(bytes)
                .map_err(|e| OrmError::decode(column, e.to_string()))?
                .to_string(),
        ),
        ValueRef::Blob(bytes) => Value::Bytes(bytes.to_vec()),
    })
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::Null => ToSqlOutput::Borrowed(ValueRef::Null),
            Value::Bool(b) => ToSqlOutput::Owned(rusqlite::types::Value::Integer(i64::from(*b))),
            Value::Int(i) => ToSqlOutput::Owned(rusqlite::types::Value::Integer(*i)),
            Value::Float(f) => ToSqlOutput::Owned(rusqlite::types::Value::Real(*f)),
            Value::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            Value::Timestamp(ts) => ToSqlOutput::Owned(rusqlite::types::Value::Text(
                ts.format(TIMESTAMP_FORMAT).to_string(),
            )),
            Value::Bytes(b) => ToSqlOutput::Borrowed(ValueRef::Blob(b)),
        })
    }
}
