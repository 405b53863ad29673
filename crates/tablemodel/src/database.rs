//! The per-connection database context.
//!
//! [`Database`] owns a [`Connection`] together with everything derived from it: the
//! detected [`Dialect`], the prepared-statement cache and the discovered column lists.
//! Table bindings borrow it; nothing here is global.
//!
//! # Example
//!
//! ```ignore
//! use tablemodel::{Database, SqliteConnection};
//!
//! let db = Database::new(SqliteConnection::open_in_memory()?);
//! db.execute("CREATE TABLE t (id INTEGER PRIMARY KEY, name TEXT)", &[])?;
//! let rows = db.execute("SELECT * FROM t WHERE name = ?", &["x".into()])?;
//! ```

use crate::config::DatabaseConfig;
use crate::connection::{Connection, ResultSet};
use crate::dialect::Dialect;
use crate::error::{OrmError, OrmResult};
use crate::schema;
use crate::statement_cache::{CacheStats, StatementCache};
use crate::value::Value;
use std::cell::{OnceCell, RefCell};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

/// A connection plus its dialect, statement cache and column cache.
///
/// Single-threaded by construction: share it by reference within one thread, or give
/// each worker its own connection.
pub struct Database<C: Connection> {
    conn: C,
    config: DatabaseConfig,
    dialect: OnceCell<Dialect>,
    statements: StatementCache<C::Statement>,
    columns: RefCell<HashMap<String, Arc<[String]>>>,
}

impl<C: Connection> Database<C> {
    /// Create a context with default configuration.
    pub fn new(conn: C) -> Self {
        Self::with_config(conn, DatabaseConfig::default())
    }

    /// Create a context with custom configuration.
    pub fn with_config(conn: C, config: DatabaseConfig) -> Self {
        Self {
            conn,
            config,
            dialect: OnceCell::new(),
            statements: StatementCache::new(),
            columns: RefCell::new(HashMap::new()),
        }
    }

    pub fn connection(&self) -> &C {
        &self.conn
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    /// Give back the owned connection.
    pub fn into_inner(self) -> C {
        self.conn
    }

    /// The connection's dialect, detected on first use and cached thereafter.
    pub fn dialect(&self) -> OrmResult<Dialect> {
        if let Some(d) = self.dialect.get() {
            return Ok(*d);
        }
        let name = self.conn.driver_name().ok_or(OrmError::NoConnection)?;
        Ok(*self.dialect.get_or_init(|| Dialect::from_driver_name(&name)))
    }

    /// Quote a table or column identifier for this connection's dialect.
    pub fn quote(&self, identifier: &str) -> OrmResult<String> {
        Ok(self.dialect()?.quote_identifier(identifier))
    }

    /// Prepare (or reuse) `sql` and run it with positional parameters.
    ///
    /// Values must always travel in `params`; SQL that inlines values gets a cache entry
    /// per distinct value.
    pub fn execute(&self, sql: &str, params: &[Value]) -> OrmResult<ResultSet> {
        let (stmt, cached) = self.prepare(sql)?;
        let start = Instant::now();
        let result = self.conn.run(&stmt, params);
        let elapsed = start.elapsed();

        if self.config.logging_enabled {
            match &result {
                Ok(rs) => tracing::debug!(
                    target: "tablemodel.sql",
                    sql,
                    param_count = params.len(),
                    cached,
                    rows = rs.rows().len(),
                    rows_affected = rs.rows_affected(),
                    elapsed_us = elapsed.as_micros() as u64,
                ),
                Err(e) => tracing::debug!(
                    target: "tablemodel.sql",
                    sql,
                    param_count = params.len(),
                    cached,
                    error = %e,
                ),
            }
        }
        if let Some(threshold) = self.config.slow_query_threshold {
            if elapsed > threshold {
                tracing::warn!(
                    target: "tablemodel.sql",
                    sql,
                    elapsed_ms = elapsed.as_millis() as u64,
                    threshold_ms = threshold.as_millis() as u64,
                    "slow query"
                );
            }
        }

        result
    }

    fn prepare(&self, sql: &str) -> OrmResult<(C::Statement, bool)> {
        if !self.config.statement_cache {
            return Ok((self.conn.prepare(sql)?, false));
        }
        if let Some(stmt) = self.statements.get(sql) {
            return Ok((stmt, true));
        }
        let stmt = self.conn.prepare(sql)?;
        Ok((self.statements.insert_if_absent(sql.to_string(), stmt), false))
    }

    /// Key generated by the most recent insert.
    pub fn last_insert_id(&self) -> OrmResult<Value> {
        self.conn.last_insert_id()
    }

    /// Prepared-statement reuse counters.
    pub fn cache_stats(&self) -> CacheStats {
        self.statements.stats()
    }

    /// Column names of `table` in declared order.
    ///
    /// Discovered once per table for the lifetime of this context and never refreshed.
    pub fn columns(&self, table: &str) -> OrmResult<Arc<[String]>> {
        if let Some(cols) = self.columns.borrow().get(table) {
            return Ok(Arc::clone(cols));
        }

        let cols: Arc<[String]> = schema::discover_columns(self, table)?.into();
        tracing::debug!(
            target: "tablemodel.schema",
            table,
            dialect = %self.dialect()?,
            columns = cols.len(),
            "discovered columns"
        );
        let mut cache = self.columns.borrow_mut();
        Ok(Arc::clone(
            cache.entry(table.to_string()).or_insert(cols),
        ))
    }
}

impl<C: Connection> std::fmt::Debug for Database<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("dialect", &self.dialect.get())
            .field("config", &self.config)
            .field("cache", &self.statements.stats())
            .field("tables", &self.columns.borrow().len())
            .finish()
    }
}
