//! A scripted connection that records every prepared and executed statement.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use tablemodel::{Connection, OrmResult, ResultSet, Value};

pub const CATEGORY_COLUMNS: &[&str] = &["id", "name", "updated_at", "created_at"];

#[derive(Debug, Clone, PartialEq)]
pub struct Executed {
    pub sql: String,
    pub params: Vec<Value>,
}

pub struct RecordingConnection {
    driver: Option<String>,
    columns: Vec<String>,
    rows: RefCell<Vec<Vec<Value>>>,
    affected: Cell<u64>,
    next_id: Cell<i64>,
    prepared: RefCell<Vec<String>>,
    executed: RefCell<Vec<Executed>>,
}

impl RecordingConnection {
    /// A connection reporting `driver` with the `categories` column layout.
    pub fn new(driver: &str) -> Self {
        Self {
            driver: Some(driver.to_string()),
            columns: CATEGORY_COLUMNS.iter().map(|c| c.to_string()).collect(),
            rows: RefCell::new(Vec::new()),
            affected: Cell::new(1),
            next_id: Cell::new(1),
            prepared: RefCell::new(Vec::new()),
            executed: RefCell::new(Vec::new()),
        }
    }

    /// A connection with no live handle.
    pub fn disconnected() -> Self {
        Self {
            driver: None,
            ..Self::new("mysql")
        }
    }

    pub fn with_columns(mut self, columns: &[&str]) -> Self {
        self.columns = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    /// Rows returned by `SELECT *` statements.
    pub fn set_rows(&self, rows: Vec<Vec<Value>>) {
        *self.rows.borrow_mut() = rows;
    }

    /// Affected-row count reported by writes.
    pub fn set_affected(&self, n: u64) {
        self.affected.set(n);
    }

    /// Key reported by the next insert.
    pub fn set_next_id(&self, id: i64) {
        self.next_id.set(id);
    }

    pub fn prepared(&self) -> Vec<String> {
        self.prepared.borrow().clone()
    }

    pub fn executed(&self) -> Vec<Executed> {
        self.executed.borrow().clone()
    }

    /// Executed SQL text, in order.
    pub fn statements(&self) -> Vec<String> {
        self.executed.borrow().iter().map(|e| e.sql.clone()).collect()
    }

    /// The most recent statement.
    pub fn last(&self) -> Executed {
        self.executed
            .borrow()
            .last()
            .cloned()
            .expect("no statement executed")
    }

    pub fn clear_log(&self) {
        self.executed.borrow_mut().clear();
    }

    fn respond(&self, sql: &str) -> ResultSet {
        let text = |s: &str| Value::Text(s.to_string());
        let n = self.columns.len() as u64;

        if sql.starts_with("DESCRIBE ") {
            let rows = self
                .columns
                .iter()
                .map(|c| vec![text(c), text("varchar(120)")])
                .collect();
            return ResultSet::new(vec!["Field".into(), "Type".into()], rows, n);
        }
        if sql.starts_with("PRAGMA table_info") {
            let rows = self
                .columns
                .iter()
                .enumerate()
                .map(|(i, c)| vec![Value::Int(i as i64), text(c)])
                .collect();
            return ResultSet::new(vec!["cid".into(), "name".into()], rows, n);
        }
        if sql.contains("information_schema.columns") {
            let rows = self.columns.iter().map(|c| vec![text(c)]).collect();
            return ResultSet::new(vec!["column_name".into()], rows, n);
        }
        if sql.starts_with("SELECT COUNT(*)") {
            let count = self.rows.borrow().len() as i64;
            return ResultSet::new(vec!["count".into()], vec![vec![Value::Int(count)]], 1);
        }
        if sql.starts_with("SELECT") {
            let mut rows = self.rows.borrow().clone();
            if sql.ends_with("LIMIT 1") {
                rows.truncate(1);
            }
            let count = rows.len() as u64;
            return ResultSet::new(self.columns.clone(), rows, count);
        }
        if sql.contains(" RETURNING ") {
            let rows = if self.affected.get() == 1 {
                vec![vec![Value::Int(self.next_id.get())]]
            } else {
                Vec::new()
            };
            let count = rows.len() as u64;
            return ResultSet::new(vec!["id".into()], rows, count);
        }
        ResultSet::affected(self.affected.get())
    }
}

impl Connection for RecordingConnection {
    type Statement = String;

    fn driver_name(&self) -> Option<String> {
        self.driver.clone()
    }

    fn prepare(&self, sql: &str) -> OrmResult<String> {
        self.prepared.borrow_mut().push(sql.to_string());
        Ok(sql.to_string())
    }

    fn run(&self, stmt: &String, params: &[Value]) -> OrmResult<ResultSet> {
        self.executed.borrow_mut().push(Executed {
            sql: stmt.clone(),
            params: params.to_vec(),
        });
        Ok(self.respond(stmt))
    }

    fn last_insert_id(&self) -> OrmResult<Value> {
        Ok(Value::Int(self.next_id.get()))
    }
}

/// A stored `categories` row.
pub fn category_row(id: i64, name: &str) -> Vec<Value> {
    vec![
        Value::Int(id),
        Value::from(name),
        Value::from("2024-01-01 00:00:00"),
        Value::from("2024-01-01 00:00:00"),
    ]
}
