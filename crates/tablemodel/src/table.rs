//! Table bindings and the query surface.
//!
//! A [`TableBinding`] names a table and its primary key. Every operation takes the
//! [`Database`] context explicitly; the column list comes from the context's cache.
//!
//! `fragment` arguments are raw SQL placed after `WHERE` and are not escaped. Only
//! values travel as parameters.

use crate::connection::Connection;
use crate::database::Database;
use crate::dialect::InsertStyle;
use crate::error::{OrmError, OrmResult};
use crate::finder::{Finder, FinderKind, FinderOutput, Match};
use crate::fragment::SetFragment;
use crate::record::Record;
use crate::value::Value;
use std::borrow::Cow;
use std::sync::Arc;

/// Hook run before every insert and update; an error aborts the write.
pub type ValidateFn = fn(&Record) -> OrmResult<()>;

/// Column names stamped automatically when present.
pub const CREATED_AT: &str = "created_at";
pub const UPDATED_AT: &str = "updated_at";

fn no_validation(_: &Record) -> OrmResult<()> {
    Ok(())
}

/// Table name, primary key column and validation hook of one record type.
#[derive(Debug, Clone)]
pub struct TableBinding {
    table: Cow<'static, str>,
    primary_key: Cow<'static, str>,
    validate: ValidateFn,
}

fn where_clause(fragment: &str) -> String {
    if fragment.is_empty() {
        String::new()
    } else {
        format!(" WHERE {fragment}")
    }
}

fn count_value(v: Option<&Value>) -> OrmResult<i64> {
    match v {
        None => Ok(0),
        Some(v) => v
            .as_i64()
            .ok_or_else(|| OrmError::decode("COUNT(*)", format!("not an integer: {v:?}"))),
    }
}

impl TableBinding {
    /// Bind `table` with primary key `id` and no validation.
    pub fn new(table: impl Into<Cow<'static, str>>) -> Self {
        Self {
            table: table.into(),
            primary_key: Cow::Borrowed("id"),
            validate: no_validation,
        }
    }

    pub fn primary_key(mut self, column: impl Into<Cow<'static, str>>) -> Self {
        self.primary_key = column.into();
        self
    }

    pub fn validator(mut self, validate: ValidateFn) -> Self {
        self.validate = validate;
        self
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn primary_key_name(&self) -> &str {
        &self.primary_key
    }

    /// Column names, discovered on first use.
    pub fn columns<C: Connection>(&self, db: &Database<C>) -> OrmResult<Arc<[String]>> {
        db.columns(&self.table)
    }

    fn quoted_table<C: Connection>(&self, db: &Database<C>) -> OrmResult<String> {
        db.quote(&self.table)
    }

    fn quoted_pk<C: Connection>(&self, db: &Database<C>) -> OrmResult<String> {
        db.quote(&self.primary_key)
    }

    // ------------------------------------------------------------------
    // Construction
    // ------------------------------------------------------------------

    /// An empty record with no attributes set.
    pub fn blank<C: Connection>(&self, db: &Database<C>) -> OrmResult<Record> {
        Ok(Record::new(self.table.as_ref(), self.columns(db)?))
    }

    /// A record hydrated from caller data; supplied columns are dirty.
    pub fn create<C, I, K, V>(&self, db: &Database<C>, data: I) -> OrmResult<Record>
    where
        C: Connection,
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Ok(Record::with_data(self.table.as_ref(), self.columns(db)?, data))
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    /// Total number of rows.
    pub fn count<C: Connection>(&self, db: &Database<C>) -> OrmResult<i64> {
        let sql = format!("SELECT COUNT(*) FROM {}", self.quoted_table(db)?);
        count_value(db.execute(&sql, &[])?.scalar())
    }

    /// Number of rows matching `fragment`; an empty fragment counts everything.
    pub fn count_where<C: Connection>(
        &self,
        db: &Database<C>,
        fragment: &str,
        params: &[Value],
    ) -> OrmResult<i64> {
        let sql = format!(
            "SELECT COUNT(*) FROM {}{}",
            self.quoted_table(db)?,
            where_clause(fragment)
        );
        count_value(db.execute(&sql, params)?.scalar())
    }

    /// `SELECT * FROM <table> [WHERE fragment] [LIMIT 1]`, one clean record per row.
    pub fn fetch_where<C: Connection>(
        &self,
        db: &Database<C>,
        fragment: &str,
        params: &[Value],
        limit_one: bool,
    ) -> OrmResult<Vec<Record>> {
        let columns = self.columns(db)?;
        let sql = format!(
            "SELECT * FROM {}{}{}",
            self.quoted_table(db)?,
            where_clause(fragment),
            if limit_one { " LIMIT 1" } else { "" }
        );
        let rows = db.execute(&sql, params)?.into_maps();
        Ok(rows
            .into_iter()
            .map(|row| Record::from_row(self.table.as_ref(), Arc::clone(&columns), row))
            .collect())
    }

    pub fn fetch_all_where<C: Connection>(
        &self,
        db: &Database<C>,
        fragment: &str,
        params: &[Value],
    ) -> OrmResult<Vec<Record>> {
        self.fetch_where(db, fragment, params, false)
    }

    /// First matching record, or `None`. Absence is not an error.
    pub fn fetch_one_where<C: Connection>(
        &self,
        db: &Database<C>,
        fragment: &str,
        params: &[Value],
    ) -> OrmResult<Option<Record>> {
        Ok(self.fetch_where(db, fragment, params, true)?.into_iter().next())
    }

    pub fn get_by_id<C: Connection>(
        &self,
        db: &Database<C>,
        id: impl Into<Value>,
    ) -> OrmResult<Option<Record>> {
        let fragment = format!("{} = ?", self.quoted_pk(db)?);
        self.fetch_one_where(db, &fragment, &[id.into()])
    }

    /// Every record whose primary key equals `id`.
    pub fn find<C: Connection>(
        &self,
        db: &Database<C>,
        id: impl Into<Value>,
    ) -> OrmResult<Vec<Record>> {
        self.find_by(db, &self.primary_key, Match::One(id.into()))
    }

    pub fn first<C: Connection>(&self, db: &Database<C>) -> OrmResult<Option<Record>> {
        let fragment = format!("1=1 ORDER BY {} ASC", self.quoted_pk(db)?);
        self.fetch_one_where(db, &fragment, &[])
    }

    pub fn last<C: Connection>(&self, db: &Database<C>) -> OrmResult<Option<Record>> {
        let fragment = format!("1=1 ORDER BY {} DESC", self.quoted_pk(db)?);
        self.fetch_one_where(db, &fragment, &[])
    }

    // ------------------------------------------------------------------
    // Dynamic finders
    // ------------------------------------------------------------------

    fn finder_condition<C: Connection>(
        &self,
        db: &Database<C>,
        field: &str,
        matching: &Match,
    ) -> OrmResult<(String, String, Vec<Value>)> {
        if !self.columns(db)?.iter().any(|c| c == field) {
            return Err(OrmError::unknown_field(self.table.as_ref(), field));
        }
        let quoted = db.quote(field)?;
        let (condition, params) = matching.condition(&quoted);
        Ok((quoted, condition, params))
    }

    /// Run a parsed finder.
    pub fn run_finder<C: Connection>(
        &self,
        db: &Database<C>,
        finder: &Finder,
        matching: impl Into<Match>,
    ) -> OrmResult<FinderOutput<Record>> {
        let matching = matching.into();
        let (quoted, condition, params) = self.finder_condition(db, &finder.field, &matching)?;
        match finder.kind {
            FinderKind::FindAll => Ok(FinderOutput::Many(
                self.fetch_all_where(db, &condition, &params)?,
            )),
            FinderKind::Count => Ok(FinderOutput::Count(
                self.count_where(db, &condition, &params)?,
            )),
            kind @ (FinderKind::FindOne | FinderKind::First | FinderKind::Last) => {
                let order = kind.order().unwrap_or("ASC");
                let fragment = format!("{condition} ORDER BY {quoted} {order}");
                Ok(FinderOutput::One(self.fetch_one_where(db, &fragment, &params)?))
            }
        }
    }

    /// Dispatch a finder by name: `find_by_<field>`, `findOne_by_<field>`,
    /// `first_by_<field>`, `last_by_<field>` or `count_by_<field>`.
    pub fn call<C: Connection>(
        &self,
        db: &Database<C>,
        name: &str,
        matching: impl Into<Match>,
    ) -> OrmResult<FinderOutput<Record>> {
        let finder = Finder::parse(name)?;
        self.run_finder(db, &finder, matching)
    }

    pub fn find_by<C: Connection>(
        &self,
        db: &Database<C>,
        field: &str,
        matching: impl Into<Match>,
    ) -> OrmResult<Vec<Record>> {
        let (_, condition, params) = self.finder_condition(db, field, &matching.into())?;
        self.fetch_all_where(db, &condition, &params)
    }

    pub fn find_one_by<C: Connection>(
        &self,
        db: &Database<C>,
        field: &str,
        matching: impl Into<Match>,
    ) -> OrmResult<Option<Record>> {
        let finder = Finder::new(FinderKind::FindOne, field);
        Ok(self.run_finder(db, &finder, matching)?.into_one().flatten())
    }

    pub fn first_by<C: Connection>(
        &self,
        db: &Database<C>,
        field: &str,
        matching: impl Into<Match>,
    ) -> OrmResult<Option<Record>> {
        let finder = Finder::new(FinderKind::First, field);
        Ok(self.run_finder(db, &finder, matching)?.into_one().flatten())
    }

    pub fn last_by<C: Connection>(
        &self,
        db: &Database<C>,
        field: &str,
        matching: impl Into<Match>,
    ) -> OrmResult<Option<Record>> {
        let finder = Finder::new(FinderKind::Last, field);
        Ok(self.run_finder(db, &finder, matching)?.into_one().flatten())
    }

    pub fn count_by<C: Connection>(
        &self,
        db: &Database<C>,
        field: &str,
        matching: impl Into<Match>,
    ) -> OrmResult<i64> {
        let (_, condition, params) = self.finder_condition(db, field, &matching.into())?;
        self.count_where(db, &condition, &params)
    }

    // ------------------------------------------------------------------
    // Deletes
    // ------------------------------------------------------------------

    /// Delete the row with primary key `id`; `true` iff exactly one row went away.
    pub fn delete_by_id<C: Connection>(
        &self,
        db: &Database<C>,
        id: impl Into<Value>,
    ) -> OrmResult<bool> {
        let dialect = db.dialect()?;
        let sql = format!(
            "DELETE FROM {} WHERE {} = ?{}",
            self.quoted_table(db)?,
            self.quoted_pk(db)?,
            if dialect.supports_limit_on_write() { " LIMIT 1" } else { "" }
        );
        Ok(db.execute(&sql, &[id.into()])?.rows_affected() == 1)
    }

    /// Delete the row `record` was loaded from.
    pub fn delete<C: Connection>(&self, db: &Database<C>, record: &Record) -> OrmResult<bool> {
        let id = record.get(&self.primary_key)?.clone();
        self.delete_by_id(db, id)
    }

    /// Delete every row matching `fragment`; returns the driver's affected-row count.
    ///
    /// A blank fragment is rejected with [`OrmError::Validation`] before any SQL runs.
    /// Pass `"1=1"` to empty the table.
    pub fn delete_all_where<C: Connection>(
        &self,
        db: &Database<C>,
        fragment: &str,
        params: &[Value],
    ) -> OrmResult<u64> {
        if fragment.trim().is_empty() {
            return Err(OrmError::validation(format!(
                "delete_all_where on '{}' needs a condition",
                self.table
            )));
        }
        let sql = format!("DELETE FROM {} WHERE {fragment}", self.quoted_table(db)?);
        Ok(db.execute(&sql, params)?.rows_affected())
    }

    // ------------------------------------------------------------------
    // Writes
    // ------------------------------------------------------------------

    fn stamp(record: &mut Record, column: &str, now: &Value) -> OrmResult<()> {
        if record.has_column(column) {
            record.set(column, now.clone())?;
        }
        Ok(())
    }

    /// Insert `record` and store the generated primary key on it.
    ///
    /// With `auto_timestamp`, `created_at`/`updated_at` are stamped when those columns
    /// exist. Unless `allow_set_primary_key` is set, the key column is left to the
    /// database. Returns `false` (without error) when the driver reports anything other
    /// than one affected row; dirtiness is only cleared on success.
    pub fn insert<C: Connection>(
        &self,
        db: &Database<C>,
        record: &mut Record,
        auto_timestamp: bool,
        allow_set_primary_key: bool,
    ) -> OrmResult<bool> {
        let dialect = db.dialect()?;
        let pk = self.primary_key.as_ref();

        if auto_timestamp {
            let now = Value::now_timestamp();
            Self::stamp(record, CREATED_AT, &now)?;
            Self::stamp(record, UPDATED_AT, &now)?;
        }
        (self.validate)(record)?;
        if !allow_set_primary_key && record.has_column(pk) {
            record.set(pk, Value::Null)?;
        }

        let set = SetFragment::build(dialect, record, pk, allow_set_primary_key);
        let table = self.quoted_table(db)?;
        let style = dialect.insert_style();

        let body = if set.is_empty() {
            let Some(empty) = dialect.empty_insert_clause() else {
                return Err(OrmError::validation(format!(
                    "nothing to insert into {}: no dirty fields and {dialect} has no default-values form",
                    self.table
                )));
            };
            empty.to_string()
        } else if style == InsertStyle::SetClause {
            format!("SET {}", set.sql)
        } else {
            format!("({}) VALUES ({})", set.column_list(), set.values_list())
        };

        let mut sql = format!("INSERT INTO {table} {body}");
        if style == InsertStyle::Returning {
            sql.push_str(" RETURNING ");
            sql.push_str(&self.quoted_pk(db)?);
        }

        let result = db.execute(&sql, &set.params)?;
        if result.rows_affected() != 1 {
            return Ok(false);
        }

        let keep_key = allow_set_primary_key && record.value(pk).is_some_and(Value::is_truthy);
        if !keep_key && record.has_column(pk) {
            let key = match style {
                InsertStyle::Returning => result.scalar().cloned().unwrap_or_default(),
                InsertStyle::SetClause | InsertStyle::ColumnList => db.last_insert_id()?,
            };
            record.assign_clean(pk, key)?;
        }
        record.clear_dirty();
        Ok(true)
    }

    /// Write the dirty non-key fields of `record` back to its row.
    ///
    /// Returns `false` without running SQL when nothing is dirty or the key is null.
    /// Dirtiness is cleared only when exactly one row was affected.
    pub fn update<C: Connection>(
        &self,
        db: &Database<C>,
        record: &mut Record,
        auto_timestamp: bool,
    ) -> OrmResult<bool> {
        let dialect = db.dialect()?;
        let pk = self.primary_key.as_ref();

        let pending = record.dirty_fields().iter().any(|f| f != pk && record.has_column(f));
        if !pending {
            return Ok(false);
        }
        let id = record.get(pk)?.clone();
        if id.is_null() {
            return Ok(false);
        }

        if auto_timestamp {
            Self::stamp(record, UPDATED_AT, &Value::now_timestamp())?;
        }
        (self.validate)(record)?;

        let set = SetFragment::build(dialect, record, pk, false);
        if set.is_empty() {
            return Ok(false);
        }
        let sql = format!(
            "UPDATE {} SET {} WHERE {} = ?{}",
            self.quoted_table(db)?,
            set.sql,
            self.quoted_pk(db)?,
            if dialect.supports_limit_on_write() { " LIMIT 1" } else { "" }
        );
        let mut params = set.params;
        params.push(id);

        if db.execute(&sql, &params)?.rows_affected() != 1 {
            return Ok(false);
        }
        record.clear_dirty();
        Ok(true)
    }

    /// Update when the record's primary key holds a truthy value, insert otherwise.
    pub fn save<C: Connection>(&self, db: &Database<C>, record: &mut Record) -> OrmResult<bool> {
        let has_key = record
            .value(&self.primary_key)
            .is_some_and(Value::is_truthy);
        if has_key {
            self.update(db, record, true)
        } else {
            self.insert(db, record, true, false)
        }
    }
}
