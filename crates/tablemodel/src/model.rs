//! Concrete record types.
//!
//! A [`Model`] is a struct wrapping one [`Record`] whose table name and primary key are
//! fixed at compile time. Usually implemented with `#[derive(Model)]`:
//!
//! ```ignore
//! use tablemodel::{Model, Record};
//!
//! #[derive(Debug, Model)]
//! #[orm(table = "categories")]
//! struct Category(Record);
//!
//! let mut fiction = Category::create(&db, [("name", "Fiction")])?;
//! fiction.save(&db)?;
//! let all = Category::find_by(&db, "name", vec!["Fiction", "SciFi"])?;
//! ```
//!
//! Every provided method delegates to the [`TableBinding`] returned by
//! [`Model::binding`], wrapping fetched records in `Self`.

use crate::connection::Connection;
use crate::database::Database;
use crate::error::OrmResult;
use crate::finder::{FinderOutput, Match};
use crate::record::Record;
use crate::table::TableBinding;
use crate::value::{FromValue, Value};
use std::collections::BTreeMap;

pub trait Model: Sized {
    const TABLE: &'static str;
    const PRIMARY_KEY: &'static str = "id";

    fn from_record(record: Record) -> Self;
    fn record(&self) -> &Record;
    fn record_mut(&mut self) -> &mut Record;

    /// Runs before every insert and update. Returning an error aborts the write.
    fn validate(_record: &Record) -> OrmResult<()> {
        Ok(())
    }

    fn binding() -> TableBinding {
        TableBinding::new(Self::TABLE)
            .primary_key(Self::PRIMARY_KEY)
            .validator(Self::validate)
    }

    fn blank<C: Connection>(db: &Database<C>) -> OrmResult<Self> {
        Self::binding().blank(db).map(Self::from_record)
    }

    /// New instance hydrated from `data`; supplied columns are dirty.
    fn create<C, I, K, V>(db: &Database<C>, data: I) -> OrmResult<Self>
    where
        C: Connection,
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Self::binding().create(db, data).map(Self::from_record)
    }

    fn count<C: Connection>(db: &Database<C>) -> OrmResult<i64> {
        Self::binding().count(db)
    }

    fn count_where<C: Connection>(
        db: &Database<C>,
        fragment: &str,
        params: &[Value],
    ) -> OrmResult<i64> {
        Self::binding().count_where(db, fragment, params)
    }

    fn fetch_where<C: Connection>(
        db: &Database<C>,
        fragment: &str,
        params: &[Value],
        limit_one: bool,
    ) -> OrmResult<Vec<Self>> {
        let records = Self::binding().fetch_where(db, fragment, params, limit_one)?;
        Ok(records.into_iter().map(Self::from_record).collect())
    }

    fn fetch_all_where<C: Connection>(
        db: &Database<C>,
        fragment: &str,
        params: &[Value],
    ) -> OrmResult<Vec<Self>> {
        Self::fetch_where(db, fragment, params, false)
    }

    fn fetch_one_where<C: Connection>(
        db: &Database<C>,
        fragment: &str,
        params: &[Value],
    ) -> OrmResult<Option<Self>> {
        Ok(Self::binding()
            .fetch_one_where(db, fragment, params)?
            .map(Self::from_record))
    }

    fn get_by_id<C: Connection>(db: &Database<C>, id: impl Into<Value>) -> OrmResult<Option<Self>> {
        Ok(Self::binding().get_by_id(db, id)?.map(Self::from_record))
    }

    fn find<C: Connection>(db: &Database<C>, id: impl Into<Value>) -> OrmResult<Vec<Self>> {
        let records = Self::binding().find(db, id)?;
        Ok(records.into_iter().map(Self::from_record).collect())
    }

    fn first<C: Connection>(db: &Database<C>) -> OrmResult<Option<Self>> {
        Ok(Self::binding().first(db)?.map(Self::from_record))
    }

    fn last<C: Connection>(db: &Database<C>) -> OrmResult<Option<Self>> {
        Ok(Self::binding().last(db)?.map(Self::from_record))
    }

    fn delete_by_id<C: Connection>(db: &Database<C>, id: impl Into<Value>) -> OrmResult<bool> {
        Self::binding().delete_by_id(db, id)
    }

    fn delete_all_where<C: Connection>(
        db: &Database<C>,
        fragment: &str,
        params: &[Value],
    ) -> OrmResult<u64> {
        Self::binding().delete_all_where(db, fragment, params)
    }

    /// Dynamic finder by name, e.g. `Category::call(&db, "last_by_name", "Poetry")`.
    fn call<C: Connection>(
        db: &Database<C>,
        name: &str,
        matching: impl Into<Match>,
    ) -> OrmResult<FinderOutput<Self>> {
        Ok(Self::binding().call(db, name, matching)?.map(Self::from_record))
    }

    fn find_by<C: Connection>(
        db: &Database<C>,
        field: &str,
        matching: impl Into<Match>,
    ) -> OrmResult<Vec<Self>> {
        let records = Self::binding().find_by(db, field, matching)?;
        Ok(records.into_iter().map(Self::from_record).collect())
    }

    fn find_one_by<C: Connection>(
        db: &Database<C>,
        field: &str,
        matching: impl Into<Match>,
    ) -> OrmResult<Option<Self>> {
        Ok(Self::binding()
            .find_one_by(db, field, matching)?
            .map(Self::from_record))
    }

    fn first_by<C: Connection>(
        db: &Database<C>,
        field: &str,
        matching: impl Into<Match>,
    ) -> OrmResult<Option<Self>> {
        Ok(Self::binding()
            .first_by(db, field, matching)?
            .map(Self::from_record))
    }

    fn last_by<C: Connection>(
        db: &Database<C>,
        field: &str,
        matching: impl Into<Match>,
    ) -> OrmResult<Option<Self>> {
        Ok(Self::binding()
            .last_by(db, field, matching)?
            .map(Self::from_record))
    }

    fn count_by<C: Connection>(
        db: &Database<C>,
        field: &str,
        matching: impl Into<Match>,
    ) -> OrmResult<i64> {
        Self::binding().count_by(db, field, matching)
    }

    // ------------------------------------------------------------------
    // Instance operations
    // ------------------------------------------------------------------

    fn insert<C: Connection>(
        &mut self,
        db: &Database<C>,
        auto_timestamp: bool,
        allow_set_primary_key: bool,
    ) -> OrmResult<bool> {
        Self::binding().insert(db, self.record_mut(), auto_timestamp, allow_set_primary_key)
    }

    fn update<C: Connection>(&mut self, db: &Database<C>, auto_timestamp: bool) -> OrmResult<bool> {
        Self::binding().update(db, self.record_mut(), auto_timestamp)
    }

    /// Update when the primary key is truthy, insert otherwise.
    fn save<C: Connection>(&mut self, db: &Database<C>) -> OrmResult<bool> {
        Self::binding().save(db, self.record_mut())
    }

    fn delete<C: Connection>(&self, db: &Database<C>) -> OrmResult<bool> {
        Self::binding().delete(db, self.record())
    }

    /// Primary key value, `Null` when unset.
    fn id(&self) -> Value {
        self.record()
            .value(Self::PRIMARY_KEY)
            .cloned()
            .unwrap_or_default()
    }

    fn get(&self, field: &str) -> OrmResult<&Value> {
        self.record().get(field)
    }

    fn get_as<T: FromValue>(&self, field: &str) -> OrmResult<T> {
        self.record().get_as(field)
    }

    fn set(&mut self, field: &str, value: impl Into<Value>) -> OrmResult<()> {
        self.record_mut().set(field, value)
    }

    fn to_map(&self) -> OrmResult<BTreeMap<String, Value>> {
        self.record().to_map()
    }
}
