//! Attribute storage for one row.
//!
//! A [`Record`] holds one [`Value`] per table column plus the set of columns that
//! changed. Two assignment paths exist and must stay separate:
//!
//! - [`Record::set`] / [`Record::hydrate`]: caller data, marks fields dirty.
//! - `load`: rows read from storage, never marks anything dirty.

use crate::dirty::DirtyFields;
use crate::error::{OrmError, OrmResult};
use crate::value::{FromValue, Value};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// The attribute map and dirty set backing one row instance.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    table: Arc<str>,
    columns: Arc<[String]>,
    /// `None` until the first assignment; afterwards one slot per column.
    data: Option<Vec<Value>>,
    dirty: DirtyFields,
}

impl Record {
    /// An empty record for `table`. Reading any attribute fails until one is set.
    pub fn new(table: impl Into<Arc<str>>, columns: Arc<[String]>) -> Self {
        Self {
            table: table.into(),
            columns,
            data: None,
            dirty: DirtyFields::new(),
        }
    }

    /// A record hydrated from caller data. Every supplied column is dirty.
    pub fn with_data<I, K, V>(table: impl Into<Arc<str>>, columns: Arc<[String]>, data: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let mut record = Self::new(table, columns);
        record.hydrate(data);
        record
    }

    /// A record built from a fetched row. Nothing is dirty.
    pub(crate) fn from_row<I>(table: impl Into<Arc<str>>, columns: Arc<[String]>, row: I) -> Self
    where
        I: IntoIterator<Item = (String, Value)>,
    {
        let mut record = Self::new(table, columns);
        record.load(row);
        record
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub(crate) fn columns_arc(&self) -> Arc<[String]> {
        Arc::clone(&self.columns)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.index_of(name).is_some()
    }

    /// Whether any attribute has been set yet.
    pub fn has_data(&self) -> bool {
        self.data.is_some()
    }

    /// Fails with [`OrmError::NotInitialized`] when no attribute has been set yet.
    pub fn data_present(&self) -> OrmResult<()> {
        if self.has_data() {
            Ok(())
        } else {
            Err(OrmError::NotInitialized(self.table.to_string()))
        }
    }

    fn index_of(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    fn slot(&self, name: &str) -> OrmResult<usize> {
        self.index_of(name)
            .ok_or_else(|| OrmError::unknown_field(&*self.table, name))
    }

    fn data_mut(&mut self) -> &mut Vec<Value> {
        let len = self.columns.len();
        self.data.get_or_insert_with(|| vec![Value::Null; len])
    }

    /// Read an attribute.
    pub fn get(&self, name: &str) -> OrmResult<&Value> {
        let Some(data) = &self.data else {
            return Err(OrmError::NotInitialized(name.to_string()));
        };
        let idx = self.slot(name)?;
        Ok(&data[idx])
    }

    /// Read an attribute converted to `T`.
    pub fn get_as<T: FromValue>(&self, name: &str) -> OrmResult<T> {
        let value = self.get(name)?;
        T::from_value(value).map_err(|message| OrmError::decode(name, message))
    }

    /// Read an attribute without failing; `None` when unset or unknown.
    pub fn value(&self, name: &str) -> Option<&Value> {
        let idx = self.index_of(name)?;
        self.data.as_ref().map(|data| &data[idx])
    }

    /// Whether the attribute exists and is not null.
    pub fn is_set(&self, name: &str) -> bool {
        self.value(name).is_some_and(|v| !v.is_null())
    }

    /// Assign an attribute and mark it dirty.
    ///
    /// Only table columns may be set.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> OrmResult<()> {
        let idx = self.slot(name)?;
        self.data_mut()[idx] = value.into();
        self.dirty.mark(name);
        Ok(())
    }

    /// Assign without touching the dirty set.
    pub(crate) fn assign_clean(&mut self, name: &str, value: Value) -> OrmResult<()> {
        let idx = self.slot(name)?;
        self.data_mut()[idx] = value;
        Ok(())
    }

    /// Copy caller data into the record.
    ///
    /// Keys that are table columns are assigned and marked dirty; other keys are
    /// dropped. Columns absent from `input` become null (clean) if never set.
    pub fn hydrate<I, K, V>(&mut self, input: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let mut input: HashMap<String, Value> = input
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self.data_mut();

        let columns = Arc::clone(&self.columns);
        for (idx, column) in columns.iter().enumerate() {
            if let Some(value) = input.remove(column) {
                if let Some(data) = self.data.as_mut() {
                    data[idx] = value;
                }
                self.dirty.mark(column);
            }
        }
    }

    /// Copy a stored row into the record and reset dirtiness.
    pub(crate) fn load<I>(&mut self, row: I)
    where
        I: IntoIterator<Item = (String, Value)>,
    {
        let mut row: HashMap<String, Value> = row.into_iter().collect();
        let columns = Arc::clone(&self.columns);
        let data = self.data_mut();
        for (idx, column) in columns.iter().enumerate() {
            if let Some(value) = row.remove(column) {
                data[idx] = value;
            }
        }
        self.dirty.clear();
    }

    /// Set every column to null and reset dirtiness.
    pub fn clear(&mut self) {
        let len = self.columns.len();
        self.data = Some(vec![Value::Null; len]);
        self.dirty.clear();
    }

    /// Snapshot of every column, regardless of dirtiness.
    pub fn to_map(&self) -> OrmResult<BTreeMap<String, Value>> {
        self.data_present()?;
        Ok(self
            .iter()
            .map(|(column, value)| (column.to_string(), value.clone()))
            .collect())
    }

    /// `(column, value)` pairs in declared column order. Empty until data is present.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        let data = self.data.as_deref().unwrap_or(&[]);
        self.columns.iter().map(String::as_str).zip(data.iter())
    }

    pub fn mark_dirty(&mut self, field: &str) {
        self.dirty.mark(field);
    }

    pub fn is_dirty(&self, field: &str) -> bool {
        self.dirty.is_dirty(field)
    }

    pub fn clear_dirty(&mut self) {
        self.dirty.clear();
    }

    pub fn dirty_fields(&self) -> &DirtyFields {
        &self.dirty
    }
}

impl Serialize for Record {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let len = self.data.as_ref().map_or(0, Vec::len);
        let mut map = serializer.serialize_map(Some(len))?;
        for (column, value) in self.iter() {
            map.serialize_entry(column, value)?;
        }
        map.end()
    }
}
