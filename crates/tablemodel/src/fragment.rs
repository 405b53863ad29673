//! SET / column-list fragments built from a record's dirty fields.

use crate::dialect::Dialect;
use crate::record::Record;
use crate::value::Value;

/// The dirty columns of a record rendered as SQL.
///
/// Non-null values become `?` placeholders with the value pushed to `params` in
/// emission order; nulls are written as a literal `NULL` and bind nothing. Values are
/// never inlined, so equal shapes produce equal SQL text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SetFragment {
    /// `` `a` = ?, `b` = NULL ``, used by UPDATE and `INSERT ... SET`.
    pub sql: String,
    pub params: Vec<Value>,
    /// Quoted column names, for `INSERT (cols) VALUES (...)`.
    pub columns: Vec<String>,
    /// `?` or `NULL`, aligned with `columns`.
    pub placeholders: Vec<&'static str>,
}

impl SetFragment {
    /// Collect the dirty columns of `record`, skipping `primary_key` unless
    /// `include_primary_key` is set.
    pub fn build(
        dialect: Dialect,
        record: &Record,
        primary_key: &str,
        include_primary_key: bool,
    ) -> Self {
        let mut fragment = Self::default();
        let mut assignments = Vec::new();

        for (column, value) in record.iter() {
            if !include_primary_key && column == primary_key {
                continue;
            }
            if !record.is_dirty(column) {
                continue;
            }
            let quoted = dialect.quote_identifier(column);
            let placeholder = if value.is_null() {
                "NULL"
            } else {
                fragment.params.push(value.clone());
                "?"
            };
            assignments.push(format!("{quoted} = {placeholder}"));
            fragment.columns.push(quoted);
            fragment.placeholders.push(placeholder);
        }

        fragment.sql = assignments.join(", ");
        fragment
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// `` `a`, `b` ``
    pub fn column_list(&self) -> String {
        self.columns.join(", ")
    }

    /// `?, NULL`
    pub fn values_list(&self) -> String {
        self.placeholders.join(", ")
    }
}

/// `?, ?, ?` for an IN clause of `count` values.
pub fn create_in_clause_placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn record() -> Record {
        let columns: Arc<[String]> = ["id", "name", "note", "rank"]
            .into_iter()
            .map(String::from)
            .collect();
        let mut record = Record::new("items", columns);
        record.clear();
        record
    }

    #[test]
    fn only_dirty_columns_are_emitted() {
        let mut r = record();
        r.set("name", "Fiction").unwrap();
        let f = SetFragment::build(Dialect::MySql, &r, "id", false);
        assert_eq!(f.sql, "`name` = ?");
        assert_eq!(f.params, vec![Value::from("Fiction")]);
    }

    #[test]
    fn null_is_literal_and_unbound() {
        let mut r = record();
        r.set("name", "a").unwrap();
        r.set("note", Value::Null).unwrap();
        r.set("rank", 3).unwrap();
        let f = SetFragment::build(Dialect::Postgres, &r, "id", false);
        assert_eq!(f.sql, "\"name\" = ?, \"note\" = NULL, \"rank\" = ?");
        assert_eq!(f.params, vec![Value::from("a"), Value::Int(3)]);
        assert_eq!(f.column_list(), "\"name\", \"note\", \"rank\"");
        assert_eq!(f.values_list(), "?, NULL, ?");
    }

    #[test]
    fn primary_key_only_when_requested() {
        let mut r = record();
        r.set("id", 9).unwrap();
        r.set("name", "x").unwrap();
        let without = SetFragment::build(Dialect::MySql, &r, "id", false);
        assert_eq!(without.sql, "`name` = ?");
        let with = SetFragment::build(Dialect::MySql, &r, "id", true);
        assert_eq!(with.sql, "`id` = ?, `name` = ?");
        assert_eq!(with.params, vec![Value::Int(9), Value::from("x")]);
    }

    #[test]
    fn clean_record_gives_empty_fragment() {
        let f = SetFragment::build(Dialect::Sqlite, &record(), "id", false);
        assert!(f.is_empty());
        assert_eq!(f.sql, "");
        assert!(f.params.is_empty());
    }

    #[test]
    fn same_shape_same_sql() {
        let mut a = record();
        a.set("name", "one").unwrap();
        let mut b = record();
        b.set("name", "two").unwrap();
        assert_eq!(
            SetFragment::build(Dialect::MySql, &a, "id", false).sql,
            SetFragment::build(Dialect::MySql, &b, "id", false).sql
        );
    }

    #[test]
    fn in_clause_placeholders() {
        assert_eq!(create_in_clause_placeholders(3), "?, ?, ?");
        assert_eq!(create_in_clause_placeholders(1), "?");
        assert_eq!(create_in_clause_placeholders(0), "");
    }
}
