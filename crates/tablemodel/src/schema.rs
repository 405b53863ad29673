//! Column discovery.
//!
//! There is no portable "list columns" statement, so each dialect gets its own query.
//! All of them return names in the table's declared order.

use crate::connection::Connection;
use crate::database::Database;
use crate::dialect::Introspection;
use crate::error::{OrmError, OrmResult};
use crate::value::Value;

const PG_COLUMNS_SQL: &str = "SELECT column_name::text FROM information_schema.columns \
     WHERE table_schema::text = ? AND table_name::text = ? ORDER BY ordinal_position";

pub(crate) fn discover_columns<C: Connection>(
    db: &Database<C>,
    table: &str,
) -> OrmResult<Vec<String>> {
    let dialect = db.dialect()?;
    let names = match dialect.introspection() {
        Introspection::Describe => {
            let rs = db.execute(&format!("DESCRIBE {}", db.quote(table)?), &[])?;
            column_names(rs.column_values(0), table)?
        }
        Introspection::PragmaTableInfo => {
            let rs = db.execute(&format!("PRAGMA table_info({})", db.quote(table)?), &[])?;
            column_names(rs.column_values(1), table)?
        }
        Introspection::InformationSchema => {
            let (schema, name) = split_schema(table);
            let rs = db.execute(PG_COLUMNS_SQL, &[Value::from(schema), Value::from(name)])?;
            column_names(rs.column_values(0), table)?
        }
    };

    if names.is_empty() {
        return Err(OrmError::NoSuchTable(table.to_string()));
    }
    Ok(names)
}

fn column_names<'a>(
    values: impl Iterator<Item = &'a Value>,
    table: &str,
) -> OrmResult<Vec<String>> {
    values
        .map(|v| match v {
            Value::Text(s) => Ok(s.clone()),
            Value::Bytes(b) => String::from_utf8(b.clone())
                .map_err(|e| OrmError::decode(table, e.to_string())),
            other => Err(OrmError::decode(
                table,
                format!("column name is not text: {other:?}"),
            )),
        })
        .collect()
}

/// Split `schema.table`; unqualified names live in `public`.
pub(crate) fn split_schema(table: &str) -> (&str, &str) {
    match table.split_once('.') {
        Some((schema, name)) => (schema, name),
        None => ("public", table),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unqualified_table_defaults_to_public() {
        assert_eq!(split_schema("categories"), ("public", "categories"));
    }

    #[test]
    fn qualified_table_splits_once() {
        assert_eq!(split_schema("shop.categories"), ("shop", "categories"));
    }

    #[test]
    fn names_must_be_text() {
        let values = [Value::from("id"), Value::Int(3)];
        assert!(column_names(values.iter(), "t").is_err());
        let values = [Value::from("id"), Value::Bytes(b"name".to_vec())];
        assert_eq!(
            column_names(values.iter(), "t").unwrap(),
            vec!["id".to_string(), "name".to_string()]
        );
    }
}
