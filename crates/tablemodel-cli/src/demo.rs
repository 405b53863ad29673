//! `tablemodel demo`: the categories walkthrough.

use crate::connect::Task;
use serde::Serialize;
use tablemodel::{Connection, Database, Dialect, Model, Record};

#[derive(Debug, Model)]
#[orm(table = "categories")]
struct Category(Record);

fn create_table_sql(dialect: Dialect) -> anyhow::Result<&'static str> {
    match dialect {
        Dialect::Postgres => Ok("CREATE TABLE IF NOT EXISTS categories (\
             id SERIAL PRIMARY KEY, \
             name VARCHAR(120), \
             updated_at TIMESTAMP NULL, \
             created_at TIMESTAMP NULL)"),
        Dialect::Sqlite => Ok("CREATE TABLE IF NOT EXISTS categories (\
             id INTEGER PRIMARY KEY AUTOINCREMENT, \
             name VARCHAR(120), \
             updated_at TIMESTAMP NULL, \
             created_at TIMESTAMP NULL)"),
        other => anyhow::bail!("demo has no table definition for the {other:?} dialect"),
    }
}

fn section(title: &str, value: &impl Serialize) -> anyhow::Result<()> {
    println!("{title}");
    println!("{}", "=".repeat(title.len()));
    println!("{}", serde_json::to_string_pretty(value)?);
    println!("{}\n", "-".repeat(54));
    Ok(())
}

pub struct Demo;

impl Task for Demo {
    fn run<C: Connection>(&self, db: &Database<C>) -> anyhow::Result<()> {
        db.execute(create_table_sql(db.dialect()?)?, &[])?;

        let mut category = Category::create(db, [("name", "test")])?;
        category.save(db)?;
        section("Create name=test", category.record())?;

        category.set("name", "new name")?;
        category.save(db)?;
        section("Change name to=new name", category.record())?;

        let fetched = Category::get_by_id(db, category.id())?;
        section(
            "Fetch last object into a new Object",
            &fetched.as_ref().map(Category::record),
        )?;

        let all: Vec<Record> = Category::fetch_all_where(db, "1=1", &[])?
            .into_iter()
            .map(|c| c.0)
            .collect();
        section("Fetch All", &all)?;

        let named = Category::call(db, "count_by_name", "new name")?;
        section("count_by_name = new name", &named.count())?;

        tracing::info!(cache = ?db.cache_stats(), "demo finished");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_definitions_exist_for_reachable_targets() {
        assert!(create_table_sql(Dialect::Sqlite).unwrap().contains("AUTOINCREMENT"));
        assert!(create_table_sql(Dialect::Postgres).unwrap().contains("SERIAL"));
    }

    #[test]
    fn other_dialects_are_refused() {
        for dialect in [Dialect::MySql, Dialect::Sqlite2, Dialect::SqlServer, Dialect::Other] {
            let err = create_table_sql(dialect).unwrap_err();
            assert!(err.to_string().contains("no table definition"), "{err}");
        }
    }
}
