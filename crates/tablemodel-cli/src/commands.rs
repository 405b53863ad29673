//! Table inspection commands.

use crate::cli::{ColumnsArgs, CountArgs, FindArgs};
use crate::connect::Task;
use tablemodel::{Connection, Database, FinderOutput, Match, TableBinding, Value};

pub struct Columns(pub ColumnsArgs);

impl Task for Columns {
    fn run<C: Connection>(&self, db: &Database<C>) -> anyhow::Result<()> {
        let table = TableBinding::new(self.0.table.clone());
        for column in table.columns(db)?.iter() {
            println!("{column}");
        }
        Ok(())
    }
}

pub struct Count(pub CountArgs);

impl Task for Count {
    fn run<C: Connection>(&self, db: &Database<C>) -> anyhow::Result<()> {
        let table = TableBinding::new(self.0.table.clone());
        let n = match &self.0.condition {
            Some(condition) => table.count_where(db, condition, &[])?,
            None => table.count(db)?,
        };
        println!("{n}");
        Ok(())
    }
}

pub struct Find(pub FindArgs);

impl Find {
    fn matching(&self) -> Match {
        match self.0.values.as_slice() {
            [one] => Match::One(Value::from(one.as_str())),
            many => Match::Many(many.iter().map(Value::from).collect()),
        }
    }
}

impl Task for Find {
    fn run<C: Connection>(&self, db: &Database<C>) -> anyhow::Result<()> {
        let table = TableBinding::new(self.0.table.clone());
        let out = match table.call(db, &self.0.finder, self.matching())? {
            FinderOutput::Many(records) => serde_json::to_string_pretty(&records)?,
            FinderOutput::One(record) => serde_json::to_string_pretty(&record)?,
            FinderOutput::Count(n) => n.to_string(),
        };
        println!("{out}");
        Ok(())
    }
}
