//! # tablemodel
//!
//! A small active-record layer: one struct per table, attributes discovered from the
//! live schema, only changed fields written back.
//!
//! ## Features
//!
//! - **Schema reflecting**: column lists come from the database (`DESCRIBE`,
//!   `PRAGMA table_info`, `information_schema`) and are cached per table
//! - **Dirty tracking**: inserts and updates send only the fields that changed
//! - **Dialect aware**: MySQL, PostgreSQL and SQLite quoting and statement shapes
//! - **Prepared statement reuse**: every distinct SQL text is prepared once
//! - **Dynamic finders**: `find_by_<field>`, `findOne_by_<field>`, `first_by_<field>`,
//!   `last_by_<field>` and `count_by_<field>` dispatched by name
//! - **Blocking API**: every call returns once the query has completed
//!
//! ## Example
//!
//! ```ignore
//! use tablemodel::prelude::*;
//!
//! #[derive(Debug, Model)]
//! #[orm(table = "categories")]
//! struct Category(Record);
//!
//! let db = Database::new(SqliteConnection::open_in_memory()?);
//! db.execute(
//!     "CREATE TABLE categories (id INTEGER PRIMARY KEY, name TEXT, \
//!      created_at TEXT, updated_at TEXT)",
//!     &[],
//! )?;
//!
//! let mut c = Category::create(&db, [("name", "Fiction")])?;
//! c.save(&db)?;
//! c.set("name", "Literary Fiction")?;
//! c.save(&db)?;
//!
//! let found = Category::call(&db, "findOne_by_name", "Literary Fiction")?;
//! ```

pub mod config;
pub mod connection;
pub mod database;
pub mod dialect;
pub mod dirty;
pub mod error;
pub mod finder;
pub mod fragment;
pub mod model;
pub mod prelude;
pub mod record;
mod schema;
mod statement_cache;
pub mod table;
pub mod value;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "postgres")]
pub mod postgres;

pub use config::DatabaseConfig;
pub use connection::{Connection, ResultSet};
pub use database::Database;
pub use dialect::{Dialect, InsertStyle, Introspection};
pub use dirty::DirtyFields;
pub use error::{OrmError, OrmResult};
pub use finder::{Finder, FinderKind, FinderOutput, Match};
pub use fragment::{SetFragment, create_in_clause_placeholders};
pub use model::Model;
pub use record::Record;
pub use statement_cache::CacheStats;
pub use table::{TableBinding, ValidateFn};
pub use value::{DateInput, FromValue, TIMESTAMP_FORMAT, Value, datetime_to_sql};

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteConnection;

#[cfg(feature = "postgres")]
pub use postgres::PgConnection;

#[cfg(feature = "derive")]
pub use tablemodel_derive::Model;
