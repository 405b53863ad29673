//! Convenient imports for typical `tablemodel` usage.
//!
//! ```ignore
//! use tablemodel::prelude::*;
//! ```

pub use crate::{
    Connection, Database, DatabaseConfig, FinderOutput, Match, Model, OrmError, OrmResult, Record,
    TableBinding, Value,
};

#[cfg(feature = "sqlite")]
pub use crate::SqliteConnection;

#[cfg(feature = "postgres")]
pub use crate::PgConnection;
