//! SQL dialect detection and the per-dialect statement shapes.

use std::fmt;

/// The SQL variant a connection speaks, derived from the driver name it reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    /// `mysql`
    MySql,
    /// `pgsql`
    Postgres,
    /// `sqlite`
    Sqlite,
    /// `sqlite2`
    Sqlite2,
    /// `sqlsrv`, `dblib`, `mssql`, `sybase`
    SqlServer,
    /// Anything else; treated like MySQL.
    Other,
}

/// How column names are discovered for a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Introspection {
    /// `DESCRIBE <table>`, first output column.
    Describe,
    /// `PRAGMA table_info(<table>)`, second output column.
    PragmaTableInfo,
    /// `information_schema.columns` filtered by schema and table.
    InformationSchema,
}

/// How INSERT statements are shaped and how the generated key is read back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertStyle {
    /// `INSERT INTO t SET a = ?, ...`, key from last-insert-id.
    SetClause,
    /// `INSERT INTO t (a, ...) VALUES (?, ...)`, key from last-insert-id.
    ColumnList,
    /// `INSERT INTO t (a, ...) VALUES (?, ...) RETURNING pk`, key from the returned row.
    Returning,
}

impl Dialect {
    /// Map a driver name (`mysql`, `pgsql`, `sqlite`, ...) to a dialect.
    pub fn from_driver_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "mysql" => Dialect::MySql,
            "pgsql" | "postgres" | "postgresql" => Dialect::Postgres,
            "sqlite" => Dialect::Sqlite,
            "sqlite2" => Dialect::Sqlite2,
            "sqlsrv" | "dblib" | "mssql" | "sybase" => Dialect::SqlServer,
            _ => Dialect::Other,
        }
    }

    pub fn quote_char(self) -> char {
        match self {
            Dialect::Postgres | Dialect::SqlServer => '"',
            Dialect::MySql | Dialect::Sqlite | Dialect::Sqlite2 | Dialect::Other => '`',
        }
    }

    pub fn introspection(self) -> Introspection {
        match self {
            Dialect::Postgres => Introspection::InformationSchema,
            Dialect::Sqlite => Introspection::PragmaTableInfo,
            _ => Introspection::Describe,
        }
    }

    pub fn insert_style(self) -> InsertStyle {
        match self {
            Dialect::Postgres => InsertStyle::Returning,
            Dialect::Sqlite => InsertStyle::ColumnList,
            _ => InsertStyle::SetClause,
        }
    }

    /// Whether `UPDATE ... LIMIT 1` / `DELETE ... LIMIT 1` is accepted.
    ///
    /// Stock SQLite builds lack `SQLITE_ENABLE_UPDATE_DELETE_LIMIT`, so SQLite relies on
    /// key uniqueness the same way PostgreSQL does.
    pub fn supports_limit_on_write(self) -> bool {
        matches!(self, Dialect::MySql | Dialect::Sqlite2 | Dialect::Other)
    }

    /// Statement tail for an INSERT that sets no columns, if the dialect has one.
    pub fn empty_insert_clause(self) -> Option<&'static str> {
        match self {
            Dialect::Postgres | Dialect::Sqlite | Dialect::SqlServer => Some("DEFAULT VALUES"),
            Dialect::MySql => Some("() VALUES ()"),
            Dialect::Sqlite2 | Dialect::Other => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Dialect::MySql => "mysql",
            Dialect::Postgres => "pgsql",
            Dialect::Sqlite => "sqlite",
            Dialect::Sqlite2 => "sqlite2",
            Dialect::SqlServer => "sqlsrv",
            Dialect::Other => "other",
        }
    }

    /// Quote a possibly dot-separated identifier (`table.column`).
    ///
    /// Each segment is quoted on its own; `*` is left bare. Quote characters inside a
    /// segment are doubled.
    pub fn quote_identifier(self, identifier: &str) -> String {
        let mut out = String::with_capacity(identifier.len() + 2);
        for (i, part) in identifier.split('.').enumerate() {
            if i > 0 {
                out.push('.');
            }
            self.write_quoted_part(part, &mut out);
        }
        out
    }

    fn write_quoted_part(self, part: &str, out: &mut String) {
        if part == "*" {
            out.push('*');
            return;
        }
        let q = self.quote_char();
        out.push(q);
        for ch in part.chars() {
            if ch == q {
                out.push(q);
            }
            out.push(ch);
        }
        out.push(q);
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
