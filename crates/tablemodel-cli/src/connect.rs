//! Open the database named by a URL and hand it to a command.

use crate::cli::ConnArgs;
use crate::config::{ConfigFile, resolve_url};
use tablemodel::{Connection, Database, DatabaseConfig, PgConnection, SqliteConnection};

/// A command that works against any connection.
pub trait Task {
    fn run<C: Connection>(&self, db: &Database<C>) -> anyhow::Result<()>;
}

/// Which adapter a URL selects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    SqliteMemory,
    SqliteFile(String),
    Postgres(String),
}

pub fn parse_target(url: &str) -> anyhow::Result<Target> {
    let url = url.trim();
    if url == "sqlite::memory:" || url == "sqlite://:memory:" {
        return Ok(Target::SqliteMemory);
    }
    if let Some(path) = url.strip_prefix("sqlite://") {
        if path.is_empty() {
            anyhow::bail!("sqlite URL is missing a path: {url}");
        }
        return Ok(Target::SqliteFile(path.to_string()));
    }
    if url.starts_with("postgres://") || url.starts_with("postgresql://") {
        return Ok(Target::Postgres(url.to_string()));
    }
    anyhow::bail!("unsupported database URL (expected sqlite:// or postgres://): {url}")
}

pub fn dispatch(args: &ConnArgs, task: &impl Task) -> anyhow::Result<()> {
    let file = ConfigFile::load(&args.config)?;
    let url = resolve_url(args.database_url.as_deref(), &file);

    let mut config = DatabaseConfig::new();
    if let Some(threshold) = file.slow_threshold() {
        config = config.slow_threshold(threshold);
    }
    if let Some(enabled) = file.database.statement_cache {
        config = config.statement_cache(enabled);
    }

    let target = parse_target(&url)?;
    tracing::debug!(?target, "opening database");
    match target {
        Target::SqliteMemory => {
            task.run(&Database::with_config(SqliteConnection::open_in_memory()?, config))
        }
        Target::SqliteFile(path) => {
            task.run(&Database::with_config(SqliteConnection::open(path)?, config))
        }
        Target::Postgres(url) => task.run(&Database::with_config(PgConnection::connect(&url)?, config)),
    }
}
