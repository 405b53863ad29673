use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HelpTopic {
    Root,
    Demo,
    Columns,
    Count,
    Find,
}

#[derive(Debug, Clone)]
pub enum Command {
    Help(HelpTopic),
    Demo(ConnArgs),
    Columns(ColumnsArgs),
    Count(CountArgs),
    Find(FindArgs),
}

/// Options shared by every command that talks to a database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnArgs {
    pub config: PathBuf,
    pub database_url: Option<String>,
}

impl Default for ConnArgs {
    fn default() -> Self {
        Self {
            config: PathBuf::from("tablemodel.toml"),
            database_url: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ColumnsArgs {
    pub conn: ConnArgs,
    pub table: String,
}

#[derive(Debug, Clone)]
pub struct CountArgs {
    pub conn: ConnArgs,
    pub table: String,
    pub condition: Option<String>,
}

#[derive(Debug, Clone)]
pub struct FindArgs {
    pub conn: ConnArgs,
    pub table: String,
    pub finder: String,
    pub values: Vec<String>,
}

pub fn parse_args(args: &[String]) -> anyhow::Result<Command> {
    let mut it = args.iter().skip(1);
    let Some(first) = it.next() else {
        return Ok(Command::Help(HelpTopic::Root));
    };

    let topic = match first.as_str() {
        "-h" | "--help" | "help" => return Ok(Command::Help(HelpTopic::Root)),
        "demo" => HelpTopic::Demo,
        "columns" => HelpTopic::Columns,
        "count" => HelpTopic::Count,
        "find" => HelpTopic::Find,
        _ => anyhow::bail!("unknown command: {first}"),
    };

    let Some((conn, positional)) = parse_common(it.map(|s| s.as_str()))? else {
        return Ok(Command::Help(topic));
    };
    let mut positional = positional.into_iter();

    let cmd = match topic {
        HelpTopic::Demo => {
            if let Some(extra) = positional.next() {
                anyhow::bail!("unexpected argument: {extra}");
            }
            Command::Demo(conn)
        }
        HelpTopic::Columns => {
            let table = require(positional.next(), "table")?;
            if let Some(extra) = positional.next() {
                anyhow::bail!("unexpected argument: {extra}");
            }
            Command::Columns(ColumnsArgs { conn, table })
        }
        HelpTopic::Count => {
            let table = require(positional.next(), "table")?;
            let rest: Vec<String> = positional.collect();
            let condition = (!rest.is_empty()).then(|| rest.join(" "));
            Command::Count(CountArgs {
                conn,
                table,
                condition,
            })
        }
        HelpTopic::Find => {
            let table = require(positional.next(), "table")?;
            let finder = require(positional.next(), "finder")?;
            let values: Vec<String> = positional.collect();
            if values.is_empty() {
                anyhow::bail!("find requires at least one value");
            }
            Command::Find(FindArgs {
                conn,
                table,
                finder,
                values,
            })
        }
        HelpTopic::Root => Command::Help(HelpTopic::Root),
    };
    Ok(cmd)
}

fn require(v: Option<String>, what: &str) -> anyhow::Result<String> {
    v.ok_or_else(|| anyhow::anyhow!("missing <{what}> argument"))
}

/// Connection options plus positional arguments, or `None` when help was requested.
fn parse_common<'a>(
    mut it: impl Iterator<Item = &'a str>,
) -> anyhow::Result<Option<(ConnArgs, Vec<String>)>> {
    let mut conn = ConnArgs::default();
    let mut positional = Vec::new();

    while let Some(token) = it.next() {
        match token {
            "-h" | "--help" => return Ok(None),
            "--config" => {
                let Some(v) = it.next() else {
                    anyhow::bail!("--config requires a value");
                };
                conn.config = PathBuf::from(v);
            }
            _ if token.starts_with("--config=") => {
                conn.config = PathBuf::from(token.trim_start_matches("--config="));
            }
            "--database-url" => {
                let Some(v) = it.next() else {
                    anyhow::bail!("--database-url requires a value");
                };
                conn.database_url = Some(v.to_string());
            }
            _ if token.starts_with("--database-url=") => {
                conn.database_url = Some(token.trim_start_matches("--database-url=").to_string());
            }
            other if other.starts_with("--") => anyhow::bail!("unknown argument: {other}"),
            other => positional.push(other.to_string()),
        }
    }

    Ok(Some((conn, positional)))
}

pub fn print_help(topic: HelpTopic) {
    match topic {
        HelpTopic::Root => {
            println!(
                "\
tablemodel - active-record demo and table inspection

USAGE:
  tablemodel <COMMAND> [OPTIONS]

COMMANDS:
  demo          Create a `categories` table and walk through insert/update/fetch
  columns       List the discovered columns of a table
  count         Count rows, optionally filtered by a WHERE fragment
  find          Run a dynamic finder such as find_by_name

GLOBAL OPTIONS:
  --config <FILE>         Config file path (default: tablemodel.toml)
  --database-url <URL>    Override database.url from config / DATABASE_URL
  -h, --help              Print help

URLS:
  sqlite::memory:         Private in-memory SQLite database (default)
  sqlite://<path>         SQLite database file
  postgres://...          PostgreSQL

Run `tablemodel <command> --help` for more."
            );
        }
        HelpTopic::Demo => {
            println!(
                "\
USAGE:
  tablemodel demo [OPTIONS]

Creates `categories` if missing, then inserts, updates, re-reads and lists rows,
printing each record as JSON."
            );
        }
        HelpTopic::Columns => {
            println!(
                "\
USAGE:
  tablemodel columns <TABLE> [OPTIONS]"
            );
        }
        HelpTopic::Count => {
            println!(
                "\
USAGE:
  tablemodel count <TABLE> [WHERE...] [OPTIONS]

The WHERE fragment is raw SQL and is not escaped."
            );
        }
        HelpTopic::Find => {
            println!(
                "\
USAGE:
  tablemodel find <TABLE> <FINDER> <VALUE>... [OPTIONS]

FINDERS:
  find_by_<field>       Every matching row
  findOne_by_<field>    First match by <field> ascending
  first_by_<field>      First match by <field> ascending
  last_by_<field>       First match by <field> descending
  count_by_<field>      Number of matches

Several values match with IN (...)."
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(v: &[&str]) -> Vec<String> {
        std::iter::once("tablemodel")
            .chain(v.iter().copied())
            .map(String::from)
            .collect()
    }

    #[test]
    fn no_args_is_root_help() {
        assert!(matches!(
            parse_args(&args(&[])).unwrap(),
            Command::Help(HelpTopic::Root)
        ));
    }

    #[test]
    fn subcommand_help() {
        assert!(matches!(
            parse_args(&args(&["find", "--help"])).unwrap(),
            Command::Help(HelpTopic::Find)
        ));
    }

    #[test]
    fn find_collects_values_and_options() {
        let cmd = parse_args(&args(&[
            "find",
            "categories",
            "find_by_name",
            "Fiction",
            "--database-url=sqlite://db.sqlite",
            "Poetry",
        ]))
        .unwrap();
        let Command::Find(f) = cmd else {
            panic!("expected find, got {cmd:?}");
        };
        assert_eq!(f.table, "categories");
        assert_eq!(f.finder, "find_by_name");
        assert_eq!(f.values, vec!["Fiction", "Poetry"]);
        assert_eq!(f.conn.database_url.as_deref(), Some("sqlite://db.sqlite"));
    }

    #[test]
    fn count_joins_condition() {
        let Command::Count(c) = parse_args(&args(&["count", "t", "id", ">", "3"])).unwrap() else {
            panic!("expected count");
        };
        assert_eq!(c.condition.as_deref(), Some("id > 3"));
    }

    #[test]
    fn rejects_unknown() {
        assert!(parse_args(&args(&["frobnicate"])).is_err());
        assert!(parse_args(&args(&["columns"])).is_err());
        assert!(parse_args(&args(&["demo", "--verbose"])).is_err());
        assert!(parse_args(&args(&["find", "t", "find_by_name"])).is_err());
    }
}
