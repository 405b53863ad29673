mod cli;
mod commands;
mod config;
mod connect;
mod demo;

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Log to stderr, filtered by `RUST_LOG` (default: warnings only).
pub fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

pub fn run(args: Vec<String>) -> anyhow::Result<()> {
    let cmd = cli::parse_args(&args)?;
    match cmd {
        cli::Command::Help(topic) => {
            cli::print_help(topic);
            Ok(())
        }
        cli::Command::Demo(conn) => connect::dispatch(&conn, &demo::Demo),
        cli::Command::Columns(args) => connect::dispatch(&args.conn, &commands::Columns(args.clone())),
        cli::Command::Count(args) => connect::dispatch(&args.conn, &commands::Count(args.clone())),
        cli::Command::Find(args) => connect::dispatch(&args.conn, &commands::Find(args.clone())),
    }
}
