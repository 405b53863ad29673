fn main() {
    tablemodel_cli::init_tracing();
    if let Err(e) = tablemodel_cli::run(std::env::args().collect()) {
        eprintln!("{e:#}");
        std::process::exit(1);
    }
}
