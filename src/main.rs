use anyhow::Context;
use clap::Parser;
use starledger::cli_io::Cli;
use starledger::commands::execute;
use starledger::storage::JsonFileStore;
use std::io;
use tracing::debug;
use tracing_subscriber::EnvFilter;

fn init_tracing(verbose: bool) {
    let fallback = if verbose {
        "starledger=debug"
    } else {
        "starledger=warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    // stderr keeps csv listings on stdout clean
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let mut store = JsonFileStore::open(&cli.store)
        .with_context(|| format!("opening store {}", cli.store.display()))?;
    debug!(store = %store.path().display(), command = ?cli.command, "running");
    let stdout = io::stdout();
    let mut console = stdout.lock();
    execute(&cli.command, &mut store, &mut console)
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    if let Err(e) = run(&cli) {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}
