use std::process;

use clap::Parser;
use colored::Colorize;
use kfcount::{cli::Args, run};
use tracing_subscriber::EnvFilter;

fn main() {
    let args = Args::parse();
    init_tracing(args.verbose);

    if let Err(e) = run::run(&args) {
        eprintln!(
            "{}\n {}",
            if e.is_configuration() {
                "Problem with the requested configuration:"
            } else {
                "Application error:"
            }
            .red()
            .bold(),
            e.to_string().red()
        );
        process::exit(1);
    }
}

/// Logs to stderr. `RUST_LOG` overrides the level picked by `--verbose`.
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
