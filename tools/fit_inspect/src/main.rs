//! Inspect FIT images on the host and extract the kernels they contain

use clap::{Parser, Subcommand};
use loader_log::ConsoleLogger;
use log::LevelFilter;
use std::io::Write;

mod cmd;
mod error;

pub use error::InspectError;

#[derive(Parser)]
#[command(name = "fit_inspect", about = "FIT image inspection tools")]
struct Cli {
    /// Print loader log messages (repeat for more detail)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the header and the kernel image description
    Info(cmd::info::Args),
    /// Print every record of the structure block
    Dump(cmd::dump::Args),
    /// Decompress a kernel image into a file
    Extract(cmd::extract::Args),
}

static LOGGER: ConsoleLogger = ConsoleLogger::new(LevelFilter::Trace, stderr_sink);

fn stderr_sink(args: std::fmt::Arguments) {
    let _ = std::io::stderr().write_fmt(args);
}

fn install_logger(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    if LOGGER.install().is_err() {
        eprintln!("warning: a logger is already installed");
    }
    LOGGER.update_log_level(level);
}

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), InspectError> {
    let cli = Cli::parse();
    install_logger(cli.verbose);

    match cli.command {
        Commands::Info(args) => cmd::info::run(args),
        Commands::Dump(args) => cmd::dump::run(args),
        Commands::Extract(args) => cmd::extract::run(args),
    }
}
