//! # basket-sim
//!
//! Plays a TOML scenario against the in-memory host: creates baskets through
//! the factory, runs contributions and withdrawals, and prints a JSON report
//! of the resulting reserves, claim holders, balances and events.

#![deny(unsafe_code)]

use std::ffi::OsString;
use std::path::PathBuf;

use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub mod error;
pub mod runner;
pub mod scenario;

pub use error::{SimError, SimResult};
pub use runner::{Report, Runner};
pub use scenario::{Scenario, Step};

/// Basket scenario runner
#[derive(Parser)]
#[command(name = "basket-sim")]
#[command(about = "Run a basket scenario and print a JSON report", long_about = None)]
#[command(version)]
struct Cli {
    /// Scenario file
    #[arg(short, long, env = "BASKET_SCENARIO")]
    scenario: PathBuf,

    /// Pretty-print the report
    #[arg(short, long)]
    pretty: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

/// Run using the current process arguments.
pub fn run() -> SimResult<()> {
    run_with_args(std::env::args_os())
}

/// Run using the provided argument iterator.
pub fn run_with_args<I, T>(args: I) -> SimResult<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = Cli::parse_from(args);

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .without_time()
                .with_writer(std::io::stderr),
        )
        .init();

    let scenario = Scenario::load(&cli.scenario)?;
    let report = simulate(&scenario)?;
    info!(
        steps = report.steps.len(),
        rejected = report.rejected(),
        baskets = report.baskets.len(),
        "Scenario finished"
    );

    let rendered = if cli.pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    println!("{}", rendered);
    Ok(())
}

/// Build the host for `scenario` and play its steps.
pub fn simulate(scenario: &Scenario) -> SimResult<Report> {
    Ok(Runner::new(scenario)?.run(&scenario.steps))
}
