//! Binary crate for the `weather-dashboard` command-line tool.
//!
//! This crate focuses on:
//! - Parsing CLI arguments
//! - Interactive prompts (extra city, API keys)
//! - Human-friendly output formatting and the temperature chart

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod chart;
mod cli;
mod output;
mod prompt;

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cmd = cli::Cli::parse();
    init_tracing(cmd.verbose);
    cmd.run().await
}
