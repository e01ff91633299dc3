#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI driver for the service-map enrichment pipeline.
//!
//! Ingests the service-request and wind CSVs, assigns hex indices,
//! subsamples to the site radius, builds the half-hour wind grid, joins it
//! onto request timestamps, and writes the anonymized extract.
//!
//! Uses `indicatif-log-bridge` (via [`service_map_cli_utils::init_logger`])
//! to route `log` output through `indicatif::MultiProgress` so that log
//! lines and progress bars never fight for the terminal.

mod config;
mod pipeline;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "service_map_cli",
    about = "Service-request enrichment and anonymization pipeline"
)]
struct Cli {
    /// Pipeline config TOML; the embedded defaults are used when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline: index, subsample, wind grid, join, anonymize
    Run(pipeline::RunArgs),
    /// Validate a derived hex index set against the reference catalog
    Validate(pipeline::ValidateArgs),
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = service_map_cli_utils::init_logger();
    let cli = Cli::parse();

    let config = config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Run(args) => pipeline::run(&multi, &config, &args),
        Commands::Validate(args) => pipeline::validate(&config, &args),
    }
}
