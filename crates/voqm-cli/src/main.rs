//! voqm CLI - objective speech-quality scoring
//!
//! This binary scores a degraded WAV against a clean reference, either with
//! PESQ alone or with the full composite-measure pipeline.

use std::process::ExitCode;

use clap::Parser;
use colored::Colorize;
use tracing_subscriber::EnvFilter;

mod cli_args;
mod commands;
mod input;

use cli_args::{Cli, Commands};

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match dispatch(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{} {err:#}", "error:".red().bold());
            ExitCode::FAILURE
        }
    }
}

fn dispatch(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Pesq {
            reference,
            degraded,
            pesq_bin,
            json,
        } => commands::run_pesq(&reference, &degraded, pesq_bin.as_ref(), json),
        Commands::Composite {
            reference,
            degraded,
            script,
            octave,
            pesq_bin,
            isolated,
            json,
        } => commands::run_composite(
            &reference,
            &degraded,
            script.as_ref(),
            octave.as_ref(),
            pesq_bin.as_ref(),
            isolated,
            json,
        ),
    }
}
