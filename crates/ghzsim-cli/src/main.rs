#![doc = include_str!("../README.md")]

mod cli;
mod commands;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use commands::run::RunCommand;
use commands::sweep::SweepCommand;
use commands::trace::TraceCommand;

#[derive(Clone, Copy, Debug)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

fn main() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            pipeline,
            clients,
            rounds,
            verification_rounds,
            estimation_rounds,
            reuse_verification,
            repeats,
            network,
            estimation,
            progress,
            format,
            out_dir,
        } => commands::run::run_run_command(RunCommand {
            pipeline,
            clients,
            rounds,
            verification_rounds,
            estimation_rounds,
            reuse_verification,
            repeats,
            network,
            estimation,
            progress,
            format,
            out_dir,
        }),
        Commands::Sweep {
            clients,
            rounds,
            verification_rounds,
            estimation_rounds,
            repeats,
            network,
            estimation,
            out_dir,
        } => commands::sweep::run_sweep_command(SweepCommand {
            clients,
            rounds,
            verification_rounds,
            estimation_rounds,
            repeats,
            network,
            estimation,
            out_dir,
        }),
        Commands::Trace {
            variant,
            clients,
            rounds,
            verification_rounds,
            network,
            out,
        } => commands::trace::run_trace_command(TraceCommand {
            variant,
            clients,
            rounds,
            verification_rounds,
            network,
            out,
        }),
    }
}
