// Command handler for: Run

use std::path::PathBuf;

use miette::IntoDiagnostic;
use tracing::info;

use ghzsim_engine::{run_batch, Scenario};

use super::helpers::{
    build_pipeline, network_from_args, parse_output_format, parse_pipeline_kind,
    render_batch_text, simulated_participants, store_batch, PipelineCounts,
};
use crate::cli::{EstimationArgs, NetworkArgs};
use crate::OutputFormat;

pub(crate) struct RunCommand {
    pub(crate) pipeline: String,
    pub(crate) clients: u32,
    pub(crate) rounds: u64,
    pub(crate) verification_rounds: u64,
    pub(crate) estimation_rounds: u64,
    pub(crate) reuse_verification: bool,
    pub(crate) repeats: usize,
    pub(crate) network: NetworkArgs,
    pub(crate) estimation: EstimationArgs,
    pub(crate) progress: bool,
    pub(crate) format: String,
    pub(crate) out_dir: Option<PathBuf>,
}

pub(crate) fn run_run_command(cmd: RunCommand) -> miette::Result<()> {
    let kind = parse_pipeline_kind(&cmd.pipeline)?;
    let format = parse_output_format(&cmd.format)?;
    let network = network_from_args(
        &cmd.network,
        simulated_participants(kind, cmd.clients),
    )?;
    let pipeline = build_pipeline(
        kind,
        &PipelineCounts {
            clients: cmd.clients,
            verification_rounds: cmd.verification_rounds,
            estimation_rounds: cmd.estimation_rounds,
            reuse_verification: cmd.reuse_verification,
        },
        &cmd.estimation,
    );

    let mut scenario = Scenario::new(network, cmd.rounds, pipeline).with_progress(cmd.progress);
    scenario.public_seed = cmd.network.public_seed;
    scenario.sim_seed = cmd.network.sim_seed;

    let batch = run_batch(&scenario, cmd.repeats).into_diagnostic()?;

    match format {
        OutputFormat::Text => print!("{}", render_batch_text(&batch)),
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&batch).into_diagnostic()?)
        }
    }

    if let Some(dir) = cmd.out_dir {
        let path = store_batch(
            &dir,
            kind.name(),
            &batch,
            &scenario.network,
            &scenario.pipeline,
            cmd.rounds,
            cmd.repeats,
        )?;
        info!(path = %path.display(), "batch stored");
    }
    Ok(())
}
