// Command handler for: Sweep
//
// Runs every pipeline for each round count and stores one file per
// (pipeline, round count). The untrusted GHZ pipeline runs twice, once
// reusing the verification rate and once with separate estimation rounds.

use std::path::PathBuf;

use miette::IntoDiagnostic;
use tracing::info;

use ghzsim_engine::{run_batch, PipelineKind, Scenario};

use super::helpers::{
    build_pipeline, network_from_args, render_batch_text, simulated_participants, store_batch,
    PipelineCounts,
};
use crate::cli::{EstimationArgs, NetworkArgs};

pub(crate) struct SweepCommand {
    pub(crate) clients: u32,
    pub(crate) rounds: Vec<u64>,
    pub(crate) verification_rounds: Vec<u64>,
    pub(crate) estimation_rounds: Vec<u64>,
    pub(crate) repeats: usize,
    pub(crate) network: NetworkArgs,
    pub(crate) estimation: EstimationArgs,
    pub(crate) out_dir: PathBuf,
}

/// One sweep entry: file label, pipeline and whether the verification rate
/// doubles as the estimation rate.
const SWEEP_PLAN: [(&str, PipelineKind, bool); 5] = [
    ("epr_trusted", PipelineKind::TrustedBipartite, false),
    ("epr_untrusted", PipelineKind::UntrustedBipartite, false),
    ("ghz_trusted", PipelineKind::TrustedGhz, false),
    ("ghz_untrusted_com_pe", PipelineKind::UntrustedGhz, true),
    ("ghz_untrusted_sep_pe", PipelineKind::UntrustedGhz, false),
];

pub(crate) fn run_sweep_command(cmd: SweepCommand) -> miette::Result<()> {
    if cmd.rounds.len() != cmd.verification_rounds.len()
        || cmd.rounds.len() != cmd.estimation_rounds.len()
    {
        return Err(miette::miette!(
            "--rounds, --verification-rounds and --estimation-rounds need the same length \
             (got {}, {} and {})",
            cmd.rounds.len(),
            cmd.verification_rounds.len(),
            cmd.estimation_rounds.len()
        ));
    }

    for ((&nr_rounds, &nr_verification), &nr_estimation) in cmd
        .rounds
        .iter()
        .zip(&cmd.verification_rounds)
        .zip(&cmd.estimation_rounds)
    {
        for (label, kind, reuse_verification) in SWEEP_PLAN {
            let network =
                network_from_args(&cmd.network, simulated_participants(kind, cmd.clients))?;
            let pipeline = build_pipeline(
                kind,
                &PipelineCounts {
                    clients: cmd.clients,
                    verification_rounds: nr_verification,
                    estimation_rounds: nr_estimation,
                    reuse_verification,
                },
                &cmd.estimation,
            );
            let mut scenario = Scenario::new(network, nr_rounds, pipeline);
            scenario.public_seed = cmd.network.public_seed;
            scenario.sim_seed = cmd.network.sim_seed;

            info!(label, rounds = nr_rounds, "sweep point started");
            let batch = run_batch(&scenario, cmd.repeats).into_diagnostic()?;
            print!("{}", render_batch_text(&batch));

            let path = store_batch(
                &cmd.out_dir,
                label,
                &batch,
                &scenario.network,
                &scenario.pipeline,
                nr_rounds,
                cmd.repeats,
            )?;
            println!("Stored {}", path.display());
        }
    }
    Ok(())
}
