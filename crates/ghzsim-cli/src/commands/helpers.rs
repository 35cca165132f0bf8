// Shared parsing and rendering helpers for the command handlers.

use std::path::Path;

use miette::IntoDiagnostic;

use ghzsim_engine::{
    save_run, BatchResult, BipartiteOptions, CorrectionOptions, EstimationPolicy, Pipeline,
    PipelineKind, RunParams, StoredRun, TrustedOptions, UntrustedOptions,
};
use ghzsim_protocol::ProtocolVariant;
use ghzsim_sim::{LinkModel, NetworkConfig};

use crate::cli::{EstimationArgs, NetworkArgs};
use crate::OutputFormat;

pub(crate) fn parse_output_format(raw: &str) -> miette::Result<OutputFormat> {
    match raw {
        "text" => Ok(OutputFormat::Text),
        "json" => Ok(OutputFormat::Json),
        other => Err(miette::miette!(
            "Unknown output format: {other}. Use 'text' or 'json'."
        )),
    }
}

pub(crate) fn parse_pipeline_kind(raw: &str) -> miette::Result<PipelineKind> {
    match raw {
        "trusted-ghz" => Ok(PipelineKind::TrustedGhz),
        "trusted-bipartite" => Ok(PipelineKind::TrustedBipartite),
        "untrusted-ghz" => Ok(PipelineKind::UntrustedGhz),
        "untrusted-bipartite" => Ok(PipelineKind::UntrustedBipartite),
        other => Err(miette::miette!(
            "Unknown pipeline: {other}. Use 'trusted-ghz', 'trusted-bipartite', \
             'untrusted-ghz' or 'untrusted-bipartite'."
        )),
    }
}

/// Variant name as accepted on the command line. Scheduled verification
/// gets its rounds later, once the public randomness is known.
pub(crate) fn parse_variant_name(raw: &str) -> miette::Result<ProtocolVariant> {
    match raw {
        "key-generation" => Ok(ProtocolVariant::KeyGeneration),
        "random-basis" => Ok(ProtocolVariant::RandomBasis),
        "anonymous" => Ok(ProtocolVariant::Anonymous),
        "scheduled-verification" => Ok(ProtocolVariant::ScheduledVerification {
            verification_rounds: Default::default(),
        }),
        other => Err(miette::miette!(
            "Unknown variant: {other}. Use 'key-generation', 'random-basis', \
             'anonymous' or 'scheduled-verification'."
        )),
    }
}

pub(crate) fn link_from_args(args: &NetworkArgs) -> LinkModel {
    if args.perfect {
        LinkModel::Perfect
    } else {
        LinkModel::Depolarise {
            fidelity: args.fidelity,
            t_cycle_ns: args.t_cycle,
            prob_success: args.prob_success,
        }
    }
}

/// The network from `--network`, or a star of `nr_participants`.
pub(crate) fn network_from_args(
    args: &NetworkArgs,
    nr_participants: usize,
) -> miette::Result<NetworkConfig> {
    match &args.network {
        Some(path) => {
            let text = std::fs::read_to_string(path).into_diagnostic()?;
            NetworkConfig::from_json(&text)
                .map_err(|e| miette::miette!("Invalid network file {}: {e}", path.display()))
        }
        None => {
            let network = NetworkConfig::star(nr_participants, link_from_args(args));
            network
                .validate()
                .map_err(|e| miette::miette!("Invalid link parameters: {e}"))?;
            Ok(network)
        }
    }
}

fn correction(enabled: bool, tolerance: f64) -> CorrectionOptions {
    CorrectionOptions {
        enabled,
        tolerance: Some(tolerance),
    }
}

pub(crate) struct PipelineCounts {
    pub(crate) clients: u32,
    pub(crate) verification_rounds: u64,
    pub(crate) estimation_rounds: u64,
    pub(crate) reuse_verification: bool,
}

pub(crate) fn build_pipeline(
    kind: PipelineKind,
    counts: &PipelineCounts,
    args: &EstimationArgs,
) -> Pipeline {
    let trusted = TrustedOptions {
        nr_estimation_rounds: counts.estimation_rounds,
        estimation_correction: correction(args.correct_estimation, args.estimation_tolerance),
    };
    let untrusted = UntrustedOptions {
        nr_verification_rounds: counts.verification_rounds,
        verification_correction: correction(
            args.correct_verification,
            args.verification_tolerance,
        ),
        estimation: if counts.reuse_verification {
            EstimationPolicy::ReuseVerification
        } else {
            EstimationPolicy::Separate(counts.estimation_rounds)
        },
        estimation_correction: correction(args.correct_estimation, args.estimation_tolerance),
        anon_tolerance: args.anon_tolerance,
    };
    let bipartite = BipartiteOptions {
        nr_clients: counts.clients,
    };
    match kind {
        PipelineKind::TrustedGhz => Pipeline::TrustedGhz(trusted),
        PipelineKind::TrustedBipartite => Pipeline::TrustedBipartite { trusted, bipartite },
        PipelineKind::UntrustedGhz => Pipeline::UntrustedGhz(untrusted),
        PipelineKind::UntrustedBipartite => Pipeline::UntrustedBipartite {
            untrusted,
            bipartite,
        },
    }
}

/// Participants the simulated run needs for `kind`.
pub(crate) fn simulated_participants(kind: PipelineKind, clients: u32) -> usize {
    if kind.is_bipartite() {
        2
    } else {
        clients as usize
    }
}

pub(crate) fn render_batch_text(batch: &BatchResult) -> String {
    let mut out = format!("Pipeline: {}\n", batch.pipeline);
    for (repeat, report) in batch.reports.iter().enumerate() {
        out.push_str(&format!(
            "  repeat {repeat}: message length {}, simulation time {} ns\n",
            report.message_length, report.simulation_time_ns
        ));
        if let Some(reason) = &report.zero_reason {
            out.push_str(&format!("    zero length: {reason}\n"));
        }
    }
    out.push_str(&format!(
        "Mean message length: {:.2}\n",
        batch.mean_message_length()
    ));
    out
}

pub(crate) fn store_batch(
    dir: &Path,
    label: &str,
    batch: &BatchResult,
    network: &NetworkConfig,
    pipeline: &Pipeline,
    nr_rounds: u64,
    repeats: usize,
) -> miette::Result<std::path::PathBuf> {
    let params = RunParams {
        nr_clients: pipeline.nr_clients(network.participants.len()),
        link: network.default_link,
        nr_runtimes: repeats,
        nr_rounds,
        pipeline: *pipeline,
    };
    let run = StoredRun::new(batch, params).into_diagnostic()?;
    save_run(dir, &format!("{label}_nrRounds{nr_rounds}.json"), &run).into_diagnostic()
}
