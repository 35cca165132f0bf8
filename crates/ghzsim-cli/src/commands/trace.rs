// Command handler for: Trace

use std::path::PathBuf;
use std::sync::Arc;

use miette::IntoDiagnostic;
use tracing::warn;

use ghzsim_engine::{public_randomness, EstimationPolicy, RoundPartition};
use ghzsim_protocol::{run_blocking, ProtocolConfig, ProtocolVariant, TraceChecker};
use ghzsim_sim::{ResourceSimulator, StateVectorSimulator};

use super::helpers::{network_from_args, parse_variant_name};
use crate::cli::NetworkArgs;

pub(crate) struct TraceCommand {
    pub(crate) variant: String,
    pub(crate) clients: usize,
    pub(crate) rounds: u64,
    pub(crate) verification_rounds: u64,
    pub(crate) network: NetworkArgs,
    pub(crate) out: Option<PathBuf>,
}

pub(crate) fn run_trace_command(cmd: TraceCommand) -> miette::Result<()> {
    let mut variant = parse_variant_name(&cmd.variant)?;
    if let ProtocolVariant::ScheduledVerification { .. } = variant {
        let schedule = RoundPartition::classify(
            &mut public_randomness(cmd.network.public_seed),
            cmd.rounds,
            cmd.verification_rounds,
            EstimationPolicy::ReuseVerification,
        )
        .into_diagnostic()?;
        variant = ProtocolVariant::ScheduledVerification {
            verification_rounds: schedule.verification().clone(),
        };
    }

    let network = network_from_args(&cmd.network, cmd.clients)?;
    let mut builder = ProtocolConfig::builder()
        .rounds(cmd.rounds)
        .network(network.clone())
        .variant(variant)
        .record_trace(true);
    if let Some(seed) = cmd.network.sim_seed {
        builder = builder.basis_seed(seed);
    }
    let config = Arc::new(builder.build().into_diagnostic()?);

    let sim: Arc<dyn ResourceSimulator> = match cmd.network.sim_seed {
        Some(seed) => Arc::new(StateVectorSimulator::seeded(network, seed).into_diagnostic()?),
        None => Arc::new(StateVectorSimulator::new(network).into_diagnostic()?),
    };
    let record = run_blocking(config, sim).into_diagnostic()?;
    let trace = record
        .trace
        .ok_or_else(|| miette::miette!("run finished without a trace"))?;

    let check = TraceChecker::new().check(&trace);
    let json = serde_json::to_string_pretty(&trace).into_diagnostic()?;
    match &cmd.out {
        Some(path) => {
            std::fs::write(path, format!("{json}\n")).into_diagnostic()?;
            println!(
                "Trace written to {} ({} nodes, {} rounds)",
                path.display(),
                trace.nodes.len(),
                trace.nr_rounds
            );
            if check.passed {
                println!("Ordering check: passed");
            }
        }
        None => println!("{json}"),
    }

    if !check.passed {
        for violation in &check.violations {
            warn!(
                node = %violation.node,
                event = violation.event_sequence,
                kind = ?violation.kind,
                "{}",
                violation.message
            );
        }
        return Err(miette::miette!(
            "Ordering check failed with {} violation(s)",
            check.violations.len()
        ));
    }
    Ok(())
}
