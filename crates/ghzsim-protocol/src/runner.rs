//! Wires one coordinator and its participants together and runs them.

use std::sync::Arc;

use ghzsim_sim::{ResourceSimulator, SimError};
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, Barrier};
use tokio::task::JoinSet;
use tracing::{debug, info};

use crate::config::ProtocolConfig;
use crate::coordinator::{Coordinator, CoordinatorOutput, ParticipantLink};
use crate::error::ProtocolError;
use crate::participant::{Participant, ParticipantOutput};
use crate::role::Role;
use crate::trace::{NodeTrace, ProtocolTrace, TraceRecorder, TRACE_SCHEMA_VERSION};

/// Result of one protocol run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    pub coordinator: CoordinatorOutput,
    /// One entry per participant, in network order.
    pub participants: Vec<ParticipantOutput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace: Option<ProtocolTrace>,
}

impl RunRecord {
    pub fn simulation_time_ns(&self) -> f64 {
        self.coordinator.simulation_time_ns
    }

    pub fn participant(&self, name: &str) -> Option<&ParticipantOutput> {
        self.participants.iter().find(|p| p.name == name)
    }
}

enum TaskOutput {
    Coordinator(CoordinatorOutput, Option<NodeTrace>),
    Participant(usize, ParticipantOutput, Option<NodeTrace>),
}

/// Run all rounds of one protocol instance.
///
/// The coordinator and every participant run as separate tasks that meet at
/// a shared barrier twice per round. The first error from any task aborts
/// the others and is returned.
pub async fn run_protocol(
    config: Arc<ProtocolConfig>,
    sim: Arc<dyn ResourceSimulator>,
) -> Result<RunRecord, ProtocolError> {
    let nr_participants = config.participants().len();
    let barrier = Arc::new(Barrier::new(nr_participants + 1));
    let recorder = config.record_trace().then(TraceRecorder::new);

    let mut tasks = JoinSet::new();
    let mut links = Vec::with_capacity(nr_participants);
    for (index, name) in config.participants().iter().enumerate() {
        let (qubit_tx, qubit_rx) = mpsc::channel(1);
        let (correction_tx, correction_rx) = mpsc::channel(1);
        let tracer = recorder
            .as_ref()
            .map(|r| r.node(name.clone(), config.role_of(index)));
        let participant = Participant::new(
            index,
            Arc::clone(&config),
            Arc::clone(&sim),
            Arc::clone(&barrier),
            qubit_rx,
            correction_rx,
            tracer,
        )?;
        tasks.spawn(async move {
            let (output, trace) = participant.run().await?;
            Ok::<_, ProtocolError>(TaskOutput::Participant(index, output, trace))
        });
        links.push(ParticipantLink {
            name: name.clone(),
            qubits: qubit_tx,
            corrections: correction_tx,
        });
    }

    let tracer = recorder
        .as_ref()
        .map(|r| r.node(config.coordinator().to_string(), Role::Coordinator));
    let coordinator = Coordinator::new(
        Arc::clone(&config),
        Arc::clone(&sim),
        Arc::clone(&barrier),
        links,
        tracer,
    );
    tasks.spawn(async move {
        let (output, trace) = coordinator.run().await?;
        Ok::<_, ProtocolError>(TaskOutput::Coordinator(output, trace))
    });

    info!(
        variant = %config.variant(),
        rounds = config.nr_rounds(),
        participants = nr_participants,
        "protocol run started"
    );

    let mut coordinator_output = None;
    let mut participant_outputs: Vec<Option<ParticipantOutput>> = vec![None; nr_participants];
    let mut node_traces = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        let output = match joined {
            Ok(Ok(output)) => output,
            Ok(Err(err)) => {
                tasks.abort_all();
                return Err(err);
            }
            Err(join_err) => {
                tasks.abort_all();
                return Err(ProtocolError::TaskFailed(join_err.to_string()));
            }
        };
        match output {
            TaskOutput::Coordinator(out, trace) => {
                coordinator_output = Some(out);
                node_traces.extend(trace);
            }
            TaskOutput::Participant(index, out, trace) => {
                debug!(participant = %out.name, "participant output collected");
                participant_outputs[index] = Some(out);
                node_traces.extend(trace);
            }
        }
    }

    let coordinator =
        coordinator_output.ok_or_else(|| ProtocolError::MissingOutput(config.coordinator().into()))?;
    let participants = participant_outputs
        .into_iter()
        .zip(config.participants())
        .map(|(out, name)| out.ok_or_else(|| ProtocolError::MissingOutput(name.clone())))
        .collect::<Result<Vec<_>, _>>()?;

    let trace = recorder.map(|_| {
        node_traces.sort_by_key(|t| config.participants().iter().position(|p| *p == t.node));
        ProtocolTrace {
            schema_version: TRACE_SCHEMA_VERSION,
            variant: config.variant().name().to_string(),
            nr_rounds: config.nr_rounds(),
            coordinator: config.coordinator().to_string(),
            participants: config.participants().to_vec(),
            nodes: node_traces,
        }
    });

    info!(
        simulation_time_ns = coordinator.simulation_time_ns,
        "protocol run finished"
    );
    Ok(RunRecord {
        coordinator,
        participants,
        trace,
    })
}

fn runtime() -> Result<tokio::runtime::Runtime, ProtocolError> {
    Ok(tokio::runtime::Builder::new_current_thread().build()?)
}

/// [`run_protocol`] on a dedicated single-threaded runtime.
pub fn run_blocking(
    config: Arc<ProtocolConfig>,
    sim: Arc<dyn ResourceSimulator>,
) -> Result<RunRecord, ProtocolError> {
    runtime()?.block_on(run_protocol(config, sim))
}

/// Run the protocol `repeats` times, each on a fresh simulator produced by
/// `make_sim(repeat)` and with its own basis streams. Any failure aborts the
/// remaining repeats.
pub fn run_repeated<F>(
    config: Arc<ProtocolConfig>,
    repeats: usize,
    mut make_sim: F,
) -> Result<Vec<RunRecord>, ProtocolError>
where
    F: FnMut(usize) -> Result<Arc<dyn ResourceSimulator>, SimError>,
{
    let runtime = runtime()?;
    let mut records = Vec::with_capacity(repeats);
    for repeat in 0..repeats {
        let sim = make_sim(repeat)?;
        debug!(repeat, repeats, "starting repeat");
        let repeat_config = Arc::new(config.for_repeat(repeat as u64));
        records.push(runtime.block_on(run_protocol(repeat_config, sim))?);
    }
    Ok(records)
}
