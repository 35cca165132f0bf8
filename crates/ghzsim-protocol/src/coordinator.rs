use std::sync::Arc;

use ghzsim_sim::{Basis, Qubit, ResourceSimulator};
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, Barrier};
use tracing::debug;

use crate::config::ProtocolConfig;
use crate::error::ProtocolError;
use crate::trace::{record, NodeTrace, NodeTracer, TraceEventKind};

/// The coordinator's end of one participant's channels.
pub struct ParticipantLink {
    pub name: String,
    pub qubits: mpsc::Sender<Qubit>,
    pub corrections: mpsc::Sender<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoordinatorOutput {
    pub name: String,
    pub rounds: u64,
    /// Simulated pair-generation time of the whole run, in nanoseconds.
    pub simulation_time_ns: f64,
    /// The coordinator's X-basis outcome per round (the distinguished
    /// participant's correction).
    pub first_outcomes: Vec<u8>,
}

/// Coordinator half of the per-round protocol.
pub struct Coordinator {
    config: Arc<ProtocolConfig>,
    sim: Arc<dyn ResourceSimulator>,
    barrier: Arc<Barrier>,
    links: Vec<ParticipantLink>,
    tracer: Option<NodeTracer>,
}

impl Coordinator {
    pub fn new(
        config: Arc<ProtocolConfig>,
        sim: Arc<dyn ResourceSimulator>,
        barrier: Arc<Barrier>,
        links: Vec<ParticipantLink>,
        tracer: Option<NodeTracer>,
    ) -> Self {
        Self {
            config,
            sim,
            barrier,
            links,
            tracer,
        }
    }

    /// Create one pair per participant, ship the participant halves and
    /// turn the local halves into one correction bit per participant.
    async fn distribute(&mut self, round: u64) -> Result<Vec<u8>, ProtocolError> {
        let coordinator = self.config.coordinator().to_string();
        let mut halves = Vec::with_capacity(self.links.len());
        for link in &self.links {
            let (mine, theirs) = self.sim.create_pair(&coordinator, &link.name)?;
            record(
                &mut self.tracer,
                round,
                TraceEventKind::PairCreated {
                    participant: link.name.clone(),
                },
            );
            link.qubits
                .send(theirs)
                .await
                .map_err(|_| ProtocolError::ChannelClosed {
                    node: link.name.clone(),
                    round,
                })?;
            halves.push(Some(mine));
        }

        let first_index = self.config.distinguished();
        let first = halves
            .get_mut(first_index)
            .and_then(Option::take)
            .ok_or_else(|| ProtocolError::MissingOutput(format!("pair #{first_index}")))?;

        let mut corrections = vec![0u8; halves.len()];
        for (i, half) in halves.into_iter().enumerate() {
            let Some(half) = half else { continue };
            self.sim.compose(&first, &half)?;
            let m = self.sim.measure(half, Basis::Z)?;
            record(
                &mut self.tracer,
                round,
                TraceEventKind::Measured {
                    basis: Basis::Z,
                    outcome: m,
                },
            );
            corrections[i] = m;
        }
        let m0 = self.sim.measure(first, Basis::X)?;
        record(
            &mut self.tracer,
            round,
            TraceEventKind::Measured {
                basis: Basis::X,
                outcome: m0,
            },
        );
        corrections[first_index] = m0;
        Ok(corrections)
    }

    pub async fn run(mut self) -> Result<(CoordinatorOutput, Option<NodeTrace>), ProtocolError> {
        let nr_rounds = self.config.nr_rounds();
        let progress_step = (self.config.log_progress() && nr_rounds >= 100).then(|| nr_rounds / 100);
        let mut first_outcomes = Vec::with_capacity(nr_rounds as usize);

        for round in 0..nr_rounds {
            let corrections = self.distribute(round).await?;

            // Every participant holds and has measured its half.
            self.barrier.wait().await;

            for (link, &value) in self.links.iter().zip(&corrections) {
                record(
                    &mut self.tracer,
                    round,
                    TraceEventKind::CorrectionSent {
                        participant: link.name.clone(),
                        value,
                    },
                );
                link.corrections
                    .send(value)
                    .await
                    .map_err(|_| ProtocolError::ChannelClosed {
                        node: link.name.clone(),
                        round,
                    })?;
            }
            first_outcomes.push(corrections[self.config.distinguished()]);

            self.barrier.wait().await;
            record(&mut self.tracer, round, TraceEventKind::RoundComplete);

            if let Some(step) = progress_step {
                if round % step == 0 {
                    debug!(round, nr_rounds, "round progress");
                }
            }
        }

        let output = CoordinatorOutput {
            name: self.config.coordinator().to_string(),
            rounds: nr_rounds,
            simulation_time_ns: self.sim.elapsed_ns(),
            first_outcomes,
        };
        Ok((output, self.tracer.map(NodeTracer::finish)))
    }
}
