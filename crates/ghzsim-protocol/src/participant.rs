use std::sync::Arc;

use ghzsim_sim::{Basis, Qubit, ResourceSimulator};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, Barrier};
use tracing::debug;

use crate::config::ProtocolConfig;
use crate::error::ProtocolError;
use crate::role::Role;
use crate::seed::{derive_seed, SeedStream};
use crate::trace::{record, NodeTrace, NodeTracer, TraceEventKind};
use crate::variant::ProtocolVariant;

/// Fold the coordinator's correction bit into a raw measurement outcome.
///
/// The coordinator's Z outcome `m_i` calls for an X flip on participant
/// `i`, which flips Z and Y outcomes. Its X outcome `m_0` calls for a Z flip
/// on the distinguished participant, which flips X and Y outcomes. The
/// coordinator itself never corrects.
pub fn apply_correction(role: Role, basis: Basis, raw: u8, correction: u8) -> u8 {
    let flips = match (role, basis) {
        (Role::Coordinator, _) => false,
        (_, Basis::Y) => true,
        (Role::DistinguishedParticipant, Basis::Z) => false,
        (Role::DistinguishedParticipant, Basis::X) => true,
        (Role::Participant, Basis::Z) => true,
        (Role::Participant, Basis::X) => false,
    };
    if flips {
        raw ^ correction
    } else {
        raw
    }
}

/// Everything a participant reports once all rounds have run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantOutput {
    pub name: String,
    pub role: Role,
    pub outcomes: Vec<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bases: Option<Vec<Basis>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verification: Option<Vec<u8>>,
}

enum BasisSource {
    Fixed,
    Coin(StdRng),
    Schedule(Vec<Basis>),
    Verification(Arc<ProtocolConfig>),
}

impl BasisSource {
    fn new(config: &Arc<ProtocolConfig>, index: usize) -> Self {
        let mut rng = match config.basis_seed() {
            Some(seed) => StdRng::seed_from_u64(derive_seed(
                seed,
                SeedStream::Basis,
                config.repeat(),
                index as u64,
            )),
            None => StdRng::from_os_rng(),
        };
        match config.variant() {
            ProtocolVariant::KeyGeneration => BasisSource::Fixed,
            ProtocolVariant::RandomBasis => BasisSource::Coin(rng),
            ProtocolVariant::Anonymous => BasisSource::Schedule(
                (0..config.nr_rounds())
                    .map(|_| Basis::from_label(u8::from(rng.random_bool(0.5))))
                    .collect(),
            ),
            ProtocolVariant::ScheduledVerification { .. } => {
                BasisSource::Verification(Arc::clone(config))
            }
        }
    }

    fn basis_for(&mut self, node: &str, round: u64) -> Result<Basis, ProtocolError> {
        Ok(match self {
            BasisSource::Fixed => Basis::Z,
            BasisSource::Coin(rng) => Basis::from_label(u8::from(rng.random_bool(0.5))),
            BasisSource::Schedule(bases) => bases.get(round as usize).copied().ok_or_else(|| {
                ProtocolError::BasisScheduleExhausted {
                    node: node.to_string(),
                    round,
                    scheduled: bases.len(),
                }
            })?,
            BasisSource::Verification(config) => match config.variant() {
                ProtocolVariant::ScheduledVerification {
                    verification_rounds,
                } if verification_rounds.contains(&round) => Basis::X,
                _ => Basis::Z,
            },
        })
    }
}

/// Participant half of the per-round protocol.
pub struct Participant {
    index: usize,
    name: String,
    role: Role,
    config: Arc<ProtocolConfig>,
    sim: Arc<dyn ResourceSimulator>,
    barrier: Arc<Barrier>,
    qubits: mpsc::Receiver<Qubit>,
    corrections: mpsc::Receiver<u8>,
    bases: BasisSource,
    tracer: Option<NodeTracer>,
}

impl Participant {
    pub fn new(
        index: usize,
        config: Arc<ProtocolConfig>,
        sim: Arc<dyn ResourceSimulator>,
        barrier: Arc<Barrier>,
        qubits: mpsc::Receiver<Qubit>,
        corrections: mpsc::Receiver<u8>,
        tracer: Option<NodeTracer>,
    ) -> Result<Self, ProtocolError> {
        let name = config.participants().get(index).cloned().ok_or_else(|| {
            ProtocolError::UnknownParticipant {
                index,
                nr_participants: config.participants().len(),
            }
        })?;
        let role = config.role_of(index);
        let bases = BasisSource::new(&config, index);
        Ok(Self {
            index,
            name,
            role,
            config,
            sim,
            barrier,
            qubits,
            corrections,
            bases,
            tracer,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// Run every round and return the recorded streams.
    pub async fn run(mut self) -> Result<(ParticipantOutput, Option<NodeTrace>), ProtocolError> {
        let nr_rounds = self.config.nr_rounds();
        let variant = self.config.variant().clone();
        let mut outcomes = Vec::with_capacity(nr_rounds as usize);
        let mut bases = variant
            .records_bases()
            .then(|| Vec::with_capacity(nr_rounds as usize));
        let mut verification = match &variant {
            ProtocolVariant::ScheduledVerification {
                verification_rounds,
            } => Some(Vec::with_capacity(verification_rounds.len())),
            _ => None,
        };

        for round in 0..nr_rounds {
            let qubit = self
                .qubits
                .recv()
                .await
                .ok_or_else(|| ProtocolError::ChannelClosed {
                    node: self.name.clone(),
                    round,
                })?;
            record(&mut self.tracer, round, TraceEventKind::ResourceReceived);

            let basis = self.bases.basis_for(&self.name, round)?;
            let raw = self.sim.measure(qubit, basis)?;
            record(
                &mut self.tracer,
                round,
                TraceEventKind::Measured {
                    basis,
                    outcome: raw,
                },
            );

            // Distribution is complete on every node.
            self.barrier.wait().await;

            let correction =
                self.corrections
                    .recv()
                    .await
                    .ok_or_else(|| ProtocolError::ChannelClosed {
                        node: self.name.clone(),
                        round,
                    })?;
            record(
                &mut self.tracer,
                round,
                TraceEventKind::CorrectionReceived { value: correction },
            );
            if correction > 1 {
                return Err(ProtocolError::CorrectionOutOfRange {
                    node: self.name.clone(),
                    round,
                    value: correction,
                });
            }

            let outcome = apply_correction(self.role, basis, raw, correction);
            match (&mut verification, basis) {
                (Some(ver), Basis::X) => ver.push(outcome),
                _ => outcomes.push(outcome),
            }
            if let Some(b) = bases.as_mut() {
                b.push(basis);
            }

            // Correction exchange is complete on every node.
            self.barrier.wait().await;
            record(&mut self.tracer, round, TraceEventKind::RoundComplete);
        }

        debug!(
            participant = %self.name,
            index = self.index,
            rounds = nr_rounds,
            "participant finished"
        );
        let output = ParticipantOutput {
            name: self.name,
            role: self.role,
            outcomes,
            bases,
            verification,
        };
        Ok((output, self.tracer.map(NodeTracer::finish)))
    }
}
