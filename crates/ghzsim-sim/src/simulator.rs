use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;
use tracing::trace;

use crate::basis::Basis;
use crate::network::{LinkModel, NetworkConfig, NetworkError};
use crate::register::{Register, HADAMARD, PAULI_X, PAULI_Y, PAULI_Z, S_DAGGER};

#[derive(Debug, Error)]
pub enum SimError {
    #[error("register full: {requested} qubits requested, at most {max} supported")]
    RegisterFull { requested: usize, max: usize },
    #[error("'{0}' is not the coordinator of this network")]
    NotCoordinator(String),
    #[error("'{0}' is not a participant of this network")]
    UnknownParticipant(String),
    #[error("qubit #{0} is not held by the simulator")]
    UnknownQubit(u64),
    #[error("qubit #{0} cannot be composed with itself")]
    SelfComposition(u64),
    #[error(transparent)]
    Network(#[from] NetworkError),
}

/// Handle to one live qubit.
///
/// Handles are neither `Clone` nor `Copy`: whoever holds the handle owns the
/// qubit, and measuring it consumes the handle.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct Qubit {
    id: u64,
}

impl Qubit {
    pub fn id(&self) -> u64 {
        self.id
    }
}

/// Operations the protocol needs from the physical layer.
pub trait ResourceSimulator: Send + Sync {
    /// Create a fresh correlated pair between `coordinator` and
    /// `participant`, returning `(coordinator half, participant half)`.
    fn create_pair(&self, coordinator: &str, participant: &str)
        -> Result<(Qubit, Qubit), SimError>;

    /// Compose two locally held halves (controlled-NOT from `control` onto
    /// `target`).
    fn compose(&self, control: &Qubit, target: &Qubit) -> Result<(), SimError>;

    /// Destructively measure `qubit` in `basis`.
    fn measure(&self, qubit: Qubit, basis: Basis) -> Result<u8, SimError>;

    /// Simulated time spent generating pairs so far, in nanoseconds.
    fn elapsed_ns(&self) -> f64;
}

struct SimState {
    register: Register,
    /// `slots[k]` is the id of the qubit in register slot `k`.
    slots: Vec<u64>,
    next_id: u64,
    elapsed_ns: f64,
    rng: StdRng,
}

impl SimState {
    fn slot_of(&self, id: u64) -> Result<usize, SimError> {
        self.slots
            .iter()
            .position(|&s| s == id)
            .ok_or(SimError::UnknownQubit(id))
    }

    fn fresh_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

/// State-vector implementation of [`ResourceSimulator`].
///
/// All qubits of all nodes live in one register behind a mutex, so callers
/// on different tasks may share the simulator through an `Arc`.
pub struct StateVectorSimulator {
    network: NetworkConfig,
    state: Mutex<SimState>,
}

impl StateVectorSimulator {
    pub const MAX_QUBITS: usize = 20;

    pub fn new(network: NetworkConfig) -> Result<Self, SimError> {
        Self::with_rng(network, StdRng::from_os_rng())
    }

    /// Deterministic simulator for tests and reproducible runs.
    pub fn seeded(network: NetworkConfig, seed: u64) -> Result<Self, SimError> {
        Self::with_rng(network, StdRng::seed_from_u64(seed))
    }

    fn with_rng(network: NetworkConfig, rng: StdRng) -> Result<Self, SimError> {
        network.validate()?;
        Ok(Self {
            network,
            state: Mutex::new(SimState {
                register: Register::default(),
                slots: Vec::new(),
                next_id: 0,
                elapsed_ns: 0.0,
                rng,
            }),
        })
    }

    pub fn network(&self) -> &NetworkConfig {
        &self.network
    }

    pub fn live_qubits(&self) -> usize {
        self.state.lock().slots.len()
    }
}

impl ResourceSimulator for StateVectorSimulator {
    fn create_pair(
        &self,
        coordinator: &str,
        participant: &str,
    ) -> Result<(Qubit, Qubit), SimError> {
        if coordinator != self.network.coordinator {
            return Err(SimError::NotCoordinator(coordinator.to_string()));
        }
        if !self.network.is_participant(participant) {
            return Err(SimError::UnknownParticipant(participant.to_string()));
        }
        let link = *self.network.link_for(participant);

        let mut state = self.state.lock();
        let requested = state.slots.len() + 2;
        if requested > Self::MAX_QUBITS {
            return Err(SimError::RegisterFull {
                requested,
                max: Self::MAX_QUBITS,
            });
        }

        let (_, far) = state.register.push_bell_pair();
        let near_id = state.fresh_id();
        let far_id = state.fresh_id();
        state.slots.push(near_id);
        state.slots.push(far_id);

        if let LinkModel::Depolarise {
            fidelity,
            t_cycle_ns,
            prob_success,
        } = link
        {
            let mut attempts = 1u64;
            while !state.rng.random_bool(prob_success) {
                attempts += 1;
            }
            state.elapsed_ns += attempts as f64 * t_cycle_ns;

            if state.rng.random_bool((1.0 - fidelity).clamp(0.0, 1.0)) {
                let pauli = match state.rng.random_range(0..3) {
                    0 => &PAULI_X,
                    1 => &PAULI_Y,
                    _ => &PAULI_Z,
                };
                state.register.apply(pauli, far);
            }
            trace!(participant, attempts, "pair delivered");
        }

        Ok((Qubit { id: near_id }, Qubit { id: far_id }))
    }

    fn compose(&self, control: &Qubit, target: &Qubit) -> Result<(), SimError> {
        if control.id == target.id {
            return Err(SimError::SelfComposition(control.id));
        }
        let mut state = self.state.lock();
        let c = state.slot_of(control.id)?;
        let t = state.slot_of(target.id)?;
        state.register.cnot(c, t);
        Ok(())
    }

    fn measure(&self, qubit: Qubit, basis: Basis) -> Result<u8, SimError> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let slot = state.slot_of(qubit.id)?;
        match basis {
            Basis::Z => {}
            Basis::X => state.register.apply(&HADAMARD, slot),
            Basis::Y => {
                state.register.apply(&S_DAGGER, slot);
                state.register.apply(&HADAMARD, slot);
            }
        }
        let outcome = state.register.measure_and_remove(slot, &mut state.rng);
        state.slots.remove(slot);
        Ok(outcome)
    }

    fn elapsed_ns(&self) -> f64 {
        self.state.lock().elapsed_ns
    }
}
