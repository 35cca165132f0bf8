//! Immutable per-run protocol configuration.

use ghzsim_sim::NetworkConfig;
use thiserror::Error;

use crate::role::Role;
use crate::variant::ProtocolVariant;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("number of rounds is not set")]
    MissingRounds,
    #[error("number of rounds must be positive")]
    ZeroRounds,
    #[error("participant list is not set")]
    MissingParticipants,
    #[error("participant list is empty")]
    NoParticipants,
    #[error("invalid network: {0}")]
    InvalidNetwork(String),
    #[error("distinguished participant '{0}' is not part of the network")]
    UnknownDistinguished(String),
    #[error("verification round {round} is outside [0, {nr_rounds})")]
    VerificationRoundOutOfRange { round: u64, nr_rounds: u64 },
    #[error("{field} tolerance is not set")]
    MissingTolerance { field: &'static str },
    #[error("{field} tolerance must lie in (0, 1), got {value}")]
    InvalidTolerance { field: &'static str, value: f64 },
    #[error("{field} round count must be positive")]
    ZeroCount { field: &'static str },
    #[error("{field} round count {requested} exceeds the {available} rounds available")]
    CountExceedsRounds {
        field: &'static str,
        requested: u64,
        available: u64,
    },
    #[error("extrapolation needs at least 2 clients, got {0}")]
    TooFewClients(u32),
    #[error("{pipeline} needs exactly {expected} participants, the network has {found}")]
    ParticipantCount {
        pipeline: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("{0} needs separately sampled estimation rounds")]
    SeparateEstimationRequired(&'static str),
}

/// Everything a run needs, shared read-only by the coordinator and every
/// participant.
#[derive(Debug, Clone)]
pub struct ProtocolConfig {
    nr_rounds: u64,
    network: NetworkConfig,
    distinguished: usize,
    variant: ProtocolVariant,
    basis_seed: Option<u64>,
    repeat: u64,
    log_progress: bool,
    record_trace: bool,
}

impl ProtocolConfig {
    pub fn builder() -> ProtocolConfigBuilder {
        ProtocolConfigBuilder::default()
    }

    pub fn nr_rounds(&self) -> u64 {
        self.nr_rounds
    }

    pub fn network(&self) -> &NetworkConfig {
        &self.network
    }

    pub fn coordinator(&self) -> &str {
        &self.network.coordinator
    }

    pub fn participants(&self) -> &[String] {
        &self.network.participants
    }

    /// Index of the distinguished participant in [`Self::participants`].
    pub fn distinguished(&self) -> usize {
        self.distinguished
    }

    pub fn role_of(&self, participant_index: usize) -> Role {
        if participant_index == self.distinguished {
            Role::DistinguishedParticipant
        } else {
            Role::Participant
        }
    }

    pub fn variant(&self) -> &ProtocolVariant {
        &self.variant
    }

    /// Seed for the participants' basis choices; each participant derives
    /// its own stream from it and [`Self::repeat`]. `None` draws from the OS.
    pub fn basis_seed(&self) -> Option<u64> {
        self.basis_seed
    }

    /// Index of this run within a batch of repeats.
    pub fn repeat(&self) -> u64 {
        self.repeat
    }

    /// The same configuration for another repeat of a batch.
    #[must_use]
    pub fn for_repeat(&self, repeat: u64) -> Self {
        Self {
            repeat,
            ..self.clone()
        }
    }

    pub fn log_progress(&self) -> bool {
        self.log_progress
    }

    pub fn record_trace(&self) -> bool {
        self.record_trace
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProtocolConfigBuilder {
    nr_rounds: Option<u64>,
    network: Option<NetworkConfig>,
    distinguished: Option<String>,
    variant: Option<ProtocolVariant>,
    basis_seed: Option<u64>,
    log_progress: bool,
    record_trace: bool,
}

impl ProtocolConfigBuilder {
    #[must_use]
    pub fn rounds(mut self, nr_rounds: u64) -> Self {
        self.nr_rounds = Some(nr_rounds);
        self
    }

    #[must_use]
    pub fn network(mut self, network: NetworkConfig) -> Self {
        self.network = Some(network);
        self
    }

    /// Name of the distinguished participant. Defaults to the first one.
    #[must_use]
    pub fn distinguished(mut self, name: impl Into<String>) -> Self {
        self.distinguished = Some(name.into());
        self
    }

    /// Defaults to [`ProtocolVariant::KeyGeneration`].
    #[must_use]
    pub fn variant(mut self, variant: ProtocolVariant) -> Self {
        self.variant = Some(variant);
        self
    }

    #[must_use]
    pub fn basis_seed(mut self, seed: u64) -> Self {
        self.basis_seed = Some(seed);
        self
    }

    #[must_use]
    pub fn log_progress(mut self, enabled: bool) -> Self {
        self.log_progress = enabled;
        self
    }

    #[must_use]
    pub fn record_trace(mut self, enabled: bool) -> Self {
        self.record_trace = enabled;
        self
    }

    pub fn build(self) -> Result<ProtocolConfig, ConfigError> {
        let nr_rounds = self.nr_rounds.ok_or(ConfigError::MissingRounds)?;
        if nr_rounds == 0 {
            return Err(ConfigError::ZeroRounds);
        }
        let network = self.network.ok_or(ConfigError::MissingParticipants)?;
        if network.participants.is_empty() {
            return Err(ConfigError::NoParticipants);
        }
        network
            .validate()
            .map_err(|e| ConfigError::InvalidNetwork(e.to_string()))?;

        let distinguished = match self.distinguished {
            None => 0,
            Some(name) => network
                .participants
                .iter()
                .position(|p| *p == name)
                .ok_or(ConfigError::UnknownDistinguished(name))?,
        };

        let variant = self.variant.unwrap_or(ProtocolVariant::KeyGeneration);
        if let ProtocolVariant::ScheduledVerification {
            verification_rounds,
        } = &variant
        {
            if let Some(&round) = verification_rounds.iter().find(|&&r| r >= nr_rounds) {
                return Err(ConfigError::VerificationRoundOutOfRange { round, nr_rounds });
            }
        }

        Ok(ProtocolConfig {
            nr_rounds,
            network,
            distinguished,
            variant,
            basis_seed: self.basis_seed,
            repeat: 0,
            log_progress: self.log_progress,
            record_trace: self.record_trace,
        })
    }
}
