//! Secure-length pipelines, one per protocol setting.
//!
//! Each pipeline picks the protocol variant its run needs, classifies the
//! recorded rounds, estimates error rates and turns them into a message
//! length. Entropy domain failures are an expected outcome of a noisy
//! channel: they become a zero length with a [`ZeroLengthReason`], logged
//! at `warn`, and never abort a batch.

use std::fmt;

use ghzsim_prob::{
    anonymity_weighted_length, preshared_key_length, single_rate_length, statistical_correction,
    two_rate_length, CorrectedRate, CorrectionError, ScaledPair, SecureLengthError, Topology,
    TopologyError,
};
use ghzsim_protocol::{
    ConfigError, OutcomeError, OutcomeTable, ProtocolError, ProtocolVariant, RunRecord,
};
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::classifier::{EstimationPolicy, RoundPartition, SamplingError};
use crate::estimator::{estimate_error_rate, EstimationError};
use crate::result::{LengthReport, Measurement, RateSummary, ZeroLengthReason};

pub const DEFAULT_TOLERANCE: f64 = 1e-8;
pub const DEFAULT_VERIFICATION_ROUNDS: u64 = 300;
pub const DEFAULT_ESTIMATION_ROUNDS: u64 = 300;
pub const DEFAULT_NR_CLIENTS: u32 = 3;

/// Errors that abort a pipeline (and the batch running it).
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),
    #[error("Sampling error: {0}")]
    Sampling(#[from] SamplingError),
    #[error("Estimation error: {0}")]
    Estimation(#[from] EstimationError),
    #[error("Outcome error: {0}")]
    Outcomes(#[from] OutcomeError),
    #[error("Statistical correction error: {0}")]
    Correction(#[from] CorrectionError),
    #[error("Secure length error: {0}")]
    SecureLength(#[from] SecureLengthError),
    #[error("Topology error: {0}")]
    Topology(#[from] TopologyError),
    #[error("{0} needs recorded measurement bases")]
    MissingBases(PipelineKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineKind {
    TrustedGhz,
    TrustedBipartite,
    UntrustedGhz,
    UntrustedBipartite,
}

impl PipelineKind {
    pub const ALL: [PipelineKind; 4] = [
        PipelineKind::TrustedBipartite,
        PipelineKind::UntrustedBipartite,
        PipelineKind::TrustedGhz,
        PipelineKind::UntrustedGhz,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PipelineKind::TrustedGhz => "trusted_ghz",
            PipelineKind::TrustedBipartite => "trusted_bipartite",
            PipelineKind::UntrustedGhz => "untrusted_ghz",
            PipelineKind::UntrustedBipartite => "untrusted_bipartite",
        }
    }

    /// Bipartite pipelines run on exactly two participants and extrapolate.
    pub fn is_bipartite(self) -> bool {
        matches!(
            self,
            PipelineKind::TrustedBipartite | PipelineKind::UntrustedBipartite
        )
    }
}

impl fmt::Display for PipelineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Statistical correction of one error rate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CorrectionOptions {
    pub enabled: bool,
    pub tolerance: Option<f64>,
}

impl CorrectionOptions {
    pub fn enabled(tolerance: f64) -> Self {
        Self {
            enabled: true,
            tolerance: Some(tolerance),
        }
    }

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            tolerance: Some(DEFAULT_TOLERANCE),
        }
    }

    fn validate(&self, field: &'static str) -> Result<(), ConfigError> {
        if !self.enabled {
            return Ok(());
        }
        let value = self.tolerance.ok_or(ConfigError::MissingTolerance { field })?;
        check_unit_interval(field, value)
    }

    /// Correction term for `samples` of `total_rounds`; zero when disabled.
    fn term(&self, total_rounds: u64, samples: u64) -> Result<f64, PipelineError> {
        match (self.enabled, self.tolerance) {
            (false, _) => Ok(0.0),
            (true, Some(tolerance)) => Ok(statistical_correction(total_rounds, samples, tolerance)?),
            (true, None) => Err(ConfigError::MissingTolerance { field: "statistical" }.into()),
        }
    }
}

fn check_unit_interval(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value > 0.0 && value < 1.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidTolerance { field, value })
    }
}

fn check_count(field: &'static str, requested: u64, available: u64) -> Result<(), ConfigError> {
    if requested == 0 {
        return Err(ConfigError::ZeroCount { field });
    }
    if requested > available {
        return Err(ConfigError::CountExceedsRounds {
            field,
            requested,
            available,
        });
    }
    Ok(())
}

/// Parameter estimation with a trusted coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrustedOptions {
    pub nr_estimation_rounds: u64,
    pub estimation_correction: CorrectionOptions,
}

impl Default for TrustedOptions {
    fn default() -> Self {
        Self {
            nr_estimation_rounds: DEFAULT_ESTIMATION_ROUNDS,
            estimation_correction: CorrectionOptions::disabled(),
        }
    }
}

impl TrustedOptions {
    pub fn validate(&self, nr_rounds: u64) -> Result<(), ConfigError> {
        check_count("estimation", self.nr_estimation_rounds, nr_rounds)?;
        self.estimation_correction.validate("estimation")
    }
}

/// Verification and parameter estimation with an untrusted coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UntrustedOptions {
    pub nr_verification_rounds: u64,
    pub verification_correction: CorrectionOptions,
    pub estimation: EstimationPolicy,
    pub estimation_correction: CorrectionOptions,
    /// Accepted probability that a dishonest coordinator stays undetected.
    pub anon_tolerance: f64,
}

impl Default for UntrustedOptions {
    fn default() -> Self {
        Self {
            nr_verification_rounds: DEFAULT_VERIFICATION_ROUNDS,
            verification_correction: CorrectionOptions::enabled(DEFAULT_TOLERANCE),
            estimation: EstimationPolicy::Separate(DEFAULT_ESTIMATION_ROUNDS),
            estimation_correction: CorrectionOptions::disabled(),
            anon_tolerance: DEFAULT_TOLERANCE,
        }
    }
}

impl UntrustedOptions {
    pub fn validate(&self, nr_rounds: u64) -> Result<(), ConfigError> {
        check_count("verification", self.nr_verification_rounds, nr_rounds)?;
        if let EstimationPolicy::Separate(nr_estimation) = self.estimation {
            check_count(
                "estimation",
                nr_estimation,
                nr_rounds - self.nr_verification_rounds,
            )?;
        }
        self.verification_correction.validate("verification")?;
        self.estimation_correction.validate("estimation")?;
        check_unit_interval("anonymity", self.anon_tolerance)
    }
}

/// Extrapolation of a two-participant run to a larger network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BipartiteOptions {
    pub nr_clients: u32,
}

impl Default for BipartiteOptions {
    fn default() -> Self {
        Self {
            nr_clients: DEFAULT_NR_CLIENTS,
        }
    }
}

impl BipartiteOptions {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.nr_clients < 2 {
            return Err(ConfigError::TooFewClients(self.nr_clients));
        }
        Ok(())
    }
}

/// A pipeline together with its options.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Pipeline {
    /// GHZ key generation, single-rate length.
    TrustedGhz(TrustedOptions),
    /// EPR key generation between two clients, per-slot rate on the network.
    TrustedBipartite {
        trusted: TrustedOptions,
        bipartite: BipartiteOptions,
    },
    /// GHZ anonymous transmission, anonymity-weighted length.
    UntrustedGhz(UntrustedOptions),
    /// EPR key generation with a verification schedule, two-rate length
    /// extrapolated to the network.
    UntrustedBipartite {
        untrusted: UntrustedOptions,
        bipartite: BipartiteOptions,
    },
}

impl Pipeline {
    pub fn kind(&self) -> PipelineKind {
        match self {
            Pipeline::TrustedGhz(_) => PipelineKind::TrustedGhz,
            Pipeline::TrustedBipartite { .. } => PipelineKind::TrustedBipartite,
            Pipeline::UntrustedGhz(_) => PipelineKind::UntrustedGhz,
            Pipeline::UntrustedBipartite { .. } => PipelineKind::UntrustedBipartite,
        }
    }

    /// Check the options against a run of `nr_rounds` rounds on
    /// `nr_participants` participants.
    pub fn validate(&self, nr_rounds: u64, nr_participants: usize) -> Result<(), ConfigError> {
        if self.kind().is_bipartite() && nr_participants != 2 {
            return Err(ConfigError::ParticipantCount {
                pipeline: self.kind().name(),
                expected: 2,
                found: nr_participants,
            });
        }
        match self {
            Pipeline::TrustedGhz(trusted) => trusted.validate(nr_rounds),
            Pipeline::TrustedBipartite { trusted, bipartite } => {
                bipartite.validate()?;
                trusted.validate(nr_rounds)
            }
            Pipeline::UntrustedGhz(untrusted) => untrusted.validate(nr_rounds),
            Pipeline::UntrustedBipartite {
                untrusted,
                bipartite,
            } => {
                bipartite.validate()?;
                if untrusted.estimation == EstimationPolicy::ReuseVerification {
                    return Err(ConfigError::SeparateEstimationRequired(self.kind().name()));
                }
                untrusted.validate(nr_rounds)
            }
        }
    }

    /// Protocol variant the run feeding this pipeline must use. The
    /// verification schedule of the untrusted bipartite pipeline is drawn
    /// from `rng` here, before any round runs.
    pub fn protocol_variant<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        nr_rounds: u64,
    ) -> Result<ProtocolVariant, SamplingError> {
        Ok(match self {
            Pipeline::TrustedGhz(_) | Pipeline::TrustedBipartite { .. } => {
                ProtocolVariant::KeyGeneration
            }
            Pipeline::UntrustedGhz(_) => ProtocolVariant::Anonymous,
            Pipeline::UntrustedBipartite { untrusted, .. } => {
                let schedule = RoundPartition::classify(
                    rng,
                    nr_rounds,
                    untrusted.nr_verification_rounds,
                    EstimationPolicy::ReuseVerification,
                )?;
                ProtocolVariant::ScheduledVerification {
                    verification_rounds: schedule.verification().clone(),
                }
            }
        })
    }

    /// Nodes the run spans, or the network size extrapolated to.
    pub fn nr_clients(&self, nr_participants: usize) -> usize {
        match self {
            Pipeline::TrustedBipartite { bipartite, .. }
            | Pipeline::UntrustedBipartite { bipartite, .. } => bipartite.nr_clients as usize,
            Pipeline::TrustedGhz(_) | Pipeline::UntrustedGhz(_) => nr_participants,
        }
    }

    /// Evaluate one protocol run.
    pub fn evaluate<R: Rng + ?Sized>(
        &self,
        record: &RunRecord,
        rng: &mut R,
    ) -> Result<LengthReport, PipelineError> {
        let kind = self.kind();
        let nr_rounds = record.coordinator.rounds;
        let sim_time = record.simulation_time_ns();
        let report = match self {
            Pipeline::TrustedGhz(trusted) => {
                let table = OutcomeTable::from_outcomes(&record.participants)?;
                let (raw, estimation, zero_reason) =
                    trusted_length(&table, nr_rounds, trusted, rng)?;
                LengthReport {
                    pipeline: kind,
                    raw_length: raw,
                    message_length: Measurement::Single(raw),
                    simulation_time_ns: Measurement::Single(sim_time),
                    verification: None,
                    estimation,
                    zero_reason,
                }
            }
            Pipeline::TrustedBipartite { trusted, bipartite } => {
                let table = OutcomeTable::from_outcomes(&record.participants)?;
                let (raw, estimation, zero_reason) =
                    trusted_length(&table, nr_rounds, trusted, rng)?;
                let per_slot = ScaledPair {
                    simultaneous: Topology::Simultaneous.scale_rate(raw, bipartite.nr_clients)?,
                    sequential: Topology::Sequential.scale_rate(raw, bipartite.nr_clients)?,
                };
                LengthReport {
                    pipeline: kind,
                    raw_length: raw,
                    message_length: Measurement::PerTopology(per_slot),
                    simulation_time_ns: Measurement::Single(sim_time),
                    verification: None,
                    estimation,
                    zero_reason,
                }
            }
            Pipeline::UntrustedGhz(untrusted) => {
                let table = OutcomeTable::from_outcomes(&record.participants)?;
                if !table.has_bases() {
                    return Err(PipelineError::MissingBases(kind));
                }
                untrusted_ghz(&table, nr_rounds, untrusted, sim_time, rng)?
            }
            Pipeline::UntrustedBipartite {
                untrusted,
                bipartite,
            } => untrusted_bipartite(record, nr_rounds, untrusted, bipartite, rng)?,
        };

        match &report.zero_reason {
            Some(reason) => warn!(
                pipeline = %kind,
                rate = report.estimation.rate.rate,
                correction = report.estimation.rate.correction,
                %reason,
                "message length degraded to zero"
            ),
            None => debug!(
                pipeline = %kind,
                raw_length = report.raw_length,
                rate = report.estimation.rate.rate,
                "pipeline evaluated"
            ),
        }
        Ok(report)
    }
}

fn trusted_length<R: Rng + ?Sized>(
    table: &OutcomeTable,
    nr_rounds: u64,
    options: &TrustedOptions,
    rng: &mut R,
) -> Result<(f64, RateSummary, Option<ZeroLengthReason>), PipelineError> {
    let partition = RoundPartition::estimation_only(rng, nr_rounds, options.nr_estimation_rounds)?;
    let est = estimate_error_rate(table, partition.estimation().iter().copied())?;
    let rate = CorrectedRate::new(
        est.rate(),
        options.estimation_correction.term(nr_rounds, est.included)?,
    );
    let summary = RateSummary {
        rate,
        samples: est.included,
    };
    match single_rate_length(rate, nr_rounds, options.nr_estimation_rounds) {
        Ok(length) => Ok((length, summary, None)),
        Err(SecureLengthError::Entropy(_)) => Ok((
            0.0,
            summary,
            Some(ZeroLengthReason::RatesTooLarge {
                verification: None,
                estimation: rate,
            }),
        )),
        Err(err) => Err(err.into()),
    }
}

fn untrusted_ghz<R: Rng + ?Sized>(
    table: &OutcomeTable,
    nr_rounds: u64,
    options: &UntrustedOptions,
    sim_time: f64,
    rng: &mut R,
) -> Result<LengthReport, PipelineError> {
    let partition = RoundPartition::classify(
        rng,
        nr_rounds,
        options.nr_verification_rounds,
        options.estimation,
    )?;
    let ver = estimate_error_rate(table, partition.verification().iter().copied())?;
    let ver_rate = CorrectedRate::new(
        ver.rate(),
        options
            .verification_correction
            .term(nr_rounds, ver.included)?,
    );

    // Reusing verification rounds takes their rate and sample count.
    let est = if partition.reuses_verification() {
        ver
    } else {
        estimate_error_rate(table, partition.estimation().iter().copied())?
    };
    let est_rate = CorrectedRate::new(
        est.rate(),
        options.estimation_correction.term(nr_rounds, est.included)?,
    );

    let (raw, zero_reason) = match anonymity_weighted_length(
        ver_rate,
        est_rate,
        options.anon_tolerance,
        nr_rounds,
        options.nr_verification_rounds,
        options.estimation.nr_rounds(),
    ) {
        Ok(length) => (length, None),
        Err(SecureLengthError::Entropy(_)) => (
            0.0,
            Some(ZeroLengthReason::RatesTooLarge {
                verification: Some(ver_rate),
                estimation: est_rate,
            }),
        ),
        Err(SecureLengthError::VerificationRate { .. }) => (
            0.0,
            Some(ZeroLengthReason::VerificationRateTooLarge {
                verification: ver_rate,
            }),
        ),
        Err(err) => return Err(err.into()),
    };

    Ok(LengthReport {
        pipeline: PipelineKind::UntrustedGhz,
        raw_length: raw,
        message_length: Measurement::Single(raw),
        simulation_time_ns: Measurement::Single(sim_time),
        verification: Some(RateSummary {
            rate: ver_rate,
            samples: ver.included,
        }),
        estimation: RateSummary {
            rate: est_rate,
            samples: est.included,
        },
        zero_reason,
    })
}

fn untrusted_bipartite<R: Rng + ?Sized>(
    record: &RunRecord,
    nr_rounds: u64,
    options: &UntrustedOptions,
    bipartite: &BipartiteOptions,
    rng: &mut R,
) -> Result<LengthReport, PipelineError> {
    let key = OutcomeTable::from_outcomes(&record.participants)?;
    let verification = OutcomeTable::from_verification(&record.participants)?;
    let nr_verification = verification.nr_rounds() as u64;
    let nr_estimation = options.estimation.nr_rounds();

    let ver = estimate_error_rate(&verification, 0..nr_verification)?;
    let ver_rate = CorrectedRate::new(
        ver.rate(),
        options
            .verification_correction
            .term(nr_rounds, nr_verification)?,
    );

    // Estimation rounds come from the key rounds only.
    let partition = RoundPartition::estimation_only(rng, key.nr_rounds() as u64, nr_estimation)?;
    let est = estimate_error_rate(&key, partition.estimation().iter().copied())?;
    let est_rate = CorrectedRate::new(
        est.rate(),
        options.estimation_correction.term(nr_rounds, est.included)?,
    );

    let overhead = nr_verification + nr_estimation;
    let (raw, zero_reason) =
        match two_rate_length(ver_rate, est_rate, nr_rounds, nr_verification, nr_estimation) {
            Ok(length) if length == 0.0 && nr_rounds > overhead => (
                0.0,
                Some(ZeroLengthReason::NegativeKeyRate {
                    verification: ver_rate,
                    estimation: est_rate,
                }),
            ),
            Ok(length) => (length, None),
            Err(SecureLengthError::Entropy(_)) => (
                0.0,
                Some(ZeroLengthReason::RatesTooLarge {
                    verification: Some(ver_rate),
                    estimation: est_rate,
                }),
            ),
            Err(err) => return Err(err.into()),
        };

    let preshared = preshared_key_length(nr_verification, nr_rounds)?;
    let extrapolated = ScaledPair::totals(raw, bipartite.nr_clients)?;
    let lengths = extrapolated.minus(preshared).clamped();
    let zero_reason = zero_reason.or_else(|| {
        if raw <= 0.0 {
            return None;
        }
        Topology::ALL
            .into_iter()
            .filter(|&t| extrapolated.get(t) <= preshared)
            .min_by(|&a, &b| extrapolated.get(a).total_cmp(&extrapolated.get(b)))
            .map(|topology| ZeroLengthReason::PresharedKeyExceedsLength {
                topology,
                preshared,
                extrapolated: extrapolated.get(topology),
            })
    });
    let times = ScaledPair::totals(record.simulation_time_ns(), bipartite.nr_clients)?;

    Ok(LengthReport {
        pipeline: PipelineKind::UntrustedBipartite,
        raw_length: raw,
        message_length: Measurement::PerTopology(lengths),
        simulation_time_ns: Measurement::PerTopology(times),
        verification: Some(RateSummary {
            rate: ver_rate,
            samples: nr_verification,
        }),
        estimation: RateSummary {
            rate: est_rate,
            samples: est.included,
        },
        zero_reason,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options_are_valid() {
        assert!(TrustedOptions::default().validate(1000).is_ok());
        assert!(UntrustedOptions::default().validate(1000).is_ok());
        assert!(BipartiteOptions::default().validate().is_ok());
    }

    #[test]
    fn counts_must_fit() {
        let err = UntrustedOptions::default().validate(500).unwrap_err();
        assert_eq!(
            err,
            ConfigError::CountExceedsRounds {
                field: "estimation",
                requested: 300,
                available: 200
            }
        );
        let zero = TrustedOptions {
            nr_estimation_rounds: 0,
            ..TrustedOptions::default()
        };
        assert_eq!(
            zero.validate(10).unwrap_err(),
            ConfigError::ZeroCount {
                field: "estimation"
            }
        );
    }

    #[test]
    fn tolerances_are_checked() {
        let missing = TrustedOptions {
            nr_estimation_rounds: 10,
            estimation_correction: CorrectionOptions {
                enabled: true,
                tolerance: None,
            },
        };
        assert_eq!(
            missing.validate(100).unwrap_err(),
            ConfigError::MissingTolerance {
                field: "estimation"
            }
        );

        let anon = UntrustedOptions {
            anon_tolerance: 1.0,
            ..UntrustedOptions::default()
        };
        assert!(matches!(
            anon.validate(1000).unwrap_err(),
            ConfigError::InvalidTolerance {
                field: "anonymity",
                ..
            }
        ));

        // A disabled correction ignores its tolerance.
        let disabled = TrustedOptions {
            nr_estimation_rounds: 10,
            estimation_correction: CorrectionOptions {
                enabled: false,
                tolerance: None,
            },
        };
        assert!(disabled.validate(100).is_ok());
    }

    #[test]
    fn bipartite_needs_two_participants_and_separate_estimation() {
        let pipeline = Pipeline::TrustedBipartite {
            trusted: TrustedOptions::default(),
            bipartite: BipartiteOptions::default(),
        };
        assert!(matches!(
            pipeline.validate(1000, 3).unwrap_err(),
            ConfigError::ParticipantCount { found: 3, .. }
        ));
        assert!(pipeline.validate(1000, 2).is_ok());

        let reuse = Pipeline::UntrustedBipartite {
            untrusted: UntrustedOptions {
                estimation: EstimationPolicy::ReuseVerification,
                ..UntrustedOptions::default()
            },
            bipartite: BipartiteOptions { nr_clients: 4 },
        };
        assert_eq!(
            reuse.validate(1000, 2).unwrap_err(),
            ConfigError::SeparateEstimationRequired("untrusted_bipartite")
        );

        let lonely = Pipeline::TrustedBipartite {
            trusted: TrustedOptions::default(),
            bipartite: BipartiteOptions { nr_clients: 1 },
        };
        assert_eq!(
            lonely.validate(1000, 2).unwrap_err(),
            ConfigError::TooFewClients(1)
        );
    }

    #[test]
    fn variants_per_pipeline() {
        let mut rng = crate::classifier::public_randomness(Some(2));
        let trusted = Pipeline::TrustedGhz(TrustedOptions::default());
        assert_eq!(
            trusted.protocol_variant(&mut rng, 10).unwrap(),
            ProtocolVariant::KeyGeneration
        );
        let untrusted = Pipeline::UntrustedGhz(UntrustedOptions::default());
        assert_eq!(
            untrusted.protocol_variant(&mut rng, 10).unwrap(),
            ProtocolVariant::Anonymous
        );
        let scheduled = Pipeline::UntrustedBipartite {
            untrusted: UntrustedOptions {
                nr_verification_rounds: 4,
                ..UntrustedOptions::default()
            },
            bipartite: BipartiteOptions::default(),
        };
        match scheduled.protocol_variant(&mut rng, 10).unwrap() {
            ProtocolVariant::ScheduledVerification {
                verification_rounds,
            } => {
                assert_eq!(verification_rounds.len(), 4);
                assert!(verification_rounds.iter().all(|&r| r < 10));
            }
            other => panic!("unexpected variant {other}"),
        }
    }

    #[test]
    fn pipeline_serde_is_tagged() {
        let json = serde_json::to_value(Pipeline::TrustedGhz(TrustedOptions::default())).unwrap();
        assert_eq!(json["kind"], "trusted_ghz");
        assert_eq!(json["nr_estimation_rounds"], 300);
        let back: Pipeline = serde_json::from_value(json).unwrap();
        assert_eq!(back.kind(), PipelineKind::TrustedGhz);
    }
}
