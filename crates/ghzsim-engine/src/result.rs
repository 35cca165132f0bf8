use std::fmt;

use ghzsim_prob::{CorrectedRate, ScaledPair, Topology};
use serde::{Deserialize, Serialize};

use crate::pipeline::PipelineKind;

/// A message length or run time, either for the simulated network itself
/// or extrapolated from a bipartite run under both topologies.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Measurement {
    Single(f64),
    PerTopology(ScaledPair),
}

impl Measurement {
    /// The plain value, or the simultaneous extrapolation.
    pub fn primary(&self) -> f64 {
        match self {
            Measurement::Single(v) => *v,
            Measurement::PerTopology(pair) => pair.simultaneous,
        }
    }
}

impl fmt::Display for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Measurement::Single(v) => write!(f, "{v:.2}"),
            Measurement::PerTopology(pair) => write!(
                f,
                "simultaneous {:.2}, sequential {:.2}",
                pair.simultaneous, pair.sequential
            ),
        }
    }
}

/// An error rate as it entered the secure-length formula.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateSummary {
    pub rate: CorrectedRate,
    /// Rounds that entered the estimate.
    pub samples: u64,
}

/// Why a pipeline reported a message length of zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ZeroLengthReason {
    /// A corrected rate fell outside the domain of the binary entropy.
    RatesTooLarge {
        verification: Option<CorrectedRate>,
        estimation: CorrectedRate,
    },
    /// The verification rate leaves no margin to catch a dishonest coordinator.
    VerificationRateTooLarge { verification: CorrectedRate },
    /// Both penalties together exceed the whole key rate.
    NegativeKeyRate {
        verification: CorrectedRate,
        estimation: CorrectedRate,
    },
    /// The key pre-shared for verification costs more than the
    /// extrapolated message under `topology`.
    PresharedKeyExceedsLength {
        topology: Topology,
        preshared: f64,
        extrapolated: f64,
    },
}

impl fmt::Display for ZeroLengthReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ZeroLengthReason::RatesTooLarge {
                verification: Some(ver),
                estimation,
            } => write!(
                f,
                "the corrected error rates are too large: VER {ver}, PE {estimation}"
            ),
            ZeroLengthReason::RatesTooLarge {
                verification: None,
                estimation,
            } => write!(f, "the corrected error rate is too large: {estimation}"),
            ZeroLengthReason::VerificationRateTooLarge { verification } => {
                write!(f, "the corrected verification rate is too large: {verification}")
            }
            ZeroLengthReason::NegativeKeyRate {
                verification,
                estimation,
            } => write!(
                f,
                "penalties exceed the key rate: VER {verification}, PE {estimation}"
            ),
            ZeroLengthReason::PresharedKeyExceedsLength {
                topology,
                preshared,
                extrapolated,
            } => write!(
                f,
                "the pre-shared key ({preshared:.2} bits) exceeds the {topology} length ({extrapolated:.2} bits)"
            ),
        }
    }
}

/// Outcome of one pipeline evaluation on one protocol run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LengthReport {
    pub pipeline: PipelineKind,
    /// Secure length of the simulated run before any extrapolation.
    pub raw_length: f64,
    pub message_length: Measurement,
    pub simulation_time_ns: Measurement,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verification: Option<RateSummary>,
    pub estimation: RateSummary,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zero_reason: Option<ZeroLengthReason>,
}

/// Collected results of repeated runs of one scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchResult {
    pub pipeline: PipelineKind,
    pub message_lengths: Vec<Measurement>,
    pub simulation_times: Vec<Measurement>,
    /// One entry per repeat; `Some` where the length degraded to zero.
    pub zero_reasons: Vec<Option<ZeroLengthReason>>,
    pub reports: Vec<LengthReport>,
}

impl BatchResult {
    pub fn from_reports(pipeline: PipelineKind, reports: Vec<LengthReport>) -> Self {
        Self {
            pipeline,
            message_lengths: reports.iter().map(|r| r.message_length).collect(),
            simulation_times: reports.iter().map(|r| r.simulation_time_ns).collect(),
            zero_reasons: reports.iter().map(|r| r.zero_reason).collect(),
            reports,
        }
    }

    /// Mean of [`Measurement::primary`] over all repeats.
    pub fn mean_message_length(&self) -> f64 {
        if self.message_lengths.is_empty() {
            return 0.0;
        }
        let total: f64 = self.message_lengths.iter().map(Measurement::primary).sum();
        total / self.message_lengths.len() as f64
    }
}
