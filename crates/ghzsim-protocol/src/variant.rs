use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Which bases participants measure in, and what they report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProtocolVariant {
    /// Z every round. Reports `outcomes`.
    KeyGeneration,
    /// A fresh X/Y coin per round. Reports `outcomes` and `bases`.
    RandomBasis,
    /// X/Y schedule drawn once per participant before round 0. Reports
    /// `outcomes` and `bases`.
    Anonymous,
    /// Publicly known verification rounds are measured in X, all other
    /// rounds in Z. Reports key-round `outcomes` and `verification`
    /// outcomes, each in round order.
    ScheduledVerification { verification_rounds: BTreeSet<u64> },
}

impl ProtocolVariant {
    pub fn name(&self) -> &'static str {
        match self {
            ProtocolVariant::KeyGeneration => "key_generation",
            ProtocolVariant::RandomBasis => "random_basis",
            ProtocolVariant::Anonymous => "anonymous",
            ProtocolVariant::ScheduledVerification { .. } => "scheduled_verification",
        }
    }

    /// Whether participants record a basis label per round.
    pub fn records_bases(&self) -> bool {
        matches!(
            self,
            ProtocolVariant::RandomBasis | ProtocolVariant::Anonymous
        )
    }
}

impl std::fmt::Display for ProtocolVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
