//! Star-network configuration consumed by the simulator.

use std::collections::HashSet;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_COORDINATOR: &str = "Server";
pub const DEFAULT_FIDELITY: f64 = 0.99;
pub const DEFAULT_T_CYCLE_NS: f64 = 10.0;
pub const DEFAULT_PROB_SUCCESS: f64 = 0.9;

#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("network has no participants")]
    NoParticipants,
    #[error("node name '{0}' is used more than once")]
    DuplicateNode(String),
    #[error("link override for '{0}', which is not a participant")]
    UnknownLinkOverride(String),
    #[error("link to '{node}': fidelity {value} outside [0, 1]")]
    InvalidFidelity { node: String, value: f64 },
    #[error("link to '{node}': success probability {value} outside (0, 1]")]
    InvalidSuccessProbability { node: String, value: f64 },
    #[error("link to '{node}': cycle time {value} ns must be finite and non-negative")]
    InvalidCycleTime { node: String, value: f64 },
    #[error("invalid network JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Noise and timing model of one coordinator-participant link.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LinkModel {
    /// Noise-free, instantaneous pair generation.
    Perfect,
    /// Each delivered pair is `|Φ+>` with probability `fidelity`, otherwise a
    /// uniformly random Pauli acts on the participant half. Generation takes
    /// a geometric number of attempts of `t_cycle_ns` each.
    Depolarise {
        fidelity: f64,
        t_cycle_ns: f64,
        prob_success: f64,
    },
}

impl Default for LinkModel {
    fn default() -> Self {
        LinkModel::Depolarise {
            fidelity: DEFAULT_FIDELITY,
            t_cycle_ns: DEFAULT_T_CYCLE_NS,
            prob_success: DEFAULT_PROB_SUCCESS,
        }
    }
}

impl LinkModel {
    fn validate(&self, node: &str) -> Result<(), NetworkError> {
        if let LinkModel::Depolarise {
            fidelity,
            t_cycle_ns,
            prob_success,
        } = *self
        {
            if !(0.0..=1.0).contains(&fidelity) {
                return Err(NetworkError::InvalidFidelity {
                    node: node.to_string(),
                    value: fidelity,
                });
            }
            if !(prob_success > 0.0 && prob_success <= 1.0) {
                return Err(NetworkError::InvalidSuccessProbability {
                    node: node.to_string(),
                    value: prob_success,
                });
            }
            if !(t_cycle_ns.is_finite() && t_cycle_ns >= 0.0) {
                return Err(NetworkError::InvalidCycleTime {
                    node: node.to_string(),
                    value: t_cycle_ns,
                });
            }
        }
        Ok(())
    }
}

/// A coordinator linked directly to every participant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub coordinator: String,
    pub participants: Vec<String>,
    #[serde(default)]
    pub default_link: LinkModel,
    /// Per-participant link models that replace `default_link`.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub links: IndexMap<String, LinkModel>,
}

impl NetworkConfig {
    /// `nr_participants` participants named `C0`, `C1`, ... around a
    /// coordinator named `Server`, all sharing `link`.
    pub fn star(nr_participants: usize, link: LinkModel) -> Self {
        Self {
            coordinator: DEFAULT_COORDINATOR.to_string(),
            participants: (0..nr_participants).map(|i| format!("C{i}")).collect(),
            default_link: link,
            links: IndexMap::new(),
        }
    }

    pub fn with_link(mut self, participant: impl Into<String>, link: LinkModel) -> Self {
        self.links.insert(participant.into(), link);
        self
    }

    pub fn from_json(text: &str) -> Result<Self, NetworkError> {
        let config: NetworkConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn link_for(&self, participant: &str) -> &LinkModel {
        self.links.get(participant).unwrap_or(&self.default_link)
    }

    pub fn is_participant(&self, name: &str) -> bool {
        self.participants.iter().any(|p| p == name)
    }

    pub fn validate(&self) -> Result<(), NetworkError> {
        if self.participants.is_empty() {
            return Err(NetworkError::NoParticipants);
        }
        let mut seen = HashSet::new();
        seen.insert(self.coordinator.as_str());
        for name in &self.participants {
            if !seen.insert(name.as_str()) {
                return Err(NetworkError::DuplicateNode(name.clone()));
            }
        }
        for name in self.links.keys() {
            if !self.is_participant(name) {
                return Err(NetworkError::UnknownLinkOverride(name.clone()));
            }
        }
        for name in &self.participants {
            self.link_for(name).validate(name)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn star_names_nodes() {
        let net = NetworkConfig::star(3, LinkModel::Perfect);
        assert_eq!(net.coordinator, "Server");
        assert_eq!(net.participants, vec!["C0", "C1", "C2"]);
        assert!(net.validate().is_ok());
    }

    #[test]
    fn overrides_take_precedence() {
        let noisy = LinkModel::Depolarise {
            fidelity: 0.5,
            t_cycle_ns: 1.0,
            prob_success: 1.0,
        };
        let net = NetworkConfig::star(2, LinkModel::Perfect).with_link("C1", noisy);
        assert_eq!(net.link_for("C0"), &LinkModel::Perfect);
        assert_eq!(net.link_for("C1"), &noisy);
    }

    #[test]
    fn rejects_bad_networks() {
        assert!(matches!(
            NetworkConfig::star(0, LinkModel::Perfect).validate(),
            Err(NetworkError::NoParticipants)
        ));

        let mut dup = NetworkConfig::star(2, LinkModel::Perfect);
        dup.participants[1] = "C0".into();
        assert!(matches!(dup.validate(), Err(NetworkError::DuplicateNode(n)) if n == "C0"));

        let mut clash = NetworkConfig::star(1, LinkModel::Perfect);
        clash.participants[0] = "Server".into();
        assert!(matches!(clash.validate(), Err(NetworkError::DuplicateNode(_))));

        let stray = NetworkConfig::star(1, LinkModel::Perfect).with_link("C9", LinkModel::Perfect);
        assert!(matches!(
            stray.validate(),
            Err(NetworkError::UnknownLinkOverride(_))
        ));

        let bad = NetworkConfig::star(
            1,
            LinkModel::Depolarise {
                fidelity: 1.2,
                t_cycle_ns: 10.0,
                prob_success: 0.9,
            },
        );
        assert!(matches!(
            bad.validate(),
            Err(NetworkError::InvalidFidelity { .. })
        ));

        let never = NetworkConfig::star(
            1,
            LinkModel::Depolarise {
                fidelity: 0.9,
                t_cycle_ns: 10.0,
                prob_success: 0.0,
            },
        );
        assert!(matches!(
            never.validate(),
            Err(NetworkError::InvalidSuccessProbability { .. })
        ));
    }

    #[test]
    fn json_defaults_to_depolarising_link() {
        let net = NetworkConfig::from_json(
            r#"{ "coordinator": "Server", "participants": ["C0", "C1"] }"#,
        )
        .unwrap();
        assert_eq!(net.default_link, LinkModel::default());
        assert!(net.links.is_empty());
    }

    #[test]
    fn json_with_overrides() {
        let net = NetworkConfig::from_json(
            r#"{
                "coordinator": "Hub",
                "participants": ["A", "B"],
                "default_link": { "kind": "perfect" },
                "links": { "B": { "kind": "depolarise", "fidelity": 0.8, "t_cycle_ns": 5.0, "prob_success": 0.5 } }
            }"#,
        )
        .unwrap();
        assert_eq!(net.coordinator, "Hub");
        assert!(matches!(
            net.link_for("B"),
            LinkModel::Depolarise { fidelity, .. } if *fidelity == 0.8
        ));
    }

    #[test]
    fn malformed_json_is_reported() {
        assert!(matches!(
            NetworkConfig::from_json("{ not json"),
            Err(NetworkError::Json(_))
        ));
    }
}
