use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TopologyError {
    #[error("topology scaling needs at least 2 clients, got {0}")]
    TooFewClients(u32),
}

/// How a coordinator serves pairs of clients when a bipartite measurement is
/// extrapolated to a larger network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Topology {
    /// One pair per time slot, all `C(n, 2)` pairs in turn.
    Sequential,
    /// Disjoint pairs served in parallel.
    Simultaneous,
}

impl Topology {
    pub const ALL: [Topology; 2] = [Topology::Simultaneous, Topology::Sequential];

    /// Number of bipartite slots needed to cover `nr_clients` clients.
    ///
    /// - sequential: `n(n - 1) / 2`
    /// - simultaneous: `2 * ceil(n / 2)`
    pub fn scaling_factor(self, nr_clients: u32) -> Result<f64, TopologyError> {
        if nr_clients < 2 {
            return Err(TopologyError::TooFewClients(nr_clients));
        }
        let n = u64::from(nr_clients);
        let factor = match self {
            Topology::Sequential => n * (n - 1) / 2,
            Topology::Simultaneous => 2 * n.div_ceil(2),
        };
        Ok(factor as f64)
    }

    /// Extrapolate a per-pair total (bits, or simulated time) to the network.
    pub fn scale_total(self, value: f64, nr_clients: u32) -> Result<f64, TopologyError> {
        Ok(value * self.scaling_factor(nr_clients)?)
    }

    /// Extrapolate a per-pair rate to the rate each slot achieves on the
    /// network.
    pub fn scale_rate(self, value: f64, nr_clients: u32) -> Result<f64, TopologyError> {
        Ok(value / self.scaling_factor(nr_clients)?)
    }
}

impl std::fmt::Display for Topology {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Topology::Sequential => write!(f, "sequential"),
            Topology::Simultaneous => write!(f, "simultaneous"),
        }
    }
}

/// A value extrapolated under both topologies.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScaledPair {
    pub simultaneous: f64,
    pub sequential: f64,
}

impl ScaledPair {
    pub fn totals(value: f64, nr_clients: u32) -> Result<Self, TopologyError> {
        Ok(Self {
            simultaneous: Topology::Simultaneous.scale_total(value, nr_clients)?,
            sequential: Topology::Sequential.scale_total(value, nr_clients)?,
        })
    }

    pub fn get(&self, topology: Topology) -> f64 {
        match topology {
            Topology::Simultaneous => self.simultaneous,
            Topology::Sequential => self.sequential,
        }
    }

    /// Subtract the same cost from both extrapolations.
    pub fn minus(self, cost: f64) -> Self {
        Self {
            simultaneous: self.simultaneous - cost,
            sequential: self.sequential - cost,
        }
    }

    /// Negative extrapolations mean nothing can be sent.
    pub fn clamped(self) -> Self {
        Self {
            simultaneous: self.simultaneous.max(0.0),
            sequential: self.sequential.max(0.0),
        }
    }
}
