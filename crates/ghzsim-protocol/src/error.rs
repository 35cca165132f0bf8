use ghzsim_sim::SimError;
use thiserror::Error;

use crate::config::ConfigError;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("{node} received correction {value} in round {round}, expected 0 or 1")]
    CorrectionOutOfRange { node: String, round: u64, value: u8 },
    #[error("channel to {node} closed in round {round}")]
    ChannelClosed { node: String, round: u64 },
    #[error("simulator: {0}")]
    Sim(#[from] SimError),
    #[error("protocol task failed: {0}")]
    TaskFailed(String),
    #[error("failed to start runtime: {0}")]
    Runtime(#[from] std::io::Error),
    #[error("run finished without output from {0}")]
    MissingOutput(String),
    #[error("no participant at index {index}; the network has {nr_participants}")]
    UnknownParticipant {
        index: usize,
        nr_participants: usize,
    },
    #[error("{node} has no scheduled basis for round {round}; {scheduled} rounds were scheduled")]
    BasisScheduleExhausted {
        node: String,
        round: u64,
        scheduled: usize,
    },
}
