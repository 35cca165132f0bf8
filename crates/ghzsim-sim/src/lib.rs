#![doc = include_str!("../README.md")]

pub mod basis;
pub mod network;
mod register;
pub mod simulator;

pub use basis::Basis;
pub use network::{LinkModel, NetworkConfig, NetworkError};
pub use simulator::{Qubit, ResourceSimulator, SimError, StateVectorSimulator};
