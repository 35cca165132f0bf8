#![doc = include_str!("../README.md")]

pub mod correction;
pub mod entropy;
pub mod secure_length;
pub mod topology;

pub use correction::{statistical_correction, CorrectionError};
pub use entropy::{binary_entropy, binary_entropy_unit, EntropyError};
pub use secure_length::{
    anonymity_weighted_length, preshared_key_length, single_rate_length, two_rate_length,
    verification_penalty, CorrectedRate, SecureLengthError,
};
pub use topology::{ScaledPair, Topology, TopologyError};
