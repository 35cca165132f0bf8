#![doc = include_str!("../README.md")]

pub mod checker;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod outcomes;
pub mod participant;
pub mod role;
pub mod runner;
pub mod seed;
pub mod trace;
pub mod variant;

pub use checker::{CheckResult, TraceChecker, Violation, ViolationKind};
pub use config::{ConfigError, ProtocolConfig, ProtocolConfigBuilder};
pub use coordinator::{Coordinator, CoordinatorOutput, ParticipantLink};
pub use error::ProtocolError;
pub use outcomes::{OutcomeError, OutcomeTable};
pub use participant::{apply_correction, Participant, ParticipantOutput};
pub use role::Role;
pub use runner::{run_blocking, run_protocol, run_repeated, RunRecord};
pub use seed::{derive_seed, SeedStream};
pub use trace::{
    NodeTrace, NodeTracer, ProtocolTrace, TraceEvent, TraceEventKind, TraceRecorder,
    TRACE_SCHEMA_VERSION,
};
pub use variant::ProtocolVariant;
