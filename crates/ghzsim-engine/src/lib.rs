#![doc = include_str!("../README.md")]

pub mod batch;
pub mod classifier;
pub mod estimator;
pub mod pipeline;
pub mod result;
pub mod store;

pub use batch::{run_batch, Scenario};
pub use classifier::{
    public_randomness, sample_rounds, EstimationPolicy, RoundCategory, RoundPartition,
    SamplingError,
};
pub use estimator::{estimate_error_rate, expected_parity, ErrorRateEstimate, EstimationError};
pub use pipeline::{
    BipartiteOptions, CorrectionOptions, Pipeline, PipelineError, PipelineKind, TrustedOptions,
    UntrustedOptions, DEFAULT_ESTIMATION_ROUNDS, DEFAULT_NR_CLIENTS, DEFAULT_TOLERANCE,
    DEFAULT_VERIFICATION_ROUNDS,
};
pub use result::{BatchResult, LengthReport, Measurement, RateSummary, ZeroLengthReason};
pub use store::{load_run, save_run, RunParams, StoreError, StoredRun};
