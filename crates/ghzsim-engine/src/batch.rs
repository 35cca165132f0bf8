//! Repeated runs of one scenario through its pipeline.

use std::sync::Arc;

use ghzsim_protocol::{derive_seed, run_repeated, ProtocolConfig, SeedStream};
use ghzsim_sim::{NetworkConfig, ResourceSimulator, SimError, StateVectorSimulator};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::classifier::public_randomness;
use crate::pipeline::{Pipeline, PipelineError};
use crate::result::BatchResult;

/// One parameter setting of a batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub network: NetworkConfig,
    pub nr_rounds: u64,
    pub pipeline: Pipeline,
    /// Seed of the public randomness that picks verification and
    /// estimation rounds. `None` draws from the OS.
    #[serde(default)]
    pub public_seed: Option<u64>,
    /// Seed of every simulator and basis stream in the batch; each repeat
    /// derives its own streams from it.
    #[serde(default)]
    pub sim_seed: Option<u64>,
    #[serde(default)]
    pub log_progress: bool,
}

impl Scenario {
    pub fn new(network: NetworkConfig, nr_rounds: u64, pipeline: Pipeline) -> Self {
        Self {
            network,
            nr_rounds,
            pipeline,
            public_seed: None,
            sim_seed: None,
            log_progress: false,
        }
    }

    #[must_use]
    pub fn with_public_seed(mut self, seed: u64) -> Self {
        self.public_seed = Some(seed);
        self
    }

    #[must_use]
    pub fn with_sim_seed(mut self, seed: u64) -> Self {
        self.sim_seed = Some(seed);
        self
    }

    #[must_use]
    pub fn with_progress(mut self, enabled: bool) -> Self {
        self.log_progress = enabled;
        self
    }

    fn simulator(&self, repeat: usize) -> Result<Arc<dyn ResourceSimulator>, SimError> {
        let sim = match self.sim_seed {
            Some(seed) => StateVectorSimulator::seeded(
                self.network.clone(),
                derive_seed(seed, SeedStream::Simulator, repeat as u64, 0),
            )?,
            None => StateVectorSimulator::new(self.network.clone())?,
        };
        let sim: Arc<dyn ResourceSimulator> = Arc::new(sim);
        Ok(sim)
    }
}

/// Run `scenario` `repeats` times and evaluate every run.
///
/// Configuration, protocol and sampling errors abort the whole batch.
/// Runs whose error rates leave no secure length contribute a zero and
/// their reason.
pub fn run_batch(scenario: &Scenario, repeats: usize) -> Result<BatchResult, PipelineError> {
    let pipeline = &scenario.pipeline;
    pipeline.validate(scenario.nr_rounds, scenario.network.participants.len())?;

    let mut public = public_randomness(scenario.public_seed);
    let variant = pipeline.protocol_variant(&mut public, scenario.nr_rounds)?;
    let mut builder = ProtocolConfig::builder()
        .rounds(scenario.nr_rounds)
        .network(scenario.network.clone())
        .variant(variant)
        .log_progress(scenario.log_progress);
    if let Some(seed) = scenario.sim_seed {
        builder = builder.basis_seed(seed);
    }
    let config = Arc::new(builder.build()?);

    info!(
        pipeline = %pipeline.kind(),
        rounds = scenario.nr_rounds,
        repeats,
        "batch started"
    );
    let records = run_repeated(config, repeats, |repeat| scenario.simulator(repeat))?;

    let mut reports = Vec::with_capacity(records.len());
    for (repeat, record) in records.iter().enumerate() {
        let report = pipeline.evaluate(record, &mut public)?;
        match &report.zero_reason {
            Some(reason) => warn!(
                repeat,
                message_length = %report.message_length,
                %reason,
                "repeat produced no secure message"
            ),
            None => info!(
                repeat,
                message_length = %report.message_length,
                "repeat evaluated"
            ),
        }
        reports.push(report);
    }

    Ok(BatchResult::from_reports(pipeline.kind(), reports))
}
