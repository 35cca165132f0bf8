//! CLI argument definitions: top-level `Cli` struct and `Commands` enum.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

pub(crate) const CLI_LONG_ABOUT: &str =
    "Simulates GHZ-based multi-party key generation and anonymous transmission over a\n\
    star network and estimates how many secure message bits a run yields.\n\n\
    Typical use:\n  \
    1. ghzsim run --pipeline trusted-ghz --clients 4 --rounds 1000\n  \
    2. ghzsim sweep --rounds 1000,2000 --verification-rounds 200,350 --estimation-rounds 200,350\n  \
    3. ghzsim trace --variant anonymous --clients 3 --rounds 5";

#[derive(Parser)]
#[command(name = "ghzsim")]
#[command(about = "Simulated GHZ key generation and anonymous transmission")]
#[command(long_about = CLI_LONG_ABOUT)]
#[command(version)]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Commands,
}

/// Network to simulate.
#[derive(Args, Clone, Debug)]
pub(crate) struct NetworkArgs {
    /// JSON network description; replaces the generated star network
    #[arg(long)]
    pub(crate) network: Option<PathBuf>,

    /// Use noise-free, instantaneous links
    #[arg(long, default_value_t = false)]
    pub(crate) perfect: bool,

    /// Fidelity of every depolarising link
    #[arg(long, default_value_t = 0.99)]
    pub(crate) fidelity: f64,

    /// Duration of one pair-generation attempt in nanoseconds
    #[arg(long, default_value_t = 10.0)]
    pub(crate) t_cycle: f64,

    /// Success probability of one pair-generation attempt
    #[arg(long, default_value_t = 0.9)]
    pub(crate) prob_success: f64,

    /// Seed of the public randomness choosing verification and estimation rounds
    #[arg(long)]
    pub(crate) public_seed: Option<u64>,

    /// Seed of the resource simulator and basis choices; each repeat derives its own streams
    #[arg(long)]
    pub(crate) sim_seed: Option<u64>,
}

/// Statistical options shared by all pipelines.
#[derive(Args, Clone, Debug)]
pub(crate) struct EstimationArgs {
    /// Apply the statistical correction to the verification error rate
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub(crate) correct_verification: bool,

    /// Failure probability of the verification correction
    #[arg(long, default_value_t = 1e-8)]
    pub(crate) verification_tolerance: f64,

    /// Apply the statistical correction to the estimation error rate
    #[arg(long, default_value_t = false, action = clap::ArgAction::Set)]
    pub(crate) correct_estimation: bool,

    /// Failure probability of the estimation correction
    #[arg(long, default_value_t = 1e-8)]
    pub(crate) estimation_tolerance: f64,

    /// Accepted probability that a dishonest server stays undetected
    #[arg(long, default_value_t = 1e-8)]
    pub(crate) anon_tolerance: f64,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Run one pipeline repeatedly and report message lengths
    Run {
        /// Pipeline: trusted-ghz | trusted-bipartite | untrusted-ghz | untrusted-bipartite
        #[arg(long, default_value = "trusted-ghz")]
        pipeline: String,

        /// Number of clients in the network (bipartite pipelines extrapolate to it)
        #[arg(long, default_value_t = 6)]
        clients: u32,

        /// Number of protocol rounds
        #[arg(long, default_value_t = 1000)]
        rounds: u64,

        /// Number of verification rounds (untrusted pipelines)
        #[arg(long, default_value_t = 200)]
        verification_rounds: u64,

        /// Number of parameter-estimation rounds
        #[arg(long, default_value_t = 200)]
        estimation_rounds: u64,

        /// Reuse the verification error rate instead of separate estimation rounds
        /// (untrusted GHZ only)
        #[arg(long, default_value_t = false)]
        reuse_verification: bool,

        /// Number of repeated runs
        #[arg(long, default_value_t = 1)]
        repeats: usize,

        #[command(flatten)]
        network: NetworkArgs,

        #[command(flatten)]
        estimation: EstimationArgs,

        /// Log progress every 1% of rounds
        #[arg(long, default_value_t = false)]
        progress: bool,

        /// Output format: text | json
        #[arg(long, default_value = "text")]
        format: String,

        /// Directory to store the run in (as <pipeline>_nrRounds<N>.json)
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },

    /// Run every pipeline for a list of round counts and store each result
    Sweep {
        /// Number of clients in the network
        #[arg(long, default_value_t = 6)]
        clients: u32,

        /// Round counts to sweep (comma-separated)
        #[arg(long, value_delimiter = ',', default_value = "1000,2000,5000")]
        rounds: Vec<u64>,

        /// Verification rounds per round count (comma-separated)
        #[arg(long, value_delimiter = ',', default_value = "200,350,500")]
        verification_rounds: Vec<u64>,

        /// Estimation rounds per round count (comma-separated)
        #[arg(long, value_delimiter = ',', default_value = "200,350,500")]
        estimation_rounds: Vec<u64>,

        /// Number of repeated runs per point
        #[arg(long, default_value_t = 1)]
        repeats: usize,

        #[command(flatten)]
        network: NetworkArgs,

        #[command(flatten)]
        estimation: EstimationArgs,

        /// Directory receiving one JSON file per pipeline and round count
        #[arg(long, default_value = "results/lengths_per_nr_rounds")]
        out_dir: PathBuf,
    },

    /// Record an event trace of one run and check its round ordering
    Trace {
        /// Variant: key-generation | random-basis | anonymous | scheduled-verification
        #[arg(long, default_value = "key-generation")]
        variant: String,

        /// Number of participants
        #[arg(long, default_value_t = 3)]
        clients: usize,

        /// Number of protocol rounds
        #[arg(long, default_value_t = 10)]
        rounds: u64,

        /// Verification rounds (scheduled-verification only)
        #[arg(long, default_value_t = 2)]
        verification_rounds: u64,

        #[command(flatten)]
        network: NetworkArgs,

        /// Write the trace JSON here instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
}
