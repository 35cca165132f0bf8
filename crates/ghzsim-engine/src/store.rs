//! JSON persistence of batch results.
//!
//! A stored run carries the parameters that produced it together with a
//! SHA-256 digest of their canonical JSON, so a loaded file can be matched
//! against the scenario it claims to describe.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use ghzsim_sim::LinkModel;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::info;

use crate::pipeline::Pipeline;
use crate::result::{BatchResult, Measurement};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no filename given")]
    MissingFilename,
    #[error("invalid filename '{0}': must be a plain file name")]
    InvalidFilename(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("parameter digest mismatch: stored {stored}, computed {computed}")]
    DigestMismatch { stored: String, computed: String },
}

/// Parameters of a stored batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunParams {
    pub nr_clients: usize,
    pub link: LinkModel,
    /// Number of repeats.
    pub nr_runtimes: usize,
    pub nr_rounds: u64,
    pub pipeline: Pipeline,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRun {
    pub message_lengths: Vec<Measurement>,
    pub simulation_times: Vec<Measurement>,
    pub params: RunParams,
    pub params_sha256: String,
}

impl StoredRun {
    pub fn new(batch: &BatchResult, params: RunParams) -> Result<Self, StoreError> {
        let params_sha256 = params_digest(&params)?;
        Ok(Self {
            message_lengths: batch.message_lengths.clone(),
            simulation_times: batch.simulation_times.clone(),
            params,
            params_sha256,
        })
    }

    /// Recompute the parameter digest and compare it to the stored one.
    pub fn verify(&self) -> Result<(), StoreError> {
        let computed = params_digest(&self.params)?;
        if computed != self.params_sha256 {
            return Err(StoreError::DigestMismatch {
                stored: self.params_sha256.clone(),
                computed,
            });
        }
        Ok(())
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}

fn params_digest(params: &RunParams) -> Result<String, StoreError> {
    Ok(sha256_hex(&serde_json::to_vec(params)?))
}

fn checked_filename(filename: &str) -> Result<&str, StoreError> {
    if filename.is_empty() {
        return Err(StoreError::MissingFilename);
    }
    let mut components = Path::new(filename).components();
    match (components.next(), components.next()) {
        (Some(std::path::Component::Normal(_)), None) => Ok(filename),
        _ => Err(StoreError::InvalidFilename(filename.to_string())),
    }
}

/// Write `run` to `dir/filename` as pretty JSON, creating `dir` if needed.
///
/// The file is written to a temporary sibling and renamed into place, so a
/// reader never sees a partial file.
pub fn save_run(dir: &Path, filename: &str, run: &StoredRun) -> Result<PathBuf, StoreError> {
    let filename = checked_filename(filename)?;
    fs::create_dir_all(dir)?;
    let path = dir.join(filename);

    let mut tmp = NamedTempFile::new_in(dir)?;
    serde_json::to_writer_pretty(&mut tmp, run)?;
    tmp.write_all(b"\n")?;
    tmp.flush()?;
    tmp.persist(&path).map_err(|e| StoreError::Io(e.error))?;

    info!(path = %path.display(), "run saved");
    Ok(path)
}

/// Read a run written by [`save_run`] and check its parameter digest.
pub fn load_run(dir: &Path, filename: &str) -> Result<StoredRun, StoreError> {
    let filename = checked_filename(filename)?;
    let text = fs::read_to_string(dir.join(filename))?;
    let run: StoredRun = serde_json::from_str(&text)?;
    run.verify()?;
    Ok(run)
}
