//! Per-node event traces of a protocol run.
//!
//! Sequence numbers are drawn from one counter shared by every node of the
//! run, so events of different nodes can be ordered against each other.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use ghzsim_sim::Basis;
use serde::{Deserialize, Serialize};

use crate::role::Role;

pub const TRACE_SCHEMA_VERSION: u32 = 1;

/// A complete trace of one protocol run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProtocolTrace {
    /// Schema version (currently 1).
    pub schema_version: u32,
    pub variant: String,
    pub nr_rounds: u64,
    pub coordinator: String,
    pub participants: Vec<String>,
    pub nodes: Vec<NodeTrace>,
}

/// Events recorded by one node, in the order it performed them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeTrace {
    pub node: String,
    pub role: Role,
    pub events: Vec<TraceEvent>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceEvent {
    /// Position in the run-wide event order.
    pub sequence: u64,
    pub round: u64,
    pub kind: TraceEventKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TraceEventKind {
    /// Coordinator created a pair with `participant` and shipped its half.
    PairCreated { participant: String },
    /// Participant took ownership of its half.
    ResourceReceived,
    /// A node measured a qubit.
    Measured { basis: Basis, outcome: u8 },
    /// Coordinator sent a correction bit.
    CorrectionSent { participant: String, value: u8 },
    /// Participant received its correction bit.
    CorrectionReceived { value: u8 },
    /// Node passed the end-of-round barrier.
    RoundComplete,
}

/// Hands out run-wide sequence numbers to the nodes of one run.
#[derive(Debug, Clone, Default)]
pub struct TraceRecorder {
    next: Arc<AtomicU64>,
}

impl TraceRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node(&self, node: impl Into<String>, role: Role) -> NodeTracer {
        NodeTracer {
            next: Arc::clone(&self.next),
            trace: NodeTrace {
                node: node.into(),
                role,
                events: Vec::new(),
            },
        }
    }
}

#[derive(Debug)]
pub struct NodeTracer {
    next: Arc<AtomicU64>,
    trace: NodeTrace,
}

impl NodeTracer {
    pub fn record(&mut self, round: u64, kind: TraceEventKind) {
        let sequence = self.next.fetch_add(1, Ordering::SeqCst);
        self.trace.events.push(TraceEvent {
            sequence,
            round,
            kind,
        });
    }

    pub fn finish(self) -> NodeTrace {
        self.trace
    }
}

/// Record into an optional tracer.
pub(crate) fn record(tracer: &mut Option<NodeTracer>, round: u64, kind: TraceEventKind) {
    if let Some(t) = tracer.as_mut() {
        t.record(round, kind);
    }
}
