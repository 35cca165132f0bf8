use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::role::Role;
use crate::trace::{NodeTrace, ProtocolTrace, TraceEventKind};

/// Result of checking a protocol trace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckResult {
    /// Whether the trace passes all checks.
    pub passed: bool,
    /// List of violations found (empty if passed).
    pub violations: Vec<Violation>,
}

/// A single ordering violation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Violation {
    /// Node whose trace contains the violating event.
    pub node: String,
    /// Sequence number of the violating event.
    pub event_sequence: u64,
    pub kind: ViolationKind,
    /// Human-readable description.
    pub message: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ViolationKind {
    /// Node left a round unfinished, skipped one, or went back to an earlier one.
    RoundOutOfOrder,
    /// A round completed without a correction for some participant.
    MissingCorrection,
    /// More than one correction for the same participant in one round.
    DuplicateCorrection,
    /// A correction was exchanged before every resource of the round existed.
    CorrectionBeforeDistribution,
    /// A participant received its correction before its resource.
    CorrectionBeforeResource,
    /// Event names a node that is not part of the network.
    UnknownParticipant,
}

#[derive(Default)]
struct CoordinatorRound {
    pairs: HashSet<String>,
    corrections: HashSet<String>,
}

#[derive(Default)]
struct ParticipantRound {
    resource: bool,
    correction: bool,
}

/// Validates the per-round ordering guarantees on a recorded trace.
#[derive(Debug, Default, Clone, Copy)]
pub struct TraceChecker;

impl TraceChecker {
    pub fn new() -> Self {
        Self
    }

    /// Check every node's trace and the ordering between nodes.
    pub fn check(&self, trace: &ProtocolTrace) -> CheckResult {
        let mut violations = Vec::new();

        for node in &trace.nodes {
            let known = node.node == trace.coordinator || trace.participants.contains(&node.node);
            if !known {
                violations.push(Violation {
                    node: node.node.clone(),
                    event_sequence: node.events.first().map_or(0, |e| e.sequence),
                    kind: ViolationKind::UnknownParticipant,
                    message: format!("node '{}' is not part of the network", node.node),
                });
                continue;
            }
            check_round_order(node, trace.nr_rounds, &mut violations);
            match node.role {
                Role::Coordinator => check_coordinator(node, &trace.participants, &mut violations),
                Role::DistinguishedParticipant | Role::Participant => {
                    check_participant(node, &mut violations)
                }
            }
        }
        check_distribution_precedes_corrections(trace, &mut violations);

        CheckResult {
            passed: violations.is_empty(),
            violations,
        }
    }
}

/// Rounds are visited in order 0, 1, 2, ..., each closed by `RoundComplete`
/// before the next one starts.
fn check_round_order(node: &NodeTrace, nr_rounds: u64, violations: &mut Vec<Violation>) {
    let mut expected = 0u64;
    for event in &node.events {
        if event.round != expected || event.round >= nr_rounds {
            violations.push(Violation {
                node: node.node.clone(),
                event_sequence: event.sequence,
                kind: ViolationKind::RoundOutOfOrder,
                message: format!(
                    "event in round {} while round {} is open (run has {} rounds)",
                    event.round, expected, nr_rounds
                ),
            });
            expected = event.round;
        }
        if event.kind == TraceEventKind::RoundComplete {
            expected = event.round + 1;
        }
    }
}

fn check_coordinator(node: &NodeTrace, participants: &[String], violations: &mut Vec<Violation>) {
    let mut rounds: BTreeMap<u64, CoordinatorRound> = BTreeMap::new();
    for event in &node.events {
        let state = rounds.entry(event.round).or_default();
        match &event.kind {
            TraceEventKind::PairCreated { participant } => {
                if !participants.contains(participant) {
                    violations.push(Violation {
                        node: node.node.clone(),
                        event_sequence: event.sequence,
                        kind: ViolationKind::UnknownParticipant,
                        message: format!("pair created with unknown participant '{participant}'"),
                    });
                }
                state.pairs.insert(participant.clone());
            }
            TraceEventKind::CorrectionSent { participant, .. } => {
                if !participants.contains(participant) {
                    violations.push(Violation {
                        node: node.node.clone(),
                        event_sequence: event.sequence,
                        kind: ViolationKind::UnknownParticipant,
                        message: format!("correction sent to unknown participant '{participant}'"),
                    });
                    continue;
                }
                if state.pairs.len() < participants.len() {
                    violations.push(Violation {
                        node: node.node.clone(),
                        event_sequence: event.sequence,
                        kind: ViolationKind::CorrectionBeforeDistribution,
                        message: format!(
                            "correction for '{}' sent after only {} of {} pairs in round {}",
                            participant,
                            state.pairs.len(),
                            participants.len(),
                            event.round
                        ),
                    });
                }
                if !state.corrections.insert(participant.clone()) {
                    violations.push(Violation {
                        node: node.node.clone(),
                        event_sequence: event.sequence,
                        kind: ViolationKind::DuplicateCorrection,
                        message: format!(
                            "second correction for '{}' in round {}",
                            participant, event.round
                        ),
                    });
                }
            }
            TraceEventKind::RoundComplete => {
                for participant in participants {
                    if !state.corrections.contains(participant) {
                        violations.push(Violation {
                            node: node.node.clone(),
                            event_sequence: event.sequence,
                            kind: ViolationKind::MissingCorrection,
                            message: format!(
                                "round {} completed without a correction for '{}'",
                                event.round, participant
                            ),
                        });
                    }
                }
            }
            TraceEventKind::ResourceReceived
            | TraceEventKind::Measured { .. }
            | TraceEventKind::CorrectionReceived { .. } => {}
        }
    }
}

fn check_participant(node: &NodeTrace, violations: &mut Vec<Violation>) {
    let mut rounds: BTreeMap<u64, ParticipantRound> = BTreeMap::new();
    for event in &node.events {
        let state = rounds.entry(event.round).or_default();
        match &event.kind {
            TraceEventKind::ResourceReceived => state.resource = true,
            TraceEventKind::CorrectionReceived { .. } => {
                if !state.resource {
                    violations.push(Violation {
                        node: node.node.clone(),
                        event_sequence: event.sequence,
                        kind: ViolationKind::CorrectionBeforeResource,
                        message: format!("correction received before resource in round {}", event.round),
                    });
                }
                if state.correction {
                    violations.push(Violation {
                        node: node.node.clone(),
                        event_sequence: event.sequence,
                        kind: ViolationKind::DuplicateCorrection,
                        message: format!("second correction received in round {}", event.round),
                    });
                }
                state.correction = true;
            }
            TraceEventKind::RoundComplete => {
                if !state.correction {
                    violations.push(Violation {
                        node: node.node.clone(),
                        event_sequence: event.sequence,
                        kind: ViolationKind::MissingCorrection,
                        message: format!("round {} completed without a correction", event.round),
                    });
                }
            }
            TraceEventKind::PairCreated { .. }
            | TraceEventKind::Measured { .. }
            | TraceEventKind::CorrectionSent { .. } => {}
        }
    }
}

/// In the run-wide order, the last pair of a round precedes every
/// correction exchanged in that round.
fn check_distribution_precedes_corrections(trace: &ProtocolTrace, violations: &mut Vec<Violation>) {
    let mut last_pair: HashMap<u64, u64> = HashMap::new();
    for node in &trace.nodes {
        for event in &node.events {
            if matches!(event.kind, TraceEventKind::PairCreated { .. }) {
                let entry = last_pair.entry(event.round).or_insert(event.sequence);
                *entry = (*entry).max(event.sequence);
            }
        }
    }
    for node in &trace.nodes {
        // The coordinator's own ordering is covered per node.
        if node.role == Role::Coordinator {
            continue;
        }
        for event in &node.events {
            if !matches!(event.kind, TraceEventKind::CorrectionReceived { .. }) {
                continue;
            }
            if let Some(&last) = last_pair.get(&event.round) {
                if event.sequence < last {
                    violations.push(Violation {
                        node: node.node.clone(),
                        event_sequence: event.sequence,
                        kind: ViolationKind::CorrectionBeforeDistribution,
                        message: format!(
                            "correction received at #{} before the last pair of round {} (#{})",
                            event.sequence, event.round, last
                        ),
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::{TraceRecorder, TRACE_SCHEMA_VERSION};
    use ghzsim_sim::Basis;

    /// Record `rounds` well-ordered rounds for a coordinator and two
    /// participants, interleaved the way a real run interleaves them.
    fn valid_trace(rounds: u64) -> ProtocolTrace {
        let recorder = TraceRecorder::new();
        let mut server = recorder.node("Server", Role::Coordinator);
        let mut c0 = recorder.node("C0", Role::DistinguishedParticipant);
        let mut c1 = recorder.node("C1", Role::Participant);
        for round in 0..rounds {
            for (name, node) in [("C0", &mut c0), ("C1", &mut c1)] {
                server.record(round, TraceEventKind::PairCreated { participant: name.into() });
                node.record(round, TraceEventKind::ResourceReceived);
                node.record(round, TraceEventKind::Measured { basis: Basis::Z, outcome: 0 });
            }
            server.record(round, TraceEventKind::Measured { basis: Basis::Z, outcome: 0 });
            server.record(round, TraceEventKind::Measured { basis: Basis::X, outcome: 1 });
            for (name, node) in [("C0", &mut c0), ("C1", &mut c1)] {
                server.record(round, TraceEventKind::CorrectionSent { participant: name.into(), value: 1 });
                node.record(round, TraceEventKind::CorrectionReceived { value: 1 });
            }
            server.record(round, TraceEventKind::RoundComplete);
            c0.record(round, TraceEventKind::RoundComplete);
            c1.record(round, TraceEventKind::RoundComplete);
        }
        ProtocolTrace {
            schema_version: TRACE_SCHEMA_VERSION,
            variant: "key_generation".into(),
            nr_rounds: rounds,
            coordinator: "Server".into(),
            participants: vec!["C0".into(), "C1".into()],
            nodes: vec![server.finish(), c0.finish(), c1.finish()],
        }
    }

    fn kinds(result: &CheckResult) -> Vec<ViolationKind> {
        result.violations.iter().map(|v| v.kind).collect()
    }

    #[test]
    fn well_ordered_trace_passes() {
        let result = TraceChecker::new().check(&valid_trace(3));
        assert!(result.passed, "violations: {:?}", result.violations);
    }

    #[test]
    fn duplicate_correction_is_flagged() {
        let mut trace = valid_trace(1);
        let coordinator = &mut trace.nodes[0];
        let dup = coordinator
            .events
            .iter()
            .position(|e| matches!(e.kind, TraceEventKind::CorrectionSent { .. }))
            .unwrap();
        let copy = coordinator.events[dup].clone();
        coordinator.events.insert(dup + 1, copy);
        let result = TraceChecker::new().check(&trace);
        assert!(!result.passed);
        assert!(kinds(&result).contains(&ViolationKind::DuplicateCorrection));
    }

    #[test]
    fn missing_correction_is_flagged() {
        let mut trace = valid_trace(1);
        trace.nodes[2]
            .events
            .retain(|e| !matches!(e.kind, TraceEventKind::CorrectionReceived { .. }));
        let result = TraceChecker::new().check(&trace);
        assert_eq!(kinds(&result), vec![ViolationKind::MissingCorrection]);
        assert_eq!(result.violations[0].node, "C1");
    }

    #[test]
    fn correction_before_resource_is_flagged() {
        let mut trace = valid_trace(1);
        trace.nodes[1]
            .events
            .retain(|e| e.kind != TraceEventKind::ResourceReceived);
        let result = TraceChecker::new().check(&trace);
        assert_eq!(kinds(&result), vec![ViolationKind::CorrectionBeforeResource]);
    }

    #[test]
    fn rounds_out_of_order_are_flagged() {
        let mut trace = valid_trace(2);
        // Relabel C0's second round as round 0 again.
        for event in &mut trace.nodes[1].events {
            event.round = 0;
        }
        let result = TraceChecker::new().check(&trace);
        assert!(kinds(&result).contains(&ViolationKind::RoundOutOfOrder));
    }

    #[test]
    fn early_correction_across_nodes_is_flagged() {
        let mut trace = valid_trace(1);
        let receive = trace.nodes[1]
            .events
            .iter_mut()
            .find(|e| matches!(e.kind, TraceEventKind::CorrectionReceived { .. }))
            .unwrap();
        receive.sequence = 0;
        let result = TraceChecker::new().check(&trace);
        assert_eq!(kinds(&result), vec![ViolationKind::CorrectionBeforeDistribution]);
    }

    #[test]
    fn unknown_node_is_flagged() {
        let mut trace = valid_trace(1);
        trace.nodes[2].node = "Mallory".into();
        let result = TraceChecker::new().check(&trace);
        assert!(kinds(&result).contains(&ViolationKind::UnknownParticipant));
    }

    #[test]
    fn deterministic_output() {
        let mut trace = valid_trace(2);
        trace.nodes[2].events.truncate(3);
        let checker = TraceChecker::new();
        let json1 = serde_json::to_string(&checker.check(&trace)).unwrap();
        let json2 = serde_json::to_string(&checker.check(&trace)).unwrap();
        assert_eq!(json1, json2);
    }
}
