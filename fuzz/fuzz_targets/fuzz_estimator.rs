#![no_main]
use libfuzzer_sys::fuzz_target;

use ghzsim_engine::estimate_error_rate;
use ghzsim_protocol::{OutcomeTable, ParticipantOutput, Role};
use ghzsim_sim::Basis;

fuzz_target!(|data: &[u8]| {
    let Some((&header, body)) = data.split_first() else {
        return;
    };
    // Low bits pick the participant count, bit 7 whether bases are recorded.
    let nr_participants = usize::from(header & 0x07) + 1;
    let with_bases = header & 0x80 != 0;
    let nr_rounds = body.len() / nr_participants;
    if nr_rounds == 0 {
        return;
    }

    let outputs: Vec<ParticipantOutput> = (0..nr_participants)
        .map(|p| {
            let column: Vec<u8> = (0..nr_rounds)
                .map(|r| body[r * nr_participants + p])
                .collect();
            ParticipantOutput {
                name: format!("C{p}"),
                role: if p == 0 {
                    Role::DistinguishedParticipant
                } else {
                    Role::Participant
                },
                outcomes: column.iter().map(|b| b & 1).collect(),
                bases: with_bases.then(|| column.iter().map(|b| Basis::from_label((b >> 1) & 1)).collect()),
                verification: None,
            }
        })
        .collect();

    // Every parseable table must estimate without panicking, including
    // requests that reach past the last round.
    if let Ok(table) = OutcomeTable::from_outcomes(&outputs) {
        let rounds = 0..(nr_rounds as u64 + u64::from(header >> 3 & 0x03));
        if let Ok(estimate) = estimate_error_rate(&table, rounds) {
            assert!(estimate.errors <= estimate.included);
            assert!((0.0..=1.0).contains(&estimate.rate()));
        }
    }
});
