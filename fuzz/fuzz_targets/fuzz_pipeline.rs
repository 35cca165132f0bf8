#![no_main]
use libfuzzer_sys::fuzz_target;

use ghzsim_engine::{
    public_randomness, BipartiteOptions, CorrectionOptions, EstimationPolicy, Pipeline,
    TrustedOptions, UntrustedOptions,
};
use ghzsim_prob::{
    anonymity_weighted_length, single_rate_length, two_rate_length, CorrectedRate,
};
use ghzsim_protocol::{CoordinatorOutput, ParticipantOutput, Role, RunRecord};

fn word(data: &[u8], at: usize) -> u64 {
    data.get(at..at + 2)
        .map(|b| u64::from(u16::from_le_bytes([b[0], b[1]])))
        .unwrap_or(0)
}

fn fraction(data: &[u8], at: usize) -> f64 {
    word(data, at) as f64 / 32_768.0 - 0.5
}

fuzz_target!(|data: &[u8]| {
    if data.len() < 16 {
        return;
    }

    // Secure-length formulas: arbitrary rates (including negative and > 1)
    // and counts must yield a finite length or an error, never a panic.
    let ver = CorrectedRate::new(fraction(data, 0), fraction(data, 2).abs());
    let est = CorrectedRate::new(fraction(data, 4), fraction(data, 6).abs());
    let total = word(data, 8);
    let m_ver = word(data, 10) % 512;
    let m_pe = word(data, 12) % 512;
    for length in [
        single_rate_length(est, total, m_pe),
        two_rate_length(ver, est, total, m_ver, m_pe),
        anonymity_weighted_length(ver, est, fraction(data, 14).abs(), total, m_ver, m_pe),
    ]
    .into_iter()
    .flatten()
    {
        assert!(length.is_finite() && length >= 0.0);
    }

    // Pipelines on a synthetic two-participant record built from the tail.
    let body = &data[16..];
    let nr_rounds = (body.len() / 2) as u64;
    if nr_rounds < 2 {
        return;
    }
    let column = |p: usize| -> Vec<u8> { body.chunks_exact(2).map(|c| c[p] & 1).collect() };
    let record = RunRecord {
        coordinator: CoordinatorOutput {
            name: "Server".into(),
            rounds: nr_rounds,
            simulation_time_ns: f64::from(data[0]),
            first_outcomes: vec![0; nr_rounds as usize],
        },
        participants: (0..2)
            .map(|p| ParticipantOutput {
                name: format!("C{p}"),
                role: if p == 0 {
                    Role::DistinguishedParticipant
                } else {
                    Role::Participant
                },
                outcomes: column(p),
                bases: None,
                verification: Some(column(p).into_iter().take(1).collect()),
            })
            .collect(),
        trace: None,
    };

    let nr_estimation = 1 + word(data, 10) % nr_rounds;
    let pipelines = [
        Pipeline::TrustedGhz(TrustedOptions {
            nr_estimation_rounds: nr_estimation,
            estimation_correction: CorrectionOptions::enabled(1e-8),
        }),
        Pipeline::UntrustedBipartite {
            untrusted: UntrustedOptions {
                nr_verification_rounds: 1,
                estimation: EstimationPolicy::Separate(nr_estimation.min(nr_rounds - 1)),
                ..UntrustedOptions::default()
            },
            bipartite: BipartiteOptions {
                nr_clients: 2 + u32::from(data[1] % 8),
            },
        },
    ];
    let mut rng = public_randomness(Some(word(data, 12)));
    for pipeline in pipelines {
        if let Ok(report) = pipeline.evaluate(&record, &mut rng) {
            assert!(report.raw_length >= 0.0);
            assert!(report.message_length.primary() >= 0.0);
        }
    }
});
