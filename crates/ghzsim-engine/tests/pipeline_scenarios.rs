use std::collections::BTreeSet;

use ghzsim_engine::{
    public_randomness, run_batch, BipartiteOptions, CorrectionOptions, EstimationPolicy,
    Measurement, Pipeline, PipelineError, PipelineKind, RoundPartition, Scenario, TrustedOptions,
    UntrustedOptions, ZeroLengthReason,
};
use ghzsim_prob::{binary_entropy, preshared_key_length, ScaledPair, Topology};
use ghzsim_protocol::{CoordinatorOutput, ParticipantOutput, Role, RunRecord};
use ghzsim_sim::{Basis, LinkModel, NetworkConfig};

/// A two-participant key-generation record where `error(round)` decides
/// whether the second participant disagrees with the first.
fn key_record(nr_rounds: u64, error: impl Fn(u64) -> bool) -> RunRecord {
    let first: Vec<u8> = (0..nr_rounds).map(|r| (r % 2) as u8).collect();
    let second: Vec<u8> = (0..nr_rounds)
        .map(|r| (r % 2) as u8 ^ u8::from(error(r)))
        .collect();
    record(nr_rounds, vec![(first, None, None), (second, None, None)])
}

type Streams = (Vec<u8>, Option<Vec<Basis>>, Option<Vec<u8>>);

fn record(nr_rounds: u64, streams: Vec<Streams>) -> RunRecord {
    RunRecord {
        coordinator: CoordinatorOutput {
            name: "Server".into(),
            rounds: nr_rounds,
            simulation_time_ns: 0.0,
            first_outcomes: vec![0; nr_rounds as usize],
        },
        participants: streams
            .into_iter()
            .enumerate()
            .map(|(i, (outcomes, bases, verification))| ParticipantOutput {
                name: format!("C{i}"),
                role: if i == 0 {
                    Role::DistinguishedParticipant
                } else {
                    Role::Participant
                },
                outcomes,
                bases,
                verification,
            })
            .collect(),
        trace: None,
    }
}

fn uncorrected_trusted(nr_estimation_rounds: u64) -> TrustedOptions {
    TrustedOptions {
        nr_estimation_rounds,
        estimation_correction: CorrectionOptions::disabled(),
    }
}

#[test]
fn trusted_length_follows_single_rate_formula() {
    // Every 50th round disagrees: a 2% channel.
    let run = key_record(1000, |r| r % 50 == 0);
    let pipeline = Pipeline::TrustedGhz(uncorrected_trusted(200));
    let report = pipeline
        .evaluate(&run, &mut public_randomness(Some(11)))
        .unwrap();

    assert_eq!(report.estimation.samples, 200);
    let rate = report.estimation.rate.rate;
    assert!(rate < 0.1, "rate {rate}");
    let expected = (1.0 - binary_entropy(rate).unwrap()) * 800.0;
    assert!((report.raw_length - expected).abs() < 1e-9);
    assert!(report.zero_reason.is_none());
}

/// The first `count` estimation rounds that `seed` draws for a run of
/// `nr_rounds` rounds with `nr_estimation` estimation rounds.
fn drawn_estimation_rounds(
    seed: u64,
    nr_rounds: u64,
    nr_estimation: u64,
    count: usize,
) -> BTreeSet<u64> {
    let partition =
        RoundPartition::estimation_only(&mut public_randomness(Some(seed)), nr_rounds, nr_estimation)
            .unwrap();
    partition.estimation().iter().copied().take(count).collect()
}

#[test]
fn two_percent_estimation_gives_known_trusted_length() {
    // 4 errors among the 200 sampled rounds: exactly 2%.
    let errors = drawn_estimation_rounds(21, 1000, 200, 4);
    let run = key_record(1000, |r| errors.contains(&r));
    let report = Pipeline::TrustedGhz(uncorrected_trusted(200))
        .evaluate(&run, &mut public_randomness(Some(21)))
        .unwrap();

    assert_eq!(report.estimation.samples, 200);
    assert_eq!(report.estimation.rate.rate, 0.02);
    assert!(
        (report.raw_length - 686.85).abs() < 0.01,
        "raw length {}",
        report.raw_length
    );
    assert!(report.zero_reason.is_none());
}

/// Two-party untrusted record: `nr_key` key rounds with errors on
/// `key_errors` and `nr_verification` clean verification rounds.
fn bipartite_record(nr_key: u64, nr_verification: u64, key_errors: &BTreeSet<u64>) -> RunRecord {
    let key_a: Vec<u8> = (0..nr_key).map(|r| (r % 2) as u8).collect();
    let key_b: Vec<u8> = (0..nr_key)
        .map(|r| (r % 2) as u8 ^ u8::from(key_errors.contains(&r)))
        .collect();
    let ver: Vec<u8> = (0..nr_verification).map(|r| (r % 3 == 0) as u8).collect();
    record(
        nr_key + nr_verification,
        vec![(key_a, None, Some(ver.clone())), (key_b, None, Some(ver))],
    )
}

fn uncorrected_untrusted_bipartite(nr_clients: u32) -> Pipeline {
    Pipeline::UntrustedBipartite {
        untrusted: UntrustedOptions {
            nr_verification_rounds: 200,
            verification_correction: CorrectionOptions::disabled(),
            estimation: EstimationPolicy::Separate(200),
            estimation_correction: CorrectionOptions::disabled(),
            anon_tolerance: 1e-8,
        },
        bipartite: BipartiteOptions { nr_clients },
    }
}

#[test]
fn five_percent_estimation_gives_known_two_rate_length() {
    // Key rounds are the 800 non-verification rounds; 10 of the 200
    // sampled among them disagree.
    let errors = drawn_estimation_rounds(8, 800, 200, 10);
    let run = bipartite_record(800, 200, &errors);
    let report = uncorrected_untrusted_bipartite(4)
        .evaluate(&run, &mut public_randomness(Some(8)))
        .unwrap();

    assert_eq!(report.verification.unwrap().rate.rate, 0.0);
    assert_eq!(report.estimation.rate.rate, 0.05);
    // (1 - h(0) - h(0.05)) * 600
    assert!(
        (report.raw_length - 428.16).abs() < 0.01,
        "raw length {}",
        report.raw_length
    );

    let preshared = preshared_key_length(200, 1000).unwrap();
    match report.message_length {
        Measurement::PerTopology(pair) => {
            assert!((pair.simultaneous - (4.0 * report.raw_length - preshared)).abs() < 1e-9);
            assert!((pair.sequential - (6.0 * report.raw_length - preshared)).abs() < 1e-9);
        }
        other => panic!("expected per-topology lengths, got {other:?}"),
    }
    assert!(report.zero_reason.is_none());
}

#[test]
fn preshared_key_cost_reports_its_reason() {
    // Two clients: the sequential total is the raw length itself, which
    // the pre-shared verification key h(0.2) * 1000 outweighs.
    let errors = drawn_estimation_rounds(8, 800, 200, 10);
    let run = bipartite_record(800, 200, &errors);
    let report = uncorrected_untrusted_bipartite(2)
        .evaluate(&run, &mut public_randomness(Some(8)))
        .unwrap();

    assert!(report.raw_length > 0.0);
    let preshared = preshared_key_length(200, 1000).unwrap();
    match report.message_length {
        Measurement::PerTopology(pair) => {
            assert_eq!(pair.sequential, 0.0);
            assert!((pair.simultaneous - (2.0 * report.raw_length - preshared)).abs() < 1e-9);
        }
        other => panic!("expected per-topology lengths, got {other:?}"),
    }
    match report.zero_reason {
        Some(ZeroLengthReason::PresharedKeyExceedsLength {
            topology,
            preshared: cost,
            extrapolated,
        }) => {
            assert_eq!(topology, Topology::Sequential);
            assert_eq!(cost, preshared);
            assert_eq!(extrapolated, report.raw_length);
        }
        other => panic!("unexpected reason {other:?}"),
    }
}

#[test]
fn preshared_key_cost_can_erase_both_topologies() {
    // 10% key errors leave a raw length below the pre-shared cost even
    // when doubled for the simultaneous topology.
    let errors = drawn_estimation_rounds(13, 800, 200, 20);
    let run = bipartite_record(800, 200, &errors);
    let report = uncorrected_untrusted_bipartite(2)
        .evaluate(&run, &mut public_randomness(Some(13)))
        .unwrap();

    assert_eq!(report.estimation.rate.rate, 0.1);
    assert!(report.raw_length > 0.0);
    assert_eq!(
        report.message_length,
        Measurement::PerTopology(ScaledPair::default())
    );
    assert!(matches!(
        report.zero_reason,
        Some(ZeroLengthReason::PresharedKeyExceedsLength {
            topology: Topology::Sequential,
            ..
        })
    ));
}

#[test]
fn degenerate_rate_degrades_to_zero() {
    // 60% disagreement, estimated over every round.
    let run = key_record(1000, |r| r % 5 < 3);
    let report = Pipeline::TrustedGhz(uncorrected_trusted(1000))
        .evaluate(&run, &mut public_randomness(Some(1)))
        .unwrap();
    assert_eq!(report.raw_length, 0.0);
    assert_eq!(report.message_length, Measurement::Single(0.0));
    match report.zero_reason {
        Some(ZeroLengthReason::RatesTooLarge {
            verification: None,
            estimation,
        }) => assert!((estimation.rate - 0.6).abs() < 1e-12),
        other => panic!("unexpected reason {other:?}"),
    }
}

#[test]
fn noiseless_estimation_is_error_free() {
    let run = key_record(300, |_| false);
    for seed in 0..5 {
        let report = Pipeline::TrustedGhz(uncorrected_trusted(50))
            .evaluate(&run, &mut public_randomness(Some(seed)))
            .unwrap();
        assert_eq!(report.estimation.rate.rate, 0.0);
        assert_eq!(report.raw_length, 250.0);
    }
}

#[test]
fn untrusted_bipartite_uses_both_streams() {
    // 100 key rounds with every 20th in error, 10 clean verification rounds.
    let key_a: Vec<u8> = vec![0; 100];
    let key_b: Vec<u8> = (0..100).map(|r| u8::from(r % 20 == 0)).collect();
    let ver: Vec<u8> = vec![1, 0, 1, 1, 0, 0, 1, 0, 1, 1];
    let run = record(
        110,
        vec![
            (key_a, None, Some(ver.clone())),
            (key_b, None, Some(ver)),
        ],
    );
    let pipeline = Pipeline::UntrustedBipartite {
        untrusted: UntrustedOptions {
            nr_verification_rounds: 10,
            verification_correction: CorrectionOptions::disabled(),
            estimation: EstimationPolicy::Separate(100),
            estimation_correction: CorrectionOptions::disabled(),
            anon_tolerance: 1e-8,
        },
        bipartite: BipartiteOptions { nr_clients: 4 },
    };
    let report = pipeline
        .evaluate(&run, &mut public_randomness(Some(3)))
        .unwrap();

    let verification = report.verification.unwrap();
    assert_eq!(verification.rate.rate, 0.0);
    assert_eq!(verification.samples, 10);
    assert_eq!(report.estimation.rate.rate, 0.05);
    // Every round is overhead, so nothing is left for the message.
    assert_eq!(report.raw_length, 0.0);
    assert!(report.zero_reason.is_none());
    match report.message_length {
        Measurement::PerTopology(pair) => {
            assert_eq!(pair.simultaneous, 0.0);
            assert_eq!(pair.sequential, 0.0);
        }
        other => panic!("expected per-topology lengths, got {other:?}"),
    }
}

#[test]
fn untrusted_ghz_requires_bases() {
    let run = key_record(50, |_| false);
    let pipeline = Pipeline::UntrustedGhz(UntrustedOptions {
        nr_verification_rounds: 10,
        estimation: EstimationPolicy::Separate(10),
        ..UntrustedOptions::default()
    });
    let err = pipeline
        .evaluate(&run, &mut public_randomness(Some(0)))
        .unwrap_err();
    assert!(matches!(
        err,
        PipelineError::MissingBases(PipelineKind::UntrustedGhz)
    ));
}

#[test]
fn noiseless_untrusted_ghz_batch() {
    let scenario = Scenario::new(
        NetworkConfig::star(3, LinkModel::Perfect),
        200,
        Pipeline::UntrustedGhz(UntrustedOptions {
            nr_verification_rounds: 40,
            verification_correction: CorrectionOptions::disabled(),
            estimation: EstimationPolicy::Separate(40),
            estimation_correction: CorrectionOptions::disabled(),
            anon_tolerance: 1e-8,
        }),
    )
    .with_public_seed(7)
    .with_sim_seed(7);
    let batch = run_batch(&scenario, 2).unwrap();
    // Penalty 1 at zero verification error, times (1/2)(1 - h(0)) * 120.
    for report in &batch.reports {
        assert_eq!(report.verification.unwrap().rate.rate, 0.0);
        assert_eq!(report.estimation.rate.rate, 0.0);
        assert_eq!(report.raw_length, 60.0);
    }
    assert_eq!(batch.mean_message_length(), 60.0);
}

#[test]
fn reused_verification_spends_no_estimation_rounds() {
    let scenario = Scenario::new(
        NetworkConfig::star(2, LinkModel::Perfect),
        100,
        Pipeline::UntrustedGhz(UntrustedOptions {
            nr_verification_rounds: 20,
            verification_correction: CorrectionOptions::disabled(),
            estimation: EstimationPolicy::ReuseVerification,
            estimation_correction: CorrectionOptions::disabled(),
            anon_tolerance: 1e-8,
        }),
    )
    .with_public_seed(2)
    .with_sim_seed(2);
    let batch = run_batch(&scenario, 1).unwrap();
    let report = &batch.reports[0];
    assert_eq!(
        report.estimation.samples,
        report.verification.unwrap().samples
    );
    assert_eq!(report.raw_length, 40.0);
}

#[test]
fn noiseless_trusted_bipartite_reports_per_slot_rates() {
    let scenario = Scenario::new(
        NetworkConfig::star(2, LinkModel::Perfect),
        100,
        Pipeline::TrustedBipartite {
            trusted: uncorrected_trusted(20),
            bipartite: BipartiteOptions { nr_clients: 4 },
        },
    )
    .with_public_seed(5)
    .with_sim_seed(5);
    let batch = run_batch(&scenario, 1).unwrap();
    let report = &batch.reports[0];
    assert_eq!(report.raw_length, 80.0);
    match report.message_length {
        Measurement::PerTopology(pair) => {
            assert_eq!(pair.simultaneous, 20.0);
            assert!((pair.sequential - 80.0 / 6.0).abs() < 1e-12);
        }
        other => panic!("expected per-topology lengths, got {other:?}"),
    }
    assert_eq!(report.simulation_time_ns, Measurement::Single(0.0));
}

#[test]
fn noiseless_untrusted_bipartite_subtracts_preshared_key() {
    let scenario = Scenario::new(
        NetworkConfig::star(2, LinkModel::Perfect),
        200,
        Pipeline::UntrustedBipartite {
            untrusted: UntrustedOptions {
                nr_verification_rounds: 20,
                verification_correction: CorrectionOptions::disabled(),
                estimation: EstimationPolicy::Separate(30),
                estimation_correction: CorrectionOptions::disabled(),
                anon_tolerance: 1e-8,
            },
            bipartite: BipartiteOptions { nr_clients: 4 },
        },
    )
    .with_public_seed(9)
    .with_sim_seed(9);
    let batch = run_batch(&scenario, 1).unwrap();
    let report = &batch.reports[0];
    assert_eq!(report.raw_length, 150.0);

    let preshared = preshared_key_length(20, 200).unwrap();
    match report.message_length {
        Measurement::PerTopology(pair) => {
            let simultaneous = Topology::Simultaneous.scale_total(150.0, 4).unwrap() - preshared;
            let sequential = Topology::Sequential.scale_total(150.0, 4).unwrap() - preshared;
            assert!((pair.simultaneous - simultaneous).abs() < 1e-9);
            assert!((pair.sequential - sequential).abs() < 1e-9);
            assert!(pair.simultaneous <= pair.sequential);
        }
        other => panic!("expected per-topology lengths, got {other:?}"),
    }
}

#[test]
fn oversized_estimation_aborts_batch() {
    // Separate estimation leaves only 5 key rounds for 10 estimation rounds.
    let scenario = Scenario::new(
        NetworkConfig::star(2, LinkModel::Perfect),
        20,
        Pipeline::UntrustedGhz(UntrustedOptions {
            nr_verification_rounds: 15,
            estimation: EstimationPolicy::Separate(10),
            ..UntrustedOptions::default()
        }),
    );
    assert!(matches!(
        run_batch(&scenario, 1).unwrap_err(),
        PipelineError::Config(_)
    ));
}
