//! Randomized checks against a brute-force oracle.

mod common;

use std::sync::atomic::AtomicBool;

use common::{brute_force_linearizable, is_valid_witness, random_register_history, replays, RegisterOp};
use lincheck_checker::models::RegisterModel;
use lincheck_checker::{check_single, LinearizabilityChecker, SearchOptions, SearchOutcome, Timeline};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

const SEEDS: u64 = 500;

fn search(history: &[RegisterOp], options: SearchOptions) -> lincheck_checker::SearchReport {
    let timeline = Timeline::from_operations(history.to_vec()).unwrap();
    check_single(&RegisterModel, &timeline, options, &AtomicBool::new(false))
}

#[test]
fn test_verdict_matches_brute_force() {
    let mut rng = ChaCha8Rng::seed_from_u64(0x5eed);
    let (mut legal, mut illegal) = (0, 0);

    for seed in 0..SEEDS {
        let history = random_register_history(&mut rng, 6);
        let report = search(&history, SearchOptions::default());
        let expected = brute_force_linearizable(&RegisterModel, &history);

        match report.outcome {
            SearchOutcome::Linearizable => {
                legal += 1;
                assert!(expected, "seed {seed}: search accepted {history:?}");
                let witness = &report.partial_linearizations[0];
                assert!(
                    is_valid_witness(&RegisterModel, &history, witness),
                    "seed {seed}: invalid witness {witness:?} for {history:?}"
                );
            }
            SearchOutcome::Illegal => {
                illegal += 1;
                assert!(!expected, "seed {seed}: search rejected {history:?}");
            }
            SearchOutcome::Cancelled => panic!("seed {seed}: search cancelled without a kill"),
        }
    }

    // The generator must exercise both verdicts.
    assert!(legal > 0 && illegal > 0, "legal={legal} illegal={illegal}");
}

#[test]
fn test_cache_is_transparent() {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    for seed in 0..SEEDS {
        let history = random_register_history(&mut rng, 6);
        let cached = search(&history, SearchOptions::default());
        let uncached = search(
            &history,
            SearchOptions {
                enable_caching: false,
                ..SearchOptions::default()
            },
        );
        assert_eq!(cached.outcome, uncached.outcome, "seed {seed}: {history:?}");
        assert!(cached.stats.states_explored <= uncached.stats.states_explored);
    }
}

#[test]
fn test_partial_witnesses_replay() {
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let options = SearchOptions {
        compute_partial: true,
        ..SearchOptions::default()
    };

    for seed in 0..SEEDS {
        let history = random_register_history(&mut rng, 6);
        let report = search(&history, options);
        if report.outcome != SearchOutcome::Illegal {
            continue;
        }
        for witness in &report.partial_linearizations {
            assert!(!witness.is_empty());
            assert!(witness.len() < history.len());
            assert!(
                replays(&RegisterModel, &history, witness),
                "seed {seed}: partial {witness:?} does not replay for {history:?}"
            );
            let mut ids = witness.clone();
            ids.sort_unstable();
            ids.dedup();
            assert_eq!(ids.len(), witness.len(), "seed {seed}: repeated id in {witness:?}");
        }
    }
}

#[tokio::test]
async fn test_repeated_checks_agree() {
    let mut rng = ChaCha8Rng::seed_from_u64(99);
    let checker = LinearizabilityChecker::new(RegisterModel);

    for _ in 0..50 {
        let history = random_register_history(&mut rng, 6);
        let first = checker.check_operations(history.clone()).await.unwrap();
        let second = checker.check_operations(history.clone()).await.unwrap();
        assert_eq!(first.status, second.status, "{history:?}");
        assert_eq!(first.is_ok(), brute_force_linearizable(&RegisterModel, &history));
    }
}
