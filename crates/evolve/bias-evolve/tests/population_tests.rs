//! Population grooming and concurrency tests

mod common;

use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;

use bias_core::{BiasConstant, Candidate};
use bias_evolve::{EvolutionRng, GroomSettings, Population};

#[test]
fn test_same_seed_same_initial_population() {
    let config = common::small_config();
    let evaluator = config.build_evaluator().unwrap();

    let values = |seed| {
        let population = Population::seeded(60, 20, &evaluator, &EvolutionRng::seeded(seed));
        population
            .snapshot()
            .iter()
            .map(|c| c.value().get())
            .collect::<Vec<_>>()
    };

    assert_eq!(values(5), values(5));
    assert_ne!(values(5), values(6));
}

#[test]
fn test_seeded_population_is_ranked() {
    let config = common::small_config();
    let evaluator = config.build_evaluator().unwrap();
    let population = Population::seeded(60, 30, &evaluator, &EvolutionRng::seeded(1));

    let snapshot = population.snapshot();
    assert!(snapshot.windows(2).all(|w| w[0].utility() >= w[1].utility()));
    assert_eq!(population.best().unwrap().utility(), snapshot[0].utility());
}

#[test]
fn test_groom_keeps_population_within_limit() {
    let config = common::small_config();
    let evaluator = config.build_evaluator().unwrap();
    let rng = EvolutionRng::seeded(7);
    let settings = GroomSettings {
        fresh: 4,
        hill_climb_top: 2,
    };
    let population = Population::new(40);

    for _ in 0..200 {
        population.insert(Candidate::evaluate(rng.constant(), &evaluator));
    }
    assert!(population.len() > 40);

    for _ in 0..3 {
        let report = population.groom(settings, &evaluator, &rng);
        assert!(report.size <= 40, "{report:?}");
        assert_eq!(report.size, population.len());
    }

    let snapshot = population.snapshot();
    let mut values: Vec<_> = snapshot.iter().map(|c| c.value()).collect();
    values.sort_unstable();
    values.dedup();
    assert_eq!(values.len(), snapshot.len());
}

#[test]
fn test_groom_never_lowers_the_leader() {
    let config = common::small_config();
    let evaluator = config.build_evaluator().unwrap();
    let rng = EvolutionRng::seeded(11);
    let population = Population::seeded(60, 20, &evaluator, &rng);
    let settings = config.groom_settings();

    let mut best = population.best().unwrap().utility();
    for _ in 0..5 {
        population.groom(settings, &evaluator, &rng);
        let settle = GroomSettings {
            fresh: 0,
            hill_climb_top: 0,
        };
        population.groom(settle, &evaluator, &rng);
        let now = population.best().unwrap().utility();
        assert!(now >= best);
        best = now;
    }
}

#[test]
fn test_concurrent_inserts_are_deduplicated() {
    let population = Arc::new(Population::new(1000));

    let threads: Vec<_> = (0..4)
        .map(|t| {
            let population = Arc::clone(&population);
            thread::spawn(move || {
                let mut added = 0usize;
                for v in 0..500u32 {
                    let candidate = Candidate::from_parts(BiasConstant::new(v), (v + t) as f32);
                    if population.insert(candidate) {
                        added += 1;
                    }
                }
                added
            })
        })
        .collect();

    let added: usize = threads.into_iter().map(|t| t.join().unwrap()).sum();
    assert_eq!(added, 500);
    assert_eq!(population.len(), 500);
}

#[test]
fn test_selection_stays_within_limit() {
    let population = Population::new(10);
    for v in 0..50u32 {
        population.insert(Candidate::from_parts(BiasConstant::new(v), v as f32));
    }
    population.groom(
        GroomSettings {
            fresh: 0,
            hill_climb_top: 0,
        },
        &common::small_config().build_evaluator().unwrap(),
        &EvolutionRng::seeded(0),
    );

    let rng = EvolutionRng::seeded(2);
    for _ in 0..500 {
        let picked = population.select(1.0, &rng).unwrap();
        assert!(picked.utility() >= 40.0);
    }
}

#[test]
fn test_groom_of_oversized_pool_respects_small_limit() {
    let config = common::small_config();
    let evaluator = config.build_evaluator().unwrap();
    let rng = EvolutionRng::seeded(3);
    let population = Population::seeded(5, 20, &evaluator, &rng);
    assert_eq!(population.len(), 20);

    let report = population.groom(
        GroomSettings {
            fresh: 10,
            hill_climb_top: 3,
        },
        &evaluator,
        &rng,
    );
    assert!(report.size <= 5, "{report:?}");
    assert!(population.best().is_some());
}

#[test]
fn test_groom_keeps_improvements_while_breeders_insert() {
    let config = common::small_config();
    let evaluator = config.build_evaluator().unwrap();
    let settings = GroomSettings {
        fresh: 4,
        hill_climb_top: 4,
    };
    let limit = 100;
    let fitted = |population: &Population| {
        population
            .snapshot()
            .iter()
            .filter(|c| c.utility() > -1.0)
            .map(|c| c.value().get())
            .collect::<BTreeSet<_>>()
    };

    let quiet = Population::seeded(limit, 40, &evaluator, &EvolutionRng::seeded(5));
    let quiet_report = quiet.groom(settings, &evaluator, &EvolutionRng::seeded(9));
    let expected = fitted(&quiet);
    assert_eq!(quiet_report.evicted, 0);

    // filler values rank below every real candidate and never collide with one
    let filler: Arc<Vec<u32>> =
        Arc::new((0..2000).filter(|v| !expected.contains(v)).collect());
    let busy = Population::seeded(limit, 40, &evaluator, &EvolutionRng::seeded(5));
    let done = AtomicBool::new(false);
    let inserted = AtomicUsize::new(0);

    let busy_report = thread::scope(|scope| {
        for t in 0..4 {
            let (busy, done, inserted, filler) = (&busy, &done, &inserted, &filler);
            scope.spawn(move || {
                let mut i = t * 97;
                while !done.load(Ordering::Relaxed) {
                    let value = BiasConstant::new(filler[i % filler.len()]);
                    if busy.insert(Candidate::from_parts(value, -1.0)) {
                        inserted.fetch_add(1, Ordering::Relaxed);
                    }
                    i += 1;
                }
            });
        }
        while inserted.load(Ordering::Relaxed) == 0 {
            thread::yield_now();
        }
        let report = busy.groom(settings, &evaluator, &EvolutionRng::seeded(9));
        done.store(true, Ordering::Relaxed);
        report
    });

    assert!(busy_report.size <= limit, "{busy_report:?}");
    assert_eq!(busy_report.fresh_added, quiet_report.fresh_added);
    assert_eq!(busy_report.improvements, quiet_report.improvements);
    assert_eq!(fitted(&busy), expected);
}
