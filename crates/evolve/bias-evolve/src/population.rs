//! Shared, ranked candidate pool
//!
//! Breeding threads read parents and insert children concurrently while a
//! grooming thread periodically sorts, truncates and refreshes the pool. The
//! ranked list and the set of known values sit behind one lock so no value is
//! ever stored twice.

use std::sync::Arc;

use bias_core::{BiasConstant, Candidate, Evaluator};
use parking_lot::RwLock;
use rustc_hash::FxHashSet;

use crate::mutation::Mutation;
use crate::rng::EvolutionRng;

#[derive(Debug, Default)]
struct Members {
    /// Sorted best-first after each groom, unsorted tail in between
    ranked: Vec<Arc<Candidate>>,
    values: FxHashSet<u32>,
}

impl Members {
    fn insert(&mut self, candidate: Arc<Candidate>) -> bool {
        if !self.values.insert(candidate.value().get()) {
            return false;
        }
        self.ranked.push(candidate);
        true
    }

    /// Sort best-first and drop everything past `limit`; returns the count
    /// dropped
    fn rank_and_truncate(&mut self, limit: usize) -> usize {
        self.ranked.sort_by(|a, b| Candidate::rank(a, b));
        if self.ranked.len() <= limit {
            return 0;
        }
        let dropped = self.ranked.split_off(limit);
        for candidate in &dropped {
            self.values.remove(&candidate.value().get());
        }
        dropped.len()
    }
}

/// Grooming parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroomSettings {
    /// Random newcomers per pass
    pub fresh: usize,
    /// Top candidates hill-climbed per pass
    pub hill_climb_top: usize,
}

/// Summary of one grooming pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GroomReport {
    /// Members dropped by the two truncations of the pass
    pub evicted: usize,
    /// Random newcomers that were not already present
    pub fresh_added: usize,
    /// Mutants that beat their origin and were new
    pub improvements: usize,
    /// Size right after the final truncation
    pub size: usize,
}

/// Candidate pool with a soft size limit
#[derive(Debug)]
pub struct Population {
    members: RwLock<Members>,
    limit: usize,
}

impl Population {
    pub fn new(limit: usize) -> Self {
        Self {
            members: RwLock::new(Members::default()),
            limit,
        }
    }

    /// New population filled by [`Self::seed`]
    pub fn seeded(limit: usize, count: usize, evaluator: &Evaluator, rng: &EvolutionRng) -> Self {
        let population = Self::new(limit);
        population.seed(count, evaluator, rng);
        population
    }

    /// Evaluate `count` random constants, insert them and rank the pool
    pub fn seed(&self, count: usize, evaluator: &Evaluator, rng: &EvolutionRng) {
        for _ in 0..count {
            self.insert(Candidate::evaluate(rng.constant(), evaluator));
        }
        self.members.write().ranked.sort_by(|a, b| Candidate::rank(a, b));
        log::debug!("initial population: {} candidates", self.len());
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn len(&self) -> usize {
        self.members.read().ranked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, value: BiasConstant) -> bool {
        self.members.read().values.contains(&value.get())
    }

    /// Add a candidate unless its value is already present.
    ///
    /// Returns whether the candidate was added. The pool may temporarily grow
    /// past its limit; the next groom trims it.
    pub fn insert(&self, candidate: Candidate) -> bool {
        self.members.write().insert(Arc::new(candidate))
    }

    /// Pick a member, biased toward the head of the ranking.
    ///
    /// Larger `eliteness` concentrates picks near the front; `1.0` is uniform
    /// over the first `limit` members.
    pub fn select(&self, eliteness: f64, rng: &EvolutionRng) -> Option<Arc<Candidate>> {
        self.select_at(eliteness, rng.unit())
    }

    /// [`Self::select`] with an explicit draw `r` from `[0, 1)`
    pub fn select_at(&self, eliteness: f64, r: f64) -> Option<Arc<Candidate>> {
        let members = self.members.read();
        let span = self.limit.min(members.ranked.len());
        if span == 0 {
            return None;
        }
        let index = ((r.powf(eliteness) * span as f64) as usize).min(span - 1);
        members.ranked.get(index).cloned()
    }

    /// Current leader, as of the last groom
    pub fn best(&self) -> Option<Arc<Candidate>> {
        self.members.read().ranked.first().cloned()
    }

    /// Copy of the members in their current order
    pub fn snapshot(&self) -> Vec<Arc<Candidate>> {
        self.members.read().ranked.clone()
    }

    /// Rank, truncate and refresh the pool.
    ///
    /// Newcomers and hill-climbing mutants are evaluated without holding the
    /// lock so breeders are not stalled by simulations. Every newcomer and
    /// every mutant that beats its origin is inserted; the pass then ranks
    /// the pool again and cuts it back to `limit`, so the pool is within its
    /// limit at the moment the pass ends even while breeders keep inserting.
    pub fn groom(
        &self,
        settings: GroomSettings,
        evaluator: &Evaluator,
        rng: &EvolutionRng,
    ) -> GroomReport {
        let (evicted, top) = {
            let mut members = self.members.write();
            let evicted = members.rank_and_truncate(self.limit);
            let top: Vec<_> = members
                .ranked
                .iter()
                .take(settings.hill_climb_top)
                .cloned()
                .collect();
            (evicted, top)
        };

        let mut report = GroomReport {
            evicted,
            ..GroomReport::default()
        };

        for _ in 0..settings.fresh {
            if self.insert(Candidate::evaluate(rng.constant(), evaluator)) {
                report.fresh_added += 1;
            }
        }

        for origin in top {
            for mutation in Mutation::ALL {
                let value = rng.with(|r| mutation.apply(origin.value().get(), r));
                let mutant = Candidate::evaluate(BiasConstant::new(value), evaluator);
                if mutant.utility() > origin.utility() && self.insert(mutant) {
                    report.improvements += 1;
                }
            }
        }

        let mut members = self.members.write();
        report.evicted += members.rank_and_truncate(self.limit);
        report.size = members.ranked.len();
        report
    }
}
