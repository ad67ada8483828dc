//! Optimizer lifecycle and worker threads
//!
//! Starting a run returns at once while a seeder thread evaluates the initial
//! population ([`OptimizerState::Initializing`]). Once it is ranked the run
//! turns [`OptimizerState::Running`] and three kinds of threads share the
//! pool: breeders produce children as fast as they can, a groomer ranks and
//! refreshes it on a fixed period, and a monitor reports each new leader. All
//! of them watch one [`StopSignal`].

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use bias_core::{BiasConstant, Candidate, Evaluator};
use parking_lot::{Condvar, Mutex, RwLock};

use crate::config::EvolutionConfig;
use crate::crossover::Crossover;
use crate::error::{EvolveError, EvolveResult};
use crate::mutation::Mutation;
use crate::population::Population;
use crate::report::{BestReport, LogReporter, ProgressReporter};
use crate::rng::EvolutionRng;

/// Lifecycle of an optimizer run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptimizerState {
    /// Evaluating the initial population
    Initializing,
    /// Worker threads are active
    Running,
    /// All threads have been joined
    Stopped,
}

/// How often waiting threads check whether seeding has finished
const SEED_POLL: Duration = Duration::from_millis(1);

/// One-shot stop flag that sleeping threads can wait on
#[derive(Debug, Default)]
pub struct StopSignal {
    stopped: Mutex<bool>,
    wake: Condvar,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        *self.stopped.lock() = true;
        self.wake.notify_all();
    }

    pub fn is_stopped(&self) -> bool {
        *self.stopped.lock()
    }

    /// Sleep for up to `timeout`; returns `true` as soon as a stop is requested
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut stopped = self.stopped.lock();
        while !*stopped {
            if self.wake.wait_until(&mut stopped, deadline).timed_out() {
                break;
            }
        }
        *stopped
    }
}

struct Shared {
    config: EvolutionConfig,
    evaluator: Arc<Evaluator>,
    rng: EvolutionRng,
    population: Population,
    reporter: Arc<dyn ProgressReporter>,
    stop: StopSignal,
    state: RwLock<OptimizerState>,
    children: AtomicU64,
}

impl Shared {
    fn state(&self) -> OptimizerState {
        *self.state.read()
    }

    /// Block while the population is being seeded; `false` if the run was
    /// stopped first
    fn await_running(&self) -> bool {
        while self.state() == OptimizerState::Initializing {
            if self.stop.wait_timeout(SEED_POLL) {
                return false;
            }
        }
        self.state() == OptimizerState::Running && !self.stop.is_stopped()
    }

    fn seed_population(&self) {
        let count = self.config.initial_population;
        self.population.seed(count, &self.evaluator, &self.rng);
        let mut state = self.state.write();
        if *state == OptimizerState::Initializing {
            *state = OptimizerState::Running;
            log::info!("population seeded with {} candidates", self.population.len());
        }
    }

    /// Produce and insert one child; returns whether it was new
    fn breed_once(&self) -> bool {
        let population = &self.population;
        let (Some(first), Some(second)) = (
            population.select(self.config.primary_eliteness, &self.rng),
            population.select(self.config.secondary_eliteness, &self.rng),
        ) else {
            return false;
        };

        let crossover = Crossover::ALL[self.rng.below(Crossover::ALL.len())];
        let mut value = crossover.cross(first.value().get(), second.value().get());
        if self.rng.unit() < self.config.mutation_probability {
            let mutation = Mutation::ALL[self.rng.below(Mutation::ALL.len())];
            value = self.rng.with(|rng| mutation.apply(value, rng));
        }

        let value = BiasConstant::new(value);
        if population.contains(value) {
            return false;
        }
        let added = population.insert(Candidate::evaluate(value, &self.evaluator));
        if added {
            self.children.fetch_add(1, Ordering::Relaxed);
        }
        added
    }

    fn breed_loop(&self) {
        if !self.await_running() {
            return;
        }
        while !self.stop.is_stopped() {
            self.breed_once();
        }
    }

    fn groom_loop(&self) {
        let settings = self.config.groom_settings();
        if !self.await_running() {
            return;
        }
        while !self.stop.wait_timeout(self.config.groom_period()) {
            let report = self.population.groom(settings, &self.evaluator, &self.rng);
            log::debug!(
                "groom: evicted {}, fresh {}, improved {}, size {}, cache hit rate {:.1}%",
                report.evicted,
                report.fresh_added,
                report.improvements,
                report.size,
                self.evaluator.cache_stats().hit_rate()
            );
        }
    }

    fn monitor_loop(&self) {
        if !self.await_running() {
            return;
        }
        let mut last: Option<(BiasConstant, f32)> = None;
        loop {
            if let Some(best) = self.population.best() {
                let improved = match last {
                    None => true,
                    Some((value, utility)) => best.value() != value && best.utility() > utility,
                };
                if improved {
                    last = Some((best.value(), best.utility()));
                    self.reporter.report(&BestReport::new(&best, &self.evaluator));
                }
            }
            if self.stop.wait_timeout(self.config.monitor_period()) {
                break;
            }
        }
    }
}

/// A configured, not yet started optimizer
pub struct Optimizer {
    config: EvolutionConfig,
    evaluator: Arc<Evaluator>,
    reporter: Arc<dyn ProgressReporter>,
}

impl Optimizer {
    /// Validate `config` and build its evaluator
    pub fn new(config: EvolutionConfig) -> EvolveResult<Self> {
        config.validate()?;
        let evaluator = config.build_evaluator()?;
        Ok(Self::with_evaluator(config, Arc::new(evaluator)))
    }

    /// Use an existing evaluator instead of the one `config` describes
    pub fn with_evaluator(config: EvolutionConfig, evaluator: Arc<Evaluator>) -> Self {
        Self {
            config,
            evaluator,
            reporter: Arc::new(LogReporter),
        }
    }

    /// Replace the default log-based reporter
    pub fn reporter(mut self, reporter: impl ProgressReporter + 'static) -> Self {
        self.reporter = Arc::new(reporter);
        self
    }

    pub fn config(&self) -> &EvolutionConfig {
        &self.config
    }

    pub fn evaluator(&self) -> &Arc<Evaluator> {
        &self.evaluator
    }

    /// Start seeding and all worker threads.
    ///
    /// Returns while the run is still [`OptimizerState::Initializing`];
    /// workers begin once the initial population is ranked.
    pub fn start(self) -> EvolveResult<OptimizerHandle> {
        log::info!(
            "starting optimizer: seed {}, {} workers, population limit {}",
            self.config.seed,
            self.config.workers,
            self.config.population_limit
        );

        let shared = Arc::new(Shared {
            rng: EvolutionRng::seeded(self.config.seed),
            population: Population::new(self.config.population_limit),
            config: self.config,
            evaluator: self.evaluator,
            reporter: self.reporter,
            stop: StopSignal::new(),
            state: RwLock::new(OptimizerState::Initializing),
            children: AtomicU64::new(0),
        });

        let mut handle = OptimizerHandle {
            shared: Arc::clone(&shared),
            threads: Vec::new(),
        };

        type Job = fn(&Shared);
        let mut jobs: Vec<(String, Job)> = Vec::new();
        jobs.push(("seeder".to_string(), Shared::seed_population as Job));
        for i in 0..shared.config.workers {
            jobs.push((format!("breeder-{i}"), Shared::breed_loop as Job));
        }
        jobs.push(("groomer".to_string(), Shared::groom_loop as Job));
        jobs.push(("monitor".to_string(), Shared::monitor_loop as Job));

        for (name, job) in jobs {
            let worker = Arc::clone(&shared);
            let spawned = thread::Builder::new()
                .name(name.clone())
                .spawn(move || job(&*worker));
            match spawned {
                Ok(thread) => handle.threads.push(thread),
                Err(source) => {
                    handle.shutdown();
                    return Err(EvolveError::Spawn { name, source });
                }
            }
        }

        Ok(handle)
    }
}

/// Control over a running optimizer; dropping it stops the run
pub struct OptimizerHandle {
    shared: Arc<Shared>,
    threads: Vec<JoinHandle<()>>,
}

impl OptimizerHandle {
    pub fn state(&self) -> OptimizerState {
        self.shared.state()
    }

    /// Block until seeding has finished; `false` if the run was stopped first
    pub fn wait_until_running(&self) -> bool {
        self.shared.await_running()
    }

    pub fn population(&self) -> &Population {
        &self.shared.population
    }

    pub fn evaluator(&self) -> &Arc<Evaluator> {
        &self.shared.evaluator
    }

    /// Children added by breeders so far
    pub fn children(&self) -> u64 {
        self.shared.children.load(Ordering::Relaxed)
    }

    /// Current leader with its per-spec breakdown
    pub fn best(&self) -> Option<BestReport> {
        self.shared
            .population
            .best()
            .map(|best| BestReport::new(&best, &self.shared.evaluator))
    }

    /// Block until `duration` has passed or the run was stopped elsewhere
    pub fn run_for(&self, duration: Duration) {
        self.shared.stop.wait_timeout(duration);
    }

    /// Block until the run is stopped from another thread
    pub fn wait(&self) {
        while !self.shared.stop.wait_timeout(Duration::from_secs(3600)) {}
    }

    /// Request a stop without waiting for the threads
    pub fn signal_stop(&self) {
        self.shared.stop.stop();
    }

    /// Stop all threads, wait for them and return the final leader
    pub fn stop(mut self) -> Option<BestReport> {
        self.shutdown();
        self.best()
    }

    fn shutdown(&mut self) {
        self.shared.stop.stop();
        for thread in self.threads.drain(..) {
            let name = thread.thread().name().unwrap_or("worker").to_string();
            if thread.join().is_err() {
                log::error!("{name} thread panicked");
            }
        }
        let mut state = self.shared.state.write();
        if *state != OptimizerState::Stopped {
            *state = OptimizerState::Stopped;
            log::info!(
                "optimizer stopped after {} children",
                self.shared.children.load(Ordering::Relaxed)
            );
        }
    }
}

impl Drop for OptimizerHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}
