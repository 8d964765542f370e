use crate::config::Config;
use crate::error::SfResult;
use crate::model::{Assignment, ProblemContext};
use crate::population::{CycleAction, FitnessStats, Generation, GenerationParams};
use crate::rules::{ConstraintOracle, FitnessOracle, FITNESS_MAX};
use crate::search::{OrTree, SearchLimits, SearchOutcome, SearchStats};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use strum_macros::Display;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct OptimizationOptions {
    pub initial_pop: usize,
    pub max_pop: usize,
    pub num_remove: usize,
    pub max_generations: usize,
    pub stable_threshold: u64,
    pub max_stable_generations: usize,
    pub frontier_cap: usize,
    pub max_restarts: usize,
    pub selection_retries: usize,
    pub max_time: Option<Duration>,
}

impl From<&Config> for OptimizationOptions {
    fn from(cfg: &Config) -> Self {
        Self {
            initial_pop: cfg.search.initial_pop,
            max_pop: cfg.search.max_pop,
            num_remove: cfg.search.num_remove,
            max_generations: cfg.search.max_generations,
            stable_threshold: cfg.search.stable_threshold,
            max_stable_generations: cfg.search.max_stable_generations,
            frontier_cap: cfg.search.frontier_cap,
            max_restarts: cfg.search.max_restarts,
            selection_retries: cfg.search.selection_retries,
            max_time: None, // Set manually if needed
        }
    }
}

impl Default for OptimizationOptions {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum StopReason {
    /// Every cold-start search came back exhausted.
    NoSolution,
    /// Only one distinct seed was found, so there was nothing to combine.
    SingleSeed,
    GenerationLimit,
    Stable,
    TimeLimit,
    Aborted,
}

#[derive(Debug, Clone)]
pub struct OptimizationResult {
    pub best: Option<Assignment>,
    pub best_fitness: u64,
    pub population: Vec<Assignment>,
    pub generations: usize,
    pub stop_reason: StopReason,
    pub search_stats: SearchStats,
}

/// A trait for receiving updates during optimization.
/// Boolean return value indicates if the search should continue (true) or abort (false).
pub trait ProgressCallback: Send + Sync {
    fn on_progress(&self, generation: usize, stats: &FitnessStats) -> bool;
}

/// Callback that never interrupts.
pub struct SilentProgress;

impl ProgressCallback for SilentProgress {
    fn on_progress(&self, _generation: usize, _stats: &FitnessStats) -> bool {
        true
    }
}

pub struct Optimizer<C, F> {
    ctx: Arc<ProblemContext>,
    constraints: Arc<C>,
    fitness: Arc<F>,
    options: OptimizationOptions,
}

impl<C: ConstraintOracle, F: FitnessOracle> Optimizer<C, F> {
    pub fn new(
        ctx: Arc<ProblemContext>,
        constraints: Arc<C>,
        fitness: Arc<F>,
        options: OptimizationOptions,
    ) -> Self {
        Self {
            ctx,
            constraints,
            fitness,
            options,
        }
    }

    pub fn options(&self) -> &OptimizationOptions {
        &self.options
    }

    pub fn run<CB: ProgressCallback>(
        &self,
        seed: Option<u64>,
        callback: CB,
    ) -> SfResult<OptimizationResult> {
        let opts = &self.options;
        let start_time = Instant::now();
        let deadline = opts.max_time.map(|t| start_time + t);
        let timed_out = || deadline.is_some_and(|d| Instant::now() >= d);

        let mut rng = if let Some(s) = seed {
            fastrand::Rng::with_seed(s)
        } else {
            fastrand::Rng::new()
        };

        let mut limits = SearchLimits::builder()
            .frontier_cap(opts.frontier_cap)
            .max_restarts(opts.max_restarts)
            .build();
        limits.deadline = deadline;
        let mut tree = OrTree::new(self.ctx.clone(), self.constraints.clone(), limits);
        let mut search_stats = SearchStats::default();

        // 1. Seed the population with distinct cold-start solutions
        let mut seen = HashSet::new();
        let mut members = Vec::new();
        for attempt in 0..opts.initial_pop {
            if timed_out() {
                break;
            }
            let mut search_rng = rng.fork();
            let outcome = tree.search(self.ctx.initial(), &mut search_rng)?;
            search_stats.absorb(tree.stats());
            match outcome {
                SearchOutcome::Found(a) if seen.insert(a.clone()) => members.push(a),
                SearchOutcome::Found(_) => debug!("Seed #{} duplicated an earlier one", attempt),
                SearchOutcome::Exhausted => debug!("Seed #{} exhausted", attempt),
            }
        }
        info!(
            "Seeded {} distinct solutions from {} attempts",
            members.len(),
            opts.initial_pop
        );

        let params = GenerationParams {
            max_pop: opts.max_pop,
            num_remove: opts.num_remove,
            selection_retries: opts.selection_retries,
        };
        let mut generation = Generation::new(members, tree, self.fitness.clone(), params);

        let Some((mut best, mut best_fitness)) = generation.best().map(|(a, f)| (a.clone(), f))
        else {
            return Ok(OptimizationResult {
                best: None,
                best_fitness: FITNESS_MAX,
                population: Vec::new(),
                generations: 0,
                stop_reason: if timed_out() {
                    StopReason::TimeLimit
                } else {
                    StopReason::NoSolution
                },
                search_stats,
            });
        };

        // 2. Refine
        let mut stop_reason = StopReason::GenerationLimit;
        let mut stable_counter = 0;
        // Stability is measured from FITNESS_MAX rather than the best seed,
        // so the first generation always counts as an improvement.
        let mut stable_best = FITNESS_MAX;
        let mut generations = 0;

        if generation.len() < 2 {
            stop_reason = StopReason::SingleSeed;
        } else {
            for cycle in 1..=opts.max_generations {
                if timed_out() {
                    stop_reason = StopReason::TimeLimit;
                    break;
                }

                let action = generation.control(&mut rng)?;
                if matches!(action, CycleAction::Crossover { .. }) {
                    search_stats.absorb(generation.tree().stats());
                }
                generations = cycle;

                let Some(stats) = generation.stats() else {
                    break;
                };
                debug!(
                    "Gen {:5} | {:?} | size {} | min {} max {} mean {:.1}",
                    cycle,
                    action,
                    generation.len(),
                    stats.min,
                    stats.max,
                    stats.mean
                );

                if stats.min < stable_best {
                    if stable_best - stats.min > opts.stable_threshold {
                        stable_counter = 0;
                    } else {
                        stable_counter += 1;
                    }
                    stable_best = stats.min;
                } else {
                    stable_counter += 1;
                }
                if stats.min < best_fitness {
                    best_fitness = stats.min;
                    if let Some((a, _)) = generation.best() {
                        best = a.clone();
                    }
                }

                if !callback.on_progress(cycle, &stats) {
                    stop_reason = StopReason::Aborted;
                    break;
                }

                if stable_counter >= opts.max_stable_generations {
                    stop_reason = StopReason::Stable;
                    break;
                }
            }
        }

        info!(
            "Stopped after {} generations ({}), best fitness {}",
            generations, stop_reason, best_fitness
        );

        Ok(OptimizationResult {
            best: Some(best),
            best_fitness,
            population: generation.into_members(),
            generations,
            stop_reason,
            search_stats,
        })
    }
}
