//! Budgeted search loops and the [`Runner`] entry point.
//!
//! Every driver works on an initialized [`Population`] and an evaluation
//! budget. The budget is an estimate, charged per step with a cost that
//! depends on the strategy, and may go negative: the loop runs while it
//! is `>= 0`. All drivers return the best score of the population when the
//! budget is spent.

use super::config::{DriverConfig, MemeticSettings, Strategy};
use crate::error::{FapError, Result};
use crate::ga::{best_index_excluding, Crossover, Individual, Population};
use crate::problem::{Problem, Score};
use crate::random::{RandomSource, SeededRng};
use log::{debug, trace};

/// Generations without a change of the best score before the
/// generational driver restarts.
pub const STAGNATION_WINDOW: u32 = 20;

/// Counters collected by one driver run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct RunStats {
    steps: u64,
    restarts: u64,
    charged: i64,
}

/// Remaining evaluation budget.
///
/// Every charge costs at least one unit so that a loop always terminates.
#[derive(Debug)]
struct Budget {
    remaining: i64,
    charged: i64,
}

impl Budget {
    fn new(units: i64) -> Self {
        Self {
            remaining: units,
            charged: 0,
        }
    }

    fn left(&self) -> bool {
        self.remaining >= 0
    }

    fn charge(&mut self, units: i64) {
        let units = units.max(1);
        self.remaining = self.remaining.saturating_sub(units);
        self.charged = self.charged.saturating_add(units);
    }
}

fn to_units(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

fn ensure_initialized(population: &Population<'_>) -> Result<()> {
    if population.is_empty() {
        return Err(FapError::InvalidConfig("population is not initialized"));
    }
    Ok(())
}

// ============================================================================
// Public drivers
// ============================================================================

/// Generational GA with elitism.
///
/// Each step calls [`Population::evolve_generational`]. After
/// [`STAGNATION_WINDOW`] steps without a change of the best score the
/// population restarts and `population_size` units are charged. A
/// converged population also restarts, charged `population_size - 1`.
/// Otherwise a step costs `trunc(n * cross_rate)` with
/// `n = population_size`.
///
/// `population_size` is the nominal size the charges are computed from;
/// it need not equal `population.len()`.
pub fn generational<R: RandomSource + ?Sized>(
    population_size: usize,
    budget: i64,
    population: &mut Population<'_>,
    cross_rate: f64,
    crossover: &Crossover,
    mutation_rate: f64,
    rng: &mut R,
) -> Result<Score> {
    run_generational(
        population_size,
        budget,
        population,
        cross_rate,
        crossover,
        mutation_rate,
        rng,
    )?;
    Ok(population.best_score())
}

/// Steady-state GA.
///
/// Each step calls [`Population::evolve_steady_state`] and costs
/// `2 * pair_count` units (`pair_count` of 0 counts as 1). A converged
/// population restarts instead, charged `population_size - 1`.
pub fn steady_state<R: RandomSource + ?Sized>(
    population_size: usize,
    budget: i64,
    population: &mut Population<'_>,
    pair_count: usize,
    crossover: &Crossover,
    mutation_rate: f64,
    rng: &mut R,
) -> Result<Score> {
    run_steady_state(
        population_size,
        budget,
        population,
        pair_count,
        crossover,
        mutation_rate,
        rng,
    )?;
    Ok(population.best_score())
}

/// Memetic cycle refining every individual after each burst.
pub fn memetic_all<R: RandomSource + ?Sized>(
    budget: i64,
    population: &mut Population<'_>,
    crossover: &Crossover,
    settings: &MemeticSettings,
    rng: &mut R,
) -> Result<Score> {
    run_memetic(budget, population, crossover, settings, Refinement::All, rng)?;
    Ok(population.best_score())
}

/// Memetic cycle refining a contiguous circular run of
/// [`MemeticSettings::sample_size`] slots from one random offset.
pub fn memetic_sample<R: RandomSource + ?Sized>(
    budget: i64,
    population: &mut Population<'_>,
    crossover: &Crossover,
    settings: &MemeticSettings,
    rng: &mut R,
) -> Result<Score> {
    run_memetic(budget, population, crossover, settings, Refinement::Sample, rng)?;
    Ok(population.best_score())
}

/// Memetic cycle refining the [`MemeticSettings::sample_size`]
/// lowest-score individuals.
///
/// Targets are picked one at a time, each as the lowest score not yet
/// refined in this cycle, so an individual improved by local search is
/// ranked with its new score.
pub fn memetic_elite<R: RandomSource + ?Sized>(
    budget: i64,
    population: &mut Population<'_>,
    crossover: &Crossover,
    settings: &MemeticSettings,
    rng: &mut R,
) -> Result<Score> {
    run_memetic(budget, population, crossover, settings, Refinement::Elite, rng)?;
    Ok(population.best_score())
}

// ============================================================================
// Loops
// ============================================================================

fn run_generational<R: RandomSource + ?Sized>(
    population_size: usize,
    budget: i64,
    population: &mut Population<'_>,
    cross_rate: f64,
    crossover: &Crossover,
    mutation_rate: f64,
    rng: &mut R,
) -> Result<RunStats> {
    ensure_initialized(population)?;
    let n = to_units(population_size);
    let step_cost = (population_size as f64 * cross_rate) as i64;

    let mut budget = Budget::new(budget);
    let mut stats = RunStats::default();
    let mut window = STAGNATION_WINDOW;
    let mut guard = population.best_score();

    while budget.left() {
        population.evolve_generational(cross_rate, crossover, mutation_rate, rng)?;
        stats.steps += 1;

        if guard != population.best_score() {
            window = STAGNATION_WINDOW;
            guard = population.best_score();
        } else {
            window -= 1;
            if window == 0 {
                debug!(
                    "generational: no change for {STAGNATION_WINDOW} generations at {guard}, \
                     restarting"
                );
                population.restart(rng)?;
                stats.restarts += 1;
                window = STAGNATION_WINDOW;
                budget.charge(n);
                continue;
            }
        }

        if population.check_converged() {
            debug!("generational: population converged at {guard}, restarting");
            population.restart(rng)?;
            stats.restarts += 1;
            budget.charge(n - 1);
            continue;
        }

        budget.charge(step_cost);
        trace!(
            "generational: step {} best {} budget left {}",
            stats.steps,
            population.best_score(),
            budget.remaining
        );
    }

    stats.charged = budget.charged;
    Ok(stats)
}

fn run_steady_state<R: RandomSource + ?Sized>(
    population_size: usize,
    budget: i64,
    population: &mut Population<'_>,
    pair_count: usize,
    crossover: &Crossover,
    mutation_rate: f64,
    rng: &mut R,
) -> Result<RunStats> {
    ensure_initialized(population)?;
    let pairs = pair_count.max(1);
    let step_cost = to_units(pairs).saturating_mul(2);

    let mut budget = Budget::new(budget);
    let mut stats = RunStats::default();

    while budget.left() {
        population.evolve_steady_state(crossover, mutation_rate, pairs, rng)?;
        stats.steps += 1;

        if population.check_converged() {
            debug!(
                "steady-state: population converged at {}, restarting",
                population.best_score()
            );
            population.restart(rng)?;
            stats.restarts += 1;
            budget.charge(to_units(population_size) - 1);
            continue;
        }

        budget.charge(step_cost);
        trace!(
            "steady-state: step {} best {} budget left {}",
            stats.steps,
            population.best_score(),
            budget.remaining
        );
    }

    stats.charged = budget.charged;
    Ok(stats)
}

/// Which individuals a memetic cycle refines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Refinement {
    All,
    Sample,
    Elite,
}

fn run_memetic<R: RandomSource + ?Sized>(
    budget: i64,
    population: &mut Population<'_>,
    crossover: &Crossover,
    settings: &MemeticSettings,
    refinement: Refinement,
    rng: &mut R,
) -> Result<RunStats> {
    ensure_initialized(population)?;
    let search_cost = to_units(settings.local_search_budget);

    let mut budget = Budget::new(budget);
    let mut stats = RunStats::default();
    let mut window = settings.stagnation_window;
    let mut guard = population.best_score();

    while budget.left() {
        if window == 0 {
            debug!(
                "memetic: no improvement for {} cycles at {guard}, restarting",
                settings.stagnation_window
            );
            population.restart(rng)?;
            stats.restarts += 1;
            budget.charge(to_units(population.len()) - 1);
            window = settings.stagnation_window;
        }

        let burst = run_generational(
            settings.burst_population,
            settings.burst_budget,
            population,
            settings.cross_rate,
            crossover,
            settings.mutation_rate,
            rng,
        )?;
        stats.restarts += burst.restarts;
        budget.charge(settings.burst_budget);

        let n = population.len();
        let count = settings.sample_size(n);
        match refinement {
            Refinement::All => {
                for slot in 0..n {
                    refine(population, slot, settings.local_search_budget, rng)?;
                    budget.charge(search_cost);
                }
            }
            Refinement::Sample => {
                let start = rng.index(n);
                for i in 0..count {
                    refine(population, (start + i) % n, settings.local_search_budget, rng)?;
                    budget.charge(search_cost);
                }
            }
            Refinement::Elite => {
                let mut visited = vec![false; n];
                for _ in 0..count {
                    let Some(slot) = best_index_excluding(population.individuals(), &visited)
                    else {
                        break;
                    };
                    visited[slot] = true;
                    refine(population, slot, settings.local_search_budget, rng)?;
                    budget.charge(search_cost);
                }
            }
        }
        stats.steps += 1;

        if guard > population.best_score() {
            window = settings.stagnation_window;
            guard = population.best_score();
        } else {
            window = window.saturating_sub(1);
        }
        trace!(
            "memetic: cycle {} best {} budget left {}",
            stats.steps,
            guard,
            budget.remaining
        );
    }

    stats.charged = budget.charged;
    Ok(stats)
}

fn refine<R: RandomSource + ?Sized>(
    population: &mut Population<'_>,
    slot: usize,
    budget: usize,
    rng: &mut R,
) -> Result<()> {
    population.local_search_at(slot, budget, rng)?;
    population.update_best();
    Ok(())
}

// ============================================================================
// Runner
// ============================================================================

/// Outcome of [`Runner::run`].
#[derive(Debug, Clone)]
pub struct RunReport<'p> {
    /// Strategy that produced this report.
    pub strategy: Strategy,

    /// Best score of the initial population.
    pub initial_score: Score,

    /// Best score reached (same as `best.score()`).
    pub best_score: Score,

    /// The best individual reached.
    pub best: Individual<'p>,

    /// Top-level steps: generations, steady-state steps or memetic cycles.
    pub steps: u64,

    /// Population restarts, including those inside memetic bursts.
    pub restarts: u64,

    /// Budget units charged by the top-level loop.
    pub budget_charged: i64,
}

/// Builds a population and runs the configured driver on it.
///
/// # Usage
///
/// ```
/// use u_fap::drivers::{DriverConfig, Runner, Strategy};
/// use u_fap::problem::{FrequencySet, InterferenceEdge, Problem, Site};
///
/// let problem = Problem::build(
///     vec![FrequencySet::new(vec![10, 20, 30]), FrequencySet::new(vec![5, 15])],
///     vec![Site { id: 1, group: 0 }, Site { id: 2, group: 1 }],
///     vec![InterferenceEdge::new(0, 1, 5, 7)],
/// );
/// let config = DriverConfig::new(Strategy::Generational)
///     .with_population_size(10)
///     .with_budget(200)
///     .with_seed(42);
/// let report = Runner::run(&problem, &config).unwrap();
/// assert!(report.best_score <= report.initial_score);
/// ```
pub struct Runner;

impl Runner {
    /// Validates `config`, seeds a generator from `config.seed` and runs.
    pub fn run<'p>(problem: &'p Problem, config: &DriverConfig) -> Result<RunReport<'p>> {
        let mut rng = config
            .seed
            .map_or_else(SeededRng::from_entropy, SeededRng::new);
        Self::run_with_rng(problem, config, &mut rng)
    }

    /// Like [`run`](Self::run) with an explicit randomness source.
    /// `config.seed` is ignored.
    pub fn run_with_rng<'p, R: RandomSource + ?Sized>(
        problem: &'p Problem,
        config: &DriverConfig,
        rng: &mut R,
    ) -> Result<RunReport<'p>> {
        config.validate()?;

        let mut population =
            Population::new(problem).with_gene_mutation_rate(config.gene_mutation_rate);
        population.initialize_with(config.population_size, config.initializer, rng)?;
        let initial_score = population.best_score();

        let n = config.population_size;
        let stats = match config.strategy {
            Strategy::Generational => run_generational(
                n,
                config.budget,
                &mut population,
                config.cross_rate,
                &config.crossover,
                config.mutation_rate,
                rng,
            )?,
            Strategy::SteadyState => run_steady_state(
                n,
                config.budget,
                &mut population,
                config.pair_count,
                &config.crossover,
                config.mutation_rate,
                rng,
            )?,
            Strategy::MemeticAll => run_memetic(
                config.budget,
                &mut population,
                &config.crossover,
                &config.memetic,
                Refinement::All,
                rng,
            )?,
            Strategy::MemeticSample => run_memetic(
                config.budget,
                &mut population,
                &config.crossover,
                &config.memetic,
                Refinement::Sample,
                rng,
            )?,
            Strategy::MemeticElite => run_memetic(
                config.budget,
                &mut population,
                &config.crossover,
                &config.memetic,
                Refinement::Elite,
                rng,
            )?,
        };

        let best = population.get_best();
        debug!(
            "{:?}: {} -> {} in {} steps, {} restarts, {} budget charged",
            config.strategy,
            initial_score,
            best.score(),
            stats.steps,
            stats.restarts,
            stats.charged
        );

        Ok(RunReport {
            strategy: config.strategy,
            initial_score,
            best_score: best.score(),
            best,
            steps: stats.steps,
            restarts: stats.restarts,
            budget_charged: stats.charged,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
