//! Driver configuration.
//!
//! [`DriverConfig`] selects a [`Strategy`] and holds every parameter the
//! drivers consume. [`MemeticSettings`] holds the fixed inner burst used by
//! the memetic strategies.

use crate::error::{FapError, Result};
use crate::ga::{Crossover, Initializer, DEFAULT_GENE_MUTATION_RATE};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Search strategy run by [`Runner`](super::Runner).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Strategy {
    /// Generational GA with elitism, stagnation and convergence restarts.
    #[default]
    Generational,
    /// Steady-state GA with convergence restarts.
    SteadyState,
    /// Memetic: local search on every individual after each burst.
    MemeticAll,
    /// Memetic: local search on a random contiguous sample of slots.
    MemeticSample,
    /// Memetic: local search on the lowest-score individuals.
    MemeticElite,
}

impl Strategy {
    /// All strategies, in declaration order.
    pub const ALL: [Strategy; 5] = [
        Strategy::Generational,
        Strategy::SteadyState,
        Strategy::MemeticAll,
        Strategy::MemeticSample,
        Strategy::MemeticElite,
    ];

    /// `true` for the three memetic variants.
    pub fn is_memetic(self) -> bool {
        matches!(
            self,
            Strategy::MemeticAll | Strategy::MemeticSample | Strategy::MemeticElite
        )
    }
}

/// Parameters of the memetic cycle.
///
/// Each cycle runs a short generational burst on the whole population,
/// charged as `burst_budget`, then refines some individuals with local
/// search, each charged `local_search_budget`.
///
/// # Defaults
///
/// ```
/// use u_fap::drivers::MemeticSettings;
///
/// let s = MemeticSettings::default();
/// assert_eq!(s.burst_population, 20);
/// assert_eq!(s.burst_budget, 140);
/// assert_eq!(s.local_search_budget, 200);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MemeticSettings {
    /// Nominal population size the burst charges its steps against.
    pub burst_population: usize,

    /// Budget of the generational burst.
    pub burst_budget: i64,

    /// Crossover rate of the burst.
    pub cross_rate: f64,

    /// Mutation rate of the burst.
    pub mutation_rate: f64,

    /// Budget of one local search run.
    pub local_search_budget: usize,

    /// Cycles without improvement before the population restarts.
    pub stagnation_window: u32,

    /// Fraction of the population refined by the sample and elite
    /// variants. The count is rounded up.
    pub sample_fraction: f64,
}

impl Default for MemeticSettings {
    fn default() -> Self {
        Self {
            burst_population: 20,
            burst_budget: 140,
            cross_rate: 0.7,
            mutation_rate: 0.1,
            local_search_budget: 200,
            stagnation_window: 2,
            sample_fraction: 0.1,
        }
    }
}

impl MemeticSettings {
    /// Sets the burst budget.
    pub fn with_burst_budget(mut self, budget: i64) -> Self {
        self.burst_budget = budget;
        self
    }

    /// Sets the local search budget.
    pub fn with_local_search_budget(mut self, budget: usize) -> Self {
        self.local_search_budget = budget;
        self
    }

    /// Sets the refined fraction for the sample and elite variants.
    pub fn with_sample_fraction(mut self, fraction: f64) -> Self {
        self.sample_fraction = fraction;
        self
    }

    /// Sets the stagnation window in cycles.
    pub fn with_stagnation_window(mut self, cycles: u32) -> Self {
        self.stagnation_window = cycles;
        self
    }

    /// Number of individuals refined per cycle out of `n`.
    pub fn sample_size(&self, n: usize) -> usize {
        ((n as f64 * self.sample_fraction).ceil() as usize).min(n)
    }

    /// Validates the settings.
    pub fn validate(&self) -> Result<()> {
        if !(self.sample_fraction > 0.0 && self.sample_fraction <= 1.0) {
            return Err(FapError::InvalidConfig(
                "memetic sample_fraction must be in (0, 1]",
            ));
        }
        if !(0.0..=1.0).contains(&self.cross_rate) || !(0.0..=1.0).contains(&self.mutation_rate) {
            return Err(FapError::InvalidConfig(
                "memetic burst rates must be in [0, 1]",
            ));
        }
        if self.stagnation_window == 0 {
            return Err(FapError::InvalidConfig(
                "memetic stagnation_window must be at least 1",
            ));
        }
        Ok(())
    }
}

/// Configuration for one optimization run.
///
/// # Defaults
///
/// ```
/// use u_fap::drivers::{DriverConfig, Strategy};
///
/// let config = DriverConfig::default();
/// assert_eq!(config.strategy, Strategy::Generational);
/// assert_eq!(config.population_size, 50);
/// assert_eq!(config.budget, 20_000);
/// ```
///
/// # Builder Pattern
///
/// ```
/// use u_fap::drivers::{DriverConfig, Strategy};
/// use u_fap::ga::Crossover;
///
/// let config = DriverConfig::new(Strategy::SteadyState)
///     .with_population_size(30)
///     .with_pair_count(2)
///     .with_crossover(Crossover::blx())
///     .with_seed(42);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DriverConfig {
    /// Strategy to run.
    pub strategy: Strategy,

    /// Number of individuals.
    pub population_size: usize,

    /// Evaluation budget. The driver loop runs while it is non-negative.
    pub budget: i64,

    /// Fraction of the population selected as parents per generation.
    pub cross_rate: f64,

    /// Crossover operator.
    pub crossover: Crossover,

    /// Generational: fraction of children mutated.
    /// Steady-state: probability that an offspring is mutated.
    pub mutation_rate: f64,

    /// Steady-state: pairs bred per step.
    pub pair_count: usize,

    /// Per-gene probability passed to the mutation operator.
    pub gene_mutation_rate: f64,

    /// Seeding of the initial population.
    pub initializer: Initializer,

    /// Memetic cycle parameters.
    pub memetic: MemeticSettings,

    /// Random seed. `None` seeds from the operating system.
    pub seed: Option<u64>,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::default(),
            population_size: 50,
            budget: 20_000,
            cross_rate: 0.7,
            crossover: Crossover::default(),
            mutation_rate: 0.1,
            pair_count: 1,
            gene_mutation_rate: DEFAULT_GENE_MUTATION_RATE,
            initializer: Initializer::default(),
            memetic: MemeticSettings::default(),
            seed: None,
        }
    }
}

impl DriverConfig {
    /// Default parameters for `strategy`.
    pub fn new(strategy: Strategy) -> Self {
        Self {
            strategy,
            ..Self::default()
        }
    }

    /// Preset for the memetic strategies: a population of 20, matching
    /// the nominal burst size.
    pub fn memetic(strategy: Strategy) -> Self {
        Self {
            strategy,
            population_size: 20,
            ..Self::default()
        }
    }

    /// Sets the strategy.
    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Sets the population size.
    pub fn with_population_size(mut self, n: usize) -> Self {
        self.population_size = n;
        self
    }

    /// Sets the evaluation budget.
    pub fn with_budget(mut self, budget: i64) -> Self {
        self.budget = budget;
        self
    }

    /// Sets the crossover rate.
    pub fn with_cross_rate(mut self, rate: f64) -> Self {
        self.cross_rate = rate;
        self
    }

    /// Sets the crossover operator.
    pub fn with_crossover(mut self, crossover: Crossover) -> Self {
        self.crossover = crossover;
        self
    }

    /// Sets the mutation rate.
    pub fn with_mutation_rate(mut self, rate: f64) -> Self {
        self.mutation_rate = rate;
        self
    }

    /// Sets the steady-state pair count.
    pub fn with_pair_count(mut self, pairs: usize) -> Self {
        self.pair_count = pairs;
        self
    }

    /// Sets the per-gene mutation probability.
    pub fn with_gene_mutation_rate(mut self, rate: f64) -> Self {
        self.gene_mutation_rate = rate;
        self
    }

    /// Sets the initializer.
    pub fn with_initializer(mut self, initializer: Initializer) -> Self {
        self.initializer = initializer;
        self
    }

    /// Sets the memetic settings.
    pub fn with_memetic(mut self, memetic: MemeticSettings) -> Self {
        self.memetic = memetic;
        self
    }

    /// Sets the random seed for reproducibility.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.population_size == 0 {
            return Err(FapError::InvalidConfig("population_size must be positive"));
        }
        let unit = 0.0..=1.0;
        if !unit.contains(&self.cross_rate) {
            return Err(FapError::InvalidConfig("cross_rate must be in [0, 1]"));
        }
        if !unit.contains(&self.mutation_rate) {
            return Err(FapError::InvalidConfig("mutation_rate must be in [0, 1]"));
        }
        if !unit.contains(&self.gene_mutation_rate) {
            return Err(FapError::InvalidConfig(
                "gene_mutation_rate must be in [0, 1]",
            ));
        }
        if let Crossover::Blx { alpha } = self.crossover {
            if !(alpha >= 0.0 && alpha.is_finite()) {
                return Err(FapError::InvalidConfig("BLX alpha must be non-negative"));
            }
        }
        if self.strategy.is_memetic() {
            self.memetic.validate()?;
        }
        Ok(())
    }
}
