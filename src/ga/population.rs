//! Population of individuals with generational and steady-state evolution.
//!
//! A [`Population`] owns its individuals and borrows the [`Problem`] they
//! are scored against. It tracks the slot of the current best individual
//! and provides the diversity check and restart used by the drivers.
//!
//! # Replacement models
//!
//! - **Generational**: the next generation is built in an offspring
//!   buffer and swapped in wholesale; the previous best survives by
//!   elitism.
//! - **Steady-state**: a small brood competes for the worst slots; each
//!   slot can be replaced at most once per step.

use super::individual::{Individual, DEFAULT_GREEDY_BIAS};
use super::operators::{mutate, Crossover};
use super::selection::{best_index, binary_tournament, worst_index};
use crate::error::{FapError, Result};
use crate::local_search::local_search;
use crate::problem::{Problem, Score};
use crate::random::RandomSource;
use std::collections::BTreeMap;
use std::mem;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Per-gene mutation probability used when none is configured.
pub const DEFAULT_GENE_MUTATION_RATE: f64 = 0.1;

/// How freshly created individuals are seeded.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Initializer {
    /// Uniformly random indices.
    #[default]
    Random,
    /// Right-to-left greedy with a random prefix; see [`Individual::greedy`].
    Greedy {
        /// Lower bound of the random prefix as a fraction of the sites.
        bias: f64,
    },
    /// Circular greedy from a random start; see [`Individual::full_greedy`].
    FullGreedy,
}

impl Initializer {
    /// Greedy seeding with the default bias fraction.
    pub fn greedy() -> Self {
        Initializer::Greedy {
            bias: DEFAULT_GREEDY_BIAS,
        }
    }
}

/// An ordered collection of individuals plus the index of the best one.
#[derive(Debug, Clone)]
pub struct Population<'p> {
    problem: &'p Problem,
    individuals: Vec<Individual<'p>>,
    offspring: Vec<Individual<'p>>,
    best: usize,
    gene_mutation_rate: f64,
}

impl<'p> Population<'p> {
    /// Creates an empty population for `problem`.
    pub fn new(problem: &'p Problem) -> Self {
        Self {
            problem,
            individuals: Vec::new(),
            offspring: Vec::new(),
            best: 0,
            gene_mutation_rate: DEFAULT_GENE_MUTATION_RATE,
        }
    }

    /// Sets the per-gene probability handed to the mutation operator.
    pub fn with_gene_mutation_rate(mut self, rate: f64) -> Self {
        self.gene_mutation_rate = rate;
        self
    }

    /// Replaces the contents with `n` random individuals.
    pub fn initialize<R: RandomSource + ?Sized>(&mut self, n: usize, rng: &mut R) -> Result<()> {
        self.initialize_with(n, Initializer::Random, rng)
    }

    /// Replaces the contents with `n` individuals seeded by `init`.
    ///
    /// Individuals are generated in slot order; with the `parallel`
    /// feature random individuals are then scored concurrently.
    pub fn initialize_with<R: RandomSource + ?Sized>(
        &mut self,
        n: usize,
        init: Initializer,
        rng: &mut R,
    ) -> Result<()> {
        if n == 0 {
            return Err(FapError::InvalidConfig("population size must be positive"));
        }

        let problem = self.problem;
        self.individuals = match init {
            Initializer::Random => {
                let mut fresh: Vec<_> = (0..n)
                    .map(|_| Individual::random_unevaluated(problem, rng))
                    .collect();
                evaluate_all(&mut fresh)?;
                fresh
            }
            Initializer::Greedy { bias } => (0..n)
                .map(|_| Individual::greedy(problem, bias, rng))
                .collect::<Result<_>>()?,
            Initializer::FullGreedy => (0..n)
                .map(|_| Individual::full_greedy(problem, rng))
                .collect::<Result<_>>()?,
        };
        self.offspring.clear();
        self.update_best();
        Ok(())
    }

    /// Rescans the population and stores the slot of the lowest score
    /// (first occurrence on ties).
    pub fn update_best(&mut self) {
        self.best = best_index(&self.individuals);
    }

    /// One generation of tournament selection, crossover, mutation and
    /// elitist replacement.
    ///
    /// `round(n * cross_rate)` parents (rounded up to even) are picked by
    /// binary tournament from the current generation. Their slots in a copy
    /// of the generation are recombined pairwise and re-scored once each.
    /// Then `round(n * mutation_rate)` random slots of the copy are mutated
    /// and re-scored. If the previous best is no longer found unchanged at
    /// its slot, it overwrites the worst slot of the copy. The copy then
    /// becomes the population.
    ///
    /// A zero parent count leaves the population untouched.
    pub fn evolve_generational<R: RandomSource + ?Sized>(
        &mut self,
        cross_rate: f64,
        crossover: &Crossover,
        mutation_rate: f64,
        rng: &mut R,
    ) -> Result<()> {
        let n = self.individuals.len();
        let mut parents = (n as f64 * cross_rate).round().max(0.0) as usize;
        if parents % 2 == 1 {
            parents += 1;
        }
        if n == 0 || parents == 0 {
            return Ok(());
        }

        let selected: Vec<usize> = (0..parents)
            .map(|_| binary_tournament(&self.individuals, rng))
            .collect();

        self.offspring.clone_from(&self.individuals);
        let mut touched = vec![false; n];
        for pair in selected.chunks_exact(2) {
            let (a, b) = (pair[0], pair[1]);
            if a == b {
                // Recombining a slot with itself leaves it unchanged but
                // still consumes the operator's draws.
                let mut twin = self.offspring[a].clone();
                crossover.apply(&mut self.offspring[a], &mut twin, rng);
            } else {
                let (x, y) = pair_mut(&mut self.offspring, a, b);
                crossover.apply(x, y, rng);
            }
            touched[a] = true;
            touched[b] = true;
        }
        evaluate_marked(&mut self.offspring, &touched)?;

        let mutants = (n as f64 * mutation_rate).round().max(0.0) as usize;
        for _ in 0..mutants {
            let slot = rng.index(n);
            mutate(&mut self.offspring[slot], self.gene_mutation_rate, rng);
            self.offspring[slot].evaluate()?;
        }

        let elite = &self.individuals[self.best];
        if self.offspring[self.best] != *elite {
            if let Some(worst) = worst_index(&self.offspring, &[]) {
                self.offspring[worst] = elite.clone();
            }
        }

        mem::swap(&mut self.individuals, &mut self.offspring);
        self.update_best();
        Ok(())
    }

    /// One steady-state step.
    ///
    /// Draws `2 * pair_count` individuals with replacement (`pair_count`
    /// of 0 counts as 1), recombines them in consecutive pairs, mutates
    /// each with probability `mutation_rate` and scores them. In draw
    /// order, each offspring then targets the worst slot not yet targeted
    /// in this step. If it beats the best score the best index moves to
    /// that slot, and the slot is replaced when the offspring is strictly
    /// better than its occupant.
    pub fn evolve_steady_state<R: RandomSource + ?Sized>(
        &mut self,
        crossover: &Crossover,
        mutation_rate: f64,
        pair_count: usize,
        rng: &mut R,
    ) -> Result<()> {
        let n = self.individuals.len();
        if n == 0 {
            return Ok(());
        }
        let pairs = pair_count.max(1);

        let mut brood: Vec<Individual<'p>> = (0..2 * pairs)
            .map(|_| self.individuals[rng.index(n)].clone())
            .collect();
        for pair in brood.chunks_exact_mut(2) {
            let (a, b) = pair.split_at_mut(1);
            crossover.apply(&mut a[0], &mut b[0], rng);
        }
        for child in brood.iter_mut() {
            if rng.chance(mutation_rate) {
                mutate(child, self.gene_mutation_rate, rng);
            }
        }
        evaluate_all(&mut brood)?;

        let mut targeted = vec![false; n];
        for child in brood {
            let Some(slot) = worst_index(&self.individuals, &targeted) else {
                break;
            };
            targeted[slot] = true;
            if child.score() < self.individuals[self.best].score() {
                self.best = slot;
            }
            if child.score() < self.individuals[slot].score() {
                self.individuals[slot] = child;
            }
        }
        Ok(())
    }

    /// `true` when some group of equal individuals (same score and same
    /// frequencies) holds at least `ceil(0.8 * n)` members.
    pub fn check_converged(&self) -> bool {
        let n = self.individuals.len();
        if n == 0 {
            return false;
        }
        let threshold = (4 * n).div_ceil(5);
        let mut groups: BTreeMap<&Individual<'p>, usize> = BTreeMap::new();
        for ind in &self.individuals {
            let count = groups.entry(ind).or_insert(0);
            *count += 1;
            if *count >= threshold {
                return true;
            }
        }
        false
    }

    /// Keeps the best individual in slot 0 and regenerates every other
    /// slot at random, in slot order.
    pub fn restart<R: RandomSource + ?Sized>(&mut self, rng: &mut R) -> Result<()> {
        let n = self.individuals.len();
        if n == 0 {
            return Ok(());
        }
        self.individuals.swap(0, self.best);
        for slot in 1..n {
            self.individuals[slot] = Individual::random_unevaluated(self.problem, rng);
        }
        evaluate_all(&mut self.individuals[1..])?;
        self.update_best();
        Ok(())
    }

    /// Runs [`local_search`] on slot `i`. The best index is not updated.
    ///
    /// # Panics
    /// Panics if `i` is out of range.
    pub fn local_search_at<R: RandomSource + ?Sized>(
        &mut self,
        i: usize,
        budget: usize,
        rng: &mut R,
    ) -> Result<Score> {
        local_search(&mut self.individuals[i], budget, rng)
    }

    /// The current best individual.
    ///
    /// # Panics
    /// Panics if the population is empty.
    pub fn best(&self) -> &Individual<'p> {
        &self.individuals[self.best]
    }

    /// A copy of the current best individual.
    pub fn get_best(&self) -> Individual<'p> {
        self.best().clone()
    }

    /// Score of the current best individual.
    pub fn best_score(&self) -> Score {
        self.best().score()
    }

    /// Slot of the current best individual.
    pub fn best_index(&self) -> usize {
        self.best
    }

    /// All individuals, in slot order.
    pub fn individuals(&self) -> &[Individual<'p>] {
        &self.individuals
    }

    /// Number of individuals.
    pub fn len(&self) -> usize {
        self.individuals.len()
    }

    /// Returns `true` before initialization.
    pub fn is_empty(&self) -> bool {
        self.individuals.is_empty()
    }

    /// The problem this population is scored against.
    pub fn problem(&self) -> &'p Problem {
        self.problem
    }
}

/// Two distinct mutable slots of `v`.
fn pair_mut<T>(v: &mut [T], a: usize, b: usize) -> (&mut T, &mut T) {
    debug_assert_ne!(a, b);
    if a < b {
        let (left, right) = v.split_at_mut(b);
        (&mut left[a], &mut right[0])
    } else {
        let (left, right) = v.split_at_mut(a);
        (&mut right[0], &mut left[b])
    }
}

fn evaluate_all(inds: &mut [Individual<'_>]) -> Result<()> {
    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        inds.par_iter_mut()
            .try_for_each(|ind| ind.evaluate().map(drop))
    }
    #[cfg(not(feature = "parallel"))]
    {
        inds.iter_mut().try_for_each(|ind| ind.evaluate().map(drop))
    }
}

fn evaluate_marked(inds: &mut [Individual<'_>], marked: &[bool]) -> Result<()> {
    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        inds.par_iter_mut()
            .zip(marked.par_iter())
            .filter(|(_, m)| **m)
            .try_for_each(|(ind, _)| ind.evaluate().map(drop))
    }
    #[cfg(not(feature = "parallel"))]
    {
        inds.iter_mut()
            .zip(marked)
            .filter(|(_, m)| **m)
            .try_for_each(|(ind, _)| ind.evaluate().map(drop))
    }
}
