//! Crossover and mutation operators on frequency-index assignments.
//!
//! Operators work through the [`Assignment`] trait and rewrite genes in
//! place. None of them updates scores: the caller re-evaluates every
//! individual an operator touched.
//!
//! # Crossover Operators
//!
//! - [`segment_crossover`]: swap one circular run of genes between parents
//! - [`blx_crossover`]: BLX-α on frequency indices, clamped to each
//!   site's range
//!
//! # Mutation
//!
//! - [`mutate`]: random reset of a number of genes derived from the
//!   mutation probability
//!
//! # References
//!
//! - Eshelman & Schaffer (1993), "Real-Coded Genetic Algorithms and
//!   Interval-Schemata" (BLX-α)

use super::types::Assignment;
use crate::random::RandomSource;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Crossover variant used by the population.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Crossover {
    /// Segment exchange ("two point" crossover).
    ///
    /// `max_length: None` means one third of the genome.
    Segment {
        /// Shortest run swapped.
        min_length: usize,
        /// Longest run swapped.
        max_length: Option<usize>,
    },

    /// Blend crossover on frequency indices.
    Blx {
        /// Interval expansion factor.
        alpha: f64,
    },
}

impl Default for Crossover {
    fn default() -> Self {
        Self::segment()
    }
}

impl Crossover {
    /// Segment exchange with runs of `1..=n/3` genes.
    pub fn segment() -> Self {
        Crossover::Segment {
            min_length: 1,
            max_length: None,
        }
    }

    /// BLX with `alpha = 0.1`.
    pub fn blx() -> Self {
        Crossover::Blx { alpha: 0.1 }
    }

    /// Recombines `a` and `b` in place.
    pub fn apply<A: Assignment, R: RandomSource + ?Sized>(
        &self,
        a: &mut A,
        b: &mut A,
        rng: &mut R,
    ) {
        match *self {
            Crossover::Segment {
                min_length,
                max_length,
            } => segment_crossover(a, b, min_length, max_length, rng),
            Crossover::Blx { alpha } => blx_crossover(a, b, alpha, rng),
        }
    }
}

// ============================================================================
// Crossover operators
// ============================================================================

/// Swaps a circular run of genes between two assignments.
///
/// Draws the start position in `0..n`, then the run length in
/// `[min_length, max_length]`. A missing or zero `max_length` defaults to
/// `n / 3`; the upper bound is raised to `min_length` if needed and capped
/// at `n`.
///
/// # Panics
/// Panics if the parents have different lengths.
pub fn segment_crossover<A: Assignment, R: RandomSource + ?Sized>(
    a: &mut A,
    b: &mut A,
    min_length: usize,
    max_length: Option<usize>,
    rng: &mut R,
) {
    let n = a.site_count();
    assert_eq!(n, b.site_count(), "parents must have equal length");
    if n == 0 {
        return;
    }

    let max = max_length
        .filter(|&m| m > 0)
        .unwrap_or(n / 3)
        .max(min_length)
        .min(n);
    let min = min_length.min(max);

    let start = rng.index(n);
    let length = rng.int_in(min, max);
    for i in 0..length {
        let pos = (start + i) % n;
        let kept = a.gene(pos);
        a.set_gene(pos, b.gene(pos));
        b.set_gene(pos, kept);
    }
}

/// BLX-α crossover on frequency indices.
///
/// For every site where the parents differ by `d > 0`, both children are
/// redrawn uniformly from `[min - α·d, max + α·d]`, rounded inwards and
/// clamped to `[0, range - 1]`. Child `a` draws before child `b`.
///
/// # Panics
/// Panics if the parents have different lengths.
pub fn blx_crossover<A: Assignment, R: RandomSource + ?Sized>(
    a: &mut A,
    b: &mut A,
    alpha: f64,
    rng: &mut R,
) {
    let n = a.site_count();
    assert_eq!(n, b.site_count(), "parents must have equal length");

    for site in 0..n {
        let (x, y) = (a.gene(site), b.gene(site));
        let d = x.abs_diff(y);
        if d == 0 {
            continue;
        }
        let spread = alpha.max(0.0) * d as f64;
        let top = a.range_size(site).saturating_sub(1);
        let lo = (x.min(y) as f64 - spread).ceil().max(0.0) as usize;
        let hi = ((x.max(y) as f64 + spread).floor() as usize).min(top);

        a.set_gene(site, rng.int_in(lo, hi));
        b.set_gene(site, rng.int_in(lo, hi));
    }
}

// ============================================================================
// Mutation
// ============================================================================

/// Resets random genes to fresh uniform indices. Returns the number of
/// gene slots rewritten (a site hit twice counts twice).
///
/// The expected count is `e = round((n - 1) * probability)`. When `e` is
/// zero every gene gets its own Bernoulli trial at `probability`;
/// otherwise exactly `e` sites are drawn with replacement. Each new index
/// comes from the mutated site's own range.
pub fn mutate<A: Assignment, R: RandomSource + ?Sized>(
    ind: &mut A,
    probability: f64,
    rng: &mut R,
) -> usize {
    let n = ind.site_count();
    if n == 0 {
        return 0;
    }

    let expected = ((n - 1) as f64 * probability).round().max(0.0) as usize;
    if expected == 0 {
        let mut touched = 0;
        for site in 0..n {
            if rng.chance(probability) {
                let index = rng.index(ind.range_size(site));
                ind.set_gene(site, index);
                touched += 1;
            }
        }
        touched
    } else {
        for _ in 0..expected {
            let site = rng.index(n);
            let index = rng.index(ind.range_size(site));
            ind.set_gene(site, index);
        }
        expected
    }
}

// ============================================================================
// Tests
// ============================================================================
