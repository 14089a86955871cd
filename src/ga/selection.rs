//! Selection and ranking scans over a slice of individuals.
//!
//! All helpers assume **minimization** (lower score = better) and break
//! ties deterministically, so that a seeded run replays exactly.
//!
//! # References
//!
//! - Goldberg & Deb (1991), "A Comparative Analysis of Selection Schemes
//!   Used in Genetic Algorithms"

use super::Individual;
use crate::random::RandomSource;

/// Binary tournament over two distinct random slots.
///
/// The first candidate wins only if its score is strictly lower; ties go
/// to the second. A population of one always yields slot 0 and draws
/// nothing.
///
/// # Panics
/// Panics if `population` is empty.
pub fn binary_tournament<R: RandomSource + ?Sized>(
    population: &[Individual<'_>],
    rng: &mut R,
) -> usize {
    assert!(
        !population.is_empty(),
        "cannot select from empty population"
    );
    let n = population.len();
    if n < 2 {
        return 0;
    }

    let first = rng.index(n);
    // Second draw skips `first` by shifting the upper part of the range.
    let mut second = rng.index(n - 1);
    if second >= first {
        second += 1;
    }

    if population[first].score() < population[second].score() {
        first
    } else {
        second
    }
}

/// Slot of the lowest score; first occurrence on ties.
///
/// Returns 0 for an empty slice.
pub fn best_index(population: &[Individual<'_>]) -> usize {
    let mut best = 0;
    for (i, ind) in population.iter().enumerate().skip(1) {
        if ind.score() < population[best].score() {
            best = i;
        }
    }
    best
}

/// Slot of the lowest score among those with `skip[i] == false`; first
/// occurrence on ties. `None` if every slot is skipped.
pub fn best_index_excluding(population: &[Individual<'_>], skip: &[bool]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (i, ind) in population.iter().enumerate() {
        if skip.get(i).copied().unwrap_or(false) {
            continue;
        }
        match best {
            Some(b) if population[b].score() <= ind.score() => {}
            _ => best = Some(i),
        }
    }
    best
}

/// Slot of the highest score among those with `skip[i] == false`; first
/// occurrence on ties. `None` if every slot is skipped.
pub fn worst_index(population: &[Individual<'_>], skip: &[bool]) -> Option<usize> {
    let mut worst: Option<usize> = None;
    for (i, ind) in population.iter().enumerate() {
        if skip.get(i).copied().unwrap_or(false) {
            continue;
        }
        match worst {
            Some(w) if population[w].score() >= ind.score() => {}
            _ => worst = Some(i),
        }
    }
    worst
}
