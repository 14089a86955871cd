//! Randomness source shared by every stochastic component.
//!
//! All draws of a run go through one [`RandomSource`], passed by `&mut`.
//! The order in which components draw is deterministic, so a seeded
//! [`SeededRng`] replays a run exactly.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Number of integer buckets used to turn a probability into a draw.
const CHANCE_RESOLUTION: usize = 1 << 24;

/// A uniform integer generator.
///
/// Implementors provide a single primitive, [`int_in`](Self::int_in).
/// Everything else is derived from it so that a scripted source in tests
/// sees exactly one call per logical draw.
pub trait RandomSource {
    /// Returns an integer uniformly distributed in `lo..=hi`.
    ///
    /// Returns `lo` when `lo >= hi`.
    fn int_in(&mut self, lo: usize, hi: usize) -> usize;

    /// Returns an index uniformly distributed in `0..n`.
    ///
    /// `n` must be non-zero.
    fn index(&mut self, n: usize) -> usize {
        debug_assert!(n > 0, "cannot draw an index from an empty range");
        self.int_in(0, n.saturating_sub(1))
    }

    /// Bernoulli trial with success probability `p`.
    ///
    /// Always consumes one draw, even for `p <= 0` or `p >= 1`.
    fn chance(&mut self, p: f64) -> bool {
        let draw = self.int_in(0, CHANCE_RESOLUTION - 1);
        (draw as f64) < p * CHANCE_RESOLUTION as f64
    }
}

impl<T: RandomSource + ?Sized> RandomSource for &mut T {
    fn int_in(&mut self, lo: usize, hi: usize) -> usize {
        (**self).int_in(lo, hi)
    }
}

/// Seeded [`RandomSource`] backed by `rand`'s `StdRng`.
#[derive(Debug, Clone)]
pub struct SeededRng {
    rng: StdRng,
}

impl SeededRng {
    /// Creates a generator from a fixed seed.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Creates a generator seeded from the operating system.
    pub fn from_entropy() -> Self {
        Self::new(rand::random())
    }
}

impl RandomSource for SeededRng {
    fn int_in(&mut self, lo: usize, hi: usize) -> usize {
        if lo >= hi {
            return lo;
        }
        self.rng.random_range(lo..=hi)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::RandomSource;
    use std::collections::VecDeque;

    /// Replays a fixed list of draws, clamped into the requested range.
    ///
    /// Records every request so tests can assert on draw order.
    #[derive(Debug, Default)]
    pub(crate) struct ScriptedRng {
        script: VecDeque<usize>,
        pub(crate) requests: Vec<(usize, usize)>,
    }

    impl ScriptedRng {
        pub(crate) fn new(script: &[usize]) -> Self {
            Self {
                script: script.iter().copied().collect(),
                requests: Vec::new(),
            }
        }
    }

    impl RandomSource for ScriptedRng {
        fn int_in(&mut self, lo: usize, hi: usize) -> usize {
            self.requests.push((lo, hi));
            let v = self.script.pop_front().unwrap_or(lo);
            v.clamp(lo, hi.max(lo))
        }
    }
}
