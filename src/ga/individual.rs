//! Candidate frequency assignment with an incrementally maintained score.
//!
//! An [`Individual`] stores one frequency *index* per site and the cached
//! interference score of that assignment. Frequencies are always derived
//! from the index through the [`Problem`], so index and frequency can never
//! disagree.
//!
//! # Incremental cost model
//!
//! Changing one site only affects the edges touching it. The *local cost*
//! of a site under a candidate index is the penalty sum of the violated
//! edges in its outgoing window plus the violated edges in its incoming
//! list. Each edge touching the site appears exactly once in that union, so
//!
//! ```text
//! score' = score - local_cost(site, old) + local_cost(site, new)
//! ```
//!
//! is exact and costs O(degree) instead of O(edges).
//!
//! The greedy initializers use *directional* windows instead: they only
//! count edges whose other endpoint has already been fixed.

use super::types::Assignment;
use crate::error::{self, Result};
use crate::problem::{Frequency, Problem, Score};
use crate::random::RandomSource;
use std::cmp::Ordering;
use std::fmt;

/// Default fraction of sites that the greedy initializer may leave random.
pub const DEFAULT_GREEDY_BIAS: f64 = 1.0 / 3.0;

/// One candidate solution: a frequency index per site plus its score.
#[derive(Clone)]
pub struct Individual<'p> {
    problem: &'p Problem,
    genes: Vec<usize>,
    score: Score,
}

impl<'p> Individual<'p> {
    /// Uniformly random assignment, evaluated.
    ///
    /// Draws one index per site in ascending site order.
    pub fn random<R: RandomSource + ?Sized>(problem: &'p Problem, rng: &mut R) -> Result<Self> {
        let mut ind = Self::random_unevaluated(problem, rng);
        ind.evaluate()?;
        Ok(ind)
    }

    /// Random genes with a zero placeholder score.
    pub(crate) fn random_unevaluated<R: RandomSource + ?Sized>(
        problem: &'p Problem,
        rng: &mut R,
    ) -> Self {
        let genes = (0..problem.site_count())
            .map(|site| rng.index(problem.range_size(site)))
            .collect();
        Self {
            problem,
            genes,
            score: 0,
        }
    }

    /// Greedy assignment built from the highest site index down.
    ///
    /// A random count `limit` in `[floor(n * bias_fraction), n - 1]` is drawn
    /// first. The first `limit` sites visited get random indices; every later
    /// site takes the index that minimizes the penalty of its outgoing edges
    /// towards higher (already assigned) sites.
    pub fn greedy<R: RandomSource + ?Sized>(
        problem: &'p Problem,
        bias_fraction: f64,
        rng: &mut R,
    ) -> Result<Self> {
        let n = problem.site_count();
        let mut ind = Self::blank(problem);
        if n > 0 {
            let lo = ((n as f64 * bias_fraction.clamp(0.0, 1.0)) as usize).min(n - 1);
            let limit = rng.int_in(lo, n - 1);
            for (visited, site) in (0..n).rev().enumerate() {
                let index = if visited < limit {
                    rng.index(problem.range_size(site))
                } else {
                    ind.cheapest_index(site, |other| other > site, false)?
                };
                ind.genes[site] = index;
            }
        }
        ind.evaluate()?;
        Ok(ind)
    }

    /// Greedy assignment grown circularly from a random start site.
    ///
    /// The start site gets a random index. Each following site takes the
    /// index minimizing the penalty against every site already fixed on the
    /// arc from the start up to itself, through both its outgoing and
    /// incoming edges.
    pub fn full_greedy<R: RandomSource + ?Sized>(
        problem: &'p Problem,
        rng: &mut R,
    ) -> Result<Self> {
        let n = problem.site_count();
        let mut ind = Self::blank(problem);
        if n > 0 {
            let start = rng.index(n);
            ind.genes[start] = rng.index(problem.range_size(start));

            let mut head = (start + 1) % n;
            while head != start {
                let filled = (head + n - start) % n;
                let on_arc = |site: usize| (site + n - start) % n < filled;
                ind.genes[head] = ind.cheapest_index(head, on_arc, true)?;
                head = (head + 1) % n;
            }
        }
        ind.evaluate()?;
        Ok(ind)
    }

    /// Wraps an explicit assignment and evaluates it.
    ///
    /// Indices are reduced modulo each site's range size.
    ///
    /// # Panics
    /// Panics if `genes` does not have one entry per site.
    pub fn from_assignment(problem: &'p Problem, genes: Vec<usize>) -> Result<Self> {
        assert_eq!(
            genes.len(),
            problem.site_count(),
            "assignment must have one index per site"
        );
        let genes = genes
            .into_iter()
            .enumerate()
            .map(|(site, index)| index % problem.range_size(site))
            .collect();
        let mut ind = Self {
            problem,
            genes,
            score: 0,
        };
        ind.evaluate()?;
        Ok(ind)
    }

    fn blank(problem: &'p Problem) -> Self {
        Self {
            problem,
            genes: vec![0; problem.site_count()],
            score: 0,
        }
    }

    /// Recomputes the score from scratch over every edge and caches it.
    pub fn evaluate(&mut self) -> Result<Score> {
        let mut total: Score = 0;
        for edge in self.problem.edges() {
            if edge.violated(self.frequency_at(edge.first), self.frequency_at(edge.second)) {
                total = error::add(total, edge.penalty)?;
            }
        }
        self.score = total;
        Ok(total)
    }

    /// Score this individual would have after shifting `site`'s index by
    /// `offset` (modulo its range size).
    ///
    /// Nothing is modified.
    pub fn preview_change(&self, site: usize, offset: usize) -> Result<Score> {
        let current = self.local_cost(site, self.genes[site])?;
        let candidate = self.local_cost(site, self.shifted(site, offset))?;
        error::add(error::sub(self.score, current)?, candidate)
    }

    /// Shifts `site`'s index by `offset` and updates the score
    /// incrementally. Returns the new score.
    ///
    /// On overflow the individual is left untouched.
    pub fn commit_change(&mut self, site: usize, offset: usize) -> Result<Score> {
        let next = self.preview_change(site, offset)?;
        self.genes[site] = self.shifted(site, offset);
        self.score = next;
        Ok(next)
    }

    /// Cached interference score.
    pub fn score(&self) -> Score {
        self.score
    }

    /// Frequency indices, one per site.
    pub fn genes(&self) -> &[usize] {
        &self.genes
    }

    /// Assigned frequency values, in site order.
    pub fn frequencies(&self) -> impl Iterator<Item = Frequency> + '_ {
        (0..self.genes.len()).map(move |site| self.frequency_at(site))
    }

    /// The problem this individual belongs to.
    pub fn problem(&self) -> &'p Problem {
        self.problem
    }

    #[inline]
    fn frequency_at(&self, site: usize) -> Frequency {
        self.problem.frequency(site, self.genes[site])
    }

    fn shifted(&self, site: usize, offset: usize) -> usize {
        let range = self.problem.range_size(site);
        (self.genes[site] + offset % range) % range
    }

    /// Penalty of every edge touching `site` if it took frequency `index`.
    fn local_cost(&self, site: usize, index: usize) -> Result<Score> {
        self.cost_against(site, self.problem.frequency(site, index), |_| true, true)
    }

    /// Penalty of `site` at frequency `freq` against the sites accepted by
    /// `fixed`. Outgoing edges are always scanned; incoming ones only when
    /// `with_incoming` is set.
    fn cost_against(
        &self,
        site: usize,
        freq: Frequency,
        fixed: impl Fn(usize) -> bool,
        with_incoming: bool,
    ) -> Result<Score> {
        let mut cost: Score = 0;
        for edge in self.problem.outgoing(site) {
            if !fixed(edge.second) {
                continue;
            }
            let other = if edge.second == site {
                freq
            } else {
                self.frequency_at(edge.second)
            };
            if edge.violated(freq, other) {
                cost = error::add(cost, edge.penalty)?;
            }
        }
        if with_incoming {
            for edge in self.problem.incoming(site) {
                if fixed(edge.first) && edge.violated(freq, self.frequency_at(edge.first)) {
                    cost = error::add(cost, edge.penalty)?;
                }
            }
        }
        Ok(cost)
    }

    /// First index of minimal directional cost; stops early at zero.
    fn cheapest_index(
        &self,
        site: usize,
        fixed: impl Fn(usize) -> bool,
        with_incoming: bool,
    ) -> Result<usize> {
        let mut best = 0;
        let mut best_cost = Score::MAX;
        for index in 0..self.problem.range_size(site) {
            let freq = self.problem.frequency(site, index);
            let cost = self.cost_against(site, freq, &fixed, with_incoming)?;
            if cost < best_cost {
                best_cost = cost;
                best = index;
            }
            if best_cost == 0 {
                break;
            }
        }
        Ok(best)
    }
}

impl Assignment for Individual<'_> {
    fn site_count(&self) -> usize {
        self.genes.len()
    }

    fn range_size(&self, site: usize) -> usize {
        self.problem.range_size(site)
    }

    fn gene(&self, site: usize) -> usize {
        self.genes[site]
    }

    fn set_gene(&mut self, site: usize, index: usize) {
        debug_assert!(index < self.problem.range_size(site));
        self.genes[site] = index;
    }
}

impl PartialEq for Individual<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.score == other.score && self.frequencies().eq(other.frequencies())
    }
}

impl Eq for Individual<'_> {}

impl PartialOrd for Individual<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Individual<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.score
            .cmp(&other.score)
            .then_with(|| self.frequencies().cmp(other.frequencies()))
    }
}

impl fmt::Debug for Individual<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Individual")
            .field("score", &self.score)
            .field("genes", &self.genes)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FapError;
    use crate::problem::fixtures::{random_instance, three_sites};
    use crate::problem::{FrequencySet, InterferenceEdge, Site};
    use crate::random::testing::ScriptedRng;
    use crate::random::SeededRng;
    use proptest::prelude::*;

    fn overflow_problem() -> Problem {
        Problem::build(
            vec![FrequencySet::new(vec![0, 100])],
            (0..3).map(|i| Site { id: i, group: 0 }).collect(),
            vec![
                InterferenceEdge::new(0, 1, 10, Score::MAX),
                InterferenceEdge::new(0, 2, 10, Score::MAX),
            ],
        )
    }

    // ---- Scenario from the three-site instance ----

    #[test]
    fn test_bound_is_exclusive() {
        let p = three_sites();
        let ind = Individual::from_assignment(&p, vec![0, 0, 0]).unwrap();
        assert_eq!(ind.frequencies().collect::<Vec<_>>(), vec![10, 5, 100]);
        assert_eq!(ind.score(), 0);
    }

    #[test]
    fn test_commit_matches_full_evaluation() {
        let p = three_sites();
        let mut ind = Individual::from_assignment(&p, vec![0, 0, 0]).unwrap();
        assert_eq!(ind.commit_change(0, 2).unwrap(), 7);
        assert_eq!(ind.frequencies().next(), Some(30));

        let full = Individual::from_assignment(&p, vec![2, 0, 0]).unwrap();
        assert_eq!(full.score(), 7);
        assert_eq!(ind.clone().evaluate().unwrap(), 7);
        assert_eq!(ind, full);
    }

    #[test]
    fn test_commit_from_second_endpoint() {
        let p = three_sites();
        let mut ind = Individual::from_assignment(&p, vec![2, 0, 0]).unwrap();
        // 30 vs 15: still violated
        assert_eq!(ind.commit_change(1, 1).unwrap(), 7);
        // back to 10 vs 15: satisfied
        assert_eq!(ind.commit_change(0, 1).unwrap(), 0);
        assert_eq!(ind.clone().evaluate().unwrap(), 0);
    }

    #[test]
    fn test_preview_has_no_side_effect() {
        let p = three_sites();
        let ind = Individual::from_assignment(&p, vec![0, 1, 0]).unwrap();
        let before = ind.clone();
        let a = ind.preview_change(0, 2).unwrap();
        let b = ind.preview_change(0, 2).unwrap();
        assert_eq!(a, b);
        assert_eq!(ind.genes(), before.genes());
        assert_eq!(ind.score(), before.score());
    }

    #[test]
    fn test_offset_wraps() {
        let p = three_sites();
        let mut ind = Individual::from_assignment(&p, vec![1, 0, 0]).unwrap();
        ind.commit_change(0, 5).unwrap(); // (1 + 5) % 3 == 0
        assert_eq!(ind.genes()[0], 0);
        ind.commit_change(2, 7).unwrap();
        assert_eq!(ind.genes()[2], 0);
    }

    #[test]
    fn test_from_assignment_reduces_indices() {
        let p = three_sites();
        let ind = Individual::from_assignment(&p, vec![5, 3, 9]).unwrap();
        assert_eq!(ind.genes(), &[2, 1, 0]);
    }

    // ---- Overflow ----

    #[test]
    fn test_evaluate_overflow() {
        let p = overflow_problem();
        let err = Individual::from_assignment(&p, vec![1, 0, 0]).unwrap_err();
        assert_eq!(err, FapError::ArithmeticOverflow);
    }

    #[test]
    fn test_commit_overflow_leaves_individual_untouched() {
        let p = overflow_problem();
        let mut ind = Individual::from_assignment(&p, vec![0, 0, 0]).unwrap();
        assert_eq!(ind.score(), 0);
        assert_eq!(ind.commit_change(0, 1), Err(FapError::ArithmeticOverflow));
        assert_eq!(ind.genes(), &[0, 0, 0]);
        assert_eq!(ind.score(), 0);
    }

    // ---- Initializers ----

    #[test]
    fn test_random_draw_order() {
        let p = three_sites();
        let mut rng = ScriptedRng::new(&[2, 1, 0]);
        let ind = Individual::random(&p, &mut rng).unwrap();
        assert_eq!(ind.genes(), &[2, 1, 0]);
        assert_eq!(rng.requests, vec![(0, 2), (0, 1), (0, 0)]);
        assert_eq!(ind.score(), 7);
    }

    #[test]
    fn test_greedy_draw_order() {
        let p = three_sites();
        // limit = 1: only site 2 is random, sites 1 and 0 are greedy
        let mut rng = ScriptedRng::new(&[1, 0]);
        let ind = Individual::greedy(&p, DEFAULT_GREEDY_BIAS, &mut rng).unwrap();
        assert_eq!(rng.requests.len(), 2);
        assert_eq!(rng.requests[0].1, 2);
        assert_eq!(rng.requests[1], (0, 0));
        assert_eq!(ind.genes(), &[0, 0, 0]);
        assert_eq!(ind.score(), 0);
    }

    #[test]
    fn test_greedy_avoids_right_neighbor_conflict() {
        let p = three_sites();
        // limit = 2: sites 2 and 1 random (site 1 -> 15), site 0 greedy
        let mut rng = ScriptedRng::new(&[2, 0, 1]);
        let ind = Individual::greedy(&p, DEFAULT_GREEDY_BIAS, &mut rng).unwrap();
        assert_eq!(ind.frequencies().collect::<Vec<_>>(), vec![10, 15, 100]);
        assert_eq!(ind.score(), 0);
    }

    #[test]
    fn test_full_greedy_from_given_start() {
        let p = three_sites();
        // start at site 1 with index 1 (15)
        let mut rng = ScriptedRng::new(&[1, 1]);
        let ind = Individual::full_greedy(&p, &mut rng).unwrap();
        assert_eq!(rng.requests, vec![(0, 2), (0, 1)]);
        assert_eq!(ind.frequencies().collect::<Vec<_>>(), vec![10, 15, 100]);
        assert_eq!(ind.score(), 0);
    }

    #[test]
    fn test_full_greedy_counts_incoming_edges() {
        let p = three_sites();
        // start at site 0 with 30: site 1 sees the edge 0 -> 1 as incoming
        // and cannot avoid it, so it keeps the first index
        let mut rng = ScriptedRng::new(&[0, 2]);
        let ind = Individual::full_greedy(&p, &mut rng).unwrap();
        assert_eq!(ind.genes(), &[2, 0, 0]);
        assert_eq!(ind.score(), 7);
    }

    #[test]
    fn test_initializers_are_consistent() {
        let p = random_instance(30, 0.25, 5);
        let mut rng = SeededRng::new(9);
        let inds = [
            Individual::random(&p, &mut rng).unwrap(),
            Individual::greedy(&p, DEFAULT_GREEDY_BIAS, &mut rng).unwrap(),
            Individual::full_greedy(&p, &mut rng).unwrap(),
        ];
        for ind in &inds {
            for (site, &g) in ind.genes().iter().enumerate() {
                assert!(g < p.range_size(site));
            }
            assert_eq!(ind.clone().evaluate().unwrap(), ind.score());
        }
    }

    #[test]
    fn test_full_greedy_beats_random_on_average() {
        let p = random_instance(40, 0.2, 21);
        let mut rng = SeededRng::new(4);
        let random: Score = (0..10)
            .map(|_| Individual::random(&p, &mut rng).unwrap().score())
            .sum();
        let greedy: Score = (0..10)
            .map(|_| Individual::full_greedy(&p, &mut rng).unwrap().score())
            .sum();
        assert!(
            greedy < random,
            "full greedy total {greedy} should beat random total {random}"
        );
    }

    #[test]
    fn test_empty_problem() {
        let p = Problem::build(vec![], vec![], vec![]);
        let mut rng = SeededRng::new(1);
        assert_eq!(Individual::random(&p, &mut rng).unwrap().score(), 0);
        assert_eq!(Individual::greedy(&p, 0.3, &mut rng).unwrap().score(), 0);
        assert_eq!(Individual::full_greedy(&p, &mut rng).unwrap().score(), 0);
    }

    // ---- Equality and ordering ----

    #[test]
    fn test_ordering_score_then_frequencies() {
        let p = three_sites();
        let a = Individual::from_assignment(&p, vec![0, 0, 0]).unwrap(); // 0
        let b = Individual::from_assignment(&p, vec![1, 1, 0]).unwrap(); // 0
        let c = Individual::from_assignment(&p, vec![2, 0, 0]).unwrap(); // 7
        assert!(a < b, "same score, 10 < 20 at site 0");
        assert!(b < c);
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
    }

    #[test]
    fn test_set_gene_leaves_score_stale() {
        let p = three_sites();
        let mut ind = Individual::from_assignment(&p, vec![0, 0, 0]).unwrap();
        ind.set_gene(0, 2);
        assert_eq!(ind.score(), 0);
        assert_eq!(ind.evaluate().unwrap(), 7);
    }

    // ---- Properties ----

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_incremental_matches_full(
            seed in 0u64..500,
            moves in prop::collection::vec((0usize..20, 0usize..16), 1..60),
        ) {
            let p = random_instance(20, 0.3, seed);
            let mut rng = SeededRng::new(seed);
            let mut ind = Individual::random(&p, &mut rng).unwrap();
            for (site, offset) in moves {
                let previewed = ind.preview_change(site, offset).unwrap();
                let committed = ind.commit_change(site, offset).unwrap();
                prop_assert_eq!(previewed, committed);
                let mut fresh = ind.clone();
                prop_assert_eq!(fresh.evaluate().unwrap(), ind.score());
            }
        }

        #[test]
        fn prop_preview_is_pure(
            seed in 0u64..500,
            site in 0usize..15,
            offset in 0usize..20,
        ) {
            let p = random_instance(15, 0.4, seed);
            let mut rng = SeededRng::new(seed ^ 0xabcd);
            let ind = Individual::random(&p, &mut rng).unwrap();
            let genes = ind.genes().to_vec();
            let score = ind.score();
            let first = ind.preview_change(site, offset).unwrap();
            let second = ind.preview_change(site, offset).unwrap();
            prop_assert_eq!(first, second);
            prop_assert_eq!(ind.genes(), genes.as_slice());
            prop_assert_eq!(ind.score(), score);
        }
    }
}
