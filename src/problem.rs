//! Problem definition: sites, frequency sets and interference edges.
//!
//! A [`Problem`] is built once by the parsing collaborator and then only
//! read. Individuals and populations borrow it for the whole run.
//!
//! # Edge ordering contract
//!
//! Edges are grouped by their first endpoint and ordered by it. The edge
//! index holds, for every site, the offset of the first edge whose first
//! endpoint is that site, so the *outgoing window* of site `s` is
//! `edges[edge_index[s]..edge_index[s + 1]]` (up to the end of the edge list
//! for the last site). Incremental cost computation relies on this: each
//! edge is owned by the site whose window contains it, and is reached from
//! its second endpoint only through the precomputed incoming list.

use crate::error::{FapError, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A frequency value.
pub type Frequency = i32;

/// Interference score, bound and penalty type.
pub type Score = i64;

/// An ordered list of allowed frequencies, shared by sites through its
/// group index.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FrequencySet {
    values: Vec<Frequency>,
}

impl FrequencySet {
    /// Creates a frequency set from its values, in order.
    pub fn new(values: Vec<Frequency>) -> Self {
        Self { values }
    }

    /// Number of allowed frequencies.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if the set has no frequencies.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Frequency at `index`, wrapping around the set size.
    ///
    /// # Panics
    /// Panics if the set is empty.
    pub fn get(&self, index: usize) -> Frequency {
        self.values[index % self.values.len()]
    }

    /// The frequency values.
    pub fn values(&self) -> &[Frequency] {
        &self.values
    }
}

impl From<Vec<Frequency>> for FrequencySet {
    fn from(values: Vec<Frequency>) -> Self {
        Self::new(values)
    }
}

/// A site (transmitter) that needs one frequency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Site {
    /// External identifier, as found in the problem files.
    pub id: u32,
    /// Index of the site's [`FrequencySet`].
    pub group: usize,
}

/// A pairwise interference constraint.
///
/// The penalty is charged when `|f(first) - f(second)| > bound`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct InterferenceEdge {
    /// Site that owns the edge (its outgoing window contains it).
    pub first: usize,
    /// The other endpoint.
    pub second: usize,
    /// Largest frequency distance that is still penalty free.
    pub bound: Score,
    /// Penalty charged when the bound is exceeded.
    pub penalty: Score,
}

impl InterferenceEdge {
    /// Creates an edge.
    pub fn new(first: usize, second: usize, bound: Score, penalty: Score) -> Self {
        Self {
            first,
            second,
            bound,
            penalty,
        }
    }

    /// Whether two frequencies on the endpoints violate the bound.
    #[inline]
    pub fn violated(&self, a: Frequency, b: Frequency) -> bool {
        (Score::from(a) - Score::from(b)).abs() > self.bound
    }
}

/// Static description of a frequency assignment instance.
#[derive(Debug, Clone)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(from = "ProblemData", into = "ProblemData")
)]
pub struct Problem {
    groups: Vec<FrequencySet>,
    sites: Vec<Site>,
    edges: Vec<InterferenceEdge>,
    edge_index: Vec<usize>,
    incoming: Vec<Vec<usize>>,
}

/// Serialized form of [`Problem`]; the incoming lists are rebuilt on load.
#[cfg(feature = "serde")]
#[derive(Serialize, Deserialize)]
struct ProblemData {
    groups: Vec<FrequencySet>,
    sites: Vec<Site>,
    edges: Vec<InterferenceEdge>,
    edge_index: Vec<usize>,
}

#[cfg(feature = "serde")]
impl From<ProblemData> for Problem {
    fn from(d: ProblemData) -> Self {
        Problem::new(d.groups, d.sites, d.edges, d.edge_index)
    }
}

#[cfg(feature = "serde")]
impl From<Problem> for ProblemData {
    fn from(p: Problem) -> Self {
        ProblemData {
            groups: p.groups,
            sites: p.sites,
            edges: p.edges,
            edge_index: p.edge_index,
        }
    }
}

impl Problem {
    /// Creates a problem from already ordered edges and their edge index.
    ///
    /// The caller guarantees the ordering contract described in the module
    /// docs. Use [`validate`](Self::validate) to check it.
    pub fn new(
        groups: Vec<FrequencySet>,
        sites: Vec<Site>,
        edges: Vec<InterferenceEdge>,
        edge_index: Vec<usize>,
    ) -> Self {
        let incoming = incoming_lists(sites.len(), &edges);
        Self {
            groups,
            sites,
            edges,
            edge_index,
            incoming,
        }
    }

    /// Creates a problem from unordered edges.
    ///
    /// Edges are stably sorted by first endpoint and the edge index is
    /// derived from the sorted order.
    pub fn build(
        groups: Vec<FrequencySet>,
        sites: Vec<Site>,
        mut edges: Vec<InterferenceEdge>,
    ) -> Self {
        edges.sort_by_key(|e| e.first);
        let edge_index = (0..sites.len())
            .map(|s| edges.partition_point(|e| e.first < s))
            .collect();
        Self::new(groups, sites, edges, edge_index)
    }

    /// Checks the structural preconditions the optimizer relies on.
    pub fn validate(&self) -> Result<()> {
        if let Some(g) = self.groups.iter().position(FrequencySet::is_empty) {
            return Err(FapError::InvalidProblem(format!(
                "frequency set {g} is empty"
            )));
        }
        for (i, site) in self.sites.iter().enumerate() {
            if site.group >= self.groups.len() {
                return Err(FapError::InvalidProblem(format!(
                    "site {i} references unknown frequency set {}",
                    site.group
                )));
            }
        }
        let n = self.sites.len();
        for (k, e) in self.edges.iter().enumerate() {
            if e.first >= n || e.second >= n {
                return Err(FapError::InvalidProblem(format!(
                    "edge {k} references a site out of range"
                )));
            }
        }
        if self.edge_index.len() != n {
            return Err(FapError::InvalidProblem(format!(
                "edge index has {} entries for {n} sites",
                self.edge_index.len()
            )));
        }
        for s in 0..n {
            let window = self.window(s);
            if window.start > window.end || window.end > self.edges.len() {
                return Err(FapError::InvalidProblem(format!(
                    "edge index is not monotonic at site {s}"
                )));
            }
            if self.edges[window].iter().any(|e| e.first != s) {
                return Err(FapError::InvalidProblem(format!(
                    "outgoing window of site {s} holds a foreign edge"
                )));
            }
        }
        if n > 0 && self.edge_index[0] != 0 {
            return Err(FapError::InvalidProblem(
                "edges precede the first site's window".into(),
            ));
        }
        Ok(())
    }

    /// Number of sites.
    pub fn site_count(&self) -> usize {
        self.sites.len()
    }

    /// Number of allowed frequencies for `site`.
    pub fn range_size(&self, site: usize) -> usize {
        self.groups[self.sites[site].group].len()
    }

    /// Frequency value of `site` at frequency `index`.
    #[inline]
    pub fn frequency(&self, site: usize, index: usize) -> Frequency {
        self.groups[self.sites[site].group].get(index)
    }

    /// All sites, in index order.
    pub fn sites(&self) -> &[Site] {
        &self.sites
    }

    /// All frequency sets.
    pub fn groups(&self) -> &[FrequencySet] {
        &self.groups
    }

    /// All edges, grouped by first endpoint.
    pub fn edges(&self) -> &[InterferenceEdge] {
        &self.edges
    }

    /// Per-site offset of the outgoing window.
    pub fn edge_index(&self) -> &[usize] {
        &self.edge_index
    }

    /// Edges owned by `site`.
    #[inline]
    pub fn outgoing(&self, site: usize) -> &[InterferenceEdge] {
        &self.edges[self.window(site)]
    }

    /// Edges whose second endpoint is `site`, self loops excluded.
    #[inline]
    pub fn incoming(&self, site: usize) -> impl Iterator<Item = &InterferenceEdge> + '_ {
        self.incoming[site].iter().map(move |&k| &self.edges[k])
    }

    fn window(&self, site: usize) -> std::ops::Range<usize> {
        let start = self.edge_index[site];
        let end = self
            .edge_index
            .get(site + 1)
            .copied()
            .unwrap_or(self.edges.len());
        start..end
    }
}

fn incoming_lists(n: usize, edges: &[InterferenceEdge]) -> Vec<Vec<usize>> {
    let mut incoming = vec![Vec::new(); n];
    for (k, e) in edges.iter().enumerate() {
        if e.first != e.second && e.second < n {
            incoming[e.second].push(k);
        }
    }
    incoming
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use crate::random::{RandomSource, SeededRng};

    /// Three sites with sets `{10,20,30}`, `{5,15}`, `{100}` and one edge
    /// `0 -> 1` with bound 5 and penalty 7.
    pub(crate) fn three_sites() -> Problem {
        Problem::build(
            vec![
                FrequencySet::new(vec![10, 20, 30]),
                FrequencySet::new(vec![5, 15]),
                FrequencySet::new(vec![100]),
            ],
            vec![
                Site { id: 1, group: 0 },
                Site { id: 2, group: 1 },
                Site { id: 3, group: 2 },
            ],
            vec![InterferenceEdge::new(0, 1, 5, 7)],
        )
    }

    /// `n` sites sharing one set `{0, 10, 20, ...}` of size `range`, and a
    /// chain of edges `i -> i + 1` with bound 5 and penalty 1.
    pub(crate) fn chain(n: usize, range: usize) -> Problem {
        Problem::build(
            vec![FrequencySet::new((0..range as Frequency).map(|k| 10 * k).collect())],
            (0..n as u32).map(|id| Site { id, group: 0 }).collect(),
            (1..n)
                .map(|i| InterferenceEdge::new(i - 1, i, 5, 1))
                .collect(),
        )
    }

    /// A random instance with `n` sites sharing a few frequency sets.
    ///
    /// About `density * n * (n - 1) / 2` edges, mixing both endpoint
    /// orders so the incoming lists are exercised.
    pub(crate) fn random_instance(n: usize, density: f64, seed: u64) -> Problem {
        let mut rng = SeededRng::new(seed);
        let groups = vec![
            FrequencySet::new((0..8).map(|k| 100 + 7 * k).collect()),
            FrequencySet::new((0..5).map(|k| 130 + 11 * k).collect()),
            FrequencySet::new((0..12).map(|k| 90 + 3 * k).collect()),
        ];
        let sites = (0..n)
            .map(|i| Site {
                id: i as u32 * 2 + 1,
                group: rng.index(groups.len()),
            })
            .collect();
        let mut edges = Vec::new();
        for a in 0..n {
            for b in (a + 1)..n {
                if rng.chance(density) {
                    let bound = rng.int_in(0, 30) as Score;
                    let penalty = rng.int_in(1, 1000) as Score;
                    if rng.chance(0.5) {
                        edges.push(InterferenceEdge::new(a, b, bound, penalty));
                    } else {
                        edges.push(InterferenceEdge::new(b, a, bound, penalty));
                    }
                }
            }
        }
        Problem::build(groups, sites, edges)
    }
}
