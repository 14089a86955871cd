//! Capability trait between genetic operators and the individual.
//!
//! Operators only read and write frequency indices through
//! [`Assignment`]; they never touch the cached score. After an operator
//! runs, the caller re-evaluates the affected individuals.

/// A mutable per-site frequency-index assignment.
pub trait Assignment {
    /// Number of sites (genome length).
    fn site_count(&self) -> usize;

    /// Number of allowed frequency indices at `site`.
    fn range_size(&self, site: usize) -> usize;

    /// Current frequency index at `site`.
    fn gene(&self, site: usize) -> usize;

    /// Overwrites the frequency index at `site`.
    ///
    /// The cached score is stale until the next evaluation.
    fn set_gene(&mut self, site: usize, index: usize);
}
