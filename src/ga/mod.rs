//! Genetic algorithm building blocks for frequency assignment.
//!
//! # Core Types
//!
//! - [`Individual`]: one frequency index per site plus an incrementally
//!   maintained interference score
//! - [`Population`]: ordered individuals with generational and
//!   steady-state evolution, diversity check and restart
//! - [`Assignment`]: the narrow gene-level interface operators work on
//!
//! # Submodules
//!
//! - [`operators`]: segment and BLX-α crossover, random-reset mutation
//! - [`selection`]: binary tournament and best/worst scans
//!
//! # References
//!
//! - Holland (1975), *Adaptation in Natural and Artificial Systems*
//! - Goldberg (1989), *Genetic Algorithms in Search, Optimization, and Machine Learning*

mod individual;
pub mod operators;
mod population;
pub mod selection;
mod types;

pub use individual::{Individual, DEFAULT_GREEDY_BIAS};
pub use operators::Crossover;
pub use population::{Initializer, Population, DEFAULT_GENE_MUTATION_RATE};
pub use selection::{best_index_excluding, binary_tournament};
pub use types::Assignment;
