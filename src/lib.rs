//! Evolutionary and memetic search for low-interference frequency assignment.
//!
//! A set of sites must each pick one frequency from an allowed set, and
//! pairs of sites related by an interference edge are penalized when their
//! frequencies are closer than the edge's bound. The crate searches for an
//! assignment with a low total penalty within an evaluation budget:
//!
//! - **Problem**: read-only description of sites, frequency sets and
//!   interference edges, ordered by first endpoint with a per-site index.
//! - **Individual**: one assignment with a cached score and O(degree)
//!   incremental updates on single-site changes.
//! - **Genetic operators**: segment exchange and BLX-α crossover, random
//!   reset mutation.
//! - **Population**: tournament selection, generational replacement with
//!   elitism, steady-state replacement of the worst, diversity check and
//!   restart.
//! - **Local search**: first-improvement cyclic hill climbing.
//! - **Drivers**: generational GA, steady-state GA and three memetic
//!   hybrids, plus a [`Runner`](drivers::Runner) configured by
//!   [`DriverConfig`](drivers::DriverConfig).
//!
//! Every random draw goes through one [`RandomSource`](random::RandomSource),
//! so a seeded run replays exactly.
//!
//! # Quick start
//!
//! ```
//! use u_fap::drivers::{DriverConfig, Runner, Strategy};
//! use u_fap::problem::{FrequencySet, InterferenceEdge, Problem, Site};
//!
//! let problem = Problem::build(
//!     vec![FrequencySet::new(vec![10, 20, 30]), FrequencySet::new(vec![5, 15])],
//!     vec![
//!         Site { id: 1, group: 0 },
//!         Site { id: 2, group: 1 },
//!         Site { id: 3, group: 0 },
//!     ],
//!     vec![
//!         InterferenceEdge::new(0, 1, 5, 7),
//!         InterferenceEdge::new(1, 2, 5, 3),
//!     ],
//! );
//! problem.validate().unwrap();
//!
//! let config = DriverConfig::memetic(Strategy::MemeticElite)
//!     .with_budget(2_000)
//!     .with_seed(42);
//! let report = Runner::run(&problem, &config).unwrap();
//! assert!(report.best_score <= report.initial_score);
//! ```
//!
//! # Features
//!
//! - `serde`: `Serialize`/`Deserialize` on problem and configuration types.
//! - `parallel`: batch scoring of new individuals on rayon.

pub mod drivers;
pub mod error;
pub mod ga;
pub mod local_search;
pub mod problem;
pub mod random;

pub use error::{FapError, Result};
