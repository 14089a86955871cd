//! Algorithm drivers under an evaluation budget.
//!
//! Five strategies compose [`Population`](crate::ga::Population) and
//! [`local_search`](crate::local_search::local_search):
//!
//! - [`generational`]: generational GA with elitism
//! - [`steady_state`]: steady-state GA replacing the worst slots
//! - [`memetic_all`], [`memetic_sample`], [`memetic_elite`]: short
//!   generational bursts followed by local search on all, a random run of,
//!   or the best of the individuals
//!
//! Each function drives an already initialized population. [`Runner`]
//! builds the population from a [`DriverConfig`] and reports the outcome.
//!
//! # References
//!
//! - Moscato (1989), "On Evolution, Search, Optimization, Genetic
//!   Algorithms and Martial Arts: Towards Memetic Algorithms"
//! - Syswerda (1991), "A Study of Reproduction in Generational and
//!   Steady-State Genetic Algorithms"

mod config;
mod runner;

pub use config::{DriverConfig, MemeticSettings, Strategy};
pub use runner::{
    generational, memetic_all, memetic_elite, memetic_sample, steady_state, RunReport, Runner,
    STAGNATION_WINDOW,
};
