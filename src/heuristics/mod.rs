//! Heuristics module for the CVRP.
//!
//! This module exports the construction heuristics, the swap neighborhoods and
//! the three search strategies (genetic algorithm, simulated annealing, tabu
//! search) behind the common [`Metaheuristic`] trait.

pub mod construction;
pub mod neighborhood;
pub mod local_search;
pub mod genetic;

pub use construction::*;
pub use neighborhood::*;
pub use local_search::*;
pub use genetic::*;

use crate::instance::ProblemData;
use crate::solution::Solution;
use anyhow::Result;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Random stream threaded through every search
pub type SolverRng = ChaCha8Rng;

/// Create the random stream of a run. Equal seeds give identical runs.
pub fn seeded_rng(seed: u64) -> SolverRng {
    ChaCha8Rng::seed_from_u64(seed)
}

/// A search strategy over giant-tour permutations
pub trait Metaheuristic {
    fn solve(&self, data: &ProblemData, rng: &mut SolverRng) -> Result<Solution>;
    fn name(&self) -> &str;
}

/// Tagged choice of search strategy together with its parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "algorithm", rename_all = "snake_case")]
pub enum Algorithm {
    Genetic(GAConfig),
    Annealing(SAConfig),
    Tabu(TabuConfig),
}

impl Algorithm {
    pub fn solver(&self) -> Box<dyn Metaheuristic + Send + Sync> {
        match self {
            Algorithm::Genetic(config) => Box::new(GeneticAlgorithm::new(config.clone())),
            Algorithm::Annealing(config) => Box::new(SimulatedAnnealing::new(config.clone())),
            Algorithm::Tabu(config) => Box::new(TabuSearch::new(config.clone())),
        }
    }

    /// Short label used in benchmark tables
    pub fn label(&self) -> &'static str {
        match self {
            Algorithm::Genetic(_) => "GA",
            Algorithm::Annealing(_) => "SA",
            Algorithm::Tabu(_) => "Tabu",
        }
    }
}

impl Metaheuristic for Algorithm {
    fn solve(&self, data: &ProblemData, rng: &mut SolverRng) -> Result<Solution> {
        match self {
            Algorithm::Genetic(config) => GeneticAlgorithm::new(config.clone()).solve(data, rng),
            Algorithm::Annealing(config) => SimulatedAnnealing::new(config.clone()).solve(data, rng),
            Algorithm::Tabu(config) => TabuSearch::new(config.clone()).solve(data, rng),
        }
    }

    fn name(&self) -> &str {
        match self {
            Algorithm::Genetic(_) => "GeneticAlgorithm",
            Algorithm::Annealing(_) => "SimulatedAnnealing",
            Algorithm::Tabu(_) => "TabuSearch",
        }
    }
}

pub(crate) fn time_exceeded(start: &Instant, limit: Option<f64>) -> bool {
    limit.map_or(false, |limit| start.elapsed().as_secs_f64() >= limit)
}
