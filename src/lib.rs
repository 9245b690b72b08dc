//! CVRP Solver Library
//!
//! Metaheuristic solver for the Capacitated Vehicle Routing Problem (CVRP).
//!
//! Solutions are giant tours: permutations of every customer with the depot
//! left implicit. A greedy left-to-right split turns a permutation into
//! capacity-feasible trips and prices it, so every search works on plain
//! permutations.
//!
//! # Features
//!
//! - CVRPLIB instance loading with raw id normalization
//! - Greedy capacity-split fitness evaluation
//! - Nearest-neighbor and random construction, swap neighborhoods
//! - Genetic Algorithm, Simulated Annealing and Tabu Search
//! - Seeded benchmarking, statistics and visualization tools
//!
//! # Example
//!
//! ```no_run
//! use cvrp_solver::instance::ProblemData;
//! use cvrp_solver::heuristics::{seeded_rng, Metaheuristic, TabuSearch};
//!
//! // Load instance
//! let data = ProblemData::from_file("A-n32-k5.vrp").unwrap();
//!
//! // Search with a reproducible random stream
//! let solution = TabuSearch::default().solve(&data, &mut seeded_rng(42)).unwrap();
//!
//! println!("Solution cost: {:.2}", solution.cost);
//! println!("{}", solution.format_routes(&data));
//! ```

pub mod instance;
pub mod fitness;
pub mod solution;
pub mod heuristics;
pub mod config;
pub mod benchmark;
pub mod visualization;

pub use config::SolverConfig;
pub use instance::ProblemData;
pub use solution::Solution;
