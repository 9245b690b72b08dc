//! Single-trajectory searches for the CVRP.
//!
//! This module implements:
//! - Simulated Annealing with Metropolis acceptance and geometric cooling
//! - Tabu Search with a bounded FIFO memory of recently visited routes
//!
//! Both start from a nearest-neighbor route and explore swap neighborhoods.

use crate::fitness;
use crate::heuristics::construction::{ConstructionHeuristic, NearestNeighborHeuristic};
use crate::heuristics::neighborhood::NeighborhoodKind;
use crate::heuristics::{time_exceeded, Metaheuristic, SolverRng};
use crate::instance::ProblemData;
use crate::solution::{Route, Solution, StopReason};
use anyhow::{ensure, Result};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};
use std::time::Instant;

// ==================== Simulated Annealing ====================

/// Simulated Annealing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SAConfig {
    /// Initial temperature
    pub initial_temp: f64,
    /// Search stops once the temperature is at or below this value
    pub min_temp: f64,
    /// Geometric cooling factor applied after each neighborhood pass
    pub cooling_rate: f64,
    pub neighborhood: NeighborhoodKind,
    /// Time limit in seconds (optional)
    pub time_limit: Option<f64>,
}

impl Default for SAConfig {
    fn default() -> Self {
        SAConfig {
            initial_temp: 10000.0,
            min_temp: 2.0,
            cooling_rate: 0.8,
            neighborhood: NeighborhoodKind::default(),
            time_limit: None,
        }
    }
}

impl SAConfig {
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.initial_temp.is_finite() && self.initial_temp > 0.0,
            "initial temperature must be positive, got {}",
            self.initial_temp
        );
        ensure!(
            self.min_temp.is_finite() && self.min_temp > 0.0,
            "minimum temperature must be positive, got {}",
            self.min_temp
        );
        ensure!(
            self.cooling_rate > 0.0 && self.cooling_rate < 1.0,
            "cooling rate must lie in (0, 1), got {}",
            self.cooling_rate
        );
        self.neighborhood.validate()
    }
}

/// Simulated Annealing
///
/// Metaheuristic that accepts worse solutions with decreasing probability.
#[derive(Debug, Clone, Default)]
pub struct SimulatedAnnealing {
    config: SAConfig,
}

impl SimulatedAnnealing {
    pub fn new(config: SAConfig) -> Self {
        SimulatedAnnealing { config }
    }

    pub fn with_params(initial_temp: f64, min_temp: f64, cooling_rate: f64, neighborhood_size: usize) -> Self {
        SimulatedAnnealing {
            config: SAConfig {
                initial_temp,
                min_temp,
                cooling_rate,
                neighborhood: NeighborhoodKind::Random { size: neighborhood_size },
                time_limit: None,
            },
        }
    }

    pub fn config(&self) -> &SAConfig {
        &self.config
    }
}

impl Metaheuristic for SimulatedAnnealing {
    fn solve(&self, data: &ProblemData, rng: &mut SolverRng) -> Result<Solution> {
        self.config.validate()?;
        let start = Instant::now();

        log::info!(
            "[SA] Starting on {}: T0 {}, Tmin {}, alpha {}",
            data.name,
            self.config.initial_temp,
            self.config.min_temp,
            self.config.cooling_rate
        );

        let mut current = NearestNeighborHeuristic::new().construct(data, rng);
        let mut current_cost = fitness::evaluate(data, &current)?;
        let mut best = current.clone();
        let mut best_cost = current_cost;
        log::debug!("[SA] Initial cost {:.3}", current_cost);

        let mut temp = self.config.initial_temp;
        let mut steps = 0;
        let mut cost_history = Vec::new();

        let stop_reason = loop {
            if temp <= self.config.min_temp {
                break StopReason::TemperatureFloor;
            }
            if time_exceeded(&start, self.config.time_limit) {
                break StopReason::TimeLimit;
            }

            // neighbors all derive from the route current at the start of the pass
            for neighbor in self.config.neighborhood.generate(&current, rng) {
                let neighbor_cost = fitness::evaluate(data, &neighbor)?;

                let accept = if neighbor_cost < current_cost {
                    true
                } else {
                    let prob = ((current_cost - neighbor_cost) / temp).exp();
                    rng.gen::<f64>() < prob
                };

                if accept {
                    current = neighbor;
                    current_cost = neighbor_cost;

                    if current_cost < best_cost {
                        best = current.clone();
                        best_cost = current_cost;
                    }
                }
            }

            cost_history.push(best_cost);
            steps += 1;
            log::debug!(
                "[SA] Step {}  Temp {:.3}  Current {:.3}  Best {:.3}",
                steps,
                temp,
                current_cost,
                best_cost
            );
            temp *= self.config.cooling_rate;
        };

        log::info!("[SA] Stopped after {} temperature steps ({})", steps, stop_reason);

        let mut solution = Solution::from_route(data, best, self.name())?;
        solution.computation_time = start.elapsed().as_secs_f64();
        solution.iterations = Some(steps);
        solution.stop_reason = Some(stop_reason);
        solution.cost_history = cost_history;

        Ok(solution)
    }

    fn name(&self) -> &str {
        "SimulatedAnnealing"
    }
}

// ==================== Tabu Search ====================

/// Tabu Search configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TabuConfig {
    /// Maximum iterations
    pub max_iterations: usize,
    /// Number of recent routes kept tabu
    pub tabu_size: usize,
    pub neighborhood: NeighborhoodKind,
    /// Time limit in seconds (optional)
    pub time_limit: Option<f64>,
}

impl Default for TabuConfig {
    fn default() -> Self {
        TabuConfig {
            max_iterations: 1000,
            tabu_size: 100,
            neighborhood: NeighborhoodKind::default(),
            time_limit: None,
        }
    }
}

impl TabuConfig {
    pub fn validate(&self) -> Result<()> {
        self.neighborhood.validate()
    }
}

/// FIFO memory of whole routes with constant-time membership.
///
/// Holds at most `capacity` routes; the oldest is evicted first.
#[derive(Debug, Clone)]
pub struct TabuList {
    capacity: usize,
    order: VecDeque<Route>,
    members: HashSet<Route>,
}

impl TabuList {
    pub fn new(capacity: usize) -> Self {
        TabuList {
            capacity,
            order: VecDeque::with_capacity(capacity + 1),
            members: HashSet::with_capacity(capacity + 1),
        }
    }

    pub fn contains(&self, route: &[usize]) -> bool {
        self.members.contains(route)
    }

    /// Remember `route`. Re-inserting a remembered route changes nothing.
    pub fn push(&mut self, route: Route) {
        if !self.members.insert(route.clone()) {
            return;
        }
        self.order.push_back(route);

        while self.order.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.members.remove(&oldest);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Tabu Search
///
/// Moves to the best non-tabu neighbor each iteration, even when it is worse.
/// There is no aspiration criterion.
#[derive(Debug, Clone, Default)]
pub struct TabuSearch {
    config: TabuConfig,
}

impl TabuSearch {
    pub fn new(config: TabuConfig) -> Self {
        TabuSearch { config }
    }

    pub fn with_params(tabu_size: usize, max_iterations: usize, neighborhood_size: usize) -> Self {
        TabuSearch {
            config: TabuConfig {
                max_iterations,
                tabu_size,
                neighborhood: NeighborhoodKind::Random { size: neighborhood_size },
                time_limit: None,
            },
        }
    }

    pub fn config(&self) -> &TabuConfig {
        &self.config
    }

    /// Cheapest neighbor not in `tabu`; the first one wins ties
    fn best_admissible(
        &self,
        data: &ProblemData,
        neighbors: Vec<Route>,
        tabu: &TabuList,
    ) -> Result<Option<(Route, f64)>> {
        let mut chosen: Option<(Route, f64)> = None;

        for neighbor in neighbors {
            if tabu.contains(&neighbor) {
                continue;
            }
            let cost = fitness::evaluate(data, &neighbor)?;
            if chosen.as_ref().map_or(true, |(_, best)| cost < *best) {
                chosen = Some((neighbor, cost));
            }
        }

        Ok(chosen)
    }
}

impl Metaheuristic for TabuSearch {
    fn solve(&self, data: &ProblemData, rng: &mut SolverRng) -> Result<Solution> {
        self.config.validate()?;
        let start = Instant::now();

        log::info!(
            "[Tabu] Starting on {}: {} iterations, tabu size {}",
            data.name,
            self.config.max_iterations,
            self.config.tabu_size
        );

        let mut current = NearestNeighborHeuristic::new().construct(data, rng);
        let mut best_cost = fitness::evaluate(data, &current)?;
        let mut best = current.clone();
        log::debug!("[Tabu] Initial cost {:.3}", best_cost);

        let mut tabu = TabuList::new(self.config.tabu_size);
        let mut iteration = 0;
        let mut stop_reason = StopReason::GenerationLimit;
        let mut cost_history = Vec::new();

        while iteration < self.config.max_iterations {
            if time_exceeded(&start, self.config.time_limit) {
                stop_reason = StopReason::TimeLimit;
                break;
            }

            let neighbors = self.config.neighborhood.generate(&current, rng);
            let Some((next, next_cost)) = self.best_admissible(data, neighbors, &tabu)? else {
                stop_reason = StopReason::NoAdmissibleNeighbor;
                break;
            };

            current = next;
            tabu.push(current.clone());

            if next_cost < best_cost {
                best = current.clone();
                best_cost = next_cost;
            }

            cost_history.push(best_cost);
            iteration += 1;
            log::debug!(
                "[Tabu] Iter {}  Current {:.3}  Best {:.3}  Tabu {}",
                iteration,
                next_cost,
                best_cost,
                tabu.len()
            );
        }

        log::info!("[Tabu] Stopped after {} iterations ({})", iteration, stop_reason);

        let mut solution = Solution::from_route(data, best, self.name())?;
        solution.computation_time = start.elapsed().as_secs_f64();
        solution.iterations = Some(iteration);
        solution.stop_reason = Some(stop_reason);
        solution.cost_history = cost_history;

        Ok(solution)
    }

    fn name(&self) -> &str {
        "TabuSearch"
    }
}
