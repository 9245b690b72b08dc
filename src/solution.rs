//! Solution representation and reporting for the CVRP.
//!
//! This module provides the result type shared by every search strategy, the
//! reasons a search may stop, and the human-readable rendering of the
//! depot-anchored trips hidden in a giant-tour route.

use crate::fitness;
use crate::instance::ProblemData;
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// A giant tour: every customer index exactly once, depot implicit
pub type Route = Vec<usize>;

/// Why a search stopped. All of these are normal terminations, not faults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopReason {
    /// Generation or iteration budget consumed
    GenerationLimit,
    /// Best route unchanged for the configured number of generations
    Stalled,
    /// Temperature reached the configured floor
    TemperatureFloor,
    /// Every neighbor of the current route was tabu
    NoAdmissibleNeighbor,
    /// Wall-clock limit reached
    TimeLimit,
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            StopReason::GenerationLimit => "generation limit",
            StopReason::Stalled => "stalled",
            StopReason::TemperatureFloor => "temperature floor",
            StopReason::NoAdmissibleNeighbor => "no admissible neighbor",
            StopReason::TimeLimit => "time limit",
        };
        f.write_str(text)
    }
}

/// Represents a solution to the CVRP
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Solution {
    /// Giant tour over normalized customer indices
    pub route: Route,
    /// Total travel distance of the decoded trips
    pub cost: f64,
    /// Trips obtained by the greedy split, normalized indices
    pub trips: Vec<Vec<usize>>,
    /// Algorithm that generated this solution
    pub algorithm: String,
    /// Computation time in seconds
    pub computation_time: f64,
    /// Number of generations or iterations performed
    pub iterations: Option<usize>,
    pub stop_reason: Option<StopReason>,
    /// Best cost after each generation/iteration/temperature step
    pub cost_history: Vec<f64>,
}

impl Solution {
    /// Create a solution from a route, pricing and splitting it
    pub fn from_route(data: &ProblemData, route: Route, algorithm: &str) -> Result<Self> {
        let cost = fitness::evaluate(data, &route)?;
        let trips = fitness::split_trips(data, &route)?;

        Ok(Solution {
            route,
            cost,
            trips,
            algorithm: algorithm.to_string(),
            computation_time: 0.0,
            iterations: None,
            stop_reason: None,
            cost_history: Vec::new(),
        })
    }

    pub fn num_trips(&self) -> usize {
        self.trips.len()
    }

    /// Relative gap in percent to a reference cost
    pub fn gap_to(&self, reference: f64) -> f64 {
        (self.cost - reference) / reference * 100.0
    }

    /// Render the trips with raw node ids, e.g. `1 -> 5 -> 3 -> 1 -> 7 -> 1`
    pub fn format_routes(&self, data: &ProblemData) -> String {
        let ids = data.ids();
        let depot = ids.to_raw(data.depot()).to_string();

        let mut parts = vec![depot.clone()];
        for trip in &self.trips {
            parts.extend(trip.iter().map(|&c| ids.to_raw(c).to_string()));
            parts.push(depot.clone());
        }
        parts.join(" -> ")
    }

    /// Trips with raw node ids, one line per vehicle
    pub fn format_trips(&self, data: &ProblemData) -> Vec<String> {
        let ids = data.ids();
        self.trips
            .iter()
            .zip(fitness::trip_loads(data, &self.trips))
            .enumerate()
            .map(|(k, (trip, load))| {
                let nodes: Vec<String> = trip.iter().map(|&c| ids.to_raw(c).to_string()).collect();
                format!("Route #{} (load {}): {}", k + 1, load, nodes.join(" "))
            })
            .collect()
    }
}

impl std::fmt::Display for Solution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Solution ({})", self.algorithm)?;
        writeln!(f, "  Cost: {:.2}", self.cost)?;
        writeln!(f, "  Trips: {}", self.trips.len())?;
        writeln!(f, "  Time: {:.4}s", self.computation_time)?;
        if let Some(iter) = self.iterations {
            writeln!(f, "  Iterations: {}", iter)?;
        }
        if let Some(reason) = self.stop_reason {
            writeln!(f, "  Stopped: {}", reason)?;
        }
        writeln!(f, "  Route: {:?}", self.route)
    }
}
