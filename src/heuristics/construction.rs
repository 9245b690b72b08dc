use crate::heuristics::SolverRng;
use crate::instance::ProblemData;
use crate::solution::Route;
use ordered_float::OrderedFloat;
use rand::Rng;

pub trait ConstructionHeuristic {
    fn construct(&self, data: &ProblemData, rng: &mut SolverRng) -> Route;
    fn name(&self) -> &str;
}

/// Nearest Neighbor Heuristic
///
/// Starts from a random customer and repeatedly appends the closest customer
/// not yet placed. Capacity is ignored; the fitness split takes care of it.
#[derive(Debug, Clone, Copy, Default)]
pub struct NearestNeighborHeuristic;

impl NearestNeighborHeuristic {
    pub fn new() -> Self {
        NearestNeighborHeuristic
    }
}

impl ConstructionHeuristic for NearestNeighborHeuristic {
    fn construct(&self, data: &ProblemData, rng: &mut SolverRng) -> Route {
        let mut remaining = data.customers().to_vec();
        let mut route = Vec::with_capacity(remaining.len());

        let first = rng.gen_range(0..remaining.len());
        let mut current = remaining.remove(first);
        route.push(current);

        // min_by_key keeps the first of equally distant candidates
        while let Some((pos, _)) = remaining
            .iter()
            .enumerate()
            .min_by_key(|&(_, &c)| OrderedFloat(data.distance(current, c)))
        {
            current = remaining.remove(pos);
            route.push(current);
        }

        route
    }

    fn name(&self) -> &str {
        "NearestNeighbor"
    }
}

/// Uniform random permutation built by repeated random pick-and-remove
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomPermutation;

impl ConstructionHeuristic for RandomPermutation {
    fn construct(&self, data: &ProblemData, rng: &mut SolverRng) -> Route {
        let mut remaining = data.customers().to_vec();
        let mut route = Vec::with_capacity(remaining.len());

        while !remaining.is_empty() {
            let pick = rng.gen_range(0..remaining.len());
            route.push(remaining.remove(pick));
        }

        route
    }

    fn name(&self) -> &str {
        "RandomPermutation"
    }
}
