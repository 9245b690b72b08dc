//! Genetic Algorithm for the CVRP.
//!
//! Generational GA over giant-tour permutations:
//! - random pick-and-remove initial population
//! - binary tournament selection on the cached fitness of the generation
//! - Order Crossover (OX) on consecutive pairs
//! - population-level mutation that swaps whole individuals between slots
//! - optional early stop once the best route stalls

use crate::fitness;
use crate::heuristics::construction::{ConstructionHeuristic, RandomPermutation};
use crate::heuristics::{time_exceeded, Metaheuristic, SolverRng};
use crate::instance::ProblemData;
use crate::solution::{Route, Solution, StopReason};
use anyhow::{ensure, Result};
use ordered_float::OrderedFloat;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Instant;

/// Genetic Algorithm configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GAConfig {
    /// Population size
    pub population_size: usize,
    /// Number of generations
    pub max_generations: usize,
    /// Crossover probability per pair
    pub crossover_prob: f64,
    /// Mutation probability per gene of each slot
    pub mutation_prob: f64,
    /// Stop once the best route is unchanged for this many generations
    pub stall_generations: Option<usize>,
    /// Time limit in seconds (optional)
    pub time_limit: Option<f64>,
}

impl Default for GAConfig {
    fn default() -> Self {
        GAConfig {
            population_size: 100,
            max_generations: 1000,
            crossover_prob: 0.8,
            mutation_prob: 0.1,
            stall_generations: Some(150),
            time_limit: None,
        }
    }
}

impl GAConfig {
    pub fn validate(&self) -> Result<()> {
        ensure!(self.population_size >= 2, "population size must be at least 2, got {}", self.population_size);
        ensure!(
            (0.0..=1.0).contains(&self.crossover_prob),
            "crossover probability must lie in [0, 1], got {}",
            self.crossover_prob
        );
        ensure!(
            (0.0..=1.0).contains(&self.mutation_prob),
            "mutation probability must lie in [0, 1], got {}",
            self.mutation_prob
        );
        if let Some(stall) = self.stall_generations {
            ensure!(stall > 0, "stall generations must be positive");
        }
        Ok(())
    }
}

/// Genetic Algorithm implementation
#[derive(Debug, Clone, Default)]
pub struct GeneticAlgorithm {
    config: GAConfig,
}

impl GeneticAlgorithm {
    pub fn new(config: GAConfig) -> Self {
        GeneticAlgorithm { config }
    }

    pub fn config(&self) -> &GAConfig {
        &self.config
    }

    fn initialize_population(&self, data: &ProblemData, rng: &mut SolverRng) -> Vec<Route> {
        (0..self.config.population_size)
            .map(|_| RandomPermutation.construct(data, rng))
            .collect()
    }

    /// Binary tournament with replacement; ties go to the second contestant
    fn tournament_selection(&self, population: &[Route], fitness: &[f64], rng: &mut SolverRng) -> Vec<Route> {
        let size = population.len();
        (0..size)
            .map(|_| {
                let first = rng.gen_range(0..size);
                let mut second = rng.gen_range(0..size);
                while second == first {
                    second = rng.gen_range(0..size);
                }
                let winner = if fitness[first] < fitness[second] { first } else { second };
                population[winner].clone()
            })
            .collect()
    }

    /// OX on slots (0,1), (2,3), ... An odd trailing slot is left untouched.
    fn crossover(&self, population: &mut [Route], rng: &mut SolverRng) {
        for pair in population.chunks_exact_mut(2) {
            let len = pair[0].len();
            if len < 3 {
                continue;
            }

            let (start, end) = crossover_points(len, rng);
            if rng.gen::<f64>() < self.config.crossover_prob {
                let first = order_crossover(&pair[0], &pair[1], start, end);
                let second = order_crossover(&pair[1], &pair[0], start, end);
                pair[0] = first;
                pair[1] = second;
            }
        }
    }

    /// Each gene position of slot `i` may trade the whole slot with another one.
    /// Routes themselves are never altered here.
    fn mutate(&self, population: &mut [Route], rng: &mut SolverRng) {
        let size = population.len();
        for i in 0..size {
            for _ in 0..population[i].len() {
                if rng.gen::<f64>() < self.config.mutation_prob {
                    let mut other = rng.gen_range(0..size);
                    while other == i {
                        other = rng.gen_range(0..size);
                    }
                    population.swap(i, other);
                }
            }
        }
    }

    /// Average number of differing positions between the first individuals
    fn population_diversity(population: &[Route]) -> f64 {
        let sample = &population[..population.len().min(20)];
        let mut total_diff = 0usize;
        let mut count = 0usize;

        for (i, a) in sample.iter().enumerate() {
            for b in &sample[i + 1..] {
                total_diff += a.iter().zip(b).filter(|(x, y)| x != y).count();
                count += 1;
            }
        }

        if count > 0 {
            total_diff as f64 / count as f64
        } else {
            0.0
        }
    }
}

impl Metaheuristic for GeneticAlgorithm {
    fn solve(&self, data: &ProblemData, rng: &mut SolverRng) -> Result<Solution> {
        self.config.validate()?;
        let start = Instant::now();
        log::info!(
            "[GA] Starting on {}: population {}, {} generations",
            data.name,
            self.config.population_size,
            self.config.max_generations
        );

        let mut population = self.initialize_population(data, rng);
        let mut fitness = evaluate_population(data, &population)?;
        let mut previous_best = population[best_index(&fitness)].clone();

        let mut generation = 0;
        let mut stall = 0;
        let mut stop_reason = StopReason::GenerationLimit;
        let mut cost_history = Vec::new();

        while generation < self.config.max_generations {
            if time_exceeded(&start, self.config.time_limit) {
                stop_reason = StopReason::TimeLimit;
                break;
            }

            population = self.tournament_selection(&population, &fitness, rng);
            self.crossover(&mut population, rng);
            self.mutate(&mut population, rng);

            fitness = evaluate_population(data, &population)?;
            let best = best_index(&fitness);
            cost_history.push(fitness[best]);
            generation += 1;

            if population[best] == previous_best {
                stall += 1;
            } else {
                previous_best = population[best].clone();
                stall = 0;
            }

            log::debug!(
                "[GA] Gen {}  Best cost {:.3}  Stall {}  Diversity {:.2}  Elapsed {:.2}s",
                generation,
                fitness[best],
                stall,
                Self::population_diversity(&population),
                start.elapsed().as_secs_f64()
            );

            if self.config.stall_generations.map_or(false, |limit| stall >= limit) {
                stop_reason = StopReason::Stalled;
                break;
            }
        }

        log::info!("[GA] Stopped after {} generations ({})", generation, stop_reason);

        let best = best_index(&fitness);
        let mut solution = Solution::from_route(data, population.swap_remove(best), self.name())?;
        solution.computation_time = start.elapsed().as_secs_f64();
        solution.iterations = Some(generation);
        solution.stop_reason = Some(stop_reason);
        solution.cost_history = cost_history;

        Ok(solution)
    }

    fn name(&self) -> &str {
        "GeneticAlgorithm"
    }
}

/// Order Crossover (OX)
///
/// The child keeps `mother[start..=end]` in place and fills the remaining
/// positions, left to right, with the customers of `father` not in that
/// segment, in the father's order.
pub fn order_crossover(mother: &[usize], father: &[usize], start: usize, end: usize) -> Route {
    let segment: HashSet<usize> = mother[start..=end].iter().copied().collect();
    let mut filler = father.iter().copied().filter(|c| !segment.contains(c));

    let mut child = Vec::with_capacity(mother.len());
    for (pos, &gene) in mother.iter().enumerate() {
        if (start..=end).contains(&pos) {
            child.push(gene);
        } else if let Some(c) = filler.next() {
            child.push(c);
        }
    }
    child
}

/// Two distinct cut points drawn in `[0, len - 1)`, returned ordered.
/// The pair spanning the whole route is re-drawn.
fn crossover_points(len: usize, rng: &mut SolverRng) -> (usize, usize) {
    let first = rng.gen_range(0..len - 1);
    let mut second = rng.gen_range(0..len - 1);
    while second == first || (first.min(second) == 0 && first.max(second) == len - 1) {
        second = rng.gen_range(0..len - 1);
    }
    (first.min(second), first.max(second))
}

fn evaluate_population(data: &ProblemData, population: &[Route]) -> Result<Vec<f64>> {
    population.iter().map(|route| fitness::evaluate(data, route)).collect()
}

/// Index of the cheapest route, first one on ties
fn best_index(fitness: &[f64]) -> usize {
    fitness
        .iter()
        .enumerate()
        .min_by_key(|&(_, &f)| OrderedFloat(f))
        .map(|(i, _)| i)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fitness::validate_route;
    use crate::heuristics::seeded_rng;
    use proptest::prelude::*;

    fn create_test_instance() -> ProblemData {
        let coords = vec![
            (0.0, 0.0),
            (1.0, 0.0),
            (2.0, 0.0),
            (1.0, 1.0),
            (2.0, 1.0),
            (-1.0, 2.0),
            (-2.0, -1.0),
            (0.0, -2.0),
        ];
        let demands = vec![(1, 3.0), (2, 2.0), (3, 4.0), (4, 1.0), (5, 3.0), (6, 2.0), (7, 5.0)];
        ProblemData::new(coords, demands, 8.0, 0).unwrap()
    }

    #[test]
    fn test_genetic_algorithm() {
        let data = create_test_instance();
        let config = GAConfig {
            population_size: 20,
            max_generations: 10,
            stall_generations: None,
            ..Default::default()
        };

        let solution = GeneticAlgorithm::new(config).solve(&data, &mut seeded_rng(42)).unwrap();

        validate_route(&data, &solution.route).unwrap();
        assert_eq!(solution.iterations, Some(10));
        assert_eq!(solution.stop_reason, Some(StopReason::GenerationLimit));
        assert_eq!(solution.cost_history.len(), 10);
        assert!((solution.cost_history[9] - solution.cost).abs() < 1e-9);
    }

    #[test]
    fn test_same_seed_same_result() {
        let data = create_test_instance();
        let config = GAConfig { population_size: 10, max_generations: 20, ..Default::default() };
        let ga = GeneticAlgorithm::new(config);

        let a = ga.solve(&data, &mut seeded_rng(5)).unwrap();
        let b = ga.solve(&data, &mut seeded_rng(5)).unwrap();
        assert_eq!(a.route, b.route);
        assert_eq!(a.cost_history, b.cost_history);
    }

    #[test]
    fn test_stall_stops_early() {
        // a single customer leaves nothing to evolve
        let data = ProblemData::new(vec![(0.0, 0.0), (1.0, 1.0)], vec![(1, 1.0)], 5.0, 0).unwrap();
        let config = GAConfig {
            population_size: 4,
            max_generations: 100,
            stall_generations: Some(5),
            ..Default::default()
        };

        let solution = GeneticAlgorithm::new(config).solve(&data, &mut seeded_rng(0)).unwrap();
        assert_eq!(solution.route, vec![1]);
        assert_eq!(solution.iterations, Some(5));
        assert_eq!(solution.stop_reason, Some(StopReason::Stalled));
    }

    #[test]
    fn test_unbounded_generations_stop_on_time_limit() {
        let data = create_test_instance();
        let config = GAConfig {
            population_size: 10,
            max_generations: usize::MAX,
            stall_generations: None,
            time_limit: Some(0.05),
            ..Default::default()
        };

        let solution = GeneticAlgorithm::new(config).solve(&data, &mut seeded_rng(2)).unwrap();
        validate_route(&data, &solution.route).unwrap();
        assert_eq!(solution.stop_reason, Some(StopReason::TimeLimit));
        assert_eq!(solution.cost_history.len(), solution.iterations.unwrap());
    }

    #[test]
    fn test_invalid_config() {
        let data = create_test_instance();
        let config = GAConfig { population_size: 1, ..Default::default() };
        assert!(GeneticAlgorithm::new(config).solve(&data, &mut seeded_rng(0)).is_err());
        assert!(GAConfig { crossover_prob: 1.5, ..Default::default() }.validate().is_err());
    }

    #[test]
    fn test_order_crossover_example() {
        let mother = vec![1, 2, 3, 4, 5, 6, 7, 8];
        let father = vec![8, 6, 4, 2, 7, 5, 3, 1];
        assert_eq!(order_crossover(&mother, &father, 2, 4), vec![8, 6, 3, 4, 5, 2, 7, 1]);
    }

    #[test]
    fn test_crossover_keeps_odd_trailing_individual() {
        let ga = GeneticAlgorithm::new(GAConfig { crossover_prob: 1.0, ..Default::default() });
        let mut population: Vec<Route> = vec![
            vec![1, 2, 3, 4, 5],
            vec![5, 4, 3, 2, 1],
            vec![2, 4, 1, 5, 3],
        ];
        let last = population[2].clone();

        ga.crossover(&mut population, &mut seeded_rng(9));

        assert_eq!(population.len(), 3);
        assert_eq!(population[2], last);
        for route in &population {
            let mut sorted = route.clone();
            sorted.sort_unstable();
            assert_eq!(sorted, vec![1, 2, 3, 4, 5]);
        }
    }

    #[test]
    fn test_short_routes_skip_crossover() {
        let ga = GeneticAlgorithm::new(GAConfig { crossover_prob: 1.0, ..Default::default() });
        let mut population: Vec<Route> = vec![vec![1, 2], vec![2, 1]];
        ga.crossover(&mut population, &mut seeded_rng(1));
        assert_eq!(population, vec![vec![1, 2], vec![2, 1]]);
    }

    #[test]
    fn test_mutation_only_reorders_slots() {
        let ga = GeneticAlgorithm::new(GAConfig { mutation_prob: 0.5, ..Default::default() });
        let mut population: Vec<Route> = (0..6).map(|k| vec![k + 1, k + 2, k + 3]).collect();
        let mut before = population.clone();

        ga.mutate(&mut population, &mut seeded_rng(4));

        let mut after = population.clone();
        before.sort();
        after.sort();
        assert_eq!(before, after);
    }

    #[test]
    fn test_tournament_prefers_cheaper() {
        let ga = GeneticAlgorithm::default();
        let population: Vec<Route> = vec![vec![1, 2], vec![2, 1]];
        let fitness = vec![1.0, 5.0];

        let selected = ga.tournament_selection(&population, &fitness, &mut seeded_rng(0));
        // with two slots every tournament pits slot 0 against slot 1
        assert_eq!(selected, vec![vec![1, 2], vec![1, 2]]);
    }

    #[test]
    fn test_crossover_points() {
        let mut rng = seeded_rng(17);
        for len in 3..20 {
            for _ in 0..50 {
                let (start, end) = crossover_points(len, &mut rng);
                assert!(start < end);
                assert!(end <= len - 2);
            }
        }
    }

    fn parents() -> impl Strategy<Value = (Vec<usize>, Vec<usize>, usize, usize)> {
        (3usize..30).prop_flat_map(|n| {
            let base: Vec<usize> = (1..=n).collect();
            (
                Just(base.clone()).prop_shuffle(),
                Just(base).prop_shuffle(),
                0..n,
                0..n,
            )
                .prop_map(|(m, f, a, b)| (m, f, a.min(b), a.max(b)))
        })
    }

    proptest! {
        #[test]
        fn order_crossover_yields_permutation((mother, father, start, end) in parents()) {
            let child = order_crossover(&mother, &father, start, end);

            prop_assert_eq!(&child[start..=end], &mother[start..=end]);

            let mut sorted = child.clone();
            sorted.sort_unstable();
            let expected: Vec<usize> = (1..=mother.len()).collect();
            prop_assert_eq!(sorted, expected);
        }
    }
}
