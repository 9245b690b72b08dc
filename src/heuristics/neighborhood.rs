//! Swap neighborhoods over giant-tour routes.

use crate::heuristics::SolverRng;
use crate::solution::Route;
use anyhow::{ensure, Result};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// How the neighbors of a route are produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NeighborhoodKind {
    /// `size` random two-position swaps
    Random { size: usize },
    /// Every swap of two interior positions (first and last stay fixed)
    Exhaustive,
}

impl Default for NeighborhoodKind {
    fn default() -> Self {
        NeighborhoodKind::Random { size: 150 }
    }
}

impl NeighborhoodKind {
    pub fn generate(&self, route: &[usize], rng: &mut SolverRng) -> Vec<Route> {
        match *self {
            NeighborhoodKind::Random { size } => random_swaps(route, size, rng),
            NeighborhoodKind::Exhaustive => exhaustive_swaps(route),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if let NeighborhoodKind::Random { size } = self {
            ensure!(*size > 0, "neighborhood size must be positive");
        }
        Ok(())
    }
}

/// `k` copies of `route`, each with two distinct random positions swapped.
///
/// Returns nothing for routes shorter than two customers.
pub fn random_swaps(route: &[usize], k: usize, rng: &mut SolverRng) -> Vec<Route> {
    let len = route.len();
    if len < 2 {
        return Vec::new();
    }

    (0..k)
        .map(|_| {
            let i = rng.gen_range(0..len);
            let mut j = rng.gen_range(0..len);
            while j == i {
                j = rng.gen_range(0..len);
            }
            let mut neighbor = route.to_vec();
            neighbor.swap(i, j);
            neighbor
        })
        .collect()
}

/// One neighbor per pair `1 <= i < j <= len - 2`, in lexicographic pair order.
pub fn exhaustive_swaps(route: &[usize]) -> Vec<Route> {
    let len = route.len();
    if len < 4 {
        return Vec::new();
    }

    let mut neighbors = Vec::with_capacity((len - 2) * (len - 3) / 2);
    for i in 1..len - 1 {
        for j in i + 1..len - 1 {
            let mut neighbor = route.to_vec();
            neighbor.swap(i, j);
            neighbors.push(neighbor);
        }
    }
    neighbors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heuristics::seeded_rng;

    fn differing_positions(a: &[usize], b: &[usize]) -> Vec<usize> {
        a.iter().zip(b).enumerate().filter(|(_, (x, y))| x != y).map(|(i, _)| i).collect()
    }

    #[test]
    fn test_random_swaps_differ_in_two_positions() {
        let route: Route = (1..=8).collect();
        let neighbors = random_swaps(&route, 50, &mut seeded_rng(11));

        assert_eq!(neighbors.len(), 50);
        for n in &neighbors {
            let diff = differing_positions(&route, n);
            assert_eq!(diff.len(), 2);
            assert_eq!(route[diff[0]], n[diff[1]]);
            assert_eq!(route[diff[1]], n[diff[0]]);
        }
    }

    #[test]
    fn test_random_swaps_short_route() {
        assert!(random_swaps(&[5], 10, &mut seeded_rng(0)).is_empty());
        assert!(random_swaps(&[], 10, &mut seeded_rng(0)).is_empty());
        assert_eq!(random_swaps(&[1, 2], 3, &mut seeded_rng(0)), vec![vec![2, 1]; 3]);
    }

    #[test]
    fn test_exhaustive_swaps_keep_endpoints() {
        let route = vec![1, 2, 3, 4, 5];
        let neighbors = exhaustive_swaps(&route);

        assert_eq!(neighbors, vec![vec![1, 3, 2, 4, 5], vec![1, 4, 3, 2, 5], vec![1, 2, 4, 3, 5]]);
        for n in &neighbors {
            assert_eq!(n[0], 1);
            assert_eq!(n[4], 5);
        }
    }

    #[test]
    fn test_exhaustive_swaps_count() {
        let route: Route = (1..=10).collect();
        assert_eq!(exhaustive_swaps(&route).len(), 8 * 7 / 2);
        assert!(exhaustive_swaps(&[1, 2, 3]).is_empty());
        assert!(exhaustive_swaps(&[]).is_empty());
    }

    #[test]
    fn test_generate_and_validate() {
        let route: Route = (1..=6).collect();
        let kind = NeighborhoodKind::Random { size: 4 };
        assert_eq!(kind.generate(&route, &mut seeded_rng(2)).len(), 4);
        assert_eq!(NeighborhoodKind::Exhaustive.generate(&route, &mut seeded_rng(2)).len(), 6);

        assert!(NeighborhoodKind::Random { size: 0 }.validate().is_err());
        assert!(NeighborhoodKind::Exhaustive.validate().is_ok());
    }
}
