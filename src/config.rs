//! Solver configuration shared by the CLI and the benchmark harness.

use crate::heuristics::{Algorithm, GAConfig, SAConfig, TabuConfig};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Parameters of every search strategy. Missing keys in a JSON file fall back
/// to the defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    pub genetic: GAConfig,
    pub annealing: SAConfig,
    pub tabu: TabuConfig,
}

impl SolverConfig {
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("cannot read config file {}", path.display()))?;
        let config: SolverConfig = serde_json::from_str(&text)
            .with_context(|| format!("invalid config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.genetic.validate().context("genetic algorithm configuration")?;
        self.annealing.validate().context("simulated annealing configuration")?;
        self.tabu.validate().context("tabu search configuration")?;
        Ok(())
    }

    /// Apply a wall-clock limit to every strategy
    pub fn set_time_limit(&mut self, limit: Option<f64>) {
        self.genetic.time_limit = limit;
        self.annealing.time_limit = limit;
        self.tabu.time_limit = limit;
    }

    pub fn genetic_algorithm(&self) -> Algorithm {
        Algorithm::Genetic(self.genetic.clone())
    }

    pub fn simulated_annealing(&self) -> Algorithm {
        Algorithm::Annealing(self.annealing.clone())
    }

    pub fn tabu_search(&self) -> Algorithm {
        Algorithm::Tabu(self.tabu.clone())
    }

    /// All three strategies, in the order GA, SA, Tabu
    pub fn algorithms(&self) -> Vec<Algorithm> {
        vec![self.genetic_algorithm(), self.simulated_annealing(), self.tabu_search()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heuristics::NeighborhoodKind;

    #[test]
    fn test_defaults() {
        let config = SolverConfig::default();
        assert_eq!(config.genetic.population_size, 100);
        assert_eq!(config.genetic.max_generations, 1000);
        assert_eq!(config.genetic.stall_generations, Some(150));
        assert_eq!(config.annealing.initial_temp, 10000.0);
        assert_eq!(config.annealing.min_temp, 2.0);
        assert_eq!(config.annealing.cooling_rate, 0.8);
        assert_eq!(config.tabu.tabu_size, 100);
        assert_eq!(config.tabu.neighborhood, NeighborhoodKind::Random { size: 150 });
        config.validate().unwrap();
    }

    #[test]
    fn test_partial_json() {
        let json = r#"{
            "genetic": { "population_size": 30 },
            "tabu": { "neighborhood": { "kind": "exhaustive" } }
        }"#;
        let config: SolverConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.genetic.population_size, 30);
        assert_eq!(config.genetic.crossover_prob, 0.8);
        assert_eq!(config.tabu.neighborhood, NeighborhoodKind::Exhaustive);
        assert_eq!(config.annealing.cooling_rate, 0.8);
    }

    #[test]
    fn test_from_json_file_rejects_invalid_values() {
        let dir = std::env::temp_dir().join(format!("cvrp-config-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();

        let good = dir.join("good.json");
        fs::write(&good, r#"{"annealing": {"cooling_rate": 0.95}}"#).unwrap();
        assert_eq!(SolverConfig::from_json_file(&good).unwrap().annealing.cooling_rate, 0.95);

        let bad = dir.join("bad.json");
        fs::write(&bad, r#"{"annealing": {"cooling_rate": 1.5}}"#).unwrap();
        assert!(SolverConfig::from_json_file(&bad).is_err());

        assert!(SolverConfig::from_json_file(dir.join("missing.json")).is_err());
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_time_limit_and_algorithms() {
        let mut config = SolverConfig::default();
        config.set_time_limit(Some(2.5));

        let labels: Vec<&str> = config.algorithms().iter().map(|a| a.label()).collect();
        assert_eq!(labels, vec!["GA", "SA", "Tabu"]);
        assert_eq!(config.tabu.time_limit, Some(2.5));
    }
}
