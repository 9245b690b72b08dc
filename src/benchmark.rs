//! Benchmarking and experimentation module for the CVRP.
//!
//! Provides tools for running seeded experiments, collecting statistics,
//! and comparing algorithm performance.

use crate::config::SolverConfig;
use crate::heuristics::{seeded_rng, Algorithm, Metaheuristic};
use crate::instance::ProblemData;
use crate::solution::{Solution, StopReason};

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use statrs::statistics::{Data, Median, Statistics};
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::path::{Path, PathBuf};

/// Result of running a single algorithm on an instance with one seed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlgorithmResult {
    /// Algorithm name
    pub algorithm: String,
    /// Instance name
    pub instance: String,
    /// Instance dimension
    pub dimension: usize,
    /// Instance capacity
    pub capacity: f64,
    pub seed: u64,
    /// Solution cost
    pub cost: f64,
    /// Number of vehicle trips in the decoded solution
    pub num_trips: usize,
    /// Computation time in seconds
    pub time: f64,
    /// Number of iterations (if applicable)
    pub iterations: Option<usize>,
    pub stop_reason: Option<StopReason>,
    /// Gap to best known in percent (if available)
    pub gap_to_best: Option<f64>,
    /// RFC 3339 time at which the run finished
    pub timestamp: String,
}

/// Aggregated statistics for an algorithm
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlgorithmStatistics {
    /// Algorithm name
    pub algorithm: String,
    /// Number of runs aggregated
    pub num_runs: usize,
    /// Average cost
    pub avg_cost: f64,
    pub median_cost: f64,
    /// Best cost
    pub best_cost: f64,
    /// Worst cost
    pub worst_cost: f64,
    /// Sample standard deviation of cost
    pub std_cost: f64,
    /// Average time
    pub avg_time: f64,
    /// Total time
    pub total_time: f64,
    /// Average gap to best known
    pub avg_gap: Option<f64>,
}

/// Benchmark configuration
#[derive(Debug, Clone)]
pub struct BenchmarkConfig {
    /// Number of seeded runs per algorithm and instance
    pub num_runs: usize,
    /// Run `r` uses seed `base_seed + r`
    pub base_seed: u64,
    /// Run the seeds of an algorithm in parallel
    pub parallel: bool,
    /// Draw a progress bar on stderr
    pub show_progress: bool,
    /// Directory receiving the CSV exports and the text report
    pub output_dir: PathBuf,
    /// Parameters of the strategies under test
    pub solver: SolverConfig,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        BenchmarkConfig {
            num_runs: 5,
            base_seed: 0,
            parallel: true,
            show_progress: true,
            output_dir: PathBuf::from("results"),
            solver: SolverConfig::default(),
        }
    }
}

/// Benchmarking engine
pub struct Benchmark {
    config: BenchmarkConfig,
    results: Vec<AlgorithmResult>,
    best_known: HashMap<String, f64>,
}

impl Benchmark {
    pub fn new(config: BenchmarkConfig) -> Self {
        Benchmark {
            config,
            results: Vec::new(),
            best_known: HashMap::new(),
        }
    }

    pub fn config(&self) -> &BenchmarkConfig {
        &self.config
    }

    /// Set best known solution for an instance, overriding the one in its comment
    pub fn set_best_known(&mut self, instance_name: &str, cost: f64) {
        self.best_known.insert(instance_name.to_string(), cost);
    }

    /// Run one algorithm for every configured seed; solutions come back in seed order
    pub fn run_algorithm(&mut self, data: &ProblemData, algorithm: &Algorithm) -> Result<Vec<Solution>> {
        let seeds: Vec<u64> = (0..self.config.num_runs)
            .map(|run| self.config.base_seed + run as u64)
            .collect();

        log::info!("Running {} on {} ({} runs)", algorithm.name(), data.name, seeds.len());
        let progress = self.progress_bar(seeds.len(), format!("{} on {}", algorithm.label(), data.name));

        let run = |&seed: &u64| -> Result<(u64, Solution)> {
            let solution = algorithm
                .solve(data, &mut seeded_rng(seed))
                .with_context(|| format!("{} failed on {} with seed {}", algorithm.name(), data.name, seed))?;
            progress.inc(1);
            Ok((seed, solution))
        };

        let runs: Vec<(u64, Solution)> = if self.config.parallel {
            seeds.par_iter().map(run).collect::<Result<_>>()?
        } else {
            seeds.iter().map(run).collect::<Result<_>>()?
        };
        progress.finish_and_clear();

        for (seed, solution) in &runs {
            self.record_result(data, *seed, solution);
        }

        Ok(runs.into_iter().map(|(_, solution)| solution).collect())
    }

    /// Run every configured strategy on an instance
    pub fn run_full_benchmark(&mut self, data: &ProblemData) -> Result<()> {
        log::info!("Running benchmark on instance: {}", data.name);

        for algorithm in self.config.solver.algorithms() {
            self.run_algorithm(data, &algorithm)?;
        }
        Ok(())
    }

    /// Run benchmark on multiple instances
    pub fn run_on_instances(&mut self, instances: &[ProblemData]) -> Result<()> {
        for (i, data) in instances.iter().enumerate() {
            log::info!("[{}/{}] {} (n={})", i + 1, instances.len(), data.name, data.dimension());
            self.run_full_benchmark(data)?;
        }
        Ok(())
    }

    /// Write `results.csv`, `statistics.csv` and `report.txt` into the output
    /// directory and return the report
    pub fn save_outputs(&self) -> Result<String> {
        let dir = &self.config.output_dir;
        std::fs::create_dir_all(dir).with_context(|| format!("cannot create {}", dir.display()))?;

        self.export_to_csv(dir.join("results.csv"))?;
        self.export_statistics_csv(dir.join("statistics.csv"))?;

        let report = self.generate_report();
        let report_path = dir.join("report.txt");
        std::fs::write(&report_path, &report).with_context(|| format!("cannot write {}", report_path.display()))?;

        log::info!("Benchmark outputs written to {}", dir.display());
        Ok(report)
    }

    fn progress_bar(&self, len: usize, message: String) -> ProgressBar {
        if !self.config.show_progress {
            return ProgressBar::hidden();
        }

        let bar = ProgressBar::new(len as u64);
        if let Ok(style) = ProgressStyle::with_template("{msg:<28} [{bar:40}] {pos}/{len} ({elapsed})") {
            bar.set_style(style.progress_chars("=> "));
        }
        bar.set_message(message);
        bar
    }

    /// Record a result
    fn record_result(&mut self, data: &ProblemData, seed: u64, solution: &Solution) {
        let best_known = self.best_known.get(&data.name).copied().or(data.best_known);

        self.results.push(AlgorithmResult {
            algorithm: solution.algorithm.clone(),
            instance: data.name.clone(),
            dimension: data.dimension(),
            capacity: data.capacity(),
            seed,
            cost: solution.cost,
            num_trips: solution.num_trips(),
            time: solution.computation_time,
            iterations: solution.iterations,
            stop_reason: solution.stop_reason,
            gap_to_best: best_known.map(|best| solution.gap_to(best)),
            timestamp: chrono::Utc::now().to_rfc3339(),
        });
    }

    /// Compute statistics for each algorithm, best average cost first
    pub fn compute_statistics(&self) -> Vec<AlgorithmStatistics> {
        let mut stats_map: HashMap<&str, Vec<&AlgorithmResult>> = HashMap::new();
        for result in &self.results {
            stats_map.entry(result.algorithm.as_str()).or_default().push(result);
        }

        let mut statistics: Vec<AlgorithmStatistics> = stats_map
            .into_iter()
            .map(|(algorithm, results)| {
                let costs: Vec<f64> = results.iter().map(|r| r.cost).collect();
                let times: Vec<f64> = results.iter().map(|r| r.time).collect();
                let gaps: Vec<f64> = results.iter().filter_map(|r| r.gap_to_best).collect();

                AlgorithmStatistics {
                    algorithm: algorithm.to_string(),
                    num_runs: results.len(),
                    avg_cost: costs.iter().mean(),
                    median_cost: Data::new(costs.clone()).median(),
                    best_cost: Statistics::min(costs.iter()),
                    worst_cost: Statistics::max(costs.iter()),
                    std_cost: if costs.len() > 1 { costs.iter().std_dev() } else { 0.0 },
                    avg_time: times.iter().mean(),
                    total_time: times.iter().sum(),
                    avg_gap: if gaps.is_empty() { None } else { Some(gaps.iter().mean()) },
                }
            })
            .collect();

        statistics.sort_by(|a, b| a.avg_cost.total_cmp(&b.avg_cost));
        statistics
    }

    /// Export results to CSV
    pub fn export_to_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        write_csv(path.as_ref(), &self.results)
    }

    /// Export statistics to CSV
    pub fn export_statistics_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        write_csv(path.as_ref(), &self.compute_statistics())
    }

    /// Generate summary report
    pub fn generate_report(&self) -> String {
        let mut report = String::new();

        report.push_str("========================================\n");
        report.push_str("         CVRP Benchmark Report\n");
        report.push_str("========================================\n\n");

        report.push_str("Algorithm Performance Summary:\n");
        report.push_str(&"-".repeat(92));
        report.push('\n');
        report.push_str(&format!(
            "{:<22} {:>6} {:>12} {:>12} {:>12} {:>10} {:>12}\n",
            "Algorithm", "Runs", "Avg Cost", "Best Cost", "Std Dev", "Avg Gap%", "Avg Time"
        ));
        report.push_str(&"-".repeat(92));
        report.push('\n');

        for stat in self.compute_statistics() {
            let gap_str = stat
                .avg_gap
                .map(|g| format!("{:.2}%", g))
                .unwrap_or_else(|| "-".to_string());

            report.push_str(&format!(
                "{:<22} {:>6} {:>12.2} {:>12.2} {:>12.2} {:>10} {:>12.4}\n",
                stat.algorithm, stat.num_runs, stat.avg_cost, stat.best_cost, stat.std_cost, gap_str, stat.avg_time
            ));
        }

        report.push_str(&"-".repeat(92));
        report.push('\n');

        report.push_str("\nBest Solutions per Instance:\n");

        let mut instance_best: BTreeMap<&str, &AlgorithmResult> = BTreeMap::new();
        for result in &self.results {
            let entry = instance_best.entry(result.instance.as_str()).or_insert(result);
            if result.cost < entry.cost {
                *entry = result;
            }
        }

        for (instance, best) in &instance_best {
            report.push_str(&format!(
                "  {}: {:.2} ({}, seed {})\n",
                instance, best.cost, best.algorithm, best.seed
            ));
        }

        report
    }

    /// Get all results
    pub fn results(&self) -> &[AlgorithmResult] {
        &self.results
    }
}

fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let file = File::create(path).with_context(|| format!("cannot create {}", path.display()))?;
    let mut writer = csv::Writer::from_writer(file);

    for row in rows {
        writer.serialize(row)?;
    }

    writer.flush()?;
    Ok(())
}

/// A solution as written to disk, with trips in raw node ids
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolutionReport {
    pub instance: String,
    pub seed: Option<u64>,
    pub cost: f64,
    pub best_known: Option<f64>,
    pub routes: Vec<Vec<usize>>,
    pub solution: Solution,
}

impl SolutionReport {
    pub fn new(data: &ProblemData, solution: &Solution, seed: Option<u64>) -> Self {
        let ids = data.ids();
        SolutionReport {
            instance: data.name.clone(),
            seed,
            cost: solution.cost,
            best_known: data.best_known,
            routes: solution
                .trips
                .iter()
                .map(|trip| trip.iter().map(|&c| ids.to_raw(c)).collect())
                .collect(),
            solution: solution.clone(),
        }
    }

    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path).with_context(|| format!("cannot create {}", path.display()))?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heuristics::{GAConfig, SAConfig, TabuConfig};

    fn small_config(parallel: bool) -> BenchmarkConfig {
        BenchmarkConfig {
            num_runs: 3,
            base_seed: 10,
            parallel,
            show_progress: false,
            output_dir: std::env::temp_dir().join(format!("cvrp-bench-out-{}", std::process::id())),
            solver: SolverConfig {
                genetic: GAConfig { population_size: 10, max_generations: 15, ..Default::default() },
                annealing: SAConfig { initial_temp: 50.0, min_temp: 1.0, ..Default::default() },
                tabu: TabuConfig { max_iterations: 20, tabu_size: 10, ..Default::default() },
            },
        }
    }

    fn create_test_instance() -> ProblemData {
        let coords = vec![(0.0, 0.0), (2.0, 1.0), (-1.0, 3.0), (4.0, -2.0), (1.0, 5.0), (-3.0, -1.0), (3.0, 3.0)];
        let demands = vec![(1, 2.0), (2, 3.0), (3, 4.0), (4, 1.0), (5, 3.0), (6, 2.0)];
        let mut data = ProblemData::new(coords, demands, 6.0, 0).unwrap();
        data.name = "tiny".to_string();
        data
    }

    #[test]
    fn test_benchmark_config() {
        let config = BenchmarkConfig::default();
        assert_eq!(config.num_runs, 5);
        assert!(config.parallel);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let data = create_test_instance();

        let mut parallel = Benchmark::new(small_config(true));
        parallel.run_full_benchmark(&data).unwrap();
        let mut sequential = Benchmark::new(small_config(false));
        sequential.run_full_benchmark(&data).unwrap();

        assert_eq!(parallel.results().len(), 9);
        for (a, b) in parallel.results().iter().zip(sequential.results()) {
            assert_eq!(a.algorithm, b.algorithm);
            assert_eq!(a.seed, b.seed);
            assert_eq!(a.cost, b.cost);
        }

        let seeds: Vec<u64> = parallel.results()[..3].iter().map(|r| r.seed).collect();
        assert_eq!(seeds, vec![10, 11, 12]);
    }

    #[test]
    fn test_statistics_and_gap() {
        let data = create_test_instance();
        let mut benchmark = Benchmark::new(small_config(false));
        let algorithm = benchmark.config().solver.tabu_search();
        let solutions = benchmark.run_algorithm(&data, &algorithm).unwrap();

        let best = solutions.iter().map(|s| s.cost).fold(f64::INFINITY, f64::min);
        assert!(benchmark.results().iter().all(|r| r.gap_to_best.is_none()));

        benchmark.set_best_known("tiny", best);
        benchmark.run_algorithm(&data, &algorithm).unwrap();

        let stats = benchmark.compute_statistics();
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].num_runs, 6);
        assert!((stats[0].best_cost - best).abs() < 1e-9);
        assert!(stats[0].best_cost <= stats[0].median_cost);
        assert!(stats[0].median_cost <= stats[0].worst_cost);
        assert!(stats[0].avg_gap.unwrap() >= 0.0);
    }

    #[test]
    fn test_exports() {
        let data = create_test_instance();
        let mut benchmark = Benchmark::new(small_config(false));
        benchmark.run_full_benchmark(&data).unwrap();

        let dir = std::env::temp_dir().join(format!("cvrp-bench-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        benchmark.export_to_csv(dir.join("results.csv")).unwrap();
        let mut reader = csv::Reader::from_path(dir.join("results.csv")).unwrap();
        let rows: Vec<AlgorithmResult> = reader.deserialize().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 9);

        benchmark.export_statistics_csv(dir.join("stats.csv")).unwrap();

        let solution = Solution::from_route(&data, vec![1, 2, 3, 4, 5, 6], "manual").unwrap();
        let report = SolutionReport::new(&data, &solution, Some(1));
        report.save_json(dir.join("solution.json")).unwrap();
        let text = std::fs::read_to_string(dir.join("solution.json")).unwrap();
        let back: SolutionReport = serde_json::from_str(&text).unwrap();
        assert_eq!(back.routes.concat(), vec![1, 2, 3, 4, 5, 6]);

        let report = benchmark.generate_report();
        assert!(report.contains("GeneticAlgorithm"));
        assert!(report.contains("TabuSearch"));
        assert!(report.contains("tiny:"));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_run_on_instances_and_save_outputs() {
        let first = create_test_instance();
        let mut second = create_test_instance();
        second.name = "tiny-copy".to_string();

        let dir = std::env::temp_dir().join(format!("cvrp-bench-save-{}", std::process::id()));
        let config = BenchmarkConfig { output_dir: dir.clone(), ..small_config(false) };
        let mut benchmark = Benchmark::new(config);
        benchmark.run_on_instances(&[first, second]).unwrap();
        assert_eq!(benchmark.results().len(), 18);

        let report = benchmark.save_outputs().unwrap();
        assert!(report.contains("tiny-copy:"));
        assert_eq!(std::fs::read_to_string(dir.join("report.txt")).unwrap(), report);

        let mut reader = csv::Reader::from_path(dir.join("statistics.csv")).unwrap();
        let stats: Vec<AlgorithmStatistics> = reader.deserialize().map(|r| r.unwrap()).collect();
        assert_eq!(stats.len(), 3);
        assert!(stats.iter().all(|s| s.num_runs == 6));
        assert!(dir.join("results.csv").exists());

        std::fs::remove_dir_all(&dir).ok();
    }
}
