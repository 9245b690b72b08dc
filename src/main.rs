//! CVRP Solver - Command Line Interface
//!
//! Solves Capacitated Vehicle Routing Problem instances (CVRPLIB format) with a
//! genetic algorithm, simulated annealing or tabu search.

use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use cvrp_solver::benchmark::{Benchmark, BenchmarkConfig, SolutionReport};
use cvrp_solver::config::SolverConfig;
use cvrp_solver::fitness;
use cvrp_solver::heuristics::construction::{ConstructionHeuristic, NearestNeighborHeuristic, RandomPermutation};
use cvrp_solver::heuristics::{seeded_rng, Metaheuristic, NeighborhoodKind};
use cvrp_solver::instance::{load_instances_from_dir, ProblemData};
use cvrp_solver::visualization::Visualizer;

use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "cvrp-solver")]
#[command(author = "M2 AI2D Student")]
#[command(version = "1.0")]
#[command(about = "Metaheuristic solver for the Capacitated Vehicle Routing Problem")]
struct Cli {
    /// Log per-iteration progress
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve a single instance
    Solve {
        #[arg(short, long)]
        instance: PathBuf,

        /// Algorithm to use
        #[arg(short, long, value_enum, default_value = "ga")]
        algorithm: Algorithm,

        /// Random seed
        #[arg(short, long, default_value = "42")]
        seed: u64,

        #[command(flatten)]
        params: SolverArgs,

        /// Output solution to JSON file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Generate route and convergence visualizations
        #[arg(long)]
        visualize: bool,
    },

    /// Run benchmarks on a directory of instances
    Benchmark {
        /// Directory containing .vrp or VRP-REP .xml files
        #[arg(short, long)]
        dir: PathBuf,

        /// Output directory for results
        #[arg(short, long, default_value = "results")]
        output: PathBuf,

        /// Number of seeded runs per algorithm
        #[arg(short, long, default_value = "5")]
        runs: usize,

        /// Seed of the first run
        #[arg(long, default_value = "0")]
        base_seed: u64,

        /// Run seeds one after the other instead of in parallel
        #[arg(long)]
        sequential: bool,

        /// Maximum instance dimension
        #[arg(long)]
        max_size: Option<usize>,

        #[command(flatten)]
        params: SolverArgs,
    },

    /// Analyze an instance
    Analyze {
        /// Path to the instance file
        #[arg(short, long)]
        instance: PathBuf,
    },

    /// Compare algorithms on an instance
    Compare {
        /// Path to the instance file
        #[arg(short, long)]
        instance: PathBuf,

        /// Number of runs
        #[arg(short, long, default_value = "10")]
        runs: usize,

        /// Output CSV file
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        params: SolverArgs,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
enum Algorithm {
    /// Genetic Algorithm
    Ga,
    /// Simulated Annealing
    Sa,
    /// Tabu Search
    Tabu,
}

/// Parameter overrides applied on top of the defaults or of `--config`
#[derive(Args, Debug, Default)]
struct SolverArgs {
    /// JSON file with solver parameters
    #[arg(long)]
    config: Option<PathBuf>,

    /// Wall-clock limit per run in seconds
    #[arg(long)]
    time_limit: Option<f64>,

    /// GA generations / tabu iterations
    #[arg(long)]
    generations: Option<usize>,

    /// GA population size
    #[arg(long)]
    population: Option<usize>,

    /// GA crossover probability
    #[arg(long)]
    crossover_chance: Option<f64>,

    /// GA mutation probability
    #[arg(long)]
    mutation_chance: Option<f64>,

    /// GA stall limit in generations
    #[arg(long)]
    stall: Option<usize>,

    /// Disable the GA stall limit
    #[arg(long, conflicts_with = "stall")]
    no_stall: bool,

    /// SA initial temperature
    #[arg(long)]
    initial_temp: Option<f64>,

    /// SA minimum temperature
    #[arg(long)]
    min_temp: Option<f64>,

    /// SA cooling factor
    #[arg(long)]
    alpha: Option<f64>,

    /// Number of random swap neighbors (SA and tabu)
    #[arg(long)]
    neighborhood_size: Option<usize>,

    /// Use every interior swap instead of random ones (SA and tabu)
    #[arg(long, conflicts_with = "neighborhood_size")]
    exhaustive: bool,

    /// Tabu list capacity
    #[arg(long)]
    tabu_size: Option<usize>,
}

impl SolverArgs {
    fn solver_config(&self) -> Result<SolverConfig> {
        let mut config = match &self.config {
            Some(path) => SolverConfig::from_json_file(path)?,
            None => SolverConfig::default(),
        };

        if self.time_limit.is_some() {
            config.set_time_limit(self.time_limit);
        }
        if let Some(generations) = self.generations {
            config.genetic.max_generations = generations;
            config.tabu.max_iterations = generations;
        }
        if let Some(population) = self.population {
            config.genetic.population_size = population;
        }
        if let Some(p) = self.crossover_chance {
            config.genetic.crossover_prob = p;
        }
        if let Some(p) = self.mutation_chance {
            config.genetic.mutation_prob = p;
        }
        if let Some(stall) = self.stall {
            config.genetic.stall_generations = Some(stall);
        }
        if self.no_stall {
            config.genetic.stall_generations = None;
        }
        if let Some(t) = self.initial_temp {
            config.annealing.initial_temp = t;
        }
        if let Some(t) = self.min_temp {
            config.annealing.min_temp = t;
        }
        if let Some(alpha) = self.alpha {
            config.annealing.cooling_rate = alpha;
        }

        let neighborhood = if self.exhaustive {
            Some(NeighborhoodKind::Exhaustive)
        } else {
            self.neighborhood_size.map(|size| NeighborhoodKind::Random { size })
        };
        if let Some(kind) = neighborhood {
            config.annealing.neighborhood = kind;
            config.tabu.neighborhood = kind;
        }
        if let Some(size) = self.tabu_size {
            config.tabu.tabu_size = size;
        }

        config.validate()?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Solve { instance, algorithm, seed, params, output, visualize } => {
            solve_instance(&instance, algorithm, seed, &params, output, visualize, cli.verbose)
        }

        Commands::Benchmark { dir, output, runs, base_seed, sequential, max_size, params } => {
            run_benchmark(&dir, &output, runs, base_seed, sequential, max_size, &params)
        }

        Commands::Analyze { instance } => analyze_instance(&instance),

        Commands::Compare { instance, runs, output, params } => compare_algorithms(&instance, runs, output, &params),
    }
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}

fn solve_instance(
    path: &Path,
    algorithm: Algorithm,
    seed: u64,
    params: &SolverArgs,
    output: Option<PathBuf>,
    visualize: bool,
    verbose: bool,
) -> Result<()> {
    println!("Loading instance from {:?}...", path);
    let data = ProblemData::from_file(path)?;

    if verbose {
        println!("{}", data.statistics());
    }

    let config = params.solver_config()?;
    let solver = match algorithm {
        Algorithm::Ga => config.genetic_algorithm(),
        Algorithm::Sa => config.simulated_annealing(),
        Algorithm::Tabu => config.tabu_search(),
    };

    println!("Solving with {} (seed {})...", solver.name(), seed);
    let solution = solver.solve(&data, &mut seeded_rng(seed))?;

    println!("\n========== Results ==========");
    println!("Algorithm: {}", solution.algorithm);
    println!("Cost: {:.2}", solution.cost);
    if let Some(best) = data.best_known {
        println!("Best known: {:.2} (gap {:.2}%)", best, solution.gap_to(best));
    }
    println!("Trips: {}", solution.num_trips());
    println!("Time: {:.4}s", solution.computation_time);
    if let Some(iter) = solution.iterations {
        println!("Iterations: {}", iter);
    }
    if let Some(reason) = solution.stop_reason {
        println!("Stopped: {}", reason);
    }

    println!();
    for line in solution.format_trips(&data) {
        println!("{}", line);
    }
    if verbose {
        println!("\nTour: {}", solution.format_routes(&data));
    }

    if let Some(out_path) = output {
        SolutionReport::new(&data, &solution, Some(seed)).save_json(&out_path)?;
        println!("\nSolution saved to {:?}", out_path);
    }

    if visualize {
        let viz = Visualizer::new();
        write_figure(&viz, &viz.generate_svg(&data, &solution), &path.with_extension("png"))?;
        write_figure(
            &viz,
            &viz.generate_convergence_svg(&solution),
            &path.with_extension("convergence.png"),
        )?;
    }

    Ok(())
}

/// Write a PNG when possible, the SVG otherwise
fn write_figure(viz: &Visualizer, svg: &str, png_path: &Path) -> Result<()> {
    match viz.save_png(svg, png_path) {
        Ok(()) => println!("Visualization saved to {:?}", png_path),
        Err(e) => {
            let svg_path = png_path.with_extension("svg");
            viz.save_svg(svg, &svg_path)?;
            log::debug!("PNG export skipped: {:#}", e);
            println!("Visualization saved to {:?}", svg_path);
        }
    }
    Ok(())
}

fn run_benchmark(
    dir: &Path,
    output: &Path,
    runs: usize,
    base_seed: u64,
    sequential: bool,
    max_size: Option<usize>,
    params: &SolverArgs,
) -> Result<()> {
    println!("Loading instances from {:?}...", dir);

    let mut instances = load_instances_from_dir(dir)?;
    if let Some(max) = max_size {
        instances.retain(|i| i.dimension() <= max);
    }

    println!("Found {} instances", instances.len());
    if instances.is_empty() {
        anyhow::bail!("no .vrp or .xml instances found in {}", dir.display());
    }

    let config = BenchmarkConfig {
        num_runs: runs,
        base_seed,
        parallel: !sequential,
        output_dir: output.to_path_buf(),
        solver: params.solver_config()?,
        ..Default::default()
    };

    let mut benchmark = Benchmark::new(config);
    benchmark.run_on_instances(&instances)?;

    let report = benchmark.save_outputs()?;
    println!("\n{}", report);
    println!("Results, statistics and report saved to {:?}", output);

    Ok(())
}

fn analyze_instance(path: &Path) -> Result<()> {
    let data = ProblemData::from_file(path)?;

    println!("========== Instance Analysis ==========\n");
    println!("{}", data.statistics());

    let demands: Vec<f64> = data.customers().iter().map(|&c| data.demand(c)).collect();
    let avg_demand = demands.iter().sum::<f64>() / demands.len() as f64;
    let min_demand = demands.iter().copied().fold(f64::INFINITY, f64::min);
    let oversized = demands.iter().filter(|&&d| d > data.capacity()).count();

    println!("\nDemand Statistics:");
    println!("  Average: {:.2}", avg_demand);
    println!("  Min: {}", min_demand);
    println!("  Capacity utilization ratio: {:.2}%", avg_demand / data.capacity() * 100.0);
    if oversized > 0 {
        println!("  Customers above capacity: {}", oversized);
    }

    let nn_route = NearestNeighborHeuristic::new().construct(&data, &mut seeded_rng(42));
    let random_route = RandomPermutation.construct(&data, &mut seeded_rng(42));
    let nn_cost = fitness::evaluate(&data, &nn_route)?;
    let random_cost = fitness::evaluate(&data, &random_route)?;

    println!("\nQuick Solution Estimates:");
    println!(
        "  Nearest Neighbor: {:.2} ({} trips)",
        nn_cost,
        fitness::split_trips(&data, &nn_route)?.len()
    );
    println!("  Random permutation: {:.2}", random_cost);

    Ok(())
}

fn compare_algorithms(path: &Path, runs: usize, output: Option<PathBuf>, params: &SolverArgs) -> Result<()> {
    let data = ProblemData::from_file(path)?;

    println!("Comparing algorithms on {} (n={})...\n", data.name, data.dimension());

    let config = BenchmarkConfig {
        num_runs: runs,
        solver: params.solver_config()?,
        ..Default::default()
    };
    let mut benchmark = Benchmark::new(config);
    benchmark.run_full_benchmark(&data)?;

    println!("\n========== Summary ==========");
    println!(
        "{:<20} {:>10} {:>10} {:>10} {:>10} {:>10}",
        "Algorithm", "Best", "Average", "Worst", "Std Dev", "Avg Time"
    );
    println!("{}", "-".repeat(75));

    for stat in benchmark.compute_statistics() {
        println!(
            "{:<20} {:>10.2} {:>10.2} {:>10.2} {:>10.2} {:>10.4}",
            stat.algorithm, stat.best_cost, stat.avg_cost, stat.worst_cost, stat.std_cost, stat.avg_time
        );
    }

    if let Some(out_path) = output {
        benchmark.export_to_csv(&out_path)?;
        println!("\nResults exported to {:?}", out_path);
    }

    Ok(())
}
