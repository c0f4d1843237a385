//! sheetnest benchmark runner CLI

use clap::{Parser, Subcommand, ValueEnum};
use sheetnest_benchmark::{BenchmarkConfig, BenchmarkResult, BenchmarkRunner, Job, SyntheticGenerator};
use sheetnest_d2::Strategy;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "bench-runner")]
#[command(about = "Benchmark runner for sheetnest")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run benchmark from a JSON job file
    RunFile {
        /// Path to the JSON job file
        file: PathBuf,

        /// Strategies to benchmark
        #[arg(short, long, value_enum, default_values_t = vec![StrategyArg::Greedy, StrategyArg::Genetic])]
        strategies: Vec<StrategyArg>,

        /// Number of runs per strategy
        #[arg(short, long, default_value = "1")]
        runs: usize,

        /// Base seed for the randomized strategies
        #[arg(long)]
        seed: Option<u64>,

        /// Output file for results (JSON)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Generate synthetic jobs and benchmark them
    Synthetic {
        /// Random seed for reproducibility
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Number of part templates per job
        #[arg(short, long, default_value = "20")]
        count: usize,

        /// Square sheet size
        #[arg(long, default_value = "200")]
        sheet_size: f64,

        /// Strategies to benchmark
        #[arg(short, long, value_enum, default_values_t = vec![StrategyArg::Greedy, StrategyArg::Genetic])]
        strategies: Vec<StrategyArg>,

        /// Number of runs per strategy
        #[arg(short, long, default_value = "1")]
        runs: usize,

        /// Output file for results (JSON)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Write synthetic jobs to JSON files
    Generate {
        /// Output directory
        #[arg(short, long, default_value = "jobs")]
        output: PathBuf,

        /// Random seed for reproducibility
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Number of part templates per job
        #[arg(short, long, default_value = "20")]
        count: usize,

        /// Square sheet size
        #[arg(long, default_value = "200")]
        sheet_size: f64,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum StrategyArg {
    /// Greedy NFP placement
    Greedy,
    /// Gravity fall and anneal
    Gravity,
    /// Genetic search with grid fill
    Genetic,
    /// Separating-axis placement (convex parts)
    Sat,
}

impl From<StrategyArg> for Strategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Greedy => Strategy::Greedy,
            StrategyArg::Gravity => Strategy::Gravity,
            StrategyArg::Genetic => Strategy::Genetic,
            StrategyArg::Sat => Strategy::Sat,
        }
    }
}

fn benchmark_config(strategies: Vec<StrategyArg>, runs: usize, seed: Option<u64>) -> BenchmarkConfig {
    let config = BenchmarkConfig::new()
        .with_strategies(strategies.into_iter().map(Strategy::from).collect())
        .with_runs_per_config(runs);
    match seed {
        Some(seed) => config.with_seed(seed),
        None => config,
    }
}

fn synthetic_jobs(seed: u64, count: usize, sheet_size: f64) -> Vec<Job> {
    let mut generator = SyntheticGenerator::with_seed(seed);
    vec![
        generator.convex(count, sheet_size),
        generator.mixed(count, sheet_size),
    ]
}

fn report(results: &BenchmarkResult, output: Option<&Path>) -> anyhow::Result<()> {
    results.print_summary();
    if let Some(path) = output {
        results.save_json(path)?;
        println!("Results saved to {}", path.display());
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::RunFile {
            file,
            strategies,
            runs,
            seed,
            output,
        } => {
            let job = Job::load(&file)?;
            let runner = BenchmarkRunner::new(benchmark_config(strategies, runs, seed));
            let results = runner.run_job(&job)?;
            report(&results, output.as_deref())?;
        }

        Commands::Synthetic {
            seed,
            count,
            sheet_size,
            strategies,
            runs,
            output,
        } => {
            if sheet_size <= 0.0 {
                anyhow::bail!("Sheet size must be positive, got {}", sheet_size);
            }
            let jobs = synthetic_jobs(seed, count, sheet_size);
            let runner = BenchmarkRunner::new(benchmark_config(strategies, runs, Some(seed)));
            let results = runner.run_jobs(&jobs)?;
            report(&results, output.as_deref())?;
        }

        Commands::Generate {
            output,
            seed,
            count,
            sheet_size,
        } => {
            std::fs::create_dir_all(&output)?;
            for job in synthetic_jobs(seed, count, sheet_size) {
                let path = output.join(format!("{}.json", job.name));
                job.save(&path)?;
                println!(
                    "Generated: {} ({} parts)",
                    path.display(),
                    job.instance_count()
                );
            }
        }
    }

    Ok(())
}
