//! Benchmark runner for nesting jobs.

use crate::job::{Job, JobError};
use crate::result::{BenchmarkResult, RunResult};
use sheetnest_d2::{GaConfig, GravityConfig, NestConfig, Nester, NfpCache, Part, Strategy};
use std::sync::Arc;

/// Configuration for benchmark runs.
#[derive(Debug, Clone)]
pub struct BenchmarkConfig {
    /// Strategies to benchmark.
    pub strategies: Vec<Strategy>,
    /// Number of runs per strategy.
    pub runs_per_config: usize,
    /// Base seed for the randomized strategies; run `i` uses `seed + i`.
    pub seed: Option<u64>,
    /// GA population size.
    pub population_size: usize,
    /// GA generations.
    pub generations: u32,
    /// Whether to print per-run progress.
    pub show_progress: bool,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            strategies: vec![Strategy::Greedy, Strategy::Genetic],
            runs_per_config: 1,
            seed: None,
            population_size: 20,
            generations: 30,
            show_progress: true,
        }
    }
}

impl BenchmarkConfig {
    /// Creates a new benchmark configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the strategies to benchmark.
    pub fn with_strategies(mut self, strategies: Vec<Strategy>) -> Self {
        self.strategies = strategies;
        self
    }

    /// Sets the number of runs per strategy.
    pub fn with_runs_per_config(mut self, n: usize) -> Self {
        self.runs_per_config = n;
        self
    }

    /// Sets the base seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Sets the GA population size and generation count.
    pub fn with_genetic(mut self, population_size: usize, generations: u32) -> Self {
        self.population_size = population_size;
        self.generations = generations;
        self
    }

    /// Enables or disables progress output.
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }
}

/// Benchmark runner.
pub struct BenchmarkRunner {
    config: BenchmarkConfig,
}

impl BenchmarkRunner {
    /// Creates a new benchmark runner.
    pub fn new(config: BenchmarkConfig) -> Self {
        Self { config }
    }

    /// Nest configuration for one run of `strategy` on `job`.
    pub fn nest_config(&self, job: &Job, strategy: Strategy, run_idx: usize) -> NestConfig {
        let mut genetic = GaConfig::new()
            .with_population_size(self.config.population_size)
            .with_generations(self.config.generations);
        let mut gravity = GravityConfig::new();
        if let Some(seed) = self.config.seed {
            let seed = seed.wrapping_add(run_idx as u64);
            genetic = genetic.with_seed(seed);
            gravity = gravity.with_seed(seed);
        }

        NestConfig::new(job.sheet_width, job.sheet_height)
            .with_strategy(strategy)
            .with_sheet_spacing(job.sheet_spacing)
            .with_genetic(genetic)
            .with_gravity(gravity)
    }

    /// Runs every configured strategy on a job.
    ///
    /// All runs share one NFP cache. A strategy that rejects the job (for
    /// example SAT with concave parts) is recorded with every part unplaced.
    pub fn run_job(&self, job: &Job) -> Result<BenchmarkResult, JobError> {
        let parts = job.parts()?;
        let cache = Arc::new(NfpCache::new());
        let mut results = BenchmarkResult::new();

        if self.config.show_progress {
            println!("\nBenchmarking job: {}", job.name);
            println!("  Items: {}", job.items.len());
            println!("  Total parts: {}", parts.len());
            println!("  Sheet: {} x {}", job.sheet_width, job.sheet_height);
        }

        for &strategy in &self.config.strategies {
            if self.config.show_progress {
                println!("  Running {}...", strategy);
            }

            for run_idx in 0..self.config.runs_per_config {
                let run = self.run_once(job, &parts, strategy, run_idx, &cache);
                if self.config.show_progress {
                    println!(
                        "    Run {}: sheets={}, placed={}/{}, util={:.1}%, time={}ms",
                        run_idx + 1,
                        run.sheets,
                        run.placed,
                        parts.len(),
                        run.utilization * 100.0,
                        run.time_ms
                    );
                }
                results.add_run(run);
            }
        }

        Ok(results)
    }

    /// Runs several jobs and merges their results.
    pub fn run_jobs(&self, jobs: &[Job]) -> Result<BenchmarkResult, JobError> {
        let mut combined = BenchmarkResult::new();
        for job in jobs {
            combined.merge(self.run_job(job)?);
        }
        Ok(combined)
    }

    fn run_once(
        &self,
        job: &Job,
        parts: &[Part],
        strategy: Strategy,
        run_idx: usize,
        cache: &Arc<NfpCache>,
    ) -> RunResult {
        let config = self.nest_config(job, strategy, run_idx);
        match Nester::new(config).with_cache(Arc::clone(cache)).nest(parts) {
            Ok(result) => RunResult::from_nest(&job.name, &result),
            Err(e) => {
                log::warn!("{} on '{}' failed: {}", strategy, job.name, e);
                if self.config.show_progress {
                    println!("    Run {} failed: {}", run_idx + 1, e);
                }
                let ids = parts.iter().map(|p| p.id().to_string()).collect();
                RunResult::failed(&job.name, strategy, ids)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::JobItem;

    fn squares_job() -> Job {
        Job {
            name: "squares".to_string(),
            sheet_width: 100.0,
            sheet_height: 100.0,
            spacing: 0.0,
            sheet_spacing: 0.0,
            items: vec![JobItem {
                id: "sq".to_string(),
                quantity: 4,
                rotation_steps: 1,
                exterior: vec![[0.0, 0.0], [40.0, 0.0], [40.0, 40.0], [0.0, 40.0]],
                holes: Vec::new(),
            }],
        }
    }

    #[test]
    fn test_seed_offsets_per_run() {
        let runner = BenchmarkRunner::new(BenchmarkConfig::new().with_seed(10));
        let job = squares_job();
        let first = runner.nest_config(&job, Strategy::Genetic, 0);
        let second = runner.nest_config(&job, Strategy::Genetic, 1);
        assert_eq!(first.genetic.seed, Some(10));
        assert_eq!(second.genetic.seed, Some(11));
        assert_eq!(second.gravity.seed, Some(11));
    }

    #[test]
    fn test_run_job_records_every_run() {
        let config = BenchmarkConfig::new()
            .with_strategies(vec![Strategy::Genetic, Strategy::Sat])
            .with_runs_per_config(2)
            .with_seed(1)
            .with_genetic(6, 3)
            .with_progress(false);
        let results = BenchmarkRunner::new(config).run_job(&squares_job()).unwrap();

        assert_eq!(results.runs.len(), 4);
        for run in &results.runs {
            assert_eq!(run.sheets, 1);
            assert_eq!(run.placed, 4);
            assert!(run.unplaced.is_empty());
        }
    }
}
