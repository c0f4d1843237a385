//! Benchmark result types and recording.

use serde::{Deserialize, Serialize};
use sheetnest_d2::{NestResult, Strategy};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

/// Result of a single nesting run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    /// Job name
    pub job: String,
    /// Strategy used
    pub strategy: String,
    /// Sheets opened
    pub sheets: usize,
    /// Parts placed
    pub placed: usize,
    /// Ids of parts that fit nowhere
    pub unplaced: Vec<String>,
    /// Placed part area over used sheet area (0.0 - 1.0)
    pub utilization: f64,
    /// Computation time in milliseconds
    pub time_ms: u64,
    /// Generations evolved (genetic only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generations: Option<u32>,
}

impl RunResult {
    /// Builds a run result from a finished nest.
    pub fn from_nest(job: &str, result: &NestResult) -> Self {
        let summary = &result.summary;
        Self {
            job: job.to_string(),
            strategy: summary.strategy.to_string(),
            sheets: summary.sheets_used,
            placed: summary.placed,
            unplaced: summary.unplaced.clone(),
            utilization: summary.utilization,
            time_ms: summary.computation_time_ms,
            generations: summary.generations,
        }
    }

    /// Result for a run that failed before placing anything.
    pub fn failed(job: &str, strategy: Strategy, unplaced: Vec<String>) -> Self {
        Self {
            job: job.to_string(),
            strategy: strategy.to_string(),
            sheets: 0,
            placed: 0,
            unplaced,
            utilization: 0.0,
            time_ms: 0,
            generations: None,
        }
    }
}

/// Collection of run results.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct BenchmarkResult {
    /// Individual run results
    pub runs: Vec<RunResult>,
    /// Seconds since the Unix epoch when the benchmark started
    pub started_at: u64,
    /// Crate version that produced the results
    pub version: String,
}

impl BenchmarkResult {
    /// Creates an empty result stamped with the current time.
    pub fn new() -> Self {
        let started_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        Self {
            runs: Vec::new(),
            started_at,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Adds a run result.
    pub fn add_run(&mut self, result: RunResult) {
        self.runs.push(result);
    }

    /// Appends all runs of another result.
    pub fn merge(&mut self, other: BenchmarkResult) {
        self.runs.extend(other.runs);
    }

    /// Saves results to a JSON file.
    pub fn save_json(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)
    }

    /// Prints a summary table to stdout.
    pub fn print_summary(&self) {
        println!("\n{:=<90}", "");
        println!("BENCHMARK RESULTS");
        println!("{:=<90}", "");
        println!(
            "{:<20} {:<10} {:>8} {:>8} {:>10} {:>10} {:>10}",
            "Job", "Strategy", "Sheets", "Placed", "Unplaced", "Util%", "Time(ms)"
        );
        println!("{:-<90}", "");

        for run in &self.runs {
            println!(
                "{:<20} {:<10} {:>8} {:>8} {:>10} {:>10.1} {:>10}",
                run.job,
                run.strategy,
                run.sheets,
                run.placed,
                run.unplaced.len(),
                run.utilization * 100.0,
                run.time_ms,
            );
        }

        println!("{:-<90}", "");
        for s in self.summary_by_strategy() {
            println!(
                "{:<20} {:<10} {:>8.1} {:>8} {:>10} {:>10.1} {:>10}",
                "average",
                s.strategy,
                s.avg_sheets,
                "",
                "",
                s.avg_utilization * 100.0,
                s.avg_time_ms
            );
        }
        println!("{:=<90}\n", "");
    }

    /// Computes summary statistics grouped by strategy, sorted by name.
    pub fn summary_by_strategy(&self) -> Vec<StrategySummary> {
        let mut by_strategy: BTreeMap<&str, Vec<&RunResult>> = BTreeMap::new();
        for run in &self.runs {
            by_strategy.entry(&run.strategy).or_default().push(run);
        }

        by_strategy
            .into_iter()
            .map(|(strategy, runs)| {
                let n = runs.len() as f64;
                StrategySummary {
                    strategy: strategy.to_string(),
                    run_count: runs.len(),
                    avg_sheets: runs.iter().map(|r| r.sheets as f64).sum::<f64>() / n,
                    avg_utilization: runs.iter().map(|r| r.utilization).sum::<f64>() / n,
                    avg_time_ms: (runs.iter().map(|r| r.time_ms).sum::<u64>() as f64 / n) as u64,
                    total_unplaced: runs.iter().map(|r| r.unplaced.len()).sum(),
                }
            })
            .collect()
    }
}

/// Summary statistics for a strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategySummary {
    pub strategy: String,
    pub run_count: usize,
    pub avg_sheets: f64,
    pub avg_utilization: f64,
    pub avg_time_ms: u64,
    pub total_unplaced: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(strategy: &str, sheets: usize, utilization: f64, time_ms: u64) -> RunResult {
        RunResult {
            job: "job".to_string(),
            strategy: strategy.to_string(),
            sheets,
            placed: 4,
            unplaced: Vec::new(),
            utilization,
            time_ms,
            generations: None,
        }
    }

    #[test]
    fn test_summary_by_strategy() {
        let mut results = BenchmarkResult::new();
        results.add_run(run("greedy", 2, 0.5, 10));
        results.add_run(run("greedy", 4, 0.7, 30));
        results.add_run(run("sat", 3, 0.4, 5));

        let summary = results.summary_by_strategy();
        assert_eq!(summary.len(), 2);
        assert_eq!(summary[0].strategy, "greedy");
        assert_eq!(summary[0].run_count, 2);
        assert!((summary[0].avg_sheets - 3.0).abs() < 1e-9);
        assert!((summary[0].avg_utilization - 0.6).abs() < 1e-9);
        assert_eq!(summary[0].avg_time_ms, 20);
        assert_eq!(summary[1].strategy, "sat");
    }

    #[test]
    fn test_failed_run_lists_every_part() {
        let failed = RunResult::failed("job", Strategy::Sat, vec!["a".into(), "b".into()]);
        assert_eq!(failed.strategy, "sat");
        assert_eq!(failed.placed, 0);
        assert_eq!(failed.unplaced.len(), 2);
    }
}
