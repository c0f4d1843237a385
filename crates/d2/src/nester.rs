//! Nesting orchestrator.

use crate::clip;
use crate::nfp::NfpCache;
use crate::part::Part;
use crate::sheet::Sheet;
use crate::strategy::{
    sort_by_area_desc, GeneticStrategy, GravityStrategy, GreedyStrategy, NestingStrategy,
    SatStrategy, StrategyContext, StrategyOutcome,
};
use sheetnest_core::{ConcavePolicy, Error, NestConfig, Result, RunSummary, Strategy};
use std::sync::Arc;
use std::time::Instant;

/// Receives every accepted placement.
///
/// Called synchronously on the thread that runs the strategy, right after the
/// part was added to the sheet. It cannot influence the run.
pub trait PlacementObserver: Send + Sync {
    /// A part was placed on a sheet.
    fn on_placement_accepted(&self, part: &Part, sheet: &Sheet);
}

impl<F> PlacementObserver for F
where
    F: Fn(&Part, &Sheet) + Send + Sync,
{
    fn on_placement_accepted(&self, part: &Part, sheet: &Sheet) {
        self(part, sheet)
    }
}

/// Result of a nesting run.
#[derive(Debug)]
pub struct NestResult {
    /// Sheets holding at least one part, in creation order.
    pub sheets: Vec<Sheet>,
    /// Parts that could not be placed, at their last pose.
    pub unplaced: Vec<Part>,
    /// Counts, utilization and timing.
    pub summary: RunSummary,
}

impl NestResult {
    /// Number of placed parts across all sheets.
    pub fn placed_count(&self) -> usize {
        self.sheets.iter().map(|s| s.parts().len()).sum()
    }
}

/// Runs one strategy over a list of parts.
///
/// The NFP cache is owned by the nester and survives across runs; share it
/// between nesters with [`Nester::with_cache`].
pub struct Nester {
    config: NestConfig,
    cache: Arc<NfpCache>,
    observer: Option<Arc<dyn PlacementObserver>>,
}

impl Nester {
    /// Creates a nester with a fresh cache sized by `config.nfp`.
    pub fn new(config: NestConfig) -> Self {
        let cache = Arc::new(NfpCache::from_config(&config.nfp));
        Self {
            config,
            cache,
            observer: None,
        }
    }

    /// Uses an existing cache.
    pub fn with_cache(mut self, cache: Arc<NfpCache>) -> Self {
        self.cache = cache;
        self
    }

    /// Attaches a placement observer.
    pub fn with_observer(mut self, observer: Arc<dyn PlacementObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// The run configuration.
    pub fn config(&self) -> &NestConfig {
        &self.config
    }

    /// The NFP cache.
    pub fn cache(&self) -> &Arc<NfpCache> {
        &self.cache
    }

    /// Nests copies of the given parts.
    ///
    /// Parts are sorted by area, largest first, before the strategy sees them.
    /// Fails before any placement if the configuration is invalid, the
    /// strategy's geometry backend is compiled out, or SAT is given concave
    /// parts under [`ConcavePolicy::Reject`]. Parts that fit nowhere are
    /// reported in [`NestResult::unplaced`], not as errors.
    pub fn nest(&self, parts: &[Part]) -> Result<NestResult> {
        let start = Instant::now();
        self.config.validate()?;
        self.check_backend()?;
        self.check_convexity(parts)?;

        let strategy = self.config.strategy;
        let mut ordered = parts.to_vec();
        sort_by_area_desc(&mut ordered);
        log::info!(
            "nesting {} parts with strategy {} on {}x{} sheets",
            ordered.len(),
            strategy,
            self.config.sheet_width,
            self.config.sheet_height
        );

        let mut ctx = StrategyContext::new(&self.config, &self.cache);
        if let Some(observer) = self.observer.as_deref() {
            ctx = ctx.with_observer(observer);
        }
        let outcome = match strategy {
            Strategy::Greedy => GreedyStrategy::new().place(ordered, &ctx),
            Strategy::Gravity => GravityStrategy::new(self.config.gravity.clone()).place(ordered, &ctx),
            Strategy::Genetic => GeneticStrategy::new(self.config.genetic.clone()).place(ordered, &ctx),
            Strategy::Sat => SatStrategy::new()
                .with_parallel(self.config.placement.parallel)
                .place(ordered, &ctx),
        }?;

        let result = self.finish(outcome, start);
        log::info!(
            "nesting finished: {} placed on {} sheets, {} unplaced, utilization {}, {} ms",
            result.summary.placed,
            result.summary.sheets_used,
            result.summary.unplaced.len(),
            result.summary.utilization_percent(),
            result.summary.computation_time_ms
        );
        Ok(result)
    }

    fn check_backend(&self) -> Result<()> {
        let strategy = self.config.strategy;
        if strategy.requires_boolean_ops() && !clip::AVAILABLE {
            return Err(Error::DependencyMissing {
                strategy: strategy.to_string(),
                dependency: clip::BACKEND_NAME.to_string(),
            });
        }
        Ok(())
    }

    fn check_convexity(&self, parts: &[Part]) -> Result<()> {
        if self.config.strategy != Strategy::Sat {
            return Ok(());
        }
        let concave: Vec<&str> = parts
            .iter()
            .filter(|p| !p.is_convex())
            .map(Part::id)
            .collect();
        if concave.is_empty() {
            return Ok(());
        }
        match self.config.sat.concave_policy {
            ConcavePolicy::Reject => Err(Error::UnsupportedGeometry(format!(
                "SAT strategy requires convex parts, got concave: {}",
                concave.join(", ")
            ))),
            ConcavePolicy::ConvexHull => {
                log::warn!(
                    "SAT strategy packs {} concave parts by their convex hulls",
                    concave.len()
                );
                Ok(())
            }
        }
    }

    fn finish(&self, outcome: StrategyOutcome, start: Instant) -> NestResult {
        let sheet_area = self.config.sheet_width * self.config.sheet_height;
        let used_area: f64 = outcome
            .sheets
            .iter()
            .flat_map(|s| s.parts())
            .map(|p| p.unbuffered_area())
            .sum();

        let mut summary = RunSummary::new(self.config.strategy);
        summary.sheets_used = outcome.sheets.len();
        summary.placed = outcome.sheets.iter().map(|s| s.parts().len()).sum();
        summary.unplaced = outcome.unplaced.iter().map(|p| p.id().to_string()).collect();
        if summary.sheets_used > 0 {
            summary.utilization = used_area / (summary.sheets_used as f64 * sheet_area);
        }
        summary.generations = outcome.generations;
        summary.best_fitness = outcome.best_fitness;
        summary.fitness_history = outcome.fitness_history;
        summary.computation_time_ms = start.elapsed().as_millis() as u64;

        NestResult {
            sheets: outcome.sheets,
            unplaced: outcome.unplaced,
            summary,
        }
    }
}
