//! Packing strategies.
//!
//! Every strategy turns an ordered list of parts into sheets plus unplaced
//! parts. Greedy, gravity and SAT share the same sheet loop ([`place_on_sheets`])
//! and only differ in how they place one part on one sheet ([`SheetPlacer`]);
//! the genetic strategy searches over whole layouts instead.

mod genetic;
mod gravity;
mod greedy;
mod sat;

pub use genetic::{Chromosome, Gene, GeneticStrategy, GridLayout, GridSlot, NestingProblem};
pub use gravity::GravityStrategy;
pub use greedy::GreedyStrategy;
pub use sat::{separating_axis_collides, SatStrategy};

use crate::geometry::EPSILON;
use crate::nester::PlacementObserver;
use crate::nfp::NfpCache;
use crate::part::Part;
use crate::sheet::Sheet;
use sheetnest_core::{NestConfig, Result};

/// Shared inputs of a strategy run.
pub struct StrategyContext<'a> {
    /// Run configuration.
    pub config: &'a NestConfig,
    /// NFP cache owned by the caller.
    pub cache: &'a NfpCache,
    /// Optional placement observer.
    pub observer: Option<&'a dyn PlacementObserver>,
}

impl<'a> StrategyContext<'a> {
    /// Creates a context without observer.
    pub fn new(config: &'a NestConfig, cache: &'a NfpCache) -> Self {
        Self {
            config,
            cache,
            observer: None,
        }
    }

    /// Attaches an observer.
    pub fn with_observer(mut self, observer: &'a dyn PlacementObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    /// A new empty sheet with the configured size.
    pub fn new_sheet(&self, id: usize) -> Sheet {
        Sheet::new(
            id,
            self.config.sheet_width,
            self.config.sheet_height,
            self.config.sheet_spacing,
        )
    }

    /// Reports an accepted placement.
    pub fn notify(&self, part: &Part, sheet: &Sheet) {
        if let Some(observer) = self.observer {
            observer.on_placement_accepted(part, sheet);
        }
    }
}

/// What a strategy produced.
#[derive(Debug, Default)]
pub struct StrategyOutcome {
    /// Sheets holding at least one part, in creation order.
    pub sheets: Vec<Sheet>,
    /// Parts that fit nowhere.
    pub unplaced: Vec<Part>,
    /// Generations evolved (genetic).
    pub generations: Option<u32>,
    /// Best cost (genetic).
    pub best_fitness: Option<f64>,
    /// Best cost per generation (genetic).
    pub fitness_history: Option<Vec<f64>>,
}

/// A packing strategy.
pub trait NestingStrategy {
    /// Places the parts, in the given order, onto as many sheets as needed.
    fn place(&mut self, parts: Vec<Part>, ctx: &StrategyContext<'_>) -> Result<StrategyOutcome>;
}

/// Places one part on one sheet.
pub trait SheetPlacer {
    /// Moves `part` to a valid pose on `sheet` and returns true, or returns false
    /// and leaves the part untouched.
    fn try_place(&mut self, part: &mut Part, sheet: &Sheet, ctx: &StrategyContext<'_>)
        -> Result<bool>;
}

/// Sorts parts by area, largest first. Equal areas keep their order.
pub fn sort_by_area_desc(parts: &mut [Part]) {
    parts.sort_by(|a, b| b.area().total_cmp(&a.area()));
}

/// Runs the multi-sheet loop.
///
/// Each part tries the open sheets in creation order, skipping sheets whose
/// remaining area is already smaller than the part. If none accepts it a fresh
/// sheet is opened; a part that fails on that empty sheet is unplaceable and the
/// fresh sheet is discarded.
pub fn place_on_sheets<P: SheetPlacer>(
    placer: &mut P,
    parts: Vec<Part>,
    ctx: &StrategyContext<'_>,
) -> Result<StrategyOutcome> {
    let mut outcome = StrategyOutcome::default();
    let total = parts.len();

    for (i, mut part) in parts.into_iter().enumerate() {
        log::debug!("processing part {}/{} ({})", i + 1, total, part.id());

        let mut accepted = None;
        for (k, sheet) in outcome.sheets.iter().enumerate() {
            if sheet.remaining_area() + EPSILON < part.area() {
                continue;
            }
            if placer.try_place(&mut part, sheet, ctx)? {
                accepted = Some(k);
                break;
            }
        }

        if accepted.is_none() {
            let sheet = ctx.new_sheet(outcome.sheets.len());
            if placer.try_place(&mut part, &sheet, ctx)? {
                outcome.sheets.push(sheet);
                accepted = Some(outcome.sheets.len() - 1);
            }
        }

        match accepted {
            Some(k) => {
                let sheet = &mut outcome.sheets[k];
                sheet.add_part(&part);
                log::debug!("placed {} on sheet {}", part.id(), sheet.id());
                ctx.notify(&part, sheet);
            }
            None => {
                log::debug!("failed to place {}", part.id());
                outcome.unplaced.push(part);
            }
        }
    }

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Polygon2D;
    use std::sync::Mutex;

    /// Places parts at the bin's lower-left corner on empty sheets only.
    struct CornerOnly {
        attempts: usize,
    }

    impl SheetPlacer for CornerOnly {
        fn try_place(
            &mut self,
            part: &mut Part,
            sheet: &Sheet,
            _ctx: &StrategyContext<'_>,
        ) -> Result<bool> {
            self.attempts += 1;
            if !sheet.is_empty() {
                return Ok(false);
            }
            let b = part.original_polygon().bounds();
            if b.width() > sheet.width() || b.height() > sheet.height() {
                return Ok(false);
            }
            part.set_pose(-b.min_x, -b.min_y, 0.0);
            Ok(true)
        }
    }

    #[test]
    fn test_sheet_loop_opens_sheets_and_reports_unplaced() {
        let config = NestConfig::new(100.0, 100.0);
        let cache = NfpCache::new();
        let seen = Mutex::new(Vec::new());
        let observer = |part: &Part, sheet: &Sheet| {
            seen.lock().unwrap().push((part.id().to_string(), sheet.id()));
        };
        let ctx = StrategyContext::new(&config, &cache).with_observer(&observer);

        let mut parts = Part::new("sq", Polygon2D::rectangle(10.0, 10.0), 0.0, 1)
            .unwrap()
            .instances(2);
        parts.push(Part::new("big", Polygon2D::rectangle(150.0, 150.0), 0.0, 1).unwrap());

        let mut placer = CornerOnly { attempts: 0 };
        let outcome = place_on_sheets(&mut placer, parts, &ctx).unwrap();

        assert_eq!(outcome.sheets.len(), 2);
        assert_eq!(outcome.unplaced.len(), 1);
        assert_eq!(outcome.unplaced[0].id(), "big");
        // The oversized part skips both used sheets and fails once on a fresh one.
        assert_eq!(placer.attempts, 4);
        assert_eq!(
            *seen.lock().unwrap(),
            vec![("sq_0".to_string(), 0), ("sq_1".to_string(), 1)]
        );
    }

    #[test]
    fn test_sort_by_area_desc() {
        let small = Part::new("s", Polygon2D::rectangle(1.0, 1.0), 0.0, 1).unwrap();
        let large = Part::new("l", Polygon2D::rectangle(5.0, 5.0), 0.0, 1).unwrap();
        let mut parts = vec![small, large];
        sort_by_area_desc(&mut parts);
        assert_eq!(parts[0].id(), "l");
    }
}
