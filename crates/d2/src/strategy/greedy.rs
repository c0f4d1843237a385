//! Greedy NFP-driven placement.

use super::{place_on_sheets, NestingStrategy, SheetPlacer, StrategyContext, StrategyOutcome};
use crate::part::Part;
use crate::placement::PlacementOptimizer;
use crate::sheet::Sheet;
use sheetnest_core::Result;

/// Places each part at the best NFP candidate on the first sheet that takes it.
#[derive(Debug, Clone, Copy, Default)]
pub struct GreedyStrategy;

impl GreedyStrategy {
    /// Creates the strategy.
    pub fn new() -> Self {
        Self
    }
}

impl SheetPlacer for GreedyStrategy {
    fn try_place(
        &mut self,
        part: &mut Part,
        sheet: &Sheet,
        ctx: &StrategyContext<'_>,
    ) -> Result<bool> {
        let optimizer =
            PlacementOptimizer::new(ctx.cache, &ctx.config.nfp, &ctx.config.placement);
        Ok(optimizer.place(part, sheet)?.is_some())
    }
}

impl NestingStrategy for GreedyStrategy {
    fn place(&mut self, parts: Vec<Part>, ctx: &StrategyContext<'_>) -> Result<StrategyOutcome> {
        place_on_sheets(self, parts, ctx)
    }
}

#[cfg(all(test, feature = "overlay"))]
mod tests {
    use super::*;
    use crate::collision;
    use crate::geometry::Polygon2D;
    use crate::nfp::NfpCache;
    use sheetnest_core::NestConfig;

    #[test]
    fn test_greedy_fills_one_sheet() {
        let config = NestConfig::new(100.0, 100.0);
        let cache = NfpCache::new();
        let ctx = StrategyContext::new(&config, &cache);
        let parts = Part::new("sq", Polygon2D::rectangle(20.0, 20.0), 0.0, 1)
            .unwrap()
            .instances(8);

        let outcome = GreedyStrategy::new().place(parts, &ctx).unwrap();

        assert_eq!(outcome.sheets.len(), 1);
        assert!(outcome.unplaced.is_empty());
        let placed = outcome.sheets[0].parts();
        assert_eq!(placed.len(), 8);
        for (i, a) in placed.iter().enumerate() {
            assert!(collision::contains(100.0, 100.0, a.polygon()));
            for b in &placed[i + 1..] {
                assert!(!collision::overlaps(a.polygon(), b.polygon()));
            }
        }
        assert!(cache.hits() > 0);
    }
}
