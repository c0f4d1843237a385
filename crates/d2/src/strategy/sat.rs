//! Separating-axis packing for convex parts.
//!
//! Candidates align a vertex of the candidate with a vertex of an already placed
//! part; collisions are decided with the separating axis theorem, which is exact
//! only for convex polygons. Parts are collided through their convex hulls, so
//! concave parts never overlap but may leave their concavities empty.

use super::{place_on_sheets, NestingStrategy, SheetPlacer, StrategyContext, StrategyOutcome};
use crate::geometry::{ring_edges, Polygon2D, EPSILON};
use crate::part::Part;
use crate::placement::{ordered_candidates, FeasibleRange};
use crate::sheet::Sheet;
use rayon::prelude::*;
use sheetnest_core::{FillDirection, Result};

/// True if the two convex polygons overlap with positive area.
///
/// Every edge normal of both polygons is tried as a separating axis; a gap (or
/// exact contact) on any of them proves the polygons do not overlap.
pub fn separating_axis_collides(a: &[(f64, f64)], b: &[(f64, f64)]) -> bool {
    if a.len() < 3 || b.len() < 3 {
        return false;
    }
    let project = |ring: &[(f64, f64)], (nx, ny): (f64, f64)| {
        ring.iter()
            .map(|&(x, y)| x * nx + y * ny)
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), d| {
                (lo.min(d), hi.max(d))
            })
    };

    for (p, q) in ring_edges(a).chain(ring_edges(b)) {
        let (ex, ey) = (q.0 - p.0, q.1 - p.1);
        let len = (ex * ex + ey * ey).sqrt();
        if len <= EPSILON {
            continue;
        }
        let normal = (-ey / len, ex / len);
        let (a_lo, a_hi) = project(a, normal);
        let (b_lo, b_hi) = project(b, normal);
        if a_hi <= b_lo + EPSILON || b_hi <= a_lo + EPSILON {
            return false;
        }
    }
    true
}

/// SAT strategy.
#[derive(Debug, Clone, Copy)]
pub struct SatStrategy {
    parallel: bool,
}

impl Default for SatStrategy {
    fn default() -> Self {
        Self { parallel: true }
    }
}

impl SatStrategy {
    /// Creates the strategy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables or disables parallel rotation evaluation.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Best `(score, x, y)` for one angle.
    fn best_for_angle(
        part: &Part,
        sheet: &Sheet,
        hulls: &[Vec<(f64, f64)>],
        direction: &FillDirection,
        angle: f64,
    ) -> Option<(f64, f64, f64)> {
        let hull = Polygon2D::new(part.rotated_template(angle).convex_hull());
        let range = FeasibleRange::new(&hull.bounds(), sheet.width(), sheet.height())?;

        if sheet.is_empty() {
            let (x, y) = range.corners()[0];
            return Some((direction.score(x, y, sheet.width()), x, y));
        }

        let anchors = hulls.iter().flatten();
        let points = anchors.flat_map(|&(wx, wy)| {
            hull.exterior()
                .iter()
                .filter_map(move |&(ux, uy)| range.clamp((wx - ux, wy - uy)))
        });
        let candidates = ordered_candidates(
            points.chain(range.corners()).collect::<Vec<_>>(),
            direction,
            sheet.width(),
        );

        candidates.into_iter().find_map(|(score, (x, y))| {
            let moved = hull.translated(x, y);
            let clear = sheet
                .neighbors(&moved.bounds(), None)
                .into_iter()
                .all(|i| !separating_axis_collides(moved.exterior(), &hulls[i]));
            clear.then_some((score, x, y))
        })
    }
}

impl SheetPlacer for SatStrategy {
    fn try_place(
        &mut self,
        part: &mut Part,
        sheet: &Sheet,
        ctx: &StrategyContext<'_>,
    ) -> Result<bool> {
        let direction = &ctx.config.placement.fill_direction;
        let hulls: Vec<Vec<(f64, f64)>> =
            sheet.parts().iter().map(|p| p.polygon().convex_hull()).collect();
        let angles = part.allowed_angles();

        let evaluate = |&angle: &f64| {
            Self::best_for_angle(part, sheet, &hulls, direction, angle)
                .map(|(score, x, y)| (score, x, y, angle))
        };
        let results: Vec<Option<(f64, f64, f64, f64)>> = if self.parallel && angles.len() > 1 {
            angles.par_iter().map(evaluate).collect()
        } else {
            angles.iter().map(evaluate).collect()
        };

        let best = results
            .into_iter()
            .flatten()
            .reduce(|best, r| if r.0 < best.0 { r } else { best });
        match best {
            Some((_, x, y, angle)) => {
                part.set_pose(x, y, angle);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

impl NestingStrategy for SatStrategy {
    fn place(&mut self, parts: Vec<Part>, ctx: &StrategyContext<'_>) -> Result<StrategyOutcome> {
        self.parallel = ctx.config.placement.parallel;
        place_on_sheets(self, parts, ctx)
    }
}
