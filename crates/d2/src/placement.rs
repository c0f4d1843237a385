//! Placement search: candidate generation and multi-rotation scoring.

use crate::collision::{self, CONTAINMENT_TOLERANCE};
use crate::geometry::{Bounds, Polygon2D};
use crate::nfp::{self, NfpCache};
use crate::part::Part;
use crate::region::BOUNDARY_TOLERANCE;
use crate::sheet::Sheet;
use rayon::prelude::*;
use sheetnest_core::{FillDirection, NfpConfig, PlacementConfig, Result};
use std::cmp::Ordering;

/// A proposed pose for a part on a sheet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    /// Reference point x (centroid).
    pub x: f64,
    /// Reference point y (centroid).
    pub y: f64,
    /// Rotation in degrees.
    pub angle: f64,
    /// Fill-direction score; lower is better.
    pub score: f64,
    /// True if the part sits inside a hole of the placed parts.
    pub in_hole: bool,
}

impl Placement {
    /// Orders placements from different angles by score alone. The hole tier
    /// only decides which candidate wins within one angle.
    pub fn rank(&self, other: &Placement) -> Ordering {
        self.score.total_cmp(&other.score)
    }
}

/// Reference-point range that keeps a centered polygon's bounding box inside the bin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeasibleRange {
    /// Smallest x.
    pub min_x: f64,
    /// Smallest y.
    pub min_y: f64,
    /// Largest x.
    pub max_x: f64,
    /// Largest y.
    pub max_y: f64,
}

impl FeasibleRange {
    /// Range for a polygon with the given bounds (relative to its reference
    /// point), or `None` if it cannot fit the bin at all.
    pub fn new(bounds: &Bounds, width: f64, height: f64) -> Option<Self> {
        let range = Self {
            min_x: -bounds.min_x,
            min_y: -bounds.min_y,
            max_x: width - bounds.max_x,
            max_y: height - bounds.max_y,
        };
        let fits = range.min_x <= range.max_x + CONTAINMENT_TOLERANCE
            && range.min_y <= range.max_y + CONTAINMENT_TOLERANCE;
        fits.then(|| Self {
            max_x: range.max_x.max(range.min_x),
            max_y: range.max_y.max(range.min_y),
            ..range
        })
    }

    /// The four placements flush with the bin corners.
    pub fn corners(&self) -> [(f64, f64); 4] {
        [
            (self.min_x, self.min_y),
            (self.max_x, self.min_y),
            (self.min_x, self.max_y),
            (self.max_x, self.max_y),
        ]
    }

    /// Snaps a point to the range, or `None` if it is clearly outside.
    pub fn clamp(&self, (x, y): (f64, f64)) -> Option<(f64, f64)> {
        let t = CONTAINMENT_TOLERANCE;
        let inside = x >= self.min_x - t
            && x <= self.max_x + t
            && y >= self.min_y - t
            && y <= self.max_y + t;
        inside.then(|| {
            (
                x.clamp(self.min_x, self.max_x),
                y.clamp(self.min_y, self.max_y),
            )
        })
    }
}

/// Sorts points by score and drops near-duplicates.
pub(crate) fn ordered_candidates(
    points: impl IntoIterator<Item = (f64, f64)>,
    direction: &FillDirection,
    sheet_width: f64,
) -> Vec<(f64, (f64, f64))> {
    let mut scored: Vec<(f64, (f64, f64))> = points
        .into_iter()
        .map(|(x, y)| (direction.score(x, y, sheet_width), (x, y)))
        .collect();
    scored.sort_by(|a, b| {
        a.0.total_cmp(&b.0)
            .then(a.1 .0.total_cmp(&b.1 .0))
            .then(a.1 .1.total_cmp(&b.1 .1))
    });
    scored.dedup_by(|a, b| {
        (a.1 .0 - b.1 .0).abs() < CONTAINMENT_TOLERANCE
            && (a.1 .1 - b.1 .1).abs() < CONTAINMENT_TOLERANCE
    });
    scored
}

/// Finds the best valid placement of a part on a sheet across its allowed rotations.
pub struct PlacementOptimizer<'a> {
    cache: &'a NfpCache,
    nfp: &'a NfpConfig,
    config: &'a PlacementConfig,
}

impl<'a> PlacementOptimizer<'a> {
    /// Creates an optimizer.
    pub fn new(cache: &'a NfpCache, nfp: &'a NfpConfig, config: &'a PlacementConfig) -> Self {
        Self { cache, nfp, config }
    }

    /// Best placement across all allowed angles, without touching the part.
    ///
    /// Angles are evaluated independently (in parallel when enabled); the
    /// winner is chosen afterwards on the calling thread, ties going to the
    /// earlier angle.
    pub fn find_best(&self, part: &Part, sheet: &Sheet) -> Result<Option<Placement>> {
        let angles = part.allowed_angles();
        let per_angle: Vec<Option<Placement>> = if self.config.parallel && angles.len() > 1 {
            angles
                .par_iter()
                .map(|&angle| self.best_for_angle(part, sheet, angle))
                .collect::<Result<_>>()?
        } else {
            angles
                .iter()
                .map(|&angle| self.best_for_angle(part, sheet, angle))
                .collect::<Result<_>>()?
        };

        Ok(per_angle
            .into_iter()
            .flatten()
            .reduce(|best, p| if p.rank(&best) == Ordering::Less { p } else { best }))
    }

    /// Moves the part to its best placement. Leaves it untouched on failure.
    pub fn place(&self, part: &mut Part, sheet: &Sheet) -> Result<Option<Placement>> {
        let best = self.find_best(part, sheet)?;
        if let Some(p) = best {
            part.set_pose(p.x, p.y, p.angle);
        }
        Ok(best)
    }

    /// Best placement at one angle: hole candidates first, then exterior ones.
    pub fn best_for_angle(
        &self,
        part: &Part,
        sheet: &Sheet,
        angle: f64,
    ) -> Result<Option<Placement>> {
        let rotated = part.rotated_template(angle);
        let Some(range) = FeasibleRange::new(&rotated.bounds(), sheet.width(), sheet.height())
        else {
            return Ok(None);
        };
        let direction = &self.config.fill_direction;

        if sheet.is_empty() {
            let best = ordered_candidates(range.corners(), direction, sheet.width())
                .into_iter()
                .next();
            return Ok(best.map(|(score, (x, y))| Placement {
                x,
                y,
                angle,
                score,
                in_hole: false,
            }));
        }

        let union = nfp::sheet_union(self.cache, self.nfp, sheet, part, angle)?;
        let points = union.candidate_points(self.nfp);
        let prepared = union.prepared();

        let hole_tier: Vec<(f64, f64)> =
            points.holes.iter().filter_map(|&p| range.clamp(p)).collect();
        let exterior_tier: Vec<(f64, f64)> = points
            .exterior
            .iter()
            .filter_map(|&p| range.clamp(p))
            .chain(range.corners())
            .collect();

        for (in_hole, tier) in [(true, hole_tier), (false, exterior_tier)] {
            for (score, (x, y)) in ordered_candidates(tier, direction, sheet.width()) {
                if prepared.contains_strictly((x, y), BOUNDARY_TOLERANCE) {
                    continue;
                }
                if self.confirm(&rotated, x, y, sheet) {
                    return Ok(Some(Placement {
                        x,
                        y,
                        angle,
                        score,
                        in_hole,
                    }));
                }
            }
        }
        Ok(None)
    }

    /// Exact check of a candidate that passed the forbidden-region test.
    fn confirm(&self, rotated: &Polygon2D, x: f64, y: f64, sheet: &Sheet) -> bool {
        collision::valid_with_holes(&rotated.translated(x, y), sheet, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn square_part(size: f64, steps: u32) -> Part {
        Part::new("sq", Polygon2D::rectangle(size, size), 0.0, steps).unwrap()
    }

    #[test]
    fn test_feasible_range() {
        let bounds = Bounds {
            min_x: -5.0,
            min_y: -5.0,
            max_x: 5.0,
            max_y: 5.0,
        };
        let range = FeasibleRange::new(&bounds, 100.0, 50.0).unwrap();
        assert_eq!(range.corners()[0], (5.0, 5.0));
        assert_eq!(range.corners()[3], (95.0, 45.0));
        assert!(range.clamp((200.0, 5.0)).is_none());
        assert!(FeasibleRange::new(&bounds, 8.0, 50.0).is_none());
    }

    #[test]
    fn test_empty_sheet_bottom_left() {
        let cache = NfpCache::new();
        let nfp = NfpConfig::default();
        let config = PlacementConfig::default();
        let optimizer = PlacementOptimizer::new(&cache, &nfp, &config);
        let sheet = Sheet::new(0, 100.0, 100.0, 0.0);
        let mut part = square_part(10.0, 4);

        let placement = optimizer.place(&mut part, &sheet).unwrap().unwrap();
        assert_relative_eq!(placement.x, 5.0, epsilon = 1e-9);
        assert_relative_eq!(placement.y, 5.0, epsilon = 1e-9);
        assert_eq!(placement.angle, 0.0);
        let b = part.bounds();
        assert_relative_eq!(b.min_x, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_too_large_part_has_no_placement() {
        let cache = NfpCache::new();
        let nfp = NfpConfig::default();
        let config = PlacementConfig::default();
        let optimizer = PlacementOptimizer::new(&cache, &nfp, &config);
        let sheet = Sheet::new(0, 100.0, 100.0, 0.0);
        let mut part = square_part(150.0, 4);

        assert!(optimizer.place(&mut part, &sheet).unwrap().is_none());
        assert_eq!(part.position(), (0.0, 0.0));
    }

    #[test]
    fn test_rank_by_score_only() {
        let hole = Placement {
            x: 0.0,
            y: 0.0,
            angle: 0.0,
            score: 100.0,
            in_hole: true,
        };
        let outside = Placement {
            score: 1.0,
            in_hole: false,
            ..hole
        };
        assert_eq!(outside.rank(&hole), Ordering::Less);
        assert_eq!(hole.rank(&Placement { angle: 90.0, ..hole }), Ordering::Equal);
    }

    #[cfg(feature = "overlay")]
    #[test]
    fn test_lower_score_wins_across_angles() {
        let cache = NfpCache::new();
        let nfp = NfpConfig::default();
        let config = PlacementConfig::default();
        let optimizer = PlacementOptimizer::new(&cache, &nfp, &config);
        let mut sheet = Sheet::new(0, 200.0, 100.0, 0.0);

        // Slot hole 40x12 near the top: the 30x10 part fits only unrotated.
        let slotted = Polygon2D::rectangle(60.0, 60.0).with_hole(vec![
            (10.0, 40.0),
            (10.0, 52.0),
            (50.0, 52.0),
            (50.0, 40.0),
        ]);
        let mut frame = Part::new("slotted", slotted, 0.0, 1).unwrap();
        let b = frame.original_polygon().bounds();
        frame.set_pose(-b.min_x, -b.min_y, 0.0);
        sheet.add_part(&frame);

        let bar = Part::new("bar", Polygon2D::rectangle(30.0, 10.0), 0.0, 4).unwrap();
        let flat = optimizer.best_for_angle(&bar, &sheet, 0.0).unwrap().unwrap();
        assert!(flat.in_hole);

        let best = optimizer.find_best(&bar, &sheet).unwrap().unwrap();
        assert!(!best.in_hole);
        assert!(best.score < flat.score);
        assert_eq!(best.angle, 90.0);
    }

    #[cfg(feature = "overlay")]
    #[test]
    fn test_second_part_packs_next_to_first() {
        let cache = NfpCache::new();
        let nfp = NfpConfig::default();
        let config = PlacementConfig::default().with_parallel(false);
        let optimizer = PlacementOptimizer::new(&cache, &nfp, &config);
        let mut sheet = Sheet::new(0, 100.0, 100.0, 0.0);
        let mut parts = square_part(10.0, 1).instances(2);

        optimizer.place(&mut parts[0], &sheet).unwrap().unwrap();
        sheet.add_part(&parts[0]);
        let second = optimizer.place(&mut parts[1], &sheet).unwrap().unwrap();

        assert_relative_eq!(second.y, 5.0, epsilon = 1e-6);
        assert_relative_eq!(second.x, 15.0, epsilon = 1e-6);
        assert!(!collision::overlaps(parts[0].polygon(), parts[1].polygon()));
    }
}
