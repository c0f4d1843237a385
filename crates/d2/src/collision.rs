//! Containment and overlap predicates.
//!
//! All functions are pure: they read a sheet snapshot and never mutate it.
//! Touching (zero-area contact) is always allowed.

use crate::clip;
use crate::geometry::{Polygon2D, EPSILON};
use crate::region::Region;
use crate::sheet::Sheet;

/// Slack allowed when checking that a polygon stays inside the bin.
pub const CONTAINMENT_TOLERANCE: f64 = 1e-7;

/// True iff the polygon lies entirely within `[0, width] x [0, height]`.
pub fn contains(width: f64, height: f64, polygon: &Polygon2D) -> bool {
    let b = polygon.bounds();
    b.min_x >= -CONTAINMENT_TOLERANCE
        && b.min_y >= -CONTAINMENT_TOLERANCE
        && b.max_x <= width + CONTAINMENT_TOLERANCE
        && b.max_y <= height + CONTAINMENT_TOLERANCE
}

/// True iff the two polygons share more than [`EPSILON`] of area.
pub fn overlaps(a: &Polygon2D, b: &Polygon2D) -> bool {
    if !a.bounds().overlaps(&b.bounds()) {
        return false;
    }
    overlap_area(a, b) > EPSILON
}

/// Area shared by two polygons.
pub fn overlap_area(a: &Polygon2D, b: &Polygon2D) -> f64 {
    clip::intersection_area(std::slice::from_ref(a), std::slice::from_ref(b))
}

/// True iff the polygon is inside the sheet and overlaps no placed part other
/// than `ignore`.
pub fn valid_on_sheet(polygon: &Polygon2D, sheet: &Sheet, ignore: Option<&str>) -> bool {
    if !contains(sheet.width(), sheet.height(), polygon) {
        return false;
    }
    sheet
        .neighbors(&polygon.bounds(), ignore)
        .into_iter()
        .all(|i| !overlaps(polygon, sheet.parts()[i].polygon()))
}

/// Like [`valid_on_sheet`], but checks against the silhouettes (outer rings) of
/// the other parts first. A candidate that crosses a silhouette is still valid
/// when it sits entirely inside one hole of the union of those parts and does
/// not overlap any part already nested in that hole.
pub fn valid_with_holes(polygon: &Polygon2D, sheet: &Sheet, ignore: Option<&str>) -> bool {
    if !contains(sheet.width(), sheet.height(), polygon) {
        return false;
    }
    let neighbors: Vec<&Polygon2D> = sheet
        .neighbors(&polygon.bounds(), ignore)
        .into_iter()
        .map(|i| sheet.parts()[i].polygon())
        .collect();
    if neighbors.is_empty() {
        return true;
    }

    let silhouettes: Vec<Polygon2D> = neighbors
        .iter()
        .map(|p| Polygon2D::new(p.exterior().to_vec()))
        .collect();
    let candidate = std::slice::from_ref(polygon);
    if clip::intersection_area(candidate, &silhouettes) <= EPSILON {
        return true;
    }

    let solids: Vec<Polygon2D> = neighbors.into_iter().cloned().collect();
    if clip::intersection_area(candidate, &solids) > EPSILON {
        return false;
    }

    let bounds = polygon.bounds();
    let union = Region::union_of(&solids);
    union.holes_as_polygons().iter().any(|hole| {
        hole.bounds().contains_point((bounds.min_x, bounds.min_y))
            && clip::difference(candidate, std::slice::from_ref(hole))
                .iter()
                .map(Polygon2D::area)
                .sum::<f64>()
                <= EPSILON
    })
}

#[cfg(all(test, feature = "overlay"))]
mod tests {
    use super::*;
    use crate::part::Part;

    fn placed_sheet(polygons: &[(Polygon2D, (f64, f64))]) -> Sheet {
        let mut sheet = Sheet::new(0, 200.0, 200.0, 0.0);
        for (i, (polygon, (x, y))) in polygons.iter().enumerate() {
            let mut part = Part::new(format!("p{i}"), polygon.clone(), 0.0, 1).unwrap();
            part.set_pose(*x, *y, 0.0);
            sheet.add_part(&part);
        }
        sheet
    }

    #[test]
    fn test_contains() {
        let square = Polygon2D::rectangle(10.0, 10.0);
        assert!(contains(10.0, 10.0, &square));
        assert!(!contains(10.0, 10.0, &square.translated(0.5, 0.0)));
        assert!(!contains(10.0, 10.0, &square.translated(-0.5, 0.0)));
    }

    #[test]
    fn test_overlap_detection() {
        let a = Polygon2D::rectangle(10.0, 10.0);
        assert!(overlaps(&a, &a.translated(5.0, 5.0)));
        assert!(!overlaps(&a, &a.translated(10.0, 0.0)));
        assert!(!overlaps(&a, &a.translated(30.0, 0.0)));
    }

    #[test]
    fn test_valid_on_sheet() {
        let sheet = placed_sheet(&[(Polygon2D::rectangle(10.0, 10.0), (5.0, 5.0))]);
        let touching = Polygon2D::rectangle(10.0, 10.0).translated(10.0, 0.0);
        let overlapping = Polygon2D::rectangle(10.0, 10.0).translated(5.0, 0.0);
        let outside = Polygon2D::rectangle(10.0, 10.0).translated(195.0, 0.0);

        assert!(valid_on_sheet(&touching, &sheet, None));
        assert!(!valid_on_sheet(&overlapping, &sheet, None));
        assert!(valid_on_sheet(&overlapping, &sheet, Some("p0")));
        assert!(!valid_on_sheet(&outside, &sheet, None));
    }

    #[test]
    fn test_valid_with_holes_accepts_nested_part() {
        let sheet = placed_sheet(&[(Polygon2D::frame(100.0, 20.0), (50.0, 50.0))]);
        let nested = Polygon2D::rectangle(20.0, 20.0).translated(40.0, 40.0);
        let straddling = Polygon2D::rectangle(20.0, 20.0).translated(10.0, 40.0);

        assert!(valid_with_holes(&nested, &sheet, None));
        assert!(valid_on_sheet(&nested, &sheet, None));
        assert!(!valid_with_holes(&straddling, &sheet, None));
    }

    #[test]
    fn test_valid_with_holes_checks_parts_sharing_a_hole() {
        // Frame hole spans 10..90; one part already sits at 15..45.
        let sheet = placed_sheet(&[
            (Polygon2D::frame(100.0, 10.0), (50.0, 50.0)),
            (Polygon2D::rectangle(30.0, 30.0), (30.0, 30.0)),
        ]);
        let overlapping = Polygon2D::rectangle(30.0, 30.0).translated(20.0, 20.0);
        let beside = Polygon2D::rectangle(30.0, 30.0).translated(45.0, 15.0);

        assert!(overlap_area(&overlapping, sheet.parts()[1].polygon()) > 600.0);
        assert!(!valid_with_holes(&overlapping, &sheet, None));
        assert!(!valid_on_sheet(&overlapping, &sheet, None));
        assert!(valid_with_holes(&beside, &sheet, None));
        assert!(valid_with_holes(&overlapping, &sheet, Some("p1")));
    }
}
