//! Minkowski sums and erosions over convex decompositions.
//!
//! Non-convex polygons (including polygons with holes) are split into convex
//! pieces. The sum of two convex pieces is the convex hull of all pairwise
//! vertex sums; the sum of two general polygons is the union of every
//! piece-by-piece sum.

use crate::clip;
use crate::geometry::{convex_hull_of_points, Polygon2D, EPSILON};
use crate::region::Region;
use geo::TriangulateEarcut;

/// Splits a polygon into convex pieces.
///
/// A polygon whose area matches its hull area is returned as is. Otherwise the
/// polygon is triangulated and only triangles whose centroid lies inside the
/// polygon are kept. If that leaves nothing usable the convex hull is returned:
/// coarser, but never empty.
pub fn convex_decomposition(polygon: &Polygon2D) -> Vec<Polygon2D> {
    if polygon.is_empty() {
        return Vec::new();
    }
    if polygon.is_convex() {
        return vec![polygon.normalized()];
    }

    let pieces: Vec<Polygon2D> = polygon
        .to_geo_polygon()
        .earcut_triangles()
        .into_iter()
        .map(|t| {
            let [a, b, c] = t.to_array();
            Polygon2D::new(vec![(a.x, a.y), (b.x, b.y), (c.x, c.y)]).normalized()
        })
        .filter(|t| t.area() > EPSILON && polygon.contains_point(t.centroid()))
        .collect();

    let covered: f64 = pieces.iter().map(Polygon2D::area).sum();
    if pieces.is_empty() || (covered - polygon.area()).abs() > 1e-6 * polygon.area().max(1.0) {
        log::debug!(
            "triangulation of a {}-vertex polygon failed, using its convex hull",
            polygon.vertex_count()
        );
        return vec![Polygon2D::new(polygon.convex_hull())];
    }
    pieces
}

/// Minkowski sum of two convex polygons: hull of all pairwise vertex sums.
pub fn convex_sum(a: &Polygon2D, b: &Polygon2D) -> Polygon2D {
    let sums: Vec<(f64, f64)> = a
        .exterior()
        .iter()
        .flat_map(|&(ax, ay)| b.exterior().iter().map(move |&(bx, by)| (ax + bx, ay + by)))
        .collect();
    Polygon2D::new(convex_hull_of_points(&sums))
}

/// Minkowski sum of two decomposed polygons.
///
/// A degenerate operand (no pieces or zero area) yields the other operand.
pub fn minkowski_sum(a: &[Polygon2D], b: &[Polygon2D]) -> Region {
    let area = |pieces: &[Polygon2D]| pieces.iter().map(Polygon2D::area).sum::<f64>();
    if area(a) <= EPSILON {
        return Region::union_of(b);
    }
    if area(b) <= EPSILON {
        return Region::union_of(a);
    }

    let sums: Vec<Polygon2D> = a
        .iter()
        .flat_map(|pa| b.iter().map(move |pb| convex_sum(pa, pb)))
        .collect();
    Region::union_of(&sums)
}

/// Reflects every piece through the origin.
pub fn reflect_pieces(pieces: &[Polygon2D]) -> Vec<Polygon2D> {
    pieces.iter().map(|p| p.reflected().normalized()).collect()
}

/// Positions of the origin-relative `pieces` that keep all of them inside `hole`.
///
/// For each vertex `v` the hole is translated by `-v`; the result is the
/// intersection over all vertices of all pieces. Pieces of one polygon share the
/// polygon's vertices, so intersecting across pieces equals intersecting over the
/// polygon's own vertices.
pub fn erosion(hole: &Polygon2D, pieces: &[Polygon2D]) -> Region {
    let mut vertices: Vec<(f64, f64)> = pieces
        .iter()
        .flat_map(|p| p.exterior().iter().copied())
        .collect();
    vertices.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.total_cmp(&b.1)));
    vertices.dedup_by(|a, b| (a.0 - b.0).abs() <= EPSILON && (a.1 - b.1).abs() <= EPSILON);

    let Some(&(vx, vy)) = vertices.first() else {
        return Region::from_polygon(hole.normalized());
    };
    let mut fit = Region::from_polygon(hole.translated(-vx, -vy).normalized());
    for &(vx, vy) in &vertices[1..] {
        if fit.is_empty() {
            break;
        }
        fit = fit.intersection(&Region::from_polygon(hole.translated(-vx, -vy)));
    }
    fit
}

/// True if the candidate (already rotated) could possibly fit inside the hole:
/// its bounding box is strictly smaller in both dimensions and its area is
/// smaller than the hole's.
pub fn fits_in_hole(hole: &Polygon2D, candidate: &Polygon2D) -> bool {
    let hb = hole.bounds();
    let cb = candidate.bounds();
    cb.width() < hb.width() && cb.height() < hb.height() && candidate.area() < hole.area()
}

/// Regular polygon circumscribing a disc of `radius`, centered at the origin.
pub fn disc(radius: f64, segments: usize) -> Polygon2D {
    let n = segments.max(8);
    // Circumscribed so the polygon never falls inside the true disc.
    let r = radius / (std::f64::consts::PI / n as f64).cos();
    Polygon2D::circle(r, n).translated(-r, -r)
}

/// Number of segments used to approximate the spacing disc.
pub const BUFFER_SEGMENTS: usize = 16;

/// Grows the polygon outward by `distance`: the outer ring expands and holes shrink.
///
/// Without polygon boolean operations the union of pieces cannot be formed, so
/// non-convex polygons are grown from their convex hull instead.
pub fn buffer(polygon: &Polygon2D, distance: f64) -> Polygon2D {
    if distance <= 0.0 || polygon.is_empty() {
        return polygon.clone();
    }
    let disc = [disc(distance, BUFFER_SEGMENTS)];

    if polygon.is_convex() || !clip::AVAILABLE {
        if !polygon.is_convex() {
            log::debug!("no boolean backend, buffering the convex hull instead");
        }
        let hull = Polygon2D::new(polygon.convex_hull());
        return convex_sum(&hull, &disc[0]);
    }

    let pieces = convex_decomposition(polygon);
    minkowski_sum(&pieces, &disc)
        .into_polygons()
        .into_iter()
        .max_by(|a, b| a.area().total_cmp(&b.area()))
        .unwrap_or_else(|| polygon.clone())
}
