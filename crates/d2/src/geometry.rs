//! Polygon value type and ring helpers.

use geo::{Area, Centroid, ConvexHull, Coord, LineString, Polygon as GeoPolygon};
use sheetnest_core::{Error, Result};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Geometric tolerance for coordinate comparisons.
pub const EPSILON: f64 = 1e-9;

/// A polygon with an outer ring and optional hole rings.
///
/// Rings are stored open (the first vertex is not repeated). Polygons are plain
/// values: cloning copies every ring.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Polygon2D {
    exterior: Vec<(f64, f64)>,
    holes: Vec<Vec<(f64, f64)>>,
}

/// Axis-aligned bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    /// Minimum x.
    pub min_x: f64,
    /// Minimum y.
    pub min_y: f64,
    /// Maximum x.
    pub max_x: f64,
    /// Maximum y.
    pub max_y: f64,
}

impl Bounds {
    /// Bounds of a point set. Empty input yields a degenerate box at the origin.
    pub fn of_points<'a>(points: impl IntoIterator<Item = &'a (f64, f64)>) -> Self {
        let mut bounds = Bounds {
            min_x: f64::INFINITY,
            min_y: f64::INFINITY,
            max_x: f64::NEG_INFINITY,
            max_y: f64::NEG_INFINITY,
        };
        for &(x, y) in points {
            bounds.min_x = bounds.min_x.min(x);
            bounds.min_y = bounds.min_y.min(y);
            bounds.max_x = bounds.max_x.max(x);
            bounds.max_y = bounds.max_y.max(y);
        }
        if bounds.min_x > bounds.max_x {
            return Bounds {
                min_x: 0.0,
                min_y: 0.0,
                max_x: 0.0,
                max_y: 0.0,
            };
        }
        bounds
    }

    /// Width of the box.
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Height of the box.
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Area of the box.
    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    /// Smallest box containing both.
    pub fn union(&self, other: &Bounds) -> Bounds {
        Bounds {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    /// True if the interiors of the two boxes overlap (touching does not count).
    pub fn overlaps(&self, other: &Bounds) -> bool {
        self.min_x < other.max_x - EPSILON
            && other.min_x < self.max_x - EPSILON
            && self.min_y < other.max_y - EPSILON
            && other.min_y < self.max_y - EPSILON
    }

    /// True if the point lies in the box, boundary included.
    pub fn contains_point(&self, (x, y): (f64, f64)) -> bool {
        x >= self.min_x - EPSILON
            && x <= self.max_x + EPSILON
            && y >= self.min_y - EPSILON
            && y <= self.max_y + EPSILON
    }
}

impl Polygon2D {
    /// Creates a polygon without holes.
    pub fn new(exterior: Vec<(f64, f64)>) -> Self {
        Self {
            exterior: open_ring(exterior),
            holes: Vec::new(),
        }
    }

    /// Creates a polygon from an outer ring and hole rings.
    pub fn from_rings(exterior: Vec<(f64, f64)>, holes: Vec<Vec<(f64, f64)>>) -> Self {
        Self {
            exterior: open_ring(exterior),
            holes: holes.into_iter().map(open_ring).collect(),
        }
    }

    /// Adds a hole ring.
    pub fn with_hole(mut self, ring: Vec<(f64, f64)>) -> Self {
        self.holes.push(open_ring(ring));
        self
    }

    /// Axis-aligned rectangle with its lower-left corner at the origin.
    pub fn rectangle(width: f64, height: f64) -> Self {
        Self::new(vec![
            (0.0, 0.0),
            (width, 0.0),
            (width, height),
            (0.0, height),
        ])
    }

    /// Regular polygon approximation of a circle centered at `(radius, radius)`.
    pub fn circle(radius: f64, segments: usize) -> Self {
        let n = segments.max(8);
        let step = std::f64::consts::TAU / n as f64;
        Self::new(
            (0..n)
                .map(|i| {
                    let angle = i as f64 * step;
                    (radius * angle.cos() + radius, radius * angle.sin() + radius)
                })
                .collect(),
        )
    }

    /// L-shaped polygon with the notch cut from the top-right corner.
    pub fn l_shape(width: f64, height: f64, notch_width: f64, notch_height: f64) -> Self {
        Self::new(vec![
            (0.0, 0.0),
            (width, 0.0),
            (width, notch_height),
            (notch_width, notch_height),
            (notch_width, height),
            (0.0, height),
        ])
    }

    /// Square frame: `size` x `size` with a centered square hole leaving `border` on each side.
    pub fn frame(size: f64, border: f64) -> Self {
        let inner = size - border;
        Self::rectangle(size, size).with_hole(vec![
            (border, border),
            (border, inner),
            (inner, inner),
            (inner, border),
        ])
    }

    /// Outer ring.
    pub fn exterior(&self) -> &[(f64, f64)] {
        &self.exterior
    }

    /// Hole rings.
    pub fn holes(&self) -> &[Vec<(f64, f64)>] {
        &self.holes
    }

    /// Outer ring followed by every hole ring.
    pub fn rings(&self) -> impl Iterator<Item = &[(f64, f64)]> {
        std::iter::once(self.exterior.as_slice()).chain(self.holes.iter().map(Vec::as_slice))
    }

    /// True if the outer ring cannot enclose any area.
    pub fn is_empty(&self) -> bool {
        self.exterior.len() < 3
    }

    /// Total vertex count across all rings.
    pub fn vertex_count(&self) -> usize {
        self.rings().map(<[_]>::len).sum()
    }

    /// Checks that the polygon can be used as part geometry.
    pub fn validate(&self) -> Result<()> {
        if self.exterior.len() < 3 {
            return Err(Error::InvalidGeometry(format!(
                "polygon must have at least 3 vertices, got {}",
                self.exterior.len()
            )));
        }
        if self
            .rings()
            .flatten()
            .any(|&(x, y)| !x.is_finite() || !y.is_finite())
        {
            return Err(Error::InvalidGeometry(
                "polygon has non-finite coordinates".into(),
            ));
        }
        if self.holes.iter().any(|h| h.len() < 3) {
            return Err(Error::InvalidGeometry(
                "hole rings must have at least 3 vertices".into(),
            ));
        }
        if self.area() <= EPSILON {
            return Err(Error::InvalidGeometry("polygon has zero area".into()));
        }
        Ok(())
    }

    /// Converts to a geo crate polygon.
    pub fn to_geo_polygon(&self) -> GeoPolygon<f64> {
        let ring = |points: &[(f64, f64)]| {
            LineString::from(
                points
                    .iter()
                    .map(|&(x, y)| Coord { x, y })
                    .collect::<Vec<_>>(),
            )
        };
        GeoPolygon::new(
            ring(self.exterior.as_slice()),
            self.holes.iter().map(|h| ring(h.as_slice())).collect(),
        )
    }

    /// Area enclosed by the outer ring minus the holes.
    pub fn area(&self) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        self.to_geo_polygon().unsigned_area()
    }

    /// Area centroid. Falls back to the bounds center for degenerate polygons.
    pub fn centroid(&self) -> (f64, f64) {
        if self.area() > EPSILON {
            if let Some(c) = self.to_geo_polygon().centroid() {
                return (c.x(), c.y());
            }
        }
        let b = self.bounds();
        ((b.min_x + b.max_x) / 2.0, (b.min_y + b.max_y) / 2.0)
    }

    /// Bounds of the outer ring.
    pub fn bounds(&self) -> Bounds {
        Bounds::of_points(&self.exterior)
    }

    /// Convex hull vertices (counter-clockwise, open).
    pub fn convex_hull(&self) -> Vec<(f64, f64)> {
        if self.exterior.len() < 3 {
            return self.exterior.clone();
        }
        convex_hull_of_points(&self.exterior)
    }

    /// Area of the convex hull.
    pub fn convex_hull_area(&self) -> f64 {
        signed_area(&self.convex_hull()).abs()
    }

    /// True if the polygon equals its convex hull: no holes and the hull adds no area.
    pub fn is_convex(&self) -> bool {
        if self.is_empty() || !self.holes.is_empty() {
            return false;
        }
        let area = self.area();
        let hull_area = self.convex_hull_area();
        (area - hull_area).abs() <= EPSILON * hull_area.max(area).max(1.0)
    }

    /// Returns a copy moved by `(dx, dy)`.
    pub fn translated(&self, dx: f64, dy: f64) -> Self {
        self.map_points(|(x, y)| (x + dx, y + dy))
    }

    /// Returns a copy rotated counter-clockwise by `angle_deg` around the origin.
    pub fn rotated(&self, angle_deg: f64) -> Self {
        let (sin, cos) = sin_cos_deg(angle_deg);
        self.map_points(|(x, y)| (x * cos - y * sin, x * sin + y * cos))
    }

    /// Returns a copy rotated counter-clockwise by `angle_deg` around `origin`.
    pub fn rotated_about(&self, angle_deg: f64, origin: (f64, f64)) -> Self {
        self.translated(-origin.0, -origin.1)
            .rotated(angle_deg)
            .translated(origin.0, origin.1)
    }

    /// Returns the point reflection through the origin (`p -> -p`).
    pub fn reflected(&self) -> Self {
        self.map_points(|(x, y)| (-x, -y))
    }

    /// Returns a copy with a counter-clockwise outer ring and clockwise holes.
    pub fn normalized(&self) -> Self {
        Self {
            exterior: ensure_ccw(&self.exterior),
            holes: self.holes.iter().map(|h| ensure_cw(h)).collect(),
        }
    }

    /// True if the point lies strictly inside the outer ring and outside every hole.
    ///
    /// Points on a boundary give an unspecified answer; use
    /// [`Polygon2D::boundary_distance`] when that matters.
    pub fn contains_point(&self, point: (f64, f64)) -> bool {
        point_in_ring(point, &self.exterior) && !self.holes.iter().any(|h| point_in_ring(point, h))
    }

    /// Distance from the point to the nearest edge of any ring.
    pub fn boundary_distance(&self, point: (f64, f64)) -> f64 {
        self.rings()
            .flat_map(ring_edges)
            .map(|(a, b)| point_segment_distance(point, a, b))
            .fold(f64::INFINITY, f64::min)
    }

    /// Stable hash of the exact coordinates, used as a cache signature.
    pub fn signature(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        for ring in self.rings() {
            ring.len().hash(&mut hasher);
            for &(x, y) in ring {
                x.to_bits().hash(&mut hasher);
                y.to_bits().hash(&mut hasher);
            }
        }
        hasher.finish()
    }

    fn map_points(&self, f: impl Fn((f64, f64)) -> (f64, f64)) -> Self {
        Self {
            exterior: self.exterior.iter().map(|&p| f(p)).collect(),
            holes: self
                .holes
                .iter()
                .map(|h| h.iter().map(|&p| f(p)).collect())
                .collect(),
        }
    }
}

/// Drops a repeated closing vertex.
fn open_ring(mut ring: Vec<(f64, f64)>) -> Vec<(f64, f64)> {
    if ring.len() > 1 && ring.first() == ring.last() {
        ring.pop();
    }
    ring
}

/// Sine and cosine of an angle in degrees, exact on multiples of 90.
pub fn sin_cos_deg(angle_deg: f64) -> (f64, f64) {
    let normalized = angle_deg.rem_euclid(360.0);
    let quarter = normalized / 90.0;
    if (quarter - quarter.round()).abs() < 1e-12 {
        match quarter.round() as i64 % 4 {
            0 => (0.0, 1.0),
            1 => (1.0, 0.0),
            2 => (0.0, -1.0),
            _ => (-1.0, 0.0),
        }
    } else {
        normalized.to_radians().sin_cos()
    }
}

/// Rotates a point counter-clockwise around the origin.
pub fn rotate_point((x, y): (f64, f64), angle_deg: f64) -> (f64, f64) {
    let (sin, cos) = sin_cos_deg(angle_deg);
    (x * cos - y * sin, x * sin + y * cos)
}

/// Signed area of a ring (positive for counter-clockwise).
pub fn signed_area(ring: &[(f64, f64)]) -> f64 {
    let n = ring.len();
    if n < 3 {
        return 0.0;
    }
    let mut area = 0.0;
    for i in 0..n {
        let (x1, y1) = ring[i];
        let (x2, y2) = ring[(i + 1) % n];
        area += x1 * y2 - x2 * y1;
    }
    area / 2.0
}

/// Returns the ring in counter-clockwise order.
pub fn ensure_ccw(ring: &[(f64, f64)]) -> Vec<(f64, f64)> {
    if signed_area(ring) < 0.0 {
        ring.iter().rev().copied().collect()
    } else {
        ring.to_vec()
    }
}

/// Returns the ring in clockwise order.
pub fn ensure_cw(ring: &[(f64, f64)]) -> Vec<(f64, f64)> {
    if signed_area(ring) > 0.0 {
        ring.iter().rev().copied().collect()
    } else {
        ring.to_vec()
    }
}

/// Convex hull of a point set (counter-clockwise, open).
pub fn convex_hull_of_points(points: &[(f64, f64)]) -> Vec<(f64, f64)> {
    if points.len() < 3 {
        return points.to_vec();
    }

    let coords: Vec<Coord<f64>> = points.iter().map(|&(x, y)| Coord { x, y }).collect();
    let hull = LineString::from(coords).convex_hull();

    let closed: Vec<(f64, f64)> = hull.exterior().coords().map(|c| (c.x, c.y)).collect();
    ensure_ccw(&open_ring(closed))
}

/// Ray-casting point-in-ring test.
pub fn point_in_ring(point: (f64, f64), ring: &[(f64, f64)]) -> bool {
    let (px, py) = point;
    let n = ring.len();
    if n < 3 {
        return false;
    }
    let mut inside = false;

    let mut j = n - 1;
    for i in 0..n {
        let (xi, yi) = ring[i];
        let (xj, yj) = ring[j];

        if ((yi > py) != (yj > py)) && (px < (xj - xi) * (py - yi) / (yj - yi) + xi) {
            inside = !inside;
        }
        j = i;
    }

    inside
}

/// Edges of a closed ring as `(start, end)` pairs.
pub fn ring_edges(ring: &[(f64, f64)]) -> impl Iterator<Item = ((f64, f64), (f64, f64))> + '_ {
    let n = ring.len();
    (0..n).map(move |i| (ring[i], ring[(i + 1) % n]))
}

/// Euclidean distance from `p` to segment `ab`.
pub fn point_segment_distance(p: (f64, f64), a: (f64, f64), b: (f64, f64)) -> f64 {
    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    let len_sq = dx * dx + dy * dy;
    let t = if len_sq <= f64::MIN_POSITIVE {
        0.0
    } else {
        (((p.0 - a.0) * dx + (p.1 - a.1) * dy) / len_sq).clamp(0.0, 1.0)
    };
    let (cx, cy) = (a.0 + t * dx, a.1 + t * dy);
    ((p.0 - cx).powi(2) + (p.1 - cy).powi(2)).sqrt()
}

/// Perimeter of a closed ring.
pub fn ring_length(ring: &[(f64, f64)]) -> f64 {
    ring_edges(ring)
        .map(|(a, b)| ((b.0 - a.0).powi(2) + (b.1 - a.1).powi(2)).sqrt())
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_rectangle_area_and_bounds() {
        let rect = Polygon2D::rectangle(20.0, 15.0);
        assert_relative_eq!(rect.area(), 300.0, epsilon = 1e-9);
        let b = rect.bounds();
        assert_relative_eq!(b.width(), 20.0);
        assert_relative_eq!(b.height(), 15.0);
        assert!(rect.is_convex());
    }

    #[test]
    fn test_closing_vertex_dropped() {
        let tri = Polygon2D::new(vec![(0.0, 0.0), (4.0, 0.0), (0.0, 3.0), (0.0, 0.0)]);
        assert_eq!(tri.exterior().len(), 3);
        assert_relative_eq!(tri.area(), 6.0, epsilon = 1e-9);
    }

    #[test]
    fn test_l_shape_is_concave() {
        let l = Polygon2D::l_shape(30.0, 30.0, 15.0, 15.0);
        assert!(!l.is_convex());
        assert_relative_eq!(l.area(), 675.0, epsilon = 1e-9);
        assert_relative_eq!(l.convex_hull_area(), 787.5, epsilon = 1e-9);
    }

    #[test]
    fn test_frame_has_hole() {
        let frame = Polygon2D::frame(100.0, 20.0);
        assert_eq!(frame.holes().len(), 1);
        assert!(!frame.is_convex());
        assert_relative_eq!(frame.area(), 10000.0 - 3600.0, epsilon = 1e-6);
        assert!(!frame.contains_point((50.0, 50.0)));
        assert!(frame.contains_point((10.0, 50.0)));
    }

    #[test]
    fn test_centroid_of_square() {
        let square = Polygon2D::rectangle(10.0, 10.0).translated(5.0, 7.0);
        let (cx, cy) = square.centroid();
        assert_relative_eq!(cx, 10.0, epsilon = 1e-9);
        assert_relative_eq!(cy, 12.0, epsilon = 1e-9);
    }

    #[test]
    fn test_quarter_turns_are_exact() {
        let rect = Polygon2D::rectangle(20.0, 10.0);
        let turned = rect.rotated(90.0);
        let b = turned.bounds();
        assert_eq!(b.min_x, -10.0);
        assert_eq!(b.max_x, 0.0);
        assert_eq!(b.max_y, 20.0);
    }

    #[test]
    fn test_rotation_round_trip() {
        let l = Polygon2D::l_shape(40.0, 25.0, 10.0, 5.0);
        for step in 0..12 {
            let angle = step as f64 * 30.0;
            let back = l.rotated(angle).rotated(-angle);
            for (a, b) in l.exterior().iter().zip(back.exterior()) {
                assert_relative_eq!(a.0, b.0, epsilon = 1e-9);
                assert_relative_eq!(a.1, b.1, epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn test_validate() {
        assert!(Polygon2D::rectangle(1.0, 1.0).validate().is_ok());
        assert!(Polygon2D::new(vec![(0.0, 0.0), (1.0, 1.0)])
            .validate()
            .is_err());
        assert!(Polygon2D::new(vec![(0.0, 0.0), (1.0, 0.0), (2.0, 0.0)])
            .validate()
            .is_err());
        assert!(Polygon2D::new(vec![(0.0, 0.0), (f64::NAN, 0.0), (1.0, 1.0)])
            .validate()
            .is_err());
    }

    #[test]
    fn test_normalized_orientation() {
        let cw = Polygon2D::new(vec![(0.0, 0.0), (0.0, 1.0), (1.0, 1.0), (1.0, 0.0)]);
        let n = cw.normalized();
        assert!(signed_area(n.exterior()) > 0.0);

        let frame = Polygon2D::frame(10.0, 2.0).normalized();
        assert!(signed_area(&frame.holes()[0]) < 0.0);
    }

    #[test]
    fn test_boundary_distance() {
        let square = Polygon2D::rectangle(10.0, 10.0);
        assert_relative_eq!(square.boundary_distance((5.0, 5.0)), 5.0);
        assert_relative_eq!(square.boundary_distance((10.0, 3.0)), 0.0);
        assert_relative_eq!(square.boundary_distance((13.0, 14.0)), 5.0);
    }

    #[test]
    fn test_signature_distinguishes_polygons() {
        let a = Polygon2D::rectangle(10.0, 10.0);
        let b = Polygon2D::rectangle(10.0, 10.5);
        assert_eq!(a.signature(), a.clone().signature());
        assert_ne!(a.signature(), b.signature());
    }

    #[test]
    fn test_bounds_overlap_ignores_touching() {
        let a = Polygon2D::rectangle(10.0, 10.0).bounds();
        let b = Polygon2D::rectangle(10.0, 10.0).translated(10.0, 0.0).bounds();
        let c = Polygon2D::rectangle(10.0, 10.0).translated(9.0, 0.0).bounds();
        assert!(!a.overlaps(&b));
        assert!(a.overlaps(&c));
    }
}
