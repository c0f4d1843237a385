//! Multi-polygon regions.

use crate::clip;
use crate::geometry::{Bounds, Polygon2D};

/// A set of non-overlapping polygons, each possibly with holes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Region {
    polygons: Vec<Polygon2D>,
}

impl Region {
    /// The empty region.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Region made of one polygon.
    pub fn from_polygon(polygon: Polygon2D) -> Self {
        if polygon.is_empty() {
            return Self::empty();
        }
        Self {
            polygons: vec![polygon],
        }
    }

    /// Region made of polygons already known not to overlap.
    pub fn from_disjoint(polygons: Vec<Polygon2D>) -> Self {
        Self {
            polygons: polygons.into_iter().filter(|p| !p.is_empty()).collect(),
        }
    }

    /// Union of arbitrary (possibly overlapping) polygons.
    pub fn union_of(polygons: &[Polygon2D]) -> Self {
        Self {
            polygons: clip::union_all(polygons),
        }
    }

    /// The polygons of the region.
    pub fn polygons(&self) -> &[Polygon2D] {
        &self.polygons
    }

    /// Consumes the region.
    pub fn into_polygons(self) -> Vec<Polygon2D> {
        self.polygons
    }

    /// True if the region has no polygons.
    pub fn is_empty(&self) -> bool {
        self.polygons.is_empty()
    }

    /// Total area.
    pub fn area(&self) -> f64 {
        self.polygons.iter().map(Polygon2D::area).sum()
    }

    /// Bounds of every polygon, or `None` for the empty region.
    pub fn bounds(&self) -> Option<Bounds> {
        self.polygons
            .iter()
            .map(Polygon2D::bounds)
            .reduce(|a, b| a.union(&b))
    }

    /// Union with another region.
    pub fn union(&self, other: &Region) -> Region {
        if other.is_empty() {
            return self.clone();
        }
        if self.is_empty() {
            return other.clone();
        }
        let all: Vec<Polygon2D> = self
            .polygons
            .iter()
            .chain(&other.polygons)
            .cloned()
            .collect();
        Region::union_of(&all)
    }

    /// Intersection with another region.
    pub fn intersection(&self, other: &Region) -> Region {
        Region {
            polygons: clip::intersection(&self.polygons, &other.polygons),
        }
    }

    /// This region minus another.
    pub fn difference(&self, other: &Region) -> Region {
        if other.is_empty() {
            return self.clone();
        }
        Region {
            polygons: clip::difference(&self.polygons, &other.polygons),
        }
    }

    /// Copy moved by `(dx, dy)`.
    pub fn translated(&self, dx: f64, dy: f64) -> Region {
        Region {
            polygons: self.polygons.iter().map(|p| p.translated(dx, dy)).collect(),
        }
    }

    /// Copy rotated counter-clockwise around the origin.
    pub fn rotated(&self, angle_deg: f64) -> Region {
        Region {
            polygons: self.polygons.iter().map(|p| p.rotated(angle_deg)).collect(),
        }
    }

    /// True if the point lies in the interior of some polygon (boundary unspecified).
    pub fn contains_point(&self, point: (f64, f64)) -> bool {
        self.polygons.iter().any(|p| p.contains_point(point))
    }

    /// Outer rings of every polygon.
    pub fn exterior_rings(&self) -> impl Iterator<Item = &[(f64, f64)]> {
        self.polygons.iter().map(Polygon2D::exterior)
    }

    /// Hole rings of every polygon.
    pub fn hole_rings(&self) -> impl Iterator<Item = &[(f64, f64)]> {
        self.polygons
            .iter()
            .flat_map(|p| p.holes().iter().map(Vec::as_slice))
    }

    /// Hole rings as standalone polygons.
    pub fn holes_as_polygons(&self) -> Vec<Polygon2D> {
        self.hole_rings()
            .map(|ring| Polygon2D::new(ring.to_vec()))
            .collect()
    }
}

/// A region prepared for many point queries.
///
/// Keeps per-polygon bounds so most queries are rejected without walking edges.
#[derive(Debug, Clone, Default)]
pub struct PreparedRegion {
    region: Region,
    bounds: Vec<Bounds>,
}

impl PreparedRegion {
    /// Prepares a region.
    pub fn new(region: Region) -> Self {
        let bounds = region.polygons().iter().map(Polygon2D::bounds).collect();
        Self { region, bounds }
    }

    /// The underlying region.
    pub fn region(&self) -> &Region {
        &self.region
    }

    /// True if the point is inside the region and farther than `tolerance` from
    /// every boundary. Points on or near a boundary count as outside (touching).
    pub fn contains_strictly(&self, point: (f64, f64), tolerance: f64) -> bool {
        self.region
            .polygons()
            .iter()
            .zip(&self.bounds)
            .filter(|(_, b)| b.contains_point(point))
            .any(|(polygon, _)| {
                polygon.contains_point(point) && polygon.boundary_distance(point) > tolerance
            })
    }
}

impl From<Region> for PreparedRegion {
    fn from(region: Region) -> Self {
        Self::new(region)
    }
}

/// Default tolerance for [`PreparedRegion::contains_strictly`].
pub const BOUNDARY_TOLERANCE: f64 = 1e-6;

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_empty_region() {
        let region = Region::empty();
        assert!(region.is_empty());
        assert_eq!(region.area(), 0.0);
        assert!(region.bounds().is_none());
    }

    #[test]
    fn test_prepared_boundary_is_outside() {
        let prepared = PreparedRegion::new(Region::from_polygon(Polygon2D::rectangle(10.0, 10.0)));
        assert!(prepared.contains_strictly((5.0, 5.0), BOUNDARY_TOLERANCE));
        assert!(!prepared.contains_strictly((10.0, 5.0), BOUNDARY_TOLERANCE));
        assert!(!prepared.contains_strictly((0.0, 0.0), BOUNDARY_TOLERANCE));
        assert!(!prepared.contains_strictly((15.0, 5.0), BOUNDARY_TOLERANCE));
    }

    #[test]
    fn test_prepared_hole_is_outside() {
        let prepared = PreparedRegion::new(Region::from_polygon(Polygon2D::frame(100.0, 20.0)));
        assert!(!prepared.contains_strictly((50.0, 50.0), BOUNDARY_TOLERANCE));
        assert!(prepared.contains_strictly((10.0, 50.0), BOUNDARY_TOLERANCE));
    }

    #[test]
    fn test_translate_and_rotate() {
        let region = Region::from_polygon(Polygon2D::rectangle(4.0, 2.0));
        let moved = region.rotated(90.0).translated(10.0, 0.0);
        let b = moved.bounds().unwrap();
        assert_relative_eq!(b.min_x, 8.0);
        assert_relative_eq!(b.max_x, 10.0);
        assert_relative_eq!(b.max_y, 4.0);
        assert_relative_eq!(moved.area(), 8.0, epsilon = 1e-9);
    }

    #[cfg(feature = "overlay")]
    #[test]
    fn test_region_boolean_ops() {
        let a = Region::from_polygon(Polygon2D::rectangle(10.0, 10.0));
        let b = Region::from_polygon(Polygon2D::rectangle(10.0, 10.0).translated(5.0, 5.0));
        assert_relative_eq!(a.union(&b).area(), 175.0, epsilon = 1e-6);
        assert_relative_eq!(a.intersection(&b).area(), 25.0, epsilon = 1e-6);
        assert_relative_eq!(a.difference(&b).area(), 75.0, epsilon = 1e-6);
    }

    #[test]
    fn test_holes_as_polygons() {
        let region = Region::from_polygon(Polygon2D::frame(100.0, 20.0));
        let holes = region.holes_as_polygons();
        assert_eq!(holes.len(), 1);
        assert_relative_eq!(holes[0].area(), 3600.0, epsilon = 1e-6);
    }
}
