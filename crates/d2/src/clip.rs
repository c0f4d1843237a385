//! Polygon boolean operations.
//!
//! Backed by `i_overlay` when the `overlay` feature is enabled. Without it the
//! functions below only handle the disjoint case (union concatenates, intersection
//! is empty, difference returns the subject) and [`AVAILABLE`] is false; the
//! orchestrator refuses strategies that need real boolean operations.

use crate::geometry::Polygon2D;

/// True when real polygon boolean operations are compiled in.
pub const AVAILABLE: bool = cfg!(feature = "overlay");

/// Human-readable name of the backend, used in dependency errors.
pub const BACKEND_NAME: &str = "polygon boolean operations (feature `overlay`, crate i_overlay)";

/// Polygons smaller than this are dropped from boolean results.
const MIN_AREA: f64 = 1e-12;

/// Union of an arbitrary set of polygons.
pub fn union_all(polygons: &[Polygon2D]) -> Vec<Polygon2D> {
    let polygons: Vec<&Polygon2D> = polygons.iter().filter(|p| !p.is_empty()).collect();
    match polygons.len() {
        0 => Vec::new(),
        1 => vec![polygons[0].normalized()],
        n => {
            let (left, right) = polygons.split_at(n / 2);
            imp::union(left, right)
        }
    }
}

/// Intersection of two polygon sets.
pub fn intersection(subject: &[Polygon2D], clip: &[Polygon2D]) -> Vec<Polygon2D> {
    if subject.is_empty() || clip.is_empty() {
        return Vec::new();
    }
    let subject: Vec<&Polygon2D> = subject.iter().collect();
    let clip: Vec<&Polygon2D> = clip.iter().collect();
    imp::intersection(&subject, &clip)
}

/// `subject` minus `clip`.
pub fn difference(subject: &[Polygon2D], clip: &[Polygon2D]) -> Vec<Polygon2D> {
    if subject.is_empty() {
        return Vec::new();
    }
    if clip.is_empty() {
        return subject.iter().map(Polygon2D::normalized).collect();
    }
    let subject: Vec<&Polygon2D> = subject.iter().collect();
    let clip: Vec<&Polygon2D> = clip.iter().collect();
    imp::difference(&subject, &clip)
}

/// Area of the intersection of two polygon sets.
pub fn intersection_area(subject: &[Polygon2D], clip: &[Polygon2D]) -> f64 {
    intersection(subject, clip).iter().map(Polygon2D::area).sum()
}

#[cfg(feature = "overlay")]
mod imp {
    use super::MIN_AREA;
    use crate::geometry::Polygon2D;
    use i_overlay::core::fill_rule::FillRule;
    use i_overlay::core::overlay_rule::OverlayRule;
    use i_overlay::float::single::SingleFloatOverlay;

    pub(super) fn union(subject: &[&Polygon2D], clip: &[&Polygon2D]) -> Vec<Polygon2D> {
        overlay(subject, clip, OverlayRule::Union)
    }

    pub(super) fn intersection(subject: &[&Polygon2D], clip: &[&Polygon2D]) -> Vec<Polygon2D> {
        overlay(subject, clip, OverlayRule::Intersect)
    }

    pub(super) fn difference(subject: &[&Polygon2D], clip: &[&Polygon2D]) -> Vec<Polygon2D> {
        overlay(subject, clip, OverlayRule::Difference)
    }

    fn overlay(subject: &[&Polygon2D], clip: &[&Polygon2D], rule: OverlayRule) -> Vec<Polygon2D> {
        let subject = to_contours(subject);
        let clip = to_contours(clip);

        // Outer rings are counter-clockwise and holes clockwise, so NonZero both
        // merges overlapping pieces and keeps holes empty.
        let shapes = subject.overlay(&clip, rule, FillRule::NonZero);

        shapes
            .into_iter()
            .filter_map(|shape| {
                let mut contours = shape.into_iter().map(from_contour);
                let exterior = contours.next()?;
                if exterior.len() < 3 {
                    return None;
                }
                let holes: Vec<Vec<(f64, f64)>> = contours.filter(|h| h.len() >= 3).collect();
                let polygon = Polygon2D::from_rings(exterior, holes);
                (polygon.area() > MIN_AREA).then_some(polygon)
            })
            .collect()
    }

    fn to_contours(polygons: &[&Polygon2D]) -> Vec<Vec<[f64; 2]>> {
        polygons
            .iter()
            .flat_map(|p| {
                let normalized = p.normalized();
                normalized
                    .rings()
                    .map(|ring| ring.iter().map(|&(x, y)| [x, y]).collect::<Vec<_>>())
                    .collect::<Vec<_>>()
            })
            .filter(|c| c.len() >= 3)
            .collect()
    }

    fn from_contour(contour: Vec<[f64; 2]>) -> Vec<(f64, f64)> {
        contour.into_iter().map(|[x, y]| (x, y)).collect()
    }
}

#[cfg(not(feature = "overlay"))]
mod imp {
    use crate::geometry::Polygon2D;

    pub(super) fn union(subject: &[&Polygon2D], clip: &[&Polygon2D]) -> Vec<Polygon2D> {
        subject
            .iter()
            .chain(clip)
            .map(|p| p.normalized())
            .collect()
    }

    pub(super) fn intersection(_subject: &[&Polygon2D], _clip: &[&Polygon2D]) -> Vec<Polygon2D> {
        Vec::new()
    }

    pub(super) fn difference(subject: &[&Polygon2D], _clip: &[&Polygon2D]) -> Vec<Polygon2D> {
        subject.iter().map(|p| p.normalized()).collect()
    }
}
