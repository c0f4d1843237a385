//! Sheets and placed parts.

use crate::geometry::{Bounds, Polygon2D};
use crate::nfp::{SheetUnion, UnionKey};
use crate::part::Part;
use crate::spatial_index::{SpatialEntry, SpatialIndex};
use sheetnest_core::{Error, Result};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Snapshot of a part at the moment its placement was accepted.
#[derive(Debug, Clone)]
pub struct PlacedPart {
    part_id: String,
    template_id: Arc<str>,
    instance: usize,
    x: f64,
    y: f64,
    angle: f64,
    polygon: Polygon2D,
    template: Polygon2D,
    spacing: f64,
    area: f64,
    unbuffered_area: f64,
}

impl PlacedPart {
    /// Captures the current pose of a part.
    pub fn new(part: &Part) -> Self {
        let (x, y) = part.position();
        Self {
            part_id: part.id().to_string(),
            template_id: part.template_key(),
            instance: part.instance(),
            x,
            y,
            angle: part.angle(),
            polygon: part.polygon().clone(),
            template: part.original_polygon().clone(),
            spacing: part.spacing(),
            area: part.area(),
            unbuffered_area: part.unbuffered_area(),
        }
    }

    /// Instance id.
    pub fn part_id(&self) -> &str {
        &self.part_id
    }

    /// Template id.
    pub fn template_id(&self) -> &str {
        &self.template_id
    }

    pub(crate) fn template_key(&self) -> &Arc<str> {
        &self.template_id
    }

    /// Instance index within the template.
    pub fn instance(&self) -> usize {
        self.instance
    }

    /// Centroid x on the sheet.
    pub fn x(&self) -> f64 {
        self.x
    }

    /// Centroid y on the sheet.
    pub fn y(&self) -> f64 {
        self.y
    }

    /// Rotation in degrees.
    pub fn angle(&self) -> f64 {
        self.angle
    }

    /// Placed boundary (spacing included), in sheet coordinates.
    pub fn polygon(&self) -> &Polygon2D {
        &self.polygon
    }

    /// Unrotated boundary centered on the origin.
    pub fn template_polygon(&self) -> &Polygon2D {
        &self.template
    }

    /// Part spacing.
    pub fn spacing(&self) -> f64 {
        self.spacing
    }

    /// Area with spacing.
    pub fn area(&self) -> f64 {
        self.area
    }

    /// Area without spacing.
    pub fn unbuffered_area(&self) -> f64 {
        self.unbuffered_area
    }

    /// Minimum corner of the placed polygon's bounding box.
    pub fn position(&self) -> (f64, f64) {
        let b = self.polygon.bounds();
        (b.min_x, b.min_y)
    }

    /// Centroid position in the global layout where sheets sit side by side.
    pub fn global_position(&self, sheet: &Sheet) -> (f64, f64) {
        let (ox, oy) = sheet.origin();
        (ox + self.x, oy + self.y)
    }
}

/// A fixed-size bin.
///
/// Besides its parts a sheet keeps the running placed area, an R-tree over part
/// bounds, and the incremental forbidden-region unions computed for candidates.
#[derive(Debug)]
pub struct Sheet {
    id: usize,
    width: f64,
    height: f64,
    spacing: f64,
    parts: Vec<PlacedPart>,
    used_area: f64,
    index: SpatialIndex,
    unions: RwLock<HashMap<UnionKey, Arc<SheetUnion>>>,
}

impl Sheet {
    /// Creates an empty sheet.
    pub fn new(id: usize, width: f64, height: f64, spacing: f64) -> Self {
        Self {
            id,
            width,
            height,
            spacing,
            parts: Vec::new(),
            used_area: 0.0,
            index: SpatialIndex::new(),
            unions: RwLock::new(HashMap::new()),
        }
    }

    /// Sheet id (0-based creation order).
    pub fn id(&self) -> usize {
        self.id
    }

    /// Width.
    pub fn width(&self) -> f64 {
        self.width
    }

    /// Height.
    pub fn height(&self) -> f64 {
        self.height
    }

    /// Gap to the next sheet in the layout.
    pub fn spacing(&self) -> f64 {
        self.spacing
    }

    /// Sheet area.
    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// Placed parts in placement order.
    pub fn parts(&self) -> &[PlacedPart] {
        &self.parts
    }

    /// True if nothing is placed.
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Sum of placed part areas (spacing included).
    pub fn used_area(&self) -> f64 {
        self.used_area
    }

    /// Area not yet covered by parts.
    pub fn remaining_area(&self) -> f64 {
        self.area() - self.used_area
    }

    /// Lower-left corner of this sheet in the side-by-side layout.
    pub fn origin(&self) -> (f64, f64) {
        (self.id as f64 * (self.width + self.spacing), 0.0)
    }

    /// Percentage of the sheet covered by parts, with or without spacing.
    pub fn fill_percentage(&self, use_unbuffered: bool) -> f64 {
        let placed: f64 = self
            .parts
            .iter()
            .map(|p| {
                if use_unbuffered {
                    p.unbuffered_area
                } else {
                    p.area
                }
            })
            .sum();
        placed / self.area() * 100.0
    }

    /// Bounds of every placed polygon.
    pub fn parts_bounds(&self) -> Option<Bounds> {
        self.parts
            .iter()
            .map(|p| p.polygon.bounds())
            .reduce(|a, b| a.union(&b))
    }

    /// Accepts the part at its current pose.
    pub fn add_part(&mut self, part: &Part) -> &PlacedPart {
        let placed = PlacedPart::new(part);
        self.used_area += placed.area;
        self.index.insert(SpatialEntry::new(
            self.parts.len(),
            placed.part_id.clone(),
            placed.polygon.bounds(),
        ));
        self.parts.push(placed);
        let last = self.parts.len() - 1;
        &self.parts[last]
    }

    /// Removes a placed part by id.
    ///
    /// Every incremental union on this sheet is dropped and rebuilt on demand.
    pub fn remove_part(&mut self, part_id: &str) -> Option<PlacedPart> {
        let position = self.parts.iter().position(|p| p.part_id == part_id)?;
        let removed = self.parts.remove(position);
        self.used_area = (self.used_area - removed.area).max(0.0);
        self.index = SpatialIndex::with_entries(
            self.parts
                .iter()
                .enumerate()
                .map(|(i, p)| SpatialEntry::new(i, p.part_id.clone(), p.polygon.bounds()))
                .collect(),
        );
        match self.unions.get_mut() {
            Ok(unions) => unions.clear(),
            Err(poisoned) => poisoned.into_inner().clear(),
        }
        Some(removed)
    }

    /// Indices of placed parts whose bounds overlap `bounds`, except `ignore`.
    pub fn neighbors(&self, bounds: &Bounds, ignore: Option<&str>) -> Vec<usize> {
        self.index.potential_collisions(bounds, ignore)
    }

    pub(crate) fn cached_union(&self, key: &UnionKey) -> Result<Option<Arc<SheetUnion>>> {
        let unions = self
            .unions
            .read()
            .map_err(|e| Error::Internal(format!("sheet union lock poisoned: {e}")))?;
        Ok(unions.get(key).cloned())
    }

    /// Stores a union unless a more complete one is already present.
    pub(crate) fn store_union(&self, key: UnionKey, union: Arc<SheetUnion>) -> Result<()> {
        let mut unions = self
            .unions
            .write()
            .map_err(|e| Error::Internal(format!("sheet union lock poisoned: {e}")))?;
        let stale = unions
            .get(&key)
            .map_or(true, |existing| existing.covered() < union.covered());
        if stale {
            unions.insert(key, union);
        }
        Ok(())
    }

    /// Number of incremental unions currently held.
    pub fn cached_union_count(&self) -> usize {
        self.unions.read().map(|u| u.len()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn square(size: f64) -> Part {
        Part::new("sq", Polygon2D::rectangle(size, size), 0.0, 1).unwrap()
    }

    #[test]
    fn test_add_and_remove_parts() {
        let mut sheet = Sheet::new(0, 100.0, 100.0, 0.0);
        let mut parts = square(10.0).instances(2);
        parts[0].set_pose(5.0, 5.0, 0.0);
        parts[1].set_pose(15.0, 5.0, 0.0);
        sheet.add_part(&parts[0]);
        sheet.add_part(&parts[1]);

        assert_eq!(sheet.parts().len(), 2);
        assert_relative_eq!(sheet.used_area(), 200.0, epsilon = 1e-9);
        assert_relative_eq!(sheet.remaining_area(), 9800.0, epsilon = 1e-9);

        let removed = sheet.remove_part("sq_0").unwrap();
        assert_eq!(removed.part_id(), "sq_0");
        assert_relative_eq!(sheet.used_area(), 100.0, epsilon = 1e-9);
        assert!(sheet.remove_part("sq_0").is_none());

        let b = sheet.parts()[0].polygon().bounds();
        assert_eq!(sheet.neighbors(&b, None), vec![0]);
    }

    #[test]
    fn test_placed_part_snapshot() {
        let mut part = square(10.0);
        part.set_pose(5.0, 5.0, 0.0);
        let placed = PlacedPart::new(&part);
        part.set_pose(50.0, 50.0, 0.0);

        assert_relative_eq!(placed.x(), 5.0);
        let (px, py) = placed.position();
        assert_relative_eq!(px, 0.0, epsilon = 1e-9);
        assert_relative_eq!(py, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_origin_and_global_position() {
        let mut sheet = Sheet::new(2, 100.0, 50.0, 10.0);
        assert_eq!(sheet.origin(), (220.0, 0.0));

        let mut part = square(10.0);
        part.set_pose(5.0, 5.0, 0.0);
        sheet.add_part(&part);
        assert_eq!(sheet.parts()[0].global_position(&sheet), (225.0, 5.0));
    }

    #[test]
    fn test_fill_percentage() {
        let mut sheet = Sheet::new(0, 100.0, 100.0, 0.0);
        let mut part = Part::new("sq", Polygon2D::rectangle(50.0, 50.0), 2.0, 1).unwrap();
        part.set_pose(30.0, 30.0, 0.0);
        sheet.add_part(&part);

        assert_relative_eq!(sheet.fill_percentage(true), 25.0, epsilon = 1e-9);
        assert!(sheet.fill_percentage(false) > 25.0);
    }
}
