//! Broad-phase collision queries over placed parts using an R*-tree.
//!
//! Every placed polygon is indexed by its axis-aligned bounds, so collision and
//! validity checks only run exact polygon tests against parts whose bounds
//! actually overlap the candidate's.

use crate::geometry::Bounds;
use rstar::{RTree, RTreeObject, AABB};

/// An entry in the index representing one placed part.
#[derive(Debug, Clone)]
pub struct SpatialEntry {
    /// Position of the part in the sheet's part list.
    pub index: usize,
    /// Part instance id.
    pub id: String,
    /// Bounds of the placed polygon.
    pub bounds: Bounds,
}

impl SpatialEntry {
    /// Creates a new entry.
    pub fn new(index: usize, id: impl Into<String>, bounds: Bounds) -> Self {
        Self {
            index,
            id: id.into(),
            bounds,
        }
    }
}

impl RTreeObject for SpatialEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(
            [self.bounds.min_x, self.bounds.min_y],
            [self.bounds.max_x, self.bounds.max_y],
        )
    }
}

/// R*-tree over placed part bounds.
#[derive(Debug, Clone, Default)]
pub struct SpatialIndex {
    tree: RTree<SpatialEntry>,
}

impl SpatialIndex {
    /// Creates an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bulk-loads an index.
    pub fn with_entries(entries: Vec<SpatialEntry>) -> Self {
        Self {
            tree: RTree::bulk_load(entries),
        }
    }

    /// Inserts an entry.
    pub fn insert(&mut self, entry: SpatialEntry) {
        self.tree.insert(entry);
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    /// True if nothing is indexed.
    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// Entries whose bounds intersect the query box (touching included).
    pub fn query(&self, bounds: &Bounds) -> Vec<&SpatialEntry> {
        let envelope = AABB::from_corners(
            [bounds.min_x, bounds.min_y],
            [bounds.max_x, bounds.max_y],
        );
        self.tree
            .locate_in_envelope_intersecting(&envelope)
            .collect()
    }

    /// Indices of parts whose bounds overlap the query box with positive area,
    /// skipping the part with id `ignore`.
    pub fn potential_collisions(&self, bounds: &Bounds, ignore: Option<&str>) -> Vec<usize> {
        let mut indices: Vec<usize> = self
            .query(bounds)
            .into_iter()
            .filter(|e| e.bounds.overlaps(bounds))
            .filter(|e| ignore != Some(e.id.as_str()))
            .map(|e| e.index)
            .collect();
        indices.sort_unstable();
        indices
    }

    /// Iterates over all entries.
    pub fn iter(&self) -> impl Iterator<Item = &SpatialEntry> {
        self.tree.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_at(x: f64, y: f64, size: f64) -> Bounds {
        Bounds {
            min_x: x,
            min_y: y,
            max_x: x + size,
            max_y: y + size,
        }
    }

    #[test]
    fn test_query_finds_overlapping() {
        let mut index = SpatialIndex::new();
        index.insert(SpatialEntry::new(0, "a", square_at(0.0, 0.0, 10.0)));
        index.insert(SpatialEntry::new(1, "b", square_at(50.0, 50.0, 10.0)));

        assert_eq!(index.len(), 2);
        let hits = index.potential_collisions(&square_at(5.0, 5.0, 10.0), None);
        assert_eq!(hits, vec![0]);
    }

    #[test]
    fn test_touching_is_not_a_collision() {
        let index = SpatialIndex::with_entries(vec![SpatialEntry::new(
            0,
            "a",
            square_at(0.0, 0.0, 10.0),
        )]);
        assert_eq!(index.query(&square_at(10.0, 0.0, 10.0)).len(), 1);
        assert!(index
            .potential_collisions(&square_at(10.0, 0.0, 10.0), None)
            .is_empty());
    }

    #[test]
    fn test_ignore_by_id() {
        let index = SpatialIndex::with_entries(vec![
            SpatialEntry::new(0, "a", square_at(0.0, 0.0, 10.0)),
            SpatialEntry::new(1, "b", square_at(2.0, 2.0, 10.0)),
        ]);
        let hits = index.potential_collisions(&square_at(1.0, 1.0, 5.0), Some("a"));
        assert_eq!(hits, vec![1]);
    }
}
