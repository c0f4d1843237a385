//! No-Fit Polygon (NFP) engine.
//!
//! The NFP of a placed polygon A and a candidate B is the set of positions of
//! B's reference point (its centroid) at which B would overlap A. It is built
//! from convex decompositions:
//!
//! - **Outer boundary**: union of the Minkowski sums of every piece of A with
//!   every reflected piece of B.
//! - **Inner-fit polygons (IFP)**: for each hole of A large enough to admit B,
//!   the erosion of the hole by B. Positions in an IFP are allowed even though
//!   they lie inside A's silhouette.
//!
//! Both polygons are centered on their centroids, so a pairwise result only
//! depends on the templates, their relative angle, spacing and resolution. It is
//! cached in an explicit [`NfpCache`] and moved into place (rotate by the placed
//! angle, translate by the placed centroid) when used.
//!
//! Per sheet, the forbidden regions of all placed parts are unioned
//! incrementally into a [`SheetUnion`] for each candidate template and angle.

use crate::geometry::{ring_edges, Polygon2D};
use crate::minkowski::{convex_decomposition, erosion, fits_in_hole, minkowski_sum, reflect_pieces};
use crate::part::Part;
use crate::region::{PreparedRegion, Region};
use crate::sheet::{PlacedPart, Sheet};
use sheetnest_core::{Error, NfpConfig, Result};
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock, RwLock};

/// Angle in integer millidegrees within `[0, 360000)`.
fn millidegrees(angle: f64) -> i64 {
    ((angle.rem_euclid(360.0) * 1000.0).round() as i64).rem_euclid(360_000)
}

/// Cache key of a pairwise NFP.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NfpKey {
    placed: Arc<str>,
    candidate: Arc<str>,
    relative_millideg: i64,
    spacing_bits: u64,
    resolution_bits: u64,
}

impl NfpKey {
    /// Creates a key for a candidate template rotated by `relative_angle`
    /// degrees with respect to the placed template.
    pub fn new(
        placed_template: &str,
        candidate_template: &str,
        relative_angle: f64,
        spacing: f64,
        resolution: f64,
    ) -> Self {
        Self {
            placed: placed_template.into(),
            candidate: candidate_template.into(),
            relative_millideg: millidegrees(relative_angle),
            spacing_bits: spacing.to_bits(),
            resolution_bits: resolution.to_bits(),
        }
    }
}

/// Pairwise NFP in the placed part's frame (centroid at the origin, angle 0).
#[derive(Debug, Clone)]
pub struct PairNfp {
    outer: Region,
    inner_fits: Region,
    forbidden: Region,
}

impl PairNfp {
    /// Union of the piecewise Minkowski sums.
    pub fn outer(&self) -> &Region {
        &self.outer
    }

    /// Positions that put the candidate entirely inside a hole.
    pub fn inner_fits(&self) -> &Region {
        &self.inner_fits
    }

    /// Outer region minus the inner-fit polygons.
    pub fn forbidden(&self) -> &Region {
        &self.forbidden
    }

    /// Forbidden region moved to a placed part's pose.
    pub fn posed(&self, angle: f64, x: f64, y: f64) -> Region {
        self.forbidden.rotated(angle).translated(x, y)
    }
}

/// Computes the NFP of two centered polygons.
///
/// `candidate` must already be rotated to its angle relative to `placed`.
pub fn compute_pair_nfp(
    cache: &NfpCache,
    placed: &Polygon2D,
    candidate: &Polygon2D,
) -> Result<PairNfp> {
    let placed_pieces = cache.decomposition(placed)?;
    let candidate_pieces = cache.decomposition(candidate)?;

    let outer = minkowski_sum(&placed_pieces, &reflect_pieces(&candidate_pieces));

    let fits: Vec<Polygon2D> = placed
        .holes()
        .iter()
        .map(|ring| Polygon2D::new(ring.clone()))
        .filter(|hole| fits_in_hole(hole, candidate))
        .flat_map(|hole| erosion(&hole, &candidate_pieces).into_polygons())
        .collect();
    let inner_fits = Region::union_of(&fits);

    let forbidden = outer.difference(&inner_fits);
    Ok(PairNfp {
        outer,
        inner_fits,
        forbidden,
    })
}

/// Thread-safe cache of pairwise NFPs and convex decompositions.
///
/// Owned by the caller and shared by reference; it can outlive one run to reuse
/// results across runs. With a capacity set, reaching it drops half of the
/// entries.
#[derive(Debug, Default)]
pub struct NfpCache {
    entries: RwLock<HashMap<NfpKey, Arc<PairNfp>>>,
    decompositions: RwLock<HashMap<u64, Arc<Vec<Polygon2D>>>>,
    capacity: Option<usize>,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

impl NfpCache {
    /// Creates an unbounded cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a cache holding at most `capacity` NFPs.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: Some(capacity.max(1)),
            ..Self::default()
        }
    }

    /// Creates a cache sized by the engine configuration.
    pub fn from_config(config: &NfpConfig) -> Self {
        match config.cache_capacity {
            Some(capacity) => Self::with_capacity(capacity),
            None => Self::new(),
        }
    }

    /// Returns the cached NFP for `key`, computing and storing it on a miss.
    ///
    /// Concurrent misses on the same key may compute twice; the second result
    /// replaces an identical first one.
    pub fn get_or_compute<F>(&self, key: NfpKey, compute: F) -> Result<Arc<PairNfp>>
    where
        F: FnOnce() -> Result<PairNfp>,
    {
        {
            let entries = self.entries.read().map_err(|e| {
                Error::Internal(format!("Failed to acquire NFP cache read lock: {}", e))
            })?;
            if let Some(nfp) = entries.get(&key) {
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Ok(Arc::clone(nfp));
            }
        }
        self.misses.fetch_add(1, Ordering::Relaxed);

        let nfp = Arc::new(compute()?);
        let mut entries = self.entries.write().map_err(|e| {
            Error::Internal(format!("Failed to acquire NFP cache write lock: {}", e))
        })?;
        evict_half(&mut entries, self.capacity, "NFP");
        entries.insert(key, Arc::clone(&nfp));
        Ok(nfp)
    }

    /// Convex pieces of a polygon, cached by its coordinate signature.
    pub fn decomposition(&self, polygon: &Polygon2D) -> Result<Arc<Vec<Polygon2D>>> {
        let signature = polygon.signature();
        {
            let cached = self.decompositions.read().map_err(|e| {
                Error::Internal(format!("Failed to acquire decomposition read lock: {}", e))
            })?;
            if let Some(pieces) = cached.get(&signature) {
                return Ok(Arc::clone(pieces));
            }
        }

        let pieces = Arc::new(convex_decomposition(polygon));
        let mut cached = self.decompositions.write().map_err(|e| {
            Error::Internal(format!("Failed to acquire decomposition write lock: {}", e))
        })?;
        evict_half(&mut cached, self.capacity, "decomposition");
        cached.insert(signature, Arc::clone(&pieces));
        Ok(pieces)
    }

    /// Number of cached NFPs.
    pub fn len(&self) -> usize {
        self.entries.read().map(|c| c.len()).unwrap_or(0)
    }

    /// True if no NFP is cached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Lookups answered from the cache.
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::Relaxed)
    }

    /// Lookups that had to compute.
    pub fn misses(&self) -> usize {
        self.misses.load(Ordering::Relaxed)
    }

    /// Configured capacity.
    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    /// Drops every entry and resets the statistics.
    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.write() {
            entries.clear();
        }
        if let Ok(mut cached) = self.decompositions.write() {
            cached.clear();
        }
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }
}

fn evict_half<K: Clone + Eq + Hash, V>(map: &mut HashMap<K, V>, capacity: Option<usize>, what: &str) {
    let Some(capacity) = capacity else {
        return;
    };
    if map.len() < capacity {
        return;
    }
    let keys: Vec<K> = map.keys().take((capacity / 2).max(1)).cloned().collect();
    for key in &keys {
        map.remove(key);
    }
    log::debug!("{} cache full ({} entries), evicted {}", what, capacity, keys.len());
}

/// NFP of a placed part against a candidate at an absolute angle, in sheet coordinates.
pub fn placed_nfp(
    cache: &NfpCache,
    config: &NfpConfig,
    placed: &PlacedPart,
    candidate: &Part,
    angle: f64,
) -> Result<Region> {
    let relative = angle - placed.angle();
    let key = NfpKey::new(
        placed.template_id(),
        candidate.template_id(),
        relative,
        candidate.spacing(),
        config.resolution(),
    );
    let pair = cache.get_or_compute(key, || {
        compute_pair_nfp(
            cache,
            placed.template_polygon(),
            &candidate.rotated_template(relative),
        )
    })?;
    Ok(pair.posed(placed.angle(), placed.x(), placed.y()))
}

/// Key of a per-sheet union: candidate template, absolute angle, spacing and resolution.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UnionKey {
    template: Arc<str>,
    millideg: i64,
    spacing_bits: u64,
    resolution_bits: u64,
}

impl UnionKey {
    /// Key for a candidate part at `angle`.
    pub fn new(part: &Part, angle: f64, resolution: f64) -> Self {
        Self {
            template: part.template_key(),
            millideg: millidegrees(angle),
            spacing_bits: part.spacing().to_bits(),
            resolution_bits: resolution.to_bits(),
        }
    }
}

/// Candidate reference points taken from a forbidden region's boundary.
#[derive(Debug, Clone, Default)]
pub struct CandidatePoints {
    /// Points on hole rings (positions nested inside other parts or pockets).
    pub holes: Vec<(f64, f64)>,
    /// Points on outer rings.
    pub exterior: Vec<(f64, f64)>,
}

/// Forbidden region of a sheet for one candidate template and angle.
///
/// Immutable once built. Extending it with newly placed parts produces a new
/// value, so its lazily computed point set and prepared region never go stale.
#[derive(Debug)]
pub struct SheetUnion {
    covered: usize,
    forbidden: Region,
    prepared: OnceLock<PreparedRegion>,
    points: OnceLock<CandidatePoints>,
}

impl SheetUnion {
    fn new(covered: usize, forbidden: Region) -> Self {
        Self {
            covered,
            forbidden,
            prepared: OnceLock::new(),
            points: OnceLock::new(),
        }
    }

    /// Number of sheet parts folded into this union.
    pub fn covered(&self) -> usize {
        self.covered
    }

    /// The forbidden region.
    pub fn forbidden(&self) -> &Region {
        &self.forbidden
    }

    /// Region prepared for repeated point queries.
    pub fn prepared(&self) -> &PreparedRegion {
        self.prepared
            .get_or_init(|| PreparedRegion::new(self.forbidden.clone()))
    }

    /// Boundary points, densified every `step_size` when enabled.
    pub fn candidate_points(&self, config: &NfpConfig) -> &CandidatePoints {
        self.points.get_or_init(|| {
            let step = config.discretize_edges.then_some(config.step_size);
            CandidatePoints {
                holes: self
                    .forbidden
                    .hole_rings()
                    .flat_map(|ring| discretize_ring(ring, step))
                    .collect(),
                exterior: self
                    .forbidden
                    .exterior_rings()
                    .flat_map(|ring| discretize_ring(ring, step))
                    .collect(),
            }
        })
    }
}

/// Ring vertices plus, with a step, evenly spaced points along every edge.
pub fn discretize_ring(ring: &[(f64, f64)], step: Option<f64>) -> Vec<(f64, f64)> {
    let mut points = Vec::with_capacity(ring.len());
    for (a, b) in ring_edges(ring) {
        points.push(a);
        let Some(step) = step.filter(|s| *s > 0.0) else {
            continue;
        };
        let length = ((b.0 - a.0).powi(2) + (b.1 - a.1).powi(2)).sqrt();
        let count = (length / step).floor() as usize;
        for k in 1..=count {
            let t = k as f64 * step / length;
            if t >= 1.0 {
                break;
            }
            points.push((a.0 + t * (b.0 - a.0), a.1 + t * (b.1 - a.1)));
        }
    }
    points
}

/// Forbidden region of `sheet` for `part` at `angle`.
///
/// Reuses the sheet's union for this template and angle and folds in only the
/// parts placed since it was built.
pub fn sheet_union(
    cache: &NfpCache,
    config: &NfpConfig,
    sheet: &Sheet,
    part: &Part,
    angle: f64,
) -> Result<Arc<SheetUnion>> {
    let key = UnionKey::new(part, angle, config.resolution());
    let placed = sheet.parts();
    let existing = sheet.cached_union(&key)?;

    if let Some(union) = &existing {
        if union.covered() == placed.len() {
            return Ok(Arc::clone(union));
        }
    }

    let (start, mut polygons) = match existing {
        Some(union) if union.covered() < placed.len() => {
            (union.covered(), union.forbidden().polygons().to_vec())
        }
        _ => (0, Vec::new()),
    };
    for other in &placed[start..] {
        polygons.extend(placed_nfp(cache, config, other, part, angle)?.into_polygons());
    }

    let union = Arc::new(SheetUnion::new(placed.len(), Region::union_of(&polygons)));
    sheet.store_union(key, Arc::clone(&union))?;
    Ok(union)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region::BOUNDARY_TOLERANCE;
    use approx::assert_relative_eq;

    fn centered_square(size: f64) -> Polygon2D {
        Polygon2D::rectangle(size, size).translated(-size / 2.0, -size / 2.0)
    }

    #[test]
    fn test_key_normalizes_angle() {
        let a = NfpKey::new("a", "b", -90.0, 0.0, 5.0);
        let b = NfpKey::new("a", "b", 270.0, 0.0, 5.0);
        assert_eq!(a, b);
        assert_ne!(a, NfpKey::new("a", "b", 270.0, 1.0, 5.0));
        assert_ne!(a, NfpKey::new("a", "b", 270.0, 0.0, 0.0));
    }

    #[test]
    fn test_nfp_two_squares() {
        let cache = NfpCache::new();
        let nfp = compute_pair_nfp(&cache, &centered_square(10.0), &centered_square(10.0)).unwrap();
        let b = nfp.forbidden().bounds().unwrap();
        assert_relative_eq!(b.min_x, -10.0, epsilon = 1e-6);
        assert_relative_eq!(b.max_x, 10.0, epsilon = 1e-6);
        assert_relative_eq!(nfp.forbidden().area(), 400.0, epsilon = 1e-6);
        assert!(nfp.inner_fits().is_empty());
    }

    #[test]
    fn test_cache_hits_return_identical_nfp() {
        let cache = NfpCache::new();
        let l = Polygon2D::l_shape(30.0, 20.0, 10.0, 10.0);
        let (cx, cy) = l.centroid();
        let l = l.translated(-cx, -cy);
        let square = centered_square(8.0);

        let key = NfpKey::new("l", "sq", 0.0, 0.0, 5.0);
        let cold = cache
            .get_or_compute(key.clone(), || compute_pair_nfp(&cache, &l, &square))
            .unwrap();
        let warm = cache
            .get_or_compute(key, || Err(Error::Internal("must not recompute".into())))
            .unwrap();

        assert_eq!(cold.forbidden(), warm.forbidden());
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.hits(), 1);
        assert_eq!(cache.misses(), 1);
    }

    #[test]
    fn test_cache_eviction() {
        let cache = NfpCache::with_capacity(2);
        for i in 0..3 {
            let key = NfpKey::new("a", "b", f64::from(i) * 90.0, 0.0, 0.0);
            cache
                .get_or_compute(key, || {
                    compute_pair_nfp(&cache, &centered_square(1.0), &centered_square(1.0))
                })
                .unwrap();
        }
        assert!(cache.len() <= 2);
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.misses(), 0);
    }

    #[test]
    fn test_discretize_ring() {
        let ring = Polygon2D::rectangle(10.0, 10.0);
        assert_eq!(discretize_ring(ring.exterior(), None).len(), 4);
        // 4 vertices + 1 midpoint per edge.
        assert_eq!(discretize_ring(ring.exterior(), Some(5.0)).len(), 8);
        assert_eq!(discretize_ring(ring.exterior(), Some(3.0)).len(), 16);
    }

    #[cfg(feature = "overlay")]
    #[test]
    fn test_frame_nfp_has_inner_fit() {
        let cache = NfpCache::new();
        let frame = Polygon2D::frame(100.0, 20.0).translated(-50.0, -50.0);
        let nfp = compute_pair_nfp(&cache, &frame, &centered_square(20.0)).unwrap();

        assert!(!nfp.inner_fits().is_empty());
        assert_relative_eq!(nfp.inner_fits().area(), 1600.0, epsilon = 1e-6);
        let prepared = PreparedRegion::new(nfp.forbidden().clone());
        assert!(!prepared.contains_strictly((0.0, 0.0), BOUNDARY_TOLERANCE));
        assert!(prepared.contains_strictly((-40.0, 0.0), BOUNDARY_TOLERANCE));
    }

    #[cfg(feature = "overlay")]
    #[test]
    fn test_sheet_union_is_incremental() {
        let config = NfpConfig::default();
        let cache = NfpCache::new();
        let mut sheet = Sheet::new(0, 100.0, 100.0, 0.0);
        let mut parts = Part::new("sq", Polygon2D::rectangle(10.0, 10.0), 0.0, 1)
            .unwrap()
            .instances(3);

        parts[0].set_pose(5.0, 5.0, 0.0);
        sheet.add_part(&parts[0]);
        let first = sheet_union(&cache, &config, &sheet, &parts[2], 0.0).unwrap();
        assert_eq!(first.covered(), 1);
        assert_relative_eq!(first.forbidden().area(), 400.0, epsilon = 1e-6);

        let again = sheet_union(&cache, &config, &sheet, &parts[2], 0.0).unwrap();
        assert!(Arc::ptr_eq(&first, &again));

        parts[1].set_pose(50.0, 50.0, 0.0);
        sheet.add_part(&parts[1]);
        let second = sheet_union(&cache, &config, &sheet, &parts[2], 0.0).unwrap();
        assert_eq!(second.covered(), 2);
        assert_relative_eq!(second.forbidden().area(), 800.0, epsilon = 1e-6);
        // Both pairwise NFPs share one cache entry.
        assert_eq!(cache.len(), 1);

        sheet.remove_part("sq_1");
        assert_eq!(sheet.cached_union_count(), 0);
    }
}
