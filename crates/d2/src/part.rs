//! Parts to be nested.

use crate::geometry::{Bounds, Polygon2D};
use crate::minkowski;
use sheetnest_core::{Error, Result};
use std::sync::Arc;

/// One piece to place.
///
/// A part keeps its spacing-expanded boundary centered on its centroid
/// (`original_polygon`) and derives the current `polygon` from it for every
/// pose, so repeated rotations never accumulate drift. The reference point of a
/// pose is the centroid position `(x, y)`.
///
/// Cloning a part copies every polygon; only the template id is shared.
#[derive(Debug, Clone)]
pub struct Part {
    id: String,
    template_id: Arc<str>,
    instance: usize,
    original: Polygon2D,
    unbuffered: Polygon2D,
    polygon: Polygon2D,
    x: f64,
    y: f64,
    angle: f64,
    rotation_steps: u32,
    spacing: f64,
    area: f64,
    unbuffered_area: f64,
}

impl Part {
    /// Creates a master part from a template polygon.
    ///
    /// The polygon is centered on its centroid and grown by `spacing / 2`, so two
    /// touching parts keep `spacing` between their real outlines. `rotation_steps`
    /// divides the full turn into allowed angles; 1 disables rotation.
    pub fn new(
        template_id: impl Into<String>,
        polygon: Polygon2D,
        spacing: f64,
        rotation_steps: u32,
    ) -> Result<Self> {
        polygon.validate()?;
        if rotation_steps == 0 {
            return Err(Error::InvalidConfig(
                "rotation steps must be at least 1".into(),
            ));
        }
        if !(spacing >= 0.0 && spacing.is_finite()) {
            return Err(Error::InvalidConfig(format!(
                "spacing must be non-negative, got {spacing}"
            )));
        }

        let (cx, cy) = polygon.centroid();
        let unbuffered = polygon.translated(-cx, -cy).normalized();
        let buffered = minkowski::buffer(&unbuffered, spacing / 2.0);

        // Recenter on the buffered centroid and keep both outlines aligned.
        let (bx, by) = buffered.centroid();
        let original = buffered.translated(-bx, -by);
        let unbuffered = unbuffered.translated(-bx, -by);

        let template_id: String = template_id.into();
        let area = original.area();
        let unbuffered_area = unbuffered.area();
        Ok(Self {
            id: template_id.clone(),
            template_id: template_id.into(),
            instance: 0,
            polygon: original.clone(),
            original,
            unbuffered,
            x: 0.0,
            y: 0.0,
            angle: 0.0,
            rotation_steps,
            spacing,
            area,
            unbuffered_area,
        })
    }

    /// Clones the part into `quantity` instances named `"{template}_{i}"`.
    pub fn instances(&self, quantity: usize) -> Vec<Part> {
        (0..quantity)
            .map(|i| {
                let mut part = self.clone();
                part.id = format!("{}_{}", self.template_id, i);
                part.instance = i;
                part
            })
            .collect()
    }

    /// Instance id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Template id shared by every instance.
    pub fn template_id(&self) -> &str {
        &self.template_id
    }

    pub(crate) fn template_key(&self) -> Arc<str> {
        Arc::clone(&self.template_id)
    }

    /// Instance index within the template.
    pub fn instance(&self) -> usize {
        self.instance
    }

    /// Current boundary (spacing included).
    pub fn polygon(&self) -> &Polygon2D {
        &self.polygon
    }

    /// Unrotated, spacing-expanded boundary centered on the origin.
    pub fn original_polygon(&self) -> &Polygon2D {
        &self.original
    }

    /// Boundary without the spacing expansion, centered like `original_polygon`.
    pub fn unbuffered_polygon(&self) -> &Polygon2D {
        &self.unbuffered
    }

    /// Current reference point (centroid position).
    pub fn position(&self) -> (f64, f64) {
        (self.x, self.y)
    }

    /// Current angle in degrees.
    pub fn angle(&self) -> f64 {
        self.angle
    }

    /// Number of allowed rotation steps.
    pub fn rotation_steps(&self) -> u32 {
        self.rotation_steps
    }

    /// Part spacing.
    pub fn spacing(&self) -> f64 {
        self.spacing
    }

    /// Area of the spacing-expanded boundary.
    pub fn area(&self) -> f64 {
        self.area
    }

    /// Area without spacing.
    pub fn unbuffered_area(&self) -> f64 {
        self.unbuffered_area
    }

    /// Bounds of the current polygon.
    pub fn bounds(&self) -> Bounds {
        self.polygon.bounds()
    }

    /// Allowed angles in degrees: `k * 360 / rotation_steps`.
    pub fn allowed_angles(&self) -> Vec<f64> {
        let step = 360.0 / f64::from(self.rotation_steps);
        (0..self.rotation_steps).map(|k| f64::from(k) * step).collect()
    }

    /// The original polygon rotated by `angle`, still centered on the origin.
    pub fn rotated_template(&self, angle: f64) -> Polygon2D {
        self.original.rotated(angle)
    }

    /// The boundary this part would have at the given pose.
    pub fn posed_polygon(&self, x: f64, y: f64, angle: f64) -> Polygon2D {
        self.original.rotated(angle).translated(x, y)
    }

    /// Moves the part to a new pose.
    pub fn set_pose(&mut self, x: f64, y: f64, angle: f64) {
        self.polygon = self.posed_polygon(x, y, angle);
        self.x = x;
        self.y = y;
        self.angle = angle;
    }

    /// Unbuffered boundary at the current pose.
    pub fn unbuffered_at_pose(&self) -> Polygon2D {
        self.unbuffered.rotated(self.angle).translated(self.x, self.y)
    }

    /// True if the unrotated part has no concavities or holes.
    pub fn is_convex(&self) -> bool {
        self.original.is_convex()
    }
}
