//! JSON job format.
//!
//! ```json
//! {
//!   "name": "demo",
//!   "sheet_width": 1000.0,
//!   "sheet_height": 500.0,
//!   "spacing": 2.0,
//!   "items": [
//!     { "id": "plate", "quantity": 3, "rotation_steps": 4,
//!       "exterior": [[0, 0], [100, 0], [100, 60], [0, 60]],
//!       "holes": [[[20, 20], [40, 20], [40, 40], [20, 40]]] }
//!   ]
//! }
//! ```

use serde::{Deserialize, Serialize};
use sheetnest_d2::{Part, Polygon2D};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Errors while loading or converting a job.
#[derive(Debug, Error)]
pub enum JobError {
    /// The file could not be read or written.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not a valid job.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// An item does not form a valid part.
    #[error("item '{id}': {source}")]
    Item {
        /// Item id.
        id: String,
        /// Underlying engine error.
        source: sheetnest_d2::Error,
    },
}

/// One part template and how many copies to nest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobItem {
    /// Template id.
    pub id: String,
    /// Number of copies.
    #[serde(default = "default_quantity")]
    pub quantity: usize,
    /// Discrete rotations; 1 disables rotation.
    #[serde(default = "default_rotation_steps")]
    pub rotation_steps: u32,
    /// Outer ring.
    pub exterior: Vec<[f64; 2]>,
    /// Hole rings.
    #[serde(default)]
    pub holes: Vec<Vec<[f64; 2]>>,
}

fn default_quantity() -> usize {
    1
}

fn default_rotation_steps() -> u32 {
    4
}

/// A nesting job: sheet size, part spacing and items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    /// Job name used in reports.
    pub name: String,
    /// Sheet width.
    pub sheet_width: f64,
    /// Sheet height.
    pub sheet_height: f64,
    /// Gap between parts.
    #[serde(default)]
    pub spacing: f64,
    /// Gap between sheets in the layout.
    #[serde(default)]
    pub sheet_spacing: f64,
    /// Part templates.
    pub items: Vec<JobItem>,
}

impl Job {
    /// Reads a job from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, JobError> {
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Parses a job from JSON text.
    pub fn from_json(text: &str) -> Result<Self, JobError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Writes the job as pretty JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), JobError> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Total number of part instances.
    pub fn instance_count(&self) -> usize {
        self.items.iter().map(|i| i.quantity).sum()
    }

    /// Builds every part instance.
    pub fn parts(&self) -> Result<Vec<Part>, JobError> {
        let mut parts = Vec::with_capacity(self.instance_count());
        for item in &self.items {
            let polygon = Polygon2D::from_rings(
                ring(&item.exterior),
                item.holes.iter().map(|h| ring(h)).collect(),
            );
            let master = Part::new(item.id.clone(), polygon, self.spacing, item.rotation_steps)
                .map_err(|source| JobError::Item {
                    id: item.id.clone(),
                    source,
                })?;
            parts.extend(master.instances(item.quantity));
        }
        Ok(parts)
    }
}

fn ring(points: &[[f64; 2]]) -> Vec<(f64, f64)> {
    points.iter().map(|&[x, y]| (x, y)).collect()
}
