//! Synthetic job generator.
//!
//! Produces reproducible jobs mixing convex, concave and holed parts.

use crate::job::{Job, JobItem};
use rand::prelude::*;
use std::f64::consts::PI;

/// Generator for synthetic nesting jobs.
#[derive(Debug, Clone)]
pub struct SyntheticGenerator {
    rng: StdRng,
}

impl SyntheticGenerator {
    /// Creates a generator with a random seed.
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Creates a generator with a specific seed for reproducibility.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Convex parts only (rectangles and regular polygons); every strategy accepts them.
    pub fn convex(&mut self, count: usize, sheet_size: f64) -> Job {
        let items = (0..count)
            .map(|i| {
                let exterior = if self.rng.gen_bool(0.5) {
                    let w = self.rng.gen_range(10.0..40.0);
                    let h = self.rng.gen_range(10.0..40.0);
                    rectangle(w, h)
                } else {
                    let sides = self.rng.gen_range(3..=8);
                    let radius = self.rng.gen_range(5.0..20.0);
                    regular_polygon(sides, radius)
                };
                self.item(format!("convex_{}", i), exterior, Vec::new())
            })
            .collect();
        job("synthetic_convex", sheet_size, items)
    }

    /// Concave parts, some with holes.
    pub fn mixed(&mut self, count: usize, sheet_size: f64) -> Job {
        let items = (0..count)
            .map(|i| {
                let id = format!("mixed_{}", i);
                match self.rng.gen_range(0..5) {
                    0 => {
                        let exterior = self.star();
                        self.item(id, exterior, Vec::new())
                    }
                    1 => {
                        let exterior = self.l_shape();
                        self.item(id, exterior, Vec::new())
                    }
                    2 => {
                        let exterior = self.t_shape();
                        self.item(id, exterior, Vec::new())
                    }
                    3 => {
                        let outer = self.rng.gen_range(20.0..35.0);
                        let border = outer * self.rng.gen_range(0.15..0.3);
                        let hole = vec![
                            [border, border],
                            [outer - border, border],
                            [outer - border, outer - border],
                            [border, outer - border],
                        ];
                        self.item(id, rectangle(outer, outer), vec![hole])
                    }
                    _ => {
                        let w = self.rng.gen_range(5.0..15.0);
                        let h = self.rng.gen_range(5.0..15.0);
                        self.item(id, rectangle(w, h), Vec::new())
                    }
                }
            })
            .collect();
        job("synthetic_mixed", sheet_size, items)
    }

    fn item(&mut self, id: String, exterior: Vec<[f64; 2]>, holes: Vec<Vec<[f64; 2]>>) -> JobItem {
        JobItem {
            id,
            quantity: self.rng.gen_range(1..=3),
            rotation_steps: *[1, 2, 4].choose(&mut self.rng).unwrap_or(&4),
            exterior,
            holes,
        }
    }

    fn star(&mut self) -> Vec<[f64; 2]> {
        let points = self.rng.gen_range(5..=8);
        let outer_radius = self.rng.gen_range(15.0..25.0);
        let inner_radius = outer_radius * self.rng.gen_range(0.3..0.5);

        (0..points * 2)
            .map(|i| {
                let angle = PI * (i as f64) / (points as f64) - PI / 2.0;
                let radius = if i % 2 == 0 { outer_radius } else { inner_radius };
                [radius * angle.cos(), radius * angle.sin()]
            })
            .collect()
    }

    fn l_shape(&mut self) -> Vec<[f64; 2]> {
        let w = self.rng.gen_range(15.0..25.0);
        let h = self.rng.gen_range(15.0..25.0);
        let notch_w = w * self.rng.gen_range(0.4..0.6);
        let notch_h = h * self.rng.gen_range(0.4..0.6);

        vec![
            [0.0, 0.0],
            [w, 0.0],
            [w, h - notch_h],
            [w - notch_w, h - notch_h],
            [w - notch_w, h],
            [0.0, h],
        ]
    }

    fn t_shape(&mut self) -> Vec<[f64; 2]> {
        let w = self.rng.gen_range(20.0..30.0);
        let h = self.rng.gen_range(20.0..30.0);
        let stem_w = w * 0.3;
        let stem_h = h * 0.6;
        let left = (w - stem_w) / 2.0;

        vec![
            [0.0, h - stem_h],
            [left, h - stem_h],
            [left, 0.0],
            [left + stem_w, 0.0],
            [left + stem_w, h - stem_h],
            [w, h - stem_h],
            [w, h],
            [0.0, h],
        ]
    }
}

impl Default for SyntheticGenerator {
    fn default() -> Self {
        Self::new()
    }
}

fn job(name: &str, sheet_size: f64, items: Vec<JobItem>) -> Job {
    Job {
        name: name.to_string(),
        sheet_width: sheet_size,
        sheet_height: sheet_size,
        spacing: 1.0,
        sheet_spacing: 10.0,
        items,
    }
}

fn regular_polygon(sides: usize, radius: f64) -> Vec<[f64; 2]> {
    (0..sides)
        .map(|i| {
            let angle = 2.0 * PI * (i as f64) / (sides as f64) - PI / 2.0;
            [radius * angle.cos(), radius * angle.sin()]
        })
        .collect()
}

fn rectangle(width: f64, height: f64) -> Vec<[f64; 2]> {
    vec![[0.0, 0.0], [width, 0.0], [width, height], [0.0, height]]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_generation_is_reproducible() {
        let a = SyntheticGenerator::with_seed(42).mixed(10, 200.0);
        let b = SyntheticGenerator::with_seed(42).mixed(10, 200.0);
        assert_eq!(a, b);
    }

    #[test]
    fn test_generated_parts_are_valid() {
        let job = SyntheticGenerator::with_seed(7).mixed(20, 200.0);
        let parts = job.parts().unwrap();
        assert_eq!(parts.len(), job.instance_count());

        let convex = SyntheticGenerator::with_seed(7).convex(10, 200.0);
        assert!(convex.parts().unwrap().iter().all(|p| p.is_convex()));
    }
}
