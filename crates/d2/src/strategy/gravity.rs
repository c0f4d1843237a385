//! Gravity + anneal placement.
//!
//! A part spawns at a random collision-free pose, then falls step by step in
//! the gravity direction while the next step stays valid. When it stalls, it is
//! shaken: moved sideways (trying every rotation from the new spot) or rotated
//! in place, with growing amplitude. A shake only counts if the part can fall
//! again afterwards. When no shake helps the part is settled.

use super::{place_on_sheets, NestingStrategy, SheetPlacer, StrategyContext, StrategyOutcome};
use crate::collision;
use crate::part::Part;
use crate::placement::FeasibleRange;
use crate::sheet::Sheet;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use sheetnest_core::{GravityConfig, Result};

#[derive(Debug, Clone, Copy, PartialEq)]
struct Pose {
    x: f64,
    y: f64,
    angle: f64,
}

impl Pose {
    fn shifted(self, (dx, dy): (f64, f64), distance: f64) -> Self {
        Self {
            x: self.x + dx * distance,
            y: self.y + dy * distance,
            ..self
        }
    }

    fn turned(self, angle: f64) -> Self {
        Self { angle, ..self }
    }
}

/// Gravity strategy with its own random source.
#[derive(Debug, Clone)]
pub struct GravityStrategy {
    config: GravityConfig,
    rng: StdRng,
}

impl GravityStrategy {
    /// Creates the strategy; a configured seed makes runs reproducible.
    pub fn new(config: GravityConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { config, rng }
    }

    fn is_valid(part: &Part, sheet: &Sheet, pose: Pose) -> bool {
        collision::valid_on_sheet(&part.posed_polygon(pose.x, pose.y, pose.angle), sheet, None)
    }

    fn fall_direction(&mut self) -> (f64, f64) {
        if self.config.random_direction {
            let theta = self.rng.gen_range(0.0..std::f64::consts::TAU);
            return (theta.cos(), theta.sin());
        }
        let (dx, dy) = self.config.direction;
        let len = (dx * dx + dy * dy).sqrt();
        (dx / len, dy / len)
    }

    /// Random collision-free pose, or `None` once the attempt budget is spent.
    fn spawn(&mut self, part: &Part, sheet: &Sheet, angles: &[f64]) -> Option<Pose> {
        for _ in 0..self.config.max_spawn_attempts {
            let angle = *angles.choose(&mut self.rng)?;
            let bounds = part.rotated_template(angle).bounds();
            let Some(range) = FeasibleRange::new(&bounds, sheet.width(), sheet.height()) else {
                continue;
            };
            let pose = Pose {
                x: sample(&mut self.rng, range.min_x, range.max_x),
                y: sample(&mut self.rng, range.min_y, range.max_y),
                angle,
            };
            if Self::is_valid(part, sheet, pose) {
                return Some(pose);
            }
        }
        None
    }

    /// Number of valid consecutive steps from `pose`, up to `limit`.
    fn fall_distance(&self, part: &Part, sheet: &Sheet, pose: Pose, dir: (f64, f64), limit: usize) -> usize {
        let mut current = pose;
        let mut steps = 0;
        while steps < limit {
            let next = current.shifted(dir, self.config.step_size);
            if !Self::is_valid(part, sheet, next) {
                break;
            }
            current = next;
            steps += 1;
        }
        steps
    }

    /// Falls until the next step collides or the budget runs out.
    fn fall(&self, part: &Part, sheet: &Sheet, pose: &mut Pose, dir: (f64, f64), budget: &mut usize) {
        while *budget > 0 {
            let next = pose.shifted(dir, self.config.step_size);
            if !Self::is_valid(part, sheet, next) {
                return;
            }
            *pose = next;
            *budget -= 1;
        }
    }

    /// Tries to unstick a stalled part. Returns the new pose if the part can fall from it.
    fn shake(
        &mut self,
        part: &Part,
        sheet: &Sheet,
        pose: Pose,
        dir: (f64, f64),
        angles: &[f64],
        budget: &mut usize,
    ) -> Option<Pose> {
        let perpendicular = (-dir.1, dir.0);

        for level in 1..=self.config.anneal_levels {
            let amplitude = self.config.step_size * level as f64;
            let mut sides = [1.0, -1.0];
            sides.shuffle(&mut self.rng);

            for side in sides {
                if !self.config.anneal_translate {
                    break;
                }
                if *budget == 0 {
                    return None;
                }
                *budget -= 1;

                let moved = pose.shifted(perpendicular, amplitude * side);
                if !Self::is_valid(part, sheet, moved) {
                    continue;
                }
                let best = angles
                    .iter()
                    .map(|&angle| moved.turned(angle))
                    .filter(|&p| Self::is_valid(part, sheet, p))
                    .map(|p| (self.fall_distance(part, sheet, p, dir, *budget), p))
                    .fold(None, |best: Option<(usize, Pose)>, (d, p)| match best {
                        Some((bd, _)) if bd >= d => best,
                        _ => Some((d, p)),
                    });
                if let Some((distance, p)) = best {
                    if distance > 0 {
                        return Some(p);
                    }
                }
            }

            for &angle in angles {
                if !self.config.anneal_rotate {
                    break;
                }
                if angle == pose.angle || *budget == 0 {
                    continue;
                }
                *budget -= 1;
                let turned = pose.turned(angle);
                if Self::is_valid(part, sheet, turned)
                    && self.fall_distance(part, sheet, turned, dir, 1) > 0
                {
                    return Some(turned);
                }
            }
        }
        None
    }
}

fn sample(rng: &mut StdRng, lo: f64, hi: f64) -> f64 {
    if hi > lo {
        rng.gen_range(lo..=hi)
    } else {
        lo
    }
}

impl SheetPlacer for GravityStrategy {
    fn try_place(
        &mut self,
        part: &mut Part,
        sheet: &Sheet,
        _ctx: &StrategyContext<'_>,
    ) -> Result<bool> {
        let angles = part.allowed_angles();
        let Some(mut pose) = self.spawn(part, sheet, &angles) else {
            return Ok(false);
        };
        let dir = self.fall_direction();
        let mut budget = self.config.max_steps;

        loop {
            self.fall(part, sheet, &mut pose, dir, &mut budget);
            if budget == 0 {
                break;
            }
            match self.shake(part, sheet, pose, dir, &angles, &mut budget) {
                Some(shaken) => pose = shaken,
                None => break,
            }
        }

        part.set_pose(pose.x, pose.y, pose.angle);
        Ok(true)
    }
}

impl NestingStrategy for GravityStrategy {
    fn place(&mut self, parts: Vec<Part>, ctx: &StrategyContext<'_>) -> Result<StrategyOutcome> {
        place_on_sheets(self, parts, ctx)
    }
}
