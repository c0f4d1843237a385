//! Genetic search over part order and rotation.
//!
//! A [`Chromosome`] fixes the placement order and one discrete rotation per part.
//! It is scored by a deterministic grid-fill placer ([`GridLayout`]) that only
//! looks at rotated bounding boxes, so the search itself needs no boolean
//! polygon operations. The best chromosome is laid out once more at the end to
//! produce the real sheets.

use super::{NestingStrategy, StrategyContext, StrategyOutcome};
use crate::collision::CONTAINMENT_TOLERANCE;
use crate::geometry::Bounds;
use crate::part::Part;
use rand::prelude::*;
use sheetnest_core::{order_crossover, GaConfig, GaProblem, GaRunner, Individual, Result};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Penalty per unplaced part, in sheet areas.
const UNPLACED_PENALTY: f64 = 10.0;

/// One part and its rotation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Gene {
    /// Index of the part in the problem's part list.
    pub part: usize,
    /// Rotation as a multiple of `360 / rotation_steps`.
    pub rotation: u32,
}

/// Placement order plus rotations.
#[derive(Debug, Clone)]
pub struct Chromosome {
    genes: Vec<Gene>,
    rotation_steps: Arc<Vec<u32>>,
    cost: f64,
}

impl Chromosome {
    fn new(genes: Vec<Gene>, rotation_steps: Arc<Vec<u32>>) -> Self {
        Self {
            genes,
            rotation_steps,
            cost: f64::INFINITY,
        }
    }

    /// The genes in placement order.
    pub fn genes(&self) -> &[Gene] {
        &self.genes
    }

    /// Rotation of a gene in degrees.
    pub fn angle(&self, gene: &Gene) -> f64 {
        let steps = self.rotation_steps.get(gene.part).copied().unwrap_or(1).max(1);
        f64::from(gene.rotation) * 360.0 / f64::from(steps)
    }

    fn swap_mutate<R: Rng>(&mut self, rng: &mut R) {
        let n = self.genes.len();
        if n < 2 {
            return;
        }
        let i = rng.gen_range(0..n);
        let j = rng.gen_range(0..n);
        self.genes.swap(i, j);
        self.cost = f64::INFINITY;
    }

    fn rotation_mutate<R: Rng>(&mut self, rng: &mut R) {
        if self.genes.is_empty() {
            return;
        }
        let idx = rng.gen_range(0..self.genes.len());
        let gene = &mut self.genes[idx];
        let steps = self.rotation_steps.get(gene.part).copied().unwrap_or(1);
        if steps > 1 {
            gene.rotation = rng.gen_range(0..steps);
            self.cost = f64::INFINITY;
        }
    }
}

impl Individual for Chromosome {
    fn cost(&self) -> f64 {
        self.cost
    }

    fn crossover<R: Rng>(&self, other: &Self, rng: &mut R) -> Self {
        let genes = order_crossover(&self.genes, &other.genes, |g| g.part, rng);
        Self::new(genes, Arc::clone(&self.rotation_steps))
    }

    fn mutate<R: Rng>(&mut self, rate: f64, rng: &mut R) {
        if rng.gen::<f64>() < rate {
            self.swap_mutate(rng);
        }
        if rng.gen::<f64>() < rate {
            self.rotation_mutate(rng);
        }
    }
}

/// A part position chosen by the grid-fill placer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridSlot {
    /// Index of the part in the problem's part list.
    pub part: usize,
    /// Reference point x.
    pub x: f64,
    /// Reference point y.
    pub y: f64,
    /// Rotation in degrees.
    pub angle: f64,
}

/// Result of the grid-fill placer for one chromosome.
#[derive(Debug, Clone, Default)]
pub struct GridLayout {
    /// Slots per sheet, in opening order.
    pub sheets: Vec<Vec<GridSlot>>,
    /// Parts larger than an empty sheet.
    pub unplaced: Vec<usize>,
    /// Layout cost; lower is better.
    pub cost: f64,
}

/// Row cursor on the current sheet.
#[derive(Debug, Clone, Copy, Default)]
struct Cursor {
    x: f64,
    row_y: f64,
    row_height: f64,
}

/// Genetic nesting problem: rotated extents of every part on a fixed sheet size.
pub struct NestingProblem {
    extents: Vec<Vec<Bounds>>,
    rotation_steps: Arc<Vec<u32>>,
    width: f64,
    height: f64,
    best_seen: AtomicU64,
}

impl NestingProblem {
    /// Prepares the problem for the given parts.
    pub fn new(parts: &[Part], width: f64, height: f64) -> Self {
        let extents = parts
            .iter()
            .map(|p| {
                p.allowed_angles()
                    .into_iter()
                    .map(|angle| p.rotated_template(angle).bounds())
                    .collect()
            })
            .collect();
        let rotation_steps = parts.iter().map(Part::rotation_steps).collect();
        Self {
            extents,
            rotation_steps: Arc::new(rotation_steps),
            width,
            height,
            best_seen: AtomicU64::new(f64::INFINITY.to_bits()),
        }
    }

    /// Number of parts.
    pub fn len(&self) -> usize {
        self.extents.len()
    }

    /// Returns true if there are no parts.
    pub fn is_empty(&self) -> bool {
        self.extents.is_empty()
    }

    /// Chromosome with parts in input order and no rotation.
    pub fn identity(&self) -> Chromosome {
        let genes = (0..self.len()).map(|part| Gene { part, rotation: 0 }).collect();
        Chromosome::new(genes, Arc::clone(&self.rotation_steps))
    }

    /// Lays the chromosome out row by row.
    ///
    /// Each part continues the current row if it fits to the right, otherwise
    /// starts a new row above the tallest part of the current one, otherwise
    /// opens a new sheet.
    pub fn decode(&self, chromosome: &Chromosome) -> GridLayout {
        let (w, h, tol) = (self.width, self.height, CONTAINMENT_TOLERANCE);
        let mut layout = GridLayout::default();
        let mut cursor = Cursor::default();

        for gene in chromosome.genes() {
            let Some(b) = self
                .extents
                .get(gene.part)
                .and_then(|e| e.get(gene.rotation as usize))
            else {
                layout.unplaced.push(gene.part);
                continue;
            };
            let (bw, bh) = (b.width(), b.height());
            if bw > w + tol || bh > h + tol {
                layout.unplaced.push(gene.part);
                continue;
            }

            if layout.sheets.is_empty() {
                layout.sheets.push(Vec::new());
            }
            if cursor.x + bw > w + tol {
                cursor = Cursor {
                    x: 0.0,
                    row_y: cursor.row_y + cursor.row_height,
                    row_height: 0.0,
                };
            }
            if cursor.row_y + bh > h + tol {
                layout.sheets.push(Vec::new());
                cursor = Cursor::default();
            }

            let slot = GridSlot {
                part: gene.part,
                x: cursor.x - b.min_x,
                y: cursor.row_y - b.min_y,
                angle: chromosome.angle(gene),
            };
            if let Some(sheet) = layout.sheets.last_mut() {
                sheet.push(slot);
            }
            cursor.x += bw;
            cursor.row_height = cursor.row_height.max(bh);
        }

        layout.cost = self.cost(&layout);
        layout
    }

    /// Sheets used, then compactness of the last sheet, then unplaced parts.
    fn cost(&self, layout: &GridLayout) -> f64 {
        let sheet_area = self.width * self.height;
        let last_sheet = layout.sheets.last().map_or(0.0, |slots| {
            let (max_x, max_y) = slots.iter().fold((0.0f64, 0.0f64), |(mx, my), s| {
                let b = &self.extents[s.part][self.rotation_index(s)];
                (mx.max(s.x + b.max_x), my.max(s.y + b.max_y))
            });
            max_x * max_y
        });
        layout.sheets.len() as f64 * sheet_area
            + last_sheet
            + UNPLACED_PENALTY * sheet_area * layout.unplaced.len() as f64
    }

    fn rotation_index(&self, slot: &GridSlot) -> usize {
        let steps = self.rotation_steps[slot.part].max(1);
        let k = (slot.angle * f64::from(steps) / 360.0).round() as usize;
        k.min(self.extents[slot.part].len().saturating_sub(1))
    }
}

impl GaProblem for NestingProblem {
    type Individual = Chromosome;

    fn initialize_population<R: Rng>(&self, size: usize, rng: &mut R) -> Vec<Chromosome> {
        if self.is_empty() {
            return Vec::new();
        }
        let mut population = Vec::with_capacity(size);
        population.push(self.identity());
        while population.len() < size {
            let mut genes: Vec<Gene> = (0..self.len())
                .map(|part| Gene {
                    part,
                    rotation: rng.gen_range(0..self.rotation_steps[part].max(1)),
                })
                .collect();
            genes.shuffle(rng);
            population.push(Chromosome::new(genes, Arc::clone(&self.rotation_steps)));
        }
        population
    }

    fn evaluate(&self, individual: &mut Chromosome) {
        individual.cost = self.decode(individual).cost;
    }

    fn on_generation(&self, generation: u32, best: &Chromosome, _population: &[Chromosome]) {
        let previous = f64::from_bits(self.best_seen.load(Ordering::Relaxed));
        if best.cost < previous {
            self.best_seen.store(best.cost.to_bits(), Ordering::Relaxed);
            log::debug!("generation {}: new best fitness {:.2}", generation, best.cost);
        }
    }
}

/// Genetic strategy.
#[derive(Debug, Clone, Default)]
pub struct GeneticStrategy {
    config: GaConfig,
}

impl GeneticStrategy {
    /// Creates the strategy.
    pub fn new(config: GaConfig) -> Self {
        Self { config }
    }
}

impl NestingStrategy for GeneticStrategy {
    fn place(&mut self, parts: Vec<Part>, ctx: &StrategyContext<'_>) -> Result<StrategyOutcome> {
        let problem = NestingProblem::new(&parts, ctx.config.sheet_width, ctx.config.sheet_height);
        let runner = GaRunner::new(self.config.clone(), problem);
        let Some(result) = runner.run() else {
            return Ok(StrategyOutcome {
                unplaced: parts,
                ..StrategyOutcome::default()
            });
        };
        log::debug!(
            "genetic search finished after {} generations, best fitness {:.2}",
            result.generations,
            result.best.cost()
        );

        let layout = runner.problem().decode(&result.best);
        let mut pending: Vec<Option<Part>> = parts.into_iter().map(Some).collect();
        let mut outcome = StrategyOutcome {
            generations: Some(result.generations),
            best_fitness: Some(result.best.cost()),
            fitness_history: Some(result.history),
            ..StrategyOutcome::default()
        };

        for slots in &layout.sheets {
            let mut sheet = ctx.new_sheet(outcome.sheets.len());
            for slot in slots {
                let Some(mut part) = pending.get_mut(slot.part).and_then(Option::take) else {
                    continue;
                };
                part.set_pose(slot.x, slot.y, slot.angle);
                sheet.add_part(&part);
                log::debug!("placed {} on sheet {}", part.id(), sheet.id());
                ctx.notify(&part, &sheet);
            }
            outcome.sheets.push(sheet);
        }
        outcome.unplaced = pending.into_iter().flatten().collect();
        Ok(outcome)
    }
}
