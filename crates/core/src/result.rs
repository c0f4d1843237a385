//! Run summary representation.

use crate::config::Strategy;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Summary of a nesting run, independent of the geometry types that produced it.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RunSummary {
    /// Strategy used.
    pub strategy: Strategy,

    /// Number of sheets holding at least one part.
    pub sheets_used: usize,

    /// Number of placed part instances.
    pub placed: usize,

    /// Ids of part instances that could not be placed.
    pub unplaced: Vec<String>,

    /// Placed (unbuffered) part area divided by total used sheet area (0.0 - 1.0).
    pub utilization: f64,

    /// Computation time in milliseconds.
    pub computation_time_ms: u64,

    /// Number of generations (genetic strategy).
    pub generations: Option<u32>,

    /// Best cost reached (genetic strategy).
    pub best_fitness: Option<f64>,

    /// Best cost per generation (genetic strategy).
    pub fitness_history: Option<Vec<f64>>,
}

impl RunSummary {
    /// Creates an empty summary for the given strategy.
    pub fn new(strategy: Strategy) -> Self {
        Self {
            strategy,
            sheets_used: 0,
            placed: 0,
            unplaced: Vec::new(),
            utilization: 0.0,
            computation_time_ms: 0,
            generations: None,
            best_fitness: None,
            fitness_history: None,
        }
    }

    /// Returns true if every part was placed.
    pub fn all_placed(&self) -> bool {
        self.unplaced.is_empty()
    }

    /// Total number of part instances submitted.
    pub fn total_requested(&self) -> usize {
        self.placed + self.unplaced.len()
    }

    /// Sets the generations count.
    pub fn with_generations(mut self, generations: u32) -> Self {
        self.generations = Some(generations);
        self
    }

    /// Sets the best fitness.
    pub fn with_best_fitness(mut self, fitness: f64) -> Self {
        self.best_fitness = Some(fitness);
        self
    }

    /// Sets the fitness history.
    pub fn with_fitness_history(mut self, history: Vec<f64>) -> Self {
        self.fitness_history = Some(history);
        self
    }

    /// Returns utilization as a percentage string.
    pub fn utilization_percent(&self) -> String {
        format!("{:.1}%", self.utilization * 100.0)
    }
}
