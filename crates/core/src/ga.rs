//! Genetic algorithm framework.
//!
//! Costs are minimized: lower is better. The runner keeps the top
//! [`GaConfig::elite_count`] individuals unchanged each generation, so the best
//! cost in [`GaResult::history`] never increases.

use crate::{Error, Result};
use rand::prelude::*;
use rand::rngs::StdRng;
use rayon::prelude::*;
use std::collections::HashSet;
use std::hash::Hash;
use std::time::{Duration, Instant};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Configuration for the genetic algorithm.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GaConfig {
    /// Population size.
    pub population_size: usize,
    /// Number of generations evolved after the initial population.
    pub generations: u32,
    /// Probability that a child is produced by crossover rather than cloning parent 1.
    pub crossover_rate: f64,
    /// Independent probability of each mutation operator firing on a child.
    pub mutation_rate: f64,
    /// Fraction of the population carried over unchanged (at least one individual).
    pub elite_fraction: f64,
    /// Tournament size for parent selection.
    pub tournament_size: usize,
    /// Seed for reproducible runs (`None` = entropy).
    pub seed: Option<u64>,
}

impl Default for GaConfig {
    fn default() -> Self {
        Self {
            population_size: 20,
            generations: 30,
            crossover_rate: 1.0,
            mutation_rate: 0.1,
            elite_fraction: 0.1,
            tournament_size: 3,
            seed: None,
        }
    }
}

impl GaConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the population size.
    pub fn with_population_size(mut self, size: usize) -> Self {
        self.population_size = size.max(2);
        self
    }

    /// Sets the number of generations.
    pub fn with_generations(mut self, generations: u32) -> Self {
        self.generations = generations;
        self
    }

    /// Sets the crossover rate.
    pub fn with_crossover_rate(mut self, rate: f64) -> Self {
        self.crossover_rate = rate.clamp(0.0, 1.0);
        self
    }

    /// Sets the mutation rate.
    pub fn with_mutation_rate(mut self, rate: f64) -> Self {
        self.mutation_rate = rate.clamp(0.0, 1.0);
        self
    }

    /// Sets the elite fraction.
    pub fn with_elite_fraction(mut self, fraction: f64) -> Self {
        self.elite_fraction = fraction.clamp(0.0, 1.0);
        self
    }

    /// Sets the tournament size.
    pub fn with_tournament_size(mut self, size: usize) -> Self {
        self.tournament_size = size.max(1);
        self
    }

    /// Fixes the random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Number of individuals copied unchanged into the next generation.
    pub fn elite_count(&self) -> usize {
        let count = (self.population_size as f64 * self.elite_fraction) as usize;
        count.clamp(1, self.population_size.max(1))
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.population_size < 2 {
            return Err(Error::InvalidConfig(format!(
                "population size must be at least 2, got {}",
                self.population_size
            )));
        }
        if self.tournament_size == 0 {
            return Err(Error::InvalidConfig(
                "tournament size must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Builds the RNG for a run.
    pub fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}

/// An individual in the population.
///
/// Crossover and mutation live on the individual itself.
pub trait Individual: Clone + Send + Sync {
    /// Cost of this individual (lower is better). `f64::INFINITY` until evaluated.
    fn cost(&self) -> f64;

    /// Produces a child from `self` and `other`.
    fn crossover<R: Rng>(&self, other: &Self, rng: &mut R) -> Self;

    /// Mutates in place; each operator fires independently with probability `rate`.
    fn mutate<R: Rng>(&mut self, rate: f64, rng: &mut R);
}

/// Problem-specific GA operations.
pub trait GaProblem: Send + Sync {
    /// The individual type for this problem.
    type Individual: Individual;

    /// Creates the initial population.
    fn initialize_population<R: Rng>(&self, size: usize, rng: &mut R) -> Vec<Self::Individual>;

    /// Evaluates and stores the cost of an individual.
    fn evaluate(&self, individual: &mut Self::Individual);

    /// Evaluates multiple individuals in parallel.
    fn evaluate_parallel(&self, individuals: &mut [Self::Individual]) {
        individuals.par_iter_mut().for_each(|ind| {
            self.evaluate(ind);
        });
    }

    /// Called after each generation.
    fn on_generation(
        &self,
        _generation: u32,
        _best: &Self::Individual,
        _population: &[Self::Individual],
    ) {
    }
}

/// Result of a GA run.
#[derive(Debug, Clone)]
pub struct GaResult<I: Individual> {
    /// The best individual found.
    pub best: I,
    /// Generations evolved.
    pub generations: u32,
    /// Total elapsed time.
    pub elapsed: Duration,
    /// Best cost of the initial population followed by the best cost after each generation.
    pub history: Vec<f64>,
}

/// Genetic algorithm runner.
pub struct GaRunner<P: GaProblem> {
    config: GaConfig,
    problem: P,
}

impl<P: GaProblem> GaRunner<P> {
    /// Creates a new GA runner.
    pub fn new(config: GaConfig, problem: P) -> Self {
        Self { config, problem }
    }

    /// Returns the problem.
    pub fn problem(&self) -> &P {
        &self.problem
    }

    /// Runs the genetic algorithm with the configured seed.
    pub fn run(&self) -> Option<GaResult<P::Individual>> {
        let mut rng = self.config.rng();
        self.run_with_rng(&mut rng)
    }

    /// Runs the genetic algorithm with a specific RNG.
    ///
    /// Returns `None` for an empty initial population.
    pub fn run_with_rng<R: Rng>(&self, rng: &mut R) -> Option<GaResult<P::Individual>> {
        let start = Instant::now();
        let size = self.config.population_size.max(2);
        let elite_count = self.config.elite_count().min(size);

        let mut population = self.problem.initialize_population(size, rng);
        if population.is_empty() {
            return None;
        }
        self.problem.evaluate_parallel(&mut population);
        sort_by_cost(&mut population);
        log::debug!(
            "GA start: population {}, {} elites, {} generations, initial best {:.3}",
            population.len(),
            elite_count,
            self.config.generations,
            population[0].cost()
        );

        let mut history = vec![population[0].cost()];
        let mut generation = 0u32;

        while generation < self.config.generations {
            let mut next = Vec::with_capacity(size);
            next.extend(population.iter().take(elite_count).cloned());

            let mut children = Vec::with_capacity(size - next.len());
            while children.len() < size - next.len() {
                let parent1 = self.tournament_select(&population, rng);
                let parent2 = self.tournament_select(&population, rng);

                let mut child = if rng.gen::<f64>() < self.config.crossover_rate {
                    parent1.crossover(parent2, rng)
                } else {
                    parent1.clone()
                };
                child.mutate(self.config.mutation_rate, rng);
                children.push(child);
            }

            self.problem.evaluate_parallel(&mut children);
            next.extend(children);
            sort_by_cost(&mut next);

            population = next;
            history.push(population[0].cost());
            self.problem
                .on_generation(generation, &population[0], &population);
            generation += 1;
            log::trace!("GA generation {}: best {:.3}", generation, population[0].cost());
        }

        log::debug!(
            "GA finished after {} generations in {} ms, best {:.3}",
            generation,
            start.elapsed().as_millis(),
            population[0].cost()
        );
        Some(GaResult {
            best: population[0].clone(),
            generations: generation,
            elapsed: start.elapsed(),
            history,
        })
    }

    /// Samples `tournament_size` distinct individuals and returns the cheapest.
    fn tournament_select<'a, R: Rng>(
        &self,
        population: &'a [P::Individual],
        rng: &mut R,
    ) -> &'a P::Individual {
        let k = self.config.tournament_size.clamp(1, population.len());
        let mut best: Option<&P::Individual> = None;
        for individual in population.choose_multiple(rng, k) {
            if best.map_or(true, |b| individual.cost() < b.cost()) {
                best = Some(individual);
            }
        }
        best.unwrap_or(&population[0])
    }
}

fn sort_by_cost<I: Individual>(population: &mut [I]) {
    population.sort_by(|a, b| a.cost().total_cmp(&b.cost()));
}

/// Order crossover (OX1) over sequences whose elements are identified by `key`.
///
/// A random contiguous slice of `parent1` is copied in place; the remaining slots
/// are filled left to right with the elements of `parent2` not already present,
/// in `parent2`'s order. Both parents must hold the same set of keys.
pub fn order_crossover<T, K, F, R>(parent1: &[T], parent2: &[T], key: F, rng: &mut R) -> Vec<T>
where
    T: Clone,
    K: Eq + Hash,
    F: Fn(&T) -> K,
    R: Rng,
{
    let n = parent1.len();
    if n < 2 || parent2.len() != n {
        return parent1.to_vec();
    }

    let (mut start, mut end) = (rng.gen_range(0..n), rng.gen_range(0..n));
    if start > end {
        std::mem::swap(&mut start, &mut end);
    }

    let mut child: Vec<Option<T>> = vec![None; n];
    let mut taken = HashSet::with_capacity(end - start + 1);
    for i in start..=end {
        taken.insert(key(&parent1[i]));
        child[i] = Some(parent1[i].clone());
    }

    let mut donors = parent2.iter().filter(|gene| !taken.contains(&key(gene)));
    for slot in child.iter_mut().filter(|slot| slot.is_none()) {
        *slot = donors.next().cloned();
    }

    child
        .into_iter()
        .zip(parent1)
        .map(|(slot, fallback)| slot.unwrap_or_else(|| fallback.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone)]
    struct Scalar {
        value: f64,
        cost: f64,
    }

    impl Individual for Scalar {
        fn cost(&self) -> f64 {
            self.cost
        }

        fn crossover<R: Rng>(&self, other: &Self, _rng: &mut R) -> Self {
            Self {
                value: (self.value + other.value) / 2.0,
                cost: f64::INFINITY,
            }
        }

        fn mutate<R: Rng>(&mut self, rate: f64, rng: &mut R) {
            if rng.gen::<f64>() < rate {
                self.value += rng.gen_range(-10.0..10.0);
            }
        }
    }

    struct Parabola;

    impl GaProblem for Parabola {
        type Individual = Scalar;

        fn initialize_population<R: Rng>(&self, size: usize, rng: &mut R) -> Vec<Scalar> {
            (0..size)
                .map(|_| Scalar {
                    value: rng.gen_range(-100.0..100.0),
                    cost: f64::INFINITY,
                })
                .collect()
        }

        fn evaluate(&self, individual: &mut Scalar) {
            individual.cost = individual.value * individual.value;
        }
    }

    #[test]
    fn test_ga_converges() {
        let config = GaConfig::default()
            .with_population_size(40)
            .with_generations(60)
            .with_mutation_rate(0.5)
            .with_seed(11);

        let result = GaRunner::new(config, Parabola).run().unwrap();
        assert!(result.best.value.abs() < 5.0);
        assert_eq!(result.generations, 60);
        assert_eq!(result.history.len(), 61);
    }

    #[test]
    fn test_elitism_never_worsens() {
        let config = GaConfig::default()
            .with_population_size(10)
            .with_generations(25)
            .with_mutation_rate(1.0)
            .with_seed(3);

        let result = GaRunner::new(config, Parabola).run().unwrap();
        for pair in result.history.windows(2) {
            assert!(pair[1] <= pair[0]);
        }
    }

    struct Capture(std::sync::Mutex<Vec<String>>);

    impl log::Log for Capture {
        fn enabled(&self, metadata: &log::Metadata<'_>) -> bool {
            metadata.level() <= log::Level::Debug
        }

        fn log(&self, record: &log::Record<'_>) {
            if let Ok(mut lines) = self.0.lock() {
                lines.push(record.args().to_string());
            }
        }

        fn flush(&self) {}
    }

    static CAPTURE: Capture = Capture(std::sync::Mutex::new(Vec::new()));

    #[test]
    fn test_run_logs_progress() {
        let _ = log::set_logger(&CAPTURE);
        log::set_max_level(log::LevelFilter::Debug);

        let config = GaConfig::default().with_generations(3).with_seed(5);
        GaRunner::new(config, Parabola).run().unwrap();

        let lines = CAPTURE.0.lock().unwrap();
        assert!(lines.iter().any(|l| l.starts_with("GA start")));
        assert!(lines.iter().any(|l| l.starts_with("GA finished after 3 generations")));
    }

    #[test]
    fn test_elite_count_at_least_one() {
        assert_eq!(GaConfig::default().with_population_size(5).elite_count(), 1);
        assert_eq!(GaConfig::default().with_population_size(20).elite_count(), 2);
        assert_eq!(
            GaConfig::default()
                .with_population_size(20)
                .with_elite_fraction(0.0)
                .elite_count(),
            1
        );
    }

    #[test]
    fn test_order_crossover_is_permutation() {
        let mut rng = StdRng::seed_from_u64(5);
        let parent1: Vec<(usize, f64)> = (0..10).map(|i| (i, 0.0)).collect();
        let mut parent2: Vec<(usize, f64)> = (0..10).map(|i| (i, 90.0)).collect();
        parent2.shuffle(&mut rng);

        for _ in 0..20 {
            let child = order_crossover(&parent1, &parent2, |g| g.0, &mut rng);
            let mut ids: Vec<usize> = child.iter().map(|g| g.0).collect();
            ids.sort_unstable();
            assert_eq!(ids, (0..10).collect::<Vec<_>>());
        }
    }

    #[test]
    fn test_order_crossover_keeps_parent2_order() {
        let mut rng = StdRng::seed_from_u64(9);
        let parent1 = vec![0usize, 1, 2, 3, 4, 5];
        let parent2 = vec![5usize, 4, 3, 2, 1, 0];

        let child = order_crossover(&parent1, &parent2, |g| *g, &mut rng);
        let kept: HashSet<usize> = child
            .iter()
            .zip(&parent1)
            .filter(|(c, p)| c == p)
            .map(|(c, _)| *c)
            .collect();
        let from_parent2: Vec<usize> = child.iter().copied().filter(|g| !kept.contains(g)).collect();
        let expected: Vec<usize> = parent2.iter().copied().filter(|g| !kept.contains(g)).collect();
        assert_eq!(from_parent2, expected);
    }
}
