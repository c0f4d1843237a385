//! Strategy selection and per-strategy configuration records.

use crate::ga::GaConfig;
use crate::{Error, Result};
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Packing strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Strategy {
    /// Greedy multi-sheet placement driven by no-fit polygons (highest quality).
    #[default]
    Greedy,
    /// Random spawn, directional fall and annealing shakes.
    Gravity,
    /// Genetic search over part order and rotation with a grid-fill placer.
    Genetic,
    /// Separating-axis collision with vertex-aligned candidates (convex parts only).
    Sat,
}

impl Strategy {
    /// All strategies, in declaration order.
    pub const ALL: [Strategy; 4] = [
        Strategy::Greedy,
        Strategy::Gravity,
        Strategy::Genetic,
        Strategy::Sat,
    ];

    /// Returns true if the strategy needs polygon boolean operations
    /// (union, intersection, difference) to run.
    pub fn requires_boolean_ops(&self) -> bool {
        matches!(self, Strategy::Greedy | Strategy::Gravity)
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Strategy::Greedy => "greedy",
            Strategy::Gravity => "gravity",
            Strategy::Genetic => "genetic",
            Strategy::Sat => "sat",
        };
        f.write_str(name)
    }
}

/// Preferred fill direction used to score candidate placements. Lower scores win.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FillDirection {
    /// Bottom rows first, then leftmost: minimizes `y * sheet_width + x`.
    #[default]
    BottomLeft,
    /// Minimizes `-(p · d)`, i.e. prefers points furthest along `d`.
    Vector {
        /// X component of the direction.
        x: f64,
        /// Y component of the direction.
        y: f64,
    },
}

impl FillDirection {
    /// Straight down (`(0, -1)`).
    pub fn down() -> Self {
        Self::Vector { x: 0.0, y: -1.0 }
    }

    /// Straight left (`(-1, 0)`).
    pub fn left() -> Self {
        Self::Vector { x: -1.0, y: 0.0 }
    }

    /// Scores a reference point on a sheet of the given width.
    pub fn score(&self, x: f64, y: f64, sheet_width: f64) -> f64 {
        match *self {
            FillDirection::BottomLeft => y * sheet_width + x,
            FillDirection::Vector { x: dx, y: dy } => -(x * dx + y * dy),
        }
    }
}

/// No-fit polygon engine settings.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NfpConfig {
    /// Densify NFP boundaries into extra candidate points.
    pub discretize_edges: bool,
    /// Distance between densified candidate points along an NFP edge.
    pub step_size: f64,
    /// Maximum number of cached pairwise NFPs (`None` = unbounded).
    pub cache_capacity: Option<usize>,
}

impl Default for NfpConfig {
    fn default() -> Self {
        Self {
            discretize_edges: true,
            step_size: 5.0,
            cache_capacity: None,
        }
    }
}

impl NfpConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables or disables edge densification.
    pub fn with_discretize_edges(mut self, enabled: bool) -> Self {
        self.discretize_edges = enabled;
        self
    }

    /// Sets the densification step.
    pub fn with_step_size(mut self, step: f64) -> Self {
        self.step_size = step;
        self
    }

    /// Bounds the number of cached NFPs.
    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = Some(capacity);
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.discretize_edges && !(self.step_size > 0.0 && self.step_size.is_finite()) {
            return Err(Error::InvalidConfig(format!(
                "NFP step size must be positive, got {}",
                self.step_size
            )));
        }
        if self.cache_capacity == Some(0) {
            return Err(Error::InvalidConfig(
                "NFP cache capacity must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Resolution component of the NFP cache key.
    ///
    /// Entries computed with and without densification are kept apart.
    pub fn resolution(&self) -> f64 {
        if self.discretize_edges {
            self.step_size
        } else {
            0.0
        }
    }
}

/// Placement optimizer settings.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PlacementConfig {
    /// Candidate scoring direction.
    pub fill_direction: FillDirection,
    /// Evaluate rotations concurrently.
    pub parallel: bool,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            fill_direction: FillDirection::default(),
            parallel: true,
        }
    }
}

impl PlacementConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the fill direction.
    pub fn with_fill_direction(mut self, direction: FillDirection) -> Self {
        self.fill_direction = direction;
        self
    }

    /// Enables or disables parallel rotation evaluation.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}

/// Gravity + anneal strategy settings.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GravityConfig {
    /// Fall direction (normalized internally).
    pub direction: (f64, f64),
    /// Pick an isotropic random fall direction per part instead of `direction`.
    pub random_direction: bool,
    /// Translation per gravity step.
    pub step_size: f64,
    /// Spawn attempts per part and sheet before giving up on that sheet.
    pub max_spawn_attempts: usize,
    /// Upper bound on gravity steps plus shakes per part.
    pub max_steps: usize,
    /// Number of increasing shake amplitudes tried before a part is settled.
    pub anneal_levels: usize,
    /// Allow shakes that rotate the part in place.
    pub anneal_rotate: bool,
    /// Allow shakes that shift the part sideways.
    pub anneal_translate: bool,
    /// Seed for reproducible runs (`None` = entropy).
    pub seed: Option<u64>,
}

impl Default for GravityConfig {
    fn default() -> Self {
        Self {
            direction: (0.0, -1.0),
            random_direction: false,
            step_size: 5.0,
            max_spawn_attempts: 100,
            max_steps: 500,
            anneal_levels: 4,
            anneal_rotate: true,
            anneal_translate: true,
            seed: None,
        }
    }
}

impl GravityConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the fall direction.
    pub fn with_direction(mut self, x: f64, y: f64) -> Self {
        self.direction = (x, y);
        self
    }

    /// Uses a random fall direction per part.
    pub fn with_random_direction(mut self, random: bool) -> Self {
        self.random_direction = random;
        self
    }

    /// Sets the step size.
    pub fn with_step_size(mut self, step: f64) -> Self {
        self.step_size = step;
        self
    }

    /// Sets the spawn attempt budget.
    pub fn with_max_spawn_attempts(mut self, attempts: usize) -> Self {
        self.max_spawn_attempts = attempts;
        self
    }

    /// Sets the step budget.
    pub fn with_max_steps(mut self, steps: usize) -> Self {
        self.max_steps = steps;
        self
    }

    /// Sets the number of shake amplitude levels.
    pub fn with_anneal_levels(mut self, levels: usize) -> Self {
        self.anneal_levels = levels;
        self
    }

    /// Enables or disables rotation shakes.
    pub fn with_anneal_rotate(mut self, enabled: bool) -> Self {
        self.anneal_rotate = enabled;
        self
    }

    /// Enables or disables sideways shakes.
    pub fn with_anneal_translate(mut self, enabled: bool) -> Self {
        self.anneal_translate = enabled;
        self
    }

    /// Fixes the random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        if !(self.step_size > 0.0 && self.step_size.is_finite()) {
            return Err(Error::InvalidConfig(format!(
                "gravity step size must be positive, got {}",
                self.step_size
            )));
        }
        let (dx, dy) = self.direction;
        if !self.random_direction
            && !(dx.is_finite() && dy.is_finite() && (dx * dx + dy * dy).sqrt() >= 1e-12)
        {
            return Err(Error::InvalidConfig(format!(
                "gravity direction must be finite and non-zero, got ({}, {})",
                dx, dy
            )));
        }
        if self.max_spawn_attempts == 0 {
            return Err(Error::InvalidConfig(
                "gravity needs at least one spawn attempt".into(),
            ));
        }
        Ok(())
    }
}

/// How the SAT strategy treats concave parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ConcavePolicy {
    /// Refuse the run before any placement.
    #[default]
    Reject,
    /// Collide with the convex hull instead. Never overlaps, may waste concavities.
    ConvexHull,
}

/// SAT strategy settings.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SatConfig {
    /// Handling of concave parts.
    pub concave_policy: ConcavePolicy,
}

impl SatConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the concave policy.
    pub fn with_concave_policy(mut self, policy: ConcavePolicy) -> Self {
        self.concave_policy = policy;
        self
    }
}

/// Configuration for one nesting run.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NestConfig {
    /// Sheet width.
    pub sheet_width: f64,
    /// Sheet height.
    pub sheet_height: f64,
    /// Gap between sheets when laid out side by side.
    pub sheet_spacing: f64,
    /// Packing strategy.
    pub strategy: Strategy,
    /// No-fit polygon engine.
    pub nfp: NfpConfig,
    /// Placement optimizer.
    pub placement: PlacementConfig,
    /// Gravity strategy.
    pub gravity: GravityConfig,
    /// Genetic strategy.
    pub genetic: GaConfig,
    /// SAT strategy.
    pub sat: SatConfig,
}

impl Default for NestConfig {
    fn default() -> Self {
        Self {
            sheet_width: 1000.0,
            sheet_height: 1000.0,
            sheet_spacing: 0.0,
            strategy: Strategy::default(),
            nfp: NfpConfig::default(),
            placement: PlacementConfig::default(),
            gravity: GravityConfig::default(),
            genetic: GaConfig::default(),
            sat: SatConfig::default(),
        }
    }
}

impl NestConfig {
    /// Creates a configuration for sheets of the given size.
    pub fn new(sheet_width: f64, sheet_height: f64) -> Self {
        Self {
            sheet_width,
            sheet_height,
            ..Self::default()
        }
    }

    /// Sets the strategy.
    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Sets the layout gap between sheets.
    pub fn with_sheet_spacing(mut self, spacing: f64) -> Self {
        self.sheet_spacing = spacing;
        self
    }

    /// Sets the NFP engine configuration.
    pub fn with_nfp(mut self, nfp: NfpConfig) -> Self {
        self.nfp = nfp;
        self
    }

    /// Sets the placement optimizer configuration.
    pub fn with_placement(mut self, placement: PlacementConfig) -> Self {
        self.placement = placement;
        self
    }

    /// Sets the gravity configuration.
    pub fn with_gravity(mut self, gravity: GravityConfig) -> Self {
        self.gravity = gravity;
        self
    }

    /// Sets the genetic configuration.
    pub fn with_genetic(mut self, genetic: GaConfig) -> Self {
        self.genetic = genetic;
        self
    }

    /// Sets the SAT configuration.
    pub fn with_sat(mut self, sat: SatConfig) -> Self {
        self.sat = sat;
        self
    }

    /// Validates sheet dimensions and every strategy record.
    pub fn validate(&self) -> Result<()> {
        let dims_ok = |v: f64| v > 0.0 && v.is_finite();
        if !dims_ok(self.sheet_width) || !dims_ok(self.sheet_height) {
            return Err(Error::InvalidSheet(format!(
                "sheet dimensions must be positive, got {} x {}",
                self.sheet_width, self.sheet_height
            )));
        }
        if !(self.sheet_spacing >= 0.0 && self.sheet_spacing.is_finite()) {
            return Err(Error::InvalidSheet(format!(
                "sheet spacing must be non-negative, got {}",
                self.sheet_spacing
            )));
        }
        self.nfp.validate()?;
        self.gravity.validate()?;
        self.genetic.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_bottom_left_score_prefers_lower_rows() {
        let dir = FillDirection::BottomLeft;
        // Any point on a lower row beats every point on a higher row.
        assert!(dir.score(99.0, 0.0, 100.0) < dir.score(0.0, 1.0, 100.0));
        assert_relative_eq!(dir.score(3.0, 2.0, 100.0), 203.0);
    }

    #[test]
    fn test_vector_score() {
        let down = FillDirection::down();
        assert_relative_eq!(down.score(10.0, 4.0, 100.0), 4.0);
        let left = FillDirection::left();
        assert!(left.score(1.0, 50.0, 100.0) < left.score(2.0, 0.0, 100.0));
    }

    #[test]
    fn test_config_builder() {
        let config = NestConfig::new(200.0, 100.0)
            .with_strategy(Strategy::Gravity)
            .with_sheet_spacing(10.0)
            .with_gravity(GravityConfig::new().with_step_size(2.0).with_seed(7));

        assert_eq!(config.strategy, Strategy::Gravity);
        assert_relative_eq!(config.sheet_width, 200.0);
        assert_relative_eq!(config.gravity.step_size, 2.0);
        assert_eq!(config.gravity.seed, Some(7));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_sheet_rejected() {
        let config = NestConfig::new(0.0, 100.0);
        assert!(matches!(config.validate(), Err(Error::InvalidSheet(_))));

        let config = NestConfig::new(100.0, 100.0).with_sheet_spacing(-1.0);
        assert!(matches!(config.validate(), Err(Error::InvalidSheet(_))));
    }

    #[test]
    fn test_invalid_strategy_records_rejected() {
        let config =
            NestConfig::new(100.0, 100.0).with_gravity(GravityConfig::new().with_step_size(0.0));
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));

        let config = NestConfig::new(100.0, 100.0).with_nfp(NfpConfig::new().with_step_size(-2.0));
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_gravity_direction_must_be_finite() {
        for (x, y) in [(f64::NAN, -1.0), (0.0, f64::INFINITY), (0.0, 0.0)] {
            let gravity = GravityConfig::new().with_direction(x, y);
            assert!(matches!(gravity.validate(), Err(Error::InvalidConfig(_))));
        }
        let random = GravityConfig::new()
            .with_direction(f64::NAN, 0.0)
            .with_random_direction(true);
        assert!(random.validate().is_ok());

        let defaults = GravityConfig::default();
        assert!(defaults.anneal_rotate && defaults.anneal_translate);
    }

    #[test]
    fn test_resolution_key() {
        assert_relative_eq!(NfpConfig::default().resolution(), 5.0);
        assert_relative_eq!(
            NfpConfig::default()
                .with_discretize_edges(false)
                .resolution(),
            0.0
        );
    }

    #[test]
    fn test_boolean_ops_requirement() {
        assert!(Strategy::Greedy.requires_boolean_ops());
        assert!(Strategy::Gravity.requires_boolean_ops());
        assert!(!Strategy::Genetic.requires_boolean_ops());
        assert!(!Strategy::Sat.requires_boolean_ops());
    }
}
