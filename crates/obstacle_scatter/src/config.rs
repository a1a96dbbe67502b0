//! Session configuration.
//!
//! [`GenerationConfig`] is the read-only snapshot a session is started with. Only the
//! configuration survives a regeneration; everything else is rebuilt.
use std::time::Duration;

use rand::RngCore;

use crate::error::{Error, Result};
use crate::random::rand01;

/// Largest accepted grid radius. Keeps the `(2R+1)²` cell arena at a few million cells.
pub const MAX_GRID_RADIUS: i32 = 1024;

/// Inclusive health range handed through to the entity factory. The engine never
/// interprets it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HealthRange {
    pub min: i32,
    pub max: i32,
}

impl HealthRange {
    pub fn new(min: i32, max: i32) -> Self {
        Self { min, max }
    }

    /// Uniform value in `min..=max`. An inverted range yields `min`.
    pub fn sample(&self, rng: &mut dyn RngCore) -> i32 {
        if self.max <= self.min {
            return self.min;
        }
        let span = (i64::from(self.max) - i64::from(self.min) + 1) as u64;
        let offset = ((rand01(rng) * span as f64) as u64).min(span - 1);
        (i64::from(self.min) + offset as i64) as i32
    }
}

/// Configuration for one generation session.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct GenerationConfig {
    /// Number of obstacles the session tries to place.
    pub target_count: usize,
    /// Grid radius `R` in cells; the lattice spans `(2R+1)²` cells.
    pub grid_radius: i32,
    /// Minimum distance between placements in world units; also scales the
    /// inclusion radius `R * spacing_unit`.
    pub spacing_unit: f64,
    /// Cells closer than this to the reference point are excluded.
    pub safe_radius: f64,
    /// Probability in [0, 1] of replacing a candidate with a clustered one.
    pub clustering_probability: f64,
    /// Attempt cap is `target_count * max_attempts_multiplier`.
    pub max_attempts_multiplier: usize,
    /// Wall-clock budget for a single slice of work.
    pub per_slice_time_budget: Duration,
    /// Maximum number of commits (or teardown destroys) per slice.
    pub max_items_per_slice: usize,
    /// Optional health range passed through to the factory.
    pub health_range: Option<HealthRange>,
    /// Fixed RNG seed; `None` draws a fresh seed per session.
    pub seed: Option<u64>,
    /// Snap clustered candidates to the nearest grid cell center.
    pub snap_to_grid: bool,
    /// Inclusive `(min, max)` distance in cells for clustered candidates.
    pub cluster_distance: (u32, u32),
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            target_count: 15,
            grid_radius: 20,
            spacing_unit: 1.0,
            safe_radius: 5.0,
            clustering_probability: 0.3,
            max_attempts_multiplier: 20,
            per_slice_time_budget: Duration::from_millis(16),
            max_items_per_slice: 5,
            health_range: None,
            seed: None,
            snap_to_grid: true,
            cluster_distance: (1, 3),
        }
    }
}

impl GenerationConfig {
    /// Creates a new [`GenerationConfig`] with the given target count and defaults otherwise.
    pub fn new(target_count: usize) -> Self {
        Self {
            target_count,
            ..Default::default()
        }
    }

    pub fn with_target_count(mut self, target_count: usize) -> Self {
        self.target_count = target_count;
        self
    }

    pub fn with_grid_radius(mut self, grid_radius: i32) -> Self {
        self.grid_radius = grid_radius;
        self
    }

    pub fn with_spacing_unit(mut self, spacing_unit: f64) -> Self {
        self.spacing_unit = spacing_unit;
        self
    }

    pub fn with_safe_radius(mut self, safe_radius: f64) -> Self {
        self.safe_radius = safe_radius;
        self
    }

    pub fn with_clustering_probability(mut self, probability: f64) -> Self {
        self.clustering_probability = probability;
        self
    }

    pub fn with_max_attempts_multiplier(mut self, multiplier: usize) -> Self {
        self.max_attempts_multiplier = multiplier;
        self
    }

    pub fn with_per_slice_time_budget(mut self, budget: Duration) -> Self {
        self.per_slice_time_budget = budget;
        self
    }

    pub fn with_max_items_per_slice(mut self, max_items: usize) -> Self {
        self.max_items_per_slice = max_items;
        self
    }

    pub fn with_health_range(mut self, health_range: HealthRange) -> Self {
        self.health_range = Some(health_range);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_snap_to_grid(mut self, snap: bool) -> Self {
        self.snap_to_grid = snap;
        self
    }

    pub fn with_cluster_distance(mut self, min: u32, max: u32) -> Self {
        self.cluster_distance = (min, max);
        self
    }

    /// Upper bound on candidate attempts for one session.
    pub fn max_attempts(&self) -> usize {
        self.target_count
            .saturating_mul(self.max_attempts_multiplier)
    }

    /// Radius of the inclusion disk around the grid center in world units.
    pub fn max_generation_radius(&self) -> f64 {
        self.grid_radius as f64 * self.spacing_unit
    }

    /// Validates the configuration, returning an error if invalid.
    pub fn validate(&self) -> Result<()> {
        if self.target_count < 1 {
            return Err(Error::InvalidConfig("target_count must be >= 1".into()));
        }
        if !(1..=MAX_GRID_RADIUS).contains(&self.grid_radius) {
            return Err(Error::InvalidConfig(format!(
                "grid_radius must be in 1..={MAX_GRID_RADIUS}"
            )));
        }
        if !self.spacing_unit.is_finite() || self.spacing_unit <= 0.0 {
            return Err(Error::InvalidConfig("spacing_unit must be > 0".into()));
        }
        if !self.safe_radius.is_finite() || self.safe_radius < 0.0 {
            return Err(Error::InvalidConfig("safe_radius must be >= 0".into()));
        }
        if !(0.0..=1.0).contains(&self.clustering_probability) {
            return Err(Error::InvalidConfig(
                "clustering_probability must be in [0, 1]".into(),
            ));
        }
        if self.max_attempts_multiplier < 1 {
            return Err(Error::InvalidConfig(
                "max_attempts_multiplier must be >= 1".into(),
            ));
        }
        if self.per_slice_time_budget.is_zero() {
            return Err(Error::InvalidConfig(
                "per_slice_time_budget must be > 0".into(),
            ));
        }
        if self.max_items_per_slice < 1 {
            return Err(Error::InvalidConfig(
                "max_items_per_slice must be >= 1".into(),
            ));
        }
        if let Some(range) = self.health_range {
            if range.min > range.max {
                return Err(Error::InvalidConfig(
                    "health_range min must be <= max".into(),
                ));
            }
        }
        let (min, max) = self.cluster_distance;
        if min < 1 || min > max {
            return Err(Error::InvalidConfig(
                "cluster_distance must satisfy 1 <= min <= max".into(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = GenerationConfig::default();
        config.validate().expect("default config validates");
        assert_eq!(config.max_attempts(), 300);
        assert_eq!(config.max_generation_radius(), 20.0);
    }

    #[test]
    fn builder_sets_fields() {
        let config = GenerationConfig::new(3)
            .with_grid_radius(4)
            .with_spacing_unit(2.0)
            .with_safe_radius(1.5)
            .with_clustering_probability(0.0)
            .with_max_attempts_multiplier(2)
            .with_per_slice_time_budget(Duration::from_millis(2))
            .with_max_items_per_slice(1)
            .with_health_range(HealthRange::new(25, 60))
            .with_seed(7)
            .with_snap_to_grid(false)
            .with_cluster_distance(2, 2);

        assert_eq!(config.target_count, 3);
        assert_eq!(config.grid_radius, 4);
        assert_eq!(config.max_attempts(), 6);
        assert_eq!(config.max_generation_radius(), 8.0);
        assert_eq!(config.health_range, Some(HealthRange::new(25, 60)));
        assert_eq!(config.seed, Some(7));
        assert!(!config.snap_to_grid);
        assert_eq!(config.cluster_distance, (2, 2));
        config.validate().expect("valid");
    }

    #[test]
    fn validate_rejects_out_of_range_values() {
        let cases = [
            GenerationConfig::new(0),
            GenerationConfig::default().with_grid_radius(0),
            GenerationConfig::default().with_grid_radius(MAX_GRID_RADIUS + 1),
            GenerationConfig::default().with_grid_radius(i32::MAX),
            GenerationConfig::default().with_spacing_unit(0.0),
            GenerationConfig::default().with_spacing_unit(f64::NAN),
            GenerationConfig::default().with_safe_radius(-1.0),
            GenerationConfig::default().with_clustering_probability(1.5),
            GenerationConfig::default().with_max_attempts_multiplier(0),
            GenerationConfig::default().with_per_slice_time_budget(Duration::ZERO),
            GenerationConfig::default().with_max_items_per_slice(0),
            GenerationConfig::default().with_health_range(HealthRange::new(60, 25)),
            GenerationConfig::default().with_cluster_distance(0, 3),
            GenerationConfig::default().with_cluster_distance(3, 1),
        ];

        for config in cases {
            assert!(
                matches!(config.validate(), Err(Error::InvalidConfig(_))),
                "expected invalid config: {config:?}"
            );
        }
    }

    #[test]
    fn largest_grid_radius_is_accepted() {
        let config = GenerationConfig::default().with_grid_radius(MAX_GRID_RADIUS);
        config.validate().expect("radius at the cap validates");
    }

    #[test]
    fn health_samples_cover_the_inclusive_range() {
        use rand::rngs::StdRng;
        use rand::SeedableRng;

        let mut rng = StdRng::seed_from_u64(4);
        let range = HealthRange::new(25, 28);
        let mut seen = [false; 4];
        for _ in 0..500 {
            let health = range.sample(&mut rng);
            assert!((25..=28).contains(&health));
            seen[(health - 25) as usize] = true;
        }
        assert_eq!(seen, [true; 4]);
        assert_eq!(HealthRange::new(7, 7).sample(&mut rng), 7);

        let wide = HealthRange::new(i32::MIN, i32::MAX);
        for _ in 0..100 {
            let _ = wide.sample(&mut rng);
        }
    }

    #[test]
    fn max_attempts_saturates() {
        let config = GenerationConfig::new(usize::MAX).with_max_attempts_multiplier(2);
        assert_eq!(config.max_attempts(), usize::MAX);
    }
}
