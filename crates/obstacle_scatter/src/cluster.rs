//! Clustering bias for candidate positions.
//!
//! [`ClusterSampler`] occasionally swaps a uniformly drawn candidate for a point a
//! few cells away from an existing placement, which produces organic clumps instead
//! of an even scatter. It is pure: callers must re-validate what it returns.
use std::f64::consts::TAU;

use glam::DVec2;
use rand::RngCore;

use crate::config::GenerationConfig;
use crate::grid::GridFrame;
use crate::placed::PlacementRecord;
use crate::random::{rand01, rand_index, rand_range_inclusive};

/// Directions shorter than this are treated as coincident points.
const MIN_DIRECTION_LENGTH: f64 = 1e-3;

/// Proposes clustered alternatives to candidate positions.
#[derive(Debug, Clone)]
pub struct ClusterSampler {
    /// Probability in [0, 1] of proposing a clustered candidate.
    pub probability: f64,
    /// Inclusive distance range in cells from the chosen placement.
    pub distance: (u32, u32),
    /// Snap the result to the nearest cell center.
    pub snap_to_grid: bool,
    frame: GridFrame,
}

impl ClusterSampler {
    pub fn new(probability: f64, frame: GridFrame) -> Self {
        Self {
            probability,
            distance: (1, 3),
            snap_to_grid: true,
            frame,
        }
    }

    /// Sampler configured from a session config for the given grid frame.
    pub fn from_config(config: &GenerationConfig, frame: GridFrame) -> Self {
        Self::new(config.clustering_probability, frame)
            .with_distance(config.cluster_distance.0, config.cluster_distance.1)
            .with_snap_to_grid(config.snap_to_grid)
    }

    pub fn with_distance(mut self, min: u32, max: u32) -> Self {
        self.distance = (min, max);
        self
    }

    pub fn with_snap_to_grid(mut self, snap: bool) -> Self {
        self.snap_to_grid = snap;
        self
    }

    /// Returns either `base_position` or a point near a random existing placement.
    pub fn next_candidate(
        &self,
        base_position: DVec2,
        placed: &[PlacementRecord],
        rng: &mut dyn RngCore,
    ) -> DVec2 {
        if placed.is_empty() || self.probability <= 0.0 {
            return base_position;
        }
        if rand01(rng) >= self.probability {
            return base_position;
        }

        let anchor = placed[rand_index(rng, placed.len())].position;
        let offset = base_position - anchor;
        let direction = if offset.length() < MIN_DIRECTION_LENGTH {
            DVec2::from_angle(rand01(rng) * TAU)
        } else {
            offset.normalize()
        };

        let distance = rand_range_inclusive(rng, self.distance.0, self.distance.1) as f64;
        let candidate = anchor + direction * distance;

        if self.snap_to_grid {
            self.frame
                .grid_to_world(self.frame.world_to_grid(candidate))
        } else {
            candidate
        }
    }
}
