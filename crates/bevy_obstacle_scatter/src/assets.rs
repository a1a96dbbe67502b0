use core::result::Result;
use std::time::Duration;

use bevy::asset::io::Reader;
use bevy::asset::{AssetLoader, LoadContext};
use bevy::prelude::*;
use bevy::reflect::TypePath;
use bevy::tasks::ConditionalSendFuture;
use obstacle_scatter::prelude::{GenerationConfig, HealthRange};
use serde::{Deserialize, Serialize};

/// Asset describing a [`GenerationConfig`]. Missing fields take the config defaults.
#[derive(Asset, TypePath, Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ObstacleConfigAsset {
    pub target_count: usize,
    pub grid_radius: i32,
    pub spacing_unit: f64,
    pub safe_radius: f64,
    pub clustering_probability: f64,
    pub max_attempts_multiplier: usize,
    /// Per-slice time budget in milliseconds.
    pub slice_budget_ms: f64,
    pub max_items_per_slice: usize,
    pub health_range: Option<(i32, i32)>,
    pub seed: Option<u64>,
    pub snap_to_grid: bool,
    pub cluster_distance: (u32, u32),
}

impl Default for ObstacleConfigAsset {
    fn default() -> Self {
        let config = GenerationConfig::default();
        Self {
            target_count: config.target_count,
            grid_radius: config.grid_radius,
            spacing_unit: config.spacing_unit,
            safe_radius: config.safe_radius,
            clustering_probability: config.clustering_probability,
            max_attempts_multiplier: config.max_attempts_multiplier,
            slice_budget_ms: config.per_slice_time_budget.as_secs_f64() * 1000.0,
            max_items_per_slice: config.max_items_per_slice,
            health_range: config.health_range.map(|r| (r.min, r.max)),
            seed: config.seed,
            snap_to_grid: config.snap_to_grid,
            cluster_distance: config.cluster_distance,
        }
    }
}

impl From<&ObstacleConfigAsset> for GenerationConfig {
    fn from(asset: &ObstacleConfigAsset) -> Self {
        // Negative or non-finite budgets become zero and fail validation later.
        let budget = Duration::try_from_secs_f64(asset.slice_budget_ms / 1000.0)
            .unwrap_or(Duration::ZERO);
        let mut config = GenerationConfig::new(asset.target_count)
            .with_grid_radius(asset.grid_radius)
            .with_spacing_unit(asset.spacing_unit)
            .with_safe_radius(asset.safe_radius)
            .with_clustering_probability(asset.clustering_probability)
            .with_max_attempts_multiplier(asset.max_attempts_multiplier)
            .with_per_slice_time_budget(budget)
            .with_max_items_per_slice(asset.max_items_per_slice)
            .with_snap_to_grid(asset.snap_to_grid)
            .with_cluster_distance(asset.cluster_distance.0, asset.cluster_distance.1);
        if let Some((min, max)) = asset.health_range {
            config = config.with_health_range(HealthRange::new(min, max));
        }
        if let Some(seed) = asset.seed {
            config = config.with_seed(seed);
        }
        config
    }
}

impl From<ObstacleConfigAsset> for GenerationConfig {
    fn from(asset: ObstacleConfigAsset) -> Self {
        (&asset).into()
    }
}

/// Asset loader for [`ObstacleConfigAsset`] using RON files with `.obstacles` extension.
#[derive(TypePath)]
pub struct ObstacleConfigAssetLoader;

impl AssetLoader for ObstacleConfigAssetLoader {
    type Asset = ObstacleConfigAsset;
    type Settings = ();
    type Error = anyhow::Error;

    fn extensions(&self) -> &[&str] {
        &["obstacles"]
    }

    fn load(
        &self,
        reader: &mut dyn Reader,
        _settings: &Self::Settings,
        _context: &mut LoadContext,
    ) -> impl ConditionalSendFuture<Output = Result<Self::Asset, Self::Error>> {
        Box::pin(async move {
            let mut bytes = Vec::new();
            reader.read_to_end(&mut bytes).await?;
            let asset: ObstacleConfigAsset =
                ron::de::from_bytes(&bytes).map_err(|e| anyhow::anyhow!(e))?;
            Ok(asset)
        })
    }
}

impl FromWorld for ObstacleConfigAssetLoader {
    fn from_world(_: &mut World) -> Self {
        ObstacleConfigAssetLoader
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_ron_falls_back_to_defaults() {
        let asset: ObstacleConfigAsset = ron::de::from_str(
            "(target_count: 30, safe_radius: 2.5, health_range: Some((25, 60)), seed: Some(7))",
        )
        .expect("parsed");
        let config = GenerationConfig::from(&asset);

        assert_eq!(config.target_count, 30);
        assert_eq!(config.safe_radius, 2.5);
        assert_eq!(config.grid_radius, GenerationConfig::default().grid_radius);
        assert_eq!(config.health_range, Some(HealthRange::new(25, 60)));
        assert_eq!(config.seed, Some(7));
        assert!((config.per_slice_time_budget.as_secs_f64() - 0.016).abs() < 1e-6);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn negative_budget_is_rejected_by_validation() {
        let asset = ObstacleConfigAsset {
            slice_budget_ms: -4.0,
            ..Default::default()
        };
        assert!(GenerationConfig::from(asset).validate().is_err());
    }
}
