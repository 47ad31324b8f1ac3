//! World decomposition into an occupancy grid
//!
//! One downward probe per cell, run once when the arena loads.

use std::ops::{BitAnd, BitOr, Not};
use std::sync::Arc;
use std::time::Instant;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::grid::{CellState, GridCoord, NavError, OccupancyGrid};
use crate::core::GridConfig;

/// Bit mask of collision layers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerMask(pub u32);

impl LayerMask {
    /// No layers
    pub const NONE: Self = Self(0);
    /// Every layer
    pub const ALL: Self = Self(u32::MAX);
    /// Floor geometry the agents drive on
    pub const GROUND: Self = Self(1 << 0);
    /// Walls, crates and other static blockers
    pub const OBSTACLE: Self = Self(1 << 1);
    /// Tanks and the player
    pub const AGENT: Self = Self(1 << 2);
    /// Shells and missiles in flight
    pub const PROJECTILE: Self = Self(1 << 3);
    /// Everything except the floor and moving bodies
    pub const OBSTACLES: Self = Self(!(Self::GROUND.0 | Self::AGENT.0 | Self::PROJECTILE.0));

    /// Check if any layer is shared with `other`
    #[must_use]
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    /// Mask without the layers in `other`
    #[must_use]
    pub const fn without(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }
}

impl BitOr for LayerMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitAnd for LayerMask {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl Not for LayerMask {
    type Output = Self;

    fn not(self) -> Self {
        Self(!self.0)
    }
}

/// Nearest hit reported by a scene query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneHit {
    /// The point of intersection
    pub point: Vec3,
    /// Distance from ray origin
    pub distance: f32,
}

/// Collision queries against scene geometry
pub trait SceneQuery {
    /// Cast a ray and return the nearest hit on any layer in `mask`
    fn cast_ray(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        mask: LayerMask,
    ) -> Option<SceneHit>;
}

/// Samples a scene into an [`OccupancyGrid`] and hands out the shared result
#[derive(Debug, Clone)]
pub struct WorldDecomposer {
    grid: Arc<OccupancyGrid>,
}

impl WorldDecomposer {
    /// Probe every cell of the configured extent.
    ///
    /// A cell is blocked when a ray cast straight down from `probe_height`
    /// above its center hits an obstacle layer within `probe_distance`.
    ///
    /// # Errors
    ///
    /// Returns [`NavError::InvalidGrid`] if the extent holds no cells or the
    /// cell size is not positive.
    pub fn decompose(config: &GridConfig, scene: &impl SceneQuery) -> Result<Self, NavError> {
        let started = Instant::now();

        if !(config.cell_size.is_finite() && config.cell_size > 0.0) {
            return Err(NavError::InvalidGrid(format!(
                "cell size must be positive, got {}",
                config.cell_size
            )));
        }
        let (cols, rows) = (config.cols(), config.rows());
        if cols == 0 || rows == 0 {
            return Err(NavError::InvalidGrid(format!(
                "extent {}x{} holds no cells",
                config.width, config.length
            )));
        }

        let half = config.cell_size * 0.5;
        let mut blocked = 0usize;

        let grid = OccupancyGrid::from_fn(cols, rows, config.cell_size, config.origin, |coord| {
            let origin = probe_origin(config, coord, half);
            let hit = scene.cast_ray(
                origin,
                Vec3::NEG_Y,
                config.probe_distance,
                config.obstacle_mask,
            );
            if hit.is_some() {
                blocked += 1;
                CellState::Blocked
            } else {
                CellState::Free
            }
        })?
        .with_ground_height(config.ground_height);

        log::info!(
            "Decomposed {}x{} grid ({} blocked) in {:.2}ms",
            cols,
            rows,
            blocked,
            started.elapsed().as_secs_f32() * 1000.0
        );
        log::trace!("Occupancy grid:\n{}", grid.to_ascii());

        Ok(Self {
            grid: Arc::new(grid),
        })
    }

    /// Shared handle to the grid
    #[must_use]
    pub fn grid(&self) -> Arc<OccupancyGrid> {
        Arc::clone(&self.grid)
    }

    /// Cell edge length in world units
    #[must_use]
    pub fn cell_size(&self) -> f32 {
        self.grid.cell_size()
    }

    /// Number of rows (world Z)
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.grid.rows()
    }

    /// Number of columns (world X)
    #[must_use]
    pub fn col_count(&self) -> usize {
        self.grid.cols()
    }
}

fn probe_origin(config: &GridConfig, coord: GridCoord, half: f32) -> Vec3 {
    Vec3::new(
        config.origin.x + half + config.cell_size * coord.col as f32,
        config.ground_height + config.probe_height,
        config.origin.y + half + config.cell_size * coord.row as f32,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;
    use std::cell::Cell;

    /// Axis-aligned boxes standing on a floor at y = 0
    struct BoxScene {
        boxes: Vec<(Vec2, Vec2, f32, LayerMask)>,
        casts: Cell<usize>,
    }

    impl BoxScene {
        fn new() -> Self {
            Self {
                boxes: Vec::new(),
                casts: Cell::new(0),
            }
        }

        fn with_box(mut self, min: Vec2, max: Vec2, height: f32, layer: LayerMask) -> Self {
            self.boxes.push((min, max, height, layer));
            self
        }
    }

    impl SceneQuery for BoxScene {
        fn cast_ray(
            &self,
            origin: Vec3,
            _direction: Vec3,
            max_distance: f32,
            mask: LayerMask,
        ) -> Option<SceneHit> {
            self.casts.set(self.casts.get() + 1);
            self.boxes
                .iter()
                .filter(|(min, max, _, layer)| {
                    layer.intersects(mask)
                        && origin.x >= min.x
                        && origin.x <= max.x
                        && origin.z >= min.y
                        && origin.z <= max.y
                })
                .map(|(_, _, height, _)| origin.y - height)
                .filter(|&distance| distance >= 0.0 && distance <= max_distance)
                .fold(None, |best: Option<f32>, d| Some(best.map_or(d, |b| b.min(d))))
                .map(|distance| SceneHit {
                    point: origin - Vec3::Y * distance,
                    distance,
                })
        }
    }

    fn config() -> GridConfig {
        GridConfig::default()
            .with_extent(4.0, 3.0)
            .with_cell_size(1.0)
            .with_origin(Vec2::new(-2.0, -1.5))
    }

    #[test]
    fn test_decompose_dimensions_and_probe_count() {
        let scene = BoxScene::new();
        let decomposer = WorldDecomposer::decompose(&config(), &scene).unwrap();

        assert_eq!(decomposer.col_count(), 4);
        assert_eq!(decomposer.row_count(), 3);
        assert_eq!(decomposer.cell_size(), 1.0);
        assert_eq!(scene.casts.get(), 12);
        assert_eq!(decomposer.grid().free_count(), 12);
    }

    #[test]
    fn test_obstacle_blocks_cells_under_it() {
        // Covers world x in [-1, 0.6], z in [-0.5, 0.5]: centers of cells (1,1) and (2,1)
        let scene = BoxScene::new().with_box(
            Vec2::new(-1.0, -0.5),
            Vec2::new(0.6, 0.5),
            1.0,
            LayerMask::OBSTACLE,
        );
        let grid = WorldDecomposer::decompose(&config(), &scene).unwrap().grid();

        assert_eq!(grid.to_ascii(), "....\n.##.\n....\n");
    }

    #[test]
    fn test_masked_layers_are_ignored() {
        let scene = BoxScene::new()
            .with_box(Vec2::splat(-5.0), Vec2::splat(5.0), 0.0, LayerMask::GROUND)
            .with_box(Vec2::new(-2.0, -1.5), Vec2::new(-1.0, 1.5), 1.0, LayerMask::AGENT);
        let grid = WorldDecomposer::decompose(&config(), &scene).unwrap().grid();

        assert_eq!(grid.free_count(), 12);
    }

    #[test]
    fn test_probe_distance_limits_detection() {
        // Obstacle too short to be reached by a 2-unit probe starting at y = 3
        let scene = BoxScene::new().with_box(
            Vec2::splat(-5.0),
            Vec2::splat(5.0),
            0.5,
            LayerMask::OBSTACLE,
        );
        let mut short = config();
        short.probe_distance = 2.0;
        let grid = WorldDecomposer::decompose(&short, &scene).unwrap().grid();
        assert_eq!(grid.free_count(), 12);

        let grid = WorldDecomposer::decompose(&config(), &scene).unwrap().grid();
        assert_eq!(grid.free_count(), 0);
    }

    #[test]
    fn test_rejects_empty_extent() {
        let scene = BoxScene::new();
        let result = WorldDecomposer::decompose(&config().with_extent(0.5, 3.0), &scene);
        assert!(matches!(result, Err(NavError::InvalidGrid(_))));
    }

    #[test]
    fn test_shared_grid_handle() {
        let scene = BoxScene::new();
        let decomposer = WorldDecomposer::decompose(&config(), &scene).unwrap();
        let a = decomposer.grid();
        let b = decomposer.grid();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_layer_mask_ops() {
        assert!(LayerMask::OBSTACLES.intersects(LayerMask::OBSTACLE));
        assert!(!LayerMask::OBSTACLES.intersects(LayerMask::GROUND));
        assert!(!LayerMask::OBSTACLES.intersects(LayerMask::AGENT));
        assert_eq!(
            (LayerMask::GROUND | LayerMask::AGENT).without(LayerMask::AGENT),
            LayerMask::GROUND
        );
        assert_eq!(!LayerMask::NONE, LayerMask::ALL);
        assert_eq!(LayerMask::ALL & LayerMask::OBSTACLE, LayerMask::OBSTACLE);
    }
}
