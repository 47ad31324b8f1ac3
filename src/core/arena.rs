//! Arena layout serialization
//!
//! An arena is a floor, a set of static box obstacles and the spawn points
//! for the target and the agents. Layouts round-trip through RON or JSON and
//! are turned into a collision scene with [`Arena::populate`].

use std::fs;
use std::path::Path;

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use super::config::{ConfigError, GridConfig};
use crate::ai::LayerMask;
use crate::physics::{ColliderHandle, Physics};

/// A static box standing in the arena
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    /// Optional label for logs
    #[serde(default)]
    pub name: Option<String>,
    /// Box center
    pub center: Vec3,
    /// Half size along each axis
    pub half_extents: Vec3,
    /// Collision layer
    #[serde(default = "default_obstacle_layer")]
    pub layer: LayerMask,
}

fn default_obstacle_layer() -> LayerMask {
    LayerMask::OBSTACLE
}

impl Obstacle {
    /// A box resting on the floor with its footprint centred at `(x, z)`
    #[must_use]
    pub fn block(x: f32, z: f32, size: Vec3) -> Self {
        let half_extents = size * 0.5;
        Self {
            name: None,
            center: Vec3::new(x, half_extents.y, z),
            half_extents,
            layer: LayerMask::OBSTACLE,
        }
    }

    /// Set the label
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// A serializable arena layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Arena {
    /// Arena name
    pub name: String,
    /// Layout version for compatibility
    pub version: u32,
    /// Side length of the square floor, centred on the world origin
    pub size: f32,
    /// Static obstacles
    #[serde(default)]
    pub obstacles: Vec<Obstacle>,
    /// Where the target starts
    pub target_spawn: Vec3,
    /// Where ground pursuers start
    #[serde(default)]
    pub pursuer_spawns: Vec<Vec3>,
    /// Where homing projectiles are launched from
    #[serde(default)]
    pub launcher_spawns: Vec<Vec3>,
}

impl Arena {
    /// Create an empty arena of the given floor size
    #[must_use]
    pub fn new(name: impl Into<String>, size: f32) -> Self {
        Self {
            name: name.into(),
            version: 1,
            size,
            obstacles: Vec::new(),
            target_spawn: Vec3::ZERO,
            pursuer_spawns: Vec::new(),
            launcher_spawns: Vec::new(),
        }
    }

    /// The stock layout: a walled courtyard with a crate maze in the middle
    #[must_use]
    pub fn courtyard() -> Self {
        let mut arena = Self::new("Courtyard", 40.0);
        let wall = 1.0;
        let height = 2.0;
        let span = arena.size;
        let edge = span * 0.5 - wall * 0.5;

        arena.obstacles.extend([
            Obstacle::block(0.0, -edge, Vec3::new(span, height, wall)).named("north wall"),
            Obstacle::block(0.0, edge, Vec3::new(span, height, wall)).named("south wall"),
            Obstacle::block(-edge, 0.0, Vec3::new(wall, height, span)).named("west wall"),
            Obstacle::block(edge, 0.0, Vec3::new(wall, height, span)).named("east wall"),
            Obstacle::block(0.0, 0.0, Vec3::new(12.0, height, 2.0)).named("long crate"),
            Obstacle::block(-6.0, 6.0, Vec3::new(2.0, height, 8.0)),
            Obstacle::block(6.0, -6.0, Vec3::new(2.0, height, 8.0)),
            Obstacle::block(8.0, 8.0, Vec3::new(3.0, height, 3.0)),
            Obstacle::block(-8.0, -8.0, Vec3::new(3.0, height, 3.0)),
        ]);

        arena.target_spawn = Vec3::new(0.0, 0.0, 12.0);
        arena.pursuer_spawns = vec![Vec3::new(-14.0, 0.0, -14.0), Vec3::new(14.0, 0.0, -14.0)];
        arena.launcher_spawns = vec![Vec3::new(0.0, 0.0, -15.0)];
        arena
    }

    /// `base` resized to cover exactly the arena floor
    #[must_use]
    pub fn grid_config(&self, base: &GridConfig) -> GridConfig {
        let half = self.size * 0.5;
        base.clone()
            .with_extent(self.size, self.size)
            .with_origin(Vec2::new(-half, -half))
    }

    /// Add the floor and every obstacle to a collision scene and refresh it
    pub fn populate(&self, physics: &mut Physics) -> Vec<ColliderHandle> {
        physics.add_ground_plane(Vec3::ZERO, self.size * 0.5);

        let handles = self
            .obstacles
            .iter()
            .map(|obstacle| {
                let body = physics.create_static_body(obstacle.center);
                physics.add_box_collider(body, obstacle.half_extents, obstacle.layer)
            })
            .collect();

        physics.refresh();
        log::info!(
            "Loaded arena '{}' with {} obstacles",
            self.name,
            self.obstacles.len()
        );
        handles
    }

    /// Check the layout for degenerate values
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for a non-positive floor size or a
    /// flat obstacle
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.size.is_finite() && self.size > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "arena size must be positive, got {}",
                self.size
            )));
        }
        if let Some((index, obstacle)) = self
            .obstacles
            .iter()
            .enumerate()
            .find(|(_, o)| o.half_extents.min_element() <= 0.0)
        {
            return Err(ConfigError::Invalid(format!(
                "obstacle {index} has non-positive extents {}",
                obstacle.half_extents
            )));
        }
        Ok(())
    }

    /// Save the arena to a RON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or serialization fails
    pub fn save_ron(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let ron_string = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;
        fs::write(path, ron_string).map_err(|e| ConfigError::IoError(e.to_string()))?;
        Ok(())
    }

    /// Load an arena from a RON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated
    pub fn load_ron(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
        let arena: Arena =
            ron::from_str(&content).map_err(|e| ConfigError::DeserializeError(e.to_string()))?;
        arena.validate()?;
        Ok(arena)
    }

    /// Save the arena to a JSON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or serialization fails
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json_string = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;
        fs::write(path, json_string).map_err(|e| ConfigError::IoError(e.to_string()))?;
        Ok(())
    }

    /// Load an arena from a JSON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
        let arena: Arena = serde_json::from_str(&content)
            .map_err(|e| ConfigError::DeserializeError(e.to_string()))?;
        arena.validate()?;
        Ok(arena)
    }
}

impl Default for Arena {
    fn default() -> Self {
        Self::courtyard()
    }
}
