//! Simulation configuration
//!
//! Every section has defaults matching the shipped arena, builder-style
//! setters, and RON/JSON persistence.

use std::fs;
use std::path::Path;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::ai::LayerMask;

/// Grid sampling configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// World extent along X
    pub width: f32,
    /// World extent along Z
    pub length: f32,
    /// Cell edge length in world units
    pub cell_size: f32,
    /// World X/Z of the grid's minimum corner
    pub origin: Vec2,
    /// Height waypoints are placed at
    pub ground_height: f32,
    /// Height above the ground that probe rays start from
    pub probe_height: f32,
    /// Maximum travel of a probe ray
    pub probe_distance: f32,
    /// Layers that count as obstacles
    pub obstacle_mask: LayerMask,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            width: 80.0,
            length: 80.0,
            cell_size: 0.4,
            origin: Vec2::new(-40.0, -40.0),
            ground_height: 0.0,
            probe_height: 3.0,
            probe_distance: 3.0,
            obstacle_mask: LayerMask::OBSTACLES,
        }
    }
}

impl GridConfig {
    /// Set the world extent
    #[must_use]
    pub fn with_extent(mut self, width: f32, length: f32) -> Self {
        self.width = width;
        self.length = length;
        self
    }

    /// Set the cell size
    #[must_use]
    pub fn with_cell_size(mut self, cell_size: f32) -> Self {
        self.cell_size = cell_size;
        self
    }

    /// Set the world origin of the grid's minimum corner
    #[must_use]
    pub fn with_origin(mut self, origin: Vec2) -> Self {
        self.origin = origin;
        self
    }

    /// Set the obstacle layer mask
    #[must_use]
    pub fn with_obstacle_mask(mut self, mask: LayerMask) -> Self {
        self.obstacle_mask = mask;
        self
    }

    /// Column count derived from the extent
    #[must_use]
    pub fn cols(&self) -> usize {
        (self.width / self.cell_size).floor().max(0.0) as usize
    }

    /// Row count derived from the extent
    #[must_use]
    pub fn rows(&self) -> usize {
        (self.length / self.cell_size).floor().max(0.0) as usize
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(self.cell_size.is_finite() && self.cell_size > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "grid.cell_size must be positive, got {}",
                self.cell_size
            )));
        }
        if self.cols() == 0 || self.rows() == 0 {
            return Err(ConfigError::Invalid(format!(
                "grid extent {}x{} holds no {} cells",
                self.width, self.length, self.cell_size
            )));
        }
        if self.probe_height <= 0.0 || self.probe_distance <= 0.0 {
            return Err(ConfigError::Invalid(
                "grid probe height and distance must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// Ground pursuer tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PursuerConfig {
    /// Maximum travel speed (units/s)
    pub move_speed: f32,
    /// Body turn rate (fraction of remaining angle per second)
    pub turn_rate: f32,
    /// Beyond this distance the pursuer ignores the target
    pub detection_range: f32,
    /// Within this distance (and with line of sight) it stops to fire
    pub fire_range: f32,
    /// Distance at which a waypoint counts as reached
    pub satisfaction_radius: f32,
    /// Footprint margin in cells
    pub clearance_radius: u32,
    /// Replan once the target is this far from the path's end
    pub replan_distance: Option<f32>,
}

impl Default for PursuerConfig {
    fn default() -> Self {
        Self {
            move_speed: 4.0,
            turn_rate: 5.0,
            detection_range: 70.0,
            fire_range: 10.0,
            satisfaction_radius: 0.5,
            clearance_radius: 2,
            replan_distance: Some(4.0),
        }
    }
}

/// Homing projectile tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HomingConfig {
    /// Constant travel speed (units/s)
    pub move_speed: f32,
    /// Body turn rate (fraction of remaining angle per second)
    pub turn_rate: f32,
    /// Distance at which an idle projectile locks on
    pub detection_range: f32,
    /// Waypoint and detonation radius
    pub satisfaction_radius: f32,
    /// Footprint margin in cells
    pub clearance_radius: u32,
    /// Replan once the target is this far from the path's end
    pub replan_distance: Option<f32>,
}

impl Default for HomingConfig {
    fn default() -> Self {
        Self {
            move_speed: 5.0,
            turn_rate: 2.0,
            detection_range: 50.0,
            satisfaction_radius: 0.5,
            clearance_radius: 1,
            replan_distance: Some(2.0),
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Grid sampling
    pub grid: GridConfig,
    /// Ground pursuer tuning
    pub pursuer: PursuerConfig,
    /// Homing projectile tuning
    pub homing: HomingConfig,
    /// Fixed ticks per second for the headless runner
    pub tick_rate: u32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            grid: GridConfig::default(),
            pursuer: PursuerConfig::default(),
            homing: HomingConfig::default(),
            tick_rate: 60,
        }
    }
}

impl SimConfig {
    /// Set the grid section
    #[must_use]
    pub fn with_grid(mut self, grid: GridConfig) -> Self {
        self.grid = grid;
        self
    }

    /// Set the pursuer section
    #[must_use]
    pub fn with_pursuer(mut self, pursuer: PursuerConfig) -> Self {
        self.pursuer = pursuer;
        self
    }

    /// Set the homing projectile section
    #[must_use]
    pub fn with_homing(mut self, homing: HomingConfig) -> Self {
        self.homing = homing;
        self
    }

    /// Set the tick rate
    #[must_use]
    pub fn with_tick_rate(mut self, tick_rate: u32) -> Self {
        self.tick_rate = tick_rate;
        self
    }

    /// Seconds per tick
    #[must_use]
    pub fn tick_seconds(&self) -> f32 {
        1.0 / self.tick_rate.max(1) as f32
    }

    /// Check every section for values the simulation cannot run with
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first bad value
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.grid.validate()?;

        let speeds = [
            ("pursuer.move_speed", self.pursuer.move_speed),
            ("pursuer.satisfaction_radius", self.pursuer.satisfaction_radius),
            ("homing.move_speed", self.homing.move_speed),
            ("homing.satisfaction_radius", self.homing.satisfaction_radius),
        ];
        for (name, value) in speeds {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be positive, got {value}"
                )));
            }
        }

        if self.tick_rate == 0 {
            return Err(ConfigError::Invalid("tick_rate must be non-zero".into()));
        }
        Ok(())
    }

    /// Parse a RON document
    ///
    /// # Errors
    ///
    /// Returns an error if parsing or validation fails
    pub fn from_ron_str(content: &str) -> Result<Self, ConfigError> {
        let config: SimConfig =
            ron::from_str(content).map_err(|e| ConfigError::DeserializeError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a RON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated
    pub fn load_ron(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
        Self::from_ron_str(&content)
    }

    /// Save to a RON file
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

    /// Load from a JSON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
        let config: SimConfig = serde_json::from_str(&content)
            .map_err(|e| ConfigError::DeserializeError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save to a JSON file
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
}

/// Errors that can occur while loading or validating configuration
#[derive(Debug, Clone)]
pub enum ConfigError {
    /// IO error
    IoError(String),
    /// Serialization error
    SerializeError(String),
    /// Deserialization error
    DeserializeError(String),
    /// A value is out of range
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::IoError(e) => write!(f, "IO error: {e}"),
            Self::SerializeError(e) => write!(f, "Serialization error: {e}"),
            Self::DeserializeError(e) => write!(f, "Deserialization error: {e}"),
            Self::Invalid(e) => write!(f, "Invalid configuration: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = SimConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.grid.cols(), 200);
        assert_eq!(config.grid.rows(), 200);
        assert_eq!(config.pursuer.clearance_radius, 2);
        assert_eq!(config.homing.clearance_radius, 1);
    }

    #[test]
    fn test_ron_round_trip() {
        let config = SimConfig::default()
            .with_grid(GridConfig::default().with_extent(20.0, 10.0).with_cell_size(0.5))
            .with_tick_rate(30);

        let ron_str =
            ron::ser::to_string_pretty(&config, ron::ser::PrettyConfig::default()).unwrap();
        let loaded = SimConfig::from_ron_str(&ron_str).unwrap();

        assert_eq!(loaded, config);
        assert_eq!(loaded.grid.cols(), 40);
        assert_eq!(loaded.grid.rows(), 20);
    }

    #[test]
    fn test_partial_ron_uses_defaults() {
        let loaded =
            SimConfig::from_ron_str("(tick_rate: 20, pursuer: (fire_range: 12.0))").unwrap();

        assert_eq!(loaded.tick_rate, 20);
        assert_eq!(loaded.pursuer.fire_range, 12.0);
        assert_eq!(loaded.pursuer.move_speed, 4.0);
        assert_eq!(loaded.grid, GridConfig::default());
    }

    #[test]
    fn test_json_round_trip() {
        let config = SimConfig::default();
        let json_str = serde_json::to_string(&config).unwrap();
        let loaded: SimConfig = serde_json::from_str(&json_str).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_rejects_empty_grid() {
        let config =
            SimConfig::default().with_grid(GridConfig::default().with_extent(0.3, 10.0));
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_rejects_bad_values() {
        let config = SimConfig::default().with_grid(GridConfig::default().with_cell_size(-1.0));
        assert!(config.validate().is_err());

        let mut config = SimConfig::default();
        config.homing.move_speed = 0.0;
        assert!(config.validate().is_err());

        assert!(SimConfig::from_ron_str("(tick_rate: 0)").is_err());
        assert!(matches!(
            SimConfig::from_ron_str("(tick_rate: \"fast\")"),
            Err(ConfigError::DeserializeError(_))
        ));
    }
}
