//! Grid navigation for top-down vehicle combat
//!
//! This crate provides:
//! - Occupancy grid decomposition of a rapier3d scene
//! - A* pathfinding with a per-agent clearance radius
//! - Tick-driven controllers for a ground pursuer and a homing projectile
//! - A headless simulation host on the hecs ECS

pub mod ai;
pub mod core;
pub mod ecs;
pub mod physics;

// Re-exports for convenience
pub use glam;
pub use hecs;
pub use rapier3d;

/// Prelude module for common imports
pub mod prelude {
    pub use crate::ai::{
        AgentBody, AgentEvent, Controller, HomingMissile, HomingState, LayerMask, NavError,
        Navigator, OccupancyGrid, Path, Pursuer, PursuerState, Sensor, TickContext,
        WorldDecomposer, find_path,
    };
    pub use crate::core::{
        Arena, ConfigError, GameEvent, GridConfig, HomingConfig, PlannerStats, PursuerConfig,
        SimConfig, Simulation,
    };
    pub use crate::ecs::{Name, Target, Transform, World};
    pub use crate::physics::{ColliderHandle, Physics, PhysicsSensor};
    pub use glam::{Vec2, Vec3};
}
