//! AI and navigation module
//!
//! Grid decomposition, clearance-aware A*, steering, and the tick-driven
//! controllers for the ground pursuer and the homing projectile.

mod decompose;
mod follow;
mod fsm;
mod grid;
mod homing;
mod pathfinding;
mod pursuer;
mod steering;

pub use decompose::{LayerMask, SceneHit, SceneQuery, WorldDecomposer};
pub use follow::PathFollower;
pub use fsm::{AgentBody, AgentEvent, AgentState, AgentUpdate, Controller, Sensor, TickContext};
pub use grid::{CellState, GridCoord, NavError, OccupancyGrid};
pub use homing::{HomingMissile, HomingState};
pub use pathfinding::{Navigator, Path, find_path};
pub use pursuer::{Pursuer, PursuerState};
pub use steering::{
    Arrive, Seek, SteeringBehavior, SteeringOutput, planar_distance, turn_towards, yaw_of,
};
