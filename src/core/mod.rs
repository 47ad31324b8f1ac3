//! Simulation host module
//!
//! Configuration, arena layouts, the event queue, planner statistics and the
//! tick loop that drives every agent

mod arena;
mod config;
mod debug;
mod events;
mod sim;

pub use arena::{Arena, Obstacle};
pub use config::{ConfigError, GridConfig, HomingConfig, PursuerConfig, SimConfig};
pub use debug::PlannerStats;
pub use events::{EventQueue, GameEvent};
pub use sim::Simulation;
