//! Tick-driven agent state machines
//!
//! Controllers are advanced by the host once per tick with everything they
//! need passed in explicitly: the agent's body, the shared [`Navigator`] and a
//! [`Sensor`] for the target. Each tick returns an [`AgentUpdate`] carrying the
//! new state, the motion to apply and any events for the host.
//!
//! ```ignore
//! let ctx = TickContext::new(&navigator, &sensor, dt);
//! let update = pursuer.tick(&body, &ctx)?;
//! body.position += update.motion;
//! body.yaw = update.yaw;
//! for event in update.events {
//!     host.handle(event);
//! }
//! ```

use std::fmt;
use std::time::Duration;

use glam::Vec3;
use smallvec::SmallVec;

use super::grid::NavError;
use super::pathfinding::Navigator;

// ============================================================================
// Collaborators
// ============================================================================

/// What an agent can learn about its target.
///
/// Implemented by the host on top of its scene; tests use stubs.
pub trait Sensor {
    /// Live target position, or `None` once the target is gone
    fn target_position(&self) -> Option<Vec3>;

    /// True if nothing but the target lies between `from` and `to`
    fn has_line_of_sight(&self, from: Vec3, to: Vec3) -> bool;
}

/// Kinematic state of an agent, owned by the host
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AgentBody {
    /// World position
    pub position: Vec3,
    /// Heading around +Y, zero facing +Z
    pub yaw: f32,
}

impl AgentBody {
    /// Create a body at a position facing +Z
    #[must_use]
    pub fn at(position: Vec3) -> Self {
        Self { position, yaw: 0.0 }
    }
}

/// Everything a controller may read during one tick
#[derive(Clone, Copy)]
pub struct TickContext<'a> {
    /// Shared path planner
    pub navigator: &'a Navigator,
    /// Target queries
    pub sensor: &'a dyn Sensor,
    /// Seconds since the previous tick
    pub dt: f32,
}

impl<'a> TickContext<'a> {
    /// Create a tick context
    #[must_use]
    pub fn new(navigator: &'a Navigator, sensor: &'a dyn Sensor, dt: f32) -> Self {
        Self {
            navigator,
            sensor,
            dt,
        }
    }
}

impl fmt::Debug for TickContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TickContext")
            .field("navigator_ready", &self.navigator.is_ready())
            .field("dt", &self.dt)
            .finish()
    }
}

// ============================================================================
// Tick output
// ============================================================================

/// Side effects a controller asks the host to carry out or record
#[derive(Debug, Clone, PartialEq)]
pub enum AgentEvent {
    /// The controller switched state
    StateChanged {
        /// Previous state name
        from: &'static str,
        /// New state name
        to: &'static str,
    },
    /// A new path replaced the old one
    PathPlanned {
        /// Number of waypoints
        waypoints: usize,
        /// Time spent searching
        elapsed: Duration,
    },
    /// Planning produced no usable path; the agent holds position
    PathFailed {
        /// `None` when the goal was simply unreachable
        error: Option<NavError>,
        /// Time spent searching
        elapsed: Duration,
    },
    /// The pursuer has a clear shot and wants to fire
    FireRequested {
        /// Where the target is
        target: Vec3,
    },
    /// The projectile reached its target and is retired
    Exploded {
        /// Detonation point
        position: Vec3,
    },
}

/// A controller state with a stable name for logs and events
pub trait AgentState: Copy + PartialEq + fmt::Debug {
    /// State name for debugging and logging
    fn name(self) -> &'static str;
}

/// Result of one controller tick
#[derive(Debug, Clone, PartialEq)]
pub struct AgentUpdate<S> {
    /// State after the tick
    pub state: S,
    /// Position change to apply this tick
    pub motion: Vec3,
    /// Heading after the tick
    pub yaw: f32,
    /// Events raised during the tick
    pub events: SmallVec<[AgentEvent; 2]>,
}

impl<S: AgentState> AgentUpdate<S> {
    /// An update that keeps the body where it is
    #[must_use]
    pub fn hold(state: S, body: &AgentBody) -> Self {
        Self {
            state,
            motion: Vec3::ZERO,
            yaw: body.yaw,
            events: SmallVec::new(),
        }
    }

    /// Check if any event matches a predicate
    #[must_use]
    pub fn has_event(&self, predicate: impl Fn(&AgentEvent) -> bool) -> bool {
        self.events.iter().any(predicate)
    }
}

/// An agent controller advanced once per tick
pub trait Controller {
    /// The controller's state type
    type State: AgentState;

    /// Current state
    fn state(&self) -> Self::State;

    /// Advance one tick.
    ///
    /// # Errors
    ///
    /// Returns [`NavError::GridNotBuilt`] if the controller needs a path and
    /// no grid has been installed. Every other planning failure is reported
    /// through [`AgentEvent::PathFailed`].
    fn tick(
        &mut self,
        body: &AgentBody,
        ctx: &TickContext<'_>,
    ) -> Result<AgentUpdate<Self::State>, NavError>;

    /// True once the agent should be removed from the world
    fn is_retired(&self) -> bool {
        false
    }
}

/// Record a transition and log it; no-op if the state is unchanged
pub(crate) fn transition<S: AgentState>(
    current: &mut S,
    next: S,
    events: &mut SmallVec<[AgentEvent; 2]>,
) {
    if *current == next {
        return;
    }
    log::debug!("{} -> {}", current.name(), next.name());
    events.push(AgentEvent::StateChanged {
        from: current.name(),
        to: next.name(),
    });
    *current = next;
}

// ============================================================================
// Tests
// ============================================================================
