//! Simulation event queue
//!
//! Controllers report what happened during a tick as [`AgentEvent`]s; the
//! simulation tags them with the entity that raised them and queues them
//! here for the host (effects, scoring, logging). A tick's events become
//! readable when the tick returns and stay until the next one finishes.
//!
//! ```ignore
//! sim.tick(dt, &sensor)?;
//! for event in sim.events().iter() {
//!     if let GameEvent::Exploded { position, .. } = event {
//!         spawn_explosion(*position);
//!     }
//! }
//! ```

use std::collections::VecDeque;
use std::time::Duration;

use glam::Vec3;
use hecs::Entity;

use crate::ai::{AgentEvent, NavError};

// ============================================================================
// Event Types
// ============================================================================

/// Something an agent did during a tick
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum GameEvent {
    /// An agent's controller changed state
    StateChanged {
        /// The agent
        entity: Entity,
        /// Previous state name
        from: &'static str,
        /// New state name
        to: &'static str,
    },

    /// An agent adopted a new path
    PathPlanned {
        /// The agent
        entity: Entity,
        /// Number of waypoints
        waypoints: usize,
        /// Time spent searching
        elapsed: Duration,
    },

    /// Planning failed; the agent holds position
    PathFailed {
        /// The agent
        entity: Entity,
        /// `None` when the goal was simply unreachable
        error: Option<NavError>,
    },

    /// A pursuer has a clear shot
    FireRequested {
        /// The shooter
        entity: Entity,
        /// Where the target is
        target: Vec3,
    },

    /// A projectile reached its target and was removed
    Exploded {
        /// The projectile
        entity: Entity,
        /// Detonation point
        position: Vec3,
    },
}

impl GameEvent {
    /// Tag a controller event with the entity that raised it
    #[must_use]
    pub fn from_agent(entity: Entity, event: AgentEvent) -> Self {
        match event {
            AgentEvent::StateChanged { from, to } => Self::StateChanged { entity, from, to },
            AgentEvent::PathPlanned { waypoints, elapsed } => Self::PathPlanned {
                entity,
                waypoints,
                elapsed,
            },
            AgentEvent::PathFailed { error, .. } => Self::PathFailed { entity, error },
            AgentEvent::FireRequested { target } => Self::FireRequested { entity, target },
            AgentEvent::Exploded { position } => Self::Exploded { entity, position },
        }
    }

    /// The entity the event is about
    #[must_use]
    pub fn entity(&self) -> Entity {
        match self {
            Self::StateChanged { entity, .. }
            | Self::PathPlanned { entity, .. }
            | Self::PathFailed { entity, .. }
            | Self::FireRequested { entity, .. }
            | Self::Exploded { entity, .. } => *entity,
        }
    }
}

// ============================================================================
// Event Queue
// ============================================================================

/// Double-buffered event queue for tick-consistent event processing.
///
/// Events pushed during a tick become readable after the swap that closes
/// it, so readers never see a half-finished tick.
///
/// # Example
///
/// ```ignore
/// let mut queue = EventQueue::new();
///
/// // During the tick
/// queue.push(GameEvent::Exploded { entity, position });
///
/// // Once the tick is done
/// queue.swap();
/// for event in queue.iter() {
///     handle_event(event);
/// }
/// ```
#[derive(Debug)]
pub struct EventQueue {
    /// Events being written during the current tick
    pending: VecDeque<GameEvent>,
    /// Events from the last finished tick
    processing: VecDeque<GameEvent>,
}

impl EventQueue {
    /// Default initial capacity for event queues.
    const DEFAULT_CAPACITY: usize = 64;

    /// Create a new event queue with default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    /// Create a new event queue with specified initial capacity.
    ///
    /// Size it for the agent count to avoid reallocations.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            pending: VecDeque::with_capacity(capacity),
            processing: VecDeque::with_capacity(capacity),
        }
    }

    /// Push an event for the current tick.
    #[inline]
    pub fn push(&mut self, event: GameEvent) {
        self.pending.push_back(event);
    }

    /// Swap the pending and processing queues.
    ///
    /// Called once at the end of every simulation tick.
    pub fn swap(&mut self) {
        std::mem::swap(&mut self.pending, &mut self.processing);
        self.pending.clear();
    }

    /// Iterate over events from the last finished tick.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &GameEvent> {
        self.processing.iter()
    }

    /// Drain all events from the last finished tick.
    #[inline]
    pub fn drain(&mut self) -> impl Iterator<Item = GameEvent> + '_ {
        self.processing.drain(..)
    }

    /// Check if there are any pending events to process.
    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.processing.is_empty()
    }

    /// Get the number of events ready for processing.
    #[must_use]
    #[inline]
    pub fn len(&self) -> usize {
        self.processing.len()
    }

    /// Get the number of events pushed during the current tick.
    #[must_use]
    #[inline]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Clear all events (both pending and processing).
    pub fn clear(&mut self) {
        self.pending.clear();
        self.processing.clear();
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn entities() -> (Entity, Entity) {
        let mut world = hecs::World::new();
        (world.spawn(()), world.spawn(()))
    }

    #[test]
    fn test_event_queue_push_and_swap() {
        let (tank, _) = entities();
        let mut queue = EventQueue::new();

        queue.push(GameEvent::FireRequested {
            entity: tank,
            target: Vec3::X,
        });
        assert!(queue.is_empty(), "Events should not be visible before swap");
        assert_eq!(queue.pending_count(), 1);

        queue.swap();
        assert_eq!(queue.len(), 1);

        let events: Vec<_> = queue.iter().collect();
        assert!(matches!(events[0], GameEvent::FireRequested { target, .. } if *target == Vec3::X));
    }

    #[test]
    fn test_event_queue_double_buffer_isolation() {
        let (tank, missile) = entities();
        let mut queue = EventQueue::new();

        // Tick 1
        queue.push(GameEvent::StateChanged {
            entity: tank,
            from: "Idle",
            to: "Move",
        });
        queue.swap();

        // Tick 2: the new event stays hidden while tick 1 is read
        queue.push(GameEvent::Exploded {
            entity: missile,
            position: Vec3::ZERO,
        });
        let events: Vec<_> = queue.iter().collect();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].entity(), tank);

        // Tick 3
        queue.swap();
        let events: Vec<_> = queue.iter().collect();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].entity(), missile);
    }

    #[test]
    fn test_event_queue_drain() {
        let (tank, _) = entities();
        let mut queue = EventQueue::new();

        queue.push(GameEvent::PathFailed {
            entity: tank,
            error: None,
        });
        queue.push(GameEvent::PathFailed {
            entity: tank,
            error: Some(NavError::GridNotBuilt),
        });
        queue.swap();

        let events: Vec<_> = queue.drain().collect();
        assert_eq!(events.len(), 2);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_event_queue_clear() {
        let (tank, _) = entities();
        let mut queue = EventQueue::new();

        queue.push(GameEvent::FireRequested {
            entity: tank,
            target: Vec3::ONE,
        });
        queue.swap();
        queue.push(GameEvent::FireRequested {
            entity: tank,
            target: Vec3::ONE,
        });

        queue.clear();

        assert!(queue.is_empty());
        assert_eq!(queue.pending_count(), 0);
    }

    #[test]
    fn test_from_agent_keeps_payload() {
        let (tank, _) = entities();

        let event = GameEvent::from_agent(
            tank,
            AgentEvent::PathPlanned {
                waypoints: 7,
                elapsed: Duration::from_micros(40),
            },
        );
        assert_eq!(
            event,
            GameEvent::PathPlanned {
                entity: tank,
                waypoints: 7,
                elapsed: Duration::from_micros(40),
            }
        );

        let event = GameEvent::from_agent(
            tank,
            AgentEvent::PathFailed {
                error: None,
                elapsed: Duration::ZERO,
            },
        );
        assert!(matches!(event, GameEvent::PathFailed { error: None, .. }));
        assert_eq!(event.entity(), tank);
    }
}
