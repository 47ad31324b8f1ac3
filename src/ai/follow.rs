//! Path ownership and waypoint consumption for a single agent

use std::time::Instant;

use glam::Vec3;

use super::fsm::AgentEvent;
use super::grid::NavError;
use super::pathfinding::{Navigator, Path};
use super::steering::planar_distance;

/// Owns an agent's current path and its progress along it.
///
/// Paths are never repaired: once exhausted or stale they are replaced
/// wholesale by the next plan.
#[derive(Debug, Clone)]
pub struct PathFollower {
    path: Path,
    index: usize,
    needs_replan: bool,
}

impl Default for PathFollower {
    fn default() -> Self {
        Self::new()
    }
}

impl PathFollower {
    /// A follower with no path that will plan on first use
    #[must_use]
    pub fn new() -> Self {
        Self {
            path: Path::empty(),
            index: 0,
            needs_replan: true,
        }
    }

    /// Current path (possibly exhausted)
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Index of the waypoint being approached
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Check if a new path must be requested before moving
    #[must_use]
    pub fn needs_replan(&self) -> bool {
        self.needs_replan
    }

    /// Waypoints not yet reached
    #[must_use]
    pub fn remaining(&self) -> &[Vec3] {
        self.path.waypoints().get(self.index..).unwrap_or(&[])
    }

    /// Waypoint being approached
    #[must_use]
    pub fn current_waypoint(&self) -> Option<Vec3> {
        self.path.waypoints().get(self.index).copied()
    }

    /// Drop the current path; the next tick plans a new one
    pub fn invalidate(&mut self) {
        self.needs_replan = true;
    }

    /// Replace the path. An empty path leaves the follower waiting to replan.
    pub fn replace(&mut self, path: Path) {
        self.needs_replan = path.is_empty();
        self.path = path;
        self.index = 0;
    }

    /// Check if the target has drifted too far from where the path ends
    #[must_use]
    pub fn is_stale(&self, target: Vec3, replan_distance: Option<f32>) -> bool {
        match (replan_distance, self.path.last()) {
            (Some(limit), Some(end)) if !self.needs_replan => {
                planar_distance(end, target) > limit
            }
            _ => false,
        }
    }

    /// Ask the navigator for a path and adopt it.
    ///
    /// # Errors
    ///
    /// Only [`NavError::GridNotBuilt`] is returned; unreachable goals and
    /// out-of-range endpoints come back as [`AgentEvent::PathFailed`].
    pub fn request_path(
        &mut self,
        navigator: &Navigator,
        from: Vec3,
        to: Vec3,
        clearance: u32,
    ) -> Result<AgentEvent, NavError> {
        let started = Instant::now();
        let result = navigator.find_path(from, to, clearance);
        let elapsed = started.elapsed();

        match result {
            Ok(path) if !path.is_empty() => {
                log::debug!(
                    "Planned {} waypoints toward {} in {:.3}ms",
                    path.len(),
                    to,
                    elapsed.as_secs_f32() * 1000.0
                );
                let waypoints = path.len();
                self.replace(path);
                Ok(AgentEvent::PathPlanned { waypoints, elapsed })
            }
            Ok(_) => {
                log::warn!("No path from {from} to {to}, holding position");
                self.replace(Path::empty());
                Ok(AgentEvent::PathFailed {
                    error: None,
                    elapsed,
                })
            }
            Err(NavError::GridNotBuilt) => {
                log::error!("Path requested before the navigation grid was built");
                Err(NavError::GridNotBuilt)
            }
            Err(e) => {
                log::warn!("Failed to plan path: {e}");
                self.replace(Path::empty());
                Ok(AgentEvent::PathFailed {
                    error: Some(e),
                    elapsed,
                })
            }
        }
    }

    /// Pop every waypoint within `satisfaction_radius` and return the one to
    /// steer toward. Returns `None` and flags a replan once the path is used up.
    pub fn advance(&mut self, position: Vec3, satisfaction_radius: f32) -> Option<Vec3> {
        if self.needs_replan {
            return None;
        }

        while let Some(waypoint) = self.current_waypoint() {
            if planar_distance(position, waypoint) > satisfaction_radius {
                return Some(waypoint);
            }
            self.index += 1;
        }

        self.needs_replan = true;
        None
    }
}
