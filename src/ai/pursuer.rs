//! Ground pursuer: a tank that closes in on its target and stops to fire
//!
//! Idle while the target is out of detection range, Move while it is in
//! range but not shootable, Fire once it is within fire range with a clear
//! line of sight.

use glam::Vec3;

use super::follow::PathFollower;
use super::fsm::{
    AgentBody, AgentEvent, AgentState, AgentUpdate, Controller, TickContext, transition,
};
use super::grid::NavError;
use super::steering::{Arrive, SteeringBehavior, planar_distance, turn_towards};
use crate::core::PursuerConfig;

/// Pursuer states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PursuerState {
    /// Waiting for a target in range
    #[default]
    Idle,
    /// Driving along a path toward the target
    Move,
    /// Holding position with a clear shot
    Fire,
}

impl AgentState for PursuerState {
    fn name(self) -> &'static str {
        match self {
            PursuerState::Idle => "Idle",
            PursuerState::Move => "Move",
            PursuerState::Fire => "Fire",
        }
    }
}

/// Controller for a ground pursuer
#[derive(Debug, Clone)]
pub struct Pursuer {
    config: PursuerConfig,
    state: PursuerState,
    follower: PathFollower,
}

impl Pursuer {
    /// Create an idle pursuer
    #[must_use]
    pub fn new(config: PursuerConfig) -> Self {
        Self {
            config,
            state: PursuerState::Idle,
            follower: PathFollower::new(),
        }
    }

    /// Tuning in use
    #[must_use]
    pub fn config(&self) -> &PursuerConfig {
        &self.config
    }

    /// Path progress
    #[must_use]
    pub fn follower(&self) -> &PathFollower {
        &self.follower
    }

    fn choose_state(&self, body: &AgentBody, target: Vec3, ctx: &TickContext<'_>) -> PursuerState {
        let distance = planar_distance(body.position, target);
        if distance > self.config.detection_range {
            PursuerState::Idle
        } else if distance <= self.config.fire_range
            && ctx.sensor.has_line_of_sight(body.position, target)
        {
            PursuerState::Fire
        } else {
            PursuerState::Move
        }
    }

    fn drive(
        &mut self,
        body: &AgentBody,
        target: Vec3,
        ctx: &TickContext<'_>,
        update: &mut AgentUpdate<PursuerState>,
    ) -> Result<(), NavError> {
        if self.follower.is_stale(target, self.config.replan_distance) {
            log::debug!("Target moved away from path end, replanning");
            self.follower.invalidate();
        }

        if self.follower.needs_replan() {
            let event = self.follower.request_path(
                ctx.navigator,
                body.position,
                target,
                self.config.clearance_radius,
            )?;
            update.events.push(event);
        }

        let Some(waypoint) = self
            .follower
            .advance(body.position, self.config.satisfaction_radius)
        else {
            return Ok(());
        };

        let steering = Arrive::new(
            waypoint,
            self.config.move_speed,
            self.config.satisfaction_radius,
        )
        .calculate(body.position);

        update.motion = steering.delta(ctx.dt);
        if let Some(heading) = steering.heading {
            update.yaw = turn_towards(body.yaw, heading, self.config.turn_rate * ctx.dt);
        }
        Ok(())
    }
}

impl Controller for Pursuer {
    type State = PursuerState;

    fn state(&self) -> PursuerState {
        self.state
    }

    fn tick(
        &mut self,
        body: &AgentBody,
        ctx: &TickContext<'_>,
    ) -> Result<AgentUpdate<PursuerState>, NavError> {
        let mut update = AgentUpdate::hold(self.state, body);

        let Some(target) = ctx.sensor.target_position() else {
            transition(&mut self.state, PursuerState::Idle, &mut update.events);
            update.state = self.state;
            return Ok(update);
        };

        let next = self.choose_state(body, target, ctx);
        transition(&mut self.state, next, &mut update.events);

        match self.state {
            PursuerState::Idle => {}
            PursuerState::Move => self.drive(body, target, ctx, &mut update)?,
            PursuerState::Fire => update.events.push(AgentEvent::FireRequested { target }),
        }

        update.state = self.state;
        Ok(update)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::fsm::Sensor;
    use crate::ai::grid::OccupancyGrid;
    use crate::ai::pathfinding::Navigator;
    use glam::Vec2;
    use std::cell::Cell;
    use std::sync::Arc;

    struct StubSensor {
        target: Option<Vec3>,
        clear_shot: bool,
        sight_checks: Cell<usize>,
    }

    impl StubSensor {
        fn new(target: Option<Vec3>, clear_shot: bool) -> Self {
            Self {
                target,
                clear_shot,
                sight_checks: Cell::new(0),
            }
        }
    }

    impl Sensor for StubSensor {
        fn target_position(&self) -> Option<Vec3> {
            self.target
        }

        fn has_line_of_sight(&self, _from: Vec3, _to: Vec3) -> bool {
            self.sight_checks.set(self.sight_checks.get() + 1);
            self.clear_shot
        }
    }

    fn arena() -> Navigator {
        let grid = OccupancyGrid::from_ascii(
            "
            ..............
            ..............
            ..............
            ..............
            ......##......
            ......##......
            ......##......
            ..............
            ..............
            ..............
            ",
            1.0,
            Vec2::ZERO,
        )
        .unwrap();
        Navigator::new(Arc::new(grid))
    }

    fn config() -> PursuerConfig {
        PursuerConfig {
            detection_range: 20.0,
            fire_range: 3.0,
            clearance_radius: 1,
            replan_distance: Some(3.0),
            ..Default::default()
        }
    }

    /// Run the controller, applying its motion, until `done` or `max` ticks
    fn run(
        pursuer: &mut Pursuer,
        body: &mut AgentBody,
        nav: &Navigator,
        sensor: &StubSensor,
        max: usize,
        done: impl Fn(&AgentUpdate<PursuerState>) -> bool,
    ) -> Vec<AgentUpdate<PursuerState>> {
        let ctx = TickContext::new(nav, sensor, 1.0 / 30.0);
        let mut updates = Vec::new();
        for _ in 0..max {
            let update = pursuer.tick(body, &ctx).unwrap();
            body.position += update.motion;
            body.yaw = update.yaw;
            let finished = done(&update);
            updates.push(update);
            if finished {
                break;
            }
        }
        updates
    }

    #[test]
    fn test_starts_idle() {
        let pursuer = Pursuer::new(config());
        assert_eq!(pursuer.state(), PursuerState::Idle);
        assert!(!pursuer.is_retired());
    }

    #[test]
    fn test_idle_without_target() {
        let nav = arena();
        let sensor = StubSensor::new(None, true);
        let mut pursuer = Pursuer::new(config());

        let update = pursuer
            .tick(&AgentBody::at(Vec3::new(1.5, 0.0, 1.5)), &TickContext::new(&nav, &sensor, 0.1))
            .unwrap();

        assert_eq!(update.state, PursuerState::Idle);
        assert_eq!(update.motion, Vec3::ZERO);
        assert!(update.events.is_empty());
    }

    #[test]
    fn test_idle_when_out_of_detection_range() {
        let nav = arena();
        let sensor = StubSensor::new(Some(Vec3::new(12.5, 0.0, 8.5)), true);
        let mut pursuer = Pursuer::new(PursuerConfig {
            detection_range: 5.0,
            ..config()
        });

        let update = pursuer
            .tick(&AgentBody::at(Vec3::new(1.5, 0.0, 1.5)), &TickContext::new(&nav, &sensor, 0.1))
            .unwrap();

        assert_eq!(update.state, PursuerState::Idle);
        assert_eq!(sensor.sight_checks.get(), 0);
    }

    #[test]
    fn test_fire_with_clear_shot_in_range() {
        let nav = arena();
        let target = Vec3::new(4.5, 0.0, 1.5);
        let sensor = StubSensor::new(Some(target), true);
        let mut pursuer = Pursuer::new(config());

        let update = pursuer
            .tick(&AgentBody::at(Vec3::new(2.5, 0.0, 1.5)), &TickContext::new(&nav, &sensor, 0.1))
            .unwrap();

        assert_eq!(update.state, PursuerState::Fire);
        assert_eq!(update.motion, Vec3::ZERO);
        assert!(update.has_event(
            |e| matches!(e, AgentEvent::FireRequested { target: t } if *t == target)
        ));
        assert!(update.has_event(
            |e| matches!(e, AgentEvent::StateChanged { from: "Idle", to: "Fire" })
        ));
    }

    #[test]
    fn test_moves_when_shot_is_blocked() {
        let nav = arena();
        let sensor = StubSensor::new(Some(Vec3::new(4.5, 0.0, 1.5)), false);
        let mut pursuer = Pursuer::new(config());

        let update = pursuer
            .tick(&AgentBody::at(Vec3::new(2.5, 0.0, 1.5)), &TickContext::new(&nav, &sensor, 0.1))
            .unwrap();

        assert_eq!(update.state, PursuerState::Move);
        assert!(update.has_event(|e| matches!(e, AgentEvent::PathPlanned { .. })));
        assert!(update.motion.x > 0.0);
    }

    #[test]
    fn test_drives_around_obstacle_into_fire_range() {
        let nav = arena();
        let target = Vec3::new(12.5, 0.0, 5.5);
        let sensor = StubSensor::new(Some(target), true);
        let mut pursuer = Pursuer::new(config());
        let mut body = AgentBody::at(Vec3::new(1.5, 0.0, 5.5));

        let updates = run(&mut pursuer, &mut body, &nav, &sensor, 2000, |u| {
            u.state == PursuerState::Fire
        });

        assert_eq!(pursuer.state(), PursuerState::Fire);
        assert!(planar_distance(body.position, target) <= 3.0);
        assert!(updates.iter().all(|u| u.motion.y == 0.0));

        // Never drove through the block
        let grid = nav.grid().unwrap();
        let mut position = Vec3::new(1.5, 0.0, 5.5);
        for update in &updates {
            position += update.motion;
            assert!(grid.is_free(grid.world_to_grid(position)), "clipped block at {position}");
        }
    }

    #[test]
    fn test_unreachable_target_holds_and_retries() {
        let grid = OccupancyGrid::from_ascii(
            "
            .......
            .......
            #######
            .......
            .......
            ",
            1.0,
            Vec2::ZERO,
        )
        .unwrap();
        let nav = Navigator::new(Arc::new(grid));
        let sensor = StubSensor::new(Some(Vec3::new(3.5, 0.0, 4.5)), false);
        let mut pursuer = Pursuer::new(config());
        let body = AgentBody::at(Vec3::new(3.5, 0.0, 0.5));
        let ctx = TickContext::new(&nav, &sensor, 0.1);

        for _ in 0..3 {
            let update = pursuer.tick(&body, &ctx).unwrap();
            assert_eq!(update.state, PursuerState::Move);
            assert_eq!(update.motion, Vec3::ZERO);
            assert!(update.has_event(|e| matches!(e, AgentEvent::PathFailed { error: None, .. })));
        }
    }

    #[test]
    fn test_replans_when_target_moves() {
        let nav = arena();
        let mut pursuer = Pursuer::new(config());
        let body = AgentBody::at(Vec3::new(1.5, 0.0, 1.5));

        let first = StubSensor::new(Some(Vec3::new(12.5, 0.0, 1.5)), false);
        let update = pursuer.tick(&body, &TickContext::new(&nav, &first, 0.1)).unwrap();
        assert!(update.has_event(|e| matches!(e, AgentEvent::PathPlanned { .. })));

        // Small drift keeps the current path
        let nudged = StubSensor::new(Some(Vec3::new(12.5, 0.0, 2.5)), false);
        let update = pursuer.tick(&body, &TickContext::new(&nav, &nudged, 0.1)).unwrap();
        assert!(!update.has_event(|e| matches!(e, AgentEvent::PathPlanned { .. })));

        // Large drift forces a fresh plan ending near the new position
        let moved = StubSensor::new(Some(Vec3::new(12.5, 0.0, 8.5)), false);
        let update = pursuer.tick(&body, &TickContext::new(&nav, &moved, 0.1)).unwrap();
        assert!(update.has_event(|e| matches!(e, AgentEvent::PathPlanned { .. })));
        let end = pursuer.follower().path().last().unwrap();
        assert!(planar_distance(end, Vec3::new(12.5, 0.0, 8.5)) < 1.0);
    }

    #[test]
    fn test_missing_grid_is_an_error() {
        let nav = Navigator::unbuilt();
        let sensor = StubSensor::new(Some(Vec3::new(8.0, 0.0, 0.0)), false);
        let mut pursuer = Pursuer::new(config());

        let ctx = TickContext::new(&nav, &sensor, 0.1);
        let result = pursuer.tick(&AgentBody::at(Vec3::ZERO), &ctx);
        assert_eq!(result, Err(NavError::GridNotBuilt));
    }

    #[test]
    fn test_turns_toward_waypoint_gradually() {
        let nav = arena();
        let sensor = StubSensor::new(Some(Vec3::new(1.5, 0.0, 8.5)), false);
        let mut pursuer = Pursuer::new(config());
        let body = AgentBody {
            position: Vec3::new(1.5, 0.0, 1.5),
            yaw: std::f32::consts::FRAC_PI_2,
        };

        let update = pursuer.tick(&body, &TickContext::new(&nav, &sensor, 0.1)).unwrap();

        // Heading toward +Z is yaw 0; one tick turns part of the way
        assert!(update.yaw < std::f32::consts::FRAC_PI_2);
        assert!(update.yaw > 0.0);
        assert!(update.motion.z > 0.0);
    }
}
