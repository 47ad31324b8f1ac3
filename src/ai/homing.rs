//! Homing projectile: locks on, follows a path to the live target and
//! detonates on contact

use glam::Vec3;

use super::follow::PathFollower;
use super::fsm::{
    AgentBody, AgentEvent, AgentState, AgentUpdate, Controller, TickContext, transition,
};
use super::grid::NavError;
use super::steering::{Seek, SteeringBehavior, planar_distance, turn_towards};
use crate::core::HomingConfig;

/// Projectile states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HomingState {
    /// Launched, waiting for a target within detection range
    #[default]
    Idle,
    /// Tracking the target
    Homing,
    /// Detonated; terminal
    Explode,
}

impl AgentState for HomingState {
    fn name(self) -> &'static str {
        match self {
            HomingState::Idle => "Idle",
            HomingState::Homing => "Homing",
            HomingState::Explode => "Explode",
        }
    }
}

/// Controller for a homing projectile
#[derive(Debug, Clone)]
pub struct HomingMissile {
    config: HomingConfig,
    state: HomingState,
    follower: PathFollower,
}

impl HomingMissile {
    /// Create an idle projectile
    #[must_use]
    pub fn new(config: HomingConfig) -> Self {
        Self {
            config,
            state: HomingState::Idle,
            follower: PathFollower::new(),
        }
    }

    /// Tuning in use
    #[must_use]
    pub fn config(&self) -> &HomingConfig {
        &self.config
    }

    /// Path progress
    #[must_use]
    pub fn follower(&self) -> &PathFollower {
        &self.follower
    }

    fn detonate(&mut self, position: Vec3, update: &mut AgentUpdate<HomingState>) {
        log::debug!("Projectile detonated at {position}");
        transition(&mut self.state, HomingState::Explode, &mut update.events);
        update.events.push(AgentEvent::Exploded { position });
    }

    fn home(
        &mut self,
        body: &AgentBody,
        target: Vec3,
        ctx: &TickContext<'_>,
        update: &mut AgentUpdate<HomingState>,
    ) -> Result<(), NavError> {
        if self.follower.is_stale(target, self.config.replan_distance) {
            log::debug!("Target slipped away from path end, replanning");
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

        // Once the last waypoint is consumed the target shares our cell: go straight in
        let aim = match self
            .follower
            .advance(body.position, self.config.satisfaction_radius)
        {
            Some(waypoint) => waypoint,
            None if !self.follower.path().is_empty() => target,
            None => return Ok(()),
        };

        let steering = Seek::new(aim, self.config.move_speed).calculate(body.position);
        update.motion = steering.delta(ctx.dt);
        if let Some(heading) = steering.heading {
            update.yaw = turn_towards(body.yaw, heading, self.config.turn_rate * ctx.dt);
        }

        let landed = body.position + update.motion;
        if planar_distance(landed, target) <= self.config.satisfaction_radius {
            self.detonate(landed, update);
        }
        Ok(())
    }
}

impl Controller for HomingMissile {
    type State = HomingState;

    fn state(&self) -> HomingState {
        self.state
    }

    fn tick(
        &mut self,
        body: &AgentBody,
        ctx: &TickContext<'_>,
    ) -> Result<AgentUpdate<HomingState>, NavError> {
        let mut update = AgentUpdate::hold(self.state, body);

        if self.state == HomingState::Explode {
            return Ok(update);
        }

        let Some(target) = ctx.sensor.target_position() else {
            transition(&mut self.state, HomingState::Idle, &mut update.events);
            update.state = self.state;
            return Ok(update);
        };

        let distance = planar_distance(body.position, target);
        if self.state == HomingState::Idle && distance <= self.config.detection_range {
            log::debug!("Locked on at {distance:.1} units");
            transition(&mut self.state, HomingState::Homing, &mut update.events);
        }

        if self.state == HomingState::Homing {
            if distance <= self.config.satisfaction_radius {
                self.detonate(body.position, &mut update);
            } else {
                self.home(body, target, ctx, &mut update)?;
            }
        }

        update.state = self.state;
        Ok(update)
    }

    fn is_retired(&self) -> bool {
        self.state == HomingState::Explode
    }
}
