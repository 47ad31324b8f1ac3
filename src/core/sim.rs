//! Headless simulation host
//!
//! Owns the collision scene, the shared navigator and an ECS world of
//! agents, and advances every controller once per tick.

use std::sync::Arc;

use glam::Vec3;
use hecs::Entity;

use super::arena::Arena;
use super::config::SimConfig;
use super::debug::PlannerStats;
use super::events::{EventQueue, GameEvent};
use crate::ai::{
    Controller, HomingMissile, HomingState, NavError, Navigator, OccupancyGrid, Pursuer,
    PursuerState, TickContext, WorldDecomposer,
};
use crate::ecs::{Name, Target, Transform, World};
use crate::physics::{Physics, PhysicsSensor};

/// Tick-driven simulation of a target, ground pursuers and homing projectiles
pub struct Simulation {
    /// Tuning for spawned agents
    config: SimConfig,
    /// Static collision scene
    physics: Physics,
    /// Shared path planner
    navigator: Navigator,
    /// Agents and the target
    world: World,
    /// Events from the last tick
    events: EventQueue,
    /// Planning statistics
    stats: PlannerStats,
}

impl Simulation {
    /// Create a simulation with an empty scene and no grid.
    ///
    /// Ticking with agents that need a path fails with
    /// [`NavError::GridNotBuilt`] until [`install_grid`](Self::install_grid)
    /// is called.
    pub fn new(config: SimConfig) -> Self {
        Self {
            config,
            physics: Physics::new(),
            navigator: Navigator::unbuilt(),
            world: World::new(),
            events: EventQueue::new(),
            stats: PlannerStats::new(),
        }
    }

    /// Load an arena, decompose it and spawn everything on its spawn points
    ///
    /// # Errors
    ///
    /// Returns [`NavError::InvalidGrid`] if the arena cannot be decomposed
    pub fn build(config: SimConfig, arena: &Arena) -> Result<Self, NavError> {
        let mut sim = Self::new(config);
        arena.populate(&mut sim.physics);

        let grid_config = arena.grid_config(&sim.config.grid);
        let decomposer = WorldDecomposer::decompose(&grid_config, &sim.physics)?;
        sim.install_grid(decomposer.grid());

        sim.spawn_target(arena.target_spawn);
        for &position in &arena.pursuer_spawns {
            sim.spawn_pursuer(position);
        }
        for &position in &arena.launcher_spawns {
            sim.spawn_missile(position);
        }

        log::info!(
            "Simulation ready: {} pursuers, {} projectiles",
            arena.pursuer_spawns.len(),
            arena.launcher_spawns.len()
        );
        Ok(sim)
    }

    /// Hand a decomposed grid to the navigator
    pub fn install_grid(&mut self, grid: Arc<OccupancyGrid>) {
        self.navigator.install(grid);
    }

    /// Spawn the target, replacing any existing one
    pub fn spawn_target(&mut self, position: Vec3) -> Entity {
        if let Some(old) = self.world.target() {
            let _ = self.world.despawn(old);
        }
        self.world.spawn((
            Name::new("Target"),
            Transform::from_position(position),
            Target,
        ))
    }

    /// Move the target; a no-op without one
    pub fn set_target_position(&mut self, position: Vec3) {
        let Some(target) = self.world.target() else {
            return;
        };
        if let Ok(mut transform) = self.world.inner.get::<&mut Transform>(target) {
            transform.position = position;
        }
    }

    /// Remove the target; agents fall back to idle on the next tick
    pub fn remove_target(&mut self) {
        if let Some(target) = self.world.target() {
            let _ = self.world.despawn(target);
        }
    }

    /// Current target position
    pub fn target_position(&self) -> Option<Vec3> {
        self.world
            .target()
            .and_then(|target| self.world.position(target))
    }

    /// Spawn a ground pursuer facing the target
    pub fn spawn_pursuer(&mut self, position: Vec3) -> Entity {
        let transform = self.spawn_transform(position);
        let index = self.world.inner.query::<&Pursuer>().iter().count();
        self.world.spawn((
            Name::new(format!("Pursuer {index}")),
            transform,
            Pursuer::new(self.config.pursuer.clone()),
        ))
    }

    /// Launch a homing projectile facing the target
    pub fn spawn_missile(&mut self, position: Vec3) -> Entity {
        let transform = self.spawn_transform(position);
        let index = self.world.inner.query::<&HomingMissile>().iter().count();
        self.world.spawn((
            Name::new(format!("Missile {index}")),
            transform,
            HomingMissile::new(self.config.homing.clone()),
        ))
    }

    fn spawn_transform(&self, position: Vec3) -> Transform {
        let transform = Transform::from_position(position);
        match self.target_position() {
            Some(target) => transform.facing(target),
            None => transform,
        }
    }

    /// Advance every agent by `dt` seconds.
    ///
    /// Retired projectiles are despawned, and the tick's events become
    /// readable through [`events`](Self::events) once this returns.
    ///
    /// # Errors
    ///
    /// Returns [`NavError::GridNotBuilt`] if an agent needed a path before a
    /// grid was installed. Agents ticked before the failure keep their moves.
    pub fn tick(&mut self, dt: f32) -> Result<(), NavError> {
        let sensor = PhysicsSensor::new(
            &self.physics,
            self.target_position(),
            self.config.grid.obstacle_mask,
        );
        let ctx = TickContext::new(&self.navigator, &sensor, dt);

        let mut raised = Vec::new();
        let mut retired = Vec::new();
        let result = run_agents::<Pursuer>(&mut self.world, &ctx, &mut raised, &mut retired)
            .and_then(|()| {
                run_agents::<HomingMissile>(&mut self.world, &ctx, &mut raised, &mut retired)
            });

        for entity in retired {
            log::debug!("Retiring {}", self.world.label(entity));
            let _ = self.world.despawn(entity);
        }
        for event in raised {
            self.stats.observe(&event);
            self.events.push(event);
        }
        self.stats.record_tick();
        self.events.swap();

        if let Err(e) = &result {
            log::error!("Simulation tick failed: {e}");
        }
        result
    }

    /// Events raised during the last tick
    pub fn events(&self) -> &EventQueue {
        &self.events
    }

    /// Planning statistics
    pub fn stats(&self) -> &PlannerStats {
        &self.stats
    }

    /// The ECS world
    pub fn world(&self) -> &World {
        &self.world
    }

    /// The collision scene
    pub fn physics(&self) -> &Physics {
        &self.physics
    }

    /// The shared navigator
    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    /// Active configuration
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Current state of a pursuer
    pub fn pursuer_state(&self, entity: Entity) -> Option<PursuerState> {
        self.world
            .inner
            .get::<&Pursuer>(entity)
            .ok()
            .map(|pursuer| pursuer.state())
    }

    /// Current state of a projectile; `None` once it has been retired
    pub fn missile_state(&self, entity: Entity) -> Option<HomingState> {
        self.world
            .inner
            .get::<&HomingMissile>(entity)
            .ok()
            .map(|missile| missile.state())
    }
}

/// Tick every entity carrying controller `C`
fn run_agents<C: Controller + hecs::Component>(
    world: &mut World,
    ctx: &TickContext<'_>,
    raised: &mut Vec<GameEvent>,
    retired: &mut Vec<Entity>,
) -> Result<(), NavError> {
    for (entity, (transform, controller)) in world.inner.query_mut::<(&mut Transform, &mut C)>() {
        let update = controller.tick(&transform.body(), ctx)?;
        transform.apply(&update);
        raised.extend(
            update
                .events
                .into_iter()
                .map(|event| GameEvent::from_agent(entity, event)),
        );
        if controller.is_retired() {
            retired.push(entity);
        }
    }
    Ok(())
}
