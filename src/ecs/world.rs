//! World wrapper around hecs

use glam::Vec3;
use hecs::Entity;

use super::components::{Name, Target, Transform};

/// Simulation world holding the target and every agent
pub struct World {
    /// The underlying hecs world
    pub inner: hecs::World,
}

impl World {
    /// Create a new empty world
    pub fn new() -> Self {
        Self {
            inner: hecs::World::new(),
        }
    }

    /// Spawn an entity with the given components
    pub fn spawn(&mut self, components: impl hecs::DynamicBundle) -> Entity {
        self.inner.spawn(components)
    }

    /// Despawn an entity
    pub fn despawn(&mut self, entity: Entity) -> Result<(), hecs::NoSuchEntity> {
        self.inner.despawn(entity)
    }

    /// Check if an entity exists
    pub fn contains(&self, entity: Entity) -> bool {
        self.inner.contains(entity)
    }

    /// Get the number of entities
    pub fn len(&self) -> u32 {
        self.inner.len()
    }

    /// Check if the world is empty
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// World position of an entity with a [`Transform`]
    pub fn position(&self, entity: Entity) -> Option<Vec3> {
        self.inner
            .get::<&Transform>(entity)
            .ok()
            .map(|transform| transform.position)
    }

    /// Debug name of an entity, or its id
    pub fn label(&self, entity: Entity) -> String {
        self.inner
            .get::<&Name>(entity)
            .map(|name| name.0.clone())
            .unwrap_or_else(|_| format!("{entity:?}"))
    }

    /// The first entity marked as [`Target`]
    pub fn target(&self) -> Option<Entity> {
        self.inner
            .query::<()>()
            .with::<&Target>()
            .iter()
            .next()
            .map(|(entity, ())| entity)
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}
