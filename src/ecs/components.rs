//! Common ECS components

use glam::Vec3;

use crate::ai::{AgentBody, AgentUpdate, yaw_of};

/// Ground-plane pose of an agent or the target
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Transform {
    /// Position in world space
    pub position: Vec3,
    /// Heading around +Y, zero facing +Z
    pub yaw: f32,
}

impl Transform {
    /// Create a transform with just a position
    pub fn from_position(position: Vec3) -> Self {
        Self { position, yaw: 0.0 }
    }

    /// Turn to face a point; unchanged if the point is directly above or below
    pub fn facing(mut self, point: Vec3) -> Self {
        if let Some(yaw) = yaw_of(point - self.position) {
            self.yaw = yaw;
        }
        self
    }

    /// Get the forward direction
    pub fn forward(&self) -> Vec3 {
        Vec3::new(self.yaw.sin(), 0.0, self.yaw.cos())
    }

    /// Translate by a delta
    pub fn translate(&mut self, delta: Vec3) {
        self.position += delta;
    }

    /// Body handed to a controller
    pub fn body(&self) -> AgentBody {
        AgentBody {
            position: self.position,
            yaw: self.yaw,
        }
    }

    /// Apply a controller's motion and heading
    pub fn apply<S>(&mut self, update: &AgentUpdate<S>) {
        self.translate(update.motion);
        self.yaw = update.yaw;
    }
}

/// Marks the entity every agent is chasing
#[derive(Debug, Clone, Copy, Default)]
pub struct Target;

/// Name component for debugging
#[derive(Debug, Clone)]
pub struct Name(pub String);

impl Name {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}
