//! Steering behaviors for path following
//!
//! Agents drive on the ground plane, so every behavior ignores the Y axis.
//! Yaw is measured around +Y with zero facing +Z.

use std::f32::consts::{PI, TAU};

use glam::Vec3;

/// Output from a steering behavior
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SteeringOutput {
    /// Desired planar velocity
    pub linear: Vec3,
    /// Desired heading (yaw, radians)
    pub heading: Option<f32>,
    /// Planar distance left to the behavior's target
    pub reach: f32,
}

impl SteeringOutput {
    /// Zero steering
    pub const ZERO: Self = Self {
        linear: Vec3::ZERO,
        heading: None,
        reach: 0.0,
    };

    /// Position change over `dt` seconds, never carrying past the target
    #[must_use]
    pub fn delta(self, dt: f32) -> Vec3 {
        (self.linear * dt).clamp_length_max(self.reach)
    }
}

/// Trait for steering behaviors
pub trait SteeringBehavior {
    /// Calculate steering for an agent at `position`
    fn calculate(&self, position: Vec3) -> SteeringOutput;
}

/// Project onto the ground plane
#[must_use]
pub fn planar(v: Vec3) -> Vec3 {
    Vec3::new(v.x, 0.0, v.z)
}

/// Planar distance between two points
#[must_use]
pub fn planar_distance(a: Vec3, b: Vec3) -> f32 {
    planar(b - a).length()
}

/// Yaw of a direction, or `None` for a zero-length planar direction
#[must_use]
pub fn yaw_of(direction: Vec3) -> Option<f32> {
    let flat = planar(direction);
    (flat.length_squared() > f32::EPSILON).then(|| flat.x.atan2(flat.z))
}

/// Rotate `current` toward `target` by `fraction` of the remaining angle,
/// always turning the short way round
#[must_use]
pub fn turn_towards(current: f32, target: f32, fraction: f32) -> f32 {
    let mut diff = (target - current).rem_euclid(TAU);
    if diff > PI {
        diff -= TAU;
    }
    wrap_angle(current + diff * fraction.clamp(0.0, 1.0))
}

/// Wrap an angle into `(-PI, PI]`
#[must_use]
pub fn wrap_angle(angle: f32) -> f32 {
    let wrapped = (angle + PI).rem_euclid(TAU) - PI;
    if wrapped <= -PI { wrapped + TAU } else { wrapped }
}

/// Seek behavior - constant speed toward the target
#[derive(Debug, Clone)]
pub struct Seek {
    /// Target position
    pub target: Vec3,
    /// Travel speed
    pub max_speed: f32,
}

impl Seek {
    /// Create a new seek behavior
    #[must_use]
    pub fn new(target: Vec3, max_speed: f32) -> Self {
        Self { target, max_speed }
    }
}

impl SteeringBehavior for Seek {
    fn calculate(&self, position: Vec3) -> SteeringOutput {
        let to_target = planar(self.target - position);
        SteeringOutput {
            linear: to_target.normalize_or_zero() * self.max_speed,
            heading: yaw_of(to_target),
            reach: to_target.length(),
        }
    }
}

/// Arrive behavior - move towards target and slow down
#[derive(Debug, Clone)]
pub struct Arrive {
    /// Target position
    pub target: Vec3,
    /// Maximum speed
    pub max_speed: f32,
    /// Slowing distance
    pub slow_radius: f32,
    /// Stopping distance
    pub target_radius: f32,
}

impl Arrive {
    /// Create a new arrive behavior
    #[must_use]
    pub fn new(target: Vec3, max_speed: f32, target_radius: f32) -> Self {
        Self {
            target,
            max_speed,
            slow_radius: target_radius * 2.0,
            target_radius,
        }
    }
}

impl SteeringBehavior for Arrive {
    fn calculate(&self, position: Vec3) -> SteeringOutput {
        let to_target = planar(self.target - position);
        let distance = to_target.length();

        if distance < self.target_radius {
            return SteeringOutput::ZERO;
        }

        let target_speed = if distance > self.slow_radius || self.slow_radius <= 0.0 {
            self.max_speed
        } else {
            self.max_speed * distance / self.slow_radius
        };

        SteeringOutput {
            linear: to_target.normalize_or_zero() * target_speed,
            heading: yaw_of(to_target),
            reach: distance,
        }
    }
}
