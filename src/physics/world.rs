//! Static collision scene using rapier3d
//!
//! The arena never moves once loaded, so only the query side of rapier is
//! used: fixed bodies, colliders tagged with layers, and a query pipeline for
//! the grid probes and line-of-sight rays.

use glam::Vec3;
use rapier3d::prelude::*;

use crate::ai::{LayerMask, SceneHit, SceneQuery, Sensor};

/// Handle to a rigid body in the physics world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RigidBodyHandle(pub rapier3d::dynamics::RigidBodyHandle);

/// Handle to a collider in the physics world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColliderHandle(pub rapier3d::geometry::ColliderHandle);

/// Collision groups for a collider living on `layer`
fn member_of(layer: LayerMask) -> InteractionGroups {
    InteractionGroups::new(Group::from_bits_truncate(layer.0), Group::ALL)
}

/// Query filter that only reports colliders on `mask`
fn filter_for(mask: LayerMask) -> QueryFilter<'static> {
    QueryFilter::default().groups(InteractionGroups::new(
        Group::ALL,
        Group::from_bits_truncate(mask.0),
    ))
}

/// Collision scene
pub struct Physics {
    /// Rigid body set
    rigid_body_set: RigidBodySet,
    /// Collider set
    collider_set: ColliderSet,
    /// Query pipeline for raycasting
    query_pipeline: QueryPipeline,
    /// Colliders added since the last refresh
    dirty: bool,
}

impl Physics {
    /// Create an empty scene
    pub fn new() -> Self {
        Self {
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            query_pipeline: QueryPipeline::new(),
            dirty: false,
        }
    }

    /// Create a static rigid body (doesn't move)
    pub fn create_static_body(&mut self, position: Vec3) -> RigidBodyHandle {
        let body = RigidBodyBuilder::fixed()
            .translation(vector![position.x, position.y, position.z])
            .build();

        RigidBodyHandle(self.rigid_body_set.insert(body))
    }

    /// Add a box collider on `layer` to a rigid body
    pub fn add_box_collider(
        &mut self,
        body: RigidBodyHandle,
        half_extents: Vec3,
        layer: LayerMask,
    ) -> ColliderHandle {
        let collider = ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
            .collision_groups(member_of(layer))
            .build();

        self.attach(body, collider)
    }

    /// Add a sphere collider on `layer` to a rigid body
    pub fn add_sphere_collider(
        &mut self,
        body: RigidBodyHandle,
        radius: f32,
        layer: LayerMask,
    ) -> ColliderHandle {
        let collider = ColliderBuilder::ball(radius)
            .collision_groups(member_of(layer))
            .build();

        self.attach(body, collider)
    }

    /// Add a thin floor slab of the given half extent on the ground layer
    pub fn add_ground_plane(&mut self, center: Vec3, half_extent: f32) -> ColliderHandle {
        let body = self.create_static_body(center - Vec3::Y * 0.1);
        self.add_box_collider(
            body,
            Vec3::new(half_extent, 0.1, half_extent),
            LayerMask::GROUND,
        )
    }

    fn attach(&mut self, body: RigidBodyHandle, collider: Collider) -> ColliderHandle {
        self.dirty = true;
        ColliderHandle(self.collider_set.insert_with_parent(
            collider,
            body.0,
            &mut self.rigid_body_set,
        ))
    }

    /// Rebuild the query acceleration structure after adding colliders
    pub fn refresh(&mut self) {
        if self.dirty {
            self.query_pipeline.update(&self.collider_set);
            self.dirty = false;
        }
    }

    /// Check if colliders were added without a [`refresh`](Self::refresh)
    #[must_use]
    pub fn needs_refresh(&self) -> bool {
        self.dirty
    }

    /// Number of colliders in the scene
    #[must_use]
    pub fn collider_count(&self) -> usize {
        self.collider_set.len()
    }

    /// Get the position of a rigid body
    pub fn get_position(&self, body: RigidBodyHandle) -> Option<Vec3> {
        self.rigid_body_set.get(body.0).map(|rb| {
            let pos = rb.translation();
            Vec3::new(pos.x, pos.y, pos.z)
        })
    }

    /// Cast a ray against colliders on `mask` and return the first hit
    pub fn raycast(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        mask: LayerMask,
    ) -> Option<RaycastHit> {
        self.cast(origin, direction, max_distance, filter_for(mask))
    }

    fn cast(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        filter: QueryFilter<'_>,
    ) -> Option<RaycastHit> {
        let direction = direction.normalize_or_zero();
        if direction == Vec3::ZERO {
            return None;
        }

        let ray = Ray::new(
            point![origin.x, origin.y, origin.z],
            vector![direction.x, direction.y, direction.z],
        );

        self.query_pipeline
            .cast_ray(
                &self.rigid_body_set,
                &self.collider_set,
                &ray,
                max_distance,
                true,
                filter,
            )
            .map(|(handle, distance)| {
                let point = ray.point_at(distance);
                RaycastHit {
                    collider: ColliderHandle(handle),
                    point: Vec3::new(point.x, point.y, point.z),
                    distance,
                }
            })
    }

    /// Check if any collider on `mask` lies on the segment between two
    /// points, ignoring `exclude` (typically the shooter's own collider)
    pub fn is_obstructed(
        &self,
        from: Vec3,
        to: Vec3,
        mask: LayerMask,
        exclude: Option<ColliderHandle>,
    ) -> bool {
        let mut filter = filter_for(mask);
        if let Some(handle) = exclude {
            filter = filter.exclude_collider(handle.0);
        }
        self.cast(from, to - from, from.distance(to), filter)
            .is_some()
    }
}

impl Default for Physics {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneQuery for Physics {
    fn cast_ray(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        mask: LayerMask,
    ) -> Option<SceneHit> {
        self.raycast(origin, direction, max_distance, mask)
            .map(|hit| SceneHit {
                point: hit.point,
                distance: hit.distance,
            })
    }
}

/// Result of a raycast
#[derive(Debug, Clone)]
pub struct RaycastHit {
    /// The collider that was hit
    pub collider: ColliderHandle,
    /// The point of intersection
    pub point: Vec3,
    /// Distance from ray origin
    pub distance: f32,
}

/// [`Sensor`] backed by the collision scene.
///
/// Line of sight is tested at `eye_height` above both endpoints so the ray
/// clears the floor.
#[derive(Clone, Copy)]
pub struct PhysicsSensor<'a> {
    physics: &'a Physics,
    target: Option<Vec3>,
    blockers: LayerMask,
    eye_height: f32,
}

impl<'a> PhysicsSensor<'a> {
    /// Default height of sight lines above the agents' feet
    pub const DEFAULT_EYE_HEIGHT: f32 = 0.5;

    /// Create a sensor tracking `target`, treating `blockers` as opaque
    #[must_use]
    pub fn new(physics: &'a Physics, target: Option<Vec3>, blockers: LayerMask) -> Self {
        Self {
            physics,
            target,
            blockers,
            eye_height: Self::DEFAULT_EYE_HEIGHT,
        }
    }

    /// Set the sight line height
    #[must_use]
    pub fn with_eye_height(mut self, eye_height: f32) -> Self {
        self.eye_height = eye_height;
        self
    }
}

impl Sensor for PhysicsSensor<'_> {
    fn target_position(&self) -> Option<Vec3> {
        self.target
    }

    fn has_line_of_sight(&self, from: Vec3, to: Vec3) -> bool {
        let lift = Vec3::Y * self.eye_height;
        !self
            .physics
            .is_obstructed(from + lift, to + lift, self.blockers, None)
    }
}
