//! Physics capability
//!
//! The solver itself lives outside the engine core. A physics module
//! publishes a `Box<dyn Physics>` service and the
//! [`PhysicsSystem`](crate::ecs::systems::PhysicsSystem) keeps
//! [`PhysicsComponent`]s and transforms in sync with it.

use crate::ecs::components::{BodyType, PhysicsComponent, TransformComponent};
use crate::foundation::collections::Handle;
use crate::foundation::math::{Quat, Vec3};

/// Marker for body handles
#[derive(Debug)]
pub enum Body {}
/// Marker for shape handles
#[derive(Debug)]
pub enum Shape {}

/// Handle to a simulated rigid body
pub type BodyHandle = Handle<Body>;
/// Handle to a collision shape
pub type ShapeHandle = Handle<Shape>;

/// Rigid body creation parameters
#[derive(Debug, Clone, PartialEq)]
pub struct BodyDesc {
    /// Body kind
    pub body_type: BodyType,
    /// Initial position
    pub position: Vec3,
    /// Initial orientation
    pub rotation: Quat,
    /// Initial linear velocity
    pub linear_velocity: Vec3,
    /// Mass in kilograms
    pub mass: f32,
    /// Friction coefficient
    pub friction: f32,
    /// Bounciness
    pub restitution: f32,
    /// Linear velocity damping per second
    pub linear_damping: f32,
    /// Whether gravity applies
    pub gravity_enabled: bool,
}

impl Default for BodyDesc {
    fn default() -> Self {
        Self {
            body_type: BodyType::Dynamic,
            position: Vec3::zeros(),
            rotation: Quat::identity(),
            linear_velocity: Vec3::zeros(),
            mass: 1.0,
            friction: 0.5,
            restitution: 0.5,
            linear_damping: 0.0,
            gravity_enabled: true,
        }
    }
}

impl BodyDesc {
    /// Body matching a component, placed at the entity's transform
    pub fn from_component(component: &PhysicsComponent, transform: &TransformComponent) -> Self {
        Self {
            body_type: component.body_type,
            position: transform.position,
            rotation: transform.rotation,
            mass: component.mass,
            friction: component.friction,
            restitution: component.restitution,
            gravity_enabled: component.use_gravity,
            ..Default::default()
        }
    }
}

/// Collision shape parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShapeDesc {
    /// Box given by half extents
    Box {
        /// Half size on each axis
        half_extents: Vec3,
    },
    /// Sphere
    Sphere {
        /// Radius
        radius: f32,
    },
    /// Capsule along the Y axis
    Capsule {
        /// Radius of the caps
        radius: f32,
        /// Length of the cylinder section
        height: f32,
    },
}

impl ShapeDesc {
    /// Strictly positive dimensions
    pub fn is_valid(&self) -> bool {
        match *self {
            Self::Box { half_extents } => half_extents.iter().all(|&e| e > 0.0),
            Self::Sphere { radius } => radius > 0.0,
            Self::Capsule { radius, height } => radius > 0.0 && height >= 0.0,
        }
    }
}

/// A ray with a normalized direction
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    /// Origin in world space
    pub origin: Vec3,
    /// Unit direction
    pub direction: Vec3,
}

impl Ray {
    /// Creates a new ray; the direction is normalized
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
        }
    }

    /// Get a point along the ray at distance t
    pub fn point_at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

/// Closest body hit by a raycast
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaycastHit {
    /// Body hit
    pub body: BodyHandle,
    /// Distance from the ray origin
    pub distance: f32,
    /// Hit point in world space
    pub point: Vec3,
    /// Surface normal at the hit point
    pub normal: Vec3,
}

/// Live object counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PhysicsStatistics {
    /// Bodies in the simulation
    pub bodies: u32,
    /// Shapes created
    pub shapes: u32,
}

/// Physics simulation interface
///
/// Queries on an invalid or destroyed body return `None`; mutations on one
/// are ignored.
pub trait Physics {
    /// Advance the simulation by `delta_time` seconds
    fn step(&mut self, delta_time: f32);

    /// Set world gravity
    fn set_gravity(&mut self, gravity: Vec3);
    /// World gravity
    fn gravity(&self) -> Vec3;
    /// Set the number of sub-steps per [`Physics::step`]
    fn set_sub_steps(&mut self, sub_steps: u32);
    /// Sub-steps per step
    fn sub_steps(&self) -> u32;

    /// Create a body
    fn create_body(&mut self, desc: &BodyDesc) -> BodyHandle;
    /// Destroy a body
    fn destroy_body(&mut self, body: BodyHandle);
    /// Create a shape; invalid dimensions yield the invalid handle
    fn create_shape(&mut self, desc: &ShapeDesc) -> ShapeHandle;
    /// Destroy a shape
    fn destroy_shape(&mut self, shape: ShapeHandle);
    /// Attach a shape to a body at a local offset
    fn attach_shape(&mut self, body: BodyHandle, shape: ShapeHandle, offset: Vec3, rotation: Quat);

    /// Body position
    fn body_position(&self, body: BodyHandle) -> Option<Vec3>;
    /// Teleport a body
    fn set_body_position(&mut self, body: BodyHandle, position: Vec3);
    /// Body orientation
    fn body_rotation(&self, body: BodyHandle) -> Option<Quat>;
    /// Rotate a body
    fn set_body_rotation(&mut self, body: BodyHandle, rotation: Quat);
    /// Body linear velocity
    fn body_linear_velocity(&self, body: BodyHandle) -> Option<Vec3>;
    /// Set body linear velocity
    fn set_body_linear_velocity(&mut self, body: BodyHandle, velocity: Vec3);

    /// Apply a continuous force for the next step
    fn apply_force(&mut self, body: BodyHandle, force: Vec3);
    /// Apply an instantaneous impulse
    fn apply_impulse(&mut self, body: BodyHandle, impulse: Vec3);

    /// Closest hit within `max_distance` along the ray
    fn raycast(&self, ray: &Ray, max_distance: f32) -> Option<RaycastHit>;

    /// Live object counts
    fn statistics(&self) -> PhysicsStatistics;
}
