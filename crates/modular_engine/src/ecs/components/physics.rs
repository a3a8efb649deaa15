//! Rigid body component

use crate::ecs::Component;
use crate::physics::BodyHandle;

/// How the simulation treats a body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyType {
    /// Never moves
    Static,
    /// Moved by forces and collisions; writes back into the transform
    Dynamic,
    /// Moved by the transform; pushes dynamic bodies
    Kinematic,
}

/// Rigid body parameters plus the simulation-owned body handle
#[derive(Debug, Clone, PartialEq)]
pub struct PhysicsComponent {
    /// Body kind
    pub body_type: BodyType,
    /// Mass in kilograms (ignored for static bodies)
    pub mass: f32,
    /// Friction coefficient
    pub friction: f32,
    /// Bounciness in `0.0..=1.0`
    pub restitution: f32,
    /// Whether gravity applies
    pub use_gravity: bool,
    /// Simulation body, invalid until the physics system creates it
    pub body_handle: BodyHandle,
}

impl Component for PhysicsComponent {}

impl Default for PhysicsComponent {
    fn default() -> Self {
        Self {
            body_type: BodyType::Dynamic,
            mass: 1.0,
            friction: 0.5,
            restitution: 0.0,
            use_gravity: true,
            body_handle: BodyHandle::INVALID,
        }
    }
}

impl PhysicsComponent {
    /// Dynamic body with the given mass
    pub fn dynamic(mass: f32) -> Self {
        Self {
            mass,
            ..Default::default()
        }
    }

    /// Immovable body
    pub fn fixed() -> Self {
        Self {
            body_type: BodyType::Static,
            mass: 0.0,
            use_gravity: false,
            ..Default::default()
        }
    }

    /// Body driven by its transform
    pub fn kinematic() -> Self {
        Self {
            body_type: BodyType::Kinematic,
            use_gravity: false,
            ..Default::default()
        }
    }

    /// Whether the simulation has created a body for this component
    pub fn has_body(&self) -> bool {
        self.body_handle.is_valid()
    }
}
