//! Transform components for the ECS system
//!
//! - `TransformComponent`: local position, rotation and scale
//! - `GlobalTransformComponent`: world matrix written by the transform system

use crate::ecs::Component;
use crate::foundation::math::{utils, Mat4, Quat, Vec3};

/// ECS Transform component
///
/// Local-space transform. For entities without a parent, local space is
/// world space.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformComponent {
    /// Position (Y-up right-handed)
    pub position: Vec3,

    /// Rotation quaternion
    pub rotation: Quat,

    /// Scale factors
    pub scale: Vec3,
}

impl Component for TransformComponent {}

impl Default for TransformComponent {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            rotation: Quat::identity(),
            scale: Vec3::new(1.0, 1.0, 1.0),
        }
    }
}

impl TransformComponent {
    /// Create identity transform
    pub fn identity() -> Self {
        Self::default()
    }

    /// Create from position only
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Create from position, rotation and scale
    pub fn from_transform(position: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self {
            position,
            rotation,
            scale,
        }
    }

    /// Model matrix in `T * R * S` order
    pub fn to_matrix(&self) -> Mat4 {
        utils::compose_trs(&self.position, &self.rotation, &self.scale)
    }

    /// Set rotation from Euler angles in degrees (roll, pitch, yaw about X, Y, Z)
    pub fn set_euler_degrees(&mut self, angles: Vec3) {
        self.rotation = Quat::from_euler_angles(
            utils::deg_to_rad(angles.x),
            utils::deg_to_rad(angles.y),
            utils::deg_to_rad(angles.z),
        );
    }

    /// Rotation as Euler angles in degrees
    pub fn euler_degrees(&self) -> Vec3 {
        let (roll, pitch, yaw) = self.rotation.euler_angles();
        Vec3::new(utils::rad_to_deg(roll), utils::rad_to_deg(pitch), utils::rad_to_deg(yaw))
    }

    /// Builder pattern: Set position
    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    /// Builder pattern: Set rotation from quaternion
    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    /// Builder pattern: Set scale (uniform)
    pub fn with_uniform_scale(mut self, scale: f32) -> Self {
        self.scale = Vec3::new(scale, scale, scale);
        self
    }

    /// Builder pattern: Set scale (non-uniform)
    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    /// Transform placed at `position` looking toward `target`
    ///
    /// The rotation maps the local `-Z` axis onto the view direction.
    pub fn looking_at(position: Vec3, target: Vec3, up: Vec3) -> Self {
        let direction = target - position;
        let rotation = if direction.norm_squared() < f32::EPSILON {
            Quat::identity()
        } else {
            // face_towards aligns +Z, so look along the opposite vector
            Quat::face_towards(&-direction, &up)
        };

        Self {
            position,
            rotation,
            scale: Vec3::new(1.0, 1.0, 1.0),
        }
    }
}

/// World-space matrix of an entity
///
/// Written every frame by the transform system: parent world matrix times the
/// entity's local matrix, or just the local matrix for roots.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlobalTransformComponent {
    /// Local-to-world matrix
    pub matrix: Mat4,
}

impl Component for GlobalTransformComponent {}

impl Default for GlobalTransformComponent {
    fn default() -> Self {
        Self {
            matrix: Mat4::identity(),
        }
    }
}

impl GlobalTransformComponent {
    /// Wrap a world matrix
    pub fn new(matrix: Mat4) -> Self {
        Self { matrix }
    }

    /// World-space translation
    pub fn translation(&self) -> Vec3 {
        Vec3::new(self.matrix.m14, self.matrix.m24, self.matrix.m34)
    }
}
