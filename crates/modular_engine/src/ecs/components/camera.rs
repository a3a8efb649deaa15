//! Camera component
//!
//! The view matrix is derived from the owning entity's transform; the
//! component itself only stores projection parameters.

use crate::ecs::Component;
use crate::foundation::math::{utils, Mat4};

/// Projection kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectionType {
    /// Perspective projection driven by `fov`
    Perspective,
    /// Orthographic projection driven by `ortho_size`
    Orthographic,
}

/// Camera projection parameters
#[derive(Debug, Clone, PartialEq)]
pub struct CameraComponent {
    /// Projection kind
    pub projection: ProjectionType,
    /// Vertical field of view in degrees
    pub fov: f32,
    /// Near clip plane distance
    pub near_plane: f32,
    /// Far clip plane distance
    pub far_plane: f32,
    /// Full height of the orthographic view volume
    pub ortho_size: f32,
    /// Inactive cameras are ignored by the render system
    pub active: bool,
}

impl Component for CameraComponent {}

impl Default for CameraComponent {
    fn default() -> Self {
        Self {
            projection: ProjectionType::Perspective,
            fov: 45.0,
            near_plane: 0.1,
            far_plane: 1000.0,
            ortho_size: 10.0,
            active: true,
        }
    }
}

impl CameraComponent {
    /// Perspective camera
    pub fn perspective(fov: f32, near_plane: f32, far_plane: f32) -> Self {
        Self {
            projection: ProjectionType::Perspective,
            fov,
            near_plane,
            far_plane,
            ..Default::default()
        }
    }

    /// Orthographic camera showing `ortho_size` world units vertically
    pub fn orthographic(ortho_size: f32, near_plane: f32, far_plane: f32) -> Self {
        Self {
            projection: ProjectionType::Orthographic,
            ortho_size,
            near_plane,
            far_plane,
            ..Default::default()
        }
    }

    /// View matrix: inverse of the owner's world matrix
    ///
    /// A singular world matrix (zero scale) falls back to identity.
    pub fn view_matrix(&self, world_matrix: &Mat4) -> Mat4 {
        world_matrix.try_inverse().unwrap_or_else(Mat4::identity)
    }

    /// Projection matrix for the given aspect ratio (width / height)
    pub fn projection_matrix(&self, aspect_ratio: f32) -> Mat4 {
        match self.projection {
            ProjectionType::Perspective => utils::perspective(
                utils::deg_to_rad(self.fov),
                aspect_ratio,
                self.near_plane,
                self.far_plane,
            ),
            ProjectionType::Orthographic => {
                let half_height = self.ortho_size * 0.5;
                utils::orthographic(half_height * aspect_ratio, half_height, self.near_plane, self.far_plane)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::components::TransformComponent;
    use crate::foundation::math::{Point3, Vec3};
    use approx::assert_relative_eq;

    #[test]
    fn test_view_matrix_inverts_camera_transform() {
        let transform = TransformComponent::from_position(Vec3::new(0.0, 2.0, 5.0));
        let camera = CameraComponent::default();

        let view = camera.view_matrix(&transform.to_matrix());
        let eye_in_view = view.transform_point(&Point3::new(0.0, 2.0, 5.0));

        assert_relative_eq!(eye_in_view, Point3::origin(), epsilon = 1e-5);
    }

    #[test]
    fn test_singular_world_matrix_falls_back_to_identity() {
        let transform = TransformComponent::identity().with_uniform_scale(0.0);
        let view = CameraComponent::default().view_matrix(&transform.to_matrix());
        assert_relative_eq!(view, Mat4::identity());
    }

    #[test]
    fn test_perspective_projection_uses_aspect_ratio() {
        let camera = CameraComponent::perspective(90.0, 0.1, 100.0);
        let projection = camera.projection_matrix(2.0);

        // fov 90 => 1/tan(45°) = 1; x scale is divided by the aspect ratio
        assert_relative_eq!(projection.m22, 1.0, epsilon = 1e-5);
        assert_relative_eq!(projection.m11, 0.5, epsilon = 1e-5);
    }

    #[test]
    fn test_orthographic_projection_maps_extent_to_clip_edges() {
        let camera = CameraComponent::orthographic(10.0, 0.1, 100.0);
        let projection = camera.projection_matrix(2.0);

        let corner = projection.transform_point(&Point3::new(10.0, 5.0, -1.0));
        assert_relative_eq!(corner.x, 1.0, epsilon = 1e-5);
        assert_relative_eq!(corner.y, 1.0, epsilon = 1e-5);
    }
}
