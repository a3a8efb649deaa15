//! Renderable component for entities that can be rendered
//!
//! Holds asset references by path plus the renderer-owned handles the render
//! module fills in once the mesh and material have been created.

use crate::ecs::Component;
use crate::render::{MaterialHandle, MeshHandle};

/// Component for entities that can be rendered
#[derive(Debug, Clone, PartialEq)]
pub struct RenderableComponent {
    /// Mesh asset reference
    pub mesh_path: String,

    /// Material asset reference
    pub material_path: String,

    /// Whether this object is visible
    pub visible: bool,

    /// Rendering layer for sorting (higher values render later)
    pub layer: u32,

    /// Renderer-owned mesh, invalid until the renderer creates it
    pub mesh_handle: MeshHandle,

    /// Renderer-owned material, invalid until the renderer creates it
    pub material_handle: MaterialHandle,
}

impl RenderableComponent {
    /// Create a new renderable component
    pub fn new(mesh_path: impl Into<String>, material_path: impl Into<String>) -> Self {
        Self {
            mesh_path: mesh_path.into(),
            material_path: material_path.into(),
            visible: true,
            layer: 0,
            mesh_handle: MeshHandle::INVALID,
            material_handle: MaterialHandle::INVALID,
        }
    }

    /// Builder pattern: Set render layer
    pub fn with_layer(mut self, layer: u32) -> Self {
        self.layer = layer;
        self
    }

    /// Builder pattern: Attach renderer handles
    pub fn with_handles(mut self, mesh: MeshHandle, material: MaterialHandle) -> Self {
        self.mesh_handle = mesh;
        self.material_handle = material;
        self
    }

    /// Set visibility
    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    /// Whether both renderer handles have been filled in
    pub fn has_gpu_resources(&self) -> bool {
        self.mesh_handle.is_valid() && self.material_handle.is_valid()
    }

    /// Check if this component should be drawn this frame
    pub fn should_render(&self) -> bool {
        self.visible && self.has_gpu_resources()
    }
}

impl Component for RenderableComponent {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_renderable_has_no_gpu_resources() {
        let renderable = RenderableComponent::new("assets/cube.mesh", "assets/cube.material");

        assert!(renderable.visible);
        assert_eq!(renderable.layer, 0);
        assert!(!renderable.has_gpu_resources());
        assert!(!renderable.should_render());
    }

    #[test]
    fn test_visibility_toggle_with_handles() {
        let mut renderable = RenderableComponent::new("a", "b")
            .with_handles(MeshHandle::from_raw(1 | (1 << 32)), MaterialHandle::from_raw(2 | (1 << 32)));
        assert!(renderable.should_render());

        renderable.set_visible(false);
        assert!(!renderable.should_render());
    }
}
