//! Renderer capability
//!
//! Modules publish a `Box<dyn Renderer>` into the service registry; render
//! systems resolve it with `services.get::<dyn Renderer>()` every frame.

use super::descriptors::{
    ClearFlags, MaterialDesc, MaterialHandle, MeshDesc, MeshHandle, RenderState, RenderStatistics, ShaderDesc,
    ShaderHandle, TextureDesc, TextureHandle, Viewport,
};
use crate::foundation::math::{Mat4, Vec3, Vec4};
use std::any::Any;

/// Rendering backend interface
///
/// Resource creation never fails loudly: an invalid descriptor yields the
/// invalid handle, and destroying or drawing an invalid or stale handle is a
/// no-op.
pub trait Renderer {
    // Frame management

    /// Start recording a frame
    fn begin_frame(&mut self);
    /// Finish recording the current frame
    fn end_frame(&mut self);
    /// Show the last finished frame
    fn present(&mut self);

    // Viewport

    /// Set the viewport rectangle
    fn set_viewport(&mut self, viewport: Viewport);
    /// Current viewport rectangle
    fn viewport(&self) -> Viewport;

    // Clear operations

    /// Set the color used by color clears
    fn clear_color(&mut self, color: Vec4);
    /// Set the value used by depth clears
    fn clear_depth(&mut self, depth: f32);
    /// Set the value used by stencil clears
    fn clear_stencil(&mut self, stencil: i32);
    /// Clear the selected buffers
    fn clear(&mut self, flags: ClearFlags);

    // Resource creation

    /// Create a texture
    fn create_texture(&mut self, desc: &TextureDesc) -> TextureHandle;
    /// Compile a shader program
    fn create_shader(&mut self, desc: &ShaderDesc) -> ShaderHandle;
    /// Upload a mesh
    fn create_mesh(&mut self, desc: &MeshDesc) -> MeshHandle;
    /// Create a material; its shader must be live
    fn create_material(&mut self, desc: &MaterialDesc) -> MaterialHandle;

    // Resource destruction

    /// Destroy a texture
    fn destroy_texture(&mut self, handle: TextureHandle);
    /// Destroy a shader program
    fn destroy_shader(&mut self, handle: ShaderHandle);
    /// Destroy a mesh
    fn destroy_mesh(&mut self, handle: MeshHandle);
    /// Destroy a material
    fn destroy_material(&mut self, handle: MaterialHandle);

    // Drawing

    /// Draw one mesh instance
    fn draw_mesh(&mut self, mesh: MeshHandle, material: MaterialHandle, transform: &Mat4);
    /// Draw a mesh once per transform in a single call
    fn draw_mesh_instanced(&mut self, mesh: MeshHandle, material: MaterialHandle, transforms: &[Mat4]);
    /// Draw a screen-covering quad
    fn draw_fullscreen_quad(&mut self, material: MaterialHandle);

    // Debug drawing

    /// Line segment
    fn draw_line(&mut self, start: &Vec3, end: &Vec3, color: &Vec3);
    /// Axis-aligned box outline
    fn draw_box(&mut self, min: &Vec3, max: &Vec3, color: &Vec3);
    /// Sphere outline
    fn draw_sphere(&mut self, center: &Vec3, radius: f32, color: &Vec3);
    /// Ground grid on the XZ plane
    fn draw_grid(&mut self, center: &Vec3, size: f32, step: f32, color: &Vec3);

    // Render state

    /// Replace the pipeline state
    fn set_render_state(&mut self, state: RenderState);
    /// Current pipeline state
    fn render_state(&self) -> &RenderState;

    // Camera

    /// Set the view matrix
    fn set_view_matrix(&mut self, view: Mat4);
    /// Set the projection matrix
    fn set_projection_matrix(&mut self, projection: Mat4);
    /// Current view matrix
    fn view_matrix(&self) -> &Mat4;
    /// Current projection matrix
    fn projection_matrix(&self) -> &Mat4;

    // Lighting

    /// Set the ambient light color
    fn set_ambient_light(&mut self, color: Vec3);
    /// Current ambient light color
    fn ambient_light(&self) -> Vec3;

    // Window

    /// Set the window title
    fn set_window_title(&mut self, title: &str);
    /// Resize the window
    fn set_window_size(&mut self, width: u32, height: u32);
    /// Window size in pixels
    fn window_size(&self) -> (u32, u32);
    /// The user asked to close the window
    fn should_close(&self) -> bool;

    /// Width over height, `1.0` for a degenerate window
    fn aspect_ratio(&self) -> f32 {
        let (width, height) = self.window_size();
        if width == 0 || height == 0 {
            1.0
        } else {
            width as f32 / height as f32
        }
    }

    // VSync

    /// Enable or disable vertical sync
    fn set_vsync(&mut self, enabled: bool);
    /// Whether vertical sync is enabled
    fn vsync(&self) -> bool;

    // Statistics

    /// Counters accumulated since the last reset
    fn statistics(&self) -> RenderStatistics;
    /// Zero the counters
    fn reset_statistics(&mut self);

    /// Downcast to the concrete backend type
    fn as_any(&self) -> &dyn Any;

    /// Downcast to the concrete backend type mutably
    fn as_any_mut(&mut self) -> &mut dyn Any;
}
