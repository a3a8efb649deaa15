//! Headless renderer backend
//!
//! Keeps every resource and state change in memory and records the draw
//! commands of the current frame instead of talking to a GPU. It backs the
//! sandbox application and the test suites.

use super::api::{
    ClearFlags, MaterialDesc, MaterialHandle, MeshDesc, MeshHandle, RenderState, RenderStatistics, Renderer,
    ShaderDesc, ShaderHandle, TextureDesc, TextureHandle, Viewport,
};
use crate::foundation::collections::HandleArena;
use crate::foundation::math::{Mat4, Vec3, Vec4};
use log::{debug, trace, warn};
use std::any::Any;

/// A command recorded during the current frame
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    /// Buffers cleared
    Clear(ClearFlags),
    /// Mesh draw, one entry per instance for instanced draws
    Mesh {
        /// Mesh drawn
        mesh: MeshHandle,
        /// Material bound
        material: MaterialHandle,
        /// Model matrix
        transform: Mat4,
    },
    /// Fullscreen quad
    FullscreenQuad(MaterialHandle),
    /// Debug line
    Line {
        /// Start point
        start: Vec3,
        /// End point
        end: Vec3,
        /// Line color
        color: Vec3,
    },
    /// Debug box
    Box {
        /// Minimum corner
        min: Vec3,
        /// Maximum corner
        max: Vec3,
        /// Line color
        color: Vec3,
    },
    /// Debug sphere
    Sphere {
        /// Center point
        center: Vec3,
        /// Radius
        radius: f32,
        /// Line color
        color: Vec3,
    },
    /// Debug grid
    Grid {
        /// Center point
        center: Vec3,
        /// Edge length
        size: f32,
        /// Cell size
        step: f32,
        /// Line color
        color: Vec3,
    },
}

#[derive(Debug)]
struct TextureRecord {
    width: u32,
    height: u32,
}

#[derive(Debug)]
struct ShaderRecord {
    defines: usize,
}

#[derive(Debug)]
struct MeshRecord {
    vertex_count: usize,
    triangle_count: usize,
}

/// In-memory [`Renderer`] implementation
#[derive(Debug)]
pub struct HeadlessRenderer {
    textures: HandleArena<TextureRecord>,
    shaders: HandleArena<ShaderRecord>,
    meshes: HandleArena<MeshRecord>,
    materials: HandleArena<MaterialDesc>,

    viewport: Viewport,
    clear_color: Vec4,
    clear_depth: f32,
    clear_stencil: i32,
    render_state: RenderState,
    view: Mat4,
    projection: Mat4,
    ambient: Vec3,

    title: String,
    width: u32,
    height: u32,
    vsync: bool,
    close_requested: bool,

    in_frame: bool,
    frames_presented: u64,
    commands: Vec<DrawCommand>,
    statistics: RenderStatistics,
}

impl HeadlessRenderer {
    /// Create a renderer for a window of the given size
    pub fn new(title: impl Into<String>, width: u32, height: u32) -> Self {
        let title = title.into();
        debug!("Headless renderer '{}' ({}x{})", title, width, height);
        Self {
            textures: HandleArena::new(),
            shaders: HandleArena::new(),
            meshes: HandleArena::new(),
            materials: HandleArena::new(),
            viewport: Viewport {
                x: 0,
                y: 0,
                width,
                height,
            },
            clear_color: Vec4::new(0.0, 0.0, 0.0, 1.0),
            clear_depth: 1.0,
            clear_stencil: 0,
            render_state: RenderState::default(),
            view: Mat4::identity(),
            projection: Mat4::identity(),
            ambient: Vec3::zeros(),
            title,
            width,
            height,
            vsync: true,
            close_requested: false,
            in_frame: false,
            frames_presented: 0,
            commands: Vec::new(),
            statistics: RenderStatistics::default(),
        }
    }

    /// Simulate the user closing the window
    pub fn request_close(&mut self) {
        self.close_requested = true;
    }

    /// Commands recorded since the last [`Renderer::begin_frame`]
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Mesh draws recorded this frame
    pub fn mesh_draws(&self) -> impl Iterator<Item = (MeshHandle, MaterialHandle, &Mat4)> {
        self.commands.iter().filter_map(|command| match command {
            DrawCommand::Mesh {
                mesh,
                material,
                transform,
            } => Some((*mesh, *material, transform)),
            _ => None,
        })
    }

    /// Whether a frame is being recorded
    pub fn in_frame(&self) -> bool {
        self.in_frame
    }

    /// Frames presented so far
    pub fn frames_presented(&self) -> u64 {
        self.frames_presented
    }

    /// Window title
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Current clear color
    pub fn current_clear_color(&self) -> Vec4 {
        self.clear_color
    }

    /// Live resources as `(textures, shaders, meshes, materials)`
    pub fn resource_counts(&self) -> (usize, usize, usize, usize) {
        (
            self.textures.len(),
            self.shaders.len(),
            self.meshes.len(),
            self.materials.len(),
        )
    }

    /// Size of a live texture
    pub fn texture_size(&self, handle: TextureHandle) -> Option<(u32, u32)> {
        self.textures
            .get(handle.cast())
            .map(|texture| (texture.width, texture.height))
    }

    /// Vertex count of a live mesh
    pub fn mesh_vertex_count(&self, handle: MeshHandle) -> Option<usize> {
        self.meshes.get(handle.cast()).map(|mesh| mesh.vertex_count)
    }

    fn record_mesh_draw(&mut self, mesh: MeshHandle, material: MaterialHandle, transform: &Mat4) -> bool {
        let Some(record) = self.meshes.get(mesh.cast()) else {
            warn!("Skipping draw of unknown mesh {:?}", mesh);
            return false;
        };
        if !self.materials.contains(material.cast()) {
            warn!("Skipping draw with unknown material {:?}", material);
            return false;
        }

        let triangles = record.triangle_count as u32;
        self.statistics.triangles = self.statistics.triangles.saturating_add(triangles);
        self.commands.push(DrawCommand::Mesh {
            mesh,
            material,
            transform: *transform,
        });
        true
    }
}

impl Renderer for HeadlessRenderer {
    fn begin_frame(&mut self) {
        if self.in_frame {
            warn!("begin_frame called twice without end_frame");
        }
        self.in_frame = true;
        self.commands.clear();
    }

    fn end_frame(&mut self) {
        if !self.in_frame {
            warn!("end_frame called without begin_frame");
        }
        self.in_frame = false;
    }

    fn present(&mut self) {
        self.frames_presented += 1;
        trace!(
            "Presented frame {} ({} commands)",
            self.frames_presented,
            self.commands.len()
        );
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn clear_color(&mut self, color: Vec4) {
        self.clear_color = color;
    }

    fn clear_depth(&mut self, depth: f32) {
        self.clear_depth = depth;
    }

    fn clear_stencil(&mut self, stencil: i32) {
        self.clear_stencil = stencil;
    }

    fn clear(&mut self, flags: ClearFlags) {
        self.commands.push(DrawCommand::Clear(flags));
    }

    fn create_texture(&mut self, desc: &TextureDesc) -> TextureHandle {
        if !desc.is_valid() {
            warn!("Rejected texture {}x{}x{}", desc.width, desc.height, desc.channels);
            return TextureHandle::INVALID;
        }
        self.textures
            .insert(TextureRecord {
                width: desc.width,
                height: desc.height,
            })
            .cast()
    }

    fn create_shader(&mut self, desc: &ShaderDesc) -> ShaderHandle {
        if !desc.is_valid() {
            warn!("Rejected shader with empty stage source");
            return ShaderHandle::INVALID;
        }
        let handle = self.shaders.insert(ShaderRecord {
            defines: desc.defines.len(),
        });
        trace!("Shader {:?} with {} defines", handle, desc.defines.len());
        handle.cast()
    }

    fn create_mesh(&mut self, desc: &MeshDesc) -> MeshHandle {
        if !desc.is_valid() {
            warn!("Rejected mesh with {} floats", desc.vertices.len());
            return MeshHandle::INVALID;
        }
        self.meshes
            .insert(MeshRecord {
                vertex_count: desc.vertex_count(),
                triangle_count: desc.triangle_count(),
            })
            .cast()
    }

    fn create_material(&mut self, desc: &MaterialDesc) -> MaterialHandle {
        if !self.shaders.contains(desc.shader.cast()) {
            warn!("Rejected material with unknown shader {:?}", desc.shader);
            return MaterialHandle::INVALID;
        }
        self.materials.insert(desc.clone()).cast()
    }

    fn destroy_texture(&mut self, handle: TextureHandle) {
        self.textures.remove(handle.cast());
    }

    fn destroy_shader(&mut self, handle: ShaderHandle) {
        if let Some(shader) = self.shaders.remove(handle.cast()) {
            trace!("Destroyed shader {:?} ({} defines)", handle, shader.defines);
        }
    }

    fn destroy_mesh(&mut self, handle: MeshHandle) {
        self.meshes.remove(handle.cast());
    }

    fn destroy_material(&mut self, handle: MaterialHandle) {
        self.materials.remove(handle.cast());
    }

    fn draw_mesh(&mut self, mesh: MeshHandle, material: MaterialHandle, transform: &Mat4) {
        if self.record_mesh_draw(mesh, material, transform) {
            self.statistics.draw_calls += 1;
        }
    }

    fn draw_mesh_instanced(&mut self, mesh: MeshHandle, material: MaterialHandle, transforms: &[Mat4]) {
        let mut recorded = false;
        for transform in transforms {
            recorded |= self.record_mesh_draw(mesh, material, transform);
        }
        if recorded {
            self.statistics.draw_calls += 1;
        }
    }

    fn draw_fullscreen_quad(&mut self, material: MaterialHandle) {
        if self.materials.contains(material.cast()) {
            self.commands.push(DrawCommand::FullscreenQuad(material));
            self.statistics.draw_calls += 1;
            self.statistics.triangles += 2;
        }
    }

    fn draw_line(&mut self, start: &Vec3, end: &Vec3, color: &Vec3) {
        self.commands.push(DrawCommand::Line {
            start: *start,
            end: *end,
            color: *color,
        });
    }

    fn draw_box(&mut self, min: &Vec3, max: &Vec3, color: &Vec3) {
        self.commands.push(DrawCommand::Box {
            min: *min,
            max: *max,
            color: *color,
        });
    }

    fn draw_sphere(&mut self, center: &Vec3, radius: f32, color: &Vec3) {
        self.commands.push(DrawCommand::Sphere {
            center: *center,
            radius,
            color: *color,
        });
    }

    fn draw_grid(&mut self, center: &Vec3, size: f32, step: f32, color: &Vec3) {
        self.commands.push(DrawCommand::Grid {
            center: *center,
            size,
            step,
            color: *color,
        });
    }

    fn set_render_state(&mut self, state: RenderState) {
        self.render_state = state;
    }

    fn render_state(&self) -> &RenderState {
        &self.render_state
    }

    fn set_view_matrix(&mut self, view: Mat4) {
        self.view = view;
    }

    fn set_projection_matrix(&mut self, projection: Mat4) {
        self.projection = projection;
    }

    fn view_matrix(&self) -> &Mat4 {
        &self.view
    }

    fn projection_matrix(&self) -> &Mat4 {
        &self.projection
    }

    fn set_ambient_light(&mut self, color: Vec3) {
        self.ambient = color;
    }

    fn ambient_light(&self) -> Vec3 {
        self.ambient
    }

    fn set_window_title(&mut self, title: &str) {
        self.title = title.to_owned();
    }

    fn set_window_size(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.viewport.width = width;
        self.viewport.height = height;
    }

    fn window_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn should_close(&self) -> bool {
        self.close_requested
    }

    fn set_vsync(&mut self, enabled: bool) {
        self.vsync = enabled;
    }

    fn vsync(&self) -> bool {
        self.vsync
    }

    fn statistics(&self) -> RenderStatistics {
        self.statistics
    }

    fn reset_statistics(&mut self) {
        self.statistics = RenderStatistics::default();
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn triangle() -> MeshDesc {
        MeshDesc::new(vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0], vec![0, 1, 2])
    }

    fn material(renderer: &mut HeadlessRenderer) -> MaterialHandle {
        let shader = renderer.create_shader(&ShaderDesc::new("vs", "fs"));
        renderer.create_material(&MaterialDesc::new(shader))
    }

    #[test]
    fn test_invalid_descriptors_return_invalid_handle() {
        let mut renderer = HeadlessRenderer::new("test", 800, 600);

        assert!(!renderer.create_texture(&TextureDesc::new(0, 16)).is_valid());
        assert!(!renderer.create_shader(&ShaderDesc::new("", "fs")).is_valid());
        assert!(!renderer.create_mesh(&MeshDesc::default()).is_valid());
        assert!(!renderer
            .create_material(&MaterialDesc::new(ShaderHandle::INVALID))
            .is_valid());
        assert_eq!(renderer.resource_counts(), (0, 0, 0, 0));
    }

    #[test]
    fn test_destroyed_handle_is_not_drawn() {
        let mut renderer = HeadlessRenderer::new("test", 800, 600);
        let mesh = renderer.create_mesh(&triangle());
        let material = material(&mut renderer);
        assert_eq!(renderer.mesh_vertex_count(mesh), Some(3));

        renderer.destroy_mesh(mesh);
        renderer.begin_frame();
        renderer.draw_mesh(mesh, material, &Mat4::identity());
        renderer.end_frame();

        assert_eq!(renderer.mesh_draws().count(), 0);
        assert_eq!(renderer.statistics().draw_calls, 0);

        // A new mesh in the reused slot does not revive the old handle
        let replacement = renderer.create_mesh(&triangle());
        assert_ne!(replacement, mesh);
        assert_eq!(renderer.mesh_vertex_count(mesh), None);
    }

    #[test]
    fn test_statistics_count_draws_and_triangles() {
        let mut renderer = HeadlessRenderer::new("test", 800, 600);
        let mesh = renderer.create_mesh(&triangle());
        let material = material(&mut renderer);

        renderer.begin_frame();
        renderer.draw_mesh(mesh, material, &Mat4::identity());
        renderer.draw_mesh_instanced(mesh, material, &[Mat4::identity(), Mat4::identity()]);
        renderer.draw_fullscreen_quad(material);
        renderer.end_frame();
        renderer.present();

        let stats = renderer.statistics();
        assert_eq!(stats.draw_calls, 3);
        assert_eq!(stats.triangles, 5);
        assert_eq!(renderer.mesh_draws().count(), 3);
        assert_eq!(renderer.frames_presented(), 1);

        renderer.reset_statistics();
        assert_eq!(renderer.statistics(), RenderStatistics::default());
    }

    #[test]
    fn test_begin_frame_discards_previous_commands() {
        let mut renderer = HeadlessRenderer::new("test", 800, 600);
        renderer.begin_frame();
        renderer.draw_line(&Vec3::zeros(), &Vec3::x(), &Vec3::new(1.0, 0.0, 0.0));
        renderer.end_frame();
        assert_eq!(renderer.commands().len(), 1);

        renderer.begin_frame();
        assert!(renderer.in_frame());
        assert!(renderer.commands().is_empty());
    }

    #[test]
    fn test_window_resize_updates_aspect_and_viewport() {
        let mut renderer = HeadlessRenderer::new("test", 800, 600);
        renderer.set_window_size(1920, 1080);

        assert_eq!(renderer.window_size(), (1920, 1080));
        assert_eq!(renderer.viewport().width, 1920);
        assert_relative_eq!(renderer.aspect_ratio(), 16.0 / 9.0);

        renderer.set_window_size(100, 0);
        assert_relative_eq!(renderer.aspect_ratio(), 1.0);
    }

    #[test]
    fn test_texture_size_lookup() {
        let mut renderer = HeadlessRenderer::new("test", 800, 600);
        let texture = renderer.create_texture(&TextureDesc::new(64, 32));

        assert_eq!(renderer.texture_size(texture), Some((64, 32)));
        renderer.destroy_texture(texture);
        assert_eq!(renderer.texture_size(texture), None);
    }
}
