//! Resource descriptors, render state and renderer handles

use crate::foundation::collections::Handle;
use crate::foundation::math::{Vec3, Vec4};
use bitflags::bitflags;

/// Marker for texture handles
#[derive(Debug)]
pub enum Texture {}
/// Marker for shader handles
#[derive(Debug)]
pub enum Shader {}
/// Marker for mesh handles
#[derive(Debug)]
pub enum Mesh {}
/// Marker for material handles
#[derive(Debug)]
pub enum Material {}

/// Handle to a renderer-owned texture
pub type TextureHandle = Handle<Texture>;
/// Handle to a renderer-owned shader program
pub type ShaderHandle = Handle<Shader>;
/// Handle to a renderer-owned mesh
pub type MeshHandle = Handle<Mesh>;
/// Handle to a renderer-owned material
pub type MaterialHandle = Handle<Material>;

/// Texture sampling filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextureFilter {
    /// Nearest texel
    Nearest,
    /// Bilinear
    Linear,
    /// Trilinear across mip levels
    #[default]
    LinearMipmapLinear,
}

/// Texture addressing outside `0..1`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextureWrap {
    /// Tile
    #[default]
    Repeat,
    /// Clamp to edge
    Clamp,
    /// Tile mirrored
    Mirror,
}

/// Texture creation parameters
#[derive(Debug, Clone, PartialEq)]
pub struct TextureDesc {
    /// Width in texels
    pub width: u32,
    /// Height in texels
    pub height: u32,
    /// Channels per texel (1 to 4)
    pub channels: u32,
    /// Tightly packed texel data, or empty for an uninitialized texture
    pub data: Vec<u8>,
    /// Build a mip chain
    pub generate_mipmaps: bool,
    /// Data is sRGB encoded
    pub srgb: bool,
    /// Sampling filter
    pub filter: TextureFilter,
    /// Wrap mode
    pub wrap: TextureWrap,
}

impl TextureDesc {
    /// Uninitialized RGBA texture
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            channels: 4,
            data: Vec::new(),
            generate_mipmaps: true,
            srgb: true,
            filter: TextureFilter::default(),
            wrap: TextureWrap::default(),
        }
    }

    /// Builder pattern: Attach texel data
    pub fn with_data(mut self, channels: u32, data: Vec<u8>) -> Self {
        self.channels = channels;
        self.data = data;
        self
    }

    /// Non-zero size, 1 to 4 channels, and data matching the size if present
    pub fn is_valid(&self) -> bool {
        let expected = self.width as usize * self.height as usize * self.channels as usize;
        self.width > 0
            && self.height > 0
            && (1..=4).contains(&self.channels)
            && (self.data.is_empty() || self.data.len() == expected)
    }
}

/// Shader program sources
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShaderDesc {
    /// Vertex stage source
    pub vertex_source: String,
    /// Fragment stage source
    pub fragment_source: String,
    /// Preprocessor defines
    pub defines: Vec<String>,
}

impl ShaderDesc {
    /// Shader from both stage sources
    pub fn new(vertex_source: impl Into<String>, fragment_source: impl Into<String>) -> Self {
        Self {
            vertex_source: vertex_source.into(),
            fragment_source: fragment_source.into(),
            defines: Vec::new(),
        }
    }

    /// Both stages have source
    pub fn is_valid(&self) -> bool {
        !self.vertex_source.trim().is_empty() && !self.fragment_source.trim().is_empty()
    }
}

/// Mesh geometry, flattened per-vertex attribute arrays
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshDesc {
    /// Positions, three floats per vertex
    pub vertices: Vec<f32>,
    /// Triangle list indices; empty means non-indexed
    pub indices: Vec<u32>,
    /// Normals, three floats per vertex
    pub normals: Vec<f32>,
    /// Texture coordinates, two floats per vertex
    pub tex_coords: Vec<f32>,
    /// Tangents, three floats per vertex
    pub tangents: Vec<f32>,
    /// Bitangents, three floats per vertex
    pub bitangents: Vec<f32>,
}

impl MeshDesc {
    /// Mesh from positions and indices
    pub fn new(vertices: Vec<f32>, indices: Vec<u32>) -> Self {
        Self {
            vertices,
            indices,
            ..Default::default()
        }
    }

    /// Number of vertices
    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / 3
    }

    /// Number of triangles drawn
    pub fn triangle_count(&self) -> usize {
        if self.indices.is_empty() {
            self.vertex_count() / 3
        } else {
            self.indices.len() / 3
        }
    }

    /// Non-empty whole vertices and every index in range
    pub fn is_valid(&self) -> bool {
        let vertex_count = self.vertex_count();
        !self.vertices.is_empty()
            && self.vertices.len() % 3 == 0
            && self.indices.iter().all(|&i| (i as usize) < vertex_count)
    }
}

/// Material parameters bound to a shader
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MaterialDesc {
    /// Shader program
    pub shader: ShaderHandle,
    /// Scalar uniforms
    pub float_params: Vec<(String, f32)>,
    /// Vector uniforms
    pub vec3_params: Vec<(String, Vec3)>,
    /// Color uniforms
    pub vec4_params: Vec<(String, Vec4)>,
    /// Texture bindings
    pub texture_params: Vec<(String, TextureHandle)>,
}

impl MaterialDesc {
    /// Material using `shader`
    pub fn new(shader: ShaderHandle) -> Self {
        Self {
            shader,
            ..Default::default()
        }
    }

    /// Builder pattern: Add a scalar uniform
    pub fn with_float(mut self, name: impl Into<String>, value: f32) -> Self {
        self.float_params.push((name.into(), value));
        self
    }

    /// Builder pattern: Add a color uniform
    pub fn with_vec4(mut self, name: impl Into<String>, value: Vec4) -> Self {
        self.vec4_params.push((name.into(), value));
        self
    }

    /// Builder pattern: Bind a texture
    pub fn with_texture(mut self, name: impl Into<String>, texture: TextureHandle) -> Self {
        self.texture_params.push((name.into(), texture));
        self
    }
}

/// Face culling mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CullFace {
    /// Cull front faces
    Front,
    /// Cull back faces
    #[default]
    Back,
    /// Cull everything
    FrontAndBack,
}

/// Blend factor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum BlendFunc {
    Zero,
    One,
    SrcColor,
    OneMinusSrcColor,
    DstColor,
    OneMinusDstColor,
    SrcAlpha,
    OneMinusSrcAlpha,
    DstAlpha,
    OneMinusDstAlpha,
}

/// Fixed-function pipeline state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderState {
    /// Depth testing
    pub depth_test: bool,
    /// Depth writes
    pub depth_write: bool,
    /// Face culling
    pub cull_face: bool,
    /// Alpha blending
    pub blend: bool,
    /// Faces culled when culling is on
    pub cull_face_mode: CullFace,
    /// Source blend factor
    pub blend_src: BlendFunc,
    /// Destination blend factor
    pub blend_dst: BlendFunc,
}

impl Default for RenderState {
    fn default() -> Self {
        Self {
            depth_test: true,
            depth_write: true,
            cull_face: true,
            blend: false,
            cull_face_mode: CullFace::Back,
            blend_src: BlendFunc::SrcAlpha,
            blend_dst: BlendFunc::OneMinusSrcAlpha,
        }
    }
}

bitflags! {
    /// Buffers affected by [`Renderer::clear`](super::Renderer::clear)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ClearFlags: u8 {
        /// Color buffer
        const COLOR = 1 << 0;
        /// Depth buffer
        const DEPTH = 1 << 1;
        /// Stencil buffer
        const STENCIL = 1 << 2;
    }
}

impl Default for ClearFlags {
    fn default() -> Self {
        Self::COLOR | Self::DEPTH
    }
}

/// Viewport rectangle in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Viewport {
    /// Left edge
    pub x: u32,
    /// Bottom edge
    pub y: u32,
    /// Width
    pub width: u32,
    /// Height
    pub height: u32,
}

/// Per-frame counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderStatistics {
    /// Draw calls issued
    pub draw_calls: u32,
    /// Triangles submitted
    pub triangles: u32,
}
