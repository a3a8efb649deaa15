//! Rendering
//!
//! - [`api`]: the [`Renderer`] capability and the types that cross it
//! - [`headless`]: in-memory backend used by the sandbox and tests
//! - [`module`]: module that publishes the backend as a service

pub mod api;
pub mod headless;
pub mod module;

pub use api::{
    BlendFunc, ClearFlags, CullFace, MaterialDesc, MaterialHandle, MeshDesc, MeshHandle, RenderState,
    RenderStatistics, Renderer, ShaderDesc, ShaderHandle, TextureDesc, TextureFilter, TextureHandle, TextureWrap,
    Viewport,
};
pub use headless::{DrawCommand, HeadlessRenderer};
pub use module::{ProvideMode, RendererModule};
