//! Public rendering API
//!
//! The [`Renderer`] trait every backend implements, plus the descriptor,
//! state and handle types that cross it.

pub mod descriptors;
pub mod renderer;

pub use descriptors::{
    BlendFunc, ClearFlags, CullFace, MaterialDesc, MaterialHandle, MeshDesc, MeshHandle, RenderState,
    RenderStatistics, ShaderDesc, ShaderHandle, TextureDesc, TextureFilter, TextureHandle, TextureWrap, Viewport,
};
pub use renderer::Renderer;
