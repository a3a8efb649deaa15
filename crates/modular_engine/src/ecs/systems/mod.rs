//! Built-in systems
//!
//! - [`TransformSystem`]: propagates local transforms down the hierarchy
//! - [`PhysicsSystem`]: syncs bodies with the `dyn Physics` service
//! - [`RenderSystem`]: draws the world through the `dyn Renderer` service

pub mod physics_system;
pub mod rendering_system;
pub mod transform_system;

pub use physics_system::PhysicsSystem;
pub use rendering_system::RenderSystem;
pub use transform_system::TransformSystem;
