//! Built-in components
//!
//! Components are plain data. Behavior lives in the systems under
//! [`crate::ecs::systems`].

pub mod audio;
pub mod camera;
pub mod hierarchy;
pub mod lighting;
pub mod physics;
pub mod renderable;
pub mod script;
pub mod tag;
pub mod transform;

pub use audio::{AudioComponent, AudioHandle};
pub use camera::{CameraComponent, ProjectionType};
pub use hierarchy::HierarchyComponent;
pub use lighting::{LightComponent, LightType, ShadowFlags};
pub use physics::{BodyType, PhysicsComponent};
pub use renderable::RenderableComponent;
pub use script::{ScriptComponent, ScriptStateHandle};
pub use tag::TagComponent;
pub use transform::{GlobalTransformComponent, TransformComponent};
