//! # Modular Engine
//!
//! A game engine core built from independently loadable modules.
//!
//! ## Features
//!
//! - **Module Lifecycle**: Ordered initialize, update, render and reverse-order shutdown
//! - **Service Registry**: Modules publish and resolve capabilities by type
//! - **ECS Architecture**: Entities, dense component tables and a parent/child hierarchy
//! - **Rendering Capability**: Backend-agnostic [`Renderer`](render::Renderer) trait with a headless backend
//! - **Configuration**: TOML or RON documents with per-module sections
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use modular_engine::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ApplicationConfig::new().with_engine(EngineSettings::new().with_max_frames(60));
//!     let mut engine = Engine::new(config);
//!
//!     engine.register_module(Box::new(RendererModule::new()))?;
//!     engine.register_module(Box::new(
//!         SystemsModule::new("scene")
//!             .with_system(SystemPhase::PostUpdate, Box::new(TransformSystem::new()))
//!             .with_system(SystemPhase::PostUpdate, Box::new(RenderSystem::new())),
//!     ))?;
//!
//!     engine.initialize(None)?;
//!     engine.run()?;
//!     engine.shutdown();
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

// Engine loop and configuration
pub mod core;
pub mod engine;

// Composition
pub mod module;
pub mod services;

// Subsystems and their capabilities
pub mod assets;
pub mod config;
pub mod ecs;
pub mod foundation;
pub mod physics;
pub mod render;

#[cfg(test)]
mod tests;

pub use engine::{Engine, EngineContext, EngineControl, EngineError, EngineState, FrameTiming};
pub use module::{Module, ModuleError, ModuleVersion};
pub use services::{ServiceError, ServiceRegistry};

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        core::{ApplicationConfig, EngineSettings, WindowConfig},
        ecs::{
            components::{
                CameraComponent, GlobalTransformComponent, HierarchyComponent, LightComponent, PhysicsComponent,
                RenderableComponent, TagComponent, TransformComponent,
            },
            systems::{PhysicsSystem, RenderSystem, TransformSystem},
            Component, Entity, System, SystemPhase, SystemsModule, World,
        },
        foundation::math::{Mat4, Quat, Vec3, Vec4},
        module::{ModuleCatalog, ModuleEntryPoint},
        render::{Renderer, RendererModule},
        Engine, EngineContext, EngineControl, EngineError, EngineState, Module, ModuleError, ModuleVersion,
        ServiceRegistry,
    };
}
