//! # Core Engine Module
//!
//! Shared configuration types that the engine loop, modules and the sandbox
//! application all read.
//!
//! ## Organization
//!
//! - **Config**: Unified configuration document for the engine and its modules
//! - **Foundation**: Low-level utilities (math, handles, time, logging)
//! - **ECS**: Entity-Component-System implementation

pub mod config;

// Re-export foundation modules for convenience
pub use crate::ecs;
pub use crate::foundation;

// Re-export commonly used config types
pub use config::{
    ApplicationConfig, Config, ConfigError, ConfigFormat, EngineSettings, ModuleSection, WindowConfig,
};
