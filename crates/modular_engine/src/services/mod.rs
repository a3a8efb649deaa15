//! Service composition
//!
//! Modules publish capabilities (renderer, physics, assets) into the
//! [`ServiceRegistry`] during initialization and resolve each other's
//! capabilities from it at runtime.

pub mod registry;

pub use registry::{ServiceError, ServiceRegistry};
