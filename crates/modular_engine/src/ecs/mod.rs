//! Entity-Component-System implementation
//!
//! - [`World`]: entities, component tables and the parent/child hierarchy
//! - [`System`] and [`SystemSchedule`]: ordered per-frame logic
//! - [`SystemsModule`]: runs a schedule as an engine module
//! - [`components`] and [`systems`]: the built-in set

pub mod component;
pub mod components;
pub mod entity;
pub mod schedule;
pub mod storage;
pub mod system;
pub mod systems;
pub mod world;

pub use component::Component;
pub use entity::Entity;
pub use schedule::{SystemPhase, SystemSchedule, SystemsModule};
pub use storage::ComponentStorage;
pub use system::System;
pub use world::{World, WorldError};
