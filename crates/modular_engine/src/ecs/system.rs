//! System trait
//!
//! Systems hold per-frame logic over the [`World`]. Unlike modules they have
//! no lifecycle of their own: a [`SystemsModule`](super::SystemsModule) owns
//! them and runs them during its update and render calls.

use super::World;
use crate::services::ServiceRegistry;

/// Per-frame logic over the world's components
pub trait System {
    /// System name, unique within a schedule
    fn name(&self) -> &str;

    /// Mutate the world for one frame
    fn update(&mut self, world: &mut World, services: &mut ServiceRegistry, delta_time: f32);

    /// Read-only pass issued after every update of the frame
    fn render(&mut self, _world: &World, _services: &mut ServiceRegistry) {}

    /// Disabled systems are skipped by the schedule
    fn is_enabled(&self) -> bool;

    /// Enable or disable the system
    fn set_enabled(&mut self, enabled: bool);
}
