//! System scheduling
//!
//! Systems run single-threaded in a deterministic order: by phase first,
//! then in the order they were added. [`SystemsModule`] wraps a schedule so
//! it plugs into the engine like any other module.

use super::{System, World};
use crate::engine::EngineContext;
use crate::module::{Module, ModuleError, ModuleVersion};
use crate::services::ServiceRegistry;
use log::{debug, warn};

/// System execution phases with explicit ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SystemPhase {
    /// Input processing, entity lifecycle management
    PreUpdate = 0,
    /// Game logic, physics simulation
    Update = 1,
    /// Transform propagation and other derived state
    PostUpdate = 2,
}

struct ScheduledSystem {
    phase: SystemPhase,
    system: Box<dyn System>,
}

/// Ordered collection of systems
#[derive(Default)]
pub struct SystemSchedule {
    systems: Vec<ScheduledSystem>,
}

impl SystemSchedule {
    /// Create an empty schedule
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a system to the `Update` phase
    pub fn add_system(&mut self, system: Box<dyn System>) {
        self.add_system_to_phase(SystemPhase::Update, system);
    }

    /// Add a system to a phase; it runs after systems already in that phase
    pub fn add_system_to_phase(&mut self, phase: SystemPhase, system: Box<dyn System>) {
        debug!("Scheduling system '{}' in {:?}", system.name(), phase);
        // Insert after the last system of the same or an earlier phase
        let position = self.systems.partition_point(|scheduled| scheduled.phase <= phase);
        self.systems.insert(position, ScheduledSystem { phase, system });
    }

    /// Enable or disable a system by name, returning whether it was found
    pub fn set_enabled(&mut self, name: &str, enabled: bool) -> bool {
        match self.systems.iter_mut().find(|s| s.system.name() == name) {
            Some(scheduled) => {
                scheduled.system.set_enabled(enabled);
                true
            }
            None => {
                warn!("Cannot toggle unknown system '{}'", name);
                false
            }
        }
    }

    /// Whether a system with this name is scheduled and enabled
    pub fn is_enabled(&self, name: &str) -> bool {
        self.systems
            .iter()
            .any(|s| s.system.name() == name && s.system.is_enabled())
    }

    /// System names in execution order
    pub fn names(&self) -> Vec<&str> {
        self.systems.iter().map(|s| s.system.name()).collect()
    }

    /// Number of scheduled systems
    pub fn len(&self) -> usize {
        self.systems.len()
    }

    /// Whether no systems are scheduled
    pub fn is_empty(&self) -> bool {
        self.systems.is_empty()
    }

    /// Run every enabled system's update
    pub fn update(&mut self, world: &mut World, services: &mut ServiceRegistry, delta_time: f32) {
        for scheduled in self.systems.iter_mut().filter(|s| s.system.is_enabled()) {
            scheduled.system.update(world, services, delta_time);
        }
    }

    /// Run every enabled system's render pass
    pub fn render(&mut self, world: &World, services: &mut ServiceRegistry) {
        for scheduled in self.systems.iter_mut().filter(|s| s.system.is_enabled()) {
            scheduled.system.render(world, services);
        }
    }
}

/// Module that runs a [`SystemSchedule`] over the engine's world
pub struct SystemsModule {
    name: String,
    schedule: SystemSchedule,
    initialized: bool,
}

impl SystemsModule {
    /// Create a module with an empty schedule
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            schedule: SystemSchedule::new(),
            initialized: false,
        }
    }

    /// Builder pattern: Add a system to a phase
    pub fn with_system(mut self, phase: SystemPhase, system: Box<dyn System>) -> Self {
        self.schedule.add_system_to_phase(phase, system);
        self
    }

    /// Access the schedule
    pub fn schedule(&self) -> &SystemSchedule {
        &self.schedule
    }

    /// Access the schedule mutably
    pub fn schedule_mut(&mut self) -> &mut SystemSchedule {
        &mut self.schedule
    }
}

impl Module for SystemsModule {
    fn name(&self) -> &str {
        &self.name
    }

    fn version(&self) -> ModuleVersion {
        ModuleVersion::new(1, 0, 0)
    }

    fn initialize(&mut self, _ctx: &mut EngineContext<'_>) -> Result<(), ModuleError> {
        debug!("'{}' running systems: {:?}", self.name, self.schedule.names());
        self.initialized = true;
        Ok(())
    }

    fn shutdown(&mut self, _ctx: &mut EngineContext<'_>) {
        self.initialized = false;
    }

    fn update(&mut self, ctx: &mut EngineContext<'_>, delta_time: f32) {
        if self.initialized {
            self.schedule.update(ctx.world, ctx.services, delta_time);
        }
    }

    fn render(&mut self, ctx: &mut EngineContext<'_>) {
        if self.initialized {
            self.schedule.render(ctx.world, ctx.services);
        }
    }

    fn is_initialized(&self) -> bool {
        self.initialized
    }
}
