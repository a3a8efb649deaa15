//! Module manager
//!
//! Owns the registered modules in registration order and drives their
//! lifecycle. Registration order is initialization order; shutdown runs in
//! reverse.

use super::{Module, ModuleError};
use crate::engine::EngineContext;
use log::{debug, error, info, warn};

struct ModuleEntry {
    module: Box<dyn Module>,
    destroy: Option<fn(Box<dyn Module>)>,
}

impl ModuleEntry {
    fn dispose(self) {
        let name = self.module.name().to_owned();
        match self.destroy {
            Some(destroy) => destroy(self.module),
            None => drop(self.module),
        }
        debug!("Module '{}' released", name);
    }
}

/// Ordered collection of modules
#[derive(Default)]
pub struct ModuleManager {
    modules: Vec<ModuleEntry>,
}

impl ModuleManager {
    /// Create an empty manager
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of a module, appending it to the lifecycle order
    pub fn register(&mut self, module: Box<dyn Module>) -> Result<(), ModuleError> {
        self.insert(module, None)
    }

    /// Register a module that must be handed to `destroy` once released
    pub(crate) fn register_with_destroy(
        &mut self,
        module: Box<dyn Module>,
        destroy: fn(Box<dyn Module>),
    ) -> Result<(), ModuleError> {
        self.insert(module, Some(destroy))
    }

    fn insert(&mut self, module: Box<dyn Module>, destroy: Option<fn(Box<dyn Module>)>) -> Result<(), ModuleError> {
        let name = module.name();
        if self.contains(name) {
            return Err(ModuleError::Duplicate(name.to_owned()));
        }
        debug!("Registered module '{}' v{}", name, module.version());
        self.modules.push(ModuleEntry { module, destroy });
        Ok(())
    }

    /// Declared dependencies that are not registered ahead of their dependent
    ///
    /// Returns `(module, dependency)` pairs.
    pub fn missing_dependencies(&self) -> Vec<(String, String)> {
        let mut missing = Vec::new();
        for (position, entry) in self.modules.iter().enumerate() {
            for dependency in entry.module.dependencies() {
                let registered_before = self.modules[..position]
                    .iter()
                    .any(|earlier| earlier.module.name() == dependency);
                if !registered_before {
                    missing.push((entry.module.name().to_owned(), dependency));
                }
            }
        }
        missing
    }

    /// Initialize every module in registration order
    ///
    /// Modules that are already initialized are skipped. The first failure
    /// stops the sequence and is returned; modules initialized before it stay
    /// live until [`ModuleManager::shutdown`].
    pub fn initialize(&mut self, ctx: &mut EngineContext<'_>) -> Result<(), ModuleError> {
        for (module, dependency) in self.missing_dependencies() {
            warn!(
                "Module '{}' depends on '{}', which is not registered before it",
                module, dependency
            );
        }

        for entry in &mut self.modules {
            Self::initialize_entry(entry, ctx)?;
        }
        Ok(())
    }

    /// Initialize a single module by name
    pub fn initialize_module(&mut self, name: &str, ctx: &mut EngineContext<'_>) -> Result<(), ModuleError> {
        let entry = self
            .modules
            .iter_mut()
            .find(|entry| entry.module.name() == name)
            .ok_or_else(|| ModuleError::NotFound(name.to_owned()))?;
        Self::initialize_entry(entry, ctx)
    }

    fn initialize_entry(entry: &mut ModuleEntry, ctx: &mut EngineContext<'_>) -> Result<(), ModuleError> {
        if entry.module.is_initialized() {
            debug!("Module '{}' already initialized", entry.module.name());
            return Ok(());
        }
        info!(
            "Initializing module '{}' v{}",
            entry.module.name(),
            entry.module.version()
        );
        entry.module.initialize(ctx).map_err(|err| {
            error!("{}", err);
            err
        })
    }

    /// Update every module in registration order
    pub fn update(&mut self, ctx: &mut EngineContext<'_>, delta_time: f32) {
        for entry in &mut self.modules {
            entry.module.update(ctx, delta_time);
        }
    }

    /// Render every module in registration order
    pub fn render(&mut self, ctx: &mut EngineContext<'_>) {
        for entry in &mut self.modules {
            entry.module.render(ctx);
        }
    }

    /// Shut down every module in reverse registration order, then release them
    ///
    /// Every module is reached, including ones whose initialization failed
    /// or never ran.
    pub fn shutdown(&mut self, ctx: &mut EngineContext<'_>) {
        if self.modules.is_empty() {
            return;
        }
        info!("Shutting down {} module(s)", self.modules.len());

        while let Some(mut entry) = self.modules.pop() {
            debug!("Shutting down module '{}'", entry.module.name());
            entry.module.shutdown(ctx);
            entry.dispose();
        }
    }

    /// Ask a module to re-synchronize without tearing it down
    pub fn reload(&mut self, name: &str, ctx: &mut EngineContext<'_>) -> Result<(), ModuleError> {
        let Some(entry) = self.modules.iter_mut().find(|entry| entry.module.name() == name) else {
            let err = ModuleError::NotFound(name.to_owned());
            error!("Cannot reload: {}", err);
            return Err(err);
        };

        if !entry.module.is_initialized() {
            let err = ModuleError::ReloadFailed {
                module: name.to_owned(),
                reason: "module is not initialized".to_owned(),
            };
            warn!("Skipping reload: {}", err);
            return Err(err);
        }

        info!("Reloading module '{}'", name);
        entry.module.on_reload(ctx).map_err(|err| {
            error!("{}", err);
            err
        })
    }

    /// Shut down one module and remove it
    pub fn unload(&mut self, name: &str, ctx: &mut EngineContext<'_>) -> Result<(), ModuleError> {
        let Some(position) = self.position(name) else {
            let err = ModuleError::NotFound(name.to_owned());
            error!("Cannot unload: {}", err);
            return Err(err);
        };

        let mut entry = self.modules.remove(position);
        info!("Unloading module '{}'", name);
        entry.module.shutdown(ctx);
        entry.dispose();
        Ok(())
    }

    /// Whether a module with this name is registered
    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Module names in registration order
    pub fn names(&self) -> Vec<&str> {
        self.modules.iter().map(|entry| entry.module.name()).collect()
    }

    /// Borrow a module by name
    pub fn get(&self, name: &str) -> Option<&dyn Module> {
        self.modules
            .iter()
            .find(|entry| entry.module.name() == name)
            .map(|entry| entry.module.as_ref())
    }

    /// Number of registered modules
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Whether no modules are registered
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.modules.iter().position(|entry| entry.module.name() == name)
    }
}

impl std::fmt::Debug for ModuleManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleManager").field("modules", &self.names()).finish()
    }
}
