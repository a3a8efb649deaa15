//! Module entry points
//!
//! Modules that are not linked into the application statically are
//! described by a [`ModuleEntryPoint`]: a name, the ABI revision it was
//! built against, and constructor/destructor functions. The engine looks
//! entry points up in its [`ModuleCatalog`] when asked to load a module by
//! name.

use super::{Module, ModuleError};
use log::{debug, warn};
use std::collections::BTreeMap;

/// Binary contract revision between the engine and module entry points
pub const MODULE_ABI_VERSION: u32 = 1;

/// Constructor and destructor pair for a module
#[derive(Debug, Clone, Copy)]
pub struct ModuleEntryPoint {
    /// Name the module registers under
    pub name: &'static str,
    /// ABI revision the module was built against
    pub abi_version: u32,
    /// Build a fresh module instance
    pub create: fn() -> Box<dyn Module>,
    /// Dispose of an instance after shutdown
    pub destroy: fn(Box<dyn Module>),
}

impl ModuleEntryPoint {
    /// Entry point for the current ABI that disposes modules by dropping them
    pub const fn new(name: &'static str, create: fn() -> Box<dyn Module>) -> Self {
        Self {
            name,
            abi_version: MODULE_ABI_VERSION,
            create,
            destroy: drop_module,
        }
    }

    /// Builder pattern: Set a custom destructor
    pub const fn with_destroy(mut self, destroy: fn(Box<dyn Module>)) -> Self {
        self.destroy = destroy;
        self
    }

    /// Builder pattern: Declare another ABI revision
    pub const fn with_abi_version(mut self, abi_version: u32) -> Self {
        self.abi_version = abi_version;
        self
    }
}

fn drop_module(module: Box<dyn Module>) {
    drop(module);
}

/// Entry points available for loading by name
#[derive(Debug, Default)]
pub struct ModuleCatalog {
    entries: BTreeMap<&'static str, ModuleEntryPoint>,
}

impl ModuleCatalog {
    /// Empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry point, returning the one it replaced
    pub fn add(&mut self, entry: ModuleEntryPoint) -> Option<ModuleEntryPoint> {
        debug!("Catalog entry '{}' (ABI {})", entry.name, entry.abi_version);
        let previous = self.entries.insert(entry.name, entry);
        if previous.is_some() {
            warn!("Catalog entry '{}' replaced", entry.name);
        }
        previous
    }

    /// Remove an entry point
    pub fn remove(&mut self, name: &str) -> Option<ModuleEntryPoint> {
        self.entries.remove(name)
    }

    /// Look up an entry point
    pub fn get(&self, name: &str) -> Option<&ModuleEntryPoint> {
        self.entries.get(name)
    }

    /// Whether an entry point exists for `name`
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Entry point names in sorted order
    pub fn names(&self) -> Vec<&'static str> {
        self.entries.keys().copied().collect()
    }

    /// Number of entry points
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the catalog is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Build a module from its entry point after checking the ABI revision
    pub fn instantiate(&self, name: &str) -> Result<(Box<dyn Module>, fn(Box<dyn Module>)), ModuleError> {
        let entry = self
            .entries
            .get(name)
            .ok_or_else(|| ModuleError::NotFound(name.to_owned()))?;

        if entry.abi_version != MODULE_ABI_VERSION {
            return Err(ModuleError::AbiMismatch {
                module: name.to_owned(),
                expected: MODULE_ABI_VERSION,
                found: entry.abi_version,
            });
        }

        let module = (entry.create)();
        if module.name() != entry.name {
            warn!(
                "Entry point '{}' created a module named '{}'",
                entry.name,
                module.name()
            );
        }
        Ok((module, entry.destroy))
    }
}
