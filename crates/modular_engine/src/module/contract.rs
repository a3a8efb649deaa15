//! Module contract
//!
//! A module is a unit of engine functionality with a lifecycle. The engine
//! passes an [`EngineContext`] into every lifecycle call; modules publish
//! their capabilities into `ctx.services` during initialization and resolve
//! each other's through it afterwards.

use crate::engine::EngineContext;
use std::fmt;
use thiserror::Error;

/// Module lifecycle and lookup errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModuleError {
    /// A module refused to start
    #[error("module '{module}' failed to initialize: {reason}")]
    InitializationFailed {
        /// Module name
        module: String,
        /// What went wrong
        reason: String,
    },

    /// No module is registered under this name
    #[error("module '{0}' not found")]
    NotFound(String),

    /// A module with this name is already registered
    #[error("module '{0}' is already registered")]
    Duplicate(String),

    /// An entry point was built against another binary contract
    #[error("module '{module}' targets ABI {found}, engine provides ABI {expected}")]
    AbiMismatch {
        /// Module name
        module: String,
        /// ABI the engine implements
        expected: u32,
        /// ABI the entry point declares
        found: u32,
    },

    /// A module could not re-synchronize after a reload
    #[error("module '{module}' failed to reload: {reason}")]
    ReloadFailed {
        /// Module name
        module: String,
        /// What went wrong
        reason: String,
    },
}

/// Semantic module version packed as `major << 16 | minor << 8 | patch`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ModuleVersion(u32);

impl ModuleVersion {
    /// Pack a version; minor and patch use one byte each
    pub const fn new(major: u16, minor: u8, patch: u8) -> Self {
        Self(((major as u32) << 16) | ((minor as u32) << 8) | patch as u32)
    }

    /// Rebuild from the packed representation
    pub const fn from_packed(packed: u32) -> Self {
        Self(packed)
    }

    /// Packed representation
    pub const fn packed(self) -> u32 {
        self.0
    }

    /// Major component
    pub const fn major(self) -> u16 {
        (self.0 >> 16) as u16
    }

    /// Minor component
    pub const fn minor(self) -> u8 {
        (self.0 >> 8) as u8
    }

    /// Patch component
    pub const fn patch(self) -> u8 {
        self.0 as u8
    }
}

impl Default for ModuleVersion {
    fn default() -> Self {
        Self::new(1, 0, 0)
    }
}

impl fmt::Display for ModuleVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major(), self.minor(), self.patch())
    }
}

/// Engine module lifecycle
///
/// Order of calls: `initialize` once, then `update` and `render` every
/// frame, `on_reload` at any point after initialization, and `shutdown`
/// exactly once. `shutdown` is called even if `initialize` failed or never
/// ran, so it must cope with a partially started module.
pub trait Module {
    /// Unique name within one engine
    fn name(&self) -> &str;

    /// Module version
    fn version(&self) -> ModuleVersion {
        ModuleVersion::default()
    }

    /// Names of modules this one expects to be registered before it
    ///
    /// Advisory: the manager warns about missing entries but never reorders.
    fn dependencies(&self) -> Vec<String> {
        Vec::new()
    }

    /// Start the module; an error aborts engine startup
    fn initialize(&mut self, ctx: &mut EngineContext<'_>) -> Result<(), ModuleError>;

    /// Release everything the module acquired
    fn shutdown(&mut self, ctx: &mut EngineContext<'_>);

    /// Re-synchronize internal state without tearing down
    ///
    /// Only called on initialized modules.
    fn on_reload(&mut self, _ctx: &mut EngineContext<'_>) -> Result<(), ModuleError> {
        Ok(())
    }

    /// Per-frame update
    fn update(&mut self, _ctx: &mut EngineContext<'_>, _delta_time: f32) {}

    /// Per-frame render, after every module's update
    fn render(&mut self, _ctx: &mut EngineContext<'_>) {}

    /// Whether `initialize` succeeded and `shutdown` has not run since
    fn is_initialized(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_packing() {
        let version = ModuleVersion::new(2, 5, 9);

        assert_eq!(version.packed(), 0x0002_0509);
        assert_eq!((version.major(), version.minor(), version.patch()), (2, 5, 9));
        assert_eq!(ModuleVersion::from_packed(version.packed()), version);
        assert_eq!(version.to_string(), "2.5.9");
    }

    #[test]
    fn test_versions_order_by_component() {
        assert!(ModuleVersion::new(1, 2, 0) > ModuleVersion::new(1, 1, 9));
        assert!(ModuleVersion::new(2, 0, 0) > ModuleVersion::new(1, 255, 255));
        assert_eq!(ModuleVersion::default().to_string(), "1.0.0");
    }
}
