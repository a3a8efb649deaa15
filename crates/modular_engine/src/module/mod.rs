//! Module system
//!
//! - [`Module`]: lifecycle contract every engine subsystem implements
//! - [`ModuleManager`]: ordered owner that drives the lifecycle
//! - [`ModuleCatalog`]: entry points for modules loaded by name

pub mod catalog;
pub mod contract;
pub mod manager;

pub use catalog::{ModuleCatalog, ModuleEntryPoint, MODULE_ABI_VERSION};
pub use contract::{Module, ModuleError, ModuleVersion};
pub use manager::ModuleManager;
