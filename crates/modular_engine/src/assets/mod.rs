//! Asset management capability
//!
//! Loading, cooking and file watching belong to an asset module. The engine
//! core only fixes the [`AssetManager`] interface and the search-path rules
//! implementations share through [`AssetSearchPaths`].

use crate::foundation::collections::Handle;
use log::debug;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Marker for asset handles
#[derive(Debug)]
pub enum Asset {}

/// Handle to a loaded asset
pub type AssetHandle = Handle<Asset>;

/// Descriptive data about a loaded asset
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetMetadata {
    /// Resolved path
    pub path: PathBuf,
    /// Asset type name, e.g. `mesh` or `texture`
    pub asset_type: String,
    /// Size on disk in bytes
    pub size: u64,
    /// Modification time in seconds since the Unix epoch
    pub last_modified: u64,
    /// Loader-specific key/value data
    pub custom: BTreeMap<String, String>,
}

/// How an asset should be loaded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetLoadOptions {
    /// Load in the background
    pub asynchronous: bool,
    /// Reuse an already loaded copy
    pub cache: bool,
    /// Reload when the file changes
    pub hot_reload: bool,
    /// Loader-specific parameters
    pub parameters: BTreeMap<String, String>,
}

impl Default for AssetLoadOptions {
    fn default() -> Self {
        Self {
            asynchronous: false,
            cache: true,
            hot_reload: false,
            parameters: BTreeMap::new(),
        }
    }
}

/// Loader counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AssetStatistics {
    /// Assets currently loaded
    pub loaded_assets: u32,
    /// Bytes held by loaded assets
    pub memory_usage: u64,
    /// Loads answered from the cache
    pub cache_hits: u32,
    /// Loads that read from disk
    pub cache_misses: u32,
}

/// Asset manager interface
///
/// A failed load returns the invalid handle; operations on an invalid or
/// unloaded handle are ignored.
pub trait AssetManager {
    /// Poll for finished background loads and changed files
    fn update(&mut self);

    /// Load an asset by path
    fn load(&mut self, path: &str, options: &AssetLoadOptions) -> AssetHandle;
    /// Release an asset
    fn unload(&mut self, handle: AssetHandle);
    /// Re-read an asset from disk, keeping its handle
    fn reload(&mut self, handle: AssetHandle);

    /// Metadata of a loaded asset
    fn metadata(&self, handle: AssetHandle) -> Option<&AssetMetadata>;
    /// Loaded assets of a type
    fn find_by_type(&self, asset_type: &str) -> Vec<AssetHandle>;
    /// Whether `path` resolves to a file
    fn exists(&self, path: &str) -> bool;

    /// Add a search directory; higher priority is searched first
    fn add_search_path(&mut self, path: PathBuf, priority: i32);
    /// Remove a search directory
    fn remove_search_path(&mut self, path: &Path);
    /// Resolve a relative path against the search directories
    fn resolve_path(&self, relative: &str) -> Option<PathBuf>;

    /// Enable or disable hot reload
    fn set_hot_reload_enabled(&mut self, enabled: bool);
    /// Whether hot reload is enabled
    fn is_hot_reload_enabled(&self) -> bool;

    /// Number of loaded assets
    fn loaded_count(&self) -> usize;
    /// Bytes held by loaded assets
    fn memory_usage(&self) -> u64;
    /// Loader counters
    fn statistics(&self) -> AssetStatistics;
}

/// Priority-ordered list of asset directories
#[derive(Debug, Clone, Default)]
pub struct AssetSearchPaths {
    // Sorted by descending priority, insertion order within a priority
    entries: Vec<(PathBuf, i32)>,
}

impl AssetSearchPaths {
    /// Empty list
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a directory, replacing its priority if already present
    pub fn add(&mut self, path: PathBuf, priority: i32) {
        self.remove(&path);
        let position = self.entries.partition_point(|&(_, p)| p >= priority);
        debug!("Asset search path {} (priority {})", path.display(), priority);
        self.entries.insert(position, (path, priority));
    }

    /// Remove a directory, returning whether it was present
    pub fn remove(&mut self, path: &Path) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(p, _)| p != path);
        self.entries.len() != before
    }

    /// Directories in search order
    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        self.entries.iter().map(|(path, _)| path.as_path())
    }

    /// First existing `dir/relative` in search order
    ///
    /// Absolute paths are returned as-is when they exist.
    pub fn resolve(&self, relative: &str) -> Option<PathBuf> {
        let candidate = Path::new(relative);
        if candidate.is_absolute() {
            return candidate.exists().then(|| candidate.to_path_buf());
        }
        self.entries
            .iter()
            .map(|(dir, _)| dir.join(candidate))
            .find(|path| path.exists())
    }
}
