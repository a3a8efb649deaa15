//! # Unified Configuration System
//!
//! Configuration structures for the engine core, the window the renderer
//! module should open, and free-form per-module sections.
//!
//! ## Configuration Categories
//!
//! - **Engine Settings**: frame timing, pacing, log level
//! - **Window Config**: title, size and vsync handed to the renderer module
//! - **Module Sections**: one table per module name, read by the module itself

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub use crate::config::{Config, ConfigError, ConfigFormat};
use crate::foundation::time::DEFAULT_MAX_DELTA_TIME;

/// Free-form settings table for one module
pub type ModuleSection = toml::Table;

/// # Engine Settings
///
/// Core loop behavior: delta clamping, frame pacing and logging.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Default log filter (overridden by `RUST_LOG`)
    pub log_level: String,
    /// Upper bound for one frame's delta time in seconds
    pub max_delta_time: f32,
    /// Sleep between frames when no target FPS is set, in milliseconds
    pub frame_sleep_ms: u64,
    /// Target FPS for frame rate limiting
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_fps: Option<u32>,
    /// Stop the loop on its own after this many frames
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_frames: Option<u64>,
}

impl EngineSettings {
    /// Create engine settings with defaults
    pub fn new() -> Self {
        Self {
            log_level: "info".to_string(),
            max_delta_time: DEFAULT_MAX_DELTA_TIME,
            frame_sleep_ms: 1,
            target_fps: None,
            max_frames: None,
        }
    }

    /// Set log level
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Set the delta time clamp
    pub fn with_max_delta_time(mut self, seconds: f32) -> Self {
        self.max_delta_time = seconds;
        self
    }

    /// Set the idle sleep between frames
    pub fn with_frame_sleep_ms(mut self, millis: u64) -> Self {
        self.frame_sleep_ms = millis;
        self
    }

    /// Set target FPS
    pub fn with_target_fps(mut self, fps: u32) -> Self {
        self.target_fps = Some(fps);
        self
    }

    /// Stop the loop after `frames` iterations
    pub fn with_max_frames(mut self, frames: u64) -> Self {
        self.max_frames = Some(frames);
        self
    }

    /// Validate the settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.max_delta_time.is_finite() || self.max_delta_time <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "max_delta_time must be a positive number, got {}",
                self.max_delta_time
            )));
        }
        if self.target_fps == Some(0) {
            return Err(ConfigError::Invalid("target_fps must be at least 1".to_string()));
        }
        Ok(())
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self::new()
    }
}

/// # Window Configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Window title
    pub title: String,
    /// Window width
    pub width: u32,
    /// Window height
    pub height: u32,
    /// VSync setting
    pub vsync: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Modular Engine Application".to_string(),
            width: 1280,
            height: 720,
            vsync: true,
        }
    }
}

/// # Complete Application Configuration
///
/// Top-level document loaded by [`crate::Engine::initialize`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationConfig {
    /// Engine core configuration
    pub engine: EngineSettings,
    /// Window handed to the renderer module
    pub window: WindowConfig,
    /// Per-module settings keyed by module name
    pub modules: BTreeMap<String, ModuleSection>,
}

impl ApplicationConfig {
    /// Create a new application configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the engine settings
    pub fn with_engine(mut self, engine: EngineSettings) -> Self {
        self.engine = engine;
        self
    }

    /// Replace the window configuration
    pub fn with_window(mut self, window: WindowConfig) -> Self {
        self.window = window;
        self
    }

    /// Settings section for one module, if the document has one
    pub fn module_section(&self, module_name: &str) -> Option<&ModuleSection> {
        self.modules.get(module_name)
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.engine.validate()?;
        if self.window.width == 0 || self.window.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "window size must be non-zero, got {}x{}",
                self.window.width, self.window.height
            )));
        }
        Ok(())
    }
}

impl Config for ApplicationConfig {}
