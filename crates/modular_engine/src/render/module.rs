//! Renderer module
//!
//! Publishes a [`HeadlessRenderer`] as the `dyn Renderer` service, sized from
//! the `[window]` configuration section.

use super::api::Renderer;
use super::headless::HeadlessRenderer;
use crate::core::config::WindowConfig;
use crate::engine::EngineContext;
use crate::module::{Module, ModuleError, ModuleVersion};
use log::{debug, info, warn};

/// How the renderer service is installed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvideMode {
    /// Construct the renderer during module initialization
    Eager,
    /// Install a factory; the renderer is built on first lookup
    Lazy,
}

/// Module owning the renderer service
#[derive(Debug)]
pub struct RendererModule {
    mode: ProvideMode,
    initialized: bool,
}

impl RendererModule {
    /// Name the module registers under
    pub const NAME: &'static str = "renderer";

    /// Renderer constructed at initialization
    pub fn new() -> Self {
        Self {
            mode: ProvideMode::Eager,
            initialized: false,
        }
    }

    /// Renderer constructed on first use
    pub fn lazy() -> Self {
        Self {
            mode: ProvideMode::Lazy,
            initialized: false,
        }
    }

    /// How this module installs the service
    pub fn mode(&self) -> ProvideMode {
        self.mode
    }

    fn build(window: &WindowConfig) -> Box<dyn Renderer> {
        let mut renderer = HeadlessRenderer::new(window.title.clone(), window.width, window.height);
        renderer.set_vsync(window.vsync);
        Box::new(renderer)
    }
}

impl Default for RendererModule {
    fn default() -> Self {
        Self::new()
    }
}

impl Module for RendererModule {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn version(&self) -> ModuleVersion {
        ModuleVersion::new(1, 0, 0)
    }

    fn initialize(&mut self, ctx: &mut EngineContext<'_>) -> Result<(), ModuleError> {
        let window = ctx.config.window.clone();
        if window.width == 0 || window.height == 0 {
            return Err(ModuleError::InitializationFailed {
                module: Self::NAME.to_owned(),
                reason: format!("invalid window size {}x{}", window.width, window.height),
            });
        }

        let displaced = match self.mode {
            ProvideMode::Eager => ctx.services.provide::<dyn Renderer>(Self::build(&window)),
            ProvideMode::Lazy => ctx
                .services
                .provide_factory::<dyn Renderer, _>(move || Self::build(&window)),
        };
        if displaced.is_some() {
            warn!("Renderer module replaced an existing renderer service");
        }

        info!("Renderer ready ({:?})", self.mode);
        self.initialized = true;
        Ok(())
    }

    fn shutdown(&mut self, ctx: &mut EngineContext<'_>) {
        // Withdrawing also clears a factory that never fired
        if let Some(renderer) = ctx.services.withdraw::<dyn Renderer>() {
            debug!("Renderer released after {} draw calls", renderer.statistics().draw_calls);
        }
        self.initialized = false;
    }

    fn on_reload(&mut self, ctx: &mut EngineContext<'_>) -> Result<(), ModuleError> {
        let window = &ctx.config.window;
        if let Some(renderer) = ctx.services.try_get_mut::<dyn Renderer>() {
            renderer.set_window_title(&window.title);
            renderer.set_window_size(window.width, window.height);
            renderer.set_vsync(window.vsync);
        }
        Ok(())
    }

    fn update(&mut self, ctx: &mut EngineContext<'_>, _delta_time: f32) {
        let close_requested = ctx
            .services
            .try_get::<dyn Renderer>()
            .is_some_and(|renderer| renderer.should_close());
        if close_requested && ctx.control.is_running() {
            info!("Window closed, stopping engine");
            ctx.control.stop();
        }
    }

    fn is_initialized(&self) -> bool {
        self.initialized
    }
}
