//! Core engine implementation
//!
//! The [`Engine`] owns the module manager, the service registry, the ECS
//! world and frame timing. Every frame it updates and then renders all
//! modules in registration order, handing each one an [`EngineContext`].

use crate::config::{Config, ConfigError};
use crate::core::config::ApplicationConfig;
use crate::ecs::{World, WorldError};
use crate::foundation::logging;
use crate::foundation::time::FrameClock;
use crate::module::{Module, ModuleCatalog, ModuleError, ModuleManager};
use crate::services::{ServiceError, ServiceRegistry};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Engine lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// Constructed, modules not started
    Uninitialized,
    /// Modules started, loop not running
    Initialized,
    /// Inside [`Engine::run`]
    Running,
    /// Loop exited; can run again
    Stopped,
    /// Modules shut down and released
    ShutDown,
}

/// Engine errors
#[derive(Debug, Error)]
pub enum EngineError {
    /// A module failed to start, so the loop must not run
    #[error("engine startup aborted: {0}")]
    ModuleInitialization(#[source] ModuleError),

    /// The operation is not allowed in the current state
    #[error("cannot {operation} while the engine is {state:?}")]
    InvalidState {
        /// Attempted operation
        operation: &'static str,
        /// State at the time
        state: EngineState,
    },

    /// Module lookup or lifecycle error
    #[error(transparent)]
    Module(#[from] ModuleError),

    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Service resolution error
    #[error(transparent)]
    Service(#[from] ServiceError),

    /// Entity or hierarchy error
    #[error(transparent)]
    World(#[from] WorldError),
}

/// Shared handle to the engine's running flag
///
/// Cloned into every [`EngineContext`]; may also be sent to other threads.
/// A stop request is observed at the next frame boundary.
#[derive(Debug, Clone, Default)]
pub struct EngineControl {
    running: Arc<AtomicBool>,
}

impl EngineControl {
    /// Ask the main loop to exit after the current frame
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Whether the main loop is running
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub(crate) fn set_running(&self, running: bool) {
        self.running.store(running, Ordering::SeqCst);
    }
}

/// Frame timing snapshot
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameTiming {
    /// Clamped duration of the current frame in seconds
    pub delta_time: f32,
    /// Sum of clamped frame durations
    pub total_time: f32,
    /// Frames run so far
    pub frame_count: u64,
}

impl From<&FrameClock> for FrameTiming {
    fn from(clock: &FrameClock) -> Self {
        Self {
            delta_time: clock.delta_time(),
            total_time: clock.total_time(),
            frame_count: clock.frame_count(),
        }
    }
}

/// What a module sees of the engine during a lifecycle call
pub struct EngineContext<'a> {
    /// Capability registry
    pub services: &'a mut ServiceRegistry,
    /// Shared ECS world
    pub world: &'a mut World,
    /// Application configuration
    pub config: &'a ApplicationConfig,
    /// Timing of the current frame
    pub timing: FrameTiming,
    /// Running flag
    pub control: EngineControl,
}

impl<'a> EngineContext<'a> {
    /// Assemble a context from its parts
    pub fn new(
        services: &'a mut ServiceRegistry,
        world: &'a mut World,
        config: &'a ApplicationConfig,
        timing: FrameTiming,
        control: EngineControl,
    ) -> Self {
        Self {
            services,
            world,
            config,
            timing,
            control,
        }
    }

    /// Clamped duration of the current frame
    pub fn delta_time(&self) -> f32 {
        self.timing.delta_time
    }

    /// Accumulated clamped time
    pub fn total_time(&self) -> f32 {
        self.timing.total_time
    }

    /// Frames run so far
    pub fn frame_count(&self) -> u64 {
        self.timing.frame_count
    }

    /// Running flag
    pub fn control(&self) -> &EngineControl {
        &self.control
    }
}

/// Main engine struct
///
/// The engine coordinates all modules and manages the main loop.
pub struct Engine {
    config: ApplicationConfig,
    modules: ModuleManager,
    services: ServiceRegistry,
    world: World,
    catalog: ModuleCatalog,
    clock: FrameClock,
    control: EngineControl,
    state: EngineState,
}

impl Engine {
    /// Create an engine with the given configuration
    pub fn new(config: ApplicationConfig) -> Self {
        let clock = FrameClock::new(config.engine.max_delta_time);
        Self {
            config,
            modules: ModuleManager::new(),
            services: ServiceRegistry::new(),
            world: World::new(),
            catalog: ModuleCatalog::new(),
            clock,
            control: EngineControl::default(),
            state: EngineState::Uninitialized,
        }
    }

    /// Register a module
    ///
    /// Once the engine is initialized, the module is started immediately.
    /// A shut down engine refuses new modules.
    pub fn register_module(&mut self, module: Box<dyn Module>) -> Result<(), EngineError> {
        if self.state == EngineState::ShutDown {
            return Err(self.invalid_state("register a module"));
        }

        let name = module.name().to_owned();
        self.modules.register(module)?;
        self.start_late_module(&name)
    }

    /// Load configuration and initialize all modules
    ///
    /// A configuration file that cannot be loaded or fails validation is
    /// logged and the current configuration is kept. A module failure aborts
    /// startup; modules started before it stay live until
    /// [`Engine::shutdown`].
    pub fn initialize(&mut self, config_path: Option<&Path>) -> Result<(), EngineError> {
        if self.state != EngineState::Uninitialized {
            return Err(self.invalid_state("initialize"));
        }

        if let Some(path) = config_path {
            match ApplicationConfig::load_from_file(path).and_then(|config| config.validate().map(|()| config)) {
                Ok(config) => {
                    log::info!("Loaded configuration from {}", path.display());
                    self.config = config;
                }
                Err(err) => log::warn!(
                    "Failed to load configuration from {}: {}; using defaults",
                    path.display(),
                    err
                ),
            }
        }

        logging::init_with_filter(&self.config.engine.log_level);
        self.clock.set_max_delta_time(self.config.engine.max_delta_time);

        log::info!("Initializing engine with {} module(s)...", self.modules.len());
        let (modules, mut ctx) = self.split();
        modules
            .initialize(&mut ctx)
            .map_err(EngineError::ModuleInitialization)?;

        self.clock.reset();
        self.state = EngineState::Initialized;
        log::info!("Engine initialized");
        Ok(())
    }

    /// Run the main loop until stopped
    ///
    /// Returns immediately if the loop is already running. The loop ends when
    /// [`EngineControl::stop`] is called or after `engine.max_frames` frames.
    pub fn run(&mut self) -> Result<(), EngineError> {
        if self.control.is_running() {
            log::warn!("Engine is already running");
            return Ok(());
        }
        if !matches!(self.state, EngineState::Initialized | EngineState::Stopped) {
            return Err(self.invalid_state("run"));
        }

        self.control.set_running(true);
        self.state = EngineState::Running;
        self.clock.reset();
        log::info!("Starting main loop...");

        let max_frames = self.config.engine.max_frames;
        while self.control.is_running() {
            let frame_start = Instant::now();
            let delta_time = self.clock.tick();
            self.run_frame(delta_time);

            if max_frames.is_some_and(|max| self.clock.frame_count() >= max) {
                log::debug!("Reached frame limit");
                self.control.stop();
            }
            if self.control.is_running() {
                self.pace(frame_start);
            }
        }

        self.state = EngineState::Stopped;
        log::info!(
            "Main loop stopped after {} frame(s), {:.3}s",
            self.clock.frame_count(),
            self.clock.total_time()
        );
        Ok(())
    }

    /// Run one frame with the measured, clamped delta
    pub fn tick(&mut self) -> Result<f32, EngineError> {
        self.ensure_started("tick")?;
        let delta_time = self.clock.tick();
        self.run_frame(delta_time);
        Ok(delta_time)
    }

    /// Run one frame with a caller-provided delta, clamped like a measured one
    pub fn step(&mut self, delta_time: f32) -> Result<f32, EngineError> {
        self.ensure_started("step")?;
        let delta_time = self.clock.advance(delta_time);
        self.run_frame(delta_time);
        Ok(delta_time)
    }

    /// Ask the main loop to exit after the current frame
    pub fn stop(&self) {
        if self.control.is_running() {
            log::info!("Engine stop requested");
        }
        self.control.stop();
    }

    /// Shut down and release every module in reverse registration order
    ///
    /// Idempotent; also called on drop.
    pub fn shutdown(&mut self) {
        if self.state == EngineState::ShutDown {
            return;
        }
        self.control.stop();

        log::info!("Shutting down engine...");
        let (modules, mut ctx) = self.split();
        modules.shutdown(&mut ctx);
        self.services.clear();

        self.state = EngineState::ShutDown;
        log::info!("Engine shutdown complete");
    }

    /// Call a module's reload hook
    pub fn reload_module(&mut self, name: &str) -> Result<(), EngineError> {
        let (modules, mut ctx) = self.split();
        modules.reload(name, &mut ctx)?;
        Ok(())
    }

    /// Create a module from the catalog and register it
    ///
    /// Once the engine is initialized, the module is started immediately; if
    /// that fails it is unloaded again.
    pub fn load_module(&mut self, name: &str) -> Result<(), EngineError> {
        if self.state == EngineState::ShutDown {
            return Err(self.invalid_state("load a module"));
        }

        let (module, destroy) = self.catalog.instantiate(name)?;
        let module_name = module.name().to_owned();
        if self.modules.contains(&module_name) {
            destroy(module);
            return Err(ModuleError::Duplicate(module_name).into());
        }

        self.modules.register_with_destroy(module, destroy)?;
        log::info!("Loaded module '{}'", module_name);
        self.start_late_module(&module_name)
    }

    /// Shut down and remove a module
    pub fn unload_module(&mut self, name: &str) -> Result<(), EngineError> {
        let (modules, mut ctx) = self.split();
        modules.unload(name, &mut ctx)?;
        Ok(())
    }

    /// Current lifecycle state
    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Whether the main loop is running
    pub fn is_running(&self) -> bool {
        self.control.is_running()
    }

    /// Clamped duration of the last frame
    pub fn delta_time(&self) -> f32 {
        self.clock.delta_time()
    }

    /// Accumulated clamped time since the loop started
    pub fn total_time(&self) -> f32 {
        self.clock.total_time()
    }

    /// Frames run since the loop started
    pub fn frame_count(&self) -> u64 {
        self.clock.frame_count()
    }

    /// Application configuration
    pub fn config(&self) -> &ApplicationConfig {
        &self.config
    }

    /// Service registry
    pub fn services(&self) -> &ServiceRegistry {
        &self.services
    }

    /// Service registry, mutably
    pub fn services_mut(&mut self) -> &mut ServiceRegistry {
        &mut self.services
    }

    /// ECS world
    pub fn world(&self) -> &World {
        &self.world
    }

    /// ECS world, mutably
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// Registered modules
    pub fn modules(&self) -> &ModuleManager {
        &self.modules
    }

    /// Handle to the running flag
    pub fn control(&self) -> EngineControl {
        self.control.clone()
    }

    /// Entry points available to [`Engine::load_module`]
    pub fn catalog(&self) -> &ModuleCatalog {
        &self.catalog
    }

    /// Entry points available to [`Engine::load_module`], mutably
    pub fn catalog_mut(&mut self) -> &mut ModuleCatalog {
        &mut self.catalog
    }

    fn run_frame(&mut self, delta_time: f32) {
        let (modules, mut ctx) = self.split();
        modules.update(&mut ctx, delta_time);
        modules.render(&mut ctx);
    }

    fn pace(&self, frame_start: Instant) {
        let sleep = match self.config.engine.target_fps {
            Some(fps) if fps > 0 => {
                Duration::from_secs_f64(1.0 / f64::from(fps)).saturating_sub(frame_start.elapsed())
            }
            _ => Duration::from_millis(self.config.engine.frame_sleep_ms),
        };
        if !sleep.is_zero() {
            std::thread::sleep(sleep);
        }
    }

    fn start_late_module(&mut self, name: &str) -> Result<(), EngineError> {
        if !matches!(
            self.state,
            EngineState::Initialized | EngineState::Running | EngineState::Stopped
        ) {
            return Ok(());
        }

        let (modules, mut ctx) = self.split();
        if let Err(err) = modules.initialize_module(name, &mut ctx) {
            if let Err(unload_err) = modules.unload(name, &mut ctx) {
                log::warn!("Could not unload '{}' after failed start: {}", name, unload_err);
            }
            return Err(EngineError::ModuleInitialization(err));
        }
        Ok(())
    }

    fn ensure_started(&self, operation: &'static str) -> Result<(), EngineError> {
        match self.state {
            EngineState::Initialized | EngineState::Running | EngineState::Stopped => Ok(()),
            _ => Err(self.invalid_state(operation)),
        }
    }

    fn invalid_state(&self, operation: &'static str) -> EngineError {
        EngineError::InvalidState {
            operation,
            state: self.state,
        }
    }

    fn split(&mut self) -> (&mut ModuleManager, EngineContext<'_>) {
        let timing = FrameTiming::from(&self.clock);
        let ctx = EngineContext::new(
            &mut self.services,
            &mut self.world,
            &self.config,
            timing,
            self.control.clone(),
        );
        (&mut self.modules, ctx)
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(ApplicationConfig::default())
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("state", &self.state)
            .field("modules", &self.modules)
            .field("services", &self.services)
            .field("frame_count", &self.clock.frame_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::EngineSettings;
    use crate::module::{ModuleEntryPoint, ModuleVersion};
    use approx::assert_relative_eq;
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::sync::atomic::AtomicUsize;

    #[derive(Default)]
    struct Calls {
        updates: u64,
        renders: u64,
        reloads: u32,
    }

    struct Probe {
        calls: Rc<RefCell<Calls>>,
        stop_at_frame: Option<u64>,
        initialized: bool,
    }

    impl Probe {
        fn boxed(calls: &Rc<RefCell<Calls>>, stop_at_frame: Option<u64>) -> Box<dyn Module> {
            Box::new(Self {
                calls: Rc::clone(calls),
                stop_at_frame,
                initialized: false,
            })
        }
    }

    impl Module for Probe {
        fn name(&self) -> &str {
            "probe"
        }

        fn version(&self) -> ModuleVersion {
            ModuleVersion::new(0, 1, 0)
        }

        fn initialize(&mut self, _ctx: &mut EngineContext<'_>) -> Result<(), ModuleError> {
            self.initialized = true;
            Ok(())
        }

        fn shutdown(&mut self, _ctx: &mut EngineContext<'_>) {
            self.initialized = false;
        }

        fn on_reload(&mut self, _ctx: &mut EngineContext<'_>) -> Result<(), ModuleError> {
            self.calls.borrow_mut().reloads += 1;
            Ok(())
        }

        fn update(&mut self, ctx: &mut EngineContext<'_>, _delta_time: f32) {
            self.calls.borrow_mut().updates += 1;
            if self.stop_at_frame == Some(ctx.frame_count()) {
                ctx.control().stop();
            }
        }

        fn render(&mut self, _ctx: &mut EngineContext<'_>) {
            self.calls.borrow_mut().renders += 1;
        }

        fn is_initialized(&self) -> bool {
            self.initialized
        }
    }

    fn fast_config() -> ApplicationConfig {
        ApplicationConfig::new().with_engine(EngineSettings::new().with_frame_sleep_ms(0))
    }

    #[test]
    fn test_run_requires_initialize() {
        let mut engine = Engine::new(fast_config());
        let result = engine.run();
        assert!(matches!(
            result,
            Err(EngineError::InvalidState {
                state: EngineState::Uninitialized,
                ..
            })
        ));
    }

    #[test]
    fn test_initialize_twice_is_rejected() {
        let mut engine = Engine::new(fast_config());
        engine.initialize(None).unwrap();
        assert!(matches!(engine.initialize(None), Err(EngineError::InvalidState { .. })));
    }

    #[test]
    fn test_run_while_running_returns_immediately() {
        let calls = Rc::new(RefCell::new(Calls::default()));
        let mut engine = Engine::new(fast_config());
        engine.register_module(Probe::boxed(&calls, None)).unwrap();
        engine.initialize(None).unwrap();

        // Simulate a loop that is already active
        engine.control.set_running(true);
        engine.run().unwrap();

        assert_eq!(engine.frame_count(), 0);
        assert_eq!(calls.borrow().updates, 0);
        assert_eq!(engine.state(), EngineState::Initialized);
        engine.control.set_running(false);
    }

    #[test]
    fn test_stop_during_frame_k_ends_after_frame_k() {
        let calls = Rc::new(RefCell::new(Calls::default()));
        let mut engine = Engine::new(fast_config());
        engine.register_module(Probe::boxed(&calls, Some(4))).unwrap();
        engine.initialize(None).unwrap();

        engine.run().unwrap();

        assert_eq!(engine.state(), EngineState::Stopped);
        assert_eq!(engine.frame_count(), 4);
        assert_eq!(calls.borrow().updates, 4);
        // The frame that requested the stop still renders
        assert_eq!(calls.borrow().renders, 4);
        assert!(!engine.is_running());
    }

    #[test]
    fn test_max_frames_ends_loop() {
        let config = ApplicationConfig::new()
            .with_engine(EngineSettings::new().with_frame_sleep_ms(0).with_max_frames(3));
        let mut engine = Engine::new(config);
        engine.initialize(None).unwrap();

        engine.run().unwrap();
        assert_eq!(engine.frame_count(), 3);

        // A stopped engine can run again
        engine.run().unwrap();
        assert_eq!(engine.frame_count(), 3);
        assert_eq!(engine.state(), EngineState::Stopped);
    }

    #[test]
    fn test_delta_time_is_clamped_after_stall() {
        let mut engine = Engine::new(fast_config());
        engine.initialize(None).unwrap();

        assert_relative_eq!(engine.step(5.0).unwrap(), 0.1);
        assert_relative_eq!(engine.delta_time(), 0.1);
        assert_relative_eq!(engine.step(-1.0).unwrap(), 0.0);
        assert_relative_eq!(engine.step(0.016).unwrap(), 0.016);
        assert_relative_eq!(engine.total_time(), 0.116, epsilon = 1e-6);
        assert_eq!(engine.frame_count(), 3);
    }

    #[test]
    fn test_tick_measures_small_delta() {
        let mut engine = Engine::new(fast_config());
        engine.initialize(None).unwrap();

        let delta_time = engine.tick().unwrap();
        assert!((0.0..=0.1).contains(&delta_time));
        assert_eq!(engine.frame_count(), 1);
    }

    #[test]
    fn test_step_before_initialize_is_rejected() {
        let mut engine = Engine::default();
        assert!(matches!(engine.step(0.016), Err(EngineError::InvalidState { .. })));
    }

    #[test]
    fn test_missing_config_keeps_defaults() {
        let mut engine = Engine::new(fast_config());
        engine
            .initialize(Some(Path::new("does/not/exist/engine.toml")))
            .unwrap();

        assert_eq!(engine.config(), &fast_config());
        assert_eq!(engine.state(), EngineState::Initialized);
    }

    #[test]
    fn test_config_file_is_loaded() {
        let path = std::env::temp_dir().join(format!("modular_engine_test_{}.toml", std::process::id()));
        std::fs::write(
            &path,
            "[engine]\nmax_delta_time = 0.05\nframe_sleep_ms = 0\n\n[window]\ntitle = \"From file\"\n",
        )
        .unwrap();

        let mut engine = Engine::default();
        engine.initialize(Some(&path)).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(engine.config().window.title, "From file");
        assert_relative_eq!(engine.step(1.0).unwrap(), 0.05);
    }

    #[test]
    fn test_reload_reaches_module_and_unknown_name_fails() {
        let calls = Rc::new(RefCell::new(Calls::default()));
        let mut engine = Engine::new(fast_config());
        engine.register_module(Probe::boxed(&calls, None)).unwrap();
        engine.initialize(None).unwrap();

        engine.reload_module("probe").unwrap();
        assert_eq!(calls.borrow().reloads, 1);

        let result = engine.reload_module("missing");
        assert!(matches!(result, Err(EngineError::Module(ModuleError::NotFound(_)))));
        assert_eq!(engine.modules().names(), vec!["probe"]);
    }

    static DESTROYED: AtomicUsize = AtomicUsize::new(0);

    struct Plugin {
        initialized: bool,
    }

    impl Module for Plugin {
        fn name(&self) -> &str {
            "plugin"
        }

        fn initialize(&mut self, _ctx: &mut EngineContext<'_>) -> Result<(), ModuleError> {
            self.initialized = true;
            Ok(())
        }

        fn shutdown(&mut self, _ctx: &mut EngineContext<'_>) {
            self.initialized = false;
        }

        fn is_initialized(&self) -> bool {
            self.initialized
        }
    }

    fn create_plugin() -> Box<dyn Module> {
        Box::new(Plugin { initialized: false })
    }

    fn destroy_plugin(module: Box<dyn Module>) {
        DESTROYED.fetch_add(1, Ordering::SeqCst);
        drop(module);
    }

    #[test]
    fn test_load_and_unload_module_from_catalog() {
        let mut engine = Engine::new(fast_config());
        engine
            .catalog_mut()
            .add(ModuleEntryPoint::new("plugin", create_plugin).with_destroy(destroy_plugin));
        engine.initialize(None).unwrap();

        engine.load_module("plugin").unwrap();
        assert!(engine.modules().get("plugin").unwrap().is_initialized());
        assert!(matches!(
            engine.load_module("plugin"),
            Err(EngineError::Module(ModuleError::Duplicate(_)))
        ));

        let before = DESTROYED.load(Ordering::SeqCst);
        engine.unload_module("plugin").unwrap();
        assert!(!engine.modules().contains("plugin"));
        assert!(DESTROYED.load(Ordering::SeqCst) > before);

        assert!(matches!(
            engine.load_module("unknown"),
            Err(EngineError::Module(ModuleError::NotFound(_)))
        ));
    }

    #[test]
    fn test_shutdown_is_idempotent() {
        let calls = Rc::new(RefCell::new(Calls::default()));
        let mut engine = Engine::new(fast_config());
        engine.register_module(Probe::boxed(&calls, None)).unwrap();
        engine.initialize(None).unwrap();

        engine.shutdown();
        engine.shutdown();

        assert_eq!(engine.state(), EngineState::ShutDown);
        assert!(engine.modules().is_empty());
        assert!(matches!(engine.run(), Err(EngineError::InvalidState { .. })));
    }

    #[test]
    fn test_control_handle_stops_from_another_thread() {
        let engine = Engine::new(fast_config());
        let control = engine.control();
        control.set_running(true);

        std::thread::spawn(move || control.stop()).join().unwrap();

        assert!(!engine.is_running());
    }
}
