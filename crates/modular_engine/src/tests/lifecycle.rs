//! Module lifecycle ordering and failure handling

use crate::core::{ApplicationConfig, EngineSettings};
use crate::module::{Module, ModuleError, ModuleManager};
use crate::{Engine, EngineContext, EngineError, EngineState};
use std::cell::RefCell;
use std::rc::Rc;

type Log = Rc<RefCell<Vec<String>>>;

/// Module that records every lifecycle call as `"<call>:<name>"`
struct Recording {
    name: &'static str,
    log: Log,
    fail_init: bool,
    dependencies: Vec<String>,
    initialized: bool,
}

impl Recording {
    fn new(name: &'static str, log: &Log) -> Self {
        Self {
            name,
            log: Rc::clone(log),
            fail_init: false,
            dependencies: Vec::new(),
            initialized: false,
        }
    }

    fn failing(mut self) -> Self {
        self.fail_init = true;
        self
    }

    fn depends_on(mut self, dependency: &str) -> Self {
        self.dependencies.push(dependency.to_owned());
        self
    }

    fn boxed(self) -> Box<dyn Module> {
        Box::new(self)
    }

    fn record(&self, call: &str) {
        self.log.borrow_mut().push(format!("{}:{}", call, self.name));
    }
}

impl Module for Recording {
    fn name(&self) -> &str {
        self.name
    }

    fn dependencies(&self) -> Vec<String> {
        self.dependencies.clone()
    }

    fn initialize(&mut self, _ctx: &mut EngineContext<'_>) -> Result<(), ModuleError> {
        self.record("init");
        if self.fail_init {
            return Err(ModuleError::InitializationFailed {
                module: self.name.to_owned(),
                reason: "refused".to_owned(),
            });
        }
        self.initialized = true;
        Ok(())
    }

    fn shutdown(&mut self, _ctx: &mut EngineContext<'_>) {
        self.record("shutdown");
        self.initialized = false;
    }

    fn update(&mut self, _ctx: &mut EngineContext<'_>, _delta_time: f32) {
        self.record("update");
    }

    fn render(&mut self, _ctx: &mut EngineContext<'_>) {
        self.record("render");
    }

    fn is_initialized(&self) -> bool {
        self.initialized
    }
}

fn new_log() -> Log {
    Rc::new(RefCell::new(Vec::new()))
}

fn quiet_engine() -> Engine {
    Engine::new(ApplicationConfig::new().with_engine(EngineSettings::new().with_frame_sleep_ms(0)))
}

fn entries(log: &Log) -> Vec<String> {
    log.borrow().clone()
}

#[test]
fn test_two_modules_follow_registration_order() {
    let log = new_log();
    let mut engine = quiet_engine();
    engine.register_module(Recording::new("a", &log).boxed()).unwrap();
    engine.register_module(Recording::new("b", &log).boxed()).unwrap();

    engine.initialize(None).unwrap();
    engine.step(0.016).unwrap();
    engine.shutdown();

    assert_eq!(
        entries(&log),
        vec![
            "init:a",
            "init:b",
            "update:a",
            "update:b",
            "render:a",
            "render:b",
            "shutdown:b",
            "shutdown:a"
        ]
    );
}

#[test]
fn test_shutdown_runs_in_reverse_for_many_modules() {
    const NAMES: [&str; 5] = ["m0", "m1", "m2", "m3", "m4"];
    let log = new_log();
    let mut engine = quiet_engine();
    for name in NAMES {
        engine.register_module(Recording::new(name, &log).boxed()).unwrap();
    }
    engine.initialize(None).unwrap();
    log.borrow_mut().clear();

    engine.shutdown();

    let expected: Vec<String> = NAMES.iter().rev().map(|name| format!("shutdown:{}", name)).collect();
    assert_eq!(entries(&log), expected);
    assert!(engine.modules().is_empty());
    assert_eq!(engine.state(), EngineState::ShutDown);
}

#[test]
fn test_failed_initialization_stops_sequence_and_still_shuts_down() {
    let log = new_log();
    let mut engine = quiet_engine();
    engine.register_module(Recording::new("first", &log).boxed()).unwrap();
    engine.register_module(Recording::new("second", &log).failing().boxed()).unwrap();
    engine.register_module(Recording::new("third", &log).boxed()).unwrap();

    let result = engine.initialize(None);
    match result {
        Err(EngineError::ModuleInitialization(ModuleError::InitializationFailed { module, .. })) => {
            assert_eq!(module, "second");
        }
        other => panic!("unexpected result: {:?}", other),
    }
    assert_eq!(entries(&log), vec!["init:first", "init:second"]);
    assert_eq!(engine.state(), EngineState::Uninitialized);
    assert!(engine.run().is_err());

    log.borrow_mut().clear();
    engine.shutdown();
    assert_eq!(
        entries(&log),
        vec!["shutdown:third", "shutdown:second", "shutdown:first"]
    );
}

#[test]
fn test_duplicate_name_is_rejected() {
    let log = new_log();
    let mut engine = quiet_engine();
    engine.register_module(Recording::new("dup", &log).boxed()).unwrap();

    let result = engine.register_module(Recording::new("dup", &log).boxed());

    assert!(matches!(result, Err(EngineError::Module(ModuleError::Duplicate(name))) if name == "dup"));
    assert_eq!(engine.modules().len(), 1);
}

#[test]
fn test_module_registered_after_initialize_starts_immediately() {
    let log = new_log();
    let mut engine = quiet_engine();
    engine.initialize(None).unwrap();

    engine.register_module(Recording::new("late", &log).boxed()).unwrap();
    assert_eq!(entries(&log), vec!["init:late"]);

    let result = engine.register_module(Recording::new("broken", &log).failing().boxed());
    assert!(matches!(result, Err(EngineError::ModuleInitialization(_))));
    assert!(!engine.modules().contains("broken"));
    assert_eq!(engine.modules().names(), vec!["late"]);
}

#[test]
fn test_dependency_order_is_reported_not_enforced() {
    let log = new_log();
    let mut manager = ModuleManager::new();
    manager
        .register(Recording::new("physics", &log).depends_on("assets").boxed())
        .unwrap();
    manager.register(Recording::new("assets", &log).boxed()).unwrap();
    manager
        .register(Recording::new("render", &log).depends_on("assets").boxed())
        .unwrap();

    assert_eq!(
        manager.missing_dependencies(),
        vec![("physics".to_owned(), "assets".to_owned())]
    );
}

#[test]
fn test_unload_shuts_down_only_that_module() {
    let log = new_log();
    let mut engine = quiet_engine();
    engine.register_module(Recording::new("keep", &log).boxed()).unwrap();
    engine.register_module(Recording::new("drop", &log).boxed()).unwrap();
    engine.initialize(None).unwrap();
    log.borrow_mut().clear();

    engine.unload_module("drop").unwrap();
    engine.step(0.016).unwrap();

    assert_eq!(entries(&log), vec!["shutdown:drop", "update:keep", "render:keep"]);
    assert!(matches!(
        engine.unload_module("drop"),
        Err(EngineError::Module(ModuleError::NotFound(_)))
    ));
}

#[test]
fn test_registration_after_shutdown_is_refused() {
    let log = new_log();
    let mut engine = quiet_engine();
    engine.initialize(None).unwrap();
    engine.shutdown();

    let result = engine.register_module(Recording::new("late", &log).boxed());

    assert!(matches!(
        result,
        Err(EngineError::InvalidState {
            state: EngineState::ShutDown,
            ..
        })
    ));
    assert!(engine.modules().is_empty());
    assert!(entries(&log).is_empty());
}
