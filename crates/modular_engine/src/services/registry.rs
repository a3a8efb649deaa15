//! Generic per-capability service registry
//!
//! A capability is identified by its type, usually a trait object such as
//! `dyn Renderer`. Each capability has one slot holding either a live
//! instance, a factory that builds the instance on first use, or nothing.

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// Deferred constructor stored in a slot until the first `get`
type Factory<T> = Box<dyn FnOnce() -> Box<T>>;

/// Service lookup errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// Neither an instance nor a factory was provided for the capability
    #[error("Service unavailable: no provider or factory registered for `{service}`")]
    Unavailable {
        /// Type name of the requested capability
        service: &'static str,
    },
}

struct ServiceSlot {
    name: &'static str,
    /// Erased `Box<T>`
    instance: Option<Box<dyn Any>>,
    /// Erased `Factory<T>`
    factory: Option<Box<dyn Any>>,
}

impl ServiceSlot {
    fn new<T: ?Sized + 'static>() -> Self {
        Self {
            name: type_name::<T>(),
            instance: None,
            factory: None,
        }
    }

    fn is_occupied(&self) -> bool {
        self.instance.is_some() || self.factory.is_some()
    }
}

/// Registry holding at most one active provider per capability
///
/// The registry is owned by the [`Engine`](crate::Engine) and reached by
/// modules through their [`EngineContext`](crate::EngineContext). Access is
/// serialized by the frame loop, so there is no internal locking.
#[derive(Default)]
pub struct ServiceRegistry {
    slots: HashMap<TypeId, ServiceSlot>,
}

impl ServiceRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Install an owned instance for capability `T`
    ///
    /// Any pending factory is discarded. A previously held instance is handed
    /// back to the caller instead of being dropped.
    pub fn provide<T: ?Sized + 'static>(&mut self, service: Box<T>) -> Option<Box<T>> {
        let slot = self.slot_mut::<T>();
        slot.factory = None;
        let previous = slot.instance.replace(Box::new(service));
        log::debug!("Service provided: {}", type_name::<T>());
        previous.and_then(unwrap_instance::<T>)
    }

    /// Install a factory that builds capability `T` on first [`get`](Self::get)
    ///
    /// Nothing is constructed here. A previously held instance is handed back
    /// to the caller so the factory's product becomes the only provider.
    pub fn provide_factory<T, F>(&mut self, factory: F) -> Option<Box<T>>
    where
        T: ?Sized + 'static,
        F: FnOnce() -> Box<T> + 'static,
    {
        let slot = self.slot_mut::<T>();
        let factory: Factory<T> = Box::new(factory);
        slot.factory = Some(Box::new(factory));
        let previous = slot.instance.take();
        log::debug!("Service factory provided: {}", type_name::<T>());
        previous.and_then(unwrap_instance::<T>)
    }

    /// Resolve capability `T`, running its factory if this is the first access
    ///
    /// A missing provider is a wiring bug, so it is logged at error level as
    /// well as returned.
    pub fn get<T: ?Sized + 'static>(&mut self) -> Result<&mut T, ServiceError> {
        let Some(slot) = self.slots.get_mut(&TypeId::of::<T>()) else {
            return Err(unavailable::<T>());
        };

        if slot.instance.is_none() {
            let factory = slot
                .factory
                .take()
                .and_then(|erased| erased.downcast::<Factory<T>>().ok());
            let Some(factory) = factory else {
                return Err(unavailable::<T>());
            };
            log::debug!("Constructing service {} from factory", slot.name);
            let instance: Box<T> = (*factory)();
            slot.instance = Some(Box::new(instance));
        }

        slot.instance
            .as_mut()
            .and_then(|erased| erased.downcast_mut::<Box<T>>())
            .map(|boxed| &mut **boxed)
            .ok_or_else(unavailable::<T>)
    }

    /// Borrow capability `T` only if it has already been constructed
    pub fn try_get<T: ?Sized + 'static>(&self) -> Option<&T> {
        self.slots
            .get(&TypeId::of::<T>())?
            .instance
            .as_ref()?
            .downcast_ref::<Box<T>>()
            .map(|boxed| &**boxed)
    }

    /// Mutably borrow capability `T` only if it has already been constructed
    pub fn try_get_mut<T: ?Sized + 'static>(&mut self) -> Option<&mut T> {
        self.slots
            .get_mut(&TypeId::of::<T>())?
            .instance
            .as_mut()?
            .downcast_mut::<Box<T>>()
            .map(|boxed| &mut **boxed)
    }

    /// Whether an instance of `T` exists right now
    ///
    /// Never runs a pending factory: a probe must not construct services as
    /// a side effect.
    pub fn is_available<T: ?Sized + 'static>(&self) -> bool {
        self.try_get::<T>().is_some()
    }

    /// Whether `T` has a factory that has not fired yet
    pub fn has_factory<T: ?Sized + 'static>(&self) -> bool {
        self.slots
            .get(&TypeId::of::<T>())
            .is_some_and(|slot| slot.factory.is_some())
    }

    /// Drop the instance of `T` and forget its factory
    pub fn reset<T: ?Sized + 'static>(&mut self) {
        if let Some(slot) = self.slots.remove(&TypeId::of::<T>()) {
            log::debug!("Service reset: {}", slot.name);
        }
    }

    /// Take the instance of `T` back out of the registry without dropping it
    ///
    /// The slot is cleared, including any factory.
    pub fn withdraw<T: ?Sized + 'static>(&mut self) -> Option<Box<T>> {
        let slot = self.slots.remove(&TypeId::of::<T>())?;
        log::debug!("Service withdrawn: {}", slot.name);
        slot.instance.and_then(unwrap_instance::<T>)
    }

    /// Drop every instance and factory
    pub fn clear(&mut self) {
        if !self.slots.is_empty() {
            log::debug!("Clearing {} service slot(s)", self.slots.len());
        }
        self.slots.clear();
    }

    /// Number of capabilities with an instance or a pending factory
    pub fn len(&self) -> usize {
        self.slots.values().filter(|slot| slot.is_occupied()).count()
    }

    /// Whether no capability has a provider
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn slot_mut<T: ?Sized + 'static>(&mut self) -> &mut ServiceSlot {
        self.slots
            .entry(TypeId::of::<T>())
            .or_insert_with(ServiceSlot::new::<T>)
    }
}

impl fmt::Debug for ServiceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self
            .slots
            .values()
            .map(|slot| (slot.name, slot.instance.is_some()))
            .collect();
        names.sort_unstable();
        f.debug_struct("ServiceRegistry").field("services", &names).finish()
    }
}

fn unwrap_instance<T: ?Sized + 'static>(erased: Box<dyn Any>) -> Option<Box<T>> {
    erased.downcast::<Box<T>>().ok().map(|boxed| *boxed)
}

fn unavailable<T: ?Sized + 'static>() -> ServiceError {
    let service = type_name::<T>();
    log::error!("Requested service `{}` is not available", service);
    ServiceError::Unavailable { service }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    trait Greeter {
        fn greet(&self) -> String;
        fn rename(&mut self, name: &str);
    }

    struct English {
        name: String,
    }

    impl Greeter for English {
        fn greet(&self) -> String {
            format!("hello {}", self.name)
        }

        fn rename(&mut self, name: &str) {
            self.name = name.to_string();
        }
    }

    struct DropProbe(Rc<Cell<u32>>);

    impl Drop for DropProbe {
        fn drop(&mut self) {
            self.0.set(self.0.get() + 1);
        }
    }

    #[test]
    fn test_get_without_provider_fails() {
        let mut registry = ServiceRegistry::new();

        let result = registry.get::<dyn Greeter>();

        assert!(matches!(result, Err(ServiceError::Unavailable { .. })));
        assert!(!registry.is_available::<dyn Greeter>());
    }

    #[test]
    fn test_provided_instance_is_returned_by_identity() {
        let mut registry = ServiceRegistry::new();
        let service: Box<dyn Greeter> = Box::new(English { name: "world".into() });
        let original = (&*service as *const dyn Greeter).cast::<()>();

        assert!(registry.provide(service).is_none());

        let first = (registry.get::<dyn Greeter>().unwrap() as *const dyn Greeter).cast::<()>();
        let second = (registry.get::<dyn Greeter>().unwrap() as *const dyn Greeter).cast::<()>();
        assert_eq!(original, first);
        assert_eq!(first, second);
    }

    #[test]
    fn test_mutation_through_get_is_visible_later() {
        let mut registry = ServiceRegistry::new();
        registry.provide::<dyn Greeter>(Box::new(English { name: "a".into() }));

        registry.get::<dyn Greeter>().unwrap().rename("b");

        assert_eq!(registry.try_get::<dyn Greeter>().unwrap().greet(), "hello b");
    }

    #[test]
    fn test_factory_runs_once_and_lazily() {
        let mut registry = ServiceRegistry::new();
        let constructed = Rc::new(Cell::new(0));
        let counter = Rc::clone(&constructed);

        registry.provide_factory::<dyn Greeter, _>(move || {
            counter.set(counter.get() + 1);
            Box::new(English { name: "lazy".into() })
        });

        assert_eq!(constructed.get(), 0);
        assert!(!registry.is_available::<dyn Greeter>());
        assert!(registry.has_factory::<dyn Greeter>());
        assert_eq!(constructed.get(), 0, "probing must not construct");

        let first = (registry.get::<dyn Greeter>().unwrap() as *const dyn Greeter).cast::<()>();
        let second = (registry.get::<dyn Greeter>().unwrap() as *const dyn Greeter).cast::<()>();

        assert_eq!(constructed.get(), 1);
        assert_eq!(first, second);
        assert!(registry.is_available::<dyn Greeter>());
        assert!(!registry.has_factory::<dyn Greeter>());
    }

    #[test]
    fn test_reset_drops_instance_and_get_fails_again() {
        let mut registry = ServiceRegistry::new();
        let drops = Rc::new(Cell::new(0));
        registry.provide(Box::new(DropProbe(Rc::clone(&drops))));

        registry.reset::<DropProbe>();

        assert_eq!(drops.get(), 1);
        assert!(registry.get::<DropProbe>().is_err());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_reset_clears_pending_factory() {
        let mut registry = ServiceRegistry::new();
        registry.provide_factory::<dyn Greeter, _>(|| Box::new(English { name: "x".into() }));

        registry.reset::<dyn Greeter>();

        assert!(registry.get::<dyn Greeter>().is_err());
    }

    #[test]
    fn test_provide_hands_back_previous_instance_without_dropping() {
        let mut registry = ServiceRegistry::new();
        let drops = Rc::new(Cell::new(0));
        registry.provide(Box::new(DropProbe(Rc::clone(&drops))));

        let previous = registry.provide(Box::new(DropProbe(Rc::clone(&drops))));

        assert!(previous.is_some());
        assert_eq!(drops.get(), 0);
        drop(previous);
        assert_eq!(drops.get(), 1);
    }

    #[test]
    fn test_instance_supersedes_factory() {
        let mut registry = ServiceRegistry::new();
        let constructed = Rc::new(Cell::new(0));
        let counter = Rc::clone(&constructed);
        registry.provide_factory::<dyn Greeter, _>(move || {
            counter.set(counter.get() + 1);
            Box::new(English { name: "factory".into() })
        });

        registry.provide::<dyn Greeter>(Box::new(English { name: "direct".into() }));

        assert_eq!(registry.get::<dyn Greeter>().unwrap().greet(), "hello direct");
        assert_eq!(constructed.get(), 0);
    }

    #[test]
    fn test_factory_displaces_existing_instance() {
        let mut registry = ServiceRegistry::new();
        registry.provide::<dyn Greeter>(Box::new(English { name: "old".into() }));

        let displaced = registry.provide_factory::<dyn Greeter, _>(|| Box::new(English { name: "new".into() }));

        assert_eq!(displaced.map(|old| old.greet()), Some("hello old".to_string()));
        assert!(!registry.is_available::<dyn Greeter>());
        assert_eq!(registry.get::<dyn Greeter>().unwrap().greet(), "hello new");
    }

    #[test]
    fn test_withdraw_returns_ownership() {
        let mut registry = ServiceRegistry::new();
        registry.provide::<dyn Greeter>(Box::new(English { name: "kept".into() }));

        let withdrawn = registry.withdraw::<dyn Greeter>();

        assert_eq!(withdrawn.map(|service| service.greet()), Some("hello kept".to_string()));
        assert!(registry.get::<dyn Greeter>().is_err());
    }

    #[test]
    fn test_capabilities_have_independent_slots() {
        let mut registry = ServiceRegistry::new();
        registry.provide::<dyn Greeter>(Box::new(English { name: "trait".into() }));
        registry.provide(Box::new(42_u32));

        registry.reset::<u32>();

        assert!(registry.is_available::<dyn Greeter>());
        assert!(!registry.is_available::<u32>());
        assert_eq!(registry.len(), 1);
    }
}
