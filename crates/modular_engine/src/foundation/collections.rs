//! Specialized collection types
//!
//! [`HandleArena`] is the arena+index store subsystems use for resources they
//! own (meshes, bodies, audio voices). Components only ever hold the typed
//! [`Handle`], never a reference into the arena.

use slotmap::{DefaultKey, Key, KeyData, SlotMap};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// Typed handle to a value stored in a [`HandleArena`]
///
/// Wraps the arena's slotmap key in its FFI form. Slotmap never issues a key
/// whose FFI value is `0`, so `0` is reserved as the invalid sentinel:
/// creation paths that fail return [`Handle::INVALID`] instead of an error,
/// and callers check [`Handle::is_valid`] before use.
pub struct Handle<T> {
    raw: u64,
    _phantom: PhantomData<fn() -> T>,
}

impl<T> Handle<T> {
    /// Sentinel handle that never refers to a live value
    pub const INVALID: Self = Self::from_raw(0);

    fn from_key(key: DefaultKey) -> Self {
        Self::from_raw(key.data().as_ffi())
    }

    /// Slotmap key behind this handle, `None` for the invalid sentinel
    pub fn key(&self) -> Option<DefaultKey> {
        self.is_valid().then(|| KeyData::from_ffi(self.raw).into())
    }

    /// Whether this is anything other than the invalid sentinel
    pub const fn is_valid(&self) -> bool {
        self.raw != 0
    }

    /// Pack into a single integer, `0` for the invalid handle
    pub const fn to_raw(&self) -> u64 {
        self.raw
    }

    /// Rebuild a handle from [`Handle::to_raw`]
    pub const fn from_raw(raw: u64) -> Self {
        Self {
            raw,
            _phantom: PhantomData,
        }
    }

    /// Reinterpret as a handle of another resource type
    ///
    /// Backends use this to map the public handle types onto the arenas
    /// that hold their own resource records.
    pub const fn cast<U>(self) -> Handle<U> {
        Handle::from_raw(self.raw)
    }
}

// Manual impls: derives would put bounds on `T`
impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl<T> Eq for Handle<T> {}

impl<T> Hash for Handle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
    }
}

impl<T> Default for Handle<T> {
    fn default() -> Self {
        Self::INVALID
    }
}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.key() {
            Some(key) => write!(f, "Handle({:?})", key.data()),
            None => f.write_str("Handle(invalid)"),
        }
    }
}

/// Arena storing values behind typed handles
///
/// Backed by a [`SlotMap`], so a stale handle never resolves to the value
/// that replaced it in a reused slot.
pub struct HandleArena<T> {
    values: SlotMap<DefaultKey, T>,
}

impl<T> HandleArena<T> {
    /// Create an empty arena
    pub fn new() -> Self {
        Self {
            values: SlotMap::new(),
        }
    }

    /// Insert a value and return its handle
    pub fn insert(&mut self, value: T) -> Handle<T> {
        Handle::from_key(self.values.insert(value))
    }

    /// Remove the value behind `handle`, if it is still live
    pub fn remove(&mut self, handle: Handle<T>) -> Option<T> {
        self.values.remove(handle.key()?)
    }

    /// Get a value by handle
    pub fn get(&self, handle: Handle<T>) -> Option<&T> {
        self.values.get(handle.key()?)
    }

    /// Get a mutable value by handle
    pub fn get_mut(&mut self, handle: Handle<T>) -> Option<&mut T> {
        self.values.get_mut(handle.key()?)
    }

    /// Whether `handle` refers to a live value
    pub fn contains(&self, handle: Handle<T>) -> bool {
        handle.key().map_or(false, |key| self.values.contains_key(key))
    }

    /// Number of live values
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the arena holds no live values
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over live values with their handles
    pub fn iter(&self) -> impl Iterator<Item = (Handle<T>, &T)> {
        self.values.iter().map(|(key, value)| (Handle::from_key(key), value))
    }

    /// Drop every value; outstanding handles become stale
    pub fn clear(&mut self) {
        self.values.clear();
    }
}

impl<T: fmt::Debug> fmt::Debug for HandleArena<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<T> Default for HandleArena<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_handle_is_zero() {
        let handle: Handle<u8> = Handle::INVALID;
        assert!(!handle.is_valid());
        assert_eq!(handle.to_raw(), 0);
        assert_eq!(handle.key(), None);
        assert_eq!(Handle::<u8>::default(), handle);
    }

    #[test]
    fn test_first_handle_is_valid_and_resolves() {
        let mut arena = HandleArena::new();
        let handle = arena.insert("mesh");

        assert!(handle.is_valid());
        assert_ne!(handle.to_raw(), 0);
        assert_eq!(arena.get(handle), Some(&"mesh"));
        assert_eq!(arena.len(), 1);
    }

    #[test]
    fn test_invalid_handle_never_resolves_in_populated_arena() {
        let mut arena = HandleArena::new();
        for value in 0..8 {
            arena.insert(value);
        }

        assert!(arena.iter().all(|(handle, _)| handle.is_valid()));
        assert!(!arena.contains(Handle::INVALID));
        assert_eq!(arena.get(Handle::INVALID), None);
        assert_eq!(arena.remove(Handle::INVALID), None);
        assert_eq!(arena.len(), 8);
    }

    #[test]
    fn test_stale_handle_does_not_alias_reused_slot() {
        let mut arena = HandleArena::new();
        let first = arena.insert(1);
        assert_eq!(arena.remove(first), Some(1));

        let second = arena.insert(2);
        assert_ne!(first, second);
        assert_eq!(arena.get(first), None);
        assert_eq!(arena.get(second), Some(&2));
        assert_eq!(arena.remove(first), None);
        assert_eq!(arena.len(), 1);
    }

    #[test]
    fn test_raw_roundtrip_resolves_same_value() {
        let mut arena = HandleArena::new();
        let handle = arena.insert('x');
        let restored = Handle::<char>::from_raw(handle.to_raw());

        assert_eq!(restored, handle);
        assert_eq!(arena.get(restored), Some(&'x'));
    }

    #[test]
    fn test_cast_keeps_the_key() {
        let mut arena = HandleArena::new();
        let handle = arena.insert(5u32);
        let other: Handle<String> = handle.cast();

        assert_eq!(other.to_raw(), handle.to_raw());
        assert_eq!(arena.get(other.cast()), Some(&5));
        assert!(!Handle::<u32>::INVALID.cast::<String>().is_valid());
    }

    #[test]
    fn test_clear_invalidates_everything() {
        let mut arena = HandleArena::new();
        let a = arena.insert('a');
        let b = arena.insert('b');
        arena.clear();

        assert!(arena.is_empty());
        assert!(!arena.contains(a));
        assert!(!arena.contains(b));
        assert_eq!(arena.iter().count(), 0);
    }
}
