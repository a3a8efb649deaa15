//! Dense component storage
//!
//! Each component type lives in its own [`ComponentStorage`]: rows are packed
//! in a `Vec`, a parallel `Vec` records which entity owns each row, and a
//! sparse index maps entities back to rows. Removal swaps the last row into
//! the hole so iteration always walks contiguous memory.

use super::{Component, Entity};
use slotmap::SecondaryMap;
use std::any::{type_name, Any};

/// Dense table of one component type
pub struct ComponentStorage<T: Component> {
    rows: Vec<T>,
    owners: Vec<Entity>,
    index: SecondaryMap<Entity, usize>,
}

impl<T: Component> ComponentStorage<T> {
    /// Create an empty table
    pub fn new() -> Self {
        Self {
            rows: Vec::new(),
            owners: Vec::new(),
            index: SecondaryMap::new(),
        }
    }

    /// Insert or replace the row for `entity`, returning the replaced value
    pub fn insert(&mut self, entity: Entity, component: T) -> Option<T> {
        if let Some(&row) = self.index.get(entity) {
            return Some(std::mem::replace(&mut self.rows[row], component));
        }

        self.index.insert(entity, self.rows.len());
        self.rows.push(component);
        self.owners.push(entity);
        None
    }

    /// Get the row for `entity`, inserting one built by `make` if absent
    pub fn get_or_insert_with(&mut self, entity: Entity, make: impl FnOnce() -> T) -> &mut T {
        let row = match self.index.get(entity) {
            Some(&row) => row,
            None => {
                self.index.insert(entity, self.rows.len());
                self.rows.push(make());
                self.owners.push(entity);
                self.rows.len() - 1
            }
        };
        &mut self.rows[row]
    }

    /// Remove the row for `entity`
    pub fn remove(&mut self, entity: Entity) -> Option<T> {
        let row = self.index.remove(entity)?;
        let last = self.rows.len() - 1;
        if row != last {
            let moved = self.owners[last];
            self.index.insert(moved, row);
        }
        self.owners.swap_remove(row);
        Some(self.rows.swap_remove(row))
    }

    /// Get the component of `entity`
    pub fn get(&self, entity: Entity) -> Option<&T> {
        self.index.get(entity).map(|&row| &self.rows[row])
    }

    /// Get the component of `entity` mutably
    pub fn get_mut(&mut self, entity: Entity) -> Option<&mut T> {
        let row = *self.index.get(entity)?;
        Some(&mut self.rows[row])
    }

    /// Whether `entity` has a row in this table
    pub fn contains(&self, entity: Entity) -> bool {
        self.index.contains_key(entity)
    }

    /// Iterate over `(entity, component)` pairs in row order
    pub fn iter(&self) -> impl Iterator<Item = (Entity, &T)> {
        self.owners.iter().copied().zip(self.rows.iter())
    }

    /// Iterate mutably over `(entity, component)` pairs in row order
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Entity, &mut T)> {
        self.owners.iter().copied().zip(self.rows.iter_mut())
    }

    /// Entities owning a row, in row order
    pub fn entities(&self) -> &[Entity] {
        &self.owners
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl<T: Component> Default for ComponentStorage<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Type-erased view of a [`ComponentStorage`] so the world can cascade
/// entity removal across every table
pub(crate) trait ErasedStorage: Any {
    fn remove_entity(&mut self, entity: Entity) -> bool;
    fn clear(&mut self);
    fn len(&self) -> usize;
    fn component_name(&self) -> &'static str;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Component> ErasedStorage for ComponentStorage<T> {
    fn remove_entity(&mut self, entity: Entity) -> bool {
        self.remove(entity).is_some()
    }

    fn clear(&mut self) {
        self.rows.clear();
        self.owners.clear();
        self.index.clear();
    }

    fn len(&self) -> usize {
        self.rows.len()
    }

    fn component_name(&self) -> &'static str {
        type_name::<T>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    #[derive(Debug, PartialEq)]
    struct Health(i32);

    impl Component for Health {}

    fn entities(count: usize) -> Vec<Entity> {
        let mut keys: SlotMap<Entity, ()> = SlotMap::with_key();
        (0..count).map(|_| keys.insert(())).collect()
    }

    #[test]
    fn test_insert_replaces_existing_row() {
        let a = entities(1)[0];
        let mut storage = ComponentStorage::new();

        assert_eq!(storage.insert(a, Health(10)), None);
        assert_eq!(storage.insert(a, Health(20)), Some(Health(10)));
        assert_eq!(storage.len(), 1);
        assert_eq!(storage.get(a), Some(&Health(20)));
    }

    #[test]
    fn test_swap_remove_keeps_index_consistent() {
        let keys = entities(3);
        let mut storage = ComponentStorage::new();
        for (i, &entity) in keys.iter().enumerate() {
            storage.insert(entity, Health(i as i32));
        }

        assert_eq!(storage.remove(keys[0]), Some(Health(0)));

        assert!(!storage.contains(keys[0]));
        assert_eq!(storage.get(keys[1]), Some(&Health(1)));
        assert_eq!(storage.get(keys[2]), Some(&Health(2)));
        assert_eq!(storage.entities(), &[keys[2], keys[1]]);
        assert_eq!(storage.remove(keys[0]), None);
    }

    #[test]
    fn test_iter_mut_updates_rows() {
        let keys = entities(2);
        let mut storage = ComponentStorage::new();
        storage.insert(keys[0], Health(1));
        storage.insert(keys[1], Health(2));

        for (_, health) in storage.iter_mut() {
            health.0 *= 10;
        }

        let values: Vec<_> = storage.iter().map(|(_, h)| h.0).collect();
        assert_eq!(values, vec![10, 20]);
    }

    #[test]
    fn test_erased_remove_and_clear() {
        let keys = entities(2);
        let mut storage = ComponentStorage::new();
        storage.insert(keys[0], Health(1));
        storage.insert(keys[1], Health(2));

        let erased: &mut dyn ErasedStorage = &mut storage;
        assert!(erased.remove_entity(keys[0]));
        assert!(!erased.remove_entity(keys[0]));
        assert_eq!(erased.len(), 1);
        erased.clear();
        assert_eq!(erased.len(), 0);
    }
}
