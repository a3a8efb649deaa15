//! ECS World implementation
//!
//! The world owns every entity and one [`ComponentStorage`] per component
//! type. It is shared state: the engine hands it to modules through the
//! engine context and systems read and write it every frame.

use super::components::{HierarchyComponent, TagComponent};
use super::storage::{ComponentStorage, ErasedStorage};
use super::{Component, Entity};
use log::debug;
use slotmap::SlotMap;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use thiserror::Error;

/// Errors reported by [`World`] operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorldError {
    /// The entity was destroyed or never existed
    #[error("{0} does not exist")]
    EntityNotFound(Entity),

    /// The link would make an entity its own ancestor
    #[error("parenting {child} under {parent} would create a hierarchy cycle")]
    HierarchyCycle {
        /// Entity being reparented
        child: Entity,
        /// Requested parent
        parent: Entity,
    },

    /// An entity cannot be its own parent
    #[error("{0} cannot be its own parent")]
    SelfParent(Entity),
}

/// ECS World containing all entities and components
pub struct World {
    entities: SlotMap<Entity, ()>,
    storages: HashMap<TypeId, Box<dyn ErasedStorage>>,
}

impl World {
    /// Create a new world
    pub fn new() -> Self {
        Self {
            entities: SlotMap::with_key(),
            storages: HashMap::new(),
        }
    }

    /// Create a new entity
    pub fn create_entity(&mut self) -> Entity {
        self.entities.insert(())
    }

    /// Destroy an entity and every component row it owns
    ///
    /// The entity is detached from its parent and its children become
    /// roots. Returns `false` if the entity was not alive.
    pub fn destroy_entity(&mut self, entity: Entity) -> bool {
        if !self.is_alive(entity) {
            return false;
        }

        self.unlink(entity);
        for storage in self.storages.values_mut() {
            storage.remove_entity(entity);
        }
        self.entities.remove(entity);

        debug!("Destroyed {}", entity);
        true
    }

    /// Whether the entity exists
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.entities.contains_key(entity)
    }

    /// Number of live entities
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Iterate over all live entities
    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.entities.keys()
    }

    /// Add a component to an entity, returning the component it replaced
    ///
    /// Adding a [`HierarchyComponent`] goes through [`World::set_parent`] for
    /// each link it carries so both sides of every link stay consistent.
    pub fn add_component<T: Component>(&mut self, entity: Entity, component: T) -> Result<Option<T>, WorldError> {
        if !self.is_alive(entity) {
            return Err(WorldError::EntityNotFound(entity));
        }

        let links = (&component as &dyn Any)
            .downcast_ref::<HierarchyComponent>()
            .map(|hierarchy| (hierarchy.parent(), hierarchy.children().to_vec()));

        let Some((parent, children)) = links else {
            return Ok(self.storage_or_insert::<T>().insert(entity, component));
        };

        self.unlink(entity);
        let previous = self.storage_or_insert::<T>().insert(entity, component);
        if let Some(hierarchy) = self.get_component_mut::<HierarchyComponent>(entity) {
            hierarchy.set_parent_link(None);
            hierarchy.take_children();
        }

        self.set_parent(entity, parent)?;
        for child in children {
            self.set_parent(child, Some(entity))?;
        }
        Ok(previous)
    }

    /// Remove a component from an entity
    pub fn remove_component<T: Component>(&mut self, entity: Entity) -> Option<T> {
        if TypeId::of::<T>() == TypeId::of::<HierarchyComponent>() {
            self.unlink(entity);
        }
        self.storage_mut::<T>()?.remove(entity)
    }

    /// Get a component from an entity
    pub fn get_component<T: Component>(&self, entity: Entity) -> Option<&T> {
        self.storage::<T>()?.get(entity)
    }

    /// Get a mutable component from an entity
    pub fn get_component_mut<T: Component>(&mut self, entity: Entity) -> Option<&mut T> {
        self.storage_mut::<T>()?.get_mut(entity)
    }

    /// Whether the entity has a component of type `T`
    pub fn has_component<T: Component>(&self, entity: Entity) -> bool {
        self.storage::<T>().is_some_and(|storage| storage.contains(entity))
    }

    /// Iterate over every `(entity, component)` of type `T`
    pub fn query<T: Component>(&self) -> impl Iterator<Item = (Entity, &T)> {
        self.storage::<T>().into_iter().flat_map(ComponentStorage::iter)
    }

    /// Iterate mutably over every `(entity, component)` of type `T`
    pub fn query_mut<T: Component>(&mut self) -> impl Iterator<Item = (Entity, &mut T)> {
        self.storage_mut::<T>().into_iter().flat_map(ComponentStorage::iter_mut)
    }

    /// Entities that have a component of type `T`
    pub fn entities_with<T: Component>(&self) -> Vec<Entity> {
        self.storage::<T>()
            .map(|storage| storage.entities().to_vec())
            .unwrap_or_default()
    }

    /// Number of rows in the `T` table
    pub fn component_count<T: Component>(&self) -> usize {
        self.storage::<T>().map_or(0, ComponentStorage::len)
    }

    /// Link `child` under `parent`, or detach it when `parent` is `None`
    ///
    /// Both entities get a [`HierarchyComponent`] if they lack one. Links that
    /// would make an entity its own ancestor are rejected.
    pub fn set_parent(&mut self, child: Entity, parent: Option<Entity>) -> Result<(), WorldError> {
        if !self.is_alive(child) {
            return Err(WorldError::EntityNotFound(child));
        }
        if let Some(parent) = parent {
            if !self.is_alive(parent) {
                return Err(WorldError::EntityNotFound(parent));
            }
            if parent == child {
                return Err(WorldError::SelfParent(child));
            }
            if self.is_ancestor(child, parent) {
                return Err(WorldError::HierarchyCycle { child, parent });
            }
        }

        let old_parent = self.parent(child);
        if old_parent == parent && self.has_component::<HierarchyComponent>(child) {
            return Ok(());
        }
        if let Some(old) = old_parent {
            if let Some(hierarchy) = self.get_component_mut::<HierarchyComponent>(old) {
                hierarchy.remove_child(child);
            }
        }

        self.hierarchy_or_insert(child).set_parent_link(parent);
        if let Some(parent) = parent {
            self.hierarchy_or_insert(parent).push_child(child);
        }
        Ok(())
    }

    /// Parent of an entity
    pub fn parent(&self, entity: Entity) -> Option<Entity> {
        self.get_component::<HierarchyComponent>(entity)?.parent()
    }

    /// Children of an entity, in insertion order
    pub fn children(&self, entity: Entity) -> &[Entity] {
        self.get_component::<HierarchyComponent>(entity)
            .map(HierarchyComponent::children)
            .unwrap_or_default()
    }

    /// Hierarchy entities without a parent
    pub fn roots(&self) -> Vec<Entity> {
        self.query::<HierarchyComponent>()
            .filter(|(_, hierarchy)| hierarchy.parent().is_none())
            .map(|(entity, _)| entity)
            .collect()
    }

    /// Entities whose [`TagComponent`] label equals `label`
    pub fn find_by_tag(&self, label: &str) -> Vec<Entity> {
        self.query::<TagComponent>()
            .filter(|(_, tag)| tag.label == label)
            .map(|(entity, _)| entity)
            .collect()
    }

    /// Destroy every entity and component
    pub fn clear(&mut self) {
        let count = self.entities.len();
        self.entities.clear();
        for storage in self.storages.values_mut() {
            storage.clear();
        }
        debug!("Cleared world ({} entities)", count);
    }

    /// Whether `ancestor` appears on the parent chain of `entity`
    ///
    /// The walk is bounded by the entity count, so a corrupted chain cannot
    /// loop forever.
    fn is_ancestor(&self, ancestor: Entity, entity: Entity) -> bool {
        let mut current = Some(entity);
        for _ in 0..=self.entities.len() {
            match current {
                Some(e) if e == ancestor => return true,
                Some(e) => current = self.parent(e),
                None => return false,
            }
        }
        true
    }

    /// Detach `entity` from its parent and orphan its children
    fn unlink(&mut self, entity: Entity) {
        let Some(hierarchy) = self.get_component_mut::<HierarchyComponent>(entity) else {
            return;
        };
        let parent = hierarchy.parent();
        hierarchy.set_parent_link(None);
        let children = hierarchy.take_children();

        if let Some(parent) = parent {
            if let Some(parent_hierarchy) = self.get_component_mut::<HierarchyComponent>(parent) {
                parent_hierarchy.remove_child(entity);
            }
        }
        for child in children {
            if let Some(child_hierarchy) = self.get_component_mut::<HierarchyComponent>(child) {
                child_hierarchy.set_parent_link(None);
            }
        }
    }

    fn hierarchy_or_insert(&mut self, entity: Entity) -> &mut HierarchyComponent {
        self.storage_or_insert::<HierarchyComponent>()
            .get_or_insert_with(entity, HierarchyComponent::default)
    }

    fn storage<T: Component>(&self) -> Option<&ComponentStorage<T>> {
        self.storages
            .get(&TypeId::of::<T>())
            .and_then(|storage| storage.as_any().downcast_ref())
    }

    fn storage_mut<T: Component>(&mut self) -> Option<&mut ComponentStorage<T>> {
        self.storages
            .get_mut(&TypeId::of::<T>())
            .and_then(|storage| storage.as_any_mut().downcast_mut())
    }

    fn storage_or_insert<T: Component>(&mut self) -> &mut ComponentStorage<T> {
        let storage = self
            .storages
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(ComponentStorage::<T>::new()));
        match storage.as_any_mut().downcast_mut() {
            Some(storage) => storage,
            None => unreachable!("storage registered under the wrong TypeId"),
        }
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for World {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut tables: Vec<_> = self
            .storages
            .values()
            .map(|storage| (storage.component_name(), storage.len()))
            .collect();
        tables.sort_unstable();
        f.debug_struct("World")
            .field("entities", &self.entities.len())
            .field("tables", &tables)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::components::{RenderableComponent, TransformComponent};
    use crate::foundation::math::Vec3;

    #[test]
    fn test_add_get_replace_component() {
        let mut world = World::new();
        let entity = world.create_entity();

        let previous = world.add_component(entity, TagComponent::new("first")).unwrap();
        assert!(previous.is_none());

        let previous = world.add_component(entity, TagComponent::new("second")).unwrap();
        assert_eq!(previous, Some(TagComponent::new("first")));
        assert_eq!(world.get_component::<TagComponent>(entity).unwrap().label, "second");
        assert!(world.has_component::<TagComponent>(entity));
        assert!(!world.has_component::<TransformComponent>(entity));
    }

    #[test]
    fn test_add_component_to_dead_entity_fails() {
        let mut world = World::new();
        let entity = world.create_entity();
        assert!(world.destroy_entity(entity));

        let result = world.add_component(entity, TagComponent::new("ghost"));
        assert_eq!(result, Err(WorldError::EntityNotFound(entity)));
        assert!(!world.destroy_entity(entity));
    }

    #[test]
    fn test_destroyed_key_never_aliases_new_entity() {
        let mut world = World::new();
        let old = world.create_entity();
        world.destroy_entity(old);
        let new = world.create_entity();

        assert_ne!(old, new);
        assert!(!world.is_alive(old));
        assert!(world.is_alive(new));
    }

    #[test]
    fn test_destroy_cascades_every_table() {
        let mut world = World::new();
        let doomed = world.create_entity();
        let survivor = world.create_entity();
        for &entity in &[doomed, survivor] {
            world.add_component(entity, TransformComponent::identity()).unwrap();
            world.add_component(entity, RenderableComponent::new("m", "mat")).unwrap();
            world.add_component(entity, TagComponent::new("crate")).unwrap();
        }

        world.destroy_entity(doomed);

        assert_eq!(world.entity_count(), 1);
        assert_eq!(world.entities_with::<TransformComponent>(), vec![survivor]);
        assert_eq!(world.entities_with::<RenderableComponent>(), vec![survivor]);
        assert_eq!(world.find_by_tag("crate"), vec![survivor]);
        assert!(world.query::<TransformComponent>().all(|(e, _)| e != doomed));
    }

    #[test]
    fn test_destroy_parent_orphans_children() {
        let mut world = World::new();
        let parent = world.create_entity();
        let child_a = world.create_entity();
        let child_b = world.create_entity();
        world.set_parent(child_a, Some(parent)).unwrap();
        world.set_parent(child_b, Some(parent)).unwrap();
        assert_eq!(world.children(parent), &[child_a, child_b]);

        world.destroy_entity(parent);

        assert_eq!(world.parent(child_a), None);
        assert_eq!(world.parent(child_b), None);
        let mut roots = world.roots();
        roots.sort();
        let mut expected = vec![child_a, child_b];
        expected.sort();
        assert_eq!(roots, expected);
    }

    #[test]
    fn test_destroy_child_removes_back_reference() {
        let mut world = World::new();
        let parent = world.create_entity();
        let child = world.create_entity();
        world.set_parent(child, Some(parent)).unwrap();

        world.destroy_entity(child);

        assert!(world.children(parent).is_empty());
    }

    #[test]
    fn test_set_parent_rejects_cycles() {
        let mut world = World::new();
        let a = world.create_entity();
        let b = world.create_entity();
        let c = world.create_entity();
        world.set_parent(b, Some(a)).unwrap();
        world.set_parent(c, Some(b)).unwrap();

        assert_eq!(world.set_parent(a, Some(c)), Err(WorldError::HierarchyCycle { child: a, parent: c }));
        assert_eq!(world.set_parent(a, Some(a)), Err(WorldError::SelfParent(a)));
        assert_eq!(world.parent(a), None);
    }

    #[test]
    fn test_reparent_moves_child() {
        let mut world = World::new();
        let first = world.create_entity();
        let second = world.create_entity();
        let child = world.create_entity();
        world.set_parent(child, Some(first)).unwrap();
        world.set_parent(child, Some(second)).unwrap();

        assert!(world.children(first).is_empty());
        assert_eq!(world.children(second), &[child]);
        assert_eq!(world.parent(child), Some(second));

        world.set_parent(child, None).unwrap();
        assert!(world.children(second).is_empty());
        assert_eq!(world.parent(child), None);
    }

    #[test]
    fn test_hierarchy_component_added_directly_is_linked() {
        let mut world = World::new();
        let parent = world.create_entity();
        let child = world.create_entity();
        world.set_parent(child, Some(parent)).unwrap();

        // Copying the child's node onto a new entity links it under the same parent
        let node = world.get_component::<HierarchyComponent>(child).unwrap().clone();
        let sibling = world.create_entity();
        world.add_component(sibling, node).unwrap();

        assert_eq!(world.parent(sibling), Some(parent));
        assert_eq!(world.children(parent), &[child, sibling]);
    }

    #[test]
    fn test_remove_hierarchy_component_unlinks() {
        let mut world = World::new();
        let parent = world.create_entity();
        let child = world.create_entity();
        world.set_parent(child, Some(parent)).unwrap();

        let removed = world.remove_component::<HierarchyComponent>(parent);

        assert!(removed.is_some());
        assert_eq!(world.parent(child), None);
    }

    #[test]
    fn test_query_mut_and_clear() {
        let mut world = World::new();
        for i in 0..3 {
            let entity = world.create_entity();
            world
                .add_component(entity, TransformComponent::from_position(Vec3::new(i as f32, 0.0, 0.0)))
                .unwrap();
        }

        for (_, transform) in world.query_mut::<TransformComponent>() {
            transform.position.y = 5.0;
        }
        assert!(world.query::<TransformComponent>().all(|(_, t)| t.position.y == 5.0));
        assert_eq!(world.component_count::<TransformComponent>(), 3);

        world.clear();
        assert_eq!(world.entity_count(), 0);
        assert_eq!(world.query::<TransformComponent>().count(), 0);
    }

    #[test]
    fn test_query_for_unknown_type_is_empty() {
        let mut world = World::new();
        assert_eq!(world.query::<TagComponent>().count(), 0);
        assert_eq!(world.query_mut::<TagComponent>().count(), 0);
        assert!(world.entities_with::<TagComponent>().is_empty());
    }
}
