//! Parent/child links
//!
//! Links are only changed through [`World::set_parent`](crate::ecs::World::set_parent),
//! which keeps both sides consistent and rejects cycles. The fields are
//! private so a component edited in place cannot break that.

use crate::ecs::{Component, Entity};

/// Hierarchy node of an entity
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HierarchyComponent {
    parent: Option<Entity>,
    children: Vec<Entity>,
}

impl Component for HierarchyComponent {}

impl HierarchyComponent {
    /// Parent entity (non-owning back-reference)
    pub fn parent(&self) -> Option<Entity> {
        self.parent
    }

    /// Children in insertion order
    pub fn children(&self) -> &[Entity] {
        &self.children
    }

    pub(crate) fn set_parent_link(&mut self, parent: Option<Entity>) {
        self.parent = parent;
    }

    pub(crate) fn push_child(&mut self, child: Entity) {
        if !self.children.contains(&child) {
            self.children.push(child);
        }
    }

    pub(crate) fn remove_child(&mut self, child: Entity) {
        self.children.retain(|&c| c != child);
    }

    pub(crate) fn take_children(&mut self) -> Vec<Entity> {
        std::mem::take(&mut self.children)
    }
}
