//! Transform propagation
//!
//! Walks the hierarchy from its roots and writes a
//! [`GlobalTransformComponent`] for every entity with a
//! [`TransformComponent`]. Entities in the chain without a transform pass
//! their parent's matrix through unchanged.

use crate::ecs::components::{GlobalTransformComponent, TransformComponent};
use crate::ecs::{Entity, System, World};
use crate::foundation::math::Mat4;
use crate::services::ServiceRegistry;
use log::warn;
use std::collections::HashSet;

/// Computes world matrices from local transforms and parent links
#[derive(Debug)]
pub struct TransformSystem {
    enabled: bool,
}

impl TransformSystem {
    /// System name used for scheduling
    pub const NAME: &'static str = "transform";

    /// Create an enabled transform system
    pub fn new() -> Self {
        Self { enabled: true }
    }

    fn write_global(world: &mut World, entity: Entity, matrix: Mat4) {
        if let Some(global) = world.get_component_mut::<GlobalTransformComponent>(entity) {
            global.matrix = matrix;
            return;
        }
        if let Err(err) = world.add_component(entity, GlobalTransformComponent::new(matrix)) {
            warn!("Failed to write world transform: {}", err);
        }
    }
}

impl Default for TransformSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for TransformSystem {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn update(&mut self, world: &mut World, _services: &mut ServiceRegistry, _delta_time: f32) {
        let transformed = world.entities_with::<TransformComponent>();

        let mut stack: Vec<(Entity, Mat4)> = transformed
            .iter()
            .copied()
            .filter(|&entity| world.parent(entity).is_none())
            .chain(world.roots())
            .map(|entity| (entity, Mat4::identity()))
            .collect();
        // Pop in insertion order
        stack.reverse();

        let mut visited = HashSet::new();
        while let Some((entity, parent_matrix)) = stack.pop() {
            if !visited.insert(entity) {
                continue;
            }

            let matrix = match world.get_component::<TransformComponent>(entity) {
                Some(transform) => {
                    let matrix = parent_matrix * transform.to_matrix();
                    Self::write_global(world, entity, matrix);
                    matrix
                }
                None => parent_matrix,
            };

            stack.extend(world.children(entity).iter().rev().map(|&child| (child, matrix)));
        }

        // Only reachable if the hierarchy was left inconsistent
        for entity in transformed {
            if visited.contains(&entity) {
                continue;
            }
            warn!("Entity {:?} unreachable from any hierarchy root", entity);
            if let Some(local) = world.get_component::<TransformComponent>(entity).map(|t| t.to_matrix()) {
                Self::write_global(world, entity, local);
            }
        }
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }
}
