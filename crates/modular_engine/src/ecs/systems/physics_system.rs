//! Physics synchronization
//!
//! Bridges [`PhysicsComponent`]s and the `dyn Physics` service:
//!
//! 1. bodies are created for components that have none yet and destroyed
//!    for entities (or components) that went away
//! 2. kinematic bodies are moved to their entity's transform
//! 3. the simulation is stepped
//! 4. dynamic bodies write their pose back into the transform
//!
//! Without a physics service the system does nothing.

use crate::ecs::components::{BodyType, PhysicsComponent, TransformComponent};
use crate::ecs::{Entity, System, World};
use crate::foundation::math::{Quat, Vec3};
use crate::physics::{BodyDesc, BodyHandle, Physics};
use crate::services::ServiceRegistry;
use log::{debug, trace, warn};
use std::collections::HashMap;

/// Keeps rigid bodies and transforms in sync
#[derive(Debug)]
pub struct PhysicsSystem {
    enabled: bool,
    bodies: HashMap<Entity, BodyHandle>,
}

impl PhysicsSystem {
    /// System name used for scheduling
    pub const NAME: &'static str = "physics";

    /// Create an enabled physics system
    pub fn new() -> Self {
        Self {
            enabled: true,
            bodies: HashMap::new(),
        }
    }

    /// Number of bodies this system created and still tracks
    pub fn tracked_bodies(&self) -> usize {
        self.bodies.len()
    }

    fn release_orphans(&mut self, world: &World, physics: &mut dyn Physics) {
        self.bodies.retain(|&entity, &mut body| {
            let owned = world
                .get_component::<PhysicsComponent>(entity)
                .is_some_and(|component| component.body_handle == body);
            if !owned {
                trace!("Destroying body {:?} of {:?}", body, entity);
                physics.destroy_body(body);
            }
            owned
        });
    }

    fn create_missing(&mut self, world: &mut World, physics: &mut dyn Physics) {
        let pending: Vec<(Entity, BodyDesc)> = world
            .query::<PhysicsComponent>()
            .filter(|(_, component)| !component.has_body())
            .map(|(entity, component)| {
                let transform = world
                    .get_component::<TransformComponent>(entity)
                    .cloned()
                    .unwrap_or_default();
                (entity, BodyDesc::from_component(component, &transform))
            })
            .collect();

        for (entity, desc) in pending {
            let body = physics.create_body(&desc);
            if !body.is_valid() {
                warn!("Physics rejected body for {:?}", entity);
                continue;
            }
            if let Some(component) = world.get_component_mut::<PhysicsComponent>(entity) {
                component.body_handle = body;
            }
            self.bodies.insert(entity, body);
            debug!("Created {:?} body {:?} for {:?}", desc.body_type, body, entity);
        }
    }

    fn push_kinematic(world: &World, physics: &mut dyn Physics) {
        for (entity, component) in world.query::<PhysicsComponent>() {
            if component.body_type != BodyType::Kinematic || !component.has_body() {
                continue;
            }
            if let Some(transform) = world.get_component::<TransformComponent>(entity) {
                physics.set_body_position(component.body_handle, transform.position);
                physics.set_body_rotation(component.body_handle, transform.rotation);
            }
        }
    }

    fn pull_dynamic(world: &mut World, physics: &dyn Physics) {
        let poses: Vec<(Entity, Vec3, Quat)> = world
            .query::<PhysicsComponent>()
            .filter(|(_, component)| component.body_type == BodyType::Dynamic && component.has_body())
            .filter_map(|(entity, component)| {
                let position = physics.body_position(component.body_handle)?;
                let rotation = physics.body_rotation(component.body_handle)?;
                Some((entity, position, rotation))
            })
            .collect();

        for (entity, position, rotation) in poses {
            if let Some(transform) = world.get_component_mut::<TransformComponent>(entity) {
                transform.position = position;
                transform.rotation = rotation;
            }
        }
    }
}

impl Default for PhysicsSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for PhysicsSystem {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn update(&mut self, world: &mut World, services: &mut ServiceRegistry, delta_time: f32) {
        if !services.is_available::<dyn Physics>() && !services.has_factory::<dyn Physics>() {
            return;
        }
        let Ok(physics) = services.get::<dyn Physics>() else {
            return;
        };

        self.release_orphans(world, physics);
        self.create_missing(world, physics);
        Self::push_kinematic(world, physics);
        physics.step(delta_time);
        Self::pull_dynamic(world, physics);
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }
}
