//! Rendering system
//!
//! Reads cameras, lights and renderables out of the world and issues one
//! frame to whatever [`Renderer`] the service registry currently provides.
//! The system brackets the frame itself: begin, clear, draw, end, present.

use crate::ecs::components::{
    CameraComponent, GlobalTransformComponent, LightComponent, LightType, RenderableComponent, TransformComponent,
};
use crate::ecs::{Entity, System, World};
use crate::foundation::math::{Mat4, Vec3, Vec4};
use crate::render::api::{ClearFlags, MaterialHandle, MeshHandle, Renderer};
use crate::services::ServiceRegistry;
use log::{debug, error, trace};

/// Draws the world through the `dyn Renderer` service
#[derive(Debug)]
pub struct RenderSystem {
    enabled: bool,
    clear_color: Vec4,
    debug_lights: bool,
    // Reported once per outage instead of every frame
    renderer_missing: bool,
}

struct DrawItem {
    layer: u32,
    mesh: MeshHandle,
    material: MaterialHandle,
    model: Mat4,
}

impl RenderSystem {
    /// System name used for scheduling
    pub const NAME: &'static str = "render";

    /// Create a render system clearing to opaque black
    pub fn new() -> Self {
        Self {
            enabled: true,
            clear_color: Vec4::new(0.0, 0.0, 0.0, 1.0),
            debug_lights: false,
            renderer_missing: false,
        }
    }

    /// Builder pattern: Set clear color
    pub fn with_clear_color(mut self, color: Vec4) -> Self {
        self.clear_color = color;
        self
    }

    /// Builder pattern: Draw point and spot light ranges as debug spheres
    pub fn with_debug_lights(mut self, enabled: bool) -> Self {
        self.debug_lights = enabled;
        self
    }

    /// Clear color applied at the start of each frame
    pub fn clear_color(&self) -> Vec4 {
        self.clear_color
    }

    /// World matrix of an entity: propagated if available, else local
    fn world_matrix(world: &World, entity: Entity) -> Option<Mat4> {
        if let Some(global) = world.get_component::<GlobalTransformComponent>(entity) {
            return Some(global.matrix);
        }
        world
            .get_component::<TransformComponent>(entity)
            .map(TransformComponent::to_matrix)
    }

    fn apply_camera(world: &World, renderer: &mut dyn Renderer) {
        let camera = world
            .query::<CameraComponent>()
            .filter(|(_, camera)| camera.active)
            .find_map(|(entity, camera)| Self::world_matrix(world, entity).map(|matrix| (camera, matrix)));

        match camera {
            Some((camera, matrix)) => {
                renderer.set_view_matrix(camera.view_matrix(&matrix));
                renderer.set_projection_matrix(camera.projection_matrix(renderer.aspect_ratio()));
            }
            None => trace!("No active camera, keeping previous view"),
        }
    }

    fn apply_lighting(&self, world: &World, renderer: &mut dyn Renderer) {
        let ambient = world
            .query::<LightComponent>()
            .filter(|(_, light)| light.light_type == LightType::Directional)
            .fold(Vec3::zeros(), |sum, (_, light)| sum + light.radiance());
        renderer.set_ambient_light(ambient.map(|channel| channel.clamp(0.0, 1.0)));

        if !self.debug_lights {
            return;
        }
        for (entity, light) in world.query::<LightComponent>() {
            if light.light_type == LightType::Directional {
                continue;
            }
            if let Some(matrix) = Self::world_matrix(world, entity) {
                let center = Vec3::new(matrix.m14, matrix.m24, matrix.m34);
                renderer.draw_sphere(&center, light.range, &light.color);
            }
        }
    }

    fn collect_draws(world: &World) -> Vec<DrawItem> {
        let mut items: Vec<DrawItem> = world
            .query::<RenderableComponent>()
            .filter(|(_, renderable)| renderable.should_render())
            .map(|(entity, renderable)| DrawItem {
                layer: renderable.layer,
                mesh: renderable.mesh_handle,
                material: renderable.material_handle,
                model: Self::world_matrix(world, entity).unwrap_or_else(Mat4::identity),
            })
            .collect();
        // Stable: equal layers keep storage order
        items.sort_by_key(|item| item.layer);
        items
    }
}

impl Default for RenderSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for RenderSystem {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn update(&mut self, _world: &mut World, _services: &mut ServiceRegistry, _delta_time: f32) {}

    fn render(&mut self, world: &World, services: &mut ServiceRegistry) {
        // Only the first miss goes through `get`, which reports the error
        let provided = services.is_available::<dyn Renderer>() || services.has_factory::<dyn Renderer>();
        if !provided && self.renderer_missing {
            return;
        }
        let renderer = match services.get::<dyn Renderer>() {
            Ok(renderer) => renderer,
            Err(err) => {
                error!("Skipping frames until a renderer is provided: {}", err);
                self.renderer_missing = true;
                return;
            }
        };
        if self.renderer_missing {
            debug!("Renderer available again");
            self.renderer_missing = false;
        }

        renderer.begin_frame();
        renderer.reset_statistics();
        renderer.clear_color(self.clear_color);
        renderer.clear(ClearFlags::default());

        Self::apply_camera(world, renderer);
        self.apply_lighting(world, renderer);

        let items = Self::collect_draws(world);
        for item in &items {
            renderer.draw_mesh(item.mesh, item.material, &item.model);
        }
        trace!("Submitted {} draws", items.len());

        renderer.end_frame();
        renderer.present();
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }
}
