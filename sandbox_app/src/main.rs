//! Sandbox application
//!
//! Builds a small scene (a camera, two lights and a ship carrying a
//! spinning turret), wires the renderer and scene systems as modules, loads
//! a frame statistics module from the catalog and runs the loop until the
//! configured frame limit.
//!
//! Usage: `sandbox [config.toml|config.ron]`

use modular_engine::prelude::*;
use modular_engine::render::{MaterialDesc, MeshDesc, ShaderDesc};
use std::path::PathBuf;

const DEFAULT_CONFIG: &str = "sandbox_app/config/sandbox.toml";

/// Rotates entities tagged `spinner` about +Y
struct SpinSystem {
    degrees_per_second: f32,
    enabled: bool,
}

impl System for SpinSystem {
    fn name(&self) -> &str {
        "spin"
    }

    fn update(&mut self, world: &mut World, _services: &mut ServiceRegistry, delta_time: f32) {
        let step = Quat::from_axis_angle(&Vec3::y_axis(), self.degrees_per_second.to_radians() * delta_time);
        for entity in world.find_by_tag("spinner") {
            if let Some(transform) = world.get_component_mut::<TransformComponent>(entity) {
                transform.rotation = step * transform.rotation;
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

/// Logs draw statistics every `report_every` frames
struct FrameStatsModule {
    report_every: u64,
    initialized: bool,
}

impl FrameStatsModule {
    const NAME: &'static str = "frame_stats";

    fn create() -> Box<dyn Module> {
        Box::new(Self {
            report_every: 60,
            initialized: false,
        })
    }
}

impl Module for FrameStatsModule {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn dependencies(&self) -> Vec<String> {
        vec![RendererModule::NAME.to_owned()]
    }

    fn initialize(&mut self, ctx: &mut EngineContext<'_>) -> Result<(), ModuleError> {
        if let Some(value) = ctx
            .config
            .module_section(Self::NAME)
            .and_then(|section| section.get("report_every"))
        {
            self.report_every = value
                .as_integer()
                .and_then(|n| u64::try_from(n).ok())
                .filter(|&n| n > 0)
                .ok_or_else(|| ModuleError::InitializationFailed {
                    module: Self::NAME.to_owned(),
                    reason: format!("report_every must be a positive integer, got {}", value),
                })?;
        }
        self.initialized = true;
        Ok(())
    }

    fn shutdown(&mut self, ctx: &mut EngineContext<'_>) {
        log::info!("Ran {} frames in {:.2}s", ctx.frame_count(), ctx.total_time());
        self.initialized = false;
    }

    fn render(&mut self, ctx: &mut EngineContext<'_>) {
        if ctx.frame_count() % self.report_every != 0 {
            return;
        }
        if let Some(renderer) = ctx.services.try_get::<dyn Renderer>() {
            let stats = renderer.statistics();
            log::info!(
                "frame {}: {} draw calls, {} triangles",
                ctx.frame_count(),
                stats.draw_calls,
                stats.triangles
            );
        }
    }

    fn is_initialized(&self) -> bool {
        self.initialized
    }
}

fn build_scene(engine: &mut Engine) -> Result<(), EngineError> {
    let renderer = engine.services_mut().get::<dyn Renderer>()?;
    #[rustfmt::skip]
    let cube = renderer.create_mesh(&MeshDesc::new(
        vec![
            -0.5, -0.5, -0.5,   0.5, -0.5, -0.5,   0.5,  0.5, -0.5,  -0.5,  0.5, -0.5,
            -0.5, -0.5,  0.5,   0.5, -0.5,  0.5,   0.5,  0.5,  0.5,  -0.5,  0.5,  0.5,
        ],
        vec![
            0, 2, 1, 0, 3, 2,  4, 5, 6, 4, 6, 7,  0, 1, 5, 0, 5, 4,
            3, 6, 2, 3, 7, 6,  0, 4, 7, 0, 7, 3,  1, 2, 6, 1, 6, 5,
        ],
    ));
    let shader = renderer.create_shader(&ShaderDesc::new("standard.vert", "standard.frag"));
    let hull = renderer.create_material(&MaterialDesc::new(shader).with_vec4("base_color", Vec4::new(0.6, 0.6, 0.7, 1.0)));
    let metal = renderer.create_material(&MaterialDesc::new(shader).with_float("metallic", 0.9));

    let world = engine.world_mut();

    let camera = world.create_entity();
    world.add_component(
        camera,
        TransformComponent::looking_at(Vec3::new(0.0, 4.0, 12.0), Vec3::zeros(), Vec3::y()),
    )?;
    world.add_component(camera, CameraComponent::perspective(60.0, 0.1, 100.0))?;

    let sun = world.create_entity();
    world.add_component(sun, LightComponent::directional(Vec3::new(1.0, 0.95, 0.8), 0.3))?;

    let lamp = world.create_entity();
    world.add_component(lamp, TransformComponent::from_position(Vec3::new(3.0, 3.0, 0.0)))?;
    world.add_component(lamp, LightComponent::point(Vec3::new(1.0, 0.6, 0.3), 2.0, 8.0))?;

    let ship = world.create_entity();
    world.add_component(ship, TagComponent::new("ship"))?;
    world.add_component(ship, TransformComponent::identity().with_scale(Vec3::new(3.0, 0.5, 1.5)))?;
    world.add_component(ship, RenderableComponent::new("cube", "hull").with_handles(cube, hull))?;

    let turret = world.create_entity();
    world.add_component(turret, TagComponent::new("spinner"))?;
    world.add_component(turret, TransformComponent::from_position(Vec3::new(0.0, 1.0, 0.0)))?;
    world.add_component(
        turret,
        RenderableComponent::new("cube", "metal").with_layer(1).with_handles(cube, metal),
    )?;
    world.set_parent(turret, Some(ship))?;

    log::info!("Scene ready with {} entities", world.entity_count());
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .or_else(|| Some(PathBuf::from(DEFAULT_CONFIG)).filter(|path| path.exists()));

    let mut engine = Engine::new(ApplicationConfig::new().with_engine(EngineSettings::new().with_max_frames(240)));
    engine
        .catalog_mut()
        .add(ModuleEntryPoint::new(FrameStatsModule::NAME, FrameStatsModule::create));

    engine.register_module(Box::new(RendererModule::new()))?;
    engine.register_module(Box::new(
        SystemsModule::new("scene")
            .with_system(
                SystemPhase::Update,
                Box::new(SpinSystem {
                    degrees_per_second: 90.0,
                    enabled: true,
                }),
            )
            .with_system(SystemPhase::PostUpdate, Box::new(TransformSystem::new()))
            .with_system(SystemPhase::PostUpdate, Box::new(RenderSystem::new().with_debug_lights(true))),
    ))?;

    engine.initialize(config_path.as_deref())?;
    engine.load_module(FrameStatsModule::NAME)?;
    build_scene(&mut engine)?;

    engine.run()?;
    engine.shutdown();
    Ok(())
}
