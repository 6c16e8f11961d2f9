//! Headless editor session
//!
//! Builds a small scene, replays a scripted mouse session through the
//! editor frame loop (select, translate drag, rotate drag, cancelled scale
//! drag), keeps the TLAS in sync with a headless backend and round-trips the
//! scene through a RON file.
//!
//! Usage: `editor_demo [config.toml|config.ron]`

use std::path::{Path, PathBuf};

use scene_engine::assets::{MeshAssetCache, ObjAssetSource};
use scene_engine::core::{Config, ConfigError, EngineConfig};
use scene_engine::ecs::components::{LightFactory, MeshComponent, SkyComponent, TransformComponent};
use scene_engine::ecs::{EcsError, Entity, World};
use scene_engine::editor::{EditorSession, FrameInput};
use scene_engine::foundation::logging;
use scene_engine::foundation::math::{Vec2, Vec3};
use scene_engine::gizmo::GizmoMode;
use scene_engine::input::MouseState;
use scene_engine::persistence::{self, PersistenceError};
use scene_engine::raytracing::{AccelerationStructureManager, HeadlessBackend};
use scene_engine::render::Camera;
use scene_engine::spatial::project_to_screen;

const VIEWPORT_WIDTH: u32 = 1280;
const VIEWPORT_HEIGHT: u32 = 720;

#[derive(thiserror::Error, Debug)]
enum DemoError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Scene error: {0}")]
    Ecs(#[from] EcsError),

    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("Script error: {0}")]
    Script(String),
}

/// One scripted frame
#[derive(Debug, Clone, Copy)]
struct ScriptStep {
    cursor: Vec2,
    button_down: bool,
    mode_switch: Option<GizmoMode>,
    cancel: bool,
}

impl ScriptStep {
    fn at(cursor: Vec2, button_down: bool) -> Self {
        Self {
            cursor,
            button_down,
            mode_switch: None,
            cancel: false,
        }
    }

    fn with_mode(mut self, mode: GizmoMode) -> Self {
        self.mode_switch = Some(mode);
        self
    }

    fn with_cancel(mut self) -> Self {
        self.cancel = true;
        self
    }
}

struct EditorDemo {
    config: EngineConfig,
    world: World,
    camera: Camera,
    session: EditorSession,
    mouse: MouseState,
    assets: MeshAssetCache,
    source: ObjAssetSource,
    backend: HeadlessBackend,
    ray_tracing: AccelerationStructureManager,
}

impl EditorDemo {
    fn new(config: EngineConfig, asset_root: PathBuf) -> Self {
        let aspect = VIEWPORT_WIDTH as f32 / VIEWPORT_HEIGHT as f32;
        Self {
            session: EditorSession::new(&config),
            ray_tracing: AccelerationStructureManager::new(config.ray_tracing.clone()),
            config,
            world: World::new(),
            camera: Camera::perspective(Vec3::new(0.0, 5.0, 10.0), 60.0, aspect, 0.1, 100.0),
            mouse: MouseState::new(VIEWPORT_WIDTH, VIEWPORT_HEIGHT),
            assets: MeshAssetCache::new(),
            source: ObjAssetSource::new(asset_root),
            backend: HeadlessBackend::new(),
        }
    }

    fn build_scene(&mut self) -> Result<Entity, DemoError> {
        let crate_entity = self.world.create_object("Crate")?;
        self.world.add_component(crate_entity, TransformComponent::identity())?;
        self.world.add_component(crate_entity, MeshComponent::cube())?;

        let floor = self.world.create_object("Floor")?;
        self.world.add_component(
            floor,
            TransformComponent::from_position(Vec3::new(0.0, -1.0, 0.0)).with_scale(Vec3::new(8.0, 1.0, 8.0)),
        )?;
        self.world.add_component(floor, MeshComponent::plane())?;

        let pyramid = self.world.create_object("Pyramid")?;
        self.world.add_component(pyramid, TransformComponent::from_position(Vec3::new(-4.0, 0.0, 0.0)))?;
        self.world.add_component(pyramid, MeshComponent::dynamic("models/pyramid.obj"))?;

        let sun = self.world.create_object("Sun")?;
        self.world.add_component(sun, TransformComponent::from_position(Vec3::new(0.0, 10.0, 0.0)))?;
        self.world.add_component(
            sun,
            LightFactory::directional(Vec3::new(-0.3, -1.0, -0.2), Vec3::new(1.0, 0.95, 0.9), 2.0),
        )?;

        let sky = self.world.create_object("Sky")?;
        self.world.add_component(sky, SkyComponent::default())?;

        log::info!("Scene built with {} entities", self.world.entity_count());
        Ok(crate_entity)
    }

    fn initialize_ray_tracing(&mut self) {
        self.assets.resolve_world(&self.world, &self.source);
        let ready = self.ray_tracing.create_ray_tracing_as(
            &self.world,
            &mut self.assets,
            &self.source,
            &mut self.backend,
        );
        if ready {
            log::info!("Ray tracing ready: {:?}", self.ray_tracing.stats());
        } else {
            log::info!("Continuing raster-only: {:?}", self.ray_tracing.status());
        }
    }

    fn cursor_at(&self, point: Vec3) -> Result<Vec2, DemoError> {
        project_to_screen(point, &self.camera.view_projection(), self.mouse.viewport)
            .ok_or_else(|| DemoError::Script(format!("{:?} is behind the camera", point)))
    }

    fn handle_length(&self, point: Vec3) -> f32 {
        (point - self.camera.position).norm() * self.config.gizmo.screen_fraction
    }

    fn script(&self, target: Entity) -> Result<Vec<ScriptStep>, DemoError> {
        let origin = self
            .world
            .get_component::<TransformComponent>(target)
            .map(|transform| transform.position)
            .ok_or_else(|| DemoError::Script("target has no transform".to_string()))?;

        let grab = self.handle_length(origin) * 0.6;
        let on_x = self.cursor_at(origin + Vec3::new(grab, 0.0, 0.0))?;
        let dragged_x = self.cursor_at(origin + Vec3::new(grab + 2.0, 0.0, 0.0))?;

        // After the translate drag the object sits 2 units along +X
        let moved = origin + Vec3::new(2.0, 0.0, 0.0);
        let ring = self.handle_length(moved) * std::f32::consts::FRAC_1_SQRT_2;
        let on_y_ring = self.cursor_at(moved + Vec3::new(ring, 0.0, ring))?;
        let swept_y_ring = self.cursor_at(moved + Vec3::new(ring, 0.0, -ring))?;

        let on_scale_x = self.cursor_at(moved + Vec3::new(self.handle_length(moved) * 0.6, 0.0, 0.0))?;
        let dragged_scale = self.cursor_at(moved + Vec3::new(self.handle_length(moved) * 0.6 + 1.0, 0.0, 0.0))?;

        let center = self.cursor_at(origin)?;
        let empty_sky = Vec2::new(self.mouse.viewport.x - 5.0, 5.0);

        Ok(vec![
            // Select
            ScriptStep::at(center, true),
            ScriptStep::at(center, false),
            // Translate along X
            ScriptStep::at(on_x, false),
            ScriptStep::at(on_x, true),
            ScriptStep::at(dragged_x, true),
            ScriptStep::at(dragged_x, false),
            // Rotate around Y
            ScriptStep::at(dragged_x, false).with_mode(GizmoMode::Rotate),
            ScriptStep::at(on_y_ring, false),
            ScriptStep::at(on_y_ring, true),
            ScriptStep::at(swept_y_ring, true),
            ScriptStep::at(swept_y_ring, false),
            // Scale, then cancel
            ScriptStep::at(swept_y_ring, false).with_mode(GizmoMode::Scale),
            ScriptStep::at(on_scale_x, false),
            ScriptStep::at(on_scale_x, true),
            ScriptStep::at(dragged_scale, true),
            ScriptStep::at(dragged_scale, true).with_cancel(),
            ScriptStep::at(dragged_scale, false),
            // Click on nothing keeps the selection
            ScriptStep::at(empty_sky, true),
            ScriptStep::at(empty_sky, false),
        ])
    }

    fn run_step(&mut self, step: &ScriptStep) {
        self.mouse.update_position(step.cursor.x, step.cursor.y);
        self.mouse.set_button(step.button_down);

        let input = FrameInput {
            mouse: self.mouse.clone(),
            mode_switch: step.mode_switch,
            cancel: step.cancel,
        };
        let outcome = self.session.frame(&mut self.world, &input, &self.camera, &self.assets);
        self.mouse.clear_edges();

        if outcome.selection_changed {
            let name = self
                .session
                .selected()
                .and_then(|entity| self.world.name_of(entity))
                .unwrap_or("<none>");
            log::info!("Frame {}: selection -> {}", self.session.frame_count(), name);
        }

        if outcome.transform_modified {
            if let Some(mode) =
                self.ray_tracing
                    .update_tlas(&self.world, &mut self.assets, &self.source, &mut self.backend)
            {
                log::debug!("Frame {}: TLAS {:?}", self.session.frame_count(), mode);
            }
        }

        log::trace!(
            "Frame {}: gizmo {:?}, {} debug lines",
            self.session.frame_count(),
            self.session.gizmo().state(),
            self.session.debug_draw().line_count()
        );
    }

    fn run(&mut self) -> Result<(), DemoError> {
        let target = self.build_scene()?;
        self.initialize_ray_tracing();

        for step in self.script(target)? {
            self.run_step(&step);
        }

        if let Some(transform) = self.world.get_component::<TransformComponent>(target) {
            log::info!(
                "Crate after session: position {:?}, rotation {:?}, scale {:?}",
                transform.position,
                transform.rotation,
                transform.scale
            );
        }
        log::info!("Ray tracing stats: {:?}", self.ray_tracing.stats());

        self.round_trip_scene()?;
        self.ray_tracing.destroy_ray_tracing_as(&mut self.backend);
        Ok(())
    }

    fn round_trip_scene(&self) -> Result<(), DemoError> {
        let path = std::env::temp_dir().join("editor_demo_scene.ron");
        persistence::save_world(&self.world, &path)?;

        let mut reloaded = World::new();
        persistence::load_world(&mut reloaded, &path)?;
        if reloaded.entity_count() != self.world.entity_count() {
            return Err(DemoError::Script(format!(
                "reloaded {} entities, expected {}",
                reloaded.entity_count(),
                self.world.entity_count()
            )));
        }
        log::info!("Scene round-tripped through {}", path.display());
        Ok(())
    }
}

fn load_config(manifest_dir: &Path) -> Result<EngineConfig, DemoError> {
    let path = std::env::args()
        .nth(1)
        .map_or_else(|| manifest_dir.join("config").join("engine.toml"), PathBuf::from);

    let config = if path.exists() {
        EngineConfig::load_from_file(&path)?
    } else {
        EngineConfig::default()
    };
    config.validate()?;
    Ok(config)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    let config = load_config(manifest_dir)?;
    logging::init(&config.log_level);

    log::info!("Starting headless editor session");
    let mut demo = EditorDemo::new(config, manifest_dir.join("assets"));

    match demo.run() {
        Ok(()) => {
            log::info!("Editor session finished");
            Ok(())
        }
        Err(e) => {
            log::error!("Editor session failed: {}", e);
            Err(e.into())
        }
    }
}
