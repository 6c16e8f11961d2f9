//! # Scene Engine
//!
//! Scene core for an interactive 3D editor: an entity store, ray picking,
//! a transform gizmo and acceleration structure bookkeeping for a hybrid
//! ray-traced pass.
//!
//! ## Features
//!
//! - **ECS World**: Named entities with typed component storage
//! - **Picking**: Nearest-hit ray casts against object-space mesh bounds
//! - **Transform Gizmo**: Translate, rotate and scale handles with drag sessions
//! - **Ray Tracing**: BLAS/TLAS lifecycle with build-vs-refit decisions
//! - **Persistence**: RON scene snapshots
//!
//! ## Quick Start
//!
//! ```rust
//! use scene_engine::prelude::*;
//!
//! let mut world = World::new();
//! let cube = world.create_object("Cube").unwrap();
//! world.add_component(cube, TransformComponent::identity()).unwrap();
//! world.add_component(cube, MeshComponent::cube()).unwrap();
//!
//! let camera = Camera::perspective(Vec3::new(0.0, 0.0, 5.0), 60.0, 1.0, 0.1, 100.0);
//! let mut session = EditorSession::new(&EngineConfig::default());
//!
//! let mut mouse = MouseState::new(800, 800);
//! mouse.update_position(400.0, 400.0);
//! mouse.set_button(true);
//! session.frame(&mut world, &FrameInput::from_mouse(mouse), &camera, &StaticBoundsOnly);
//! assert_eq!(session.selected(), Some(cube));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod core;
pub mod config;
pub mod foundation;

pub mod ecs;
pub mod spatial;
pub mod gizmo;
pub mod raytracing;
pub mod assets;
pub mod persistence;
pub mod render;
pub mod input;
pub mod debug;
pub mod editor;

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        assets::{MeshAssetCache, MeshAssetSource, MeshData, ObjAssetSource},
        core::{Config, EngineConfig},
        debug::DebugDrawSystem,
        ecs::{
            components::{
                CameraComponent, LightFactory, MeshComponent, NameComponent, PrimitiveMesh, SelectionComponent,
                TransformComponent,
            },
            Component, EcsError, Entity, PickHit, PickingSystem, World,
        },
        editor::{EditorSession, FrameInput, FrameOutcome},
        foundation::math::{Mat4, Vec2, Vec3},
        gizmo::{GizmoMode, TransformGizmo},
        input::MouseState,
        persistence::{load_world, save_world, WorldSnapshot},
        raytracing::{AccelerationStructureManager, HeadlessBackend, RayTracingStatus, TlasBuildMode},
        render::Camera,
        spatial::{Aabb, BoundsProvider, Ray, StaticBoundsOnly},
    };
}
