//! Transform gizmo state machine
//!
//! One algorithm for all three modes: a drag intersects the cursor ray with
//! a plane fixed at drag start. Translate and scale read the signed distance
//! travelled along the handle direction; rotate reads the signed angle swept
//! around the axis in a plane perpendicular to it.

use crate::core::GizmoConfig;
use crate::debug::DebugDrawSystem;
use crate::ecs::components::TransformComponent;
use crate::ecs::{Entity, World};
use crate::foundation::math::{euler_xyz_to_matrix, matrix_to_euler_xyz, Mat3, Vec3};
use crate::render::Camera;
use crate::spatial::Ray;

use super::handles::HandleLayout;
use super::types::{DragSession, GizmoHandle, GizmoInput, GizmoMode, GizmoResponse, GizmoState};

/// Cross products shorter than this mean the axis points at the camera
const DEGENERATE_EPSILON: f32 = 1e-3;

/// Direct-manipulation widget for the selected entity
#[derive(Debug, Clone)]
pub struct TransformGizmo {
    config: GizmoConfig,
    mode: GizmoMode,
    state: GizmoState,
}

impl TransformGizmo {
    /// Create an idle gizmo in translate mode
    pub fn new(config: GizmoConfig) -> Self {
        Self {
            config,
            mode: GizmoMode::Translate,
            state: GizmoState::Idle,
        }
    }

    /// Sizing and threshold configuration
    pub fn config(&self) -> &GizmoConfig {
        &self.config
    }

    /// Current mode
    pub fn mode(&self) -> GizmoMode {
        self.mode
    }

    /// Current interaction state
    pub fn state(&self) -> &GizmoState {
        &self.state
    }

    /// Whether a drag is in progress
    pub fn is_dragging(&self) -> bool {
        self.state.is_dragging()
    }

    /// Switch mode. Ignored while dragging so a drag never changes meaning
    /// halfway through.
    pub fn set_mode(&mut self, mode: GizmoMode) {
        if self.state.is_dragging() {
            log::debug!("Gizmo mode switch to {:?} ignored during drag", mode);
            return;
        }
        if self.mode != mode {
            self.mode = mode;
            self.state = GizmoState::Idle;
        }
    }

    /// Drop any hover or drag without touching the world
    pub fn reset(&mut self) {
        self.state = GizmoState::Idle;
    }

    /// Run one frame of interaction for `selected`.
    ///
    /// Mutates the selected entity's transform while dragging and emits the
    /// handle lines into `debug`.
    pub fn update(
        &mut self,
        world: &mut World,
        selected: Option<Entity>,
        input: &GizmoInput,
        camera: &Camera,
        debug: &mut DebugDrawSystem,
    ) -> GizmoResponse {
        if let Some(mode) = input.mode_switch {
            self.set_mode(mode);
        }

        let Some((entity, transform)) = selected
            .and_then(|entity| Some((entity, world.get_component::<TransformComponent>(entity)?.clone())))
        else {
            if self.state.is_dragging() {
                log::debug!("Selected entity vanished mid-drag, gizmo reset");
            }
            self.state = GizmoState::Idle;
            return GizmoResponse::default();
        };

        let mut response = GizmoResponse::default();

        if let GizmoState::Dragging(session) = &self.state {
            if session.entity != entity {
                self.state = GizmoState::Idle;
            } else if input.cancel {
                let start = session.start_transform.clone();
                if let Some(current) = world.get_component_mut::<TransformComponent>(entity) {
                    *current = start;
                }
                log::debug!("Gizmo drag cancelled, transform restored");
                self.state = GizmoState::Idle;
                response.captured = true;
                response.modified = true;
            } else if input.released || !input.button_down {
                self.state = GizmoState::Hovering(session.handle);
                response.captured = true;
            } else {
                let session = session.clone();
                response.captured = true;
                if let Some(ray) = camera.screen_to_world_ray(input.cursor, input.viewport) {
                    if let Some(updated) = self.drag(&session, &ray) {
                        if let Some(current) = world.get_component_mut::<TransformComponent>(entity) {
                            *current = updated;
                            response.modified = true;
                        }
                    }
                }
            }
        }

        let origin = world
            .get_component::<TransformComponent>(entity)
            .map_or(transform.position, |current| current.position);
        let layout = HandleLayout::new(origin, camera.position, self.config.screen_fraction, self.config.ring_segments);

        if !self.state.is_dragging() {
            let hovered = layout.hit_test(
                self.mode,
                input.cursor,
                &camera.view_projection(),
                input.viewport,
                self.config.hover_threshold_px,
            );
            self.state = hovered.map_or(GizmoState::Idle, GizmoState::Hovering);

            if let Some(handle) = hovered {
                response.captured = true;
                if input.pressed {
                    self.begin_drag(entity, &transform, handle, input, camera);
                }
            }
        }

        layout.draw(self.mode, self.state.active_handle(), debug);
        response
    }

    fn begin_drag(
        &mut self,
        entity: Entity,
        transform: &TransformComponent,
        handle: GizmoHandle,
        input: &GizmoInput,
        camera: &Camera,
    ) {
        let Some(ray) = camera.screen_to_world_ray(input.cursor, input.viewport) else {
            return;
        };

        let axis = handle.direction();
        let origin = transform.position;

        let plane_normal = match self.mode {
            GizmoMode::Rotate => axis,
            GizmoMode::Translate | GizmoMode::Scale => {
                let view = (origin - camera.position).normalize();
                let side = axis.cross(&view);
                if side.norm() < DEGENERATE_EPSILON {
                    log::debug!("Gizmo axis {:?} is parallel to the view, drag not started", handle);
                    return;
                }
                let normal = side.cross(&axis);
                normal.normalize()
            }
        };

        let Some(t) = ray.intersect_plane(origin, plane_normal) else {
            return;
        };
        let hit = ray.point_at(t);
        let start_vector = hit - origin;

        if self.mode == GizmoMode::Rotate && start_vector.norm() < DEGENERATE_EPSILON {
            return;
        }

        log::debug!("Gizmo drag started: {:?} {:?}", self.mode, handle);
        self.state = GizmoState::Dragging(DragSession {
            entity,
            mode: self.mode,
            handle,
            start_transform: transform.clone(),
            axis,
            plane_point: origin,
            plane_normal,
            start_param: start_vector.dot(&axis),
            start_vector,
        });
    }

    /// Transform produced by dragging to `ray`, `None` if the ray misses the
    /// drag plane
    fn drag(&self, session: &DragSession, ray: &Ray) -> Option<TransformComponent> {
        let t = ray.intersect_plane(session.plane_point, session.plane_normal)?;
        let hit = ray.point_at(t);
        let start = &session.start_transform;
        let mut result = start.clone();

        match session.mode {
            GizmoMode::Translate => {
                let delta = (hit - session.plane_point).dot(&session.axis) - session.start_param;
                result.position = start.position + session.axis * delta;
            }
            GizmoMode::Scale => {
                let delta = (hit - session.plane_point).dot(&session.axis) - session.start_param;
                let mut scale = start.scale;
                for i in 0..3 {
                    if session.axis[i].abs() > 0.5 {
                        // Drag changes the magnitude; a mirrored axis stays mirrored
                        let magnitude = (start.scale[i].abs() + delta * self.config.scale_sensitivity)
                            .max(self.config.min_scale);
                        scale[i] = magnitude.copysign(start.scale[i]);
                    }
                }
                result.set_scale(scale);
            }
            GizmoMode::Rotate => {
                let current = hit - session.plane_point;
                if current.norm() < DEGENERATE_EPSILON {
                    return None;
                }
                let angle = signed_angle(&session.start_vector, &current, &session.axis);
                let rotation = rotation_about(&session.axis, angle) * euler_xyz_to_matrix(start.rotation);
                result.rotation = matrix_to_euler_xyz(&rotation);
            }
        }

        Some(result)
    }
}

impl Default for TransformGizmo {
    fn default() -> Self {
        Self::new(GizmoConfig::default())
    }
}

/// Angle from `from` to `to` around `axis`, positive counter-clockwise
fn signed_angle(from: &Vec3, to: &Vec3, axis: &Vec3) -> f32 {
    from.cross(to).dot(axis).atan2(from.dot(to))
}

fn rotation_about(axis: &Vec3, angle: f32) -> Mat3 {
    nalgebra::Rotation3::from_axis_angle(&nalgebra::Unit::new_normalize(*axis), angle).into_inner()
}
