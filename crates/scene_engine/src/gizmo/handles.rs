//! Handle geometry and screen-space hit testing
//!
//! Translate and scale handles are line segments from the object origin;
//! rotate handles are rings around each axis. Hit testing projects them to
//! pixels and measures cursor distance to the projected segments.

use crate::debug::{colors, DebugDrawSystem};
use crate::foundation::math::{constants::PI, Mat4, Vec2, Vec3};
use crate::spatial::{distance_to_segment, project_to_screen};

use super::types::{Axis, GizmoHandle, GizmoMode};

/// World-space placement of the gizmo for one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HandleLayout {
    /// Object origin
    pub origin: Vec3,
    /// Handle length and ring radius
    pub size: f32,
    /// Segments per rotate ring
    pub ring_segments: u32,
}

impl HandleLayout {
    /// Size handles proportionally to camera distance so they keep a roughly
    /// constant on-screen size
    pub fn new(origin: Vec3, camera_position: Vec3, screen_fraction: f32, ring_segments: u32) -> Self {
        let distance = (origin - camera_position).norm().max(1e-3);
        Self {
            origin,
            size: distance * screen_fraction,
            ring_segments: ring_segments.max(3),
        }
    }

    /// Handles available in a mode
    pub fn handles(mode: GizmoMode) -> &'static [GizmoHandle] {
        const AXES: [GizmoHandle; 3] = [
            GizmoHandle::Axis(Axis::X),
            GizmoHandle::Axis(Axis::Y),
            GizmoHandle::Axis(Axis::Z),
        ];
        const SCALE: [GizmoHandle; 4] = [
            GizmoHandle::Axis(Axis::X),
            GizmoHandle::Axis(Axis::Y),
            GizmoHandle::Axis(Axis::Z),
            GizmoHandle::Uniform,
        ];
        match mode {
            GizmoMode::Translate | GizmoMode::Rotate => &AXES,
            GizmoMode::Scale => &SCALE,
        }
    }

    /// Segment for a translate/scale handle
    pub fn segment(&self, handle: GizmoHandle) -> (Vec3, Vec3) {
        (self.origin, self.origin + handle.direction() * self.size)
    }

    /// Closed polyline of the ring around `axis`
    pub fn ring(&self, axis: Axis) -> Vec<Vec3> {
        let (u, v) = match axis {
            Axis::X => (Vec3::y(), Vec3::z()),
            Axis::Y => (Vec3::x(), Vec3::z()),
            Axis::Z => (Vec3::x(), Vec3::y()),
        };

        (0..self.ring_segments)
            .map(|i| {
                let angle = i as f32 / self.ring_segments as f32 * 2.0 * PI;
                self.origin + (u * angle.cos() + v * angle.sin()) * self.size
            })
            .collect()
    }

    /// Nearest handle within `threshold` pixels of the cursor
    pub fn hit_test(
        &self,
        mode: GizmoMode,
        cursor: Vec2,
        view_projection: &Mat4,
        viewport: Vec2,
        threshold: f32,
    ) -> Option<GizmoHandle> {
        let project = |point: Vec3| project_to_screen(point, view_projection, viewport);

        let mut best: Option<(GizmoHandle, f32)> = None;
        for &handle in Self::handles(mode) {
            let distance = match (mode, handle) {
                (GizmoMode::Rotate, GizmoHandle::Axis(axis)) => {
                    let ring = self.ring(axis);
                    (0..ring.len())
                        .filter_map(|i| {
                            let a = project(ring[i])?;
                            let b = project(ring[(i + 1) % ring.len()])?;
                            Some(distance_to_segment(cursor, a, b))
                        })
                        .fold(None, |min: Option<f32>, d| Some(min.map_or(d, |m| m.min(d))))
                }
                _ => {
                    let (start, end) = self.segment(handle);
                    match (project(start), project(end)) {
                        (Some(a), Some(b)) => Some(distance_to_segment(cursor, a, b)),
                        _ => None,
                    }
                }
            };

            let Some(distance) = distance else {
                continue;
            };
            if distance < threshold && best.map_or(true, |(_, d)| distance < d) {
                best = Some((handle, distance));
            }
        }

        best.map(|(handle, _)| handle)
    }

    /// Emit handle lines, highlighting `active`
    pub fn draw(&self, mode: GizmoMode, active: Option<GizmoHandle>, debug: &mut DebugDrawSystem) {
        for &handle in Self::handles(mode) {
            let color = if active == Some(handle) { colors::YELLOW } else { handle.color() };
            match (mode, handle) {
                (GizmoMode::Rotate, GizmoHandle::Axis(axis)) => debug.draw_loop(&self.ring(axis), color),
                _ => {
                    let (start, end) = self.segment(handle);
                    debug.draw_line(start, end, color);
                }
            }
        }
    }
}
