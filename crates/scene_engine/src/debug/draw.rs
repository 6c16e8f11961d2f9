//! Debug line collection
//!
//! The gizmo and selection highlight emit world-space line segments every
//! frame. The list is cleared at the start of the next frame.

use crate::foundation::math::{Mat4, Vec3};
use crate::spatial::Aabb;

/// RGBA color
pub type Color = [f32; 4];

/// Standard debug colors
pub mod colors {
    use super::Color;

    /// X axis
    pub const RED: Color = [1.0, 0.2, 0.2, 1.0];
    /// Y axis
    pub const GREEN: Color = [0.2, 1.0, 0.2, 1.0];
    /// Z axis
    pub const BLUE: Color = [0.2, 0.4, 1.0, 1.0];
    /// Hovered or active handle
    pub const YELLOW: Color = [1.0, 1.0, 0.0, 1.0];
    /// Uniform handle
    pub const WHITE: Color = [1.0, 1.0, 1.0, 1.0];
    /// Selection outline
    pub const ORANGE: Color = [1.0, 0.6, 0.1, 1.0];
}

/// A colored world-space line segment
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DebugLine {
    /// Segment start
    pub start: Vec3,
    /// Segment end
    pub end: Vec3,
    /// RGBA color
    pub color: Color,
}

/// Debug drawing system for rendering debug lines
#[derive(Debug, Clone)]
pub struct DebugDrawSystem {
    lines: Vec<DebugLine>,

    /// Master enable/disable flag
    pub enabled: bool,
}

impl DebugDrawSystem {
    /// Create a new debug draw system
    pub fn new() -> Self {
        Self {
            lines: Vec::new(),
            enabled: true,
        }
    }

    /// Drop last frame's lines
    pub fn begin_frame(&mut self) {
        self.lines.clear();
    }

    /// Draw a line segment
    pub fn draw_line(&mut self, start: Vec3, end: Vec3, color: Color) {
        if !self.enabled {
            return;
        }
        self.lines.push(DebugLine { start, end, color });
    }

    /// Draw a closed loop through `points`
    pub fn draw_loop(&mut self, points: &[Vec3], color: Color) {
        if points.len() < 2 {
            return;
        }
        for (i, &start) in points.iter().enumerate() {
            let end = points[(i + 1) % points.len()];
            self.draw_line(start, end, color);
        }
    }

    /// Draw the 12 edges of an object-space box under `matrix`
    pub fn draw_box(&mut self, aabb: &Aabb, matrix: &Mat4, color: Color) {
        if !aabb.is_valid() {
            return;
        }

        let corner = |i: usize| {
            let local = Vec3::new(
                if i & 1 == 0 { aabb.min.x } else { aabb.max.x },
                if i & 2 == 0 { aabb.min.y } else { aabb.max.y },
                if i & 4 == 0 { aabb.min.z } else { aabb.max.z },
            );
            matrix.transform_point(&local.into()).coords
        };

        for i in 0..8 {
            for bit in [1, 2, 4] {
                if i & bit == 0 {
                    self.draw_line(corner(i), corner(i | bit), color);
                }
            }
        }
    }

    /// Lines collected this frame
    pub fn lines(&self) -> &[DebugLine] {
        &self.lines
    }

    /// Number of lines collected this frame
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }
}

impl Default for DebugDrawSystem {
    fn default() -> Self {
        Self::new()
    }
}
