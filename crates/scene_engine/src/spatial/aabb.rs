//! Axis-aligned bounding boxes

use serde::{Deserialize, Serialize};

use crate::foundation::math::{Mat4, Vec3};

/// Axis-Aligned Bounding Box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    /// Minimum corner of the bounding box
    pub min: Vec3,
    /// Maximum corner of the bounding box
    pub max: Vec3,
}

impl Aabb {
    /// Create a new AABB from min and max points
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Canonical cube bounds, [-1, 1] on every axis
    pub fn cube() -> Self {
        Self::new(Vec3::new(-1.0, -1.0, -1.0), Vec3::new(1.0, 1.0, 1.0))
    }

    /// Canonical plane bounds with a thin Y extent so it stays pickable
    pub fn plane() -> Self {
        Self::new(Vec3::new(-1.0, -0.01, -1.0), Vec3::new(1.0, 0.01, 1.0))
    }

    /// Empty box (min > max). Used as the "not resolved yet" marker and as
    /// the starting point for [`Aabb::expand`].
    pub fn inverted() -> Self {
        Self::new(Vec3::repeat(f32::MAX), Vec3::repeat(f32::MIN))
    }

    /// Smallest box containing all points; inverted when `points` is empty
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Vec3>) -> Self {
        points.into_iter().fold(Self::inverted(), |mut aabb, point| {
            aabb.expand(*point);
            aabb
        })
    }

    /// Grow to contain a point
    pub fn expand(&mut self, point: Vec3) {
        self.min = self.min.inf(&point);
        self.max = self.max.sup(&point);
    }

    /// Whether min <= max on every axis
    pub fn is_valid(&self) -> bool {
        self.min.x <= self.max.x && self.min.y <= self.max.y && self.min.z <= self.max.z
    }

    /// Get the center of the AABB
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Get the extents (half-size) of the AABB
    pub fn extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    /// Check if this AABB contains a point
    pub fn contains_point(&self, point: Vec3) -> bool {
        point.x >= self.min.x && point.x <= self.max.x &&
        point.y >= self.min.y && point.y <= self.max.y &&
        point.z >= self.min.z && point.z <= self.max.z
    }

    /// Bounds of this box after an affine transform
    pub fn transformed(&self, matrix: &Mat4) -> Self {
        if !self.is_valid() {
            return *self;
        }

        let mut result = Self::inverted();
        for i in 0..8 {
            let corner = Vec3::new(
                if i & 1 == 0 { self.min.x } else { self.max.x },
                if i & 2 == 0 { self.min.y } else { self.max.y },
                if i & 4 == 0 { self.min.z } else { self.max.z },
            );
            result.expand(matrix.transform_point(&corner.into()).coords);
        }
        result
    }

    /// Slab-method ray intersection.
    ///
    /// Returns `(t_enter, t_exit)` along `ray_dir` when the ray's line hits
    /// the box and the exit point is not behind the origin. `t_enter` is
    /// negative when the origin is inside the box.
    pub fn intersect_ray(&self, ray_origin: Vec3, ray_dir: Vec3) -> Option<(f32, f32)> {
        let mut t_enter = f32::NEG_INFINITY;
        let mut t_exit = f32::INFINITY;

        for axis in 0..3 {
            let origin = ray_origin[axis];
            let dir = ray_dir[axis];
            let (min, max) = (self.min[axis], self.max[axis]);

            if dir.abs() < f32::EPSILON {
                // Parallel to this slab: must already be between its planes
                if origin < min || origin > max {
                    return None;
                }
                continue;
            }

            let inv = 1.0 / dir;
            let mut t0 = (min - origin) * inv;
            let mut t1 = (max - origin) * inv;
            if t0 > t1 {
                std::mem::swap(&mut t0, &mut t1);
            }

            t_enter = t_enter.max(t0);
            t_exit = t_exit.min(t1);
            if t_enter > t_exit {
                return None;
            }
        }

        if t_exit < 0.0 {
            return None;
        }
        Some((t_enter, t_exit))
    }
}

impl Default for Aabb {
    fn default() -> Self {
        Self::inverted()
    }
}
