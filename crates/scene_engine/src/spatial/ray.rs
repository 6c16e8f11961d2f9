//! Rays and screen-space unprojection

use crate::foundation::math::{Mat4, Vec2, Vec3, Vec4};

/// A ray for ray casting and picking
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    /// The origin point of the ray
    pub origin: Vec3,
    /// The direction of the ray (normalized)
    pub direction: Vec3,
}

impl Ray {
    /// Creates a new ray with the given origin and direction
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
        }
    }

    /// Get a point along the ray at distance t
    pub fn point_at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Build a world-space ray through a screen pixel.
    ///
    /// `screen` is in pixels from the top-left corner of a viewport of size
    /// `viewport`. NDC follows the Vulkan convention (Y down, depth [0, 1]),
    /// matching [`crate::render::Camera::view_projection`].
    pub fn from_screen(screen: Vec2, viewport: Vec2, inverse_view_projection: &Mat4) -> Option<Self> {
        if viewport.x <= 0.0 || viewport.y <= 0.0 {
            return None;
        }

        let ndc_x = screen.x / viewport.x * 2.0 - 1.0;
        let ndc_y = screen.y / viewport.y * 2.0 - 1.0;

        let near = unproject(inverse_view_projection, Vec4::new(ndc_x, ndc_y, 0.0, 1.0))?;
        let far = unproject(inverse_view_projection, Vec4::new(ndc_x, ndc_y, 1.0, 1.0))?;

        let direction = far - near;
        if direction.norm_squared() <= f32::EPSILON {
            return None;
        }
        Some(Self::new(near, direction))
    }

    /// Transform into another space.
    ///
    /// The origin is transformed as a point, the direction as a vector
    /// (w = 0, translation ignored) and re-normalized, since non-uniform
    /// scale changes its length.
    pub fn transformed(&self, matrix: &Mat4) -> Self {
        let origin = matrix.transform_point(&self.origin.into()).coords;
        let direction = matrix.transform_vector(&self.direction);
        Self::new(origin, direction)
    }

    /// Intersect with the plane through `point` with `normal`.
    ///
    /// Returns the ray parameter, which may be negative (plane behind the
    /// origin). `None` when the ray is parallel to the plane.
    pub fn intersect_plane(&self, point: Vec3, normal: Vec3) -> Option<f32> {
        let denom = normal.dot(&self.direction);
        if denom.abs() < 1e-6 {
            return None;
        }
        Some(normal.dot(&(point - self.origin)) / denom)
    }
}

fn unproject(inverse_view_projection: &Mat4, ndc: Vec4) -> Option<Vec3> {
    let world = inverse_view_projection * ndc;
    if world.w.abs() < f32::EPSILON {
        return None;
    }
    Some(world.xyz() / world.w)
}
