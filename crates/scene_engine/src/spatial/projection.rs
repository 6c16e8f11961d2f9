//! World-to-screen projection helpers for screen-space hit testing

use crate::foundation::math::{Mat4, Vec2, Vec3, Vec4};

/// Project a world-space point to viewport pixels.
///
/// Returns `None` for points at or behind the camera plane.
pub fn project_to_screen(point: Vec3, view_projection: &Mat4, viewport: Vec2) -> Option<Vec2> {
    let clip = view_projection * Vec4::new(point.x, point.y, point.z, 1.0);
    if clip.w <= 1e-6 {
        return None;
    }

    let ndc_x = clip.x / clip.w;
    let ndc_y = clip.y / clip.w;
    Some(Vec2::new(
        (ndc_x + 1.0) * 0.5 * viewport.x,
        (ndc_y + 1.0) * 0.5 * viewport.y,
    ))
}

/// Distance from `point` to the segment `a`–`b` in screen space
pub fn distance_to_segment(point: Vec2, a: Vec2, b: Vec2) -> f32 {
    let ab = b - a;
    let length_squared = ab.norm_squared();
    if length_squared <= f32::EPSILON {
        return (point - a).norm();
    }

    let t = ((point - a).dot(&ab) / length_squared).clamp(0.0, 1.0);
    (point - (a + ab * t)).norm()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_distance_to_segment() {
        let a = Vec2::new(0.0, 0.0);
        let b = Vec2::new(10.0, 0.0);

        assert_relative_eq!(distance_to_segment(Vec2::new(5.0, 3.0), a, b), 3.0);
        assert_relative_eq!(distance_to_segment(Vec2::new(-4.0, 3.0), a, b), 5.0);
        assert_relative_eq!(distance_to_segment(Vec2::new(1.0, 1.0), a, a), 2.0_f32.sqrt());
    }

    #[test]
    fn test_identity_projection_maps_ndc_to_pixels() {
        let viewport = Vec2::new(200.0, 100.0);
        let screen = project_to_screen(Vec3::new(0.0, 0.0, 0.5), &Mat4::identity(), viewport).unwrap();
        assert_relative_eq!(screen, Vec2::new(100.0, 50.0));

        let corner = project_to_screen(Vec3::new(-1.0, -1.0, 0.5), &Mat4::identity(), viewport).unwrap();
        assert_relative_eq!(corner, Vec2::new(0.0, 0.0));
    }
}
