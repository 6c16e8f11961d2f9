//! # 3D Camera
//!
//! View and projection matrices for the editor viewport, plus the
//! screen-to-world ray used by picking and gizmo dragging.
//!
//! The view-projection chain is `P × X × V`: a standard right-handed Y-up
//! view matrix, the Vulkan coordinate flip, and a projection with depth in
//! [0, 1]. NDC therefore has Y pointing down, which matches pixel
//! coordinates measured from the top-left corner.

use crate::ecs::components::{CameraComponent, TransformComponent};
use crate::ecs::{Entity, World};
use crate::foundation::math::{utils, Mat4, Mat4Ext, Vec2, Vec3};
use crate::spatial::Ray;

/// 3D perspective camera
///
/// # Coordinate System
/// Uses standard right-handed Y-up coordinates in view space. The Vulkan
/// coordinate transformation is applied separately inside
/// [`Camera::view_projection`].
///
/// Matrices are computed on demand rather than cached.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    /// Camera position in world space
    pub position: Vec3,

    /// Point the camera is looking at in world space
    pub target: Vec3,

    /// Up vector for camera orientation (typically [0, 1, 0])
    pub up: Vec3,

    /// Vertical field of view in radians
    pub fov: f32,

    /// Aspect ratio (width / height)
    pub aspect: f32,

    /// Distance to near clipping plane
    pub near: f32,

    /// Distance to far clipping plane
    pub far: f32,
}

impl Camera {
    /// Create a perspective camera looking at the origin
    ///
    /// # Example
    /// ```rust
    /// use scene_engine::foundation::math::Vec3;
    /// use scene_engine::render::Camera;
    ///
    /// let camera = Camera::perspective(Vec3::new(0.0, 2.0, 5.0), 75.0, 16.0 / 9.0, 0.1, 100.0);
    /// assert!(camera.inverse_view_projection().is_some());
    /// ```
    pub fn perspective(position: Vec3, fov_degrees: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self {
            position,
            target: Vec3::zeros(),
            up: Vec3::new(0.0, 1.0, 0.0),
            fov: utils::deg_to_rad(fov_degrees),
            aspect,
            near,
            far,
        }
    }

    /// Build the viewport camera from a camera entity.
    ///
    /// The entity looks down its local -Z axis with local +Y up. Returns
    /// `None` if the entity lacks a transform or a camera component.
    pub fn from_entity(world: &World, entity: Entity, aspect: f32) -> Option<Self> {
        let transform = world.get_component::<TransformComponent>(entity)?;
        let lens = world.get_component::<CameraComponent>(entity)?;

        let rotation = transform.rotation_matrix();
        let forward = rotation * Vec3::new(0.0, 0.0, -1.0);
        let up = rotation * Vec3::new(0.0, 1.0, 0.0);

        Some(Self {
            position: transform.position,
            target: transform.position + forward,
            up,
            fov: lens.fov_y,
            aspect,
            near: lens.near,
            far: lens.far,
        })
    }

    /// The first active camera entity in the world, if any
    pub fn from_active_entity(world: &World, aspect: f32) -> Option<Self> {
        let (entity, _) = world.query::<CameraComponent>().find(|(_, lens)| lens.active)?;
        Self::from_entity(world, entity, aspect)
    }

    /// Point the camera at a target with a custom up vector
    pub fn look_at(&mut self, target: Vec3, up: Vec3) {
        self.target = target;
        self.up = up;
        log::trace!("Camera look_at updated - target: {:?}, up: {:?}", target, up);
    }

    /// Update the aspect ratio for viewport changes
    pub fn set_aspect_ratio(&mut self, aspect: f32) {
        if (self.aspect - aspect).abs() > 0.01 {
            log::debug!("Camera aspect ratio changed: {:.3} -> {:.3}", self.aspect, aspect);
        }
        self.aspect = aspect;
    }

    /// World-to-camera transform
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at(self.position, self.target, self.up)
    }

    /// Perspective projection (depth [0, 1])
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective(self.fov, self.aspect, self.near, self.far)
    }

    /// Combined `P × X × V`
    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * Mat4::vulkan_coordinate_transform() * self.view_matrix()
    }

    /// Inverse of [`Camera::view_projection`]; `None` for degenerate cameras
    pub fn inverse_view_projection(&self) -> Option<Mat4> {
        self.view_projection().try_inverse()
    }

    /// World-space ray through a pixel (origin on the near plane)
    pub fn screen_to_world_ray(&self, screen: Vec2, viewport: Vec2) -> Option<Ray> {
        let inverse = self.inverse_view_projection()?;
        Ray::from_screen(screen, viewport, &inverse)
    }
}

impl Default for Camera {
    /// Perspective camera above and behind the origin, looking at it
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 3.0, 3.0),
            target: Vec3::zeros(),
            up: Vec3::new(0.0, 1.0, 0.0),
            fov: std::f32::consts::FRAC_PI_4,
            aspect: 16.0 / 9.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spatial::project_to_screen;
    use approx::assert_relative_eq;

    fn test_camera() -> Camera {
        Camera::perspective(Vec3::new(0.0, 0.0, -5.0), 60.0, 800.0 / 600.0, 0.1, 100.0)
    }

    #[test]
    fn test_center_pixel_ray_points_at_target() {
        let viewport = Vec2::new(800.0, 600.0);
        let ray = test_camera().screen_to_world_ray(viewport * 0.5, viewport).unwrap();

        assert_relative_eq!(ray.direction, Vec3::new(0.0, 0.0, 1.0), epsilon = 1e-4);
        assert_relative_eq!(ray.origin, Vec3::new(0.0, 0.0, -4.9), epsilon = 1e-3);
    }

    #[test]
    fn test_top_of_screen_is_world_up() {
        let viewport = Vec2::new(800.0, 600.0);
        let ray = test_camera().screen_to_world_ray(Vec2::new(400.0, 0.0), viewport).unwrap();
        assert!(ray.direction.y > 0.0);
    }

    #[test]
    fn test_projection_and_unprojection_agree() {
        let camera = test_camera();
        let viewport = Vec2::new(800.0, 600.0);
        let point = Vec3::new(1.0, 0.5, 2.0);

        let screen = project_to_screen(point, &camera.view_projection(), viewport).unwrap();
        let ray = camera.screen_to_world_ray(screen, viewport).unwrap();

        let to_point = (point - ray.origin).normalize();
        assert_relative_eq!(ray.direction, to_point, epsilon = 1e-4);
    }

    #[test]
    fn test_points_behind_camera_do_not_project() {
        let camera = test_camera();
        let behind = project_to_screen(Vec3::new(0.0, 0.0, -10.0), &camera.view_projection(), Vec2::new(800.0, 600.0));
        assert!(behind.is_none());
    }

    #[test]
    fn test_camera_from_entity_looks_down_negative_z() {
        let mut world = World::new();
        let entity = world.create_object("Main Camera").unwrap();
        world
            .add_component(entity, TransformComponent::from_position(Vec3::new(0.0, 0.0, 10.0)))
            .unwrap();
        world.add_component(entity, CameraComponent::default()).unwrap();

        let camera = Camera::from_active_entity(&world, 1.0).unwrap();
        assert_relative_eq!(camera.target, Vec3::new(0.0, 0.0, 9.0), epsilon = 1e-6);

        let ray = camera.screen_to_world_ray(Vec2::new(50.0, 50.0), Vec2::new(100.0, 100.0)).unwrap();
        assert_relative_eq!(ray.direction, Vec3::new(0.0, 0.0, -1.0), epsilon = 1e-4);
    }
}
