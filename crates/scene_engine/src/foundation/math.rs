//! Math utilities and types
//!
//! Provides the fundamental math types for the scene core, plus the Euler
//! convention shared by transforms, picking and the rotate gizmo.

pub use nalgebra::{
    Vector2, Vector3, Vector4,
    Matrix3, Matrix4,
};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 3x3 matrix type
pub type Mat3 = Matrix3<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// Math constants
pub mod constants {
    /// Pi constant
    pub const PI: f32 = std::f32::consts::PI;

    /// Pi / 2
    pub const HALF_PI: f32 = PI * 0.5;

    /// Degrees to radians conversion factor
    pub const DEG_TO_RAD: f32 = PI / 180.0;

    /// Radians to degrees conversion factor
    pub const RAD_TO_DEG: f32 = 180.0 / PI;
}

/// Math utility functions
pub mod utils {
    use super::constants;

    /// Convert degrees to radians
    pub fn deg_to_rad(degrees: f32) -> f32 {
        degrees * constants::DEG_TO_RAD
    }

    /// Convert radians to degrees
    pub fn rad_to_deg(radians: f32) -> f32 {
        radians * constants::RAD_TO_DEG
    }
}

/// Rotation matrix for Euler angles in the engine's XYZ convention.
///
/// The result is `Rx * Ry * Rz`: matrices are composed in X, Y, Z order, so
/// a column vector is rotated about Z first and about X last. Every world
/// matrix and every gizmo rotation goes through this function.
pub fn euler_xyz_to_matrix(euler: Vec3) -> Mat3 {
    let (sx, cx) = euler.x.sin_cos();
    let (sy, cy) = euler.y.sin_cos();
    let (sz, cz) = euler.z.sin_cos();

    let rx = Mat3::new(
        1.0, 0.0, 0.0,
        0.0, cx, -sx,
        0.0, sx, cx,
    );
    let ry = Mat3::new(
        cy, 0.0, sy,
        0.0, 1.0, 0.0,
        -sy, 0.0, cy,
    );
    let rz = Mat3::new(
        cz, -sz, 0.0,
        sz, cz, 0.0,
        0.0, 0.0, 1.0,
    );

    rx * ry * rz
}

/// Decompose a pure rotation matrix back into XYZ Euler angles.
///
/// Inverse of [`euler_xyz_to_matrix`]. At gimbal lock (|Y| = 90°) the Z
/// angle is folded into X.
pub fn matrix_to_euler_xyz(m: &Mat3) -> Vec3 {
    let sy = m[(0, 2)].clamp(-1.0, 1.0);
    let y = sy.asin();

    if sy.abs() < 0.999_999 {
        let x = (-m[(1, 2)]).atan2(m[(2, 2)]);
        let z = (-m[(0, 1)]).atan2(m[(0, 0)]);
        Vec3::new(x, y, z)
    } else {
        let x = m[(2, 1)].atan2(m[(1, 1)]);
        Vec3::new(x, y, 0.0)
    }
}

/// Extension trait for Mat4 with additional convenience methods
pub trait Mat4Ext {
    /// Create a rotation matrix around the X axis
    fn rotation_x(angle: f32) -> Mat4;

    /// Create a rotation matrix around the Y axis
    fn rotation_y(angle: f32) -> Mat4;

    /// Create a rotation matrix around the Z axis
    fn rotation_z(angle: f32) -> Mat4;

    /// Create a perspective projection matrix (depth mapped to [0, 1])
    fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4;

    /// Create a right-handed look-at view matrix
    fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Mat4;

    /// Flip from Y-up/-Z-forward view space to Vulkan's Y-down/+Z-forward
    fn vulkan_coordinate_transform() -> Mat4;
}

impl Mat4Ext for Mat4 {
    fn rotation_x(angle: f32) -> Mat4 {
        Mat4::from_axis_angle(&Vec3::x_axis(), angle)
    }

    fn rotation_y(angle: f32) -> Mat4 {
        Mat4::from_axis_angle(&Vec3::y_axis(), angle)
    }

    fn rotation_z(angle: f32) -> Mat4 {
        Mat4::from_axis_angle(&Vec3::z_axis(), angle)
    }

    fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
        // P = [a⁻¹/tan(φ/2)    0              0            0          ]
        //     [0               1/tan(φ/2)     0            0          ]
        //     [0               0              f/(f-n)      -nf/(f-n)  ]
        //     [0               0              1            0          ]
        let tan_half_fovy = (fov_y * 0.5).tan();

        let mut result = Mat4::zeros();
        result[(0, 0)] = 1.0 / (aspect * tan_half_fovy);
        result[(1, 1)] = 1.0 / tan_half_fovy;
        result[(2, 2)] = far / (far - near);
        result[(2, 3)] = -(near * far) / (far - near);
        result[(3, 2)] = 1.0;

        result
    }

    fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Mat4 {
        let forward = (target - eye).normalize();
        let right = forward.cross(&up).normalize();
        let camera_up = right.cross(&forward);

        let translation = Mat4::new(
            1.0, 0.0, 0.0, -eye.x,
            0.0, 1.0, 0.0, -eye.y,
            0.0, 0.0, 1.0, -eye.z,
            0.0, 0.0, 0.0, 1.0,
        );

        let rotation = Mat4::new(
            right.x, right.y, right.z, 0.0,
            camera_up.x, camera_up.y, camera_up.z, 0.0,
            -forward.x, -forward.y, -forward.z, 0.0,
            0.0, 0.0, 0.0, 1.0,
        );

        rotation * translation
    }

    fn vulkan_coordinate_transform() -> Mat4 {
        Mat4::new(
            1.0, 0.0, 0.0, 0.0,
            0.0, -1.0, 0.0, 0.0,
            0.0, 0.0, -1.0, 0.0,
            0.0, 0.0, 0.0, 1.0,
        )
    }
}
