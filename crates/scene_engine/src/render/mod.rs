//! Rendering-side math shared by picking and the gizmo
//!
//! Only the camera lives here; command recording and presentation belong to
//! the renderer that consumes the debug-draw list and the TLAS handle.

pub mod camera;

pub use camera::Camera;
