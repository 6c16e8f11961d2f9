//! Per-frame input snapshot consumed by the editor session

pub mod mouse;

pub use mouse::MouseState;
