//! Editor frame orchestration
//!
//! Ties input, picking, the transform gizmo and selection together for one
//! viewport.

pub mod session;

pub use session::{EditorSession, FrameInput, FrameOutcome};
