//! Transform gizmo
//!
//! Screen-space handles for translating, rotating and scaling the selected
//! entity. All three modes share one state machine:
//!
//! - `Idle → Hovering`: cursor comes within the hover threshold of a handle
//!   (nearest handle wins)
//! - `Hovering → Dragging`: left button pressed; the start transform and a
//!   fixed drag plane are captured
//! - `Dragging → Dragging`: cursor moves; the transform is recomputed from
//!   the start state
//! - `Dragging → Hovering/Idle`: button released (commit) or Escape
//!   (restore the start transform)

pub mod types;
pub mod handles;
pub mod manipulator;

pub use types::{Axis, DragSession, GizmoHandle, GizmoInput, GizmoMode, GizmoResponse, GizmoState};
pub use handles::HandleLayout;
pub use manipulator::TransformGizmo;
