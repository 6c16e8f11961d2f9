//! Gizmo modes, handles, input and state

use crate::debug::{colors, Color};
use crate::ecs::components::TransformComponent;
use crate::ecs::Entity;
use crate::foundation::math::{Vec2, Vec3};
use crate::input::MouseState;

/// Which transform property the gizmo edits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GizmoMode {
    /// Move along an axis
    #[default]
    Translate,
    /// Rotate about an axis
    Rotate,
    /// Scale along an axis, or uniformly
    Scale,
}

/// World axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    /// +X
    X,
    /// +Y
    Y,
    /// +Z
    Z,
}

impl Axis {
    /// All three axes in X, Y, Z order
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    /// Unit direction in world space
    pub fn unit(self) -> Vec3 {
        match self {
            Axis::X => Vec3::x(),
            Axis::Y => Vec3::y(),
            Axis::Z => Vec3::z(),
        }
    }

    /// Handle color
    pub fn color(self) -> Color {
        match self {
            Axis::X => colors::RED,
            Axis::Y => colors::GREEN,
            Axis::Z => colors::BLUE,
        }
    }
}

/// A grabbable part of the gizmo
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GizmoHandle {
    /// Single-axis handle (arrow, ring or scale bar)
    Axis(Axis),
    /// Diagonal handle that scales all three axes together
    Uniform,
}

impl GizmoHandle {
    /// Unit drag direction in world space
    ///
    /// The uniform handle drags along the (1, 1, 1) diagonal, whose every
    /// component exceeds 0.5 in magnitude, so scale drags affect all axes.
    pub fn direction(self) -> Vec3 {
        match self {
            GizmoHandle::Axis(axis) => axis.unit(),
            GizmoHandle::Uniform => Vec3::new(1.0, 1.0, 1.0).normalize(),
        }
    }

    /// Handle color when not highlighted
    pub fn color(self) -> Color {
        match self {
            GizmoHandle::Axis(axis) => axis.color(),
            GizmoHandle::Uniform => colors::WHITE,
        }
    }
}

/// Per-frame input for the gizmo
#[derive(Debug, Clone, PartialEq)]
pub struct GizmoInput {
    /// Cursor in pixels from the top-left corner
    pub cursor: Vec2,
    /// Viewport size in pixels
    pub viewport: Vec2,
    /// Left button currently held
    pub button_down: bool,
    /// Left button went down this frame
    pub pressed: bool,
    /// Left button went up this frame
    pub released: bool,
    /// Mode hotkey pressed this frame
    pub mode_switch: Option<GizmoMode>,
    /// Cancel key (Escape) pressed this frame
    pub cancel: bool,
}

impl GizmoInput {
    /// Build from the mouse state with no keyboard input
    pub fn from_mouse(mouse: &MouseState) -> Self {
        Self {
            cursor: mouse.position,
            viewport: mouse.viewport,
            button_down: mouse.button_down,
            pressed: mouse.pressed,
            released: mouse.released,
            mode_switch: None,
            cancel: false,
        }
    }

    /// Attach a mode hotkey
    pub fn with_mode_switch(mut self, mode: GizmoMode) -> Self {
        self.mode_switch = Some(mode);
        self
    }

    /// Attach a cancel key press
    pub fn with_cancel(mut self) -> Self {
        self.cancel = true;
        self
    }
}

/// Everything captured when a drag starts
#[derive(Debug, Clone, PartialEq)]
pub struct DragSession {
    /// Entity being manipulated
    pub entity: Entity,
    /// Mode the drag started in
    pub mode: GizmoMode,
    /// Grabbed handle
    pub handle: GizmoHandle,
    /// Transform at drag start, restored on cancel
    pub start_transform: TransformComponent,
    /// Unit drag direction (translate/scale) or rotation axis (rotate)
    pub axis: Vec3,
    /// A point on the fixed drag plane (the object origin at drag start)
    pub plane_point: Vec3,
    /// Unit normal of the fixed drag plane
    pub plane_normal: Vec3,
    /// Axis parameter of the first plane hit (translate/scale)
    pub start_param: f32,
    /// Origin-to-hit vector of the first plane hit (rotate)
    pub start_vector: Vec3,
}

/// Gizmo interaction state
#[derive(Debug, Clone, PartialEq, Default)]
pub enum GizmoState {
    /// No selection, or the cursor is away from every handle
    #[default]
    Idle,
    /// Cursor within the hover threshold of a handle
    Hovering(GizmoHandle),
    /// Button held on a handle
    Dragging(DragSession),
}

impl GizmoState {
    /// Handle under the cursor or being dragged
    pub fn active_handle(&self) -> Option<GizmoHandle> {
        match self {
            GizmoState::Idle => None,
            GizmoState::Hovering(handle) => Some(*handle),
            GizmoState::Dragging(session) => Some(session.handle),
        }
    }

    /// Whether a drag is in progress
    pub fn is_dragging(&self) -> bool {
        matches!(self, GizmoState::Dragging(_))
    }
}

/// What the gizmo did this frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GizmoResponse {
    /// The pointer is over or using the gizmo; the click must not pick
    pub captured: bool,
    /// The selected entity's transform was written
    pub modified: bool,
}
