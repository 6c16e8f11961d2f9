//! Editor highlight state
//!
//! Written only by [`crate::editor::EditorSession`]; renderers read it to
//! decide which entities get an outline.

use crate::ecs::Component;

/// Selection and hover flags, each stamped with the frame it last changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SelectionComponent {
    /// The entity is the current selection
    pub selected: bool,

    /// The cursor is over the entity
    pub hovered: bool,

    /// Frame of the last `selected` change
    pub selection_frame: u64,

    /// Frame of the last `hovered` change
    pub hover_frame: u64,
}

impl SelectionComponent {
    /// Set the selected flag. Returns whether it changed; the frame stamp
    /// only moves on a change.
    pub fn set_selected(&mut self, selected: bool, frame: u64) -> bool {
        if self.selected == selected {
            return false;
        }
        self.selected = selected;
        self.selection_frame = frame;
        true
    }

    /// Set the hovered flag, with the same stamping rule as
    /// [`Self::set_selected`]
    pub fn set_hovered(&mut self, hovered: bool, frame: u64) -> bool {
        if self.hovered == hovered {
            return false;
        }
        self.hovered = hovered;
        self.hover_frame = frame;
        true
    }

    /// Whether any outline should be drawn
    pub fn is_highlighted(&self) -> bool {
        self.selected || self.hovered
    }
}

impl Component for SelectionComponent {}
