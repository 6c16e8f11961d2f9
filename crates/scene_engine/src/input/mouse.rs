//! Mouse state for picking and gizmo interaction
//!
//! Tracks the cursor in viewport pixels plus left-button edges so a frame can
//! tell "pressed this frame" apart from "held".

use crate::foundation::math::Vec2;

/// Mouse state for one viewport
#[derive(Debug, Clone, PartialEq)]
pub struct MouseState {
    /// Cursor position in pixels from the top-left corner
    pub position: Vec2,
    /// Viewport size in pixels
    pub viewport: Vec2,
    /// Whether the left button is currently held down
    pub button_down: bool,
    /// Left button went down this frame
    pub pressed: bool,
    /// Left button went up this frame
    pub released: bool,
}

impl MouseState {
    /// Create a mouse state for a viewport of the given size
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            position: Vec2::zeros(),
            viewport: Vec2::new(width as f32, height as f32),
            button_down: false,
            pressed: false,
            released: false,
        }
    }

    /// Update mouse position from window events
    pub fn update_position(&mut self, x: f32, y: f32) {
        self.position = Vec2::new(x, y);
    }

    /// Update viewport size (for NDC conversion)
    pub fn update_window_size(&mut self, width: u32, height: u32) {
        self.viewport = Vec2::new(width as f32, height as f32);
    }

    /// Feed the current left-button level; edges are derived from the
    /// previous level
    pub fn set_button(&mut self, down: bool) {
        self.pressed = down && !self.button_down;
        self.released = !down && self.button_down;
        self.button_down = down;
    }

    /// Clear edge flags (call at end of frame)
    pub fn clear_edges(&mut self) {
        self.pressed = false;
        self.released = false;
    }

    /// Convert the cursor position to Normalized Device Coordinates
    ///
    /// NDC range: [-1, 1] where:
    /// - X: -1 = left, +1 = right
    /// - Y: -1 = top, +1 = bottom
    pub fn screen_to_ndc(&self) -> Vec2 {
        if self.viewport.x <= 0.0 || self.viewport.y <= 0.0 {
            return Vec2::zeros();
        }
        Vec2::new(
            self.position.x / self.viewport.x * 2.0 - 1.0,
            self.position.y / self.viewport.y * 2.0 - 1.0,
        )
    }
}

impl Default for MouseState {
    fn default() -> Self {
        Self::new(1920, 1080)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_screen_to_ndc_center() {
        let mut mouse = MouseState::new(1920, 1080);
        mouse.update_position(960.0, 540.0);
        assert_relative_eq!(mouse.screen_to_ndc(), Vec2::zeros(), epsilon = 1e-3);
    }

    #[test]
    fn test_screen_to_ndc_corners() {
        let mut mouse = MouseState::new(1920, 1080);
        mouse.update_position(0.0, 0.0);
        assert_relative_eq!(mouse.screen_to_ndc(), Vec2::new(-1.0, -1.0), epsilon = 1e-3);

        mouse.update_position(1920.0, 1080.0);
        assert_relative_eq!(mouse.screen_to_ndc(), Vec2::new(1.0, 1.0), epsilon = 1e-3);
    }

    #[test]
    fn test_button_edges() {
        let mut mouse = MouseState::default();

        mouse.set_button(true);
        assert!(mouse.pressed && mouse.button_down && !mouse.released);

        mouse.set_button(true);
        assert!(!mouse.pressed && mouse.button_down);

        mouse.set_button(false);
        assert!(mouse.released && !mouse.button_down);

        mouse.clear_edges();
        assert!(!mouse.released);
    }
}
