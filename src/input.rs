//! Routing of window input between the editor UI and the camera
//!
//! ImGui sees every event. The camera only sees what the viewport panel
//! accepts: look and zoom while the cursor is over the viewport, movement keys
//! while the viewport window has focus and no text field is being edited.

use winit::event::{ElementState, MouseButton};

/// Viewport state reported by the editor for the current frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ViewportFocus {
    pub hovered: bool,
    pub focused: bool,
    pub text_input_active: bool,
}

impl ViewportFocus {
    /// Stores the new state; returns true when the viewport just lost keyboard focus
    pub fn update(&mut self, hovered: bool, focused: bool, text_input_active: bool) -> bool {
        let had_keyboard = self.accepts_keyboard();
        *self = Self {
            hovered,
            focused,
            text_input_active,
        };
        had_keyboard && !self.accepts_keyboard()
    }

    pub fn accepts_keyboard(&self) -> bool {
        self.focused && !self.text_input_active
    }

    pub fn accepts_scroll(&self) -> bool {
        self.hovered
    }

    /// Pressing the look button only counts over the viewport; releasing always does
    pub fn accepts_mouse_button(&self, button: MouseButton, state: ElementState) -> bool {
        match (button, state) {
            (MouseButton::Right, ElementState::Released) => true,
            (MouseButton::Right, ElementState::Pressed) => self.hovered,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyboard_needs_focus_without_text_input() {
        let mut focus = ViewportFocus::default();
        assert!(!focus.accepts_keyboard());

        focus.update(false, true, false);
        assert!(focus.accepts_keyboard());

        focus.update(false, true, true);
        assert!(!focus.accepts_keyboard());
    }

    #[test]
    fn test_losing_focus_is_reported_once() {
        let mut focus = ViewportFocus::default();
        assert!(!focus.update(true, true, false));
        assert!(focus.update(false, false, false));
        assert!(!focus.update(false, false, false));
    }

    #[test]
    fn test_look_starts_only_over_viewport() {
        let mut focus = ViewportFocus::default();
        assert!(!focus.accepts_mouse_button(MouseButton::Right, ElementState::Pressed));
        assert!(focus.accepts_mouse_button(MouseButton::Right, ElementState::Released));

        focus.update(true, false, false);
        assert!(focus.accepts_mouse_button(MouseButton::Right, ElementState::Pressed));
        assert!(focus.accepts_scroll());
        assert!(!focus.accepts_mouse_button(MouseButton::Left, ElementState::Pressed));
    }
}
