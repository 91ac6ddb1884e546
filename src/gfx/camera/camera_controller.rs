use winit::{
    dpi::PhysicalPosition,
    event::{ElementState, KeyEvent, MouseButton, MouseScrollDelta},
    keyboard::{KeyCode, PhysicalKey},
};

use super::fly_camera::{CameraMovement, FlyCamera};

/// Pixels of trackpad scroll treated as one wheel notch
const PIXELS_PER_LINE: f32 = 40.0;

/// Turns raw window input into [`FlyCamera`] motion
///
/// The controller only tracks state; whether an event should reach it at all is
/// decided by the host from the viewport focus.
#[derive(Debug, Default)]
pub struct CameraController {
    forward: bool,
    backward: bool,
    left: bool,
    right: bool,
    up: bool,
    down: bool,
    is_look_held: bool,
}

impl CameraController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tracks movement keys; returns true if the key belongs to the camera
    pub fn process_keyboard(&mut self, event: &KeyEvent) -> bool {
        let PhysicalKey::Code(code) = event.physical_key else {
            return false;
        };
        let pressed = event.state == ElementState::Pressed;

        match code {
            KeyCode::KeyW => self.forward = pressed,
            KeyCode::KeyS => self.backward = pressed,
            KeyCode::KeyA => self.left = pressed,
            KeyCode::KeyD => self.right = pressed,
            KeyCode::Space => self.up = pressed,
            KeyCode::ControlLeft => self.down = pressed,
            _ => return false,
        }
        true
    }

    pub fn process_mouse_button(&mut self, button: MouseButton, state: ElementState) {
        if button == MouseButton::Right {
            self.is_look_held = state == ElementState::Pressed;
        }
    }

    /// Free-look from a raw mouse delta while the right button is held
    pub fn process_mouse_motion(&self, delta: (f64, f64), camera: &mut FlyCamera) {
        if self.is_look_held {
            camera.process_mouse_movement(delta.0 as f32, -delta.1 as f32, true);
        }
    }

    pub fn process_scroll(&self, delta: &MouseScrollDelta, camera: &mut FlyCamera) {
        let amount = match delta {
            MouseScrollDelta::LineDelta(_, y) => *y,
            MouseScrollDelta::PixelDelta(PhysicalPosition { y, .. }) => *y as f32 / PIXELS_PER_LINE,
        };
        camera.process_mouse_scroll(amount);
    }

    /// Moves the camera for every held key
    pub fn update_camera(&self, camera: &mut FlyCamera, delta_time: f32) {
        let held = [
            (self.forward, CameraMovement::Forward),
            (self.backward, CameraMovement::Backward),
            (self.left, CameraMovement::Left),
            (self.right, CameraMovement::Right),
            (self.up, CameraMovement::Up),
            (self.down, CameraMovement::Down),
        ];
        for (active, movement) in held {
            if active {
                camera.process_keyboard(movement, delta_time);
            }
        }
    }

    /// Drops every held key and button, e.g. when the viewport loses focus
    pub fn release_all(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use cgmath::Point3;

    use super::*;

    #[test]
    fn test_motion_ignored_without_right_button() {
        let mut controller = CameraController::new();
        let mut camera = FlyCamera::default();

        controller.process_mouse_motion((50.0, 0.0), &mut camera);
        assert_eq!(camera.yaw, -90.0);

        controller.process_mouse_button(MouseButton::Right, ElementState::Pressed);
        controller.process_mouse_motion((50.0, 0.0), &mut camera);
        assert!((camera.yaw - (-85.0)).abs() < 1e-5);

        controller.process_mouse_button(MouseButton::Right, ElementState::Released);
        assert!(!controller.is_look_held);
    }

    #[test]
    fn test_scroll_lines_change_zoom() {
        let controller = CameraController::new();
        let mut camera = FlyCamera::default();
        controller.process_scroll(&MouseScrollDelta::LineDelta(0.0, 5.0), &mut camera);
        assert_eq!(camera.zoom, 40.0);
    }

    #[test]
    fn test_release_all_stops_movement() {
        let mut controller = CameraController::new();
        controller.forward = true;
        controller.release_all();

        let mut camera = FlyCamera::default();
        controller.update_camera(&mut camera, 1.0);
        assert_eq!(camera.position, Point3::new(0.0, 0.0, 3.0));
    }
}
