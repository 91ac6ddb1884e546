//! # Camera
//!
//! A first-person [`FlyCamera`] and the [`CameraController`] that feeds it
//! keyboard, mouse and scroll input.

pub mod camera_controller;
pub mod fly_camera;

pub use camera_controller::CameraController;
pub use fly_camera::{CameraMovement, FlyCamera, OPENGL_TO_WGPU_MATRIX};
