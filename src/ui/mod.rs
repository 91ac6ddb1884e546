//! # User Interface Module
//!
//! Dear ImGui integration and the editor built on it.
//!
//! ## Key Components
//!
//! - [`UiManager`] - ImGui context, input forwarding, rendering, texture registration
//! - [`EditorLayout`] - the editor panels and the viewport framebuffer
//! - [`ViewportState`] - what the viewport panel measured last frame
//!
//! ## Input Handling
//!
//! ImGui receives every window event. Camera input is routed separately from the
//! viewport's hover and focus flags, see [`crate::input`].

pub mod editor_layout;
pub mod manager;
pub mod viewport;

pub use editor_layout::{EditorAction, EditorContext, EditorLayout};
pub use manager::UiManager;
pub use viewport::{TextureOrigin, ViewportState};
