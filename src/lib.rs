//! Kiln
//!
//! A small real-time 3D rendering sandbox with an embedded editor, built on
//! wgpu, winit and Dear ImGui. The scene is rendered off-screen into a
//! framebuffer that the editor shows inside its viewport panel.

pub mod app;
pub mod config;
pub mod error;
pub mod gfx;
pub mod input;
pub mod logging;
pub mod ui;
pub mod wgpu_utils;

pub use app::{App, AppCallbacks, EngineContext};
pub use config::EngineConfig;
pub use error::{AssetError, EngineError};
