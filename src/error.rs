// src/error.rs
//! Error types shared across the engine
//!
//! Startup failures are fatal and surface as [`EngineError`]. Asset failures are
//! reported as [`AssetError`] so callers can log them and fall back to placeholders.

use std::path::PathBuf;

use crate::config::ConfigError;

/// Unrecoverable initialization failures
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("failed to create event loop: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),

    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),

    #[error("failed to create rendering surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),

    #[error("no compatible GPU adapter: {0}")]
    Adapter(#[from] wgpu::RequestAdapterError),

    #[error("failed to acquire GPU device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),

    #[error("surface reports no supported formats")]
    NoSurfaceFormat,

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("application init failed: {0}")]
    Init(String),
}

/// Recoverable failures while loading textures, models and shaders
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode image {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to load model {path}: {source}")]
    Model {
        path: PathBuf,
        #[source]
        source: tobj::LoadError,
    },

    #[error("model {0} contains no meshes")]
    EmptyModel(PathBuf),

    #[error("cubemap face {path} is {width}x{height}, expected {expected}x{expected}")]
    CubemapFace {
        path: PathBuf,
        width: u32,
        height: u32,
        expected: u32,
    },

    #[error("shader '{name}' failed to compile: {message}")]
    Shader { name: String, message: String },
}
