//! Core rendering functionality
//!
//! The GPU context, the off-screen [`Framebuffer`] the scene is drawn into, the
//! pipelines derived from [`RenderSettings`] and the [`ShaderProgram`] seam the
//! scene submits its draws through.

pub mod framebuffer;
pub mod gpu_context;
pub mod pipeline_manager;
pub mod renderer;
pub mod scene_pass;
pub mod shader;
pub mod shader_library;
pub mod skybox;

pub use framebuffer::{AttachmentAllocator, Framebuffer, FramebufferError};
pub use gpu_context::GpuContext;
pub use pipeline_manager::{PipelineConfig, PipelineManager, PipelineState};
pub use renderer::{scene_uniforms, Lighting, RenderSettings, Renderer};
pub use scene_pass::{FrameStats, ScenePass};
pub use shader::{FrameUniforms, ShaderProgram};
pub use shader_library::ShaderLibrary;
pub use skybox::Skybox;
