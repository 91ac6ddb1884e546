//! # Graphics Module
//!
//! Everything needed to get a scene onto the GPU.
//!
//! ## Architecture Overview
//!
//! - **Camera** ([`camera`]) - fly camera and its input controller
//! - **Geometry** ([`geometry`]) - built-in primitives and tangent generation
//! - **Rendering** ([`rendering`]) - GPU context, framebuffer, pipelines, renderer
//! - **Resources** ([`resources`]) - textures and materials
//! - **Scene** ([`scene`]) - transforms, meshes, models and the scene manager
//!
//! ## Frame flow
//!
//! The scene is drawn off-screen into a [`Framebuffer`], whose color texture the
//! editor then shows inside its viewport panel:
//!
//! ```no_run
//! # fn frame(
//! #     renderer: &mut kiln::gfx::Renderer,
//! #     framebuffer: &kiln::gfx::Framebuffer,
//! #     scene: &mut kiln::gfx::SceneManager,
//! #     textures: &kiln::gfx::resources::TextureManager,
//! #     encoder: &mut wgpu::CommandEncoder,
//! #     uniforms: &kiln::gfx::rendering::FrameUniforms,
//! # ) {
//! use kiln::gfx::Renderer;
//!
//! renderer.prepare_frame(scene, textures);
//! if let Some(mut pass) = renderer.begin_frame(encoder, framebuffer, None) {
//!     Renderer::render_scene(&mut pass, scene, uniforms);
//!     Renderer::end_frame(framebuffer, pass);
//! }
//! # }
//! ```

pub mod camera;
pub mod geometry;
pub mod rendering;
pub mod resources;
pub mod scene;

pub use camera::FlyCamera;
pub use rendering::{Framebuffer, Renderer};
pub use scene::SceneManager;
