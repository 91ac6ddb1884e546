//! GPU resource management
//!
//! Textures and the materials that bind them.

pub mod material;
pub mod texture_manager;
pub mod texture_resource;

pub use material::{Material, TextureKind, TextureRef};
pub use texture_manager::{TextureHandle, TextureLoader, TextureManager};
pub use texture_resource::TextureResource;
