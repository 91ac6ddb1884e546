//! Texture loading and caching
//!
//! [`TextureManager`] decodes image files with the `image` crate, uploads them
//! once per path and hands out [`TextureHandle`]s. Every material slot has a 1x1
//! fallback so a missing file never leaves a binding empty.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::RgbaImage;

use super::material::TextureKind;
use super::texture_resource::TextureResource;
use crate::error::AssetError;

/// Index of a texture owned by a [`TextureManager`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(usize);

impl TextureHandle {
    pub fn index(&self) -> usize {
        self.0
    }

    #[cfg(test)]
    pub(crate) fn from_index(index: usize) -> Self {
        Self(index)
    }
}

/// Anything that can turn a file path into a texture handle
///
/// Model loading goes through this trait so it can run without a GPU.
pub trait TextureLoader {
    fn load_texture(&mut self, path: &Path) -> Result<TextureHandle, AssetError>;
}

/// Decodes an image file to RGBA8
///
/// Rows are flipped so that texture coordinate `v = 0` addresses the bottom row,
/// which is what OBJ files and the built-in primitives assume.
pub fn decode_rgba(path: &Path) -> Result<RgbaImage, AssetError> {
    let image = image::open(path).map_err(|e| match e {
        image::ImageError::IoError(source) => AssetError::Io {
            path: path.to_path_buf(),
            source,
        },
        source => AssetError::Image {
            path: path.to_path_buf(),
            source,
        },
    })?;
    Ok(image::imageops::flip_vertical(&image.to_rgba8()))
}

/// Checks six decoded faces share one square size and returns it
pub fn validate_cubemap_faces(faces: &[(PathBuf, u32, u32)]) -> Result<u32, AssetError> {
    let expected = faces.first().map(|(_, w, _)| *w).unwrap_or(0);
    for (path, width, height) in faces {
        if *width != expected || *height != expected || expected == 0 {
            return Err(AssetError::CubemapFace {
                path: path.clone(),
                width: *width,
                height: *height,
                expected,
            });
        }
    }
    Ok(expected)
}

struct FallbackTextures {
    white: TextureResource,
    flat_normal: TextureResource,
    black: TextureResource,
}

pub struct TextureManager {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    textures: Vec<TextureResource>,
    by_path: HashMap<PathBuf, TextureHandle>,
    fallbacks: FallbackTextures,
    sampler: wgpu::Sampler,
}

impl TextureManager {
    pub fn new(device: Arc<wgpu::Device>, queue: Arc<wgpu::Queue>) -> Self {
        let fallbacks = FallbackTextures {
            white: TextureResource::create_solid(&device, &queue, [255, 255, 255, 255], "Fallback White"),
            flat_normal: TextureResource::create_solid(&device, &queue, [128, 128, 255, 255], "Fallback Normal"),
            black: TextureResource::create_solid(&device, &queue, [0, 0, 0, 255], "Fallback Black"),
        };

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Material Sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        Self {
            device,
            queue,
            textures: Vec::new(),
            by_path: HashMap::new(),
            fallbacks,
            sampler,
        }
    }

    /// Loads `path` once; later calls with the same path return the same handle
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<TextureHandle, AssetError> {
        let path = path.as_ref();
        if let Some(handle) = self.by_path.get(path) {
            return Ok(*handle);
        }

        let image = decode_rgba(path)?;
        let (width, height) = image.dimensions();
        let resource = TextureResource::create_from_rgba_data(
            &self.device,
            &self.queue,
            image.as_raw(),
            width,
            height,
            &path.display().to_string(),
        );

        let handle = TextureHandle(self.textures.len());
        self.textures.push(resource);
        self.by_path.insert(path.to_path_buf(), handle);
        log::info!("Loaded texture {} ({}x{})", path.display(), width, height);
        Ok(handle)
    }

    /// Loads six faces (+X, -X, +Y, -Y, +Z, -Z) into a cube texture
    pub fn load_cubemap(&self, faces: &[PathBuf; 6]) -> Result<TextureResource, AssetError> {
        let mut pixels: [Vec<u8>; 6] = Default::default();
        let mut sizes = Vec::with_capacity(6);

        for (slot, path) in pixels.iter_mut().zip(faces) {
            // Cubemap faces are sampled by direction, not uv, so they keep their row order
            let image = image::open(path)
                .map_err(|source| AssetError::Image {
                    path: path.clone(),
                    source,
                })?
                .to_rgba8();
            sizes.push((path.clone(), image.width(), image.height()));
            *slot = image.into_raw();
        }

        let size = validate_cubemap_faces(&sizes)?;
        Ok(TextureResource::create_cubemap(
            &self.device,
            &self.queue,
            &pixels,
            size,
            "Skybox Cubemap",
        ))
    }

    pub fn get(&self, handle: TextureHandle) -> Option<&TextureResource> {
        self.textures.get(handle.0)
    }

    /// View for `handle`, or the placeholder for `kind` if the handle is unknown
    pub fn view_or_fallback(&self, handle: Option<TextureHandle>, kind: TextureKind) -> &wgpu::TextureView {
        handle
            .and_then(|h| self.get(h))
            .map(|t| &t.view)
            .unwrap_or_else(|| &self.fallback(kind).view)
    }

    pub fn fallback(&self, kind: TextureKind) -> &TextureResource {
        match kind {
            TextureKind::Diffuse | TextureKind::Specular => &self.fallbacks.white,
            TextureKind::Normal => &self.fallbacks.flat_normal,
            TextureKind::Height => &self.fallbacks.black,
        }
    }

    pub fn sampler(&self) -> &wgpu::Sampler {
        &self.sampler
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }
}

impl TextureLoader for TextureManager {
    fn load_texture(&mut self, path: &Path) -> Result<TextureHandle, AssetError> {
        self.load(path)
    }
}
