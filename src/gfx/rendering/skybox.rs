//! Cubemap environment drawn behind the scene

use std::path::{Path, PathBuf};

use crate::error::AssetError;
use crate::gfx::resources::texture_manager::TextureManager;
use crate::gfx::resources::texture_resource::TextureResource;
use crate::wgpu_utils::binding_types;

/// Face files in cubemap layer order (+X, -X, +Y, -Y, +Z, -Z)
pub const SKYBOX_FACES: [&str; 6] = [
    "right.png",
    "left.png",
    "top.png",
    "bottom.png",
    "front.png",
    "back.png",
];

pub fn face_paths(dir: &Path) -> [PathBuf; 6] {
    SKYBOX_FACES.map(|face| dir.join(face))
}

#[derive(Debug)]
pub struct Skybox {
    /// Owns the texture the bind group samples
    _cubemap: TextureResource,
    bind_group: wgpu::BindGroup,
}

impl Skybox {
    pub fn new(device: &wgpu::Device, layout: &wgpu::BindGroupLayout, cubemap: TextureResource) -> Self {
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Skybox Bind Group"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&cubemap.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&cubemap.sampler),
                },
            ],
        });

        Self {
            _cubemap: cubemap,
            bind_group,
        }
    }

    /// Loads the six faces from `dir`
    pub fn load(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        textures: &TextureManager,
        dir: &Path,
    ) -> Result<Self, AssetError> {
        let cubemap = textures.load_cubemap(&face_paths(dir))?;
        log::info!("Loaded skybox from {}", dir.display());
        Ok(Self::new(device, layout, cubemap))
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }

    pub fn bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
        device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Skybox Bind Group Layout"),
            entries: &[
                binding_types::entry(0, binding_types::texture_cube()),
                binding_types::entry(
                    1,
                    binding_types::sampler(wgpu::SamplerBindingType::Filtering),
                ),
            ],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_face_order() {
        let paths = face_paths(Path::new("sky"));
        assert_eq!(paths[0], Path::new("sky").join("right.png"));
        assert_eq!(paths[2], Path::new("sky").join("top.png"));
        assert_eq!(paths[5], Path::new("sky").join("back.png"));
    }
}
