//! # Materials
//!
//! A [`Material`] is either a list of textures tagged with their role or a solid
//! color override. Its GPU side is a bind group holding a small uniform plus one
//! texture per role; roles without a texture are filled with placeholders and
//! flagged off in the uniform so the shader ignores them.
//!
//! ## Bind group layout (group 2)
//!
//! | Binding | Contents            |
//! |---------|---------------------|
//! | 0       | [`MaterialUniform`] |
//! | 1       | diffuse map         |
//! | 2       | specular map        |
//! | 3       | normal map          |
//! | 4       | height map          |
//! | 5       | sampler             |

use std::path::PathBuf;

use wgpu::util::DeviceExt;

use super::texture_manager::{TextureHandle, TextureManager};
use crate::gfx::rendering::shader::ShaderProgram;
use crate::wgpu_utils::binding_types;

/// Role a texture plays in shading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureKind {
    Diffuse,
    Specular,
    Normal,
    Height,
}

impl TextureKind {
    pub const ALL: [TextureKind; 4] = [
        TextureKind::Diffuse,
        TextureKind::Specular,
        TextureKind::Normal,
        TextureKind::Height,
    ];

    pub fn type_name(&self) -> &'static str {
        match self {
            TextureKind::Diffuse => "texture_diffuse",
            TextureKind::Specular => "texture_specular",
            TextureKind::Normal => "texture_normal",
            TextureKind::Height => "texture_height",
        }
    }

    fn flag(&self) -> u32 {
        match self {
            TextureKind::Diffuse => MaterialUniform::HAS_DIFFUSE,
            TextureKind::Specular => MaterialUniform::HAS_SPECULAR,
            TextureKind::Normal => MaterialUniform::HAS_NORMAL,
            TextureKind::Height => MaterialUniform::HAS_HEIGHT,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextureRef {
    pub handle: TextureHandle,
    pub kind: TextureKind,
    pub path: PathBuf,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MaterialUniform {
    pub color: [f32; 4],
    pub flags: u32,
    _padding: [u32; 3],
}

impl MaterialUniform {
    pub const SOLID_COLOR: u32 = 1;
    pub const HAS_DIFFUSE: u32 = 1 << 1;
    pub const HAS_SPECULAR: u32 = 1 << 2;
    pub const HAS_NORMAL: u32 = 1 << 3;
    pub const HAS_HEIGHT: u32 = 1 << 4;
}

#[derive(Debug)]
struct MaterialGpu {
    bind_group: wgpu::BindGroup,
    _uniform: wgpu::Buffer,
}

#[derive(Debug, Default)]
pub struct Material {
    textures: Vec<TextureRef>,
    color: Option<[f32; 3]>,
    gpu: Option<MaterialGpu>,
}

impl Material {
    pub fn textured(textures: Vec<TextureRef>) -> Self {
        Self {
            textures,
            ..Default::default()
        }
    }

    pub fn solid_color(color: [f32; 3]) -> Self {
        Self {
            color: Some(color),
            ..Default::default()
        }
    }

    pub fn textures(&self) -> &[TextureRef] {
        &self.textures
    }

    /// The solid color override, if one is set
    pub fn color(&self) -> Option<[f32; 3]> {
        self.color
    }

    /// Switches to a solid color; textures are kept but ignored
    pub fn set_color(&mut self, color: [f32; 3]) {
        self.color = Some(color);
        self.gpu = None;
    }

    /// Replaces all textures and drops any color override
    pub fn set_textures(&mut self, textures: Vec<TextureRef>) {
        self.textures = textures;
        self.color = None;
        self.gpu = None;
    }

    /// First texture with the given role
    pub fn texture(&self, kind: TextureKind) -> Option<&TextureRef> {
        self.textures.iter().find(|t| t.kind == kind)
    }

    pub fn uniform(&self) -> MaterialUniform {
        match self.color {
            Some([r, g, b]) => MaterialUniform {
                color: [r, g, b, 1.0],
                flags: MaterialUniform::SOLID_COLOR,
                _padding: [0; 3],
            },
            None => MaterialUniform {
                color: [1.0; 4],
                flags: TextureKind::ALL
                    .iter()
                    .filter(|kind| self.texture(**kind).is_some())
                    .fold(0, |flags, kind| flags | kind.flag()),
                _padding: [0; 3],
            },
        }
    }

    /// Bind group, once [`Material::prepare`] has run
    pub fn bind_group(&self) -> Option<&wgpu::BindGroup> {
        self.gpu.as_ref().map(|gpu| &gpu.bind_group)
    }

    /// Binds this material on `shader`
    pub fn bind(&self, shader: &mut dyn ShaderProgram) {
        shader.bind_material(self);
    }

    pub fn unbind(&self, shader: &mut dyn ShaderProgram) {
        shader.unbind_material();
    }

    /// (Re)creates the bind group if it is missing or the material changed
    pub fn prepare(
        &mut self,
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        textures: &TextureManager,
    ) {
        if self.gpu.is_none() {
            self.gpu = Some(Self::create_gpu(
                device,
                layout,
                textures,
                self.uniform(),
                |kind| self.texture(kind).map(|t| t.handle),
            ));
        }
    }

    /// Bind group using only placeholder textures
    pub fn create_fallback_bind_group(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        textures: &TextureManager,
    ) -> wgpu::BindGroup {
        Self::create_gpu(
            device,
            layout,
            textures,
            Material::default().uniform(),
            |_| None,
        )
        .bind_group
    }

    fn create_gpu(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        textures: &TextureManager,
        uniform: MaterialUniform,
        handle_for: impl Fn(TextureKind) -> Option<TextureHandle>,
    ) -> MaterialGpu {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Material Uniform"),
            contents: bytemuck::bytes_of(&uniform),
            usage: wgpu::BufferUsages::UNIFORM,
        });

        let diffuse = textures.view_or_fallback(handle_for(TextureKind::Diffuse), TextureKind::Diffuse);
        let specular = textures.view_or_fallback(handle_for(TextureKind::Specular), TextureKind::Specular);
        let normal = textures.view_or_fallback(handle_for(TextureKind::Normal), TextureKind::Normal);
        let height = textures.view_or_fallback(handle_for(TextureKind::Height), TextureKind::Height);

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Material Bind Group"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(diffuse),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(specular),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::TextureView(normal),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: wgpu::BindingResource::TextureView(height),
                },
                wgpu::BindGroupEntry {
                    binding: 5,
                    resource: wgpu::BindingResource::Sampler(textures.sampler()),
                },
            ],
        });

        MaterialGpu {
            bind_group,
            _uniform: buffer,
        }
    }

    pub fn bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
        device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Material Bind Group Layout"),
            entries: &[
                binding_types::entry(0, binding_types::uniform()),
                binding_types::entry(1, binding_types::texture_2d()),
                binding_types::entry(2, binding_types::texture_2d()),
                binding_types::entry(3, binding_types::texture_2d()),
                binding_types::entry(4, binding_types::texture_2d()),
                binding_types::entry(
                    5,
                    binding_types::sampler(wgpu::SamplerBindingType::Filtering),
                ),
            ],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texture(index: usize, kind: TextureKind) -> TextureRef {
        TextureRef {
            handle: test_handle(index),
            kind,
            path: PathBuf::from(format!("t{}.png", index)),
        }
    }

    fn test_handle(index: usize) -> TextureHandle {
        TextureHandle::from_index(index)
    }

    #[test]
    fn test_uniform_flags_follow_textures() {
        let material = Material::textured(vec![
            texture(0, TextureKind::Diffuse),
            texture(1, TextureKind::Normal),
        ]);
        let uniform = material.uniform();
        assert_eq!(
            uniform.flags,
            MaterialUniform::HAS_DIFFUSE | MaterialUniform::HAS_NORMAL
        );
    }

    #[test]
    fn test_color_overrides_textures() {
        let mut material = Material::textured(vec![texture(0, TextureKind::Diffuse)]);
        material.set_color([0.2, 0.4, 0.6]);

        let uniform = material.uniform();
        assert_eq!(uniform.flags, MaterialUniform::SOLID_COLOR);
        assert_eq!(uniform.color, [0.2, 0.4, 0.6, 1.0]);
        assert_eq!(material.textures().len(), 1);
    }

    #[test]
    fn test_set_textures_clears_color() {
        let mut material = Material::solid_color([1.0, 0.0, 0.0]);
        material.set_textures(vec![texture(3, TextureKind::Height)]);
        assert_eq!(material.color(), None);
        assert_eq!(material.uniform().flags, MaterialUniform::HAS_HEIGHT);
        assert_eq!(
            material.texture(TextureKind::Height).map(|t| t.handle),
            Some(test_handle(3))
        );
    }

    #[test]
    fn test_type_names() {
        assert_eq!(TextureKind::Diffuse.type_name(), "texture_diffuse");
        assert_eq!(TextureKind::Specular.type_name(), "texture_specular");
    }

    #[test]
    fn test_uniform_size_matches_shader() {
        assert_eq!(std::mem::size_of::<MaterialUniform>(), 32);
    }
}
