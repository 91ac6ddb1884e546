use crate::gfx::rendering::shader::ShaderProgram;
use crate::gfx::resources::material::Material;
use crate::gfx::resources::texture_manager::TextureManager;

use super::gpu_mesh::GpuMesh;

/// Geometry plus the material it is drawn with
#[derive(Debug)]
pub struct Mesh {
    pub gpu_mesh: GpuMesh,
    pub material: Material,
}

impl Mesh {
    pub fn new(gpu_mesh: GpuMesh, material: Material) -> Self {
        Self { gpu_mesh, material }
    }

    /// Binds the material, draws, unbinds
    ///
    /// Projection, view and model matrices are expected to be set already.
    pub fn draw(&self, shader: &mut dyn ShaderProgram) {
        self.material.bind(shader);
        shader.draw_mesh(&self.gpu_mesh);
        self.material.unbind(shader);
    }

    /// Uploads buffers and builds the material bind group if needed
    pub fn prepare_gpu(
        &mut self,
        device: &wgpu::Device,
        material_layout: &wgpu::BindGroupLayout,
        textures: &TextureManager,
    ) {
        self.gpu_mesh.upload(device);
        self.material.prepare(device, material_layout, textures);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::rendering::shader::recording::{RecordingShader, ShaderCall};

    #[test]
    fn test_draw_brackets_mesh_with_material() {
        let mesh = Mesh::new(
            GpuMesh::from_raw(&[0.0; 24], 8).unwrap(),
            Material::solid_color([1.0, 0.5, 0.0]),
        );
        let mut shader = RecordingShader::default();
        mesh.draw(&mut shader);

        assert_eq!(
            shader.calls,
            vec![
                ShaderCall::BindMaterial,
                ShaderCall::Draw { vertex_count: 3 },
                ShaderCall::UnbindMaterial,
            ]
        );
    }
}
