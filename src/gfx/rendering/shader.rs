//! The seam between scene submission and the GPU
//!
//! Scene code never touches a render pass directly. It talks to a
//! [`ShaderProgram`]: per-frame uniforms and the skybox once, then for every
//! object a model matrix followed by material bind / mesh draw / material unbind.

use cgmath::{Matrix4, Point3, Vector3};

use crate::gfx::resources::material::Material;
use crate::gfx::scene::gpu_mesh::GpuMesh;

/// Uniforms shared by every draw of a frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameUniforms {
    pub projection: Matrix4<f32>,
    pub view: Matrix4<f32>,
    pub view_position: Point3<f32>,
    pub light_position: Vector3<f32>,
    /// Parallax displacement scale
    pub height_scale: f32,
}

pub trait ShaderProgram {
    fn set_frame_uniforms(&mut self, uniforms: &FrameUniforms);

    /// Sets the object-to-world matrix used by the following draws
    fn set_model_matrix(&mut self, model: &Matrix4<f32>);

    fn bind_material(&mut self, material: &Material);

    /// Restores the default material
    fn unbind_material(&mut self);

    fn draw_mesh(&mut self, mesh: &GpuMesh);

    /// Draws the environment behind the scene, if there is one
    fn draw_skybox(&mut self);
}

#[cfg(test)]
pub(crate) mod recording {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    pub enum ShaderCall {
        FrameUniforms(FrameUniforms),
        ModelMatrix(Matrix4<f32>),
        BindMaterial,
        UnbindMaterial,
        Draw { vertex_count: u32 },
        Skybox,
    }

    /// Shader stub that records every call in order
    #[derive(Debug, Default)]
    pub struct RecordingShader {
        pub calls: Vec<ShaderCall>,
    }

    impl RecordingShader {
        pub fn draw_count(&self) -> usize {
            self.calls
                .iter()
                .filter(|c| matches!(c, ShaderCall::Draw { .. }))
                .count()
        }

        pub fn model_matrices(&self) -> Vec<Matrix4<f32>> {
            self.calls
                .iter()
                .filter_map(|c| match c {
                    ShaderCall::ModelMatrix(m) => Some(*m),
                    _ => None,
                })
                .collect()
        }
    }

    impl ShaderProgram for RecordingShader {
        fn set_frame_uniforms(&mut self, uniforms: &FrameUniforms) {
            self.calls.push(ShaderCall::FrameUniforms(*uniforms));
        }

        fn set_model_matrix(&mut self, model: &Matrix4<f32>) {
            self.calls.push(ShaderCall::ModelMatrix(*model));
        }

        fn bind_material(&mut self, _material: &Material) {
            self.calls.push(ShaderCall::BindMaterial);
        }

        fn unbind_material(&mut self) {
            self.calls.push(ShaderCall::UnbindMaterial);
        }

        fn draw_mesh(&mut self, mesh: &GpuMesh) {
            self.calls.push(ShaderCall::Draw {
                vertex_count: mesh.vertex_count(),
            });
        }

        fn draw_skybox(&mut self) {
            self.calls.push(ShaderCall::Skybox);
        }
    }
}
