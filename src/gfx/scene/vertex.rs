//! # Vertex Data Structures
//!
//! GPU vertex formats used by [`GpuMesh`](super::gpu_mesh::GpuMesh).
//!
//! Two layouts exist:
//!
//! - [`Vertex`] for indexed meshes: position, normal, texture coordinates,
//!   tangent and bitangent.
//! - A raw interleaved float layout for non-indexed meshes, where every vertex is
//!   `stride` floats and the first eight are position, normal and texture coordinates.

use std::mem;

/// Floats a raw vertex needs to hold position, normal and texture coordinates
pub const RAW_MIN_STRIDE: usize = 8;

/// A vertex of an indexed mesh.
///
/// The `#[repr(C)]` attribute keeps the field order and offsets that
/// [`Vertex::desc`] describes to the GPU.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub tex_coords: [f32; 2],
    pub tangent: [f32; 3],
    pub bitangent: [f32; 3],
}

const VERTEX_ATTRIBUTES: [wgpu::VertexAttribute; 5] = wgpu::vertex_attr_array![
    0 => Float32x3,
    1 => Float32x3,
    2 => Float32x2,
    3 => Float32x3,
    4 => Float32x3,
];

const RAW_ATTRIBUTES: [wgpu::VertexAttribute; 3] = wgpu::vertex_attr_array![
    0 => Float32x3,
    1 => Float32x3,
    2 => Float32x2,
];

impl Vertex {
    pub fn new(position: [f32; 3], normal: [f32; 3], tex_coords: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            tex_coords,
            ..Default::default()
        }
    }

    /// Returns the vertex buffer layout for wgpu rendering.
    ///
    /// - Attribute 0: position (Float32x3), offset 0
    /// - Attribute 1: normal (Float32x3), offset 12
    /// - Attribute 2: texture coordinates (Float32x2), offset 24
    /// - Attribute 3: tangent (Float32x3), offset 32
    /// - Attribute 4: bitangent (Float32x3), offset 44
    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &VERTEX_ATTRIBUTES,
        }
    }
}

/// Layout for raw interleaved vertices of `stride` floats
pub fn raw_desc(stride: usize) -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: (stride * mem::size_of::<f32>()) as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &RAW_ATTRIBUTES,
    }
}
