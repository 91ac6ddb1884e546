//! GPU-resident mesh buffers
//!
//! A [`GpuMesh`] keeps its CPU data so it can be built before a device exists.
//! [`GpuMesh::upload`] creates the buffers once; meshes that were never uploaded
//! report no buffers and are skipped at draw time.

use wgpu::util::DeviceExt;

use super::vertex::{raw_desc, Vertex, RAW_MIN_STRIDE};

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum MeshError {
    #[error("raw vertex stride {stride} is smaller than the {min} floats needed")]
    StrideTooSmall { stride: usize, min: usize },
}

/// How vertices are fed to the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum VertexLayout {
    /// [`Vertex`] with five attributes
    Full,
    /// Interleaved floats, `stride` per vertex, three attributes
    Raw { stride: usize },
}

impl VertexLayout {
    pub fn buffer_layout(&self) -> wgpu::VertexBufferLayout<'static> {
        match self {
            VertexLayout::Full => Vertex::desc(),
            VertexLayout::Raw { stride } => raw_desc(*stride),
        }
    }
}

/// The draw call a mesh issues
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawCall {
    Indexed { index_count: u32 },
    Arrays { vertex_count: u32 },
}

#[derive(Debug, Clone)]
enum MeshSource {
    Indexed { vertices: Vec<Vertex>, indices: Vec<u32> },
    Raw { data: Vec<f32>, stride: usize },
}

#[derive(Debug)]
struct MeshBuffers {
    vertex: wgpu::Buffer,
    index: Option<wgpu::Buffer>,
}

#[derive(Debug)]
pub struct GpuMesh {
    source: MeshSource,
    vertex_count: u32,
    index_count: u32,
    buffers: Option<MeshBuffers>,
}

impl GpuMesh {
    /// Indexed mesh drawn with `index_count = indices.len()`
    pub fn indexed(vertices: Vec<Vertex>, indices: Vec<u32>) -> Self {
        let vertex_count = vertices.len() as u32;
        let index_count = indices.len() as u32;
        Self {
            source: MeshSource::Indexed { vertices, indices },
            vertex_count,
            index_count,
            buffers: None,
        }
    }

    /// Non-indexed mesh from interleaved floats
    ///
    /// The vertex count is `data.len() / stride`; trailing floats that do not
    /// make up a whole vertex are ignored.
    pub fn from_raw(data: &[f32], stride: usize) -> Result<Self, MeshError> {
        if stride < RAW_MIN_STRIDE {
            return Err(MeshError::StrideTooSmall {
                stride,
                min: RAW_MIN_STRIDE,
            });
        }

        let vertex_count = (data.len() / stride) as u32;
        Ok(Self {
            source: MeshSource::Raw {
                data: data[..vertex_count as usize * stride].to_vec(),
                stride,
            },
            vertex_count,
            index_count: 0,
            buffers: None,
        })
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    pub fn is_indexed(&self) -> bool {
        matches!(self.source, MeshSource::Indexed { .. })
    }

    pub fn layout(&self) -> VertexLayout {
        match &self.source {
            MeshSource::Indexed { .. } => VertexLayout::Full,
            MeshSource::Raw { stride, .. } => VertexLayout::Raw { stride: *stride },
        }
    }

    pub fn draw_call(&self) -> DrawCall {
        if self.is_indexed() {
            DrawCall::Indexed {
                index_count: self.index_count,
            }
        } else {
            DrawCall::Arrays {
                vertex_count: self.vertex_count,
            }
        }
    }

    pub fn is_uploaded(&self) -> bool {
        self.buffers.is_some()
    }

    /// Creates the GPU buffers if they do not exist yet
    ///
    /// Empty meshes get no buffers since wgpu rejects zero-sized vertex buffers.
    pub fn upload(&mut self, device: &wgpu::Device) {
        if self.buffers.is_some() || self.vertex_count == 0 {
            return;
        }

        let buffers = match &self.source {
            MeshSource::Indexed { vertices, indices } => MeshBuffers {
                vertex: device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("Mesh Vertex Buffer"),
                    contents: bytemuck::cast_slice(vertices),
                    usage: wgpu::BufferUsages::VERTEX,
                }),
                index: (!indices.is_empty()).then(|| {
                    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                        label: Some("Mesh Index Buffer"),
                        contents: bytemuck::cast_slice(indices),
                        usage: wgpu::BufferUsages::INDEX,
                    })
                }),
            },
            MeshSource::Raw { data, .. } => MeshBuffers {
                vertex: device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("Raw Mesh Vertex Buffer"),
                    contents: bytemuck::cast_slice(data),
                    usage: wgpu::BufferUsages::VERTEX,
                }),
                index: None,
            },
        };

        self.buffers = Some(buffers);
    }

    /// Records this mesh's draw call into `pass`
    ///
    /// The caller has already set a pipeline matching [`GpuMesh::layout`].
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        let Some(buffers) = &self.buffers else {
            return;
        };

        pass.set_vertex_buffer(0, buffers.vertex.slice(..));
        match (self.draw_call(), &buffers.index) {
            (DrawCall::Indexed { index_count }, Some(index)) => {
                pass.set_index_buffer(index.slice(..), wgpu::IndexFormat::Uint32);
                pass.draw_indexed(0..index_count, 0, 0..1);
            }
            (DrawCall::Indexed { .. }, None) => {}
            (DrawCall::Arrays { vertex_count }, _) => {
                pass.draw(0..vertex_count, 0..1);
            }
        }
    }

    /// Vertices of an indexed mesh
    pub fn vertices(&self) -> Option<&[Vertex]> {
        match &self.source {
            MeshSource::Indexed { vertices, .. } => Some(vertices),
            MeshSource::Raw { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_vertex_count_from_stride() {
        let data = vec![0.0f32; 36 * 8];
        let mesh = GpuMesh::from_raw(&data, 8).unwrap();
        assert_eq!(mesh.vertex_count(), 36);
        assert_eq!(mesh.index_count(), 0);
        assert!(!mesh.is_indexed());
        assert_eq!(mesh.draw_call(), DrawCall::Arrays { vertex_count: 36 });
        assert_eq!(mesh.layout(), VertexLayout::Raw { stride: 8 });
    }

    #[test]
    fn test_raw_ignores_partial_vertex() {
        let data = vec![0.0f32; 2 * 11 + 5];
        let mesh = GpuMesh::from_raw(&data, 11).unwrap();
        assert_eq!(mesh.vertex_count(), 2);
    }

    #[test]
    fn test_raw_rejects_short_stride() {
        assert_eq!(
            GpuMesh::from_raw(&[0.0; 12], 6).unwrap_err(),
            MeshError::StrideTooSmall { stride: 6, min: 8 }
        );
        assert!(GpuMesh::from_raw(&[], 0).is_err());
    }

    #[test]
    fn test_empty_raw_mesh_is_valid() {
        let mesh = GpuMesh::from_raw(&[], 8).unwrap();
        assert_eq!(mesh.vertex_count(), 0);
        assert!(!mesh.is_uploaded());
    }

    #[test]
    fn test_indexed_mesh_draws_indices() {
        let vertices = vec![
            Vertex::new([0.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 0.0]),
            Vertex::new([1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [1.0, 0.0]),
            Vertex::new([0.0, 1.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0]),
        ];
        let mesh = GpuMesh::indexed(vertices, vec![0, 1, 2]);
        assert!(mesh.is_indexed());
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.draw_call(), DrawCall::Indexed { index_count: 3 });
        assert_eq!(mesh.layout(), VertexLayout::Full);
        assert_eq!(mesh.vertices().map(|v| v.len()), Some(3));
    }
}
