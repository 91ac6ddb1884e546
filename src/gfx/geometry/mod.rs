//! # Procedural Geometry
//!
//! Built-in primitive shapes and the vertex attribute helpers shared with model
//! loading.
//!
//! ## Supported Primitives
//!
//! - **Cube**: the classic 36-vertex raw cube, 8 floats per vertex
//! - **Quad**: two raw triangles in the XY plane
//! - **Plane**: two raw triangles in the XZ plane
//! - **Sphere**: indexed UV sphere with configurable resolution
//!
//! ## Usage
//!
//! ```no_run
//! use kiln::gfx::geometry::{PrimitiveKind, PrimitivesFactory};
//! use kiln::gfx::resources::material::Material;
//!
//! let factory = PrimitivesFactory::default();
//! let cube = factory.create(PrimitiveKind::Cube, Material::default()).unwrap();
//! assert_eq!(cube.mesh_count(), 1);
//! ```

pub mod primitives;

pub use primitives::*;

use cgmath::{InnerSpace, Vector2, Vector3};

use crate::gfx::scene::vertex::Vertex;

/// Indexed geometry before it is packed into [`Vertex`] values
#[derive(Debug, Clone, Default)]
pub struct GeometryData {
    pub positions: Vec<[f32; 3]>,
    pub tex_coords: Vec<[f32; 2]>,
    pub normals: Vec<[f32; 3]>,
    /// Triangle indices (counter-clockwise winding)
    pub indices: Vec<u32>,
}

impl GeometryData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Packs into vertices, filling in missing normals and deriving tangents
    pub fn into_vertices(self) -> (Vec<Vertex>, Vec<u32>) {
        let normals = if self.normals.len() == self.positions.len() {
            self.normals
        } else {
            compute_normals(&self.positions, &self.indices)
        };

        let mut vertices: Vec<Vertex> = self
            .positions
            .iter()
            .enumerate()
            .map(|(i, position)| {
                Vertex::new(
                    *position,
                    normals[i],
                    self.tex_coords.get(i).copied().unwrap_or([0.0, 0.0]),
                )
            })
            .collect();

        compute_tangents(&mut vertices, &self.indices);
        (vertices, self.indices)
    }
}

/// Area-weighted vertex normals from triangle faces
///
/// Vertices not referenced by any triangle get `(0, 1, 0)`.
pub fn compute_normals(positions: &[[f32; 3]], indices: &[u32]) -> Vec<[f32; 3]> {
    let mut accumulated = vec![Vector3::new(0.0f32, 0.0, 0.0); positions.len()];

    for triangle in indices.chunks_exact(3) {
        let [i0, i1, i2] = [triangle[0] as usize, triangle[1] as usize, triangle[2] as usize];
        if i0 >= positions.len() || i1 >= positions.len() || i2 >= positions.len() {
            continue;
        }
        let v0 = Vector3::from(positions[i0]);
        let face_normal = (Vector3::from(positions[i1]) - v0).cross(Vector3::from(positions[i2]) - v0);
        for i in [i0, i1, i2] {
            accumulated[i] += face_normal;
        }
    }

    accumulated
        .into_iter()
        .map(|n| {
            if n.magnitude2() > f32::EPSILON {
                n.normalize().into()
            } else {
                [0.0, 1.0, 0.0]
            }
        })
        .collect()
}

/// Fills tangent and bitangent from texture coordinate gradients
///
/// Triangles with degenerate UVs contribute nothing; vertices left without a
/// tangent keep zeros, which the shader treats as "no tangent frame".
pub fn compute_tangents(vertices: &mut [Vertex], indices: &[u32]) {
    let mut tangents = vec![Vector3::new(0.0f32, 0.0, 0.0); vertices.len()];
    let mut bitangents = vec![Vector3::new(0.0f32, 0.0, 0.0); vertices.len()];

    for triangle in indices.chunks_exact(3) {
        let [i0, i1, i2] = [triangle[0] as usize, triangle[1] as usize, triangle[2] as usize];
        if i0 >= vertices.len() || i1 >= vertices.len() || i2 >= vertices.len() {
            continue;
        }
        let (a, b, c) = (&vertices[i0], &vertices[i1], &vertices[i2]);

        let edge1 = Vector3::from(b.position) - Vector3::from(a.position);
        let edge2 = Vector3::from(c.position) - Vector3::from(a.position);
        let duv1 = Vector2::from(b.tex_coords) - Vector2::from(a.tex_coords);
        let duv2 = Vector2::from(c.tex_coords) - Vector2::from(a.tex_coords);

        let det = duv1.x * duv2.y - duv2.x * duv1.y;
        if det.abs() < f32::EPSILON {
            continue;
        }
        let r = 1.0 / det;
        let tangent = (edge1 * duv2.y - edge2 * duv1.y) * r;
        let bitangent = (edge2 * duv1.x - edge1 * duv2.x) * r;

        for i in [i0, i1, i2] {
            tangents[i] += tangent;
            bitangents[i] += bitangent;
        }
    }

    for (vertex, (tangent, bitangent)) in vertices.iter_mut().zip(tangents.into_iter().zip(bitangents)) {
        if tangent.magnitude2() > f32::EPSILON {
            vertex.tangent = tangent.normalize().into();
        }
        if bitangent.magnitude2() > f32::EPSILON {
            vertex.bitangent = bitangent.normalize().into();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad() -> GeometryData {
        GeometryData {
            positions: vec![
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [1.0, 1.0, 0.0],
                [0.0, 1.0, 0.0],
            ],
            tex_coords: vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]],
            normals: Vec::new(),
            indices: vec![0, 1, 2, 2, 3, 0],
        }
    }

    #[test]
    fn test_missing_normals_are_computed() {
        let (vertices, indices) = quad().into_vertices();
        assert_eq!(indices.len(), 6);
        for vertex in &vertices {
            assert_eq!(vertex.normal, [0.0, 0.0, 1.0]);
        }
    }

    #[test]
    fn test_tangents_follow_uv_axes() {
        let (vertices, _) = quad().into_vertices();
        for vertex in &vertices {
            assert!((vertex.tangent[0] - 1.0).abs() < 1e-5);
            assert!((vertex.bitangent[1] - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_degenerate_uvs_leave_zero_tangents() {
        let mut data = quad();
        data.tex_coords = vec![[0.5, 0.5]; 4];
        let (vertices, _) = data.into_vertices();
        assert_eq!(vertices[0].tangent, [0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_unreferenced_vertex_gets_up_normal() {
        let normals = compute_normals(&[[0.0; 3], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [5.0; 3]], &[0, 1, 2]);
        assert_eq!(normals[3], [0.0, 1.0, 0.0]);
        assert_eq!(normals[0], [0.0, 0.0, 1.0]);
    }
}
