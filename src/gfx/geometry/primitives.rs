//! # Primitive Shapes
//!
//! Raw primitives are interleaved `position(3) normal(3) uv(2)` floats drawn
//! without indices. The sphere is generated as indexed geometry.

use std::f32::consts::PI;

use super::GeometryData;
use crate::gfx::resources::material::Material;
use crate::gfx::scene::gpu_mesh::{GpuMesh, MeshError};
use crate::gfx::scene::mesh::Mesh;
use crate::gfx::scene::model::Model;
use crate::gfx::scene::scene_manager::{ObjectId, SceneManager};
use crate::gfx::scene::transform::Transform;

/// Floats per vertex of the raw primitives
pub const RAW_STRIDE: usize = 8;

#[rustfmt::skip]
pub const CUBE_VERTICES: [f32; 36 * RAW_STRIDE] = [
    // back face
    -1.0, -1.0, -1.0,  0.0,  0.0, -1.0, 0.0, 0.0,
     1.0,  1.0, -1.0,  0.0,  0.0, -1.0, 1.0, 1.0,
     1.0, -1.0, -1.0,  0.0,  0.0, -1.0, 1.0, 0.0,
     1.0,  1.0, -1.0,  0.0,  0.0, -1.0, 1.0, 1.0,
    -1.0, -1.0, -1.0,  0.0,  0.0, -1.0, 0.0, 0.0,
    -1.0,  1.0, -1.0,  0.0,  0.0, -1.0, 0.0, 1.0,
    // front face
    -1.0, -1.0,  1.0,  0.0,  0.0,  1.0, 0.0, 0.0,
     1.0, -1.0,  1.0,  0.0,  0.0,  1.0, 1.0, 0.0,
     1.0,  1.0,  1.0,  0.0,  0.0,  1.0, 1.0, 1.0,
     1.0,  1.0,  1.0,  0.0,  0.0,  1.0, 1.0, 1.0,
    -1.0,  1.0,  1.0,  0.0,  0.0,  1.0, 0.0, 1.0,
    -1.0, -1.0,  1.0,  0.0,  0.0,  1.0, 0.0, 0.0,
    // left face
    -1.0,  1.0,  1.0, -1.0,  0.0,  0.0, 1.0, 0.0,
    -1.0,  1.0, -1.0, -1.0,  0.0,  0.0, 1.0, 1.0,
    -1.0, -1.0, -1.0, -1.0,  0.0,  0.0, 0.0, 1.0,
    -1.0, -1.0, -1.0, -1.0,  0.0,  0.0, 0.0, 1.0,
    -1.0, -1.0,  1.0, -1.0,  0.0,  0.0, 0.0, 0.0,
    -1.0,  1.0,  1.0, -1.0,  0.0,  0.0, 1.0, 0.0,
    // right face
     1.0,  1.0,  1.0,  1.0,  0.0,  0.0, 1.0, 0.0,
     1.0, -1.0, -1.0,  1.0,  0.0,  0.0, 0.0, 1.0,
     1.0,  1.0, -1.0,  1.0,  0.0,  0.0, 1.0, 1.0,
     1.0, -1.0, -1.0,  1.0,  0.0,  0.0, 0.0, 1.0,
     1.0,  1.0,  1.0,  1.0,  0.0,  0.0, 1.0, 0.0,
     1.0, -1.0,  1.0,  1.0,  0.0,  0.0, 0.0, 0.0,
    // bottom face
    -1.0, -1.0, -1.0,  0.0, -1.0,  0.0, 0.0, 1.0,
     1.0, -1.0, -1.0,  0.0, -1.0,  0.0, 1.0, 1.0,
     1.0, -1.0,  1.0,  0.0, -1.0,  0.0, 1.0, 0.0,
     1.0, -1.0,  1.0,  0.0, -1.0,  0.0, 1.0, 0.0,
    -1.0, -1.0,  1.0,  0.0, -1.0,  0.0, 0.0, 0.0,
    -1.0, -1.0, -1.0,  0.0, -1.0,  0.0, 0.0, 1.0,
    // top face
    -1.0,  1.0, -1.0,  0.0,  1.0,  0.0, 0.0, 1.0,
     1.0,  1.0,  1.0,  0.0,  1.0,  0.0, 1.0, 0.0,
     1.0,  1.0, -1.0,  0.0,  1.0,  0.0, 1.0, 1.0,
     1.0,  1.0,  1.0,  0.0,  1.0,  0.0, 1.0, 0.0,
    -1.0,  1.0, -1.0,  0.0,  1.0,  0.0, 0.0, 1.0,
    -1.0,  1.0,  1.0,  0.0,  1.0,  0.0, 0.0, 0.0,
];

/// Unit quad in the XY plane facing +Z
#[rustfmt::skip]
pub const QUAD_VERTICES: [f32; 6 * RAW_STRIDE] = [
    -1.0, -1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0,
     1.0, -1.0, 0.0, 0.0, 0.0, 1.0, 1.0, 0.0,
     1.0,  1.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0,
     1.0,  1.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0,
    -1.0,  1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 1.0,
    -1.0, -1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0,
];

/// Unit plane in the XZ plane facing +Y, uv repeating 5 times
#[rustfmt::skip]
pub const PLANE_VERTICES: [f32; 6 * RAW_STRIDE] = [
    -1.0, 0.0,  1.0, 0.0, 1.0, 0.0, 0.0, 0.0,
     1.0, 0.0,  1.0, 0.0, 1.0, 0.0, 5.0, 0.0,
     1.0, 0.0, -1.0, 0.0, 1.0, 0.0, 5.0, 5.0,
     1.0, 0.0, -1.0, 0.0, 1.0, 0.0, 5.0, 5.0,
    -1.0, 0.0, -1.0, 0.0, 1.0, 0.0, 0.0, 5.0,
    -1.0, 0.0,  1.0, 0.0, 1.0, 0.0, 0.0, 0.0,
];

/// Generate a UV sphere with specified resolution
///
/// # Arguments
/// * `longitude_segments` - Number of vertical segments (longitude lines)
/// * `latitude_segments` - Number of horizontal segments (latitude lines)
///
/// Returns a sphere of radius 1.0 centered at the origin.
pub fn generate_sphere(longitude_segments: u32, latitude_segments: u32) -> GeometryData {
    let mut data = GeometryData::new();

    let long_segs = longitude_segments.max(3);
    let lat_segs = latitude_segments.max(2);

    for lat in 0..=lat_segs {
        let theta = lat as f32 * PI / lat_segs as f32;
        let (sin_theta, cos_theta) = theta.sin_cos();

        for long in 0..=long_segs {
            let phi = long as f32 * 2.0 * PI / long_segs as f32;
            let (sin_phi, cos_phi) = phi.sin_cos();

            let x = sin_theta * cos_phi;
            let y = cos_theta;
            let z = sin_theta * sin_phi;

            data.positions.push([x, y, z]);
            data.normals.push([x, y, z]);
            // v runs bottom to top to match the image row flip on load
            data.tex_coords.push([
                long as f32 / long_segs as f32,
                1.0 - lat as f32 / lat_segs as f32,
            ]);
        }
    }

    for lat in 0..lat_segs {
        for long in 0..long_segs {
            let first = lat * (long_segs + 1) + long;
            let second = first + long_segs + 1;

            // Counter-clockwise seen from outside
            data.indices.extend_from_slice(&[first, first + 1, second]);
            data.indices.extend_from_slice(&[second, first + 1, second + 1]);
        }
    }

    data
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Cube,
    Quad,
    Plane,
    Sphere,
}

impl PrimitiveKind {
    pub const ALL: [PrimitiveKind; 4] = [
        PrimitiveKind::Cube,
        PrimitiveKind::Quad,
        PrimitiveKind::Plane,
        PrimitiveKind::Sphere,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            PrimitiveKind::Cube => "Cube",
            PrimitiveKind::Quad => "Quad",
            PrimitiveKind::Plane => "Plane",
            PrimitiveKind::Sphere => "Sphere",
        }
    }
}

/// Builds models for the built-in shapes
#[derive(Debug, Clone)]
pub struct PrimitivesFactory {
    pub sphere_segments: (u32, u32),
}

impl Default for PrimitivesFactory {
    fn default() -> Self {
        Self {
            sphere_segments: (32, 16),
        }
    }
}

impl PrimitivesFactory {
    pub fn create_gpu_mesh(&self, kind: PrimitiveKind) -> Result<GpuMesh, MeshError> {
        match kind {
            PrimitiveKind::Cube => GpuMesh::from_raw(&CUBE_VERTICES, RAW_STRIDE),
            PrimitiveKind::Quad => GpuMesh::from_raw(&QUAD_VERTICES, RAW_STRIDE),
            PrimitiveKind::Plane => GpuMesh::from_raw(&PLANE_VERTICES, RAW_STRIDE),
            PrimitiveKind::Sphere => {
                let (long, lat) = self.sphere_segments;
                let (vertices, indices) = generate_sphere(long, lat).into_vertices();
                Ok(GpuMesh::indexed(vertices, indices))
            }
        }
    }

    pub fn create(&self, kind: PrimitiveKind, material: Material) -> Result<Model, MeshError> {
        let gpu_mesh = self.create_gpu_mesh(kind)?;
        Ok(Model::from_mesh(Mesh::new(gpu_mesh, material)))
    }

    /// Creates the primitive and adds it to `scene` under its display name
    pub fn spawn(
        &self,
        kind: PrimitiveKind,
        material: Material,
        scene: &mut SceneManager,
        transform: Option<Transform>,
    ) -> Result<ObjectId, MeshError> {
        let model = self.create(kind, material)?;
        Ok(scene.add_object(kind.name(), model, transform))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::scene::gpu_mesh::DrawCall;

    #[test]
    fn test_cube_generation() {
        let factory = PrimitivesFactory::default();
        let cube = factory.create_gpu_mesh(PrimitiveKind::Cube).unwrap();
        assert_eq!(cube.vertex_count(), 36);
        assert_eq!(cube.draw_call(), DrawCall::Arrays { vertex_count: 36 });
    }

    #[test]
    fn test_cube_normals_are_axis_aligned() {
        for vertex in CUBE_VERTICES.chunks_exact(RAW_STRIDE) {
            let normal = &vertex[3..6];
            let length: f32 = normal.iter().map(|n| n * n).sum();
            assert!((length - 1.0).abs() < 1e-6);
            // Each position lies on the face its normal points at
            for axis in 0..3 {
                if normal[axis] != 0.0 {
                    assert_eq!(vertex[axis], normal[axis]);
                }
            }
        }
    }

    #[test]
    fn test_quad_and_plane_are_two_triangles() {
        let factory = PrimitivesFactory::default();
        for kind in [PrimitiveKind::Quad, PrimitiveKind::Plane] {
            let mesh = factory.create_gpu_mesh(kind).unwrap();
            assert_eq!(mesh.vertex_count(), 6);
            assert!(!mesh.is_indexed());
        }
    }

    #[test]
    fn test_sphere_generation() {
        let sphere = generate_sphere(8, 6);
        assert_eq!(sphere.vertex_count(), 9 * 7);
        assert_eq!(sphere.indices.len() / 3, 8 * 6 * 2);
        assert_eq!(sphere.positions.len(), sphere.normals.len());
        assert_eq!(sphere.positions.len(), sphere.tex_coords.len());
    }

    #[test]
    fn test_sphere_winding_faces_outward() {
        let sphere = generate_sphere(8, 6);
        for triangle in sphere.indices.chunks_exact(3) {
            let [a, b, c] = [
                cgmath::Vector3::from(sphere.positions[triangle[0] as usize]),
                cgmath::Vector3::from(sphere.positions[triangle[1] as usize]),
                cgmath::Vector3::from(sphere.positions[triangle[2] as usize]),
            ];
            let normal = (b - a).cross(c - a);
            let center = (a + b + c) / 3.0;
            use cgmath::InnerSpace;
            // Degenerate pole triangles have a zero normal
            assert!(normal.dot(center) >= -1e-6);
        }
    }

    fn assert_raw_winding(name: &str, data: &[f32]) {
        use cgmath::{InnerSpace, Vector3};

        for triangle in data.chunks_exact(3 * RAW_STRIDE) {
            let vertex = |i: usize| &triangle[i * RAW_STRIDE..(i + 1) * RAW_STRIDE];
            let position = |i: usize| Vector3::new(vertex(i)[0], vertex(i)[1], vertex(i)[2]);
            let [a, b, c] = [position(0), position(1), position(2)];
            let face_normal = (b - a).cross(c - a);

            for i in 0..3 {
                let normal = Vector3::new(vertex(i)[3], vertex(i)[4], vertex(i)[5]);
                assert!(
                    face_normal.dot(normal) > 0.0,
                    "{} triangle {:?} is not counter-clockwise around its normal",
                    name,
                    [a, b, c]
                );
            }
        }
    }

    #[test]
    fn test_raw_primitives_wind_counter_clockwise() {
        assert_raw_winding("Cube", &CUBE_VERTICES);
        assert_raw_winding("Quad", &QUAD_VERTICES);
        assert_raw_winding("Plane", &PLANE_VERTICES);
    }

    #[test]
    fn test_cube_normals_point_outward() {
        use cgmath::{InnerSpace, Vector3};

        for vertex in CUBE_VERTICES.chunks_exact(RAW_STRIDE) {
            let position = Vector3::new(vertex[0], vertex[1], vertex[2]);
            let normal = Vector3::new(vertex[3], vertex[4], vertex[5]);
            assert!(position.dot(normal) > 0.0);
        }
    }

    #[test]
    fn test_plane_and_quad_share_unit_extent() {
        for data in [&PLANE_VERTICES, &QUAD_VERTICES] {
            let max = data
                .chunks_exact(RAW_STRIDE)
                .flat_map(|v| v[0..3].iter().map(|c| c.abs()))
                .fold(0.0f32, f32::max);
            assert_eq!(max, 1.0);
        }
    }

    #[test]
    fn test_factory_names() {
        let names: Vec<&str> = PrimitiveKind::ALL.iter().map(|k| k.name()).collect();
        assert_eq!(names, vec!["Cube", "Quad", "Plane", "Sphere"]);
    }

    #[test]
    fn test_spawn_adds_named_object() {
        let factory = PrimitivesFactory::default();
        let mut scene = SceneManager::new();
        let id = factory
            .spawn(PrimitiveKind::Sphere, Material::default(), &mut scene, None)
            .unwrap();

        let object = scene.get(id).unwrap();
        assert_eq!(object.name, "Sphere");
        assert!(object.model.meshes()[0].gpu_mesh.is_indexed());
    }
}
