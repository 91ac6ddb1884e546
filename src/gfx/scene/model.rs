//! Models: ordered collections of meshes
//!
//! Models come from the primitive factory or from OBJ files. OBJ loading turns
//! each object in the file into one [`Mesh`] and resolves the MTL textures
//! relative to the file's directory, loading every distinct path once.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::gpu_mesh::GpuMesh;
use super::mesh::Mesh;
use crate::error::AssetError;
use crate::gfx::geometry::GeometryData;
use crate::gfx::rendering::shader::ShaderProgram;
use crate::gfx::resources::material::{Material, TextureKind, TextureRef};
use crate::gfx::resources::texture_manager::{TextureHandle, TextureLoader, TextureManager};

#[derive(Debug, Default)]
pub struct Model {
    meshes: Vec<Mesh>,
    directory: Option<PathBuf>,
    loaded_textures: HashMap<PathBuf, TextureHandle>,
}

impl Model {
    pub fn new(meshes: Vec<Mesh>) -> Self {
        Self {
            meshes,
            ..Default::default()
        }
    }

    pub fn from_mesh(mesh: Mesh) -> Self {
        Self::new(vec![mesh])
    }

    /// Loads every object of an OBJ file
    ///
    /// Texture failures are logged and the slot falls back to its placeholder;
    /// only an unreadable or empty OBJ is an error.
    pub fn load_obj(path: impl AsRef<Path>, loader: &mut dyn TextureLoader) -> Result<Self, AssetError> {
        let path = path.as_ref();
        let (objects, materials) = tobj::load_obj(
            path,
            &tobj::LoadOptions {
                triangulate: true,
                single_index: true,
                ..Default::default()
            },
        )
        .map_err(|source| AssetError::Model {
            path: path.to_path_buf(),
            source,
        })?;

        let materials = materials.unwrap_or_else(|e| {
            log::warn!("No usable MTL for {}: {}", path.display(), e);
            Vec::new()
        });

        let mut model = Model {
            directory: Some(path.parent().map(Path::to_path_buf).unwrap_or_default()),
            ..Default::default()
        };

        for object in &objects {
            let material = match object.mesh.material_id.and_then(|id| materials.get(id)) {
                Some(mtl) => model.convert_material(mtl, loader),
                None => Material::default(),
            };
            let gpu_mesh = Self::convert_mesh(&object.mesh);
            log::debug!(
                "Loaded mesh '{}' ({} vertices, {} indices)",
                object.name,
                gpu_mesh.vertex_count(),
                gpu_mesh.index_count()
            );
            model.meshes.push(Mesh::new(gpu_mesh, material));
        }

        if model.meshes.is_empty() {
            return Err(AssetError::EmptyModel(path.to_path_buf()));
        }

        log::info!(
            "Loaded model {} ({} meshes, {} textures)",
            path.display(),
            model.meshes.len(),
            model.loaded_textures.len()
        );
        Ok(model)
    }

    fn convert_mesh(mesh: &tobj::Mesh) -> GpuMesh {
        let geometry = GeometryData {
            positions: mesh
                .positions
                .chunks_exact(3)
                .map(|p| [p[0], p[1], p[2]])
                .collect(),
            tex_coords: mesh
                .texcoords
                .chunks_exact(2)
                .map(|t| [t[0], t[1]])
                .collect(),
            normals: mesh
                .normals
                .chunks_exact(3)
                .map(|n| [n[0], n[1], n[2]])
                .collect(),
            indices: mesh.indices.clone(),
        };

        let (vertices, indices) = geometry.into_vertices();
        GpuMesh::indexed(vertices, indices)
    }

    fn convert_material(&mut self, mtl: &tobj::Material, loader: &mut dyn TextureLoader) -> Material {
        let slots = [
            (TextureKind::Diffuse, &mtl.diffuse_texture),
            (TextureKind::Specular, &mtl.specular_texture),
            (TextureKind::Normal, &mtl.normal_texture),
        ];

        let mut textures = Vec::new();
        for (kind, file) in slots {
            let Some(file) = file else {
                continue;
            };
            if let Some(texture) = self.load_texture(file, kind, loader) {
                textures.push(texture);
            }
        }

        match (textures.is_empty(), mtl.diffuse) {
            (true, Some(color)) => Material::solid_color(color),
            _ => Material::textured(textures),
        }
    }

    fn load_texture(&mut self, file: &str, kind: TextureKind, loader: &mut dyn TextureLoader) -> Option<TextureRef> {
        let path = self
            .directory
            .as_deref()
            .map(|dir| dir.join(file))
            .unwrap_or_else(|| PathBuf::from(file));

        let handle = match self.loaded_textures.get(&path) {
            Some(handle) => *handle,
            None => match loader.load_texture(&path) {
                Ok(handle) => {
                    self.loaded_textures.insert(path.clone(), handle);
                    handle
                }
                Err(e) => {
                    log::warn!("Skipping {} {}: {}", kind.type_name(), path.display(), e);
                    return None;
                }
            },
        };

        Some(TextureRef { handle, kind, path })
    }

    pub fn draw(&self, shader: &mut dyn ShaderProgram) {
        for mesh in &self.meshes {
            mesh.draw(shader);
        }
    }

    pub fn prepare_gpu(
        &mut self,
        device: &wgpu::Device,
        material_layout: &wgpu::BindGroupLayout,
        textures: &TextureManager,
    ) {
        for mesh in &mut self.meshes {
            mesh.prepare_gpu(device, material_layout, textures);
        }
    }

    /// Gives every mesh the same solid color
    pub fn set_color(&mut self, color: [f32; 3]) {
        for mesh in &mut self.meshes {
            mesh.material.set_color(color);
        }
    }

    /// Gives every mesh the same textures
    pub fn set_textures(&mut self, textures: Vec<TextureRef>) {
        for mesh in &mut self.meshes {
            mesh.material.set_textures(textures.clone());
        }
    }

    pub fn meshes(&self) -> &[Mesh] {
        &self.meshes
    }

    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    pub fn directory(&self) -> Option<&Path> {
        self.directory.as_deref()
    }

    pub fn vertex_count(&self) -> u32 {
        self.meshes.iter().map(|m| m.gpu_mesh.vertex_count()).sum()
    }

    pub fn index_count(&self) -> u32 {
        self.meshes.iter().map(|m| m.gpu_mesh.index_count()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::rendering::shader::recording::{RecordingShader, ShaderCall};

    /// Hands out sequential handles and remembers every request
    #[derive(Default)]
    struct CountingLoader {
        requests: Vec<PathBuf>,
        fail: bool,
    }

    impl TextureLoader for CountingLoader {
        fn load_texture(&mut self, path: &Path) -> Result<TextureHandle, AssetError> {
            if self.fail {
                return Err(AssetError::Io {
                    path: path.to_path_buf(),
                    source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
                });
            }
            self.requests.push(path.to_path_buf());
            Ok(TextureHandle::from_index(self.requests.len() - 1))
        }
    }

    fn write_obj_fixture(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("kiln-model-{}-{}", std::process::id(), name));
        std::fs::create_dir_all(&dir).unwrap();

        std::fs::write(
            dir.join("bricks.mtl"),
            "newmtl bricks\nKd 0.8 0.8 0.8\nmap_Kd bricks.png\n\nnewmtl plain\nKd 0.2 0.4 0.6\n",
        )
        .unwrap();

        std::fs::write(
            dir.join("pair.obj"),
            "mtllib bricks.mtl\n\
             v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\n\
             vt 0 0\nvt 1 0\nvt 1 1\nvt 0 1\n\
             o first\nusemtl bricks\nf 1/1 2/2 3/3\n\
             o second\nusemtl bricks\nf 1/1 3/3 4/4\n\
             o third\nusemtl plain\nf 1/1 2/2 4/4\n",
        )
        .unwrap();

        dir.join("pair.obj")
    }

    #[test]
    fn test_obj_textures_are_deduplicated() {
        let path = write_obj_fixture("dedup");
        let mut loader = CountingLoader::default();
        let model = Model::load_obj(&path, &mut loader).unwrap();

        assert_eq!(model.mesh_count(), 3);
        assert_eq!(loader.requests.len(), 1);
        assert!(loader.requests[0].ends_with("bricks.png"));

        let first = model.meshes()[0].material.texture(TextureKind::Diffuse).unwrap();
        let second = model.meshes()[1].material.texture(TextureKind::Diffuse).unwrap();
        assert_eq!(first.handle, second.handle);
        assert_eq!(model.meshes()[2].material.color(), Some([0.2, 0.4, 0.6]));
    }

    #[test]
    fn test_obj_computes_missing_normals() {
        let path = write_obj_fixture("normals");
        let model = Model::load_obj(&path, &mut CountingLoader::default()).unwrap();
        let vertices = model.meshes()[0].gpu_mesh.vertices().unwrap();
        assert_eq!(vertices[0].normal, [0.0, 0.0, 1.0]);
        assert_eq!(model.index_count(), 9);
    }

    #[test]
    fn test_failed_texture_leaves_slot_empty() {
        let path = write_obj_fixture("failing");
        let mut loader = CountingLoader {
            fail: true,
            ..Default::default()
        };
        let model = Model::load_obj(&path, &mut loader).unwrap();
        assert!(model.meshes()[0].material.textures().is_empty());
    }

    #[test]
    fn test_missing_obj_is_error() {
        let result = Model::load_obj(
            std::env::temp_dir().join("kiln-no-such-model.obj"),
            &mut CountingLoader::default(),
        );
        assert!(matches!(result, Err(AssetError::Model { .. })));
    }

    #[test]
    fn test_draw_visits_meshes_in_order() {
        let model = Model::new(vec![
            Mesh::new(GpuMesh::from_raw(&[0.0; 8], 8).unwrap(), Material::default()),
            Mesh::new(GpuMesh::from_raw(&[0.0; 16], 8).unwrap(), Material::default()),
        ]);
        let mut shader = RecordingShader::default();
        model.draw(&mut shader);

        let draws: Vec<&ShaderCall> = shader
            .calls
            .iter()
            .filter(|c| matches!(c, ShaderCall::Draw { .. }))
            .collect();
        assert_eq!(
            draws,
            vec![
                &ShaderCall::Draw { vertex_count: 1 },
                &ShaderCall::Draw { vertex_count: 2 },
            ]
        );
    }

    #[test]
    fn test_set_color_applies_to_every_mesh() {
        let mut model = Model::new(vec![
            Mesh::new(GpuMesh::from_raw(&[], 8).unwrap(), Material::default()),
            Mesh::new(GpuMesh::from_raw(&[], 8).unwrap(), Material::default()),
        ]);
        model.set_color([1.0, 0.0, 0.0]);
        assert!(model
            .meshes()
            .iter()
            .all(|m| m.material.color() == Some([1.0, 0.0, 0.0])));
    }
}
