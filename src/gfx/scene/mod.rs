//! # Scene Module
//!
//! Everything that describes what gets drawn: transforms, vertex data, meshes,
//! models and the [`SceneManager`] that owns the scene objects.
//!
//! ## Ownership
//!
//! A [`SceneObject`] owns one [`Model`]; a model owns its [`Mesh`]es; every mesh
//! owns exactly one [`GpuMesh`] and one material. Objects are addressed through
//! [`ObjectId`] handles resolved by the manager.
//!
//! ## Usage
//!
//! ```no_run
//! use kiln::gfx::geometry::{PrimitiveKind, PrimitivesFactory};
//! use kiln::gfx::resources::material::Material;
//! use kiln::gfx::scene::SceneManager;
//!
//! let mut scene = SceneManager::new();
//! let id = PrimitivesFactory::default()
//!     .spawn(PrimitiveKind::Cube, Material::solid_color([0.8, 0.3, 0.2]), &mut scene, None)
//!     .unwrap();
//! scene.get_mut(id).unwrap().transform.set_uniform_scale(0.5);
//! ```

pub mod gpu_mesh;
pub mod mesh;
pub mod model;
pub mod scene_manager;
pub mod transform;
pub mod vertex;

pub use gpu_mesh::{DrawCall, GpuMesh, MeshError, VertexLayout};
pub use mesh::Mesh;
pub use model::Model;
pub use scene_manager::{AutoRotate, Behavior, ObjectId, SceneManager, SceneObject, SceneStatistics};
pub use transform::Transform;
pub use vertex::Vertex;
