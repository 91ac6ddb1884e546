//! Scene objects and the manager that owns them
//!
//! Objects are kept in insertion order and addressed by [`ObjectId`]. IDs come
//! from a process-wide counter, so a removed object's ID never resolves again.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use super::model::Model;
use super::transform::Transform;
use crate::gfx::rendering::shader::ShaderProgram;
use crate::gfx::resources::texture_manager::TextureManager;

static NEXT_OBJECT_ID: AtomicU64 = AtomicU64::new(1);

/// Stable handle to a [`SceneObject`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(u64);

impl ObjectId {
    fn next() -> Self {
        Self(NEXT_OBJECT_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Spins the object around its Y axis
#[derive(Debug, Clone, PartialEq)]
pub struct AutoRotate {
    pub enabled: bool,
    /// Degrees per second
    pub speed: f32,
}

impl Default for AutoRotate {
    fn default() -> Self {
        Self {
            enabled: false,
            speed: 45.0,
        }
    }
}

impl AutoRotate {
    fn update(&mut self, delta_time: f32, transform: &mut Transform) {
        if self.enabled {
            transform.rotate([0.0, self.speed * delta_time, 0.0].into());
        }
    }
}

/// Per-object logic run once per frame while the object is active
#[derive(Debug, Clone, PartialEq)]
pub enum Behavior {
    AutoRotate(AutoRotate),
}

impl Behavior {
    pub fn update(&mut self, delta_time: f32, transform: &mut Transform) {
        match self {
            Behavior::AutoRotate(auto_rotate) => auto_rotate.update(delta_time, transform),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Behavior::AutoRotate(_) => "Auto Rotate",
        }
    }
}

#[derive(Debug)]
pub struct SceneObject {
    id: ObjectId,
    pub name: String,
    pub model: Model,
    pub transform: Transform,
    pub active: bool,
    pub behaviors: Vec<Behavior>,
}

impl SceneObject {
    pub fn id(&self) -> ObjectId {
        self.id
    }

    fn update(&mut self, delta_time: f32) {
        for behavior in &mut self.behaviors {
            behavior.update(delta_time, &mut self.transform);
        }
    }
}

/// Scene statistics for the editor
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SceneStatistics {
    pub object_count: usize,
    pub active_count: usize,
    pub total_triangles: u32,
    pub total_vertices: u32,
}

#[derive(Debug, Default)]
pub struct SceneManager {
    objects: Vec<SceneObject>,
}

impl SceneManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a new active object with an [`AutoRotate`] behavior, initially off
    pub fn add_object(
        &mut self,
        name: impl Into<String>,
        model: Model,
        transform: Option<Transform>,
    ) -> ObjectId {
        let id = ObjectId::next();
        let name = name.into();
        log::debug!("Adding scene object '{}' {}", name, id);

        self.objects.push(SceneObject {
            id,
            name,
            model,
            transform: transform.unwrap_or_default(),
            active: true,
            behaviors: vec![Behavior::AutoRotate(AutoRotate::default())],
        });
        id
    }

    /// Removes the object; unknown IDs are ignored
    pub fn remove_object(&mut self, id: ObjectId) -> Option<SceneObject> {
        let index = self.objects.iter().position(|o| o.id == id)?;
        let object = self.objects.remove(index);
        log::debug!("Removed scene object '{}' {}", object.name, id);
        Some(object)
    }

    pub fn clear(&mut self) {
        log::info!("Clearing scene ({} objects)", self.objects.len());
        self.objects.clear();
    }

    /// Runs the behaviors of every active object
    pub fn update(&mut self, delta_time: f32) {
        for object in self.objects.iter_mut().filter(|o| o.active) {
            object.update(delta_time);
        }
    }

    /// Draws active objects in insertion order
    pub fn render_all(&self, shader: &mut dyn ShaderProgram) {
        for object in self.objects.iter().filter(|o| o.active) {
            shader.set_model_matrix(&object.transform.model_matrix());
            object.model.draw(shader);
        }
    }

    /// Uploads meshes and builds material bind groups that are still missing
    pub fn prepare_gpu(
        &mut self,
        device: &wgpu::Device,
        material_layout: &wgpu::BindGroupLayout,
        textures: &TextureManager,
    ) {
        for object in &mut self.objects {
            object.model.prepare_gpu(device, material_layout, textures);
        }
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn get(&self, id: ObjectId) -> Option<&SceneObject> {
        self.objects.iter().find(|o| o.id == id)
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut SceneObject> {
        self.objects.iter_mut().find(|o| o.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SceneObject> {
        self.objects.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut SceneObject> {
        self.objects.iter_mut()
    }

    /// Appends " (n)" until the name is not taken
    pub fn unique_name(&self, desired_name: &str) -> String {
        let mut counter = 0;
        let mut name = desired_name.to_string();

        while self.objects.iter().any(|o| o.name == name) {
            counter += 1;
            name = format!("{} ({})", desired_name, counter);
        }

        name
    }

    pub fn statistics(&self) -> SceneStatistics {
        let mut stats = SceneStatistics {
            object_count: self.objects.len(),
            ..Default::default()
        };

        for object in &self.objects {
            if object.active {
                stats.active_count += 1;
            }
            for mesh in object.model.meshes() {
                let gpu_mesh = &mesh.gpu_mesh;
                let corners = if gpu_mesh.is_indexed() {
                    gpu_mesh.index_count()
                } else {
                    gpu_mesh.vertex_count()
                };
                stats.total_triangles += corners / 3;
                stats.total_vertices += gpu_mesh.vertex_count();
            }
        }

        stats
    }
}

#[cfg(test)]
mod tests {
    use cgmath::{Matrix4, SquareMatrix, Vector3};

    use super::*;
    use crate::gfx::geometry::{PrimitiveKind, PrimitivesFactory};
    use crate::gfx::rendering::shader::recording::{RecordingShader, ShaderCall};
    use crate::gfx::resources::material::Material;

    fn cube() -> Model {
        PrimitivesFactory::default()
            .create(PrimitiveKind::Cube, Material::default())
            .unwrap()
    }

    #[test]
    fn test_ids_are_never_reused() {
        let mut scene = SceneManager::new();
        let first = scene.add_object("A", cube(), None);
        scene.remove_object(first);
        let second = scene.add_object("B", cube(), None);

        assert!(second > first);
        assert!(scene.get(first).is_none());
        assert_eq!(scene.get(second).unwrap().name, "B");
    }

    #[test]
    fn test_object_count_tracks_adds_and_removes() {
        let mut scene = SceneManager::new();
        let ids: Vec<_> = (0..3).map(|i| scene.add_object(format!("Obj{i}"), cube(), None)).collect();
        assert_eq!(scene.object_count(), 3);

        scene.remove_object(ids[1]);
        assert_eq!(scene.object_count(), 2);
        let remaining: Vec<_> = scene.iter().map(|o| o.id()).collect();
        assert_eq!(remaining, vec![ids[0], ids[2]]);

        scene.clear();
        assert!(scene.is_empty());
    }

    #[test]
    fn test_removing_unknown_id_is_noop() {
        let mut scene = SceneManager::new();
        let id = scene.add_object("Cube", cube(), None);
        scene.remove_object(id);
        assert!(scene.remove_object(id).is_none());
        assert_eq!(scene.object_count(), 0);
    }

    #[test]
    fn test_render_all_sets_identity_for_default_transform() {
        let mut scene = SceneManager::new();
        scene.add_object("Cube", cube(), None);

        let mut shader = RecordingShader::default();
        scene.render_all(&mut shader);

        assert_eq!(shader.model_matrices(), vec![Matrix4::identity()]);
        assert_eq!(shader.calls[0], ShaderCall::ModelMatrix(Matrix4::identity()));
        assert_eq!(shader.draw_count(), 1);
        assert!(shader.calls.contains(&ShaderCall::Draw { vertex_count: 36 }));
    }

    #[test]
    fn test_render_all_skips_inactive_objects() {
        let mut scene = SceneManager::new();
        let shifted = Transform {
            position: Vector3::new(1.0, 0.0, 0.0),
            ..Default::default()
        };
        scene.add_object("Visible", cube(), Some(shifted));
        let hidden = scene.add_object("Hidden", cube(), None);
        scene.get_mut(hidden).unwrap().active = false;

        let mut shader = RecordingShader::default();
        scene.render_all(&mut shader);

        assert_eq!(shader.draw_count(), 1);
        assert_eq!(
            shader.model_matrices(),
            vec![Matrix4::from_translation(Vector3::new(1.0, 0.0, 0.0))]
        );
    }

    #[test]
    fn test_update_runs_enabled_auto_rotate() {
        let mut scene = SceneManager::new();
        let spinning = scene.add_object("Spinning", cube(), None);
        let idle = scene.add_object("Idle", cube(), None);
        let inactive = scene.add_object("Inactive", cube(), None);

        for id in [spinning, inactive] {
            let object = scene.get_mut(id).unwrap();
            object.behaviors = vec![Behavior::AutoRotate(AutoRotate {
                enabled: true,
                speed: 90.0,
            })];
        }
        scene.get_mut(inactive).unwrap().active = false;

        scene.update(0.5);

        assert_eq!(scene.get(spinning).unwrap().transform.rotation.y, 45.0);
        assert_eq!(scene.get(idle).unwrap().transform.rotation.y, 0.0);
        assert_eq!(scene.get(inactive).unwrap().transform.rotation.y, 0.0);
    }

    #[test]
    fn test_new_objects_carry_idle_auto_rotate() {
        let mut scene = SceneManager::new();
        let id = scene.add_object("Cube", cube(), None);
        let object = scene.get(id).unwrap();

        assert_eq!(object.behaviors, vec![Behavior::AutoRotate(AutoRotate::default())]);
        assert_eq!(object.behaviors[0].name(), "Auto Rotate");

        scene.update(1.0);
        assert_eq!(scene.get(id).unwrap().transform.rotation.y, 0.0);
    }

    #[test]
    fn test_unique_name() {
        let mut scene = SceneManager::new();
        assert_eq!(scene.unique_name("Cube"), "Cube");
        scene.add_object("Cube", cube(), None);
        assert_eq!(scene.unique_name("Cube"), "Cube (1)");
        scene.add_object("Cube (1)", cube(), None);
        assert_eq!(scene.unique_name("Cube"), "Cube (2)");
    }

    #[test]
    fn test_statistics_count_raw_triangles() {
        let mut scene = SceneManager::new();
        scene.add_object("Cube", cube(), None);
        let stats = scene.statistics();
        assert_eq!(stats.object_count, 1);
        assert_eq!(stats.active_count, 1);
        assert_eq!(stats.total_triangles, 12);
        assert_eq!(stats.total_vertices, 36);
    }
}
