//! Scene-level rendering
//!
//! [`Renderer`] owns the global render state and everything derived from it:
//! the pipelines, the shared bind group layouts and the per-frame uniform
//! resources. A frame into the editor viewport looks like this:
//!
//! ```text
//! prepare_frame -> begin_frame -> render_scene -> end_frame
//! ```
//!
//! Every settings change re-applies the whole [`RenderSettings`] struct; the
//! pipelines are rebuilt only when the resulting [`PipelineState`] differs.

use std::collections::BTreeSet;
use std::sync::Arc;

use cgmath::Vector3;
use serde::{Deserialize, Serialize};

use super::framebuffer::Framebuffer;
use super::pipeline_manager::{PipelineConfig, PipelineManager, PipelineState};
use super::scene_pass::{pipeline_name, FrameResources, FrameStats, ModelArena, ScenePass, SCENE_PIPELINE, SKYBOX_PIPELINE};
use super::shader::{FrameUniforms, ShaderProgram};
use super::shader_library::{ShaderLibrary, SCENE_SHADER, SKYBOX_SHADER};
use super::skybox::Skybox;
use crate::gfx::camera::FlyCamera;
use crate::gfx::geometry::PrimitivesFactory;
use crate::gfx::resources::material::Material;
use crate::gfx::resources::texture_manager::TextureManager;
use crate::gfx::scene::gpu_mesh::VertexLayout;
use crate::gfx::scene::SceneManager;

/// Samples per pixel when multisampling is on
pub const MSAA_SAMPLES: u32 = 4;

/// Global render state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    pub depth_test: bool,
    pub cull_face: bool,
    pub wireframe: bool,
    pub multisampling: bool,
    pub clear_color: [f32; 4],
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            depth_test: true,
            cull_face: true,
            wireframe: false,
            multisampling: true,
            clear_color: [0.1, 0.1, 0.1, 1.0],
        }
    }
}

impl RenderSettings {
    pub fn sample_count(&self) -> u32 {
        if self.multisampling {
            MSAA_SAMPLES
        } else {
            1
        }
    }

    /// Pipeline state for these settings
    ///
    /// Wireframe falls back to fill when the device cannot draw lines.
    pub fn pipeline_state(&self, polygon_line_supported: bool) -> PipelineState {
        let polygon_mode = if self.wireframe && polygon_line_supported {
            wgpu::PolygonMode::Line
        } else {
            wgpu::PolygonMode::Fill
        };

        PipelineState {
            cull_mode: self.cull_face.then_some(wgpu::Face::Back),
            polygon_mode,
            depth_compare: if self.depth_test {
                wgpu::CompareFunction::Less
            } else {
                wgpu::CompareFunction::Always
            },
            depth_write: self.depth_test,
            sample_count: self.sample_count(),
        }
    }
}

/// Point light and parallax parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lighting {
    pub light_position: Vector3<f32>,
    pub height_scale: f32,
}

impl Default for Lighting {
    fn default() -> Self {
        Self {
            light_position: Vector3::new(0.5, 1.0, 0.3),
            height_scale: 0.1,
        }
    }
}

impl Lighting {
    /// Changes the parallax height scale, keeping it within 0..1
    pub fn adjust_height_scale(&mut self, delta: f32) {
        self.height_scale = (self.height_scale + delta).clamp(0.0, 1.0);
    }
}

/// Per-frame uniforms for `camera` looking into a `width` x `height` viewport
pub fn scene_uniforms(camera: &FlyCamera, lighting: &Lighting, width: u32, height: u32) -> FrameUniforms {
    let aspect = width.max(1) as f32 / height.max(1) as f32;
    FrameUniforms {
        projection: camera.projection_matrix(aspect),
        view: camera.view_matrix(),
        view_position: camera.position,
        light_position: lighting.light_position,
        height_scale: lighting.height_scale,
    }
}

pub struct Renderer {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    settings: RenderSettings,
    polygon_line_supported: bool,
    shaders: ShaderLibrary,
    pipelines: PipelineManager,
    globals_layout: wgpu::BindGroupLayout,
    model_layout: wgpu::BindGroupLayout,
    material_layout: wgpu::BindGroupLayout,
    skybox_layout: wgpu::BindGroupLayout,
    frame: FrameResources,
    primitives: PrimitivesFactory,
}

impl Renderer {
    /// Compiles the shaders and builds the pipelines for `settings`
    ///
    /// Shader or pipeline failures are logged; the affected draws are skipped
    /// at render time.
    pub fn new(
        device: Arc<wgpu::Device>,
        queue: Arc<wgpu::Queue>,
        settings: RenderSettings,
        shaders: ShaderLibrary,
        textures: &TextureManager,
    ) -> Self {
        let polygon_line_supported = device
            .features()
            .contains(wgpu::Features::POLYGON_MODE_LINE);
        if settings.wireframe && !polygon_line_supported {
            log::warn!("Wireframe requested but POLYGON_MODE_LINE is unsupported, using fill");
        }

        let globals_layout = FrameResources::globals_bind_group_layout(&device);
        let model_layout = ModelArena::bind_group_layout(&device);
        let material_layout = Material::bind_group_layout(&device);
        let skybox_layout = Skybox::bind_group_layout(&device);

        let default_material = Material::create_fallback_bind_group(&device, &material_layout, textures);
        let frame = FrameResources::new(&device, &globals_layout, &model_layout, default_material);

        let pipelines = PipelineManager::new(
            device.clone(),
            settings.pipeline_state(polygon_line_supported),
        );

        let mut renderer = Self {
            device,
            queue,
            settings,
            polygon_line_supported,
            shaders,
            pipelines,
            globals_layout,
            model_layout,
            material_layout,
            skybox_layout,
            frame,
            primitives: PrimitivesFactory::default(),
        };

        renderer.load_shaders();
        renderer.register_pipelines();
        renderer
    }

    fn load_shaders(&mut self) {
        for name in ShaderLibrary::names() {
            let Some(source) = self.shaders.source(name) else {
                continue;
            };
            match self.pipelines.load_shader(name, &source) {
                Ok(()) => log::debug!("Compiled shader '{}'", name),
                Err(e) => log::error!("{}", e),
            }
        }
    }

    fn scene_layouts(&self) -> Vec<wgpu::BindGroupLayout> {
        vec![
            self.globals_layout.clone(),
            self.model_layout.clone(),
            self.material_layout.clone(),
        ]
    }

    fn register_pipelines(&mut self) {
        let scene = PipelineConfig::new("Scene Pipeline", SCENE_SHADER)
            .with_bind_group_layouts(self.scene_layouts());
        self.pipelines.register_pipeline(SCENE_PIPELINE, scene);

        // the primitive factory's raw meshes
        self.ensure_raw_pipeline(8);

        let skybox = PipelineConfig::new("Skybox Pipeline", SKYBOX_SHADER)
            .with_entry_points("vs_sky", "fs_sky")
            .with_bind_group_layouts(vec![self.globals_layout.clone(), self.skybox_layout.clone()])
            .with_no_vertex_buffers()
            .as_background();
        self.pipelines.register_pipeline(SKYBOX_PIPELINE, skybox);
    }

    fn ensure_raw_pipeline(&mut self, stride: usize) {
        let layout = VertexLayout::Raw { stride };
        let name = pipeline_name(layout);
        if self.pipelines.has_pipeline(&name) {
            return;
        }

        let config = PipelineConfig::new(&format!("Scene Pipeline (raw {})", stride), SCENE_SHADER)
            .with_entry_points("vs_raw", "fs_main")
            .with_vertex_layout(layout)
            .with_bind_group_layouts(self.scene_layouts());
        self.pipelines.register_pipeline(&name, config);
    }

    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    pub fn enable_wireframe(&mut self, enabled: bool) {
        self.settings.wireframe = enabled;
        self.apply_settings();
    }

    pub fn enable_depth_test(&mut self, enabled: bool) {
        self.settings.depth_test = enabled;
        self.apply_settings();
    }

    pub fn enable_cull_face(&mut self, enabled: bool) {
        self.settings.cull_face = enabled;
        self.apply_settings();
    }

    pub fn enable_multisampling(&mut self, enabled: bool) {
        self.settings.multisampling = enabled;
        self.apply_settings();
    }

    pub fn set_clear_color(&mut self, color: [f32; 4]) {
        self.settings.clear_color = color;
        self.apply_settings();
    }

    /// Re-applies the whole settings struct
    fn apply_settings(&mut self) {
        if self.settings.wireframe && !self.polygon_line_supported {
            log::warn!("Wireframe requested but POLYGON_MODE_LINE is unsupported, using fill");
        }

        let state = self.settings.pipeline_state(self.polygon_line_supported);
        if state != self.pipelines.state() {
            self.pipelines.set_state(state);
        }
    }

    /// Framebuffer sample count matching the pipelines
    pub fn sample_count(&self) -> u32 {
        self.pipelines.state().sample_count
    }

    pub fn supports_wireframe(&self) -> bool {
        self.polygon_line_supported
    }

    pub fn skybox_layout(&self) -> &wgpu::BindGroupLayout {
        &self.skybox_layout
    }

    pub fn primitives(&self) -> &PrimitivesFactory {
        &self.primitives
    }

    /// Uploads new meshes and readies pipelines and uniform space for `scene`
    pub fn prepare_frame(&mut self, scene: &mut SceneManager, textures: &TextureManager) {
        scene.prepare_gpu(&self.device, &self.material_layout, textures);

        let strides: BTreeSet<usize> = scene
            .iter()
            .flat_map(|object| object.model.meshes())
            .filter_map(|mesh| match mesh.gpu_mesh.layout() {
                VertexLayout::Raw { stride } => Some(stride),
                VertexLayout::Full => None,
            })
            .collect();
        for stride in strides {
            self.ensure_raw_pipeline(stride);
        }

        let active = scene.iter().filter(|object| object.active).count();
        self.frame
            .models
            .ensure_capacity(&self.device, u32::try_from(active).unwrap_or(u32::MAX));
    }

    /// Binds `framebuffer` and clears it with the clear color
    ///
    /// Returns `None` when the framebuffer has no attachments.
    pub fn begin_frame<'r>(
        &'r mut self,
        encoder: &mut wgpu::CommandEncoder,
        framebuffer: &Framebuffer,
        skybox: Option<&'r Skybox>,
    ) -> Option<ScenePass<'r>> {
        let pass = framebuffer.bind(encoder, self.settings.clear_color)?;
        Some(ScenePass::new(
            pass,
            &self.queue,
            &mut self.frame,
            &self.pipelines,
            skybox,
        ))
    }

    /// Sets the frame uniforms, draws the skybox, then every active object
    pub fn render_scene(shader: &mut dyn ShaderProgram, scene: &SceneManager, uniforms: &FrameUniforms) {
        shader.set_frame_uniforms(uniforms);
        shader.draw_skybox();
        scene.render_all(shader);
    }

    /// Unbinds the framebuffer
    pub fn end_frame(framebuffer: &Framebuffer, pass: ScenePass<'_>) -> FrameStats {
        let (pass, stats) = pass.finish();
        framebuffer.unbind(pass);
        stats
    }
}

#[cfg(test)]
mod tests {
    use cgmath::{Matrix4, Point3, SquareMatrix};

    use super::*;
    use crate::gfx::geometry::PrimitiveKind;
    use crate::gfx::rendering::shader::recording::{RecordingShader, ShaderCall};

    #[test]
    fn test_default_settings() {
        let settings = RenderSettings::default();
        assert!(settings.depth_test);
        assert!(settings.cull_face);
        assert!(!settings.wireframe);
        assert!(settings.multisampling);
        assert_eq!(settings.clear_color, [0.1, 0.1, 0.1, 1.0]);
        assert_eq!(settings.sample_count(), MSAA_SAMPLES);
    }

    #[test]
    fn test_pipeline_state_follows_settings() {
        let settings = RenderSettings {
            depth_test: false,
            cull_face: false,
            wireframe: true,
            multisampling: false,
            ..Default::default()
        };
        let state = settings.pipeline_state(true);
        assert_eq!(state.cull_mode, None);
        assert_eq!(state.polygon_mode, wgpu::PolygonMode::Line);
        assert_eq!(state.depth_compare, wgpu::CompareFunction::Always);
        assert!(!state.depth_write);
        assert_eq!(state.sample_count, 1);

        let default_state = RenderSettings::default().pipeline_state(true);
        assert_eq!(default_state, PipelineState { sample_count: MSAA_SAMPLES, ..Default::default() });
    }

    #[test]
    fn test_wireframe_without_line_support_fills() {
        let settings = RenderSettings {
            wireframe: true,
            ..Default::default()
        };
        assert_eq!(settings.pipeline_state(false).polygon_mode, wgpu::PolygonMode::Fill);
    }

    #[test]
    fn test_height_scale_is_clamped() {
        let mut lighting = Lighting::default();
        lighting.adjust_height_scale(5.0);
        assert_eq!(lighting.height_scale, 1.0);
        lighting.adjust_height_scale(-0.25);
        assert_eq!(lighting.height_scale, 0.75);
        lighting.adjust_height_scale(-2.0);
        assert_eq!(lighting.height_scale, 0.0);
    }

    #[test]
    fn test_scene_uniforms_use_camera() {
        let camera = FlyCamera::new(Point3::new(0.0, 0.0, 3.0));
        let lighting = Lighting::default();
        let uniforms = scene_uniforms(&camera, &lighting, 1280, 720);

        assert_eq!(uniforms.view_position, camera.position);
        assert_eq!(uniforms.view, camera.view_matrix());
        assert_eq!(uniforms.projection, camera.projection_matrix(1280.0 / 720.0));
        assert_eq!(uniforms.light_position, lighting.light_position);
        assert_eq!(uniforms.height_scale, 0.1);

        // a collapsed viewport must not produce NaNs
        let collapsed = scene_uniforms(&camera, &lighting, 0, 0);
        assert!(!collapsed.projection.x.x.is_nan());
    }

    #[test]
    fn test_render_scene_call_order() {
        let mut scene = SceneManager::new();
        let model = PrimitivesFactory::default()
            .create(PrimitiveKind::Cube, Material::default())
            .unwrap();
        scene.add_object("Cube", model, None);

        let camera = FlyCamera::default();
        let uniforms = scene_uniforms(&camera, &Lighting::default(), 800, 600);
        let mut shader = RecordingShader::default();
        Renderer::render_scene(&mut shader, &scene, &uniforms);

        assert_eq!(
            shader.calls,
            vec![
                ShaderCall::FrameUniforms(uniforms),
                ShaderCall::Skybox,
                ShaderCall::ModelMatrix(Matrix4::identity()),
                ShaderCall::BindMaterial,
                ShaderCall::Draw { vertex_count: 36 },
                ShaderCall::UnbindMaterial,
            ]
        );
    }
}
