//! Render pipeline management for wgpu
//!
//! Pipelines are registered by name with a [`PipelineConfig`] and built from
//! the current [`PipelineState`]. Changing the state rebuilds every pipeline,
//! so a pipeline never mixes old and new render settings.
//!
//! Shader compilation and pipeline creation run inside validation error
//! scopes. A failure is logged and the affected pipeline stays absent.

use std::{collections::HashMap, sync::Arc};
use wgpu::*;

use crate::error::AssetError;
use crate::gfx::scene::gpu_mesh::VertexLayout;

use super::framebuffer::{COLOR_FORMAT, DEPTH_FORMAT};

/// Render state derived from the renderer settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineState {
    pub cull_mode: Option<Face>,
    pub polygon_mode: PolygonMode,
    pub depth_compare: CompareFunction,
    pub depth_write: bool,
    pub sample_count: u32,
}

impl Default for PipelineState {
    fn default() -> Self {
        Self {
            cull_mode: Some(Face::Back),
            polygon_mode: PolygonMode::Fill,
            depth_compare: CompareFunction::Less,
            depth_write: true,
            sample_count: 1,
        }
    }
}

impl PipelineState {
    /// State for geometry drawn behind everything else
    ///
    /// Only the sample count follows the settings.
    pub fn background(&self) -> Self {
        Self {
            cull_mode: None,
            polygon_mode: PolygonMode::Fill,
            depth_compare: CompareFunction::Always,
            depth_write: false,
            sample_count: self.sample_count,
        }
    }
}

/// Configuration for creating a render pipeline
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub label: String,
    pub shader: String,
    pub vertex_entry: String,
    pub fragment_entry: String,
    pub bind_group_layouts: Vec<BindGroupLayout>,
    /// `None` for pipelines that generate their vertices
    pub vertex_layout: Option<VertexLayout>,
    pub background: bool,
}

impl PipelineConfig {
    pub fn new(label: &str, shader: &str) -> Self {
        Self {
            label: label.to_string(),
            shader: shader.to_string(),
            vertex_entry: "vs_main".to_string(),
            fragment_entry: "fs_main".to_string(),
            bind_group_layouts: Vec::new(),
            vertex_layout: Some(VertexLayout::Full),
            background: false,
        }
    }

    pub fn with_entry_points(mut self, vertex: &str, fragment: &str) -> Self {
        self.vertex_entry = vertex.to_string();
        self.fragment_entry = fragment.to_string();
        self
    }

    pub fn with_bind_group_layouts(mut self, layouts: Vec<BindGroupLayout>) -> Self {
        self.bind_group_layouts = layouts;
        self
    }

    pub fn with_vertex_layout(mut self, layout: VertexLayout) -> Self {
        self.vertex_layout = Some(layout);
        self
    }

    /// Configures the pipeline to generate vertices from the vertex index
    pub fn with_no_vertex_buffers(mut self) -> Self {
        self.vertex_layout = None;
        self
    }

    /// Draws without culling or depth testing, see [`PipelineState::background`]
    pub fn as_background(mut self) -> Self {
        self.background = true;
        self
    }
}

/// Manages render pipelines and the shader modules they use
pub struct PipelineManager {
    device: Arc<Device>,
    state: PipelineState,
    pipelines: HashMap<String, RenderPipeline>,
    pipeline_configs: HashMap<String, PipelineConfig>,
    shader_modules: HashMap<String, ShaderModule>,
}

impl PipelineManager {
    pub fn new(device: Arc<Device>, state: PipelineState) -> Self {
        Self {
            device,
            state,
            pipelines: HashMap::new(),
            pipeline_configs: HashMap::new(),
            shader_modules: HashMap::new(),
        }
    }

    /// Compiles a WGSL module, keeping the previous one on failure
    pub fn load_shader(&mut self, name: &str, source: &str) -> Result<(), AssetError> {
        self.device.push_error_scope(ErrorFilter::Validation);
        let shader_module = self.device.create_shader_module(ShaderModuleDescriptor {
            label: Some(name),
            source: ShaderSource::Wgsl(source.into()),
        });

        if let Some(error) = pollster::block_on(self.device.pop_error_scope()) {
            return Err(AssetError::Shader {
                name: name.to_string(),
                message: error.to_string(),
            });
        }

        self.shader_modules.insert(name.to_string(), shader_module);
        Ok(())
    }

    /// Registers a configuration and builds it with the current state
    pub fn register_pipeline(&mut self, name: &str, config: PipelineConfig) {
        self.pipeline_configs.insert(name.to_string(), config);
        self.build(name);
    }

    pub fn pipeline(&self, name: &str) -> Option<&RenderPipeline> {
        self.pipelines.get(name)
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Replaces the render state and rebuilds every registered pipeline
    pub fn set_state(&mut self, state: PipelineState) {
        self.state = state;
        self.rebuild_all();
    }

    /// Drops all pipelines and recreates them from their configurations
    pub fn rebuild_all(&mut self) {
        self.pipelines.clear();
        let names: Vec<String> = self.pipeline_configs.keys().cloned().collect();
        for name in names {
            self.build(&name);
        }
        log::debug!(
            "Rebuilt {}/{} pipelines",
            self.pipelines.len(),
            self.pipeline_configs.len()
        );
    }

    fn build(&mut self, name: &str) {
        let Some(config) = self.pipeline_configs.get(name) else {
            return;
        };

        match self.create_pipeline_from_config(name, config) {
            Ok(pipeline) => {
                self.pipelines.insert(name.to_string(), pipeline);
            }
            Err(e) => {
                self.pipelines.remove(name);
                log::error!("Failed to create pipeline '{}': {}", name, e);
            }
        }
    }

    fn create_pipeline_from_config(
        &self,
        name: &str,
        config: &PipelineConfig,
    ) -> Result<RenderPipeline, String> {
        let shader = self
            .shader_modules
            .get(&config.shader)
            .ok_or_else(|| format!("Shader '{}' not loaded", config.shader))?;

        let state = if config.background {
            self.state.background()
        } else {
            self.state
        };

        let bind_group_layout_refs: Vec<&BindGroupLayout> =
            config.bind_group_layouts.iter().collect();

        self.device.push_error_scope(ErrorFilter::Validation);

        let pipeline_layout = self
            .device
            .create_pipeline_layout(&PipelineLayoutDescriptor {
                label: Some(&format!("{} Layout", name)),
                bind_group_layouts: &bind_group_layout_refs,
                push_constant_ranges: &[],
            });

        let vertex_buffers: Vec<VertexBufferLayout> = config
            .vertex_layout
            .iter()
            .map(VertexLayout::buffer_layout)
            .collect();

        let color_targets = [Some(ColorTargetState {
            format: COLOR_FORMAT,
            blend: Some(BlendState::REPLACE),
            write_mask: ColorWrites::ALL,
        })];

        let pipeline = self
            .device
            .create_render_pipeline(&RenderPipelineDescriptor {
                label: Some(&config.label),
                layout: Some(&pipeline_layout),
                vertex: VertexState {
                    module: shader,
                    entry_point: Some(config.vertex_entry.as_str()),
                    buffers: &vertex_buffers,
                    compilation_options: PipelineCompilationOptions::default(),
                },
                fragment: Some(FragmentState {
                    module: shader,
                    entry_point: Some(config.fragment_entry.as_str()),
                    targets: &color_targets,
                    compilation_options: PipelineCompilationOptions::default(),
                }),
                primitive: PrimitiveState {
                    topology: PrimitiveTopology::TriangleList,
                    strip_index_format: None,
                    front_face: FrontFace::Ccw,
                    cull_mode: state.cull_mode,
                    polygon_mode: state.polygon_mode,
                    unclipped_depth: false,
                    conservative: false,
                },
                depth_stencil: Some(DepthStencilState {
                    format: DEPTH_FORMAT,
                    depth_write_enabled: state.depth_write,
                    depth_compare: state.depth_compare,
                    stencil: StencilState::default(),
                    bias: DepthBiasState::default(),
                }),
                multisample: MultisampleState {
                    count: state.sample_count,
                    mask: !0,
                    alpha_to_coverage_enabled: false,
                },
                multiview: None,
                cache: None,
            });

        match pollster::block_on(self.device.pop_error_scope()) {
            Some(error) => Err(error.to_string()),
            None => Ok(pipeline),
        }
    }

    /// True if a configuration exists, whether or not it built
    pub fn has_pipeline(&self, name: &str) -> bool {
        self.pipeline_configs.contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_background_ignores_scene_state() {
        let state = PipelineState {
            cull_mode: Some(Face::Back),
            polygon_mode: PolygonMode::Line,
            depth_compare: CompareFunction::Less,
            depth_write: true,
            sample_count: 4,
        };
        let background = state.background();
        assert_eq!(background.cull_mode, None);
        assert_eq!(background.polygon_mode, PolygonMode::Fill);
        assert_eq!(background.depth_compare, CompareFunction::Always);
        assert!(!background.depth_write);
        assert_eq!(background.sample_count, 4);
    }

    #[test]
    fn test_config_builders() {
        let config = PipelineConfig::new("Sky", "skybox")
            .with_entry_points("vs_sky", "fs_sky")
            .with_no_vertex_buffers()
            .as_background();
        assert_eq!(config.vertex_entry, "vs_sky");
        assert!(config.vertex_layout.is_none());
        assert!(config.background);

        let raw = PipelineConfig::new("Raw", "scene").with_vertex_layout(VertexLayout::Raw { stride: 8 });
        assert_eq!(raw.vertex_layout, Some(VertexLayout::Raw { stride: 8 }));
    }
}
