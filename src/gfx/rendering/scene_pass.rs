//! The GPU implementation of [`ShaderProgram`]
//!
//! A [`ScenePass`] wraps the framebuffer render pass for one frame. Model
//! matrices go into a dynamic-offset uniform arena: each `set_model_matrix`
//! takes the next slot, the matrices are staged on the CPU and written in one
//! go when the pass finishes, before the frame is submitted.
//!
//! ## Bind groups
//!
//! | Group | Contents                                  |
//! |-------|-------------------------------------------|
//! | 0     | [`GlobalUniform`]                         |
//! | 1     | [`ModelUniform`] slot (dynamic offset)    |
//! | 2     | material, or the skybox cubemap           |

use cgmath::{Matrix, Matrix4, SquareMatrix, Vector4};

use super::pipeline_manager::PipelineManager;
use super::shader::{FrameUniforms, ShaderProgram};
use super::skybox::Skybox;
use crate::gfx::resources::material::Material;
use crate::gfx::scene::gpu_mesh::{GpuMesh, VertexLayout};
use crate::wgpu_utils::{binding_types, UniformBuffer};

pub const SCENE_PIPELINE: &str = "scene";
pub const SKYBOX_PIPELINE: &str = "skybox";

/// Name of the pipeline that draws meshes with `layout`
pub fn pipeline_name(layout: VertexLayout) -> String {
    match layout {
        VertexLayout::Full => SCENE_PIPELINE.to_string(),
        VertexLayout::Raw { stride } => format!("scene_raw_{}", stride),
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GlobalUniform {
    pub view_proj: [[f32; 4]; 4],
    /// Inverse of projection * view with the translation removed
    pub sky_inv_view_proj: [[f32; 4]; 4],
    pub view_position: [f32; 4],
    pub light_position: [f32; 4],
    /// x: parallax height scale
    pub params: [f32; 4],
}

impl GlobalUniform {
    pub fn from_frame(frame: &FrameUniforms) -> Self {
        let mut rotation_only = frame.view;
        rotation_only.w = Vector4::new(0.0, 0.0, 0.0, 1.0);
        let sky_inv_view_proj = (frame.projection * rotation_only)
            .invert()
            .unwrap_or_else(Matrix4::identity);

        let eye = frame.view_position;
        let light = frame.light_position;
        Self {
            view_proj: (frame.projection * frame.view).into(),
            sky_inv_view_proj: sky_inv_view_proj.into(),
            view_position: [eye.x, eye.y, eye.z, 1.0],
            light_position: [light.x, light.y, light.z, 1.0],
            params: [frame.height_scale, 0.0, 0.0, 0.0],
        }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ModelUniform {
    pub model: [[f32; 4]; 4],
    /// Inverse transpose of `model`
    pub normal: [[f32; 4]; 4],
}

impl ModelUniform {
    pub fn new(model: &Matrix4<f32>) -> Self {
        let normal = model.invert().map(|m| m.transpose()).unwrap_or(*model);
        Self {
            model: (*model).into(),
            normal: normal.into(),
        }
    }
}

/// Uniform buffer of model slots addressed by dynamic offset
#[derive(Debug)]
pub struct ModelArena {
    layout: wgpu::BindGroupLayout,
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    stride: u64,
    capacity: u32,
    staging: Vec<u8>,
}

impl ModelArena {
    pub const MIN_CAPACITY: u32 = 64;
    pub const ELEMENT_SIZE: u64 = std::mem::size_of::<ModelUniform>() as u64;

    pub fn new(device: &wgpu::Device, layout: &wgpu::BindGroupLayout) -> Self {
        let stride = Self::stride_for(device.limits().min_uniform_buffer_offset_alignment);
        let (buffer, bind_group) = Self::allocate(device, layout, stride, Self::MIN_CAPACITY);
        Self {
            layout: layout.clone(),
            buffer,
            bind_group,
            stride,
            capacity: Self::MIN_CAPACITY,
            staging: Vec::new(),
        }
    }

    /// Slot size: one [`ModelUniform`] rounded up to the offset alignment
    pub fn stride_for(alignment: u32) -> u64 {
        let alignment = u64::from(alignment.max(1));
        Self::ELEMENT_SIZE.div_ceil(alignment) * alignment
    }

    /// Capacity needed for `count` slots
    pub fn capacity_for(count: u32) -> u32 {
        count.max(Self::MIN_CAPACITY).next_power_of_two()
    }

    pub fn bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
        device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Model Bind Group Layout"),
            entries: &[binding_types::entry(
                0,
                binding_types::dynamic_uniform(Self::ELEMENT_SIZE),
            )],
        })
    }

    /// Grows the buffer so `count` objects fit in one frame
    pub fn ensure_capacity(&mut self, device: &wgpu::Device, count: u32) {
        if count <= self.capacity {
            return;
        }

        let capacity = Self::capacity_for(count);
        let (buffer, bind_group) = Self::allocate(device, &self.layout, self.stride, capacity);
        self.buffer = buffer;
        self.bind_group = bind_group;
        self.capacity = capacity;
        log::debug!("Model arena grown to {} slots", capacity);
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    fn allocate(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        stride: u64,
        capacity: u32,
    ) -> (wgpu::Buffer, wgpu::BindGroup) {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Model Arena"),
            size: stride * u64::from(capacity),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Model Arena Bind Group"),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &buffer,
                    offset: 0,
                    size: wgpu::BufferSize::new(Self::ELEMENT_SIZE),
                }),
            }],
        });

        (buffer, bind_group)
    }

    /// Copies `uniform` into the staging area and returns its dynamic offset
    fn stage(&mut self, slot: u32, uniform: &ModelUniform) -> u32 {
        let offset = self.stride * u64::from(slot);
        let start = offset as usize;
        let end = start + Self::ELEMENT_SIZE as usize;
        if self.staging.len() < end {
            self.staging.resize(start + self.stride as usize, 0);
        }
        self.staging[start..end].copy_from_slice(bytemuck::bytes_of(uniform));
        offset as u32
    }

    fn flush(&mut self, queue: &wgpu::Queue, slots: u32) {
        let len = (self.stride * u64::from(slots)) as usize;
        if len > 0 && len <= self.staging.len() {
            queue.write_buffer(&self.buffer, 0, &self.staging[..len]);
        }
    }
}

/// Per-frame GPU state shared by every draw
pub struct FrameResources {
    pub globals: UniformBuffer<GlobalUniform>,
    pub globals_bind_group: wgpu::BindGroup,
    pub models: ModelArena,
    pub default_material: wgpu::BindGroup,
}

impl FrameResources {
    pub fn globals_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
        device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Globals Bind Group Layout"),
            entries: &[binding_types::entry(0, binding_types::uniform())],
        })
    }

    pub fn new(
        device: &wgpu::Device,
        globals_layout: &wgpu::BindGroupLayout,
        model_layout: &wgpu::BindGroupLayout,
        default_material: wgpu::BindGroup,
    ) -> Self {
        let globals = UniformBuffer::<GlobalUniform>::new(device);
        let globals_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Globals Bind Group"),
            layout: globals_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: globals.binding_resource(),
            }],
        });

        Self {
            globals,
            globals_bind_group,
            models: ModelArena::new(device, model_layout),
            default_material,
        }
    }
}

/// Draw counts of one finished pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub draw_calls: u32,
    pub skipped_draws: u32,
}

impl FrameStats {
    /// True when draws are skipped now but were not in `previous`
    pub fn started_skipping(&self, previous: &FrameStats) -> bool {
        self.skipped_draws > 0 && previous.skipped_draws == 0
    }
}

pub struct ScenePass<'r> {
    pass: wgpu::RenderPass<'static>,
    queue: &'r wgpu::Queue,
    frame: &'r mut FrameResources,
    pipelines: &'r PipelineManager,
    skybox: Option<&'r Skybox>,
    next_slot: u32,
    model_bound: bool,
    current_layout: Option<VertexLayout>,
    stats: FrameStats,
}

impl<'r> ScenePass<'r> {
    pub(crate) fn new(
        pass: wgpu::RenderPass<'static>,
        queue: &'r wgpu::Queue,
        frame: &'r mut FrameResources,
        pipelines: &'r PipelineManager,
        skybox: Option<&'r Skybox>,
    ) -> Self {
        Self {
            pass,
            queue,
            frame,
            pipelines,
            skybox,
            next_slot: 0,
            model_bound: false,
            current_layout: None,
            stats: FrameStats::default(),
        }
    }

    /// Writes the staged model matrices and hands back the render pass
    pub fn finish(self) -> (wgpu::RenderPass<'static>, FrameStats) {
        self.frame.models.flush(self.queue, self.next_slot);
        (self.pass, self.stats)
    }

    fn skip(&mut self) {
        self.stats.skipped_draws += 1;
    }
}

impl ShaderProgram for ScenePass<'_> {
    fn set_frame_uniforms(&mut self, uniforms: &FrameUniforms) {
        self.frame
            .globals
            .update_content(self.queue, GlobalUniform::from_frame(uniforms));
        self.pass
            .set_bind_group(0, &self.frame.globals_bind_group, &[]);
    }

    fn set_model_matrix(&mut self, model: &Matrix4<f32>) {
        if self.next_slot >= self.frame.models.capacity() {
            if self.model_bound {
                log::warn!("Model arena full, skipping remaining objects");
            }
            self.model_bound = false;
            return;
        }

        let offset = self
            .frame
            .models
            .stage(self.next_slot, &ModelUniform::new(model));
        self.next_slot += 1;
        self.pass
            .set_bind_group(1, &self.frame.models.bind_group, &[offset]);
        self.model_bound = true;
    }

    fn bind_material(&mut self, material: &Material) {
        let bind_group = material
            .bind_group()
            .unwrap_or(&self.frame.default_material);
        self.pass.set_bind_group(2, bind_group, &[]);
    }

    fn unbind_material(&mut self) {
        self.pass
            .set_bind_group(2, &self.frame.default_material, &[]);
    }

    fn draw_mesh(&mut self, mesh: &GpuMesh) {
        if !self.model_bound || !mesh.is_uploaded() {
            self.skip();
            return;
        }

        let layout = mesh.layout();
        if self.current_layout != Some(layout) {
            let Some(pipeline) = self.pipelines.pipeline(&pipeline_name(layout)) else {
                self.skip();
                return;
            };
            self.pass.set_pipeline(pipeline);
            self.current_layout = Some(layout);
        }

        mesh.draw(&mut self.pass);
        self.stats.draw_calls += 1;
    }

    fn draw_skybox(&mut self) {
        let Some(skybox) = self.skybox else {
            return;
        };
        let Some(pipeline) = self.pipelines.pipeline(SKYBOX_PIPELINE) else {
            return;
        };

        self.pass.set_pipeline(pipeline);
        self.pass
            .set_bind_group(0, &self.frame.globals_bind_group, &[]);
        self.pass.set_bind_group(1, skybox.bind_group(), &[]);
        self.pass.draw(0..3, 0..1);
        self.current_layout = None;
        self.stats.draw_calls += 1;
    }
}
