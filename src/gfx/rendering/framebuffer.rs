//! Off-screen render target
//!
//! A [`Framebuffer`] owns a color texture that the editor samples as an image,
//! a depth/stencil texture and, when multisampled, a resolve source. All
//! attachments are exactly `width x height`; any change recreates every one of
//! them and bumps [`Framebuffer::generation`] so texture users can re-register.
//!
//! Allocation goes through [`AttachmentAllocator`]. The GPU implementation
//! catches validation and out-of-memory errors; a failed allocation leaves the
//! framebuffer without attachments until the next successful resize.

use std::sync::Arc;

use crate::gfx::resources::texture_resource::TextureResource;

pub const COLOR_FORMAT: wgpu::TextureFormat = TextureResource::COLOR_FORMAT;
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth24PlusStencil8;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum FramebufferError {
    #[error("framebuffer size {width}x{height} is not positive")]
    ZeroSize { width: u32, height: u32 },

    #[error("attachment allocation failed: {0}")]
    Allocation(String),
}

/// Creates the attachments of a [`Framebuffer`]
pub trait AttachmentAllocator {
    type Attachments;

    fn allocate(
        &mut self,
        width: u32,
        height: u32,
        sample_count: u32,
    ) -> Result<Self::Attachments, FramebufferError>;
}

pub struct Framebuffer<A: AttachmentAllocator = GpuAttachmentAllocator> {
    allocator: A,
    width: u32,
    height: u32,
    sample_count: u32,
    attachments: Option<A::Attachments>,
    generation: u64,
}

impl<A: AttachmentAllocator> Framebuffer<A> {
    /// Creates the framebuffer and allocates its attachments
    pub fn new(allocator: A, width: u32, height: u32, sample_count: u32) -> Self {
        let mut framebuffer = Self {
            allocator,
            width: width.max(1),
            height: height.max(1),
            sample_count: sample_count.max(1),
            attachments: None,
            generation: 0,
        };
        framebuffer.invalidate();
        framebuffer
    }

    /// Drops all attachments and allocates new ones at the current size
    pub fn invalidate(&mut self) {
        self.attachments = None;

        match self
            .allocator
            .allocate(self.width, self.height, self.sample_count)
        {
            Ok(attachments) => {
                self.attachments = Some(attachments);
                self.generation += 1;
                log::debug!(
                    "Framebuffer allocated {}x{} ({}x MSAA)",
                    self.width,
                    self.height,
                    self.sample_count
                );
            }
            Err(e) => {
                log::error!("Framebuffer is not complete: {}", e);
            }
        }
    }

    /// Reallocates at a new size; zero or unchanged sizes are ignored
    ///
    /// Returns true if the attachments were recreated.
    pub fn resize(&mut self, width: u32, height: u32) -> bool {
        if width == 0 || height == 0 {
            return false;
        }
        if width == self.width && height == self.height && self.attachments.is_some() {
            return false;
        }

        self.width = width;
        self.height = height;
        self.invalidate();
        true
    }

    /// Switches between single and multisampled attachments
    pub fn set_sample_count(&mut self, sample_count: u32) -> bool {
        let sample_count = sample_count.max(1);
        if sample_count == self.sample_count {
            return false;
        }

        self.sample_count = sample_count;
        self.invalidate();
        true
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn sample_count(&self) -> u32 {
        self.sample_count
    }

    /// Increments on every successful allocation
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_complete(&self) -> bool {
        self.attachments.is_some()
    }

    pub fn attachments(&self) -> Option<&A::Attachments> {
        self.attachments.as_ref()
    }
}

/// GPU attachments of a [`Framebuffer`]
#[derive(Debug)]
pub struct GpuAttachments {
    pub color: Arc<wgpu::Texture>,
    pub color_view: Arc<wgpu::TextureView>,
    pub depth_view: wgpu::TextureView,
    /// Multisampled color target resolved into `color`
    pub msaa_view: Option<wgpu::TextureView>,
}

#[derive(Debug)]
pub struct GpuAttachmentAllocator {
    device: Arc<wgpu::Device>,
}

impl GpuAttachmentAllocator {
    pub fn new(device: Arc<wgpu::Device>) -> Self {
        Self { device }
    }

    fn create_texture(
        &self,
        label: &str,
        size: wgpu::Extent3d,
        sample_count: u32,
        format: wgpu::TextureFormat,
        usage: wgpu::TextureUsages,
    ) -> wgpu::Texture {
        self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage,
            view_formats: &[],
        })
    }
}

impl AttachmentAllocator for GpuAttachmentAllocator {
    type Attachments = GpuAttachments;

    fn allocate(
        &mut self,
        width: u32,
        height: u32,
        sample_count: u32,
    ) -> Result<GpuAttachments, FramebufferError> {
        if width == 0 || height == 0 {
            return Err(FramebufferError::ZeroSize { width, height });
        }

        let limit = self.device.limits().max_texture_dimension_2d;
        if width > limit || height > limit {
            return Err(FramebufferError::Allocation(format!(
                "{}x{} exceeds the device limit of {}",
                width, height, limit
            )));
        }

        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };

        self.device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);

        let color = self.create_texture(
            "Framebuffer Color",
            size,
            1,
            COLOR_FORMAT,
            wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
        );
        let depth = self.create_texture(
            "Framebuffer Depth Stencil",
            size,
            sample_count,
            DEPTH_FORMAT,
            wgpu::TextureUsages::RENDER_ATTACHMENT,
        );
        let msaa = (sample_count > 1).then(|| {
            self.create_texture(
                "Framebuffer Multisample Color",
                size,
                sample_count,
                COLOR_FORMAT,
                wgpu::TextureUsages::RENDER_ATTACHMENT,
            )
        });

        let validation = pollster::block_on(self.device.pop_error_scope());
        let out_of_memory = pollster::block_on(self.device.pop_error_scope());
        if let Some(error) = validation.or(out_of_memory) {
            return Err(FramebufferError::Allocation(error.to_string()));
        }

        let color_view = color.create_view(&wgpu::TextureViewDescriptor::default());
        Ok(GpuAttachments {
            color: Arc::new(color),
            color_view: Arc::new(color_view),
            depth_view: depth.create_view(&wgpu::TextureViewDescriptor::default()),
            msaa_view: msaa.map(|t| t.create_view(&wgpu::TextureViewDescriptor::default())),
        })
    }
}

impl Framebuffer<GpuAttachmentAllocator> {
    pub fn with_device(device: Arc<wgpu::Device>, width: u32, height: u32, sample_count: u32) -> Self {
        Self::new(GpuAttachmentAllocator::new(device), width, height, sample_count)
    }

    /// Begins a render pass on the attachments, clearing color, depth and stencil
    ///
    /// The viewport covers the whole framebuffer. Returns `None` when the
    /// framebuffer has no attachments.
    pub fn bind(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        clear_color: [f32; 4],
    ) -> Option<wgpu::RenderPass<'static>> {
        let attachments = self.attachments.as_ref()?;

        let (view, resolve_target) = match &attachments.msaa_view {
            Some(msaa) => (msaa, Some(attachments.color_view.as_ref())),
            None => (attachments.color_view.as_ref(), None),
        };

        let [r, g, b, a] = clear_color;
        let mut pass = encoder
            .begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Framebuffer Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: r as f64,
                            g: g as f64,
                            b: b as f64,
                            a: a as f64,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &attachments.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(0),
                        store: wgpu::StoreOp::Store,
                    }),
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            })
            .forget_lifetime();

        pass.set_viewport(0.0, 0.0, self.width as f32, self.height as f32, 0.0, 1.0);
        Some(pass)
    }

    /// Ends the pass started by [`Framebuffer::bind`]
    pub fn unbind(&self, pass: wgpu::RenderPass<'static>) {
        drop(pass);
    }

    pub fn color_texture(&self) -> Option<Arc<wgpu::Texture>> {
        self.attachments.as_ref().map(|a| a.color.clone())
    }

    pub fn color_view(&self) -> Option<Arc<wgpu::TextureView>> {
        self.attachments.as_ref().map(|a| a.color_view.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Records every allocation and can be told to fail
    #[derive(Debug, Default)]
    struct CountingAllocator {
        allocations: Vec<(u32, u32, u32)>,
        fail_next: bool,
    }

    impl AttachmentAllocator for CountingAllocator {
        type Attachments = (u32, u32);

        fn allocate(
            &mut self,
            width: u32,
            height: u32,
            sample_count: u32,
        ) -> Result<(u32, u32), FramebufferError> {
            if std::mem::take(&mut self.fail_next) {
                return Err(FramebufferError::Allocation("out of memory".into()));
            }
            self.allocations.push((width, height, sample_count));
            Ok((width, height))
        }
    }

    fn framebuffer() -> Framebuffer<CountingAllocator> {
        Framebuffer::new(CountingAllocator::default(), 1280, 720, 4)
    }

    #[test]
    fn test_new_allocates_once() {
        let fb = framebuffer();
        assert_eq!(fb.size(), (1280, 720));
        assert_eq!(fb.generation(), 1);
        assert_eq!(fb.allocator.allocations, vec![(1280, 720, 4)]);
        assert_eq!(fb.attachments(), Some(&(1280, 720)));
    }

    #[test]
    fn test_resize_recreates_attachments() {
        let mut fb = framebuffer();
        assert!(fb.resize(800, 600));
        assert_eq!(fb.size(), (800, 600));
        assert_eq!(fb.attachments(), Some(&(800, 600)));
        assert_eq!(fb.generation(), 2);
    }

    #[test]
    fn test_resize_to_same_or_zero_is_noop() {
        let mut fb = framebuffer();
        assert!(!fb.resize(1280, 720));
        assert!(!fb.resize(0, 720));
        assert!(!fb.resize(640, 0));
        assert_eq!(fb.size(), (1280, 720));
        assert_eq!(fb.allocator.allocations.len(), 1);
        assert_eq!(fb.generation(), 1);
    }

    #[test]
    fn test_failed_allocation_leaves_no_attachments() {
        let mut fb = framebuffer();
        fb.allocator.fail_next = true;
        assert!(fb.resize(1920, 1080));
        assert!(!fb.is_complete());
        assert_eq!(fb.generation(), 1);

        // same size retries while incomplete
        assert!(fb.resize(1920, 1080));
        assert!(fb.is_complete());
        assert_eq!(fb.generation(), 2);
    }

    #[test]
    fn test_sample_count_toggle() {
        let mut fb = framebuffer();
        assert!(!fb.set_sample_count(4));
        assert!(fb.set_sample_count(1));
        assert_eq!(fb.sample_count(), 1);
        assert_eq!(fb.allocator.allocations.last(), Some(&(1280, 720, 1)));
    }
}
