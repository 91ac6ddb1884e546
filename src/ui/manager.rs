//! ImGui UI manager
//!
//! Handles ImGui integration with wgpu and winit: frame timing, input
//! forwarding, rendering the UI onto the window surface and registering GPU
//! textures (the viewport framebuffer) so panels can show them as images.

use std::sync::Arc;
use std::time::Instant;

use imgui::{Context, FontConfig, FontSource, MouseCursor, TextureId};
use imgui_wgpu::{Renderer, RendererConfig, Texture};
use imgui_winit_support::{HiDpiMode, WinitPlatform};
use wgpu::{CommandEncoder, Device, Queue, TextureFormat, TextureView};
use winit::{
    event::{Event, WindowEvent},
    window::{Window, WindowId},
};

/// Background behind the editor panels
const UI_CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.2,
    g: 0.2,
    b: 0.2,
    a: 1.0,
};

/// ImGui UI manager
///
/// Owns the ImGui context, platform integration and renderer. Uses locked DPI
/// mode so the UI is laid out in physical pixels.
pub struct UiManager {
    pub context: Context,
    platform: WinitPlatform,
    renderer: Renderer,
    last_frame: Instant,
    last_cursor: Option<MouseCursor>,
}

impl UiManager {
    pub fn new(
        device: &Device,
        queue: &Queue,
        output_color_format: TextureFormat,
        window: &Window,
        font_size: f32,
    ) -> Self {
        let mut context = Context::create();
        context.set_ini_filename(None);

        let mut platform = WinitPlatform::new(&mut context);
        platform.attach_window(context.io_mut(), window, HiDpiMode::Locked(1.0));

        context.fonts().add_font(&[FontSource::DefaultFontData {
            config: Some(FontConfig {
                oversample_h: 1,
                pixel_snap_h: true,
                size_pixels: font_size,
                ..Default::default()
            }),
        }]);

        let renderer_config = RendererConfig {
            texture_format: output_color_format,
            ..Default::default()
        };
        let renderer = Renderer::new(&mut context, device, queue, renderer_config);

        Self {
            context,
            platform,
            renderer,
            last_frame: Instant::now(),
            last_cursor: None,
        }
    }

    /// Forwards a window event to ImGui
    ///
    /// Every event goes through so ImGui's view of buttons and keys never gets
    /// out of sync; whether the camera also sees it is decided separately.
    pub fn handle_event(&mut self, window: &Window, window_id: WindowId, event: &WindowEvent) {
        let event: Event<()> = Event::WindowEvent {
            window_id,
            event: event.clone(),
        };
        self.platform
            .handle_event(self.context.io_mut(), window, &event);
    }

    /// True while a text field has keyboard focus
    pub fn wants_text_input(&self) -> bool {
        self.context.io().want_text_input
    }

    /// Starts an ImGui frame and builds the UI with `run_ui`
    pub fn update_logic<F>(&mut self, window: &Window, run_ui: F)
    where
        F: FnOnce(&imgui::Ui),
    {
        let now = Instant::now();
        self.context
            .io_mut()
            .update_delta_time(now - self.last_frame);
        self.last_frame = now;

        if let Err(e) = self.platform.prepare_frame(self.context.io_mut(), window) {
            log::warn!("Failed to prepare UI frame: {}", e);
        }

        let ui = self.context.frame();
        run_ui(ui);

        if self.last_cursor != ui.mouse_cursor() {
            self.last_cursor = ui.mouse_cursor();
            self.platform.prepare_render(ui, window);
        }
    }

    /// Renders the UI built in the last [`UiManager::update_logic`] call
    ///
    /// The target is cleared first; the scene is only visible through the
    /// viewport image.
    pub fn render(
        &mut self,
        device: &Device,
        queue: &Queue,
        encoder: &mut CommandEncoder,
        color_attachment: &TextureView,
    ) {
        let draw_data = self.context.render();

        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("imgui_render_pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: color_attachment,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(UI_CLEAR_COLOR),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        if draw_data.display_size[0] <= 0.0 || draw_data.display_size[1] <= 0.0 {
            return;
        }

        if let Err(e) = self
            .renderer
            .render(draw_data, queue, device, &mut render_pass)
        {
            log::error!("Failed to render UI: {}", e);
        }
    }

    /// Makes `texture` drawable with `ui.image`, replacing `existing` if given
    pub fn register_texture(
        &mut self,
        device: &Device,
        texture: Arc<wgpu::Texture>,
        view: Arc<TextureView>,
        existing: Option<TextureId>,
    ) -> TextureId {
        let size = texture.size();
        let ui_texture = Texture::from_raw_parts(device, &self.renderer, texture, view, None, None, size);

        match existing {
            Some(id) if self.renderer.textures.get(id).is_some() => {
                self.renderer.textures.replace(id, ui_texture);
                id
            }
            _ => self.renderer.textures.insert(ui_texture),
        }
    }

    pub fn unregister_texture(&mut self, id: TextureId) {
        self.renderer.textures.remove(id);
    }
}
