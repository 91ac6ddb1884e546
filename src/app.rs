//! The windowed host
//!
//! [`App`] runs the winit event loop and owns the engine. User code plugs in
//! through [`AppCallbacks`], a set of closures over a user state `S`:
//!
//! - `init` runs once the window and GPU exist and builds `S`
//! - `update` runs every frame after camera and scene updates
//! - `render` may issue extra draws into the scene pass
//! - `ui` may add panels after the editor has drawn
//! - `shutdown` runs when the event loop exits
//!
//! Frame order: surface acquire, update, UI build, editor actions, scene pass
//! into the viewport framebuffer, UI pass onto the surface, present.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use winit::{
    application::ApplicationHandler,
    dpi::LogicalSize,
    event::{DeviceEvent, DeviceId, ElementState, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use crate::config::EngineConfig;
use crate::error::{AssetError, EngineError};
use crate::gfx::camera::{CameraController, FlyCamera};
use crate::gfx::geometry::PrimitiveKind;
use crate::gfx::rendering::{
    scene_uniforms, FrameStats, Framebuffer, GpuContext, Lighting, Renderer, ShaderLibrary, ShaderProgram, Skybox,
};
use crate::gfx::resources::{Material, TextureHandle, TextureManager, TextureRef};
use crate::gfx::scene::{Model, ObjectId, SceneManager, Transform};
use crate::input::ViewportFocus;
use crate::logging::ConsoleBuffer;
use crate::ui::{EditorAction, EditorContext, EditorLayout, UiManager};

pub type InitCallback<S> = Box<dyn FnOnce(&mut EngineContext) -> Result<S, EngineError>>;
pub type UpdateCallback<S> = Box<dyn FnMut(&mut S, &mut EngineContext, f32)>;
pub type RenderCallback<S> = Box<dyn FnMut(&mut S, &mut dyn ShaderProgram)>;
pub type UiCallback<S> = Box<dyn FnMut(&mut S, &imgui::Ui, &mut EngineContext)>;
pub type ShutdownCallback<S> = Box<dyn FnOnce(&mut S, &mut EngineContext)>;

/// Hooks the host calls around user state `S`
pub struct AppCallbacks<S> {
    init: Option<InitCallback<S>>,
    update: Option<UpdateCallback<S>>,
    render: Option<RenderCallback<S>>,
    ui: Option<UiCallback<S>>,
    shutdown: Option<ShutdownCallback<S>>,
}

impl<S> AppCallbacks<S> {
    pub fn new(init: impl FnOnce(&mut EngineContext) -> Result<S, EngineError> + 'static) -> Self {
        Self {
            init: Some(Box::new(init)),
            update: None,
            render: None,
            ui: None,
            shutdown: None,
        }
    }

    pub fn on_update(mut self, update: impl FnMut(&mut S, &mut EngineContext, f32) + 'static) -> Self {
        self.update = Some(Box::new(update));
        self
    }

    pub fn on_render(mut self, render: impl FnMut(&mut S, &mut dyn ShaderProgram) + 'static) -> Self {
        self.render = Some(Box::new(render));
        self
    }

    pub fn on_ui(mut self, ui: impl FnMut(&mut S, &imgui::Ui, &mut EngineContext) + 'static) -> Self {
        self.ui = Some(Box::new(ui));
        self
    }

    pub fn on_shutdown(mut self, shutdown: impl FnOnce(&mut S, &mut EngineContext) + 'static) -> Self {
        self.shutdown = Some(Box::new(shutdown));
        self
    }
}

/// Engine state handed to the callbacks
pub struct EngineContext {
    pub window: Arc<Window>,
    pub gpu: GpuContext,
    pub renderer: Renderer,
    pub textures: TextureManager,
    pub scene: SceneManager,
    pub camera: FlyCamera,
    pub controller: CameraController,
    pub lighting: Lighting,
    pub skybox: Option<Skybox>,
    pub editor: EditorLayout,
    pub focus: ViewportFocus,
    pub config: EngineConfig,
    /// Counts from the last scene pass
    pub frame_stats: FrameStats,
    /// Textures given to primitives created from the editor
    pub primitive_textures: Vec<TextureRef>,
    pressed_keys: HashSet<KeyCode>,
}

impl EngineContext {
    /// True while `key` is held and the viewport accepts keyboard input
    pub fn is_key_down(&self, key: KeyCode) -> bool {
        self.pressed_keys.contains(&key)
    }

    /// Loads a texture, logging failures
    pub fn load_texture(&mut self, path: impl AsRef<Path>) -> Option<TextureHandle> {
        let path = path.as_ref();
        match self.textures.load(path) {
            Ok(handle) => Some(handle),
            Err(e) => {
                log::error!("{}", e);
                None
            }
        }
    }

    /// Replaces the skybox with the faces in `dir`; on failure there is no skybox
    pub fn load_skybox(&mut self, dir: impl AsRef<Path>) -> bool {
        let dir = dir.as_ref();
        match Skybox::load(self.gpu.device(), self.renderer.skybox_layout(), &self.textures, dir) {
            Ok(skybox) => {
                self.skybox = Some(skybox);
                true
            }
            Err(e) => {
                log::error!("Skybox disabled: {}", e);
                self.skybox = None;
                false
            }
        }
    }

    pub fn spawn_primitive(&mut self, kind: PrimitiveKind, transform: Option<Transform>) -> Option<ObjectId> {
        let material = if self.primitive_textures.is_empty() {
            Material::solid_color([0.8, 0.8, 0.8])
        } else {
            Material::textured(self.primitive_textures.clone())
        };

        match self
            .renderer
            .primitives()
            .spawn(kind, material, &mut self.scene, transform)
        {
            Ok(id) => {
                log::info!("Created {} {}", kind.name(), id);
                Some(id)
            }
            Err(e) => {
                log::error!("Failed to create {}: {}", kind.name(), e);
                None
            }
        }
    }

    /// Loads an OBJ file as a new object named after the file
    pub fn load_model(&mut self, path: impl AsRef<Path>) -> Result<ObjectId, AssetError> {
        let path = path.as_ref();
        let model = Model::load_obj(path, &mut self.textures)?;
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("Model");
        let name = self.scene.unique_name(stem);
        log::info!(
            "Loaded '{}' ({} meshes, {} vertices)",
            path.display(),
            model.mesh_count(),
            model.vertex_count()
        );
        Ok(self.scene.add_object(name, model, None))
    }

    pub fn apply_action(&mut self, action: EditorAction) {
        match action {
            EditorAction::CreatePrimitive(kind) => {
                self.spawn_primitive(kind, None);
            }
            EditorAction::LoadModel(path) => {
                if let Err(e) = self.load_model(&path) {
                    log::error!("{}", e);
                }
            }
            EditorAction::ClearScene => {
                log::info!("Cleared {} objects", self.scene.object_count());
                self.scene.clear();
            }
        }
    }

    /// Draws the scene into the viewport framebuffer
    fn render_scene(
        &mut self,
        encoder: &mut wgpu::CommandEncoder,
        extra: impl FnOnce(&mut dyn ShaderProgram),
    ) -> Option<FrameStats> {
        self.renderer.prepare_frame(&mut self.scene, &self.textures);

        let framebuffer = self.editor.framebuffer();
        let (width, height) = framebuffer.size();
        let uniforms = scene_uniforms(&self.camera, &self.lighting, width, height);

        let mut pass = self
            .renderer
            .begin_frame(encoder, framebuffer, self.skybox.as_ref())?;
        Renderer::render_scene(&mut pass, &self.scene, &uniforms);
        extra(&mut pass);
        Some(Renderer::end_frame(framebuffer, pass))
    }

    fn handle_key(&mut self, event: &KeyEvent) {
        let PhysicalKey::Code(code) = event.physical_key else {
            return;
        };

        if event.state == ElementState::Released {
            self.pressed_keys.remove(&code);
            self.controller.process_keyboard(event);
            return;
        }
        if self.focus.accepts_keyboard() {
            self.pressed_keys.insert(code);
            self.controller.process_keyboard(event);
        }
    }
}

/// Application entry point
pub struct App<S> {
    config: EngineConfig,
    console: ConsoleBuffer,
    callbacks: AppCallbacks<S>,
}

impl<S: 'static> App<S> {
    pub fn new(config: EngineConfig, console: ConsoleBuffer, callbacks: AppCallbacks<S>) -> Self {
        Self {
            config,
            console,
            callbacks,
        }
    }

    /// Runs until the window closes
    ///
    /// Initialization failures stop the loop and are returned here.
    pub fn run(self) -> Result<(), EngineError> {
        let event_loop = EventLoop::new()?;
        event_loop.set_control_flow(ControlFlow::Poll);

        let mut host = Host {
            config: self.config,
            console: self.console,
            callbacks: self.callbacks,
            running: None,
            error: None,
            last_frame: Instant::now(),
        };
        event_loop.run_app(&mut host)?;

        match host.error.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

struct Running<S> {
    ctx: EngineContext,
    ui: UiManager,
    state: S,
}

struct Host<S> {
    config: EngineConfig,
    console: ConsoleBuffer,
    callbacks: AppCallbacks<S>,
    running: Option<Running<S>>,
    error: Option<EngineError>,
    last_frame: Instant,
}

impl<S> Host<S> {
    fn start(&mut self, event_loop: &ActiveEventLoop) -> Result<Running<S>, EngineError> {
        let config = self.config.clone();
        let window = Arc::new(
            event_loop.create_window(
                Window::default_attributes()
                    .with_title(config.window.title.as_str())
                    .with_inner_size(LogicalSize::new(config.window.width, config.window.height)),
            )?,
        );

        let gpu = GpuContext::new(window.clone(), config.window.vsync)?;
        let device = gpu.device().clone();
        let queue = gpu.queue().clone();

        let textures = TextureManager::new(device.clone(), queue.clone());
        let renderer = Renderer::new(
            device.clone(),
            queue.clone(),
            config.render.clone(),
            ShaderLibrary::new(config.shader_dir()),
            &textures,
        );

        let framebuffer = Framebuffer::with_device(
            device.clone(),
            config.viewport.width,
            config.viewport.height,
            renderer.sample_count(),
        );
        let mut editor = EditorLayout::new(framebuffer, self.console.clone());
        let mut ui = UiManager::new(&device, &queue, gpu.surface_format(), &window, config.font_size);
        editor.sync_viewport_texture(&mut ui, &device);

        let mut ctx = EngineContext {
            window,
            gpu,
            renderer,
            textures,
            scene: SceneManager::new(),
            camera: FlyCamera::from_config(&config.camera),
            controller: CameraController::new(),
            lighting: Lighting::default(),
            skybox: None,
            editor,
            focus: ViewportFocus::default(),
            config,
            frame_stats: FrameStats::default(),
            primitive_textures: Vec::new(),
            pressed_keys: HashSet::new(),
        };

        let init = self
            .callbacks
            .init
            .take()
            .ok_or_else(|| EngineError::Init("application already started".to_string()))?;
        let state = init(&mut ctx)?;

        log::info!("Engine started");
        Ok(Running { ctx, ui, state })
    }

    fn frame(&mut self, event_loop: &ActiveEventLoop) {
        let Some(Running { ctx, ui, state }) = self.running.as_mut() else {
            return;
        };

        let surface_texture = match ctx.gpu.current_texture() {
            Ok(texture) => texture,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                ctx.gpu.reconfigure();
                return;
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::warn!("Surface timeout, skipping frame");
                return;
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("Surface out of memory, exiting");
                event_loop.exit();
                return;
            }
            Err(e) => {
                log::warn!("Skipping frame: {}", e);
                return;
            }
        };

        let now = Instant::now();
        let delta_time = (now - self.last_frame).as_secs_f32();
        self.last_frame = now;

        ctx.controller.update_camera(&mut ctx.camera, delta_time);
        ctx.scene.update(delta_time);
        if let Some(update) = self.callbacks.update.as_mut() {
            update(state, ctx, delta_time);
        }

        let window = ctx.window.clone();
        let ui_hook = &mut self.callbacks.ui;
        let mut actions = Vec::new();
        ui.update_logic(&window, |frame_ui| {
            actions = ctx.editor.draw(
                frame_ui,
                EditorContext {
                    scene: &mut ctx.scene,
                    camera: &mut ctx.camera,
                    renderer: &mut ctx.renderer,
                    lighting: &mut ctx.lighting,
                    frame_time: delta_time,
                    frame_stats: ctx.frame_stats,
                },
            );
            if let Some(hook) = ui_hook.as_mut() {
                hook(&mut *state, frame_ui, &mut *ctx);
            }
        });

        let viewport = *ctx.editor.viewport();
        if ctx
            .focus
            .update(viewport.hovered, viewport.focused, ui.wants_text_input())
        {
            ctx.controller.release_all();
            ctx.pressed_keys.clear();
        }

        for action in actions {
            ctx.apply_action(action);
        }

        let sample_count = ctx.renderer.sample_count();
        ctx.editor.framebuffer_mut().set_sample_count(sample_count);
        let device = ctx.gpu.device().clone();
        let queue = ctx.gpu.queue().clone();
        ctx.editor.sync_viewport_texture(ui, &device);

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Frame Encoder"),
        });

        let render_hook = &mut self.callbacks.render;
        let stats = ctx.render_scene(&mut encoder, |shader| {
            if let Some(hook) = render_hook.as_mut() {
                hook(&mut *state, shader);
            }
        });
        let stats = stats.unwrap_or_default();
        if stats.started_skipping(&ctx.frame_stats) {
            log::warn!(
                "Skipping {} draw(s) per frame; check the shader and pipeline errors above",
                stats.skipped_draws
            );
        }
        ctx.frame_stats = stats;

        let view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        ui.render(&device, &queue, &mut encoder, &view);

        queue.submit(std::iter::once(encoder.finish()));
        window.pre_present_notify();
        surface_texture.present();
    }
}

impl<S> ApplicationHandler for Host<S> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.running.is_some() {
            return;
        }

        match self.start(event_loop) {
            Ok(running) => {
                self.running = Some(running);
                self.last_frame = Instant::now();
            }
            Err(e) => {
                log::error!("Initialization failed: {}", e);
                self.error = Some(e);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        let Some(running) = self.running.as_mut() else {
            return;
        };
        let ctx = &mut running.ctx;
        running.ui.handle_event(&ctx.window, window_id, &event);

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => ctx.gpu.resize(size.width, size.height),
            WindowEvent::KeyboardInput { event: key, .. } => {
                if key.physical_key == PhysicalKey::Code(KeyCode::Escape) && key.state == ElementState::Pressed {
                    event_loop.exit();
                    return;
                }
                ctx.handle_key(&key);
            }
            WindowEvent::MouseInput { state, button, .. } => {
                if ctx.focus.accepts_mouse_button(button, state) {
                    ctx.controller.process_mouse_button(button, state);
                }
            }
            WindowEvent::MouseWheel { delta, .. } => {
                if ctx.focus.accepts_scroll() {
                    ctx.controller.process_scroll(&delta, &mut ctx.camera);
                }
            }
            WindowEvent::RedrawRequested => self.frame(event_loop),
            _ => {}
        }
    }

    fn device_event(&mut self, _event_loop: &ActiveEventLoop, _device_id: DeviceId, event: DeviceEvent) {
        let Some(running) = self.running.as_mut() else {
            return;
        };
        if let DeviceEvent::MouseMotion { delta } = event {
            let ctx = &mut running.ctx;
            ctx.controller.process_mouse_motion(delta, &mut ctx.camera);
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(running) = self.running.as_ref() {
            running.ctx.window.request_redraw();
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        let Some(mut running) = self.running.take() else {
            return;
        };
        if let Some(shutdown) = self.callbacks.shutdown.take() {
            shutdown(&mut running.state, &mut running.ctx);
        }
        log::info!("Engine stopped");
    }
}
