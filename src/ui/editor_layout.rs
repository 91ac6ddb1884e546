//! The editor window layout
//!
//! [`EditorLayout`] draws every editor panel and owns the [`Framebuffer`] the
//! scene is rendered into. The viewport panel measures its content region each
//! frame and resizes the framebuffer when the region changes; nothing else
//! resizes it.
//!
//! Panels edit the scene, camera and renderer directly through
//! [`EditorContext`]. Requests that need engine resources (textures, model
//! files) come back as [`EditorAction`]s for the host to carry out.

use std::path::PathBuf;

use cgmath::Vector3;
use imgui::{Condition, StyleVar, TextureId, TreeNodeFlags, Ui};

use super::manager::UiManager;
use super::viewport::{TextureOrigin, ViewportState};
use crate::gfx::camera::FlyCamera;
use crate::gfx::geometry::PrimitiveKind;
use crate::gfx::rendering::framebuffer::{AttachmentAllocator, Framebuffer, GpuAttachmentAllocator};
use crate::gfx::rendering::renderer::{Lighting, Renderer};
use crate::gfx::rendering::scene_pass::FrameStats;
use crate::gfx::scene::{Behavior, ObjectId, SceneManager, SceneObject, SceneStatistics};
use crate::logging::ConsoleBuffer;

/// Requests from the UI that the host carries out after the frame
#[derive(Debug, Clone, PartialEq)]
pub enum EditorAction {
    CreatePrimitive(PrimitiveKind),
    LoadModel(PathBuf),
    ClearScene,
}

/// Everything the panels may edit during one frame
pub struct EditorContext<'a> {
    pub scene: &'a mut SceneManager,
    pub camera: &'a mut FlyCamera,
    pub renderer: &'a mut Renderer,
    pub lighting: &'a mut Lighting,
    /// Seconds spent on the previous frame
    pub frame_time: f32,
    /// Draw counts of the previous scene pass
    pub frame_stats: FrameStats,
}

/// Control Panel lines describing the scene and the last pass
pub fn scene_summary(stats: &SceneStatistics, frame_stats: &FrameStats) -> [String; 3] {
    [
        format!("Objects: {} ({} active)", stats.object_count, stats.active_count),
        format!("Triangles: {}  Vertices: {}", stats.total_triangles, stats.total_vertices),
        format!("Draw calls: {}", frame_stats.draw_calls),
    ]
}

/// Hierarchy row label
pub fn object_label(object: &SceneObject) -> String {
    format!("{} [{}]", object.name, object.id().value())
}

pub struct EditorLayout<A: AttachmentAllocator = GpuAttachmentAllocator> {
    framebuffer: Framebuffer<A>,
    viewport: ViewportState,
    texture_origin: TextureOrigin,
    texture_id: Option<TextureId>,
    registered_generation: Option<u64>,
    selected: Option<ObjectId>,
    model_path: String,
    show_console: bool,
    console: ConsoleBuffer,
    console_auto_scroll: bool,
}

impl<A: AttachmentAllocator> EditorLayout<A> {
    pub fn new(framebuffer: Framebuffer<A>, console: ConsoleBuffer) -> Self {
        let (width, height) = framebuffer.size();
        Self {
            framebuffer,
            viewport: ViewportState::new(width, height),
            texture_origin: TextureOrigin::TopLeft,
            texture_id: None,
            registered_generation: None,
            selected: None,
            model_path: String::from("assets/models/"),
            show_console: true,
            console,
            console_auto_scroll: true,
        }
    }

    pub fn framebuffer(&self) -> &Framebuffer<A> {
        &self.framebuffer
    }

    pub fn framebuffer_mut(&mut self) -> &mut Framebuffer<A> {
        &mut self.framebuffer
    }

    pub fn viewport(&self) -> &ViewportState {
        &self.viewport
    }

    pub fn selected(&self) -> Option<ObjectId> {
        self.selected
    }

    pub fn select(&mut self, id: Option<ObjectId>) {
        self.selected = id;
    }

    /// Drops the selection if its object is gone
    pub fn validate_selection(&mut self, scene: &SceneManager) {
        if self.selected.is_some_and(|id| scene.get(id).is_none()) {
            self.selected = None;
        }
    }

    /// Applies a measured viewport region to the framebuffer
    ///
    /// Returns true if the framebuffer was reallocated.
    pub fn apply_viewport_size(&mut self, available: [f32; 2]) -> bool {
        match self.viewport.measure(available) {
            Some((width, height)) => self.framebuffer.resize(width, height),
            None => false,
        }
    }

    /// True while the viewport image does not show the current color attachment
    pub fn viewport_texture_stale(&self) -> bool {
        self.framebuffer.is_complete()
            && (self.texture_id.is_none() || self.registered_generation != Some(self.framebuffer.generation()))
    }

    fn set_viewport_flags(&mut self, position: [f32; 2], hovered: bool, focused: bool) {
        self.viewport.position = position;
        self.viewport.hovered = hovered;
        self.viewport.focused = focused;
    }
}

impl EditorLayout<GpuAttachmentAllocator> {
    /// Points the viewport image at the current color attachment
    ///
    /// Call after anything that may have reallocated the framebuffer and
    /// before the UI is rendered.
    pub fn sync_viewport_texture(&mut self, ui: &mut UiManager, device: &wgpu::Device) {
        if !self.framebuffer.is_complete() {
            if let Some(id) = self.texture_id.take() {
                ui.unregister_texture(id);
            }
            self.registered_generation = None;
            return;
        }

        if !self.viewport_texture_stale() {
            return;
        }

        let generation = self.framebuffer.generation();
        let (Some(texture), Some(view)) = (self.framebuffer.color_texture(), self.framebuffer.color_view()) else {
            return;
        };
        self.texture_id = Some(ui.register_texture(device, texture, view, self.texture_id));
        self.registered_generation = Some(generation);
    }

    /// Draws every panel and returns the actions requested this frame
    pub fn draw(&mut self, ui: &Ui, ctx: EditorContext<'_>) -> Vec<EditorAction> {
        let EditorContext {
            scene,
            camera,
            renderer,
            lighting,
            frame_time,
            frame_stats,
        } = ctx;

        self.validate_selection(scene);

        let mut actions = Vec::new();
        let display = ui.io().display_size;
        if display[0] <= 0.0 || display[1] <= 0.0 {
            return actions;
        }

        self.draw_control_panel(ui, scene, frame_time, frame_stats, &mut actions);
        self.draw_hierarchy(ui, scene, display);
        self.draw_inspector(ui, scene, display);
        draw_scene_settings(ui, camera, renderer, lighting, display);
        if self.show_console {
            self.draw_console(ui, display);
        }
        self.draw_viewport(ui, display);

        actions
    }

    fn draw_control_panel(
        &mut self,
        ui: &Ui,
        scene: &SceneManager,
        frame_time: f32,
        frame_stats: FrameStats,
        actions: &mut Vec<EditorAction>,
    ) {
        ui.window("Control Panel")
            .size([300.0, 260.0], Condition::FirstUseEver)
            .position([10.0, 10.0], Condition::FirstUseEver)
            .build(|| {
                ui.text(format!("Frame time: {:.2} ms", frame_time * 1000.0));
                ui.text(format!("FPS: {:.0}", ui.io().framerate));
                for line in scene_summary(&scene.statistics(), &frame_stats) {
                    ui.text(line);
                }
                if frame_stats.skipped_draws > 0 {
                    ui.text_colored(
                        [1.0, 0.35, 0.35, 1.0],
                        format!("Skipped draws: {} (see Console)", frame_stats.skipped_draws),
                    );
                }
                ui.separator();

                if ui.button("Create Cube") {
                    actions.push(EditorAction::CreatePrimitive(PrimitiveKind::Cube));
                }
                ui.same_line();
                if ui.button("Create Sphere") {
                    actions.push(EditorAction::CreatePrimitive(PrimitiveKind::Sphere));
                }
                ui.same_line();
                if ui.button("Create Plane") {
                    actions.push(EditorAction::CreatePrimitive(PrimitiveKind::Plane));
                }

                ui.input_text("##model_path", &mut self.model_path).build();
                ui.same_line();
                if ui.button("Load Model") {
                    let path = self.model_path.trim();
                    if path.is_empty() {
                        log::warn!("No model path given");
                    } else {
                        actions.push(EditorAction::LoadModel(PathBuf::from(path)));
                    }
                }

                ui.separator();
                if ui.button("Clear Scene") {
                    actions.push(EditorAction::ClearScene);
                    self.selected = None;
                }
                ui.same_line();
                ui.checkbox("Show Console", &mut self.show_console);
            });
    }

    fn draw_hierarchy(&mut self, ui: &Ui, scene: &mut SceneManager, display: [f32; 2]) {
        ui.window("Hierarchy")
            .size([300.0, display[1] - 290.0], Condition::FirstUseEver)
            .position([10.0, 280.0], Condition::FirstUseEver)
            .build(|| {
                if scene.is_empty() {
                    ui.text_disabled("Scene is empty");
                    return;
                }

                for object in scene.iter() {
                    let id = object.id();
                    let label = format!("{}##{}", object_label(object), id.value());
                    if ui
                        .selectable_config(&label)
                        .selected(self.selected == Some(id))
                        .build()
                    {
                        self.select(Some(id));
                    }
                }

                ui.separator();
                let Some(id) = self.selected else {
                    return;
                };
                if ui.button("Delete") {
                    if let Some(object) = scene.remove_object(id) {
                        log::info!("Removed '{}' {}", object.name, id);
                    }
                    self.selected = None;
                }
            });
    }

    fn draw_inspector(&mut self, ui: &Ui, scene: &mut SceneManager, display: [f32; 2]) {
        ui.window("Inspector")
            .size([340.0, display[1] * 0.55], Condition::FirstUseEver)
            .position([display[0] - 350.0, 10.0], Condition::FirstUseEver)
            .build(|| {
                let Some(object) = self.selected.and_then(|id| scene.get_mut(id)) else {
                    ui.text_disabled("No object selected");
                    return;
                };
                inspect_object(ui, object);
            });
    }

    fn draw_console(&mut self, ui: &Ui, display: [f32; 2]) {
        let console = &self.console;
        let auto_scroll = &mut self.console_auto_scroll;
        ui.window("Console")
            .size([display[0] - 680.0, 200.0], Condition::FirstUseEver)
            .position([320.0, display[1] - 210.0], Condition::FirstUseEver)
            .opened(&mut self.show_console)
            .build(|| {
                if ui.button("Clear") {
                    console.clear();
                }
                ui.same_line();
                ui.checkbox("Auto-scroll", auto_scroll);
                ui.separator();

                ui.child_window("console_lines").build(|| {
                    for line in console.snapshot() {
                        ui.text_colored(level_color(line.level), format!("[{}] {}", line.level, line.message));
                    }
                    if *auto_scroll && ui.scroll_y() >= ui.scroll_max_y() {
                        ui.set_scroll_here_y_with_ratio(1.0);
                    }
                });
            });
    }

    fn draw_viewport(&mut self, ui: &Ui, display: [f32; 2]) {
        let padding = ui.push_style_var(StyleVar::WindowPadding([0.0, 0.0]));
        let window = ui
            .window("Viewport")
            .size([display[0] - 680.0, display[1] - 230.0], Condition::FirstUseEver)
            .position([320.0, 10.0], Condition::FirstUseEver)
            .begin();
        padding.pop();

        let Some(_window) = window else {
            self.set_viewport_flags([0.0, 0.0], false, false);
            return;
        };

        let available = ui.content_region_avail();
        let position = ui.cursor_screen_pos();
        self.apply_viewport_size(available);
        self.set_viewport_flags(position, ui.is_window_hovered(), ui.is_window_focused());

        match self.texture_id.filter(|_| self.framebuffer.is_complete()) {
            Some(texture_id) => {
                let (uv0, uv1) = self.texture_origin.uv_bounds();
                imgui::Image::new(texture_id, available)
                    .uv0(uv0)
                    .uv1(uv1)
                    .build(ui);
            }
            None => ui.text_colored([1.0, 0.3, 0.3, 1.0], "Framebuffer Error!"),
        }
    }
}

fn inspect_object(ui: &Ui, object: &mut SceneObject) {
    ui.input_text("Name", &mut object.name).build();
    ui.checkbox("Active", &mut object.active);
    ui.text(format!("ID: {}", object.id().value()));

    if ui.collapsing_header("Transform", TreeNodeFlags::DEFAULT_OPEN) {
        let transform = &mut object.transform;

        let mut position: [f32; 3] = transform.position.into();
        if imgui::Drag::new("Position")
            .speed(0.05)
            .build_array(ui, &mut position)
        {
            transform.position = Vector3::from(position);
        }

        let mut rotation: [f32; 3] = transform.rotation.into();
        if imgui::Drag::new("Rotation")
            .speed(0.5)
            .build_array(ui, &mut rotation)
        {
            transform.rotation = Vector3::from(rotation);
        }

        let mut scale = transform.uniform_scale();
        if ui.slider("Scale", 0.01, 10.0, &mut scale) {
            transform.set_uniform_scale(scale);
        }
    }

    if ui.collapsing_header("Behaviors", TreeNodeFlags::DEFAULT_OPEN) {
        for (index, behavior) in object.behaviors.iter_mut().enumerate() {
            let _id = ui.push_id_usize(index);
            inspect_behavior(ui, behavior);
        }
    }

    if ui.collapsing_header("Mesh", TreeNodeFlags::empty()) {
        let model = &object.model;
        ui.text(format!("Meshes: {}", model.mesh_count()));
        ui.text(format!("Vertices: {}", model.vertex_count()));
        ui.text(format!("Indices: {}", model.index_count()));
        if let Some(dir) = model.directory() {
            ui.text(format!("Source: {}", dir.display()));
        }
    }

    if ui.collapsing_header("Material", TreeNodeFlags::empty()) {
        inspect_material(ui, object);
    }
}

fn inspect_behavior(ui: &Ui, behavior: &mut Behavior) {
    match behavior {
        Behavior::AutoRotate(auto_rotate) => {
            ui.checkbox("Auto Rotate", &mut auto_rotate.enabled);
            if auto_rotate.enabled {
                ui.slider("Speed (deg/s)", -360.0, 360.0, &mut auto_rotate.speed);
            }
        }
    }
}

fn inspect_material(ui: &Ui, object: &mut SceneObject) {
    let Some(material) = object.model.meshes().first().map(|mesh| &mesh.material) else {
        ui.text_disabled("No meshes");
        return;
    };

    if let Some(color) = material.color() {
        let mut color = color;
        if ui.color_edit3("Color", &mut color) {
            object.model.set_color(color);
        }
        return;
    }

    if material.textures().is_empty() {
        ui.text_disabled("No textures");
    }
    for texture in material.textures() {
        ui.text(format!("{}: {}", texture.kind.type_name(), texture.path.display()));
    }
    if ui.button("Use Solid Color") {
        object.model.set_color([1.0, 1.0, 1.0]);
    }
}

fn draw_scene_settings(
    ui: &Ui,
    camera: &mut FlyCamera,
    renderer: &mut Renderer,
    lighting: &mut Lighting,
    display: [f32; 2],
) {
    ui.window("Scene Settings")
        .size([340.0, display[1] * 0.45 - 30.0], Condition::FirstUseEver)
        .position([display[0] - 350.0, display[1] * 0.55 + 20.0], Condition::FirstUseEver)
        .build(|| {
            if ui.collapsing_header("Camera", TreeNodeFlags::DEFAULT_OPEN) {
                ui.slider("Speed", 1.0, 20.0, &mut camera.movement_speed);
                ui.slider("Sensitivity", 0.01, 1.0, &mut camera.mouse_sensitivity);
                ui.slider("Zoom", 1.0, 45.0, &mut camera.zoom);
                let p = camera.position;
                ui.text(format!("Position: ({:.2}, {:.2}, {:.2})", p.x, p.y, p.z));
                if ui.button("Reset Camera") {
                    camera.reset();
                }
            }

            if ui.collapsing_header("Renderer", TreeNodeFlags::DEFAULT_OPEN) {
                let mut settings = renderer.settings().clone();
                if ui.checkbox("Wireframe", &mut settings.wireframe) {
                    renderer.enable_wireframe(settings.wireframe);
                }
                if !renderer.supports_wireframe() {
                    ui.same_line();
                    ui.text_disabled("(unsupported)");
                }
                if ui.checkbox("Depth Test", &mut settings.depth_test) {
                    renderer.enable_depth_test(settings.depth_test);
                }
                if ui.checkbox("Face Culling", &mut settings.cull_face) {
                    renderer.enable_cull_face(settings.cull_face);
                }
                if ui.checkbox("Multisampling", &mut settings.multisampling) {
                    renderer.enable_multisampling(settings.multisampling);
                }
                if ui.color_edit4("Clear Color", &mut settings.clear_color) {
                    renderer.set_clear_color(settings.clear_color);
                }
            }

            if ui.collapsing_header("Lighting", TreeNodeFlags::DEFAULT_OPEN) {
                let mut light: [f32; 3] = lighting.light_position.into();
                if imgui::Drag::new("Light Position")
                    .speed(0.05)
                    .build_array(ui, &mut light)
                {
                    lighting.light_position = Vector3::from(light);
                }
                ui.slider("Height Scale", 0.0, 1.0, &mut lighting.height_scale);
                ui.text_disabled("Q / E adjust the height scale");
            }
        });
}

fn level_color(level: log::Level) -> [f32; 4] {
    match level {
        log::Level::Error => [1.0, 0.35, 0.35, 1.0],
        log::Level::Warn => [1.0, 0.8, 0.3, 1.0],
        log::Level::Info => [0.85, 0.85, 0.85, 1.0],
        log::Level::Debug | log::Level::Trace => [0.55, 0.55, 0.55, 1.0],
    }
}
