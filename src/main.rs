//! Sandbox: a textured cube under a skybox, editable from the editor panels

use std::path::PathBuf;

use cgmath::Vector3;
use winit::keyboard::KeyCode;

use kiln::app::{App, AppCallbacks, EngineContext};
use kiln::config::{EngineConfig, DEFAULT_CONFIG_FILE};
use kiln::error::EngineError;
use kiln::gfx::geometry::PrimitiveKind;
use kiln::gfx::resources::{TextureKind, TextureRef};
use kiln::gfx::scene::Transform;

/// Height scale change per second while Q or E is held
const HEIGHT_SCALE_RATE: f32 = 0.5;

struct Sandbox;

impl Sandbox {
    fn init(ctx: &mut EngineContext) -> Result<Self, EngineError> {
        let texture_dir = ctx.config.texture_dir();
        let bricks = [
            ("bricks2.jpg", TextureKind::Diffuse),
            ("bricks2_normal.jpg", TextureKind::Normal),
            ("bricks2_disp.jpg", TextureKind::Height),
        ];

        let textures: Vec<TextureRef> = bricks
            .iter()
            .filter_map(|(file, kind)| {
                let path: PathBuf = texture_dir.join(file);
                let handle = ctx.load_texture(&path)?;
                Some(TextureRef {
                    handle,
                    kind: *kind,
                    path,
                })
            })
            .collect();
        ctx.primitive_textures = textures;

        let skybox_dir = ctx.config.skybox_dir();
        ctx.load_skybox(skybox_dir);

        ctx.spawn_primitive(PrimitiveKind::Cube, None);
        ctx.spawn_primitive(
            PrimitiveKind::Plane,
            Some(Transform::new(
                Vector3::new(0.0, -1.5, 0.0),
                Vector3::new(0.0, 0.0, 0.0),
                Vector3::new(5.0, 1.0, 5.0),
            )),
        );

        Ok(Sandbox)
    }

    fn update(&mut self, ctx: &mut EngineContext, delta_time: f32) {
        if ctx.is_key_down(KeyCode::KeyQ) {
            ctx.lighting.adjust_height_scale(-HEIGHT_SCALE_RATE * delta_time);
        }
        if ctx.is_key_down(KeyCode::KeyE) {
            ctx.lighting.adjust_height_scale(HEIGHT_SCALE_RATE * delta_time);
        }
    }
}

fn main() -> anyhow::Result<()> {
    let console = kiln::logging::init();
    let config = EngineConfig::load_or_default(DEFAULT_CONFIG_FILE);

    let callbacks = AppCallbacks::new(Sandbox::init)
        .on_update(Sandbox::update)
        .on_shutdown(|_, ctx| {
            log::info!("Shutting down with {} objects", ctx.scene.object_count());
        });

    App::new(config, console, callbacks).run()?;
    Ok(())
}
