// src/config.rs
//! Engine configuration
//!
//! Settings are read from an optional TOML file. Every field has a default, so a
//! partial file only overrides what it names and a missing file is not an error.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::gfx::rendering::renderer::RenderSettings;

/// Default file looked up next to the working directory
pub const DEFAULT_CONFIG_FILE: &str = "kiln.toml";

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub vsync: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Kiln Sandbox".to_string(),
            width: 1600,
            height: 900,
            vsync: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    /// Size of the off-screen framebuffer before the editor panel reports its own
    pub width: u32,
    pub height: u32,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub position: [f32; 3],
    pub speed: f32,
    pub sensitivity: f32,
    pub zoom: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: [0.0, 0.0, 3.0],
            speed: 3.5,
            sensitivity: 0.1,
            zoom: 45.0,
        }
    }
}

/// Top-level engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub window: WindowConfig,
    pub viewport: ViewportConfig,
    pub camera: CameraConfig,
    pub render: RenderSettings,
    pub assets_dir: PathBuf,
    pub font_size: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            viewport: ViewportConfig::default(),
            camera: CameraConfig::default(),
            render: RenderSettings::default(),
            assets_dir: PathBuf::from("assets"),
            font_size: 18.0,
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Loads `path` if it exists, otherwise returns defaults
    ///
    /// A file that exists but fails to parse is logged and ignored.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            log::info!("No config at {}, using defaults", path.display());
            return Self::default();
        }

        match Self::load_from_file(path) {
            Ok(config) => {
                log::info!("Loaded config from {}", path.display());
                config
            }
            Err(e) => {
                log::error!("Ignoring config {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn shader_dir(&self) -> PathBuf {
        self.assets_dir.join("shaders")
    }

    pub fn texture_dir(&self) -> PathBuf {
        self.assets_dir.join("textures")
    }

    pub fn skybox_dir(&self) -> PathBuf {
        self.assets_dir.join("skybox")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.viewport.width, 1280);
        assert_eq!(config.viewport.height, 720);
        assert_eq!(config.camera.position, [0.0, 0.0, 3.0]);
        assert!(config.render.depth_test);
        assert!(config.render.cull_face);
        assert!(!config.render.wireframe);
        assert!(config.render.multisampling);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = EngineConfig::from_toml_str(
            r#"
            assets_dir = "data"

            [window]
            title = "Test"

            [render]
            wireframe = true
            "#,
        )
        .unwrap();

        assert_eq!(config.window.title, "Test");
        assert_eq!(config.window.width, WindowConfig::default().width);
        assert!(config.render.wireframe);
        assert!(config.render.depth_test);
        assert_eq!(config.shader_dir(), PathBuf::from("data").join("shaders"));
    }

    #[test]
    fn test_invalid_toml_is_error() {
        assert!(matches!(
            EngineConfig::from_toml_str("window = 3"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let path = std::env::temp_dir().join("kiln-config-does-not-exist.toml");
        assert_eq!(EngineConfig::load_or_default(&path), EngineConfig::default());
    }

    #[test]
    fn test_written_config_reloads() {
        let path = std::env::temp_dir().join(format!("kiln-config-{}.toml", std::process::id()));
        let mut config = EngineConfig::default();
        config.font_size = 21.0;
        config.render.clear_color = [0.2, 0.3, 0.4, 1.0];
        std::fs::write(&path, toml::to_string_pretty(&config).unwrap()).unwrap();

        let loaded = EngineConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded, config);
        let _ = std::fs::remove_file(&path);
    }
}
