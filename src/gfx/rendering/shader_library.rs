//! WGSL sources by name
//!
//! Built-in shaders are compiled into the binary. A file `<name>.wgsl` in the
//! override directory replaces the built-in source of the same name.

use std::borrow::Cow;
use std::path::{Path, PathBuf};

pub const SCENE_SHADER: &str = "scene";
pub const SKYBOX_SHADER: &str = "skybox";

const BUILTIN_SHADERS: &[(&str, &str)] = &[
    (SCENE_SHADER, include_str!("shaders/scene.wgsl")),
    (SKYBOX_SHADER, include_str!("shaders/skybox.wgsl")),
];

#[derive(Debug, Clone, Default)]
pub struct ShaderLibrary {
    override_dir: Option<PathBuf>,
}

impl ShaderLibrary {
    pub fn new(override_dir: impl Into<PathBuf>) -> Self {
        Self {
            override_dir: Some(override_dir.into()),
        }
    }

    pub fn builtin(name: &str) -> Option<&'static str> {
        BUILTIN_SHADERS
            .iter()
            .find(|(builtin, _)| *builtin == name)
            .map(|(_, source)| *source)
    }

    pub fn names() -> impl Iterator<Item = &'static str> {
        BUILTIN_SHADERS.iter().map(|(name, _)| *name)
    }

    /// Source for `name`, preferring an override file
    ///
    /// An override that exists but cannot be read is logged and skipped.
    pub fn source(&self, name: &str) -> Option<Cow<'static, str>> {
        if let Some(path) = self.override_path(name) {
            if path.is_file() {
                match std::fs::read_to_string(&path) {
                    Ok(source) => {
                        log::info!("Using shader override {}", path.display());
                        return Some(Cow::Owned(source));
                    }
                    Err(e) => log::warn!("Cannot read shader {}: {}", path.display(), e),
                }
            }
        }

        Self::builtin(name).map(Cow::Borrowed)
    }

    fn override_path(&self, name: &str) -> Option<PathBuf> {
        self.override_dir
            .as_deref()
            .map(|dir: &Path| dir.join(format!("{}.wgsl", name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_sources_have_entry_points() {
        let scene = ShaderLibrary::builtin(SCENE_SHADER).unwrap();
        assert!(scene.contains("fn vs_main"));
        assert!(scene.contains("fn vs_raw"));
        assert!(scene.contains("fn fs_main"));

        let skybox = ShaderLibrary::builtin(SKYBOX_SHADER).unwrap();
        assert!(skybox.contains("fn vs_sky"));
        assert!(skybox.contains("fn fs_sky"));
    }

    fn parse_and_validate(name: &str) -> naga::Module {
        let source = ShaderLibrary::builtin(name).unwrap();
        let module = naga::front::wgsl::parse_str(source)
            .unwrap_or_else(|e| panic!("{}.wgsl: {}", name, e.emit_to_string(source)));
        naga::valid::Validator::new(naga::valid::ValidationFlags::all(), naga::valid::Capabilities::all())
            .validate(&module)
            .unwrap_or_else(|e| panic!("{}.wgsl: {:?}", name, e));
        module
    }

    fn struct_size(module: &naga::Module, name: &str) -> u32 {
        module
            .types
            .iter()
            .find_map(|(_, ty)| match &ty.inner {
                naga::TypeInner::Struct { span, .. } if ty.name.as_deref() == Some(name) => Some(*span),
                _ => None,
            })
            .unwrap_or_else(|| panic!("struct {} not found", name))
    }

    #[test]
    fn test_builtin_shaders_validate() {
        parse_and_validate(SCENE_SHADER);
        parse_and_validate(SKYBOX_SHADER);
    }

    #[test]
    fn test_uniform_structs_match_rust_layout() {
        use crate::gfx::rendering::scene_pass::{GlobalUniform, ModelUniform};
        use crate::gfx::resources::material::MaterialUniform;

        let scene = parse_and_validate(SCENE_SHADER);
        assert_eq!(struct_size(&scene, "Globals") as usize, std::mem::size_of::<GlobalUniform>());
        assert_eq!(struct_size(&scene, "ModelUniform") as usize, std::mem::size_of::<ModelUniform>());
        assert_eq!(struct_size(&scene, "MaterialUniform") as usize, std::mem::size_of::<MaterialUniform>());

        let skybox = parse_and_validate(SKYBOX_SHADER);
        assert_eq!(struct_size(&skybox, "Globals") as usize, std::mem::size_of::<GlobalUniform>());
    }

    #[test]
    fn test_override_file_wins() {
        let dir = std::env::temp_dir().join(format!("kiln-shaders-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("scene.wgsl"), "// custom").unwrap();

        let library = ShaderLibrary::new(&dir);
        assert_eq!(library.source(SCENE_SHADER).unwrap(), "// custom");
        assert_eq!(
            library.source(SKYBOX_SHADER).unwrap(),
            ShaderLibrary::builtin(SKYBOX_SHADER).unwrap()
        );
    }

    #[test]
    fn test_unknown_shader() {
        assert!(ShaderLibrary::default().source("missing").is_none());
        assert_eq!(ShaderLibrary::names().count(), 2);
    }
}
