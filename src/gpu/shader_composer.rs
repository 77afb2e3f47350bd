use std::borrow::Cow;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use naga_oil::compose::{
    ComposableModuleDescriptor, Composer, NagaModuleDescriptor, ShaderLanguage,
    ShaderType,
};
use rustc_hash::FxHashMap;

use crate::error::ManipDrawError;

/// Shared modules in dependency order: `(file_path, embedded source)`.
const MODULES: &[(&str, &str)] = &[(
    "modules/manip.wgsl",
    include_str!("../../assets/shaders/modules/manip.wgsl"),
)];

/// Composable entry-point shaders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shader {
    /// Writes manipulator IDs into the pick target.
    PickId,
    /// Blink overlay of the hovered manipulator.
    Highlight,
    /// Flat-shaded manipulators drawn by the standalone viewer.
    Scene,
}

impl Shader {
    /// Every shader, for validation and change tracking.
    pub const ALL: [Self; 3] = [Self::PickId, Self::Highlight, Self::Scene];

    /// Path relative to the shader directory.
    #[must_use]
    pub const fn file_path(self) -> &'static str {
        match self {
            Self::PickId => "pick_id.wgsl",
            Self::Highlight => "highlight.wgsl",
            Self::Scene => "scene.wgsl",
        }
    }

    /// Debug label for the wgpu shader module.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::PickId => "Pick ID Shader",
            Self::Highlight => "Highlight Shader",
            Self::Scene => "Scene Shader",
        }
    }

    const fn embedded(self) -> &'static str {
        match self {
            Self::PickId => include_str!("../../assets/shaders/pick_id.wgsl"),
            Self::Highlight => {
                include_str!("../../assets/shaders/highlight.wgsl")
            }
            Self::Scene => include_str!("../../assets/shaders/scene.wgsl"),
        }
    }
}

/// Wraps `naga_oil::compose::Composer` to provide shader composition with
/// `#import` support.
///
/// Sources are embedded in the binary, or read from a directory with the
/// same layout as `assets/shaders`. In the latter case
/// [`poll_changes`](Self::poll_changes) detects edited files so pipelines
/// can be rebuilt while the host keeps running.
pub struct ShaderComposer {
    composer: Composer,
    directory: Option<PathBuf>,
    /// Last seen modification time per watched file. `None` after a scan
    /// failed, until the files can be inspected again.
    stamps: Option<FxHashMap<&'static str, SystemTime>>,
}

impl ShaderComposer {
    /// Composer over the embedded sources.
    ///
    /// # Errors
    ///
    /// Returns [`ManipDrawError::ShaderCompose`] if a shared module fails
    /// to register.
    pub fn embedded() -> Result<Self, ManipDrawError> {
        Self::new(None)
    }

    /// Composer reading sources from `directory`, or the embedded sources
    /// when `None`.
    ///
    /// # Errors
    ///
    /// Returns [`ManipDrawError::Io`] if a source file cannot be read and
    /// [`ManipDrawError::ShaderCompose`] if a shared module fails to
    /// register.
    pub fn new(directory: Option<PathBuf>) -> Result<Self, ManipDrawError> {
        let mut this = Self {
            composer: Composer::default(),
            directory,
            stamps: None,
        };
        this.stamps = Some(this.scan_stamps()?);
        this.composer = this.build_composer()?;
        Ok(this)
    }

    /// Directory sources are read from, if any.
    #[must_use]
    pub fn directory(&self) -> Option<&Path> {
        self.directory.as_deref()
    }

    /// Compose a shader into a `wgpu::ShaderModule` ready for pipeline
    /// creation.
    ///
    /// # Errors
    ///
    /// Returns [`ManipDrawError::ShaderCompose`] on import or validation
    /// failure and [`ManipDrawError::Io`] if the source cannot be read.
    pub fn compose(
        &mut self,
        device: &wgpu::Device,
        shader: Shader,
    ) -> Result<wgpu::ShaderModule, ManipDrawError> {
        let naga_module = self.compose_naga(shader)?;
        Ok(device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(shader.label()),
            source: wgpu::ShaderSource::Naga(Cow::Owned(naga_module)),
        }))
    }

    /// Compose a shader into a `naga::Module` without creating a wgpu
    /// shader module. Useful for testing shader composition without a GPU
    /// device.
    ///
    /// # Errors
    ///
    /// Same as [`compose`](Self::compose).
    pub fn compose_naga(
        &mut self,
        shader: Shader,
    ) -> Result<naga::Module, ManipDrawError> {
        let source = self.read_source(shader.file_path(), shader.embedded())?;
        self.composer
            .make_naga_module(NagaModuleDescriptor {
                source: &source,
                file_path: shader.file_path(),
                shader_type: ShaderType::Wgsl,
                ..Default::default()
            })
            .map_err(|e| ManipDrawError::ShaderCompose {
                shader: shader.file_path().to_owned(),
                message: e.to_string(),
            })
    }

    /// Check the shader directory for modified files.
    ///
    /// Returns `Ok(true)` when something changed; the shared modules have
    /// then been re-registered and callers should recompose their
    /// pipelines. Always `Ok(false)` for embedded sources.
    ///
    /// # Errors
    ///
    /// Returns an error if a file cannot be inspected or a changed shared
    /// module fails to register. Each failure is reported once; while a
    /// file stays unreadable later polls return `Ok(false)`, and the poll
    /// that finds it again reports a change. The previously registered
    /// modules stay in place, so existing pipelines remain valid.
    pub fn poll_changes(&mut self) -> Result<bool, ManipDrawError> {
        if self.directory.is_none() {
            return Ok(false);
        }
        let stamps = match self.scan_stamps() {
            Ok(stamps) => stamps,
            Err(e) => {
                return match self.stamps.take() {
                    Some(_) => Err(e),
                    None => Ok(false),
                };
            }
        };
        if self.stamps.as_ref() == Some(&stamps) {
            return Ok(false);
        }
        // Record the new stamps first so a broken edit is reported once.
        self.stamps = Some(stamps);
        self.composer = self.build_composer()?;
        log::info!("shader sources changed, recomposing");
        Ok(true)
    }

    fn build_composer(&self) -> Result<Composer, ManipDrawError> {
        let mut composer = Composer::default();
        for &(file_path, embedded) in MODULES {
            let source = self.read_source(file_path, embedded)?;
            let _ = composer
                .add_composable_module(ComposableModuleDescriptor {
                    source: &source,
                    file_path,
                    language: ShaderLanguage::Wgsl,
                    ..Default::default()
                })
                .map_err(|e| ManipDrawError::ShaderCompose {
                    shader: file_path.to_owned(),
                    message: e.to_string(),
                })?;
        }
        Ok(composer)
    }

    fn read_source(
        &self,
        file_path: &str,
        embedded: &'static str,
    ) -> Result<Cow<'static, str>, ManipDrawError> {
        match &self.directory {
            Some(dir) => Ok(Cow::Owned(std::fs::read_to_string(
                dir.join(file_path),
            )?)),
            None => Ok(Cow::Borrowed(embedded)),
        }
    }

    fn scan_stamps(
        &self,
    ) -> Result<FxHashMap<&'static str, SystemTime>, ManipDrawError> {
        let mut stamps = FxHashMap::default();
        let Some(dir) = &self.directory else {
            return Ok(stamps);
        };
        let files = MODULES
            .iter()
            .map(|&(file_path, _)| file_path)
            .chain(Shader::ALL.into_iter().map(Shader::file_path));
        for file_path in files {
            let modified = std::fs::metadata(dir.join(file_path))?.modified()?;
            let _ = stamps.insert(file_path, modified);
        }
        Ok(stamps)
    }
}
