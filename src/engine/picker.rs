//! The manipulator picking subsystem as an owned context object.

use glam::Mat4;
use web_time::Instant;

use super::frame::{drive_frame, FrameOutcome, HostFrame, PickPasses};
use crate::error::ManipDrawError;
use crate::gpu::shader_composer::ShaderComposer;
use crate::highlight::{HighlightDraw, HighlightRenderer};
use crate::options::Options;
use crate::picking::{
    DepthConvention, PickId, PickResolver, PickWindow, Viewport,
};
use crate::scene::ManipulatorSource;

/// Color target the highlight pass draws into.
#[derive(Debug, Clone, Copy)]
pub struct HostTarget<'a> {
    /// View of the host's color attachment, already holding the scene.
    pub view: &'a wgpu::TextureView,
    /// Format of `view`.
    pub format: wgpu::TextureFormat,
    /// Width of the attachment in pixels.
    pub width: u32,
    /// Height of the attachment in pixels.
    pub height: u32,
}

/// GPU state that exists only between `activate` and `deactivate`.
struct ActiveState {
    composer: ShaderComposer,
    resolver: PickResolver,
    highlight: HighlightRenderer,
}

impl ActiveState {
    fn new(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        options: &Options,
    ) -> Result<Self, ManipDrawError> {
        let mut composer =
            ShaderComposer::new(options.shaders.directory.clone())?;
        let resolver = PickResolver::new(
            device,
            &mut composer,
            options.picking.stall_warn_frames,
        )?;
        let highlight = HighlightRenderer::new(
            device,
            &mut composer,
            format,
            &options.highlight,
        )?;
        Ok(Self {
            composer,
            resolver,
            highlight,
        })
    }

    /// Recompose everything after a shader edit. Failures keep the old
    /// pipelines.
    fn hot_reload(&mut self) {
        match self.composer.poll_changes() {
            Ok(false) => {}
            Ok(true) => {
                let format = self.highlight.format();
                let pick = self.resolver.rebuild_pipelines(&mut self.composer);
                let highlight =
                    self.highlight.rebuild(&mut self.composer, format);
                let _ = report_reload([
                    ("pick", pick),
                    ("highlight", highlight),
                ]);
            }
            Err(e) => log::error!("shader reload failed: {e}"),
        }
    }
}

/// Log the outcome of each pipeline rebuild and return how many failed.
/// Every rebuild has already run; one broken shader does not hold back
/// the others.
fn report_reload<const N: usize>(
    results: [(&str, Result<(), ManipDrawError>); N],
) -> usize {
    let mut failed = 0;
    for (name, result) in results {
        match result {
            Ok(()) => log::info!("{name} shader reloaded"),
            Err(e) => {
                failed += 1;
                log::error!("{name} shader reload failed: {e}");
            }
        }
    }
    failed
}

/// Binds one frame's host resources to the GPU passes.
struct GpuPasses<'a, 't> {
    state: &'a mut ActiveState,
    queue: &'a wgpu::Queue,
    geometry: &'a dyn ManipulatorSource,
    target: &'a HostTarget<'t>,
    hot_reload: bool,
    highlight_enabled: bool,
}

impl PickPasses for GpuPasses<'_, '_> {
    fn prepare(&mut self) {
        if self.hot_reload {
            self.state.hot_reload();
        }
    }

    fn resolve(
        &mut self,
        window: &PickWindow,
        pvm: Mat4,
        depth: DepthConvention,
    ) -> Result<Option<PickId>, ManipDrawError> {
        self.state
            .resolver
            .resolve(self.queue, self.geometry, window, pvm, depth)
    }

    fn highlight(
        &mut self,
        pick: PickId,
        pvm: Mat4,
        viewport: Viewport,
        now: Instant,
    ) -> Result<bool, ManipDrawError> {
        if !self.highlight_enabled {
            return Ok(false);
        }
        let _ = self.state.highlight.draw(
            self.queue,
            self.geometry,
            self.target,
            &HighlightDraw {
                pick,
                pvm,
                viewport,
                now,
            },
        )?;
        Ok(true)
    }
}

/// Mouse-over picking and highlighting of manipulators.
///
/// Created inactive. [`activate`](Self::activate) allocates the GPU
/// resources, [`draw_frame`](Self::draw_frame) runs once per rendered frame,
/// and [`deactivate`](Self::deactivate) releases everything again. The cycle
/// can repeat any number of times.
pub struct ManipulatorPicker {
    options: Options,
    active: Option<ActiveState>,
    /// Pick of the last frame that ran the pick pass.
    hovered: Option<PickId>,
}

impl ManipulatorPicker {
    /// Create an inactive picker.
    #[must_use]
    pub fn new(options: Options) -> Self {
        Self {
            options,
            active: None,
            hovered: None,
        }
    }

    /// Current options.
    #[must_use]
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Replace the options. Takes effect at the next activation.
    pub fn set_options(&mut self, options: Options) {
        self.options = options;
    }

    /// Whether GPU resources are allocated.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Manipulator under the cursor as of the last frame that picked.
    #[must_use]
    pub fn hovered(&self) -> Option<PickId> {
        self.hovered
    }

    /// Allocate the pick target, readback buffer and pipelines for a host
    /// whose color target has `format`. Re-activating first releases the
    /// previous resources.
    ///
    /// # Errors
    ///
    /// Capability, shader and I/O faults. They are logged, and the picker
    /// is left inactive.
    pub fn activate(
        &mut self,
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
    ) -> Result<(), ManipDrawError> {
        self.deactivate();
        match ActiveState::new(device, format, &self.options) {
            Ok(state) => {
                self.active = Some(state);
                log::info!("manipulator picking activated ({format:?})");
                Ok(())
            }
            Err(e) => {
                log::error!("manipulator picking activation failed: {e}");
                Err(e)
            }
        }
    }

    /// Release every GPU resource. No-op while inactive.
    pub fn deactivate(&mut self) {
        if let Some(mut state) = self.active.take() {
            state.resolver.release();
            self.hovered = None;
            log::info!("manipulator picking deactivated");
        }
    }

    /// Run the frame: pick under the cursor and highlight the result.
    ///
    /// Call after the host has submitted its scene to `target`, with the
    /// same matrices and viewport it drew with.
    ///
    /// # Errors
    ///
    /// Returns [`ManipDrawError::NotActive`] before activation and
    /// [`ManipDrawError::ViewportOutOfBounds`] if the viewport does not fit
    /// the target. A host format the highlight cannot blend into is
    /// reported as [`ManipDrawError::UnsupportedFormat`].
    pub fn draw_frame(
        &mut self,
        queue: &wgpu::Queue,
        geometry: &dyn ManipulatorSource,
        frame: &HostFrame,
        target: &HostTarget<'_>,
    ) -> Result<FrameOutcome, ManipDrawError> {
        let state = self.active.as_mut().ok_or(ManipDrawError::NotActive)?;
        if !frame.viewport.fits_within(target.width, target.height) {
            return Err(ManipDrawError::ViewportOutOfBounds {
                target: (target.width, target.height),
            });
        }
        if target.format != state.highlight.format() {
            state.highlight.rebuild(&mut state.composer, target.format)?;
        }

        let mut passes = GpuPasses {
            state,
            queue,
            geometry,
            target,
            hot_reload: self.options.shaders.hot_reload,
            highlight_enabled: self.options.highlight.enabled,
        };
        let outcome = drive_frame(&mut passes, frame, Instant::now())?;
        if let FrameOutcome::Picked { pick, .. } = outcome {
            self.hovered = pick;
        }
        Ok(outcome)
    }
}

impl Drop for ManipulatorPicker {
    fn drop(&mut self) {
        self.deactivate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_picker_is_inactive() {
        let mut picker = ManipulatorPicker::new(Options::default());
        assert!(!picker.is_active());
        assert_eq!(picker.hovered(), None);
        // Deactivating an inactive picker is harmless.
        picker.deactivate();
        picker.deactivate();
        assert!(!picker.is_active());
    }

    #[test]
    fn reload_reports_each_pipeline_on_its_own() {
        let broken = || ManipDrawError::ShaderCompose {
            shader: "pick_id.wgsl".to_owned(),
            message: "expected `)`".to_owned(),
        };
        assert_eq!(report_reload([("pick", Ok(())), ("highlight", Ok(()))]), 0);
        assert_eq!(
            report_reload([("pick", Err(broken())), ("highlight", Ok(()))]),
            1
        );
        assert_eq!(
            report_reload([
                ("pick", Err(broken())),
                ("highlight", Err(broken())),
            ]),
            2
        );
    }

    #[test]
    fn options_can_be_replaced_while_inactive() {
        let mut picker = ManipulatorPicker::new(Options::default());
        let mut options = Options::default();
        options.highlight.enabled = false;
        picker.set_options(options.clone());
        assert_eq!(picker.options(), &options);
    }
}
