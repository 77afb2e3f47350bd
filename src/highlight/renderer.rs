//! Blended overlay of the hovered manipulator.

use glam::Mat4;
use web_time::Instant;

use super::BlinkState;
use crate::engine::HostTarget;
use crate::error::ManipDrawError;
use crate::gpu::format::require_blendable;
use crate::gpu::pipeline_helpers::create_manipulator_pipeline;
use crate::gpu::shader_composer::{Shader, ShaderComposer};
use crate::gpu::uniforms::{ManipUniform, UniformBinding};
use crate::options::HighlightOptions;
use crate::picking::{PickId, Viewport};
use crate::scene::{ManipulatorFilter, ManipulatorSource};

/// One highlight draw.
#[derive(Debug, Clone, Copy)]
pub struct HighlightDraw {
    /// Manipulator to draw.
    pub pick: PickId,
    /// Projection × view matrix the host drew the scene with.
    pub pvm: Mat4,
    /// Host viewport.
    pub viewport: Viewport,
    /// Frame time driving the blink.
    pub now: Instant,
}

/// Redraws one manipulator over the host image with a pulsing alpha.
pub struct HighlightRenderer {
    device: wgpu::Device,
    pipeline: wgpu::RenderPipeline,
    format: wgpu::TextureFormat,
    uniforms: UniformBinding,
    color: [f32; 4],
    blink: BlinkState,
}

impl HighlightRenderer {
    /// Build the highlight pipeline for host targets of `format`.
    ///
    /// # Errors
    ///
    /// Returns [`ManipDrawError::UnsupportedFormat`] if `format` cannot be
    /// blended into, or a compose error if the highlight shader is broken.
    pub fn new(
        device: &wgpu::Device,
        composer: &mut ShaderComposer,
        format: wgpu::TextureFormat,
        options: &HighlightOptions,
    ) -> Result<Self, ManipDrawError> {
        require_blendable(device, format)?;
        let uniforms = UniformBinding::new(device, "Highlight Uniforms");
        let pipeline =
            Self::create_pipeline(device, composer, &uniforms, format)?;
        Ok(Self {
            device: device.clone(),
            pipeline,
            format,
            uniforms,
            color: options.color,
            blink: BlinkState::new(
                options.blink_period(),
                options.idle_restart(),
            ),
        })
    }

    fn create_pipeline(
        device: &wgpu::Device,
        composer: &mut ShaderComposer,
        uniforms: &UniformBinding,
        format: wgpu::TextureFormat,
    ) -> Result<wgpu::RenderPipeline, ManipDrawError> {
        let shader = composer.compose(device, Shader::Highlight)?;
        Ok(create_manipulator_pipeline(
            device,
            "Highlight",
            &shader,
            &uniforms.layout,
            wgpu::ColorTargetState {
                format,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            },
            None,
        ))
    }

    /// Color format the pipeline was built for.
    #[must_use]
    pub fn format(&self) -> wgpu::TextureFormat {
        self.format
    }

    /// Blink timing state.
    #[must_use]
    pub fn blink(&self) -> &BlinkState {
        &self.blink
    }

    /// Rebuild the pipeline for `format` (after a host format change or a
    /// shader edit). On error the previous pipeline stays in use.
    ///
    /// # Errors
    ///
    /// Same as [`new`](Self::new).
    pub fn rebuild(
        &mut self,
        composer: &mut ShaderComposer,
        format: wgpu::TextureFormat,
    ) -> Result<(), ManipDrawError> {
        require_blendable(&self.device, format)?;
        self.pipeline = Self::create_pipeline(
            &self.device,
            composer,
            &self.uniforms,
            format,
        )?;
        self.format = format;
        log::debug!("rebuilt highlight pipeline for {format:?}");
        Ok(())
    }

    /// Draw `request.pick` over `target` inside the request viewport and
    /// advance the blink. Returns the alpha that was drawn.
    ///
    /// # Errors
    ///
    /// Returns [`ManipDrawError::UnsupportedFormat`] if `target` does not
    /// have the format the pipeline was built for.
    pub fn draw(
        &mut self,
        queue: &wgpu::Queue,
        geometry: &dyn ManipulatorSource,
        target: &HostTarget<'_>,
        request: &HighlightDraw,
    ) -> Result<f32, ManipDrawError> {
        let HighlightDraw {
            pick,
            pvm,
            viewport,
            now,
        } = *request;
        if target.format != self.format {
            return Err(ManipDrawError::UnsupportedFormat {
                format: target.format,
                reason: "highlight pipeline built for another format",
            });
        }
        let alpha = self.blink.advance(pick, now);
        self.uniforms
            .write(queue, &ManipUniform::highlight(pvm, self.color, alpha));

        let mut encoder =
            self.device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("Highlight Encoder"),
                });
        {
            let mut pass =
                encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("Highlight Render Pass"),
                    color_attachments: &[Some(
                        wgpu::RenderPassColorAttachment {
                            view: target.view,
                            resolve_target: None,
                            ops: wgpu::Operations {
                                load: wgpu::LoadOp::Load,
                                store: wgpu::StoreOp::Store,
                            },
                            depth_slice: None,
                        },
                    )],
                    ..Default::default()
                });
            pass.set_viewport(
                viewport.x as f32,
                viewport.y as f32,
                viewport.width as f32,
                viewport.height as f32,
                0.0,
                1.0,
            );
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &self.uniforms.bind_group, &[]);
            geometry.draw(&mut pass, ManipulatorFilter::Only(pick));
        }
        let _ = queue.submit(std::iter::once(encoder.finish()));
        Ok(alpha)
    }
}
