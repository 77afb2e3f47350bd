//! Per-frame pick pass: drain the previous readback, render the cursor texel,
//! queue the next readback.

use glam::Mat4;

use super::readback::GpuReadback;
use super::target::{PickTarget, DEPTH_FORMAT, ID_FORMAT};
use super::transfer::{Completion, TransferChannel};
use super::{DepthConvention, PickId, PickWindow};
use crate::error::ManipDrawError;
use crate::gpu::pipeline_helpers::{create_manipulator_pipeline, depth_test};
use crate::gpu::shader_composer::{Shader, ShaderComposer};
use crate::gpu::uniforms::{ManipUniform, UniformBinding};
use crate::scene::{ManipulatorFilter, ManipulatorSource};

/// Orchestrates the pick pass and owns its GPU resources.
pub struct PickResolver {
    device: wgpu::Device,
    target: PickTarget,
    channel: TransferChannel<GpuReadback>,
    uniforms: UniformBinding,
    /// One pipeline per [`DepthConvention`], indexed by
    /// [`DepthConvention::index`].
    pipelines: [wgpu::RenderPipeline; 2],
}

impl PickResolver {
    /// Allocate the pick target and staging buffer and build the pick
    /// pipelines.
    ///
    /// # Errors
    ///
    /// Fails if the device cannot render the pick formats or the pick
    /// shader does not compose.
    pub fn new(
        device: &wgpu::Device,
        composer: &mut ShaderComposer,
        stall_warn_polls: u32,
    ) -> Result<Self, ManipDrawError> {
        let mut target = PickTarget::new();
        target.allocate(device)?;
        let uniforms = UniformBinding::new(device, "Pick Uniforms");
        let pipelines = Self::create_pipelines(device, composer, &uniforms)?;
        Ok(Self {
            device: device.clone(),
            target,
            channel: TransferChannel::new(
                GpuReadback::new(device),
                stall_warn_polls,
            ),
            uniforms,
            pipelines,
        })
    }

    fn create_pipelines(
        device: &wgpu::Device,
        composer: &mut ShaderComposer,
        uniforms: &UniformBinding,
    ) -> Result<[wgpu::RenderPipeline; 2], ManipDrawError> {
        let shader = composer.compose(device, Shader::PickId)?;
        Ok(DepthConvention::ALL.map(|convention| {
            create_manipulator_pipeline(
                device,
                &format!("Pick {convention:?}"),
                &shader,
                &uniforms.layout,
                wgpu::ColorTargetState {
                    format: ID_FORMAT,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                },
                Some(depth_test(DEPTH_FORMAT, convention.compare())),
            )
        }))
    }

    /// Recompose the pick shader and rebuild the pipelines. On error the
    /// previous pipelines stay in use.
    ///
    /// # Errors
    ///
    /// Returns [`ManipDrawError::ShaderCompose`] if the shader is broken.
    pub fn rebuild_pipelines(
        &mut self,
        composer: &mut ShaderComposer,
    ) -> Result<(), ManipDrawError> {
        self.pipelines =
            Self::create_pipelines(&self.device, composer, &self.uniforms)?;
        log::debug!("rebuilt pick pipelines");
        Ok(())
    }

    /// The most recently resolved pick.
    #[must_use]
    pub fn resolved(&self) -> Option<PickId> {
        self.channel.resolved()
    }

    /// The readback channel.
    #[must_use]
    pub fn channel(&self) -> &TransferChannel<GpuReadback> {
        &self.channel
    }

    /// Run one pick pass and return the pick resolved so far.
    ///
    /// The returned pick comes from an earlier frame's pass. While that
    /// earlier readback is still in flight no new pass is encoded.
    ///
    /// # Errors
    ///
    /// Returns [`ManipDrawError::PickTargetMissing`] after
    /// [`release`](Self::release).
    pub fn resolve(
        &mut self,
        queue: &wgpu::Queue,
        geometry: &dyn ManipulatorSource,
        window: &PickWindow,
        pvm: Mat4,
        depth: DepthConvention,
    ) -> Result<Option<PickId>, ManipDrawError> {
        if let Completion::Resolved(pick) = self.channel.try_complete() {
            log::trace!("pick resolved: {pick:?}");
        }
        if self.channel.is_pending() {
            return Ok(self.channel.resolved());
        }

        let (id_view, depth_view) = self.target.views()?;
        let id_texture = self.target.id_texture()?;

        self.uniforms
            .write(queue, &ManipUniform::pick(window.clip_transform() * pvm));

        let mut encoder =
            self.device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("Pick Encoder"),
                });
        {
            let mut pass =
                encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("Pick Render Pass"),
                    color_attachments: &[Some(
                        wgpu::RenderPassColorAttachment {
                            view: id_view,
                            resolve_target: None,
                            ops: wgpu::Operations {
                                load: wgpu::LoadOp::Clear(wgpu::Color {
                                    r: f64::from(PickId::NONE_RAW),
                                    g: 0.0,
                                    b: 0.0,
                                    a: 0.0,
                                }),
                                store: wgpu::StoreOp::Store,
                            },
                            depth_slice: None,
                        },
                    )],
                    depth_stencil_attachment: Some(
                        wgpu::RenderPassDepthStencilAttachment {
                            view: depth_view,
                            depth_ops: Some(wgpu::Operations {
                                load: wgpu::LoadOp::Clear(depth.clear_depth()),
                                store: wgpu::StoreOp::Discard,
                            }),
                            stencil_ops: None,
                        },
                    ),
                    ..Default::default()
                });
            pass.set_pipeline(&self.pipelines[depth.index()]);
            pass.set_bind_group(0, &self.uniforms.bind_group, &[]);
            geometry.draw(&mut pass, ManipulatorFilter::All);
        }
        self.channel.slot().record_copy(&mut encoder, id_texture);
        let _ = queue.submit(std::iter::once(encoder.finish()));
        self.channel.issue()?;

        Ok(self.channel.resolved())
    }

    /// Free the pick target. Later passes fail with
    /// [`ManipDrawError::PickTargetMissing`].
    pub fn release(&mut self) {
        self.target.release();
    }
}
