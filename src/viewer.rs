//! Standalone demo window backed by winit.
//!
//! Draws a translate gizmo (a center block and three axis bars) under a
//! slowly orbiting camera and runs the manipulator picker on top of it, so
//! hovering a handle makes it blink.
//!
//! Keys: `Space` toggles the picker on and off, `Z` switches between the
//! standard and the reversed-Z depth convention.
//!
//! ```no_run
//! # use manipdraw::Viewer;
//! Viewer::builder()
//!     .with_title("manipdraw")
//!     .build()
//!     .run()
//!     .unwrap();
//! ```

use std::sync::Arc;

use glam::{Mat4, Vec3};
use web_time::Instant;
use winit::{
    application::ApplicationHandler,
    event::{ElementState, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use crate::{
    engine::{FrameOutcome, HostFrame, HostTarget, ManipulatorPicker},
    error::ManipDrawError,
    gpu::{
        pipeline_helpers::{create_manipulator_pipeline, depth_test},
        render_context::RenderContext,
        shader_composer::{Shader, ShaderComposer},
        uniforms::{ManipUniform, UniformBinding},
    },
    options::Options,
    picking::{CursorPos, DepthConvention, PickId, Viewport},
    scene::{
        ManipulatorFilter, ManipulatorMesh, ManipulatorSource,
        ManipulatorSurface,
    },
};

const SCENE_DEPTH_FORMAT: wgpu::TextureFormat =
    wgpu::TextureFormat::Depth32Float;
/// Camera orbit speed in radians per second.
const ORBIT_SPEED: f32 = 0.25;
const BACKGROUND: wgpu::Color = wgpu::Color {
    r: 0.08,
    g: 0.09,
    b: 0.11,
    a: 1.0,
};

// ── Builder ──────────────────────────────────────────────────────────────

/// Fluent builder for [`Viewer`].
pub struct ViewerBuilder {
    options: Option<Options>,
    title: String,
}

impl ViewerBuilder {
    /// Create a builder with default options and the title "manipdraw".
    fn new() -> Self {
        Self {
            options: None,
            title: "manipdraw".into(),
        }
    }

    /// Override the default options.
    #[must_use]
    pub fn with_options(mut self, options: Options) -> Self {
        self.options = Some(options);
        self
    }

    /// Set the window title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Consume the builder and produce a [`Viewer`].
    #[must_use]
    pub fn build(self) -> Viewer {
        Viewer {
            options: self.options.unwrap_or_default(),
            title: self.title,
        }
    }
}

// ── Viewer ───────────────────────────────────────────────────────────────

/// A standalone window that demonstrates manipulator picking.
///
/// Construct via [`Viewer::builder`], then call [`run`](Self::run) to
/// enter the event loop.
pub struct Viewer {
    options: Options,
    title: String,
}

impl Viewer {
    /// Start a new builder.
    #[must_use]
    pub fn builder() -> ViewerBuilder {
        ViewerBuilder::new()
    }

    /// Open the window and run the event loop. Blocks until the window is
    /// closed.
    ///
    /// # Errors
    ///
    /// Returns [`ManipDrawError::Viewer`] if the event loop cannot be
    /// created or exits with an error.
    pub fn run(self) -> Result<(), ManipDrawError> {
        let event_loop = EventLoop::new()
            .map_err(|e| ManipDrawError::Viewer(e.to_string()))?;
        event_loop.set_control_flow(ControlFlow::Poll);

        let mut app = ViewerApp {
            window: None,
            scene: None,
            picker: ManipulatorPicker::new(self.options),
            title: self.title,
            cursor: None,
            depth: DepthConvention::Standard,
            started: Instant::now(),
        };

        event_loop
            .run_app(&mut app)
            .map_err(|e| ManipDrawError::Viewer(e.to_string()))
    }
}

// ── Demo scene ───────────────────────────────────────────────────────────

/// The gizmo: a center block (ID 0) and X, Y, Z bars (IDs 1 to 3).
fn gizmo_surfaces() -> Vec<ManipulatorSurface> {
    let thin = Vec3::splat(0.07);
    let handles = [
        (Vec3::ZERO, Vec3::splat(0.18)),
        (Vec3::X * 0.85, thin + Vec3::X * 0.55),
        (Vec3::Y * 0.85, thin + Vec3::Y * 0.55),
        (Vec3::Z * 0.85, thin + Vec3::Z * 0.55),
    ];
    (0_u16..)
        .zip(handles)
        .filter_map(|(raw, (center, half_extents))| {
            let id = PickId::new(raw)?;
            Some(ManipulatorSurface::cuboid(id, center, half_extents))
        })
        .collect()
}

/// GPU state of the demo scene, created once the window exists.
struct SceneState {
    context: RenderContext,
    composer: ShaderComposer,
    mesh: ManipulatorMesh,
    uniforms: UniformBinding,
    /// One pipeline per [`DepthConvention`].
    pipelines: [wgpu::RenderPipeline; 2],
    depth_view: wgpu::TextureView,
}

impl SceneState {
    fn new(
        context: RenderContext,
        options: &Options,
    ) -> Result<Self, ManipDrawError> {
        let mut composer =
            ShaderComposer::new(options.shaders.directory.clone())?;
        let device = &context.device;
        let uniforms = UniformBinding::new(device, "Scene Uniforms");
        let pipelines = Self::create_pipelines(
            device,
            &mut composer,
            &uniforms,
            context.format(),
        )?;
        let mesh = ManipulatorMesh::new(device, &gizmo_surfaces());
        let (width, height) = context.size();
        let depth_view = create_depth_view(device, width, height);
        Ok(Self {
            context,
            composer,
            mesh,
            uniforms,
            pipelines,
            depth_view,
        })
    }

    fn create_pipelines(
        device: &wgpu::Device,
        composer: &mut ShaderComposer,
        uniforms: &UniformBinding,
        format: wgpu::TextureFormat,
    ) -> Result<[wgpu::RenderPipeline; 2], ManipDrawError> {
        let shader = composer.compose(device, Shader::Scene)?;
        Ok(DepthConvention::ALL.map(|convention| {
            create_manipulator_pipeline(
                device,
                &format!("Scene {convention:?}"),
                &shader,
                &uniforms.layout,
                wgpu::ColorTargetState {
                    format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                },
                Some(depth_test(SCENE_DEPTH_FORMAT, convention.compare())),
            )
        }))
    }

    fn reload_shaders(&mut self) {
        match self.composer.poll_changes() {
            Ok(false) => {}
            Ok(true) => match Self::create_pipelines(
                &self.context.device,
                &mut self.composer,
                &self.uniforms,
                self.context.format(),
            ) {
                Ok(pipelines) => self.pipelines = pipelines,
                Err(e) => log::error!("scene shader reload failed: {e}"),
            },
            Err(e) => log::error!("scene shader reload failed: {e}"),
        }
    }

    fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.context.resize(width, height);
        self.depth_view =
            create_depth_view(&self.context.device, width, height);
    }

    /// Clear `view` and draw every manipulator into it.
    fn draw(&self, view: &wgpu::TextureView, frame: &HostFrame) {
        self.uniforms
            .write(&self.context.queue, &ManipUniform::pick(frame.pvm()));
        let mut encoder = self.context.create_encoder("Scene Encoder");
        {
            let mut pass =
                encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("Scene Render Pass"),
                    color_attachments: &[Some(
                        wgpu::RenderPassColorAttachment {
                            view,
                            resolve_target: None,
                            ops: wgpu::Operations {
                                load: wgpu::LoadOp::Clear(BACKGROUND),
                                store: wgpu::StoreOp::Store,
                            },
                            depth_slice: None,
                        },
                    )],
                    depth_stencil_attachment: Some(
                        wgpu::RenderPassDepthStencilAttachment {
                            view: &self.depth_view,
                            depth_ops: Some(wgpu::Operations {
                                load: wgpu::LoadOp::Clear(
                                    frame.depth.clear_depth(),
                                ),
                                store: wgpu::StoreOp::Discard,
                            }),
                            stencil_ops: None,
                        },
                    ),
                    ..Default::default()
                });
            pass.set_pipeline(&self.pipelines[frame.depth.index()]);
            pass.set_bind_group(0, &self.uniforms.bind_group, &[]);
            self.mesh.draw(&mut pass, ManipulatorFilter::All);
        }
        self.context.submit(encoder);
    }
}

fn create_depth_view(
    device: &wgpu::Device,
    width: u32,
    height: u32,
) -> wgpu::TextureView {
    device
        .create_texture(&wgpu::TextureDescriptor {
            label: Some("Scene Depth"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: SCENE_DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        })
        .create_view(&wgpu::TextureViewDescriptor::default())
}

/// Projection for `depth`: reversed-Z uses an infinite far plane.
fn projection(depth: DepthConvention, aspect: f32) -> Mat4 {
    let fov = 45_f32.to_radians();
    match depth {
        DepthConvention::Standard => {
            Mat4::perspective_rh(fov, aspect, 0.1, 100.0)
        }
        DepthConvention::ReversedZ => {
            Mat4::perspective_infinite_reverse_rh(fov, aspect, 0.1)
        }
    }
}

/// Camera orbiting the origin `seconds` into the run.
fn orbit_view(seconds: f32) -> Mat4 {
    let angle = seconds * ORBIT_SPEED;
    let eye = Vec3::new(angle.cos() * 4.0, 2.4, angle.sin() * 4.0);
    Mat4::look_at_rh(eye, Vec3::ZERO, Vec3::Y)
}

// ── Winit app ────────────────────────────────────────────────────────────

/// Internal winit application handler.
struct ViewerApp {
    window: Option<Arc<Window>>,
    scene: Option<SceneState>,
    picker: ManipulatorPicker,
    title: String,
    /// `None` once the cursor left the window.
    cursor: Option<CursorPos>,
    depth: DepthConvention,
    started: Instant,
}

impl ViewerApp {
    fn render(&mut self) {
        let Some(scene) = &mut self.scene else {
            return;
        };
        if self.picker.options().shaders.hot_reload {
            scene.reload_shaders();
        }

        let surface_texture = match scene.context.next_frame() {
            Ok(texture) => texture,
            Err(wgpu::SurfaceError::Outdated | wgpu::SurfaceError::Lost) => {
                scene.context.reconfigure();
                return;
            }
            Err(e) => {
                log::error!("render error: {e:?}");
                return;
            }
        };
        let view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let (width, height) = scene.context.size();
        let seconds = self.started.elapsed().as_secs_f32();
        let frame = HostFrame {
            // Outside every viewport, so the picker skips the frame.
            cursor: self.cursor.unwrap_or(CursorPos::new(-1, -1)),
            viewport: Viewport::new(0, 0, width as i32, height as i32),
            projection: projection(self.depth, width as f32 / height as f32),
            view: orbit_view(seconds),
            depth: self.depth,
        };
        scene.draw(&view, &frame);

        if self.picker.is_active() {
            let before = self.picker.hovered();
            let target = HostTarget {
                view: &view,
                format: scene.context.format(),
                width,
                height,
            };
            match self.picker.draw_frame(
                &scene.context.queue,
                &scene.mesh,
                &frame,
                &target,
            ) {
                Ok(FrameOutcome::Picked { pick, .. }) if pick != before => {
                    match pick {
                        Some(id) => log::info!("hovering manipulator {id}"),
                        None => log::info!("hovering nothing"),
                    }
                }
                Ok(_) => {}
                Err(e) => log::error!("manipulator picking failed: {e}"),
            }
        }

        surface_texture.present();
    }

    fn toggle_picker(&mut self) {
        if self.picker.is_active() {
            self.picker.deactivate();
        } else if let Some(scene) = &self.scene {
            // Failures are logged by `activate`.
            let _ = self
                .picker
                .activate(&scene.context.device, scene.context.format());
        }
    }

    fn handle_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Space => self.toggle_picker(),
            KeyCode::KeyZ => {
                self.depth = match self.depth {
                    DepthConvention::Standard => DepthConvention::ReversedZ,
                    DepthConvention::ReversedZ => DepthConvention::Standard,
                };
                log::info!("depth convention: {:?}", self.depth);
            }
            _ => {}
        }
    }
}

impl ApplicationHandler for ViewerApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attrs = Window::default_attributes()
            .with_title(&self.title)
            .with_inner_size(winit::dpi::LogicalSize::new(1024, 768));
        let window = match event_loop.create_window(attrs) {
            Ok(w) => Arc::new(w),
            Err(e) => {
                log::error!("Failed to create window: {e}");
                event_loop.exit();
                return;
            }
        };

        let inner = window.inner_size();
        let scene = pollster::block_on(RenderContext::new(
            window.clone(),
            (inner.width, inner.height),
        ))
        .map_err(ManipDrawError::from)
        .and_then(|context| SceneState::new(context, self.picker.options()));
        let scene = match scene {
            Ok(scene) => scene,
            Err(e) => {
                log::error!("Failed to initialize scene: {e}");
                event_loop.exit();
                return;
            }
        };

        // A failed activation leaves the demo running without picking.
        let _ = self
            .picker
            .activate(&scene.context.device, scene.context.format());

        window.request_redraw();
        self.window = Some(window);
        self.scene = Some(scene);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _id: WindowId,
        event: WindowEvent,
    ) {
        if matches!(event, WindowEvent::CloseRequested) {
            self.picker.deactivate();
            event_loop.exit();
            return;
        }

        // Guard: both window and scene must be initialised.
        if self.window.is_none() || self.scene.is_none() {
            return;
        }

        match event {
            WindowEvent::Resized(size) => {
                if let Some(scene) = &mut self.scene {
                    scene.resize(size.width, size.height);
                }
            }

            WindowEvent::RedrawRequested => {
                self.render();
                if let Some(w) = &self.window {
                    w.request_redraw();
                }
            }

            WindowEvent::CursorMoved { position, .. } => {
                self.cursor =
                    Some(CursorPos::from_physical(position.x, position.y));
            }

            WindowEvent::CursorLeft { .. } => {
                self.cursor = None;
            }

            WindowEvent::KeyboardInput { event, .. } => {
                if event.state != ElementState::Pressed || event.repeat {
                    return;
                }
                if let PhysicalKey::Code(code) = event.physical_key {
                    self.handle_key(code);
                }
            }

            _ => (),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gizmo_has_one_surface_per_handle() {
        let surfaces = gizmo_surfaces();
        let ids: Vec<u16> = surfaces.iter().map(|s| s.id.raw()).collect();
        assert_eq!(ids, vec![0, 1, 2, 3]);
    }

    #[test]
    fn origin_projects_to_the_screen_center_in_both_conventions() {
        let view = orbit_view(1.5);
        for depth in DepthConvention::ALL {
            let clip =
                projection(depth, 4.0 / 3.0) * view * Vec3::ZERO.extend(1.0);
            let ndc = clip.truncate() / clip.w;
            assert!(ndc.x.abs() < 1e-4 && ndc.y.abs() < 1e-4, "{depth:?}");
            assert!((0.0..=1.0).contains(&ndc.z), "{depth:?}: {}", ndc.z);
        }
    }
}
