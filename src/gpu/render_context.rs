//! Window-backed wgpu context used by the standalone viewer.

use std::fmt;

/// Failures while bringing up the viewer's device and surface.
#[derive(Debug)]
pub enum RenderContextError {
    /// The window handle could not back a surface.
    Surface(wgpu::CreateSurfaceError),
    /// No adapter can present to the surface.
    Adapter(wgpu::RequestAdapterError),
    /// The adapter refused the device request.
    Device(wgpu::RequestDeviceError),
    /// The surface offers no format the highlight pass can blend into.
    NoBlendableFormat,
}

impl fmt::Display for RenderContextError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Surface(e) => write!(f, "cannot create surface: {e}"),
            Self::Adapter(e) => write!(f, "no usable GPU adapter: {e}"),
            Self::Device(e) => write!(f, "device request failed: {e}"),
            Self::NoBlendableFormat => {
                write!(f, "surface has no blendable color format")
            }
        }
    }
}

impl std::error::Error for RenderContextError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Surface(e) => Some(e),
            Self::Adapter(e) => Some(e),
            Self::Device(e) => Some(e),
            Self::NoBlendableFormat => None,
        }
    }
}

/// Pick the surface format: sRGB first, then anything blendable.
fn choose_format(
    adapter: &wgpu::Adapter,
    formats: &[wgpu::TextureFormat],
) -> Option<wgpu::TextureFormat> {
    let blendable = |format: &&wgpu::TextureFormat| {
        adapter
            .get_texture_format_features(**format)
            .flags
            .contains(wgpu::TextureFormatFeatureFlags::BLENDABLE)
    };
    formats
        .iter()
        .filter(blendable)
        .find(|format| format.is_srgb())
        .or_else(|| formats.iter().find(blendable))
        .copied()
}

/// Device, queue and presentation surface of the viewer window.
pub struct RenderContext {
    /// Logical device.
    pub device: wgpu::Device,
    /// Command queue.
    pub queue: wgpu::Queue,
    surface: wgpu::Surface<'static>,
    config: wgpu::SurfaceConfiguration,
}

impl RenderContext {
    /// Open a device that can present to `window` at `initial_size`.
    ///
    /// # Errors
    ///
    /// Returns [`RenderContextError`] if no adapter, device or blendable
    /// surface format is available.
    pub async fn new(
        window: impl Into<wgpu::SurfaceTarget<'static>>,
        initial_size: (u32, u32),
    ) -> Result<Self, RenderContextError> {
        let instance = wgpu::Instance::default();
        let surface = instance
            .create_surface(window)
            .map_err(RenderContextError::Surface)?;
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                compatible_surface: Some(&surface),
                ..Default::default()
            })
            .await
            .map_err(RenderContextError::Adapter)?;
        let info = adapter.get_info();
        log::info!("adapter: {} ({:?})", info.name, info.backend);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Manipdraw Device"),
                ..Default::default()
            })
            .await
            .map_err(RenderContextError::Device)?;

        let capabilities = surface.get_capabilities(&adapter);
        let format = choose_format(&adapter, &capabilities.formats)
            .ok_or(RenderContextError::NoBlendableFormat)?;
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: initial_size.0.max(1),
            height: initial_size.1.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            desired_maximum_frame_latency: 2,
            alpha_mode: capabilities
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
        };
        surface.configure(&device, &config);
        log::debug!("surface format {format:?}");

        Ok(Self {
            device,
            queue,
            surface,
            config,
        })
    }

    /// Color format of the swapchain images.
    #[must_use]
    pub fn format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    /// Swapchain size in pixels, never zero.
    #[must_use]
    pub fn size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    /// Resize the swapchain. A zero extent (minimised window) is ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.reconfigure();
    }

    /// Configure the surface again at the current size, after it was lost
    /// or became outdated.
    pub fn reconfigure(&self) {
        self.surface.configure(&self.device, &self.config);
    }

    /// Next swapchain image.
    ///
    /// # Errors
    ///
    /// Passes through [`wgpu::SurfaceError`]; `Lost` and `Outdated` are
    /// cured by [`reconfigure`](Self::reconfigure).
    pub fn next_frame(
        &self,
    ) -> Result<wgpu::SurfaceTexture, wgpu::SurfaceError> {
        self.surface.get_current_texture()
    }

    /// A fresh command encoder.
    #[must_use]
    pub fn create_encoder(&self, label: &str) -> wgpu::CommandEncoder {
        self.device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some(label),
            })
    }

    /// Finish `encoder` and submit it.
    pub fn submit(&self, encoder: wgpu::CommandEncoder) {
        let _ = self.queue.submit(std::iter::once(encoder.finish()));
    }
}
