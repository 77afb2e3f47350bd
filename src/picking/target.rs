//! 1×1 off-screen render target of the pick pass.

use crate::error::ManipDrawError;
use crate::gpu::format::require_renderable;

/// Format of the ID image; one 16-bit unsigned texel per pixel.
pub(crate) const ID_FORMAT: wgpu::TextureFormat =
    wgpu::TextureFormat::R16Uint;
/// Format of the pick pass depth image.
pub(crate) const DEPTH_FORMAT: wgpu::TextureFormat =
    wgpu::TextureFormat::Depth32Float;

const EXTENT: wgpu::Extent3d = wgpu::Extent3d {
    width: 1,
    height: 1,
    depth_or_array_layers: 1,
};

struct PickImages {
    id_texture: wgpu::Texture,
    id_view: wgpu::TextureView,
    // Kept alive for `depth_view`.
    _depth_texture: wgpu::Texture,
    depth_view: wgpu::TextureView,
}

/// ID + depth images bound together as the pick pass destination.
///
/// Empty until [`allocate`](Self::allocate) and again after
/// [`release`](Self::release); both are idempotent.
#[derive(Default)]
pub struct PickTarget {
    images: Option<PickImages>,
}

impl PickTarget {
    /// An unallocated target.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the images if they do not exist yet.
    ///
    /// # Errors
    ///
    /// Returns [`ManipDrawError::UnsupportedFormat`] if the device cannot
    /// render to the ID or depth format. Nothing is allocated in that case.
    pub fn allocate(
        &mut self,
        device: &wgpu::Device,
    ) -> Result<(), ManipDrawError> {
        if self.images.is_some() {
            return Ok(());
        }
        require_renderable(device, ID_FORMAT)?;
        require_renderable(device, DEPTH_FORMAT)?;

        let (id_texture, id_view) = create_image(
            device,
            "Pick ID Texture",
            ID_FORMAT,
            wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::COPY_SRC,
        );
        let (depth_texture, depth_view) = create_image(
            device,
            "Pick Depth Texture",
            DEPTH_FORMAT,
            wgpu::TextureUsages::RENDER_ATTACHMENT,
        );
        self.images = Some(PickImages {
            id_texture,
            id_view,
            _depth_texture: depth_texture,
            depth_view,
        });
        Ok(())
    }

    /// Drop the images. Safe to call when nothing is allocated.
    pub fn release(&mut self) {
        self.images = None;
    }

    /// Whether the images exist.
    #[must_use]
    pub const fn is_allocated(&self) -> bool {
        self.images.is_some()
    }

    /// `(id_view, depth_view)` for the pick pass attachments.
    ///
    /// # Errors
    ///
    /// Returns [`ManipDrawError::PickTargetMissing`] when not allocated.
    pub fn views(
        &self,
    ) -> Result<(&wgpu::TextureView, &wgpu::TextureView), ManipDrawError> {
        self.images
            .as_ref()
            .map(|images| (&images.id_view, &images.depth_view))
            .ok_or(ManipDrawError::PickTargetMissing)
    }

    /// The ID texture, as the source of the readback copy.
    ///
    /// # Errors
    ///
    /// Returns [`ManipDrawError::PickTargetMissing`] when not allocated.
    pub fn id_texture(&self) -> Result<&wgpu::Texture, ManipDrawError> {
        self.images
            .as_ref()
            .map(|images| &images.id_texture)
            .ok_or(ManipDrawError::PickTargetMissing)
    }
}

fn create_image(
    device: &wgpu::Device,
    label: &str,
    format: wgpu::TextureFormat,
    usage: wgpu::TextureUsages,
) -> (wgpu::Texture, wgpu::TextureView) {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: EXTENT,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    (texture, view)
}
