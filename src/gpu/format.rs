//! Texture format capability checks performed at activation.

use crate::error::ManipDrawError;

/// Fail unless `format` can be used as a render attachment on `device`.
///
/// # Errors
///
/// Returns [`ManipDrawError::UnsupportedFormat`] when the format lacks the
/// `RENDER_ATTACHMENT` usage.
pub fn require_renderable(
    device: &wgpu::Device,
    format: wgpu::TextureFormat,
) -> Result<(), ManipDrawError> {
    let features = format.guaranteed_format_features(device.features());
    if features
        .allowed_usages
        .contains(wgpu::TextureUsages::RENDER_ATTACHMENT)
    {
        Ok(())
    } else {
        Err(ManipDrawError::UnsupportedFormat {
            format,
            reason: "not renderable",
        })
    }
}

/// Fail unless `format` is renderable and supports alpha blending.
///
/// # Errors
///
/// Returns [`ManipDrawError::UnsupportedFormat`] for non-renderable or
/// non-blendable formats (integer and depth formats, for example).
pub fn require_blendable(
    device: &wgpu::Device,
    format: wgpu::TextureFormat,
) -> Result<(), ManipDrawError> {
    require_renderable(device, format)?;
    let features = format.guaranteed_format_features(device.features());
    if features
        .flags
        .contains(wgpu::TextureFormatFeatureFlags::BLENDABLE)
    {
        Ok(())
    } else {
        Err(ManipDrawError::UnsupportedFormat {
            format,
            reason: "not blendable",
        })
    }
}
