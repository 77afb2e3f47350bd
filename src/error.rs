//! Crate-level error types.

use std::fmt;

#[cfg(feature = "viewer")]
use crate::gpu::render_context::RenderContextError;

/// Errors produced by the manipdraw crate.
///
/// Variants fall into two groups. Broken invocation contracts
/// (`MalformedViewport`, `ViewportOutOfBounds`, `PickTargetMissing`,
/// `TransferInFlight`, `NotActive`) mean the caller sequenced the subsystem
/// wrongly and should stop using it. Capability and asset faults
/// (`UnsupportedFormat`, `ShaderCompose`, `Io`, `OptionsParse`) are reported
/// by activation, which then leaves the subsystem inactive.
#[derive(Debug)]
pub enum ManipDrawError {
    /// A raw viewport query returned the wrong number of elements or a
    /// non-positive extent.
    MalformedViewport {
        /// Number of elements the host returned.
        len: usize,
    },
    /// The viewport does not fit inside the host render target.
    ViewportOutOfBounds {
        /// Host target size in pixels.
        target: (u32, u32),
    },
    /// A pick pass was attempted while the pick target is not allocated.
    PickTargetMissing,
    /// A readback was issued while the previous one was still pending.
    TransferInFlight,
    /// A frame was driven while the subsystem is not active.
    NotActive,
    /// The device cannot render to or blend into a required format.
    UnsupportedFormat {
        /// Format that failed the capability check.
        format: wgpu::TextureFormat,
        /// Missing capability.
        reason: &'static str,
    },
    /// A WGSL shader failed to compose or validate.
    ShaderCompose {
        /// Shader file that failed.
        shader: String,
        /// Composer diagnostic.
        message: String,
    },
    /// Generic I/O failure.
    Io(std::io::Error),
    /// TOML options parsing/serialization failure.
    OptionsParse(String),
    /// GPU context initialization failure.
    #[cfg(feature = "viewer")]
    Gpu(RenderContextError),
    /// Viewer event-loop failure.
    #[cfg(feature = "viewer")]
    Viewer(String),
}

impl fmt::Display for ManipDrawError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedViewport { len } => {
                write!(f, "malformed viewport: expected 4 elements, got {len}")
            }
            Self::ViewportOutOfBounds { target } => write!(
                f,
                "viewport exceeds the {}x{} render target",
                target.0, target.1
            ),
            Self::PickTargetMissing => {
                write!(f, "pick target is not allocated")
            }
            Self::TransferInFlight => {
                write!(f, "pick readback issued while one is still pending")
            }
            Self::NotActive => write!(f, "manipulator picking is not active"),
            Self::UnsupportedFormat { format, reason } => {
                write!(f, "unsupported format {format:?}: {reason}")
            }
            Self::ShaderCompose { shader, message } => {
                write!(f, "shader '{shader}' failed to compose: {message}")
            }
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::OptionsParse(msg) => {
                write!(f, "options parse error: {msg}")
            }
            #[cfg(feature = "viewer")]
            Self::Gpu(e) => write!(f, "GPU error: {e}"),
            #[cfg(feature = "viewer")]
            Self::Viewer(msg) => write!(f, "viewer error: {msg}"),
        }
    }
}

impl std::error::Error for ManipDrawError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            #[cfg(feature = "viewer")]
            Self::Gpu(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ManipDrawError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

#[cfg(feature = "viewer")]
impl From<RenderContextError> for ManipDrawError {
    fn from(e: RenderContextError) -> Self {
        Self::Gpu(e)
    }
}
