//! GPU resource management utilities.
//!
//! Provides format capability checks, the manipulator uniform block, WGSL
//! shader composition, and (for the viewer) wgpu device/surface setup.

/// Texture format capability checks.
pub mod format;
/// Pipeline construction shared by the pick and highlight passes.
pub mod pipeline_helpers;
/// wgpu device, surface, and queue initialization.
#[cfg(feature = "viewer")]
pub mod render_context;
/// WGSL shader composition with `#import` support via naga-oil.
pub mod shader_composer;
/// Uniform block shared by the manipulator shaders.
pub mod uniforms;
