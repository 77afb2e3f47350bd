//! Manipulator geometry as seen by the pick and highlight passes.
//!
//! The passes never own scene geometry. They ask a [`ManipulatorSource`] to
//! record draw calls into a render pass they have already configured, either
//! for every manipulator or for a single ID.

mod mesh;

pub use mesh::{ManipulatorMesh, ManipulatorSurface, MeshLayout};

use crate::picking::PickId;

/// Which manipulator surfaces a draw should cover.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManipulatorFilter {
    /// Every manipulator surface (pick pass).
    All,
    /// Only the surfaces tagged with this ID (highlight pass).
    Only(PickId),
}

impl ManipulatorFilter {
    /// Whether a surface tagged `id` passes the filter.
    #[must_use]
    pub fn accepts(self, id: PickId) -> bool {
        match self {
            Self::All => true,
            Self::Only(only) => only == id,
        }
    }
}

/// Something that can draw manipulator surfaces into a configured pass.
///
/// The pass already has its pipeline and group 0 uniform bound; the source
/// binds vertex buffer slot 0 with [`manipulator_vertex_buffer_layout`] and
/// issues its draws.
pub trait ManipulatorSource {
    /// Record the draws selected by `filter`.
    fn draw(&self, pass: &mut wgpu::RenderPass<'_>, filter: ManipulatorFilter);
}

/// Vertex of a manipulator surface.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ManipulatorVertex {
    /// Object-space position.
    pub position: [f32; 3],
    /// Raw [`PickId`] of the owning surface.
    pub pick_id: u32,
}

/// Vertex buffer layout matching [`ManipulatorVertex`].
#[must_use]
pub fn manipulator_vertex_buffer_layout() -> wgpu::VertexBufferLayout<'static>
{
    wgpu::VertexBufferLayout {
        array_stride: size_of::<ManipulatorVertex>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[
            wgpu::VertexAttribute {
                format: wgpu::VertexFormat::Float32x3,
                offset: 0,
                shader_location: 0,
            },
            wgpu::VertexAttribute {
                format: wgpu::VertexFormat::Uint32,
                offset: 12,
                shader_location: 1,
            },
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_layout_matches_struct() {
        let layout = manipulator_vertex_buffer_layout();
        assert_eq!(layout.array_stride, 16);
        assert_eq!(
            layout.attributes[1].offset,
            std::mem::offset_of!(ManipulatorVertex, pick_id) as u64
        );
    }

    #[test]
    fn filter_selects_by_id() {
        let a = PickId::new(1).unwrap();
        let b = PickId::new(2).unwrap();
        assert!(ManipulatorFilter::All.accepts(a));
        assert!(ManipulatorFilter::Only(a).accepts(a));
        assert!(!ManipulatorFilter::Only(a).accepts(b));
    }
}
