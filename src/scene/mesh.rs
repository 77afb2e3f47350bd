use std::ops::Range;

use glam::Vec3;
use rustc_hash::FxHashMap;
use wgpu::util::DeviceExt;

use super::{ManipulatorFilter, ManipulatorSource, ManipulatorVertex};
use crate::picking::PickId;

/// Triangle mesh of one manipulator surface.
#[derive(Debug, Clone, PartialEq)]
pub struct ManipulatorSurface {
    /// ID written to the pick buffer for this surface.
    pub id: PickId,
    /// Object-space vertex positions.
    pub positions: Vec<[f32; 3]>,
    /// Triangle list indices into `positions`.
    pub indices: Vec<u32>,
}

/// Corner order: bit 0 = +x, bit 1 = +y, bit 2 = +z.
const CUBOID_INDICES: [u32; 36] = [
    0, 4, 6, 0, 6, 2, // -x
    1, 3, 7, 1, 7, 5, // +x
    0, 1, 5, 0, 5, 4, // -y
    2, 6, 7, 2, 7, 3, // +y
    0, 2, 3, 0, 3, 1, // -z
    4, 5, 7, 4, 7, 6, // +z
];

impl ManipulatorSurface {
    /// Axis-aligned box centred on `center`, wound counter-clockwise when
    /// seen from outside.
    #[must_use]
    pub fn cuboid(id: PickId, center: Vec3, half_extents: Vec3) -> Self {
        let positions = (0..8_u32)
            .map(|corner| {
                let sign = Vec3::new(
                    if corner & 1 == 0 { -1.0 } else { 1.0 },
                    if corner & 2 == 0 { -1.0 } else { 1.0 },
                    if corner & 4 == 0 { -1.0 } else { 1.0 },
                );
                (center + sign * half_extents).to_array()
            })
            .collect();
        Self {
            id,
            positions,
            indices: CUBOID_INDICES.to_vec(),
        }
    }
}

/// CPU-side concatenation of surfaces, grouped by ID.
///
/// Indices of surfaces sharing an ID are contiguous, so drawing one
/// manipulator is a single indexed draw over its range.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshLayout {
    /// Concatenated vertices.
    pub vertices: Vec<ManipulatorVertex>,
    /// Concatenated indices, already offset into `vertices`.
    pub indices: Vec<u32>,
    /// Index range of each ID.
    pub ranges: FxHashMap<PickId, Range<u32>>,
}

impl MeshLayout {
    /// Concatenate `surfaces`.
    ///
    /// Triangles referencing a vertex outside their surface, and trailing
    /// indices that do not form a full triangle, are dropped.
    #[must_use]
    pub fn build(surfaces: &[ManipulatorSurface]) -> Self {
        let mut order: Vec<&ManipulatorSurface> = surfaces.iter().collect();
        order.sort_by_key(|surface| surface.id);

        let mut layout = Self::default();
        for surface in order {
            let base = layout.vertices.len() as u32;
            let vertex_count = surface.positions.len() as u32;
            let pick_id = u32::from(surface.id);
            layout.vertices.extend(
                surface
                    .positions
                    .iter()
                    .map(|&position| ManipulatorVertex { position, pick_id }),
            );

            let start = layout.indices.len() as u32;
            let mut dropped = 0_usize;
            for triangle in surface.indices.chunks(3) {
                if triangle.len() == 3
                    && triangle.iter().all(|&i| i < vertex_count)
                {
                    layout.indices.extend(triangle.iter().map(|&i| i + base));
                } else {
                    dropped += 1;
                }
            }
            if dropped > 0 {
                log::warn!(
                    "manipulator {}: dropped {dropped} malformed triangles",
                    surface.id
                );
            }

            let end = layout.indices.len() as u32;
            let range = layout.ranges.entry(surface.id).or_insert(start..start);
            range.end = end;
        }
        layout
    }

    /// The whole index range, or the range of one ID. `None` if the
    /// filter selects nothing.
    #[must_use]
    pub fn draw_range(&self, filter: ManipulatorFilter) -> Option<Range<u32>> {
        let range = match filter {
            ManipulatorFilter::All => 0..self.indices.len() as u32,
            ManipulatorFilter::Only(id) => self.ranges.get(&id)?.clone(),
        };
        (!range.is_empty()).then_some(range)
    }
}

/// GPU buffers of a [`MeshLayout`]; the bundled [`ManipulatorSource`].
pub struct ManipulatorMesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    layout: MeshLayout,
}

impl ManipulatorMesh {
    /// Upload `surfaces` into fresh vertex and index buffers.
    pub fn new(device: &wgpu::Device, surfaces: &[ManipulatorSurface]) -> Self {
        let layout = MeshLayout::build(surfaces);
        let vertex_buffer =
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Manipulator Vertex Buffer"),
                contents: bytemuck::cast_slice(&layout.vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });
        let index_buffer =
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Manipulator Index Buffer"),
                contents: bytemuck::cast_slice(&layout.indices),
                usage: wgpu::BufferUsages::INDEX,
            });
        log::debug!(
            "uploaded {} manipulators ({} vertices, {} indices)",
            layout.ranges.len(),
            layout.vertices.len(),
            layout.indices.len()
        );
        Self {
            vertex_buffer,
            index_buffer,
            layout,
        }
    }

    /// CPU copy of the uploaded geometry.
    #[must_use]
    pub fn layout(&self) -> &MeshLayout {
        &self.layout
    }

    /// IDs present in the mesh, in no particular order.
    pub fn ids(&self) -> impl Iterator<Item = PickId> + '_ {
        self.layout.ranges.keys().copied()
    }
}

impl ManipulatorSource for ManipulatorMesh {
    fn draw(&self, pass: &mut wgpu::RenderPass<'_>, filter: ManipulatorFilter) {
        let Some(range) = self.layout.draw_range(filter) else {
            return;
        };
        pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        pass.set_index_buffer(
            self.index_buffer.slice(..),
            wgpu::IndexFormat::Uint32,
        );
        pass.draw_indexed(range, 0, 0..1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(raw: u16) -> PickId {
        PickId::new(raw).unwrap()
    }

    fn triangle(raw: u16, z: f32) -> ManipulatorSurface {
        ManipulatorSurface {
            id: id(raw),
            positions: vec![[0.0, 0.0, z], [1.0, 0.0, z], [0.0, 1.0, z]],
            indices: vec![0, 1, 2],
        }
    }

    #[test]
    fn surfaces_with_the_same_id_share_one_range() {
        let surfaces = [triangle(7, 0.0), triangle(3, 0.0), triangle(7, 1.0)];
        let layout = MeshLayout::build(&surfaces);

        assert_eq!(layout.indices.len(), 9);
        assert_eq!(layout.ranges[&id(3)], 0..3);
        assert_eq!(layout.ranges[&id(7)], 3..9);
        // Every index in the range of 7 refers to a vertex tagged 7.
        for &i in &layout.indices[3..9] {
            assert_eq!(layout.vertices[i as usize].pick_id, 7);
        }
    }

    #[test]
    fn indices_are_offset_into_the_shared_vertex_buffer() {
        let layout = MeshLayout::build(&[triangle(1, 0.0), triangle(2, 0.5)]);
        assert_eq!(layout.indices, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(layout.vertices[3].position, [0.0, 0.0, 0.5]);
    }

    #[test]
    fn draw_range_follows_the_filter() {
        let layout = MeshLayout::build(&[triangle(1, 0.0), triangle(2, 0.0)]);
        assert_eq!(layout.draw_range(ManipulatorFilter::All), Some(0..6));
        assert_eq!(
            layout.draw_range(ManipulatorFilter::Only(id(2))),
            Some(3..6)
        );
        assert_eq!(layout.draw_range(ManipulatorFilter::Only(id(9))), None);
        assert_eq!(
            MeshLayout::default().draw_range(ManipulatorFilter::All),
            None
        );
    }

    #[test]
    fn malformed_triangles_are_dropped() {
        let surface = ManipulatorSurface {
            id: id(4),
            positions: vec![[0.0; 3]; 3],
            indices: vec![0, 1, 2, 0, 1, 3, 2, 1],
        };
        let layout = MeshLayout::build(&[surface]);
        assert_eq!(layout.indices, vec![0, 1, 2]);
        assert_eq!(layout.ranges[&id(4)], 0..3);
    }

    #[test]
    fn cuboid_faces_point_outwards() {
        let center = Vec3::new(1.0, -2.0, 0.5);
        let cuboid = ManipulatorSurface::cuboid(id(0), center, Vec3::ONE);
        assert_eq!(cuboid.positions.len(), 8);
        assert_eq!(cuboid.indices.len(), 36);
        for tri in cuboid.indices.chunks(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]]
                .map(|i| Vec3::from(cuboid.positions[i as usize]));
            let normal = (b - a).cross(c - a);
            let centroid = (a + b + c) / 3.0;
            assert!(normal.dot(centroid - center) > 0.0, "{tri:?}");
        }
    }
}
