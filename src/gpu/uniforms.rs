//! Uniform block shared by the pick and highlight shaders.

use glam::Mat4;

/// Mirrors `ManipUniforms` in `modules/manip.wgsl`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ManipUniform {
    /// Projection × view (× pick window) matrix, column-major.
    pub pvm: [[f32; 4]; 4],
    /// Highlight RGBA. Unused by the pick shader.
    pub color: [f32; 4],
    /// Blink alpha multiplied onto `color.a`. Unused by the pick shader.
    pub alpha: f32,
    /// Padding to a 16-byte boundary.
    pub _pad: [f32; 3],
}

impl ManipUniform {
    /// Uniform carrying only a transform, for the pick pass and the
    /// viewer's scene pass.
    #[must_use]
    pub fn pick(pvm: Mat4) -> Self {
        Self {
            pvm: pvm.to_cols_array_2d(),
            color: [0.0; 4],
            alpha: 1.0,
            _pad: [0.0; 3],
        }
    }

    /// Uniform for a highlight draw.
    #[must_use]
    pub fn highlight(pvm: Mat4, color: [f32; 4], alpha: f32) -> Self {
        Self {
            pvm: pvm.to_cols_array_2d(),
            color,
            alpha,
            _pad: [0.0; 3],
        }
    }
}

/// A uniform buffer holding one [`ManipUniform`] with its bind group.
pub struct UniformBinding {
    buffer: wgpu::Buffer,
    /// Layout of group 0 in the manipulator pipelines.
    pub layout: wgpu::BindGroupLayout,
    /// Bind group referencing `buffer`.
    pub bind_group: wgpu::BindGroup,
}

impl UniformBinding {
    /// Create the buffer, layout and bind group.
    pub fn new(device: &wgpu::Device, label: &str) -> Self {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: size_of::<ManipUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some(label),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX
                        | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: wgpu::BufferSize::new(
                            size_of::<ManipUniform>() as u64,
                        ),
                    },
                    count: None,
                }],
            });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout: &layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
        });

        Self {
            buffer,
            layout,
            bind_group,
        }
    }

    /// Upload `uniform`; takes effect at the next queue submission.
    pub fn write(&self, queue: &wgpu::Queue, uniform: &ManipUniform) {
        queue.write_buffer(&self.buffer, 0, bytemuck::bytes_of(uniform));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_matches_wgsl_struct() {
        // mat4x4 (64) + vec4 (16) + f32 padded to 16
        assert_eq!(size_of::<ManipUniform>(), 96);
        assert_eq!(align_of::<ManipUniform>(), 4);
    }

    #[test]
    fn pick_uniform_carries_matrix_columns() {
        let m = Mat4::from_translation(glam::Vec3::new(1.0, 2.0, 3.0));
        let u = ManipUniform::pick(m);
        assert_eq!(u.pvm[3], [1.0, 2.0, 3.0, 1.0]);
        assert_eq!(u.alpha, 1.0);
    }
}
