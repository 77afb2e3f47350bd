//! Depth conventions of the host renderer.

/// How the host maps distance to stored depth values.
///
/// The pick pass must resolve occlusion the same way the host does, so the
/// comparison function and the clear value both follow the host convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum DepthConvention {
    /// Near geometry stores smaller values; clear to the far value 1.
    #[default]
    Standard,
    /// Reversed floating-point Z: near geometry stores larger values;
    /// clear to the far value 0.
    ReversedZ,
}

impl DepthConvention {
    /// Every convention, in pipeline-table order.
    pub const ALL: [Self; 2] = [Self::Standard, Self::ReversedZ];

    /// Pick the convention from a host "reverse float Z" flag.
    #[must_use]
    pub const fn from_reversed_flag(reversed: bool) -> Self {
        if reversed {
            Self::ReversedZ
        } else {
            Self::Standard
        }
    }

    /// Depth comparison that keeps the nearer fragment.
    #[must_use]
    pub const fn compare(self) -> wgpu::CompareFunction {
        match self {
            Self::Standard => wgpu::CompareFunction::Less,
            Self::ReversedZ => wgpu::CompareFunction::Greater,
        }
    }

    /// Value the depth buffer is cleared to (the far plane).
    #[must_use]
    pub const fn clear_depth(self) -> f32 {
        match self {
            Self::Standard => 1.0,
            Self::ReversedZ => 0.0,
        }
    }

    /// Index into per-convention tables such as the pick pipelines.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Standard => 0,
            Self::ReversedZ => 1,
        }
    }

    /// Whether a fragment at `depth` passes against the stored `existing`.
    #[must_use]
    pub fn passes(self, depth: f32, existing: f32) -> bool {
        match self.compare() {
            wgpu::CompareFunction::Less => depth < existing,
            wgpu::CompareFunction::Greater => depth > existing,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_selects_convention() {
        assert_eq!(
            DepthConvention::from_reversed_flag(false),
            DepthConvention::Standard
        );
        assert_eq!(
            DepthConvention::from_reversed_flag(true),
            DepthConvention::ReversedZ
        );
    }

    #[test]
    fn reversed_z_uses_greater_and_clears_to_zero() {
        let depth = DepthConvention::ReversedZ;
        assert_eq!(depth.compare(), wgpu::CompareFunction::Greater);
        assert_eq!(depth.clear_depth(), 0.0);
        let depth = DepthConvention::Standard;
        assert_eq!(depth.compare(), wgpu::CompareFunction::Less);
        assert_eq!(depth.clear_depth(), 1.0);
    }

    #[test]
    fn cleared_buffer_accepts_every_visible_depth() {
        // The clear value must be the far plane of its own convention, or
        // geometry would be rejected against an empty buffer.
        for convention in DepthConvention::ALL {
            let clear = convention.clear_depth();
            for d in [0.001_f32, 0.25, 0.5, 0.75, 0.999] {
                assert!(convention.passes(d, clear), "{convention:?} at {d}");
            }
        }
    }

    #[test]
    fn nearer_fragment_wins() {
        assert!(DepthConvention::Standard.passes(0.2, 0.6));
        assert!(!DepthConvention::Standard.passes(0.6, 0.2));
        assert!(DepthConvention::ReversedZ.passes(0.6, 0.2));
        assert!(!DepthConvention::ReversedZ.passes(0.2, 0.6));
    }

    #[test]
    fn table_indices_are_distinct() {
        let indices: Vec<usize> = DepthConvention::ALL
            .into_iter()
            .map(DepthConvention::index)
            .collect();
        assert_eq!(indices, vec![0, 1]);
    }
}
