//! Manipulator identifiers as they travel through the pick buffer.

use std::fmt;

/// Identifier of one manipulator surface.
///
/// The pick buffer stores IDs as raw `u16` texels and reserves
/// [`PickId::NONE_RAW`] for "nothing under the cursor". A `PickId` can
/// never hold that value; the absence of a manipulator is expressed as
/// `Option<PickId>::None` instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PickId(u16);

impl PickId {
    /// Raw texel value written by the clear of the pick pass.
    pub const NONE_RAW: u16 = u16::MAX;

    /// Largest identifier a manipulator can be assigned.
    pub const MAX: Self = Self(u16::MAX - 1);

    /// Wrap a raw identifier. Returns `None` for the reserved sentinel.
    #[must_use]
    pub const fn new(raw: u16) -> Option<Self> {
        if raw == Self::NONE_RAW {
            None
        } else {
            Some(Self(raw))
        }
    }

    /// Decode a texel read back from the pick buffer.
    #[must_use]
    pub const fn decode(raw: u16) -> Option<Self> {
        Self::new(raw)
    }

    /// Encode an optional pick as the texel value the pick pass writes.
    #[must_use]
    pub fn encode(pick: Option<Self>) -> u16 {
        pick.map_or(Self::NONE_RAW, Self::raw)
    }

    /// The raw 16-bit identifier.
    #[must_use]
    pub const fn raw(self) -> u16 {
        self.0
    }
}

impl fmt::Display for PickId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl TryFrom<u32> for PickId {
    type Error = u32;

    /// Narrow a vertex-attribute ID. Fails for values that do not fit in
    /// 16 bits and for the reserved sentinel.
    fn try_from(value: u32) -> Result<Self, Self::Error> {
        u16::try_from(value)
            .ok()
            .and_then(Self::new)
            .ok_or(value)
    }
}

impl From<PickId> for u32 {
    fn from(id: PickId) -> Self {
        u32::from(id.0)
    }
}
